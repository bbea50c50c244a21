use std::{error::Error, fmt};

/// Stable error taxonomy surfaced by the parse entry point.
///
/// Container-level and required-table failures are fatal; glyph-level
/// failures are recovered locally and only counted in the output record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontError {
    /// Buffer under 4 bytes, or a critical table is truncated.
    InputTooSmall,

    /// WOFF2 input, or an SFNT carrying neither `glyf` nor `CFF `/`CFF2`.
    UnsupportedFormat(String),

    /// WOFF length mismatch or inflate failure.
    CorruptContainer(String),

    /// A required table (`head`, `maxp`, `hhea`, `hmtx`, `cmap`) is absent.
    MissingTable(&'static str),

    /// A cmap subtable was selected but its format is not 0, 4, 6 or 12.
    UnsupportedCmap(u16),

    /// The composite glyph graph contains a cycle.
    CompositeCycle(u16),

    /// Operand stack exceeded 513 entries or call stack exceeded 10 frames.
    CharStringOverflow,
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputTooSmall => write!(f, "input buffer too small"),
            Self::UnsupportedFormat(why) => write!(f, "unsupported font format: {}", why),
            Self::CorruptContainer(why) => write!(f, "corrupt font container: {}", why),
            Self::MissingTable(tag) => write!(f, "missing required table: {}", tag),
            Self::UnsupportedCmap(format) => write!(f, "unsupported cmap format: {}", format),
            Self::CompositeCycle(glyph_id) => {
                write!(f, "composite glyph cycle through glyph {}", glyph_id)
            }
            Self::CharStringOverflow => write!(f, "charstring stack limit exceeded"),
        }
    }
}

impl Error for FontError {}

pub type FontResult<T> = anyhow::Result<T>;
