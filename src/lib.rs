/*!
 * Converts font binaries (TrueType, OpenType CFF/CFF2, WOFF-wrapped) into
 * language-neutral typeface records: per-character advance widths and
 * outline command strings, global metrics, and kerning.
 */

pub mod error;
pub mod font;
pub mod geometry;
pub mod inflate;
pub mod outline;
pub mod parse_binary;
pub mod shape;
pub mod typeface;
pub mod woff;

pub use error::{FontError, FontResult};
pub use shape::{build_text_shapes, PlacedGlyph, Shape, ShapeOptions};
pub use typeface::{parse, GlyphRecord, ParseOptions, TypefaceRecord};
