use crate::{
    error::FontResult,
    parse_binary::{BinaryParser, ByteReader},
};

/// `numGlyphs + 1` offsets into `glyf`. Equal consecutive offsets mean an
/// empty glyph.
#[derive(Debug)]
pub struct Loca {
    offsets: Vec<u32>,
}

impl Loca {
    pub fn parse(table: &[u8], num_glyphs: u16, index_to_loc_format: i16) -> FontResult<Self> {
        let mut reader = ByteReader::new(table);
        let mut offsets = Vec::with_capacity(usize::from(num_glyphs) + 1);

        for _ in 0..=num_glyphs {
            let offset = if index_to_loc_format == 0 {
                u32::from(reader.parse_u16()?) * 2
            } else {
                reader.parse_u32()?
            };

            offsets.push(offset);
        }

        Ok(Self { offsets })
    }

    /// Byte range of the glyph in `glyf`, or `None` for an empty glyph
    pub fn glyph_range(&self, glyph_id: u16) -> Option<(usize, usize)> {
        let start = *self.offsets.get(usize::from(glyph_id))? as usize;
        let end = *self.offsets.get(usize::from(glyph_id) + 1)? as usize;

        if start == end {
            return None;
        }

        Some((start, end))
    }
}
