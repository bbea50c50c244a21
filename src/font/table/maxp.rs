use crate::{
    error::FontResult,
    parse_binary::{BinaryParser, ByteReader},
};

#[derive(Debug)]
pub struct Maxp {
    /// 0x00010000 for TrueType outlines, 0x00005000 for CFF
    pub version: u32,
    pub num_glyphs: u16,
}

impl Maxp {
    pub fn parse(table: &[u8]) -> FontResult<Self> {
        let mut reader = ByteReader::new(table);

        let version = reader.parse_u32()?;
        let num_glyphs = reader.parse_u16()?;

        Ok(Self {
            version,
            num_glyphs,
        })
    }
}
