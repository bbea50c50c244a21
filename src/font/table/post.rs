use crate::{
    error::FontResult,
    parse_binary::{BinaryParser, ByteReader},
};

#[derive(Debug)]
pub struct Post {
    pub underline_position: i16,
    pub underline_thickness: i16,
}

impl Post {
    pub fn parse(table: &[u8]) -> FontResult<Self> {
        let mut reader = ByteReader::new(table);

        let _version = reader.parse_u32()?;
        let _italic_angle = reader.parse_i32()?;
        let underline_position = reader.parse_i16()?;
        let underline_thickness = reader.parse_i16()?;

        Ok(Self {
            underline_position,
            underline_thickness,
        })
    }
}
