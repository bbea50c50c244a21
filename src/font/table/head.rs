use crate::{
    error::FontResult,
    parse_binary::{BinaryParser, ByteReader},
};

#[derive(Debug)]
pub struct Head {
    pub units_per_em: u16,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    /// 0 for short (u16 × 2) `loca` offsets, 1 for long (u32)
    pub index_to_loc_format: i16,
}

impl Head {
    pub fn parse(table: &[u8]) -> FontResult<Self> {
        let mut reader = ByteReader::new(table);

        let _version = reader.parse_u32()?;
        let _font_revision = reader.parse_u32()?;
        let _checksum_adjustment = reader.parse_u32()?;
        let _magic_number = reader.parse_u32()?;
        let _flags = reader.parse_u16()?;
        let units_per_em = reader.parse_u16()?;
        let _created = reader.parse_u64()?;
        let _modified = reader.parse_u64()?;
        let x_min = reader.parse_i16()?;
        let y_min = reader.parse_i16()?;
        let x_max = reader.parse_i16()?;
        let y_max = reader.parse_i16()?;
        let _mac_style = reader.parse_u16()?;
        let _lowest_rec_ppem = reader.parse_u16()?;
        let _font_direction_hint = reader.parse_i16()?;
        let index_to_loc_format = reader.parse_i16()?;
        let _glyph_data_format = reader.parse_i16()?;

        Ok(Self {
            units_per_em,
            x_min,
            y_min,
            x_max,
            y_max,
            index_to_loc_format,
        })
    }
}
