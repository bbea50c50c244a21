use crate::{
    error::FontResult,
    parse_binary::{BinaryParser, ByteReader},
};

#[derive(Debug)]
pub struct Hhea {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    /// Count of long metrics at the front of `hmtx`
    pub number_of_h_metrics: u16,
}

impl Hhea {
    pub fn parse(table: &[u8]) -> FontResult<Self> {
        let mut reader = ByteReader::new(table);

        let _version = reader.parse_u32()?;
        let ascender = reader.parse_i16()?;
        let descender = reader.parse_i16()?;
        let line_gap = reader.parse_i16()?;
        let _advance_width_max = reader.parse_u16()?;
        let _min_left_side_bearing = reader.parse_i16()?;
        let _min_right_side_bearing = reader.parse_i16()?;
        let _x_max_extent = reader.parse_i16()?;
        let _caret_slope_rise = reader.parse_i16()?;
        let _caret_slope_run = reader.parse_i16()?;
        let _caret_offset = reader.parse_i16()?;
        for _ in 0..4 {
            let _reserved = reader.parse_i16()?;
        }
        let _metric_data_format = reader.parse_i16()?;
        let number_of_h_metrics = reader.parse_u16()?;

        Ok(Self {
            ascender,
            descender,
            line_gap,
            number_of_h_metrics,
        })
    }
}
