use crate::{
    error::FontResult,
    parse_binary::{BinaryParser, ByteReader},
};

/// The `OS/2` prefix through `usWinDescent`; later versions append more
/// fields that nothing here needs
#[derive(Debug)]
pub struct Os2 {
    pub us_weight_class: u16,
    pub s_typo_ascender: i16,
    pub s_typo_descender: i16,
    pub us_win_ascent: u16,
    pub us_win_descent: u16,
}

impl Os2 {
    pub fn parse(table: &[u8]) -> FontResult<Self> {
        let mut reader = ByteReader::new(table);

        let _version = reader.parse_u16()?;
        let _x_avg_char_width = reader.parse_i16()?;
        let us_weight_class = reader.parse_u16()?;
        let _us_width_class = reader.parse_u16()?;
        let _fs_type = reader.parse_u16()?;
        // subscript/superscript/strikeout metrics
        for _ in 0..10 {
            let _metric = reader.parse_i16()?;
        }
        let _s_family_class = reader.parse_i16()?;
        reader.skip(10); // panose classification
        for _ in 0..4 {
            let _unicode_range = reader.parse_u32()?;
        }
        let _vendor_id = reader.parse_tag()?;
        let _fs_selection = reader.parse_u16()?;
        let _us_first_char_index = reader.parse_u16()?;
        let _us_last_char_index = reader.parse_u16()?;
        let s_typo_ascender = reader.parse_i16()?;
        let s_typo_descender = reader.parse_i16()?;
        let _s_typo_line_gap = reader.parse_i16()?;
        let us_win_ascent = reader.parse_u16()?;
        let us_win_descent = reader.parse_u16()?;

        Ok(Self {
            us_weight_class,
            s_typo_ascender,
            s_typo_descender,
            us_win_ascent,
            us_win_descent,
        })
    }
}
