//! Legacy `kern` table: only horizontal format-0 subtables are honored.

use crate::{
    error::FontResult,
    font::gpos::GlyphKerning,
    parse_binary::{BinaryParser, ByteReader},
};

pub fn parse_kern(table: &[u8]) -> FontResult<GlyphKerning> {
    let mut reader = ByteReader::new(table);

    let _version = reader.parse_u16()?;
    let n_tables = reader.parse_u16()?;

    let mut pairs = GlyphKerning::new();
    let mut subtable_start = reader.cursor();

    for _ in 0..n_tables {
        let mut subtable = ByteReader::at(table, subtable_start);

        let _subtable_version = subtable.parse_u16()?;
        let length = subtable.parse_u16()? as usize;
        let coverage = subtable.parse_u16()?;

        // advance by the declared length whether or not the subtable is
        // usable
        subtable_start += length.max(6);

        let format = coverage >> 8;
        let horizontal = coverage & 1 != 0;
        if format != 0 || !horizontal {
            continue;
        }

        let n_pairs = subtable.parse_u16()?;
        let _search_range = subtable.parse_u16()?;
        let _entry_selector = subtable.parse_u16()?;
        let _range_shift = subtable.parse_u16()?;

        for _ in 0..n_pairs {
            let (Ok(left), Ok(right), Ok(value)) = (
                subtable.parse_u16(),
                subtable.parse_u16(),
                subtable.parse_i16(),
            ) else {
                log::warn!("kern subtable truncated mid-pair");
                break;
            };

            if value != 0 {
                pairs.entry(left).or_default().insert(right, value);
            }
        }
    }

    Ok(pairs)
}
