use std::collections::BTreeMap;

use crate::{
    error::{FontError, FontResult},
    parse_binary::{BinaryParser, ByteReader},
};

/// The decoded character map: codepoint → glyph id, with notdef (glyph 0)
/// entries dropped
#[derive(Debug)]
pub struct Cmap {
    map: BTreeMap<u32, u16>,
}

impl Cmap {
    pub fn parse(table: &[u8]) -> FontResult<Self> {
        let mut reader = ByteReader::new(table);

        let _version = reader.parse_u16()?;
        let num_subtables = reader.parse_u16()?;

        // pick the best subtable by (platformID, encodingID); ties break on
        // the first one encountered
        let mut best: Option<(u8, u32)> = None;
        for _ in 0..num_subtables {
            let platform_id = reader.parse_u16()?;
            let encoding_id = reader.parse_u16()?;
            let offset = reader.parse_u32()?;

            let score: u8 = match (platform_id, encoding_id) {
                (3, 10) => 4,
                (0, 4) => 3,
                (3, 1) => 2,
                (0, 0 | 1 | 3) => 1,
                _ => 0,
            };

            if best.map(|(s, _)| score > s).unwrap_or(true) {
                best = Some((score, offset));
            }
        }

        let (_, offset) = best.ok_or(anyhow::anyhow!("cmap has no subtables"))?;
        let subtable = table
            .get(offset as usize..)
            .ok_or(anyhow::anyhow!("cmap subtable offset past end of table"))?;

        let format = ByteReader::new(subtable).parse_u16()?;
        let map = match format {
            0 => Self::parse_format0(subtable)?,
            4 => Self::parse_format4(subtable)?,
            6 => Self::parse_format6(subtable)?,
            12 => Self::parse_format12(subtable)?,
            _ => anyhow::bail!(FontError::UnsupportedCmap(format)),
        };

        Ok(Self { map })
    }

    pub fn glyph_id(&self, codepoint: u32) -> Option<u16> {
        self.map.get(&codepoint).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        self.map.iter().map(|(&c, &g)| (c, g))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Single 256-entry byte table
    fn parse_format0(subtable: &[u8]) -> FontResult<BTreeMap<u32, u16>> {
        let mut reader = ByteReader::new(subtable);

        let _format = reader.parse_u16()?;
        let _length = reader.parse_u16()?;
        let _language = reader.parse_u16()?;

        let mut map = BTreeMap::new();
        for code in 0..256u32 {
            let glyph_id = u16::from(reader.next()?);
            if glyph_id != 0 {
                map.insert(code, glyph_id);
            }
        }

        Ok(map)
    }

    /// Segmented ranges with per-segment delta or glyph-id indirection
    fn parse_format4(subtable: &[u8]) -> FontResult<BTreeMap<u32, u16>> {
        let mut reader = ByteReader::new(subtable);

        let _format = reader.parse_u16()?;
        let _length = reader.parse_u16()?;
        let _language = reader.parse_u16()?;
        let seg_count = usize::from(reader.parse_u16()?) / 2;
        let _search_range = reader.parse_u16()?;
        let _entry_selector = reader.parse_u16()?;
        let _range_shift = reader.parse_u16()?;

        let mut end_codes = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            end_codes.push(reader.parse_u16()?);
        }
        let _reserved_pad = reader.parse_u16()?;

        let mut start_codes = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            start_codes.push(reader.parse_u16()?);
        }

        let mut deltas = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            deltas.push(reader.parse_i16()?);
        }

        // byte position of idRangeOffset[0]; rangeOffset indirection is
        // relative to each element's own position
        let id_range_offset_pos = reader.cursor();
        let mut range_offsets = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            range_offsets.push(reader.parse_u16()?);
        }

        let mut map = BTreeMap::new();

        for i in 0..seg_count {
            let start = start_codes[i];
            let end = end_codes[i];
            if start == 0xFFFF {
                break;
            }

            for code in u32::from(start)..=u32::from(end) {
                let glyph_id = if range_offsets[i] == 0 {
                    (code as i32 + deltas[i] as i32) as u16
                } else {
                    let pos = id_range_offset_pos
                        + 2 * i
                        + usize::from(range_offsets[i])
                        + 2 * (code - u32::from(start)) as usize;
                    let Some(raw) = subtable.get(pos..pos + 2) else {
                        continue;
                    };
                    let raw = u16::from_be_bytes([raw[0], raw[1]]);
                    if raw == 0 {
                        continue;
                    }
                    (raw as i32 + deltas[i] as i32) as u16
                };

                if glyph_id != 0 {
                    map.insert(code, glyph_id);
                }
            }
        }

        Ok(map)
    }

    /// Dense range starting at `firstCode`
    fn parse_format6(subtable: &[u8]) -> FontResult<BTreeMap<u32, u16>> {
        let mut reader = ByteReader::new(subtable);

        let _format = reader.parse_u16()?;
        let _length = reader.parse_u16()?;
        let _language = reader.parse_u16()?;
        let first_code = u32::from(reader.parse_u16()?);
        let entry_count = reader.parse_u16()?;

        let mut map = BTreeMap::new();
        for i in 0..u32::from(entry_count) {
            let glyph_id = reader.parse_u16()?;
            if glyph_id != 0 {
                map.insert(first_code + i, glyph_id);
            }
        }

        Ok(map)
    }

    /// Sequential 32-bit groups
    fn parse_format12(subtable: &[u8]) -> FontResult<BTreeMap<u32, u16>> {
        let mut reader = ByteReader::new(subtable);

        let _format = reader.parse_u16()?;
        let _reserved = reader.parse_u16()?;
        let _length = reader.parse_u32()?;
        let _language = reader.parse_u32()?;
        let num_groups = reader.parse_u32()?;

        let mut map = BTreeMap::new();
        for _ in 0..num_groups {
            let start_char = reader.parse_u32()?;
            let end_char = reader.parse_u32()?;
            let start_glyph = reader.parse_u32()?;

            anyhow::ensure!(start_char <= end_char, "cmap group range is inverted");
            // scalars past the Unicode range would only come from a hostile
            // group count
            let end_char = end_char.min(0x10FFFF);

            for code in start_char..=end_char {
                let glyph_id = (start_glyph + (code - start_char)) as u16;
                if glyph_id != 0 {
                    map.insert(code, glyph_id);
                }
            }
        }

        Ok(map)
    }
}
