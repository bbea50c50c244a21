//! `GPOS` pair-positioning extraction: only the x-advance adjustment of the
//! first glyph in a pair survives into the kerning map.

use std::collections::BTreeMap;

use crate::{
    error::FontResult,
    parse_binary::{BinaryParser, ByteReader},
};

/// glyph₁ → glyph₂ → x-advance adjustment, zero values omitted
pub type GlyphKerning = BTreeMap<u16, BTreeMap<u16, i16>>;

const PAIR_POS: u16 = 2;
const EXTENSION: u16 = 9;

pub fn parse_gpos(table: &[u8]) -> FontResult<GlyphKerning> {
    let mut reader = ByteReader::new(table);

    let _major = reader.parse_u16()?;
    let _minor = reader.parse_u16()?;
    let _script_list = reader.parse_u16()?;
    let _feature_list = reader.parse_u16()?;
    let lookup_list = reader.parse_u16()? as usize;

    let mut list_reader = ByteReader::at(table, lookup_list);
    let lookup_count = list_reader.parse_u16()?;

    let mut pairs = GlyphKerning::new();

    for _ in 0..lookup_count {
        let lookup_offset = lookup_list + list_reader.parse_u16()? as usize;

        if let Err(err) = parse_lookup(table, lookup_offset, &mut pairs) {
            log::warn!("skipping broken GPOS lookup: {}", err);
        }
    }

    Ok(pairs)
}

fn parse_lookup(table: &[u8], lookup_offset: usize, pairs: &mut GlyphKerning) -> FontResult<()> {
    let mut reader = ByteReader::at(table, lookup_offset);

    let lookup_type = reader.parse_u16()?;
    let _lookup_flag = reader.parse_u16()?;
    let subtable_count = reader.parse_u16()?;

    if lookup_type != PAIR_POS && lookup_type != EXTENSION {
        return Ok(());
    }

    for _ in 0..subtable_count {
        let mut subtable_offset = lookup_offset + reader.parse_u16()? as usize;

        if lookup_type == EXTENSION {
            let mut extension = ByteReader::at(table, subtable_offset);
            let _format = extension.parse_u16()?;
            let extension_type = extension.parse_u16()?;
            let extension_offset = extension.parse_u32()? as usize;

            if extension_type != PAIR_POS {
                continue;
            }
            subtable_offset += extension_offset;
        }

        if let Err(err) = parse_pair_pos(table, subtable_offset, pairs) {
            log::warn!("skipping broken PairPos subtable: {}", err);
        }
    }

    Ok(())
}

fn parse_pair_pos(table: &[u8], offset: usize, pairs: &mut GlyphKerning) -> FontResult<()> {
    let mut reader = ByteReader::at(table, offset);

    let format = reader.parse_u16()?;
    let coverage_offset = offset + reader.parse_u16()? as usize;
    let value_format1 = reader.parse_u16()?;
    let value_format2 = reader.parse_u16()?;

    let coverage = parse_coverage(table, coverage_offset)?;

    match format {
        1 => {
            let pair_set_count = reader.parse_u16()?;

            for (i, &first) in coverage.iter().enumerate() {
                if i >= usize::from(pair_set_count) {
                    break;
                }
                let pair_set_offset = offset + reader.parse_u16()? as usize;
                let mut pair_set = ByteReader::at(table, pair_set_offset);

                let pair_count = pair_set.parse_u16()?;
                for _ in 0..pair_count {
                    let second = pair_set.parse_u16()?;
                    let value1 = ValueRecord::parse(&mut pair_set, value_format1)?;
                    let _value2 = ValueRecord::parse(&mut pair_set, value_format2)?;

                    if value1.x_advance != 0 {
                        pairs.entry(first).or_default().insert(second, value1.x_advance);
                    }
                }
            }
        }
        2 => {
            let class_def1_offset = offset + reader.parse_u16()? as usize;
            let class_def2_offset = offset + reader.parse_u16()? as usize;
            let class1_count = reader.parse_u16()?;
            let class2_count = reader.parse_u16()?;

            let class_def1 = parse_class_def(table, class_def1_offset)?;
            let class_def2 = parse_class_def(table, class_def2_offset)?;

            // pull the whole matrix of value record pairs
            let mut matrix =
                Vec::with_capacity(usize::from(class1_count) * usize::from(class2_count));
            for _ in 0..class1_count {
                for _ in 0..class2_count {
                    let value1 = ValueRecord::parse(&mut reader, value_format1)?;
                    let _value2 = ValueRecord::parse(&mut reader, value_format2)?;
                    matrix.push(value1.x_advance);
                }
            }

            for &first in &coverage {
                // glyphs absent from ClassDef1 take class 0
                let c1 = class_def1.class_of(first);
                if c1 >= class1_count {
                    continue;
                }

                for &(second, c2) in &class_def2.entries {
                    if c2 >= class2_count {
                        continue;
                    }
                    let value = matrix
                        [usize::from(c1) * usize::from(class2_count) + usize::from(c2)];
                    if value != 0 {
                        pairs.entry(first).or_default().insert(second, value);
                    }
                }
            }
        }
        _ => anyhow::bail!("unknown PairPos format: {}", format),
    }

    Ok(())
}

struct ValueRecord {
    x_advance: i16,
}

impl ValueRecord {
    /// Each set bit of the value format is one 16-bit field in a fixed
    /// order; only `xAdvance` (bit 2) is kept, device offsets included in
    /// the skip
    fn parse(reader: &mut ByteReader, format: u16) -> FontResult<Self> {
        let mut x_advance = 0;

        for bit in 0..8 {
            if format & (1 << bit) != 0 {
                let value = reader.parse_i16()?;
                if bit == 2 {
                    x_advance = value;
                }
            }
        }

        Ok(Self { x_advance })
    }
}

/// Coverage: the ordered set of first glyphs a subtable applies to
fn parse_coverage(table: &[u8], offset: usize) -> FontResult<Vec<u16>> {
    let mut reader = ByteReader::at(table, offset);

    match reader.parse_u16()? {
        1 => {
            let glyph_count = reader.parse_u16()?;
            let mut glyphs = Vec::with_capacity(usize::from(glyph_count));
            for _ in 0..glyph_count {
                glyphs.push(reader.parse_u16()?);
            }
            Ok(glyphs)
        }
        2 => {
            let range_count = reader.parse_u16()?;
            let mut glyphs = Vec::new();
            for _ in 0..range_count {
                let start = reader.parse_u16()?;
                let end = reader.parse_u16()?;
                let _start_coverage_index = reader.parse_u16()?;
                anyhow::ensure!(start <= end, "coverage range is inverted");
                glyphs.extend(start..=end);
            }
            Ok(glyphs)
        }
        format => anyhow::bail!("unknown Coverage format: {}", format),
    }
}

struct ClassDef {
    /// Explicitly classified glyphs only; everything else is class 0
    entries: Vec<(u16, u16)>,
}

impl ClassDef {
    fn class_of(&self, glyph: u16) -> u16 {
        self.entries
            .iter()
            .find(|&&(g, _)| g == glyph)
            .map(|&(_, class)| class)
            .unwrap_or(0)
    }
}

fn parse_class_def(table: &[u8], offset: usize) -> FontResult<ClassDef> {
    let mut reader = ByteReader::at(table, offset);

    let entries = match reader.parse_u16()? {
        1 => {
            let start_glyph = reader.parse_u16()?;
            let glyph_count = reader.parse_u16()?;
            let mut entries = Vec::with_capacity(usize::from(glyph_count));
            for i in 0..glyph_count {
                let class = reader.parse_u16()?;
                entries.push((start_glyph + i, class));
            }
            entries
        }
        2 => {
            let range_count = reader.parse_u16()?;
            let mut entries = Vec::new();
            for _ in 0..range_count {
                let start = reader.parse_u16()?;
                let end = reader.parse_u16()?;
                let class = reader.parse_u16()?;
                anyhow::ensure!(start <= end, "class range is inverted");
                for glyph in start..=end {
                    entries.push((glyph, class));
                }
            }
            entries
        }
        format => anyhow::bail!("unknown ClassDef format: {}", format),
    };

    Ok(ClassDef { entries })
}
