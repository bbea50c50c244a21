/*!
 * Compact Font Format parsing: the INDEX/DICT containers, the CID
 * FDArray/FDSelect machinery, and the Type 2 CharString interpreter.
 */

pub mod charstring;
pub mod dict;
pub mod index;

pub use charstring::{CharStringInterpreter, Glyph};
pub use dict::CffDict;
pub use index::CffIndex;

use crate::{
    error::FontResult,
    parse_binary::{BinaryParser, ByteReader},
};

use self::{dict::op, index::parse_index};

/// Per-font-dict values the interpreter needs: the width defaults and the
/// local subroutines
#[derive(Debug)]
pub struct FontDict<'a> {
    pub default_width_x: f64,
    pub nominal_width_x: f64,
    pub local_subrs: Option<CffIndex<'a>>,
}

#[derive(Debug)]
pub struct CffFont<'a> {
    pub char_strings: CffIndex<'a>,
    pub global_subrs: CffIndex<'a>,
    /// One entry for non-CID fonts; one per FD otherwise
    pub fonts: Vec<FontDict<'a>>,
    /// glyph id → FD index; absent for non-CID CFF1
    pub fd_select: Option<Vec<u8>>,
    pub is_cid: bool,
    pub is_cff2: bool,
    pub num_regions: u16,
}

impl<'a> CffFont<'a> {
    pub fn parse(table: &'a [u8], cff2: bool) -> FontResult<Self> {
        if cff2 {
            Self::parse_cff2(table)
        } else {
            Self::parse_cff1(table)
        }
    }

    /// Index of the font dict covering a glyph
    pub fn fd_index(&self, glyph_id: u16) -> usize {
        let index = self
            .fd_select
            .as_ref()
            .and_then(|fds| fds.get(usize::from(glyph_id)).copied())
            .unwrap_or(0);

        usize::from(index).min(self.fonts.len().saturating_sub(1))
    }

    pub fn interpreter(&self, glyph_id: u16) -> CharStringInterpreter<'_> {
        let font = &self.fonts[self.fd_index(glyph_id)];

        if self.is_cff2 {
            CharStringInterpreter::new_cff2(
                &self.global_subrs,
                font.local_subrs.as_ref(),
                self.num_regions,
            )
        } else {
            CharStringInterpreter::new(
                &self.global_subrs,
                font.local_subrs.as_ref(),
                font.default_width_x,
                font.nominal_width_x,
            )
        }
    }

    fn parse_cff1(table: &'a [u8]) -> FontResult<Self> {
        let mut reader = ByteReader::new(table);
        let _major = reader.next()?;
        let _minor = reader.next()?;
        let header_size = reader.next()?;
        let _off_size = reader.next()?;

        let mut cursor = usize::from(header_size);
        let _name_index = parse_index(table, &mut cursor, false)?;
        let top_dict_index = parse_index(table, &mut cursor, false)?;
        let _string_index = parse_index(table, &mut cursor, false)?;
        let global_subrs = parse_index(table, &mut cursor, false)?;

        let top_dict = CffDict::parse(
            top_dict_index
                .get(0)
                .ok_or(anyhow::anyhow!("CFF has no top DICT"))?,
        )?;

        let mut char_strings_cursor = top_dict
            .get_offset(op::CHAR_STRINGS)
            .ok_or(anyhow::anyhow!("top DICT has no CharStrings offset"))?;
        let char_strings = parse_index(table, &mut char_strings_cursor, false)?;

        let is_cid = top_dict.contains(op::ROS);

        let (fonts, fd_select) = if is_cid {
            let fd_array_offset = top_dict
                .get_offset(op::FD_ARRAY)
                .ok_or(anyhow::anyhow!("CID font has no FDArray"))?;
            let mut fd_cursor = fd_array_offset;
            let fd_array = parse_index(table, &mut fd_cursor, false)?;

            let mut fonts = Vec::with_capacity(fd_array.count as usize);
            for font_dict in fd_array.iter() {
                let font_dict = CffDict::parse(font_dict)?;
                fonts.push(Self::parse_font_dict(table, &font_dict, false)?);
            }
            anyhow::ensure!(!fonts.is_empty(), "FDArray is empty");

            let fd_select_offset = top_dict
                .get_offset(op::FD_SELECT)
                .ok_or(anyhow::anyhow!("CID font has no FDSelect"))?;
            let fd_select =
                parse_fd_select(table, fd_select_offset, char_strings.count as u16)?;

            (fonts, Some(fd_select))
        } else {
            (vec![Self::parse_font_dict(table, &top_dict, false)?], None)
        };

        Ok(Self {
            char_strings,
            global_subrs,
            fonts,
            fd_select,
            is_cid,
            is_cff2: false,
            num_regions: 0,
        })
    }

    fn parse_cff2(table: &'a [u8]) -> FontResult<Self> {
        let mut reader = ByteReader::new(table);
        let _major = reader.next()?;
        let _minor = reader.next()?;
        let header_size = reader.next()?;
        let top_dict_length = reader.parse_u16()? as usize;

        // the top DICT is inline rather than wrapped in an INDEX
        let top_dict_start = usize::from(header_size);
        let top_dict = CffDict::parse(
            table
                .get(top_dict_start..top_dict_start + top_dict_length)
                .ok_or(anyhow::anyhow!("truncated CFF2 top DICT"))?,
        )?;

        let mut cursor = top_dict_start + top_dict_length;
        let global_subrs = parse_index(table, &mut cursor, true)?;

        let mut char_strings_cursor = top_dict
            .get_offset(op::CHAR_STRINGS)
            .ok_or(anyhow::anyhow!("top DICT has no CharStrings offset"))?;
        let char_strings = parse_index(table, &mut char_strings_cursor, true)?;

        let num_regions = match top_dict.get_offset(op::VSTORE) {
            Some(offset) => parse_region_count(table, offset)?,
            None => 0,
        };

        let mut fonts = Vec::new();
        if let Some(fd_array_offset) = top_dict.get_offset(op::FD_ARRAY) {
            let mut fd_cursor = fd_array_offset;
            let fd_array = parse_index(table, &mut fd_cursor, true)?;
            for font_dict in fd_array.iter() {
                let font_dict = CffDict::parse(font_dict)?;
                fonts.push(Self::parse_font_dict(table, &font_dict, true)?);
            }
        }
        if fonts.is_empty() {
            fonts.push(FontDict {
                default_width_x: 0.0,
                nominal_width_x: 0.0,
                local_subrs: None,
            });
        }

        let fd_select = match top_dict.get_offset(op::FD_SELECT) {
            Some(offset) => Some(parse_fd_select(table, offset, char_strings.count as u16)?),
            None => None,
        };

        Ok(Self {
            char_strings,
            global_subrs,
            fonts,
            fd_select,
            is_cid: false,
            is_cff2: true,
            num_regions,
        })
    }

    /// Resolve a font DICT's Private DICT and its local subrs
    fn parse_font_dict(
        table: &'a [u8],
        font_dict: &CffDict,
        cff2: bool,
    ) -> FontResult<FontDict<'a>> {
        let Some((size, offset)) = font_dict.get_pair(op::PRIVATE) else {
            return Ok(FontDict {
                default_width_x: 0.0,
                nominal_width_x: 0.0,
                local_subrs: None,
            });
        };

        let private_bytes = table
            .get(offset..offset + size)
            .ok_or(anyhow::anyhow!("Private DICT past end of table"))?;
        let private = CffDict::parse(private_bytes)?;

        // the Subrs offset is relative to the start of the Private DICT
        let local_subrs = match private.get_offset(op::SUBRS) {
            Some(subrs_offset) => {
                let mut cursor = offset + subrs_offset;
                Some(parse_index(table, &mut cursor, cff2)?)
            }
            None => None,
        };

        Ok(FontDict {
            default_width_x: private.get_number(op::DEFAULT_WIDTH_X).unwrap_or(0.0),
            nominal_width_x: private.get_number(op::NOMINAL_WIDTH_X).unwrap_or(0.0),
            local_subrs,
        })
    }
}

/// FDSelect: format 0 is a flat byte map, format 3 is ranges with a
/// sentinel
fn parse_fd_select(table: &[u8], offset: usize, num_glyphs: u16) -> FontResult<Vec<u8>> {
    let mut reader = ByteReader::at(table, offset);

    match reader.next()? {
        0 => {
            let mut map = Vec::with_capacity(usize::from(num_glyphs));
            for _ in 0..num_glyphs {
                map.push(reader.next()?);
            }
            Ok(map)
        }
        3 => {
            let n_ranges = reader.parse_u16()?;
            let mut map = vec![0u8; usize::from(num_glyphs)];

            let mut first = reader.parse_u16()?;
            for _ in 0..n_ranges {
                let fd = reader.next()?;
                let next = reader.parse_u16()?;
                for glyph_id in first..next.min(num_glyphs) {
                    map[usize::from(glyph_id)] = fd;
                }
                first = next;
            }

            Ok(map)
        }
        format => anyhow::bail!("invalid FDSelect format: {}", format),
    }
}

/// Pull the region count out of an ItemVariationStore; the `blend`
/// operator needs it to size its delta sets
fn parse_region_count(table: &[u8], vstore_offset: usize) -> FontResult<u16> {
    // a 2-byte length prefixes the store itself
    let store_start = vstore_offset + 2;
    let mut reader = ByteReader::at(table, store_start);

    let _format = reader.parse_u16()?;
    let region_list_offset = reader.parse_u32()? as usize;

    let mut region_reader = ByteReader::at(table, store_start + region_list_offset);
    let _axis_count = region_reader.parse_u16()?;
    let region_count = region_reader.parse_u16()?;

    Ok(region_count)
}
