//! The conversion pipeline: container → tables → outlines → typeface
//! record.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::{
    error::{FontError, FontResult},
    font::{
        cff::CffFont,
        gpos::{self, GlyphKerning},
        kern,
        table::{glyf::GlyfReader, Cmap, Head, Hhea, Hmtx, Loca, Maxp, NameTable, Os2, Post},
        TableDirectory,
    },
    font::table::name::name_id,
    outline::{lower_quadratic_contour, write_commands},
    woff,
};

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Restrict the output to these characters; all mapped codepoints
    /// otherwise
    pub characters: Option<Vec<char>>,
    /// With no `characters` list this changes nothing today; recognized for
    /// callers that pass it through
    pub restrict_char_set: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            characters: None,
            restrict_char_set: true,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct GlyphRecord {
    /// Horizontal advance in font units
    pub ha: i32,
    /// Outline command string (`m`/`l`/`q`/`b` tokens)
    pub o: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct BoundingBox {
    #[serde(rename = "xMin")]
    pub x_min: i32,
    #[serde(rename = "yMin")]
    pub y_min: i32,
    #[serde(rename = "xMax")]
    pub x_max: i32,
    #[serde(rename = "yMax")]
    pub y_max: i32,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct FontInformation {
    pub format: String,
    #[serde(rename = "fontFamily", skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(rename = "fontSubfamily", skip_serializing_if = "Option::is_none")]
    pub font_subfamily: Option<String>,
    #[serde(rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(rename = "postScriptName", skip_serializing_if = "Option::is_none")]
    pub postscript_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designer: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Meta {
    #[serde(rename = "convertedGlyphs")]
    pub converted_glyphs: u32,
    #[serde(rename = "errorGlyphs")]
    pub error_glyphs: u32,
    #[serde(rename = "totalMapped")]
    pub total_mapped: u32,
    #[serde(rename = "type")]
    pub kind: String,
}

/// The language-neutral typeface record. Key names are normative for
/// downstream consumers.
#[derive(Debug, Serialize, PartialEq)]
pub struct TypefaceRecord {
    pub glyphs: BTreeMap<String, GlyphRecord>,
    #[serde(rename = "familyName")]
    pub family_name: String,
    pub ascender: i32,
    pub descender: i32,
    #[serde(rename = "underlinePosition")]
    pub underline_position: i32,
    #[serde(rename = "underlineThickness")]
    pub underline_thickness: i32,
    #[serde(rename = "boundingBox")]
    pub bounding_box: BoundingBox,
    /// Units per em
    pub resolution: i32,
    pub kerning: BTreeMap<String, BTreeMap<String, i32>>,
    pub original_font_information: FontInformation,
    #[serde(rename = "_meta")]
    pub meta: Meta,
}

enum OutlineSource<'a> {
    TrueType(GlyfReader<'a>),
    Cff(CffFont<'a>),
}

impl OutlineSource<'_> {
    fn commands(&mut self, glyph_id: u16) -> FontResult<String> {
        match self {
            OutlineSource::TrueType(reader) => {
                let outline = reader.outline(glyph_id)?;
                let mut commands = Vec::new();
                for contour in &outline.contours {
                    commands.extend(lower_quadratic_contour(contour));
                }
                Ok(write_commands(&commands))
            }
            OutlineSource::Cff(font) => {
                let charstring = font
                    .char_strings
                    .get(usize::from(glyph_id))
                    .ok_or(anyhow::anyhow!("glyph {} has no charstring", glyph_id))?;
                let glyph = font.interpreter(glyph_id).evaluate(charstring)?;
                Ok(write_commands(&glyph.commands))
            }
        }
    }
}

/// Convert a font binary (TTF, OTF, WOFF-wrapped) into a typeface record
pub fn parse(data: &[u8], options: &ParseOptions) -> FontResult<TypefaceRecord> {
    let buffer = woff::unwrap_container(data)?;
    let buffer = buffer.as_ref();

    let directory = TableDirectory::parse(buffer)?;

    let head = Head::parse(directory.require_table(buffer, *b"head", "head")?)?;
    let maxp = Maxp::parse(directory.require_table(buffer, *b"maxp", "maxp")?)?;
    let hhea = Hhea::parse(directory.require_table(buffer, *b"hhea", "hhea")?)?;
    let hmtx = Hmtx::parse(
        directory.require_table(buffer, *b"hmtx", "hmtx")?,
        hhea.number_of_h_metrics,
        maxp.num_glyphs,
    )?;
    let cmap = Cmap::parse(directory.require_table(buffer, *b"cmap", "cmap")?)?;

    let names = match directory.find_table(buffer, *b"name") {
        Some(table) => NameTable::parse(table).unwrap_or_default(),
        None => NameTable::default(),
    };
    let os2 = directory.find_table(buffer, *b"OS/2").and_then(|table| {
        Os2::parse(table)
            .map_err(|err| log::warn!("ignoring malformed OS/2 table: {}", err))
            .ok()
    });
    let post = directory.find_table(buffer, *b"post").and_then(|table| {
        Post::parse(table)
            .map_err(|err| log::warn!("ignoring malformed post table: {}", err))
            .ok()
    });

    // the loca table has to outlive the glyf reader borrowing it
    let loca;
    let (mut outlines, format) = if let Some(glyf) = directory.find_table(buffer, *b"glyf") {
        let loca_table = directory.require_table(buffer, *b"loca", "loca")?;
        loca = Loca::parse(loca_table, maxp.num_glyphs, head.index_to_loc_format)?;
        (
            OutlineSource::TrueType(GlyfReader::new(glyf, &loca)),
            "TrueType",
        )
    } else if let Some(cff) = directory.find_table(buffer, *b"CFF ") {
        (OutlineSource::Cff(CffFont::parse(cff, false)?), "CFF/OTF")
    } else if let Some(cff2) = directory.find_table(buffer, *b"CFF2") {
        (OutlineSource::Cff(CffFont::parse(cff2, true)?), "CFF2/OTF")
    } else {
        anyhow::bail!(FontError::UnsupportedFormat(
            "font carries neither glyf nor CFF outlines".into()
        ));
    };

    // kerning: GPOS wins when it yields any pair; table errors drop kerning
    // silently
    let glyph_kerning = extract_kerning(buffer, &directory);

    // reverse map for projecting glyph-id kerning onto characters; the
    // first (lowest) codepoint wins
    let mut reverse_cmap: HashMap<u16, char> = HashMap::new();
    for (codepoint, glyph_id) in cmap.iter() {
        if let Some(c) = char::from_u32(codepoint) {
            reverse_cmap.entry(glyph_id).or_insert(c);
        }
    }

    let requested: Vec<char> = match &options.characters {
        Some(characters) => characters.clone(),
        None => cmap.iter().filter_map(|(c, _)| char::from_u32(c)).collect(),
    };

    let mut glyphs = BTreeMap::new();
    let mut error_glyphs = 0u32;

    for c in requested {
        let Some(glyph_id) = cmap.glyph_id(u32::from(c)) else {
            continue;
        };

        let ha = i32::from(hmtx.advance_width(glyph_id));
        let o = match outlines.commands(glyph_id) {
            Ok(commands) => commands,
            Err(err) => {
                log::warn!("failed to convert glyph for {:?}: {}", c, err);
                error_glyphs += 1;
                String::new()
            }
        };

        glyphs.insert(c.to_string(), GlyphRecord { ha, o });
    }

    let kerning = project_kerning(&glyph_kerning, &reverse_cmap, &glyphs);

    let units_per_em = i32::from(head.units_per_em);
    let (ascender, descender) = match (&os2, hhea.ascender, hhea.descender) {
        // some CFF fonts zero out hhea; fall back to the typographic values
        (Some(os2), 0, 0) => (
            i32::from(os2.s_typo_ascender),
            i32::from(os2.s_typo_descender),
        ),
        _ => (i32::from(hhea.ascender), i32::from(hhea.descender)),
    };

    let (underline_position, underline_thickness) = match &post {
        Some(post) => (
            i32::from(post.underline_position),
            i32::from(post.underline_thickness),
        ),
        None => (
            (-0.1 * f64::from(head.units_per_em)).round() as i32,
            (0.05 * f64::from(head.units_per_em)).round() as i32,
        ),
    };

    let converted_glyphs = glyphs.len() as u32 - error_glyphs;

    Ok(TypefaceRecord {
        family_name: names.get(name_id::FONT_FAMILY).unwrap_or("").to_string(),
        ascender,
        descender,
        underline_position,
        underline_thickness,
        bounding_box: BoundingBox {
            x_min: i32::from(head.x_min),
            y_min: i32::from(head.y_min),
            x_max: i32::from(head.x_max),
            y_max: i32::from(head.y_max),
        },
        resolution: units_per_em,
        glyphs,
        kerning,
        original_font_information: FontInformation {
            format: format.to_string(),
            font_family: names.get(name_id::FONT_FAMILY).map(str::to_string),
            font_subfamily: names.get(name_id::FONT_SUBFAMILY).map(str::to_string),
            full_name: names.get(name_id::FULL_NAME).map(str::to_string),
            postscript_name: names.get(name_id::POSTSCRIPT_NAME).map(str::to_string),
            version: names.get(name_id::VERSION).map(str::to_string),
            copyright: names.get(name_id::COPYRIGHT).map(str::to_string),
            designer: names.get(name_id::DESIGNER).map(str::to_string),
        },
        meta: Meta {
            converted_glyphs,
            error_glyphs,
            total_mapped: cmap.len() as u32,
            kind: format.to_string(),
        },
    })
}

fn extract_kerning(buffer: &[u8], directory: &TableDirectory) -> GlyphKerning {
    if let Some(table) = directory.find_table(buffer, *b"GPOS") {
        match gpos::parse_gpos(table) {
            Ok(pairs) if !pairs.is_empty() => return pairs,
            Ok(_) => {}
            Err(err) => log::warn!("dropping kerning, GPOS failed to parse: {}", err),
        }
    }

    if let Some(table) = directory.find_table(buffer, *b"kern") {
        match kern::parse_kern(table) {
            Ok(pairs) => return pairs,
            Err(err) => log::warn!("dropping kerning, kern failed to parse: {}", err),
        }
    }

    GlyphKerning::new()
}

/// Project glyph-id pairs onto characters, dropping pairs whose characters
/// are absent from the output
fn project_kerning(
    glyph_kerning: &GlyphKerning,
    reverse_cmap: &HashMap<u16, char>,
    glyphs: &BTreeMap<String, GlyphRecord>,
) -> BTreeMap<String, BTreeMap<String, i32>> {
    let mut kerning: BTreeMap<String, BTreeMap<String, i32>> = BTreeMap::new();

    for (&first, seconds) in glyph_kerning {
        let Some(c1) = reverse_cmap.get(&first) else {
            continue;
        };
        if !glyphs.contains_key(&c1.to_string()) {
            continue;
        }

        for (&second, &value) in seconds {
            let Some(c2) = reverse_cmap.get(&second) else {
                continue;
            };
            if !glyphs.contains_key(&c2.to_string()) {
                continue;
            }

            kerning
                .entry(c1.to_string())
                .or_default()
                .insert(c2.to_string(), i32::from(value));
        }
    }

    kerning.retain(|_, seconds| !seconds.is_empty());
    kerning
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    fn u16s(values: &[u16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    fn sfnt(version: u32, tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend(version.to_be_bytes());
        data.extend((tables.len() as u16).to_be_bytes());
        data.extend([0u8; 6]);

        let mut offset = 12 + tables.len() * 16;
        for (tag, table) in tables {
            data.extend_from_slice(tag);
            data.extend(0u32.to_be_bytes());
            data.extend((offset as u32).to_be_bytes());
            data.extend((table.len() as u32).to_be_bytes());
            offset += (table.len() + 3) & !3;
        }
        for (_, table) in tables {
            data.extend_from_slice(table);
            while data.len() % 4 != 0 {
                data.push(0);
            }
        }
        data
    }

    fn head_table(index_to_loc_format: i16) -> Vec<u8> {
        let mut head = Vec::new();
        head.extend(0x0001_0000u32.to_be_bytes());
        head.extend([0u8; 12]); // revision, checksum adjustment, magic
        head.extend(0u16.to_be_bytes()); // flags
        head.extend(1000u16.to_be_bytes()); // unitsPerEm
        head.extend([0u8; 16]); // created, modified
        for v in [0i16, -200, 1000, 1000] {
            head.extend(v.to_be_bytes());
        }
        head.extend([0u8; 4]); // macStyle, lowestRecPPEM
        head.extend(0i16.to_be_bytes()); // fontDirectionHint
        head.extend(index_to_loc_format.to_be_bytes());
        head.extend(0i16.to_be_bytes()); // glyphDataFormat
        head
    }

    fn hhea_table(number_of_h_metrics: u16) -> Vec<u8> {
        let mut hhea = Vec::new();
        hhea.extend(0x0001_0000u32.to_be_bytes());
        for v in [800i16, -200, 0] {
            hhea.extend(v.to_be_bytes());
        }
        hhea.extend([0u8; 24]); // extents, caret, reserved, metricDataFormat
        hhea.extend(number_of_h_metrics.to_be_bytes());
        hhea
    }

    fn hmtx_table(metrics: &[(u16, i16)]) -> Vec<u8> {
        let mut hmtx = Vec::new();
        for &(advance, lsb) in metrics {
            hmtx.extend(advance.to_be_bytes());
            hmtx.extend(lsb.to_be_bytes());
        }
        hmtx
    }

    fn maxp_table(version: u32, num_glyphs: u16) -> Vec<u8> {
        let mut maxp = Vec::new();
        maxp.extend(version.to_be_bytes());
        maxp.extend(num_glyphs.to_be_bytes());
        maxp
    }

    /// Format 4 cmap mapping 'A' → glyph 1 and 'V' → glyph 2
    fn cmap_table() -> Vec<u8> {
        let mut cmap = u16s(&[0, 1, 3, 1]);
        cmap.extend(12u32.to_be_bytes());
        cmap.extend(u16s(&[4, 0, 0, 6, 0, 0, 0]));
        cmap.extend(u16s(&[65, 86, 0xFFFF])); // endCodes
        cmap.extend(u16s(&[0])); // reservedPad
        cmap.extend(u16s(&[65, 86, 0xFFFF])); // startCodes
        for delta in [1i16 - 65, 2 - 86, 1] {
            cmap.extend(delta.to_be_bytes());
        }
        cmap.extend(u16s(&[0, 0, 0])); // idRangeOffsets
        cmap
    }

    fn square_glyph() -> Vec<u8> {
        let mut glyph = Vec::new();
        glyph.extend(1i16.to_be_bytes());
        for v in [0i16, 0, 1000, 1000] {
            glyph.extend(v.to_be_bytes());
        }
        glyph.extend(3u16.to_be_bytes());
        glyph.extend(0u16.to_be_bytes());
        glyph.push(0x01 | 0x08); // on-curve, repeat
        glyph.push(3);
        for v in [0i16, 1000, 0, -1000] {
            glyph.extend(v.to_be_bytes());
        }
        for v in [0i16, 0, 1000, 0] {
            glyph.extend(v.to_be_bytes());
        }
        glyph
    }

    fn name_table() -> Vec<u8> {
        let family = b"Test Sans";
        let mut name = u16s(&[0, 1, 6 + 12]);
        name.extend(u16s(&[1, 0, 0, 1])); // Mac, Roman, English, family
        name.extend(u16s(&[family.len() as u16, 0]));
        name.extend_from_slice(family);
        name
    }

    /// PairPos format 2: Coverage {1}, ClassDef1 {1→1}, ClassDef2 {2→1},
    /// matrix [[0,0],[0,-80]]
    fn gpos_table() -> Vec<u8> {
        let mut gpos = u16s(&[1, 0, 0, 0, 10]);
        gpos.extend(u16s(&[1, 4]));
        gpos.extend(u16s(&[2, 0, 1, 8]));
        gpos.extend(u16s(&[2, 24, 0x0004, 0, 30, 38, 2, 2]));
        gpos.extend(u16s(&[0, 0, 0]));
        gpos.extend((-80i16).to_be_bytes());
        gpos.extend(u16s(&[1, 1, 1])); // coverage
        gpos.extend(u16s(&[1, 1, 1, 1])); // classDef1
        gpos.extend(u16s(&[2, 1, 2, 2, 1])); // classDef2
        gpos
    }

    /// Three glyphs: empty notdef, then two copies of the unit square
    fn truetype_font() -> Vec<u8> {
        let glyph = square_glyph();
        let mut glyf = glyph.clone();
        glyf.extend_from_slice(&glyph);

        let mut loca = Vec::new();
        for v in [0u32, 0, glyph.len() as u32, 2 * glyph.len() as u32] {
            loca.extend(v.to_be_bytes());
        }

        sfnt(
            0x0001_0000,
            &[
                (*b"head", head_table(1)),
                (*b"maxp", maxp_table(0x0001_0000, 3)),
                (*b"hhea", hhea_table(3)),
                (*b"hmtx", hmtx_table(&[(600, 0), (550, 10), (500, 10)])),
                (*b"cmap", cmap_table()),
                (*b"loca", loca),
                (*b"glyf", glyf),
                (*b"name", name_table()),
                (*b"GPOS", gpos_table()),
            ],
        )
    }

    /// A CFF flavored OpenType: notdef plus one glyph drawing an open line
    fn cff_font() -> Vec<u8> {
        let mut cff = vec![1, 0, 4, 1];
        cff.extend_from_slice(&[0x00, 0x01, 0x01, 0x01, 0x02, b'T']); // Name INDEX

        let top_dict_len = 5 + 1;
        let charstrings_offset = 4 + 6 + (2 + 1 + 2 + top_dict_len) + 2 + 2;

        let mut top_dict = Vec::new();
        top_dict.push(29);
        top_dict.extend((charstrings_offset as i32).to_be_bytes());
        top_dict.push(17);

        cff.extend_from_slice(&[0x00, 0x01, 0x01, 0x01]);
        cff.push(1 + top_dict_len as u8);
        cff.extend_from_slice(&top_dict);
        cff.extend_from_slice(&[0x00, 0x00]); // String INDEX
        cff.extend_from_slice(&[0x00, 0x00]); // Global Subr INDEX

        // glyph 1: 50 50 rmoveto 100 hlineto endchar
        let notdef: &[u8] = &[14];
        let glyph: &[u8] = &[28, 0, 50, 28, 0, 50, 21, 28, 0, 100, 6, 14];
        assert_eq!(cff.len(), charstrings_offset);
        cff.extend_from_slice(&[0x00, 0x02, 0x01]);
        cff.push(1);
        cff.push(1 + notdef.len() as u8);
        cff.push(1 + notdef.len() as u8 + glyph.len() as u8);
        cff.extend_from_slice(notdef);
        cff.extend_from_slice(glyph);

        sfnt(
            0x4F54_544F, // 'OTTO'
            &[
                (*b"head", head_table(0)),
                (*b"maxp", maxp_table(0x0000_5000, 2)),
                (*b"hhea", hhea_table(2)),
                (*b"hmtx", hmtx_table(&[(250, 0), (500, 0)])),
                (*b"cmap", cmap_table()),
                (*b"CFF ", cff),
            ],
        )
    }

    fn wrap_in_woff(sfnt_data: &[u8]) -> Vec<u8> {
        let directory = crate::font::TableDirectory::parse(sfnt_data).unwrap();
        let tables: Vec<([u8; 4], Vec<u8>)> = directory
            .entries
            .iter()
            .map(|entry| {
                let start = entry.offset as usize;
                let end = start + entry.length as usize;
                (entry.tag.0, sfnt_data[start..end].to_vec())
            })
            .collect();

        let mut sfnt_size = 12 + tables.len() * 16;
        for (_, payload) in &tables {
            sfnt_size = (sfnt_size + payload.len() + 3) & !3;
        }

        let mut woff = Vec::new();
        woff.extend(0x774F_4646u32.to_be_bytes());
        woff.extend(directory.sfnt_version.to_be_bytes());
        woff.extend(0u32.to_be_bytes());
        woff.extend((tables.len() as u16).to_be_bytes());
        woff.extend(0u16.to_be_bytes());
        woff.extend((sfnt_size as u32).to_be_bytes());
        woff.extend([0u8; 24]);

        let mut payload_offset = 44 + tables.len() * 20;
        let mut payloads = Vec::new();
        for (tag, payload) in &tables {
            let mut encoder =
                flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::best());
            encoder.write_all(payload).unwrap();
            let packed = encoder.finish().unwrap();
            let packed = if packed.len() < payload.len() {
                packed
            } else {
                payload.clone()
            };

            woff.extend_from_slice(tag);
            woff.extend((payload_offset as u32).to_be_bytes());
            woff.extend((packed.len() as u32).to_be_bytes());
            woff.extend((payload.len() as u32).to_be_bytes());
            woff.extend(0u32.to_be_bytes());

            payload_offset += packed.len();
            payloads.push(packed);
        }
        for packed in payloads {
            woff.extend_from_slice(&packed);
        }

        let total = woff.len() as u32;
        woff[8..12].copy_from_slice(&total.to_be_bytes());
        woff
    }

    #[test]
    fn truetype_end_to_end() {
        let font = truetype_font();

        let record = parse(&font, &ParseOptions::default()).unwrap();

        assert_eq!(record.family_name, "Test Sans");
        assert_eq!(record.resolution, 1000);
        assert_eq!(record.ascender, 800);
        assert_eq!(record.descender, -200);
        assert_eq!(record.bounding_box.y_min, -200);
        assert_eq!(record.meta.kind, "TrueType");
        assert_eq!(record.meta.total_mapped, 2);
        assert_eq!(record.meta.converted_glyphs, 2);
        assert_eq!(record.meta.error_glyphs, 0);

        let a = &record.glyphs["A"];
        assert_eq!(a.ha, 550);
        assert_eq!(a.o, "m 0 0 l 1000 0 l 1000 1000 l 0 1000");
        assert_eq!(record.glyphs["V"].ha, 500);

        assert_eq!(record.kerning["A"]["V"], -80);
    }

    #[test]
    fn woff_wrapped_font_matches_direct_parse() {
        let font = truetype_font();
        let woff = wrap_in_woff(&font);

        let direct = parse(&font, &ParseOptions::default()).unwrap();
        let unwrapped = parse(&woff, &ParseOptions::default()).unwrap();

        assert_eq!(direct, unwrapped);
    }

    #[test]
    fn parsing_is_idempotent() {
        let font = truetype_font();

        let first = parse(&font, &ParseOptions::default()).unwrap();
        let second = parse(&font, &ParseOptions::default()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn character_filter_restricts_output_and_kerning() {
        let font = truetype_font();

        let options = ParseOptions {
            characters: Some(vec!['A']),
            ..ParseOptions::default()
        };
        let record = parse(&font, &options).unwrap();

        assert_eq!(record.glyphs.len(), 1);
        assert!(record.glyphs.contains_key("A"));
        // the kerning pair's second character is absent from the output
        assert!(record.kerning.is_empty());
        // totalMapped still reflects the whole cmap
        assert_eq!(record.meta.total_mapped, 2);
    }

    #[test]
    fn cff_end_to_end() {
        let font = cff_font();

        let record = parse(&font, &ParseOptions::default()).unwrap();

        assert_eq!(record.meta.kind, "CFF/OTF");
        assert_eq!(record.original_font_information.format, "CFF/OTF");

        let a = &record.glyphs["A"];
        assert_eq!(a.ha, 500);
        assert_eq!(a.o, "m 50 50 l 150 50");
        // glyph 2 has no charstring: recovered as an error glyph
        assert_eq!(record.glyphs["V"].o, "");
        assert_eq!(record.meta.error_glyphs, 1);
        assert_eq!(record.meta.converted_glyphs, 1);
    }

    #[test]
    fn missing_required_table_is_fatal() {
        let font = sfnt(0x0001_0000, &[(*b"head", head_table(1))]);

        let err = parse(&font, &ParseOptions::default()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<FontError>(),
            Some(FontError::MissingTable("maxp"))
        ));
    }

    #[test]
    fn sfnt_without_outlines_is_unsupported() {
        let font = sfnt(
            0x0001_0000,
            &[
                (*b"head", head_table(1)),
                (*b"maxp", maxp_table(0x0001_0000, 3)),
                (*b"hhea", hhea_table(3)),
                (*b"hmtx", hmtx_table(&[(600, 0), (550, 10), (500, 10)])),
                (*b"cmap", cmap_table()),
            ],
        );

        let err = parse(&font, &ParseOptions::default()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<FontError>(),
            Some(FontError::UnsupportedFormat(_))
        ));
    }
}
