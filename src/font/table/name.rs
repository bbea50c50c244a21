use std::collections::BTreeMap;

use crate::{
    error::FontResult,
    parse_binary::{BinaryParser, ByteReader},
};

pub mod name_id {
    pub const COPYRIGHT: u16 = 0;
    pub const FONT_FAMILY: u16 = 1;
    pub const FONT_SUBFAMILY: u16 = 2;
    pub const FULL_NAME: u16 = 4;
    pub const VERSION: u16 = 5;
    pub const POSTSCRIPT_NAME: u16 = 6;
    pub const DESIGNER: u16 = 9;
}

/// Decoded naming table: one string per name id.
///
/// Windows (platform 3) UTF-16BE entries win over Mac ASCII; failing both,
/// the first record seen for a name id is kept.
#[derive(Debug, Default)]
pub struct NameTable {
    names: BTreeMap<u16, String>,
}

struct NameRecord {
    platform_id: u16,
    name_id: u16,
    length: u16,
    offset: u16,
}

impl NameTable {
    pub fn parse(table: &[u8]) -> FontResult<Self> {
        let mut reader = ByteReader::new(table);

        let _format = reader.parse_u16()?;
        let count = reader.parse_u16()?;
        let string_offset = reader.parse_u16()? as usize;

        let mut records = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let platform_id = reader.parse_u16()?;
            let _encoding_id = reader.parse_u16()?;
            let _language_id = reader.parse_u16()?;
            let name_id = reader.parse_u16()?;
            let length = reader.parse_u16()?;
            let offset = reader.parse_u16()?;

            records.push(NameRecord {
                platform_id,
                name_id,
                length,
                offset,
            });
        }

        let mut names = BTreeMap::new();
        let mut scores: BTreeMap<u16, u8> = BTreeMap::new();

        for record in records {
            let start = string_offset + record.offset as usize;
            let end = start + record.length as usize;
            let Some(bytes) = table.get(start..end) else {
                continue;
            };

            let (score, decoded) = match record.platform_id {
                // Windows and Unicode strings are UTF-16BE
                3 | 0 => (3, decode_utf16_be(bytes)),
                1 => (2, decode_ascii(bytes)),
                _ => (1, decode_ascii(bytes)),
            };

            let best = scores.get(&record.name_id).copied().unwrap_or(0);
            if score > best {
                scores.insert(record.name_id, score);
                names.insert(record.name_id, decoded);
            }
        }

        Ok(Self { names })
    }

    pub fn get(&self, name_id: u16) -> Option<&str> {
        self.names.get(&name_id).map(String::as_str)
    }
}

fn decode_utf16_be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    String::from_utf16_lossy(&units)
}

fn decode_ascii(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
