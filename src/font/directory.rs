use std::fmt::{self, Write};

use crate::{
    error::{FontError, FontResult},
    parse_binary::{BinaryParser, ByteReader},
};

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TableTag(pub [u8; 4]);

impl TableTag {
    pub const fn new(tag: [u8; 4]) -> Self {
        Self(tag)
    }
}

impl fmt::Debug for TableTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(self.0[0] as char)?;
        f.write_char(self.0[1] as char)?;
        f.write_char(self.0[2] as char)?;
        f.write_char(self.0[3] as char)?;

        Ok(())
    }
}

#[derive(Debug)]
pub struct DirectoryEntry {
    pub tag: TableTag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// The SFNT table directory: tag → (offset, length), parsed once per font
#[derive(Debug)]
pub struct TableDirectory {
    pub sfnt_version: u32,
    pub entries: Vec<DirectoryEntry>,
}

impl TableDirectory {
    pub fn parse(buffer: &[u8]) -> FontResult<Self> {
        if buffer.len() < 12 {
            anyhow::bail!(FontError::InputTooSmall);
        }

        let mut reader = ByteReader::new(buffer);

        let sfnt_version = reader.parse_u32()?;
        let number_of_tables = reader.parse_u16()?;
        let _search_range = reader.parse_u16()?;
        let _entry_selector = reader.parse_u16()?;
        let _range_shift = reader.parse_u16()?;

        let mut entries = Vec::with_capacity(usize::from(number_of_tables));
        for _ in 0..number_of_tables {
            let tag = TableTag::new(reader.parse_tag()?);
            let checksum = reader.parse_u32()?;
            let offset = reader.parse_u32()?;
            let length = reader.parse_u32()?;

            entries.push(DirectoryEntry {
                tag,
                checksum,
                offset,
                length,
            });
        }

        Ok(Self {
            sfnt_version,
            entries,
        })
    }

    pub fn find_table<'a>(&self, buffer: &'a [u8], tag: [u8; 4]) -> Option<&'a [u8]> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.tag == TableTag::new(tag))?;

        let start = entry.offset as usize;
        let end = start.checked_add(entry.length as usize)?;

        buffer.get(start..end)
    }

    /// Like [`find_table`](Self::find_table) but absence is a fatal error
    pub fn require_table<'a>(
        &self,
        buffer: &'a [u8],
        tag: [u8; 4],
        name: &'static str,
    ) -> FontResult<&'a [u8]> {
        self.find_table(buffer, tag)
            .ok_or(anyhow::anyhow!(FontError::MissingTable(name)))
    }
}
