//! WOFF container unwrapping: reconstructs the original SFNT buffer,
//! inflating per-table payloads.

use std::borrow::Cow;

use crate::{
    error::{FontError, FontResult},
    inflate,
    parse_binary::{BinaryParser, ByteReader},
};

const WOFF_SIGNATURE: u32 = 0x774F_4646; // 'wOFF'
const WOFF2_SIGNATURE: u32 = 0x774F_4632; // 'wOF2'

#[derive(Debug)]
struct WoffTableEntry {
    tag: [u8; 4],
    offset: u32,
    comp_length: u32,
    orig_length: u32,
    orig_checksum: u32,
}

/// Dispatch on the first four bytes: WOFF is unwrapped into a fresh SFNT
/// buffer, WOFF2 is rejected, anything else is assumed SFNT and returned
/// unchanged.
pub fn unwrap_container(data: &[u8]) -> FontResult<Cow<'_, [u8]>> {
    if data.len() < 4 {
        anyhow::bail!(FontError::InputTooSmall);
    }

    match u32::from_be_bytes([data[0], data[1], data[2], data[3]]) {
        WOFF_SIGNATURE => Ok(Cow::Owned(unwrap_woff(data)?)),
        WOFF2_SIGNATURE => anyhow::bail!(FontError::UnsupportedFormat(
            "WOFF2 requires Brotli".into()
        )),
        _ => Ok(Cow::Borrowed(data)),
    }
}

fn corrupt(why: &str) -> anyhow::Error {
    anyhow::anyhow!(FontError::CorruptContainer(why.into()))
}

fn unwrap_woff(data: &[u8]) -> FontResult<Vec<u8>> {
    if data.len() < 44 {
        return Err(corrupt("truncated WOFF header"));
    }

    let mut reader = ByteReader::new(data);

    let _signature = reader.parse_u32()?;
    let flavor = reader.parse_u32()?;
    let _length = reader.parse_u32()?;
    let num_tables = reader.parse_u16()?;
    let _reserved = reader.parse_u16()?;
    let total_sfnt_size = reader.parse_u32()? as usize;
    let _major_version = reader.parse_u16()?;
    let _minor_version = reader.parse_u16()?;
    let _meta_offset = reader.parse_u32()?;
    let _meta_length = reader.parse_u32()?;
    let _meta_orig_length = reader.parse_u32()?;
    let _priv_offset = reader.parse_u32()?;
    let _priv_length = reader.parse_u32()?;

    if num_tables == 0 {
        return Err(corrupt("WOFF table count is zero"));
    }

    let directory_size = 12 + num_tables as usize * 16;
    if total_sfnt_size < directory_size {
        return Err(corrupt("totalSfntSize smaller than its table directory"));
    }

    let mut entries = Vec::with_capacity(num_tables as usize);
    for _ in 0..num_tables {
        let tag = reader.parse_tag().map_err(|_| corrupt("truncated WOFF directory"))?;
        let offset = reader.parse_u32().map_err(|_| corrupt("truncated WOFF directory"))?;
        let comp_length = reader.parse_u32().map_err(|_| corrupt("truncated WOFF directory"))?;
        let orig_length = reader.parse_u32().map_err(|_| corrupt("truncated WOFF directory"))?;
        let orig_checksum = reader.parse_u32().map_err(|_| corrupt("truncated WOFF directory"))?;

        entries.push(WoffTableEntry {
            tag,
            offset,
            comp_length,
            orig_length,
            orig_checksum,
        });
    }

    let mut output = vec![0u8; total_sfnt_size];

    // SFNT header: the flavor repeats the original sfnt version, and the
    // binary-search fields are recomputed from the table count
    let entry_selector = 15 - num_tables.leading_zeros() as u16;
    let search_range = (1u32 << entry_selector) * 16;
    let range_shift = u32::from(num_tables) * 16 - search_range;

    output[0..4].copy_from_slice(&flavor.to_be_bytes());
    output[4..6].copy_from_slice(&num_tables.to_be_bytes());
    output[6..8].copy_from_slice(&(search_range as u16).to_be_bytes());
    output[8..10].copy_from_slice(&entry_selector.to_be_bytes());
    output[10..12].copy_from_slice(&(range_shift as u16).to_be_bytes());

    // Table payloads land at a 4-byte-aligned running offset past the
    // directory
    let mut data_offset = directory_size;

    for (i, entry) in entries.iter().enumerate() {
        let dir_offset = 12 + i * 16;
        output[dir_offset..dir_offset + 4].copy_from_slice(&entry.tag);
        output[dir_offset + 4..dir_offset + 8].copy_from_slice(&entry.orig_checksum.to_be_bytes());
        output[dir_offset + 8..dir_offset + 12]
            .copy_from_slice(&(data_offset as u32).to_be_bytes());
        output[dir_offset + 12..dir_offset + 16].copy_from_slice(&entry.orig_length.to_be_bytes());

        let payload_start = entry.offset as usize;
        let payload_end = payload_start
            .checked_add(entry.comp_length as usize)
            .ok_or_else(|| corrupt("WOFF table payload overflows"))?;
        if payload_end > data.len() {
            return Err(corrupt("WOFF table payload past end of file"));
        }
        let payload = &data[payload_start..payload_end];

        let table_end = data_offset + entry.orig_length as usize;
        if table_end > total_sfnt_size {
            return Err(corrupt("table does not fit in totalSfntSize"));
        }

        if entry.comp_length < entry.orig_length {
            let inflated = inflate::inflate_zlib(payload, entry.orig_length as usize)
                .map_err(|err| corrupt(&format!("inflate failed: {}", err)))?;
            if inflated.len() != entry.orig_length as usize {
                return Err(corrupt("inflated table has wrong length"));
            }
            output[data_offset..table_end].copy_from_slice(&inflated);
        } else {
            if entry.comp_length != entry.orig_length {
                return Err(corrupt("compLength larger than origLength"));
            }
            output[data_offset..table_end].copy_from_slice(payload);
        }

        data_offset = (table_end + 3) & !3;
    }

    Ok(output)
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::best());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    /// Wrap (tag, payload) tables into a WOFF buffer, compressing each
    /// payload when that actually shrinks it
    fn build_woff(flavor: u32, tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
        let num_tables = tables.len() as u16;
        let mut sfnt_size = 12 + tables.len() * 16;
        for (_, payload) in tables {
            sfnt_size = (sfnt_size + payload.len() + 3) & !3;
        }

        let mut woff = Vec::new();
        woff.extend_from_slice(&0x774F4646u32.to_be_bytes());
        woff.extend_from_slice(&flavor.to_be_bytes());
        woff.extend_from_slice(&0u32.to_be_bytes()); // length, patched below
        woff.extend_from_slice(&num_tables.to_be_bytes());
        woff.extend_from_slice(&0u16.to_be_bytes());
        woff.extend_from_slice(&(sfnt_size as u32).to_be_bytes());
        woff.extend_from_slice(&[0u8; 24]); // versions + meta + priv

        let mut payload_offset = 44 + tables.len() * 20;
        let mut compressed = Vec::new();
        for (tag, payload) in tables {
            let packed = zlib(payload);
            let packed = if packed.len() < payload.len() {
                packed
            } else {
                payload.clone()
            };

            woff.extend_from_slice(tag);
            woff.extend_from_slice(&(payload_offset as u32).to_be_bytes());
            woff.extend_from_slice(&(packed.len() as u32).to_be_bytes());
            woff.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            woff.extend_from_slice(&0u32.to_be_bytes());

            payload_offset += packed.len();
            compressed.push(packed);
        }

        for packed in compressed {
            woff.extend_from_slice(&packed);
        }

        let total = woff.len() as u32;
        woff[8..12].copy_from_slice(&total.to_be_bytes());

        woff
    }

    #[test]
    fn sfnt_passes_through_unchanged() {
        let data = [0x00, 0x01, 0x00, 0x00, 0xAA, 0xBB];

        assert!(matches!(
            unwrap_container(&data).unwrap(),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn woff2_is_rejected() {
        let err = unwrap_container(&[0x77, 0x4F, 0x46, 0x32, 0, 0, 0, 0]).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<FontError>(),
            Some(FontError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn tiny_input_is_rejected() {
        let err = unwrap_container(&[0x77, 0x4F]).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<FontError>(),
            Some(FontError::InputTooSmall)
        ));
    }

    #[test]
    fn rebuilds_sfnt_header_and_payloads() {
        let compressible = b"compress me compress me compress me compress me".repeat(8);
        let woff = build_woff(
            0x0001_0000,
            &[
                (*b"cmap", vec![1, 2, 3, 4, 5]),
                (*b"glyf", compressible.clone()),
            ],
        );

        let sfnt = unwrap_container(&woff).unwrap();
        let mut reader = ByteReader::new(&sfnt);

        assert_eq!(reader.parse_u32().unwrap(), 0x0001_0000);
        assert_eq!(reader.parse_u16().unwrap(), 2); // numTables
        assert_eq!(reader.parse_u16().unwrap(), 32); // searchRange
        assert_eq!(reader.parse_u16().unwrap(), 1); // entrySelector
        assert_eq!(reader.parse_u16().unwrap(), 0); // rangeShift

        // first directory entry: cmap, offset just past the directory
        assert_eq!(reader.parse_tag().unwrap(), *b"cmap");
        let _checksum = reader.parse_u32().unwrap();
        let cmap_offset = reader.parse_u32().unwrap() as usize;
        let cmap_length = reader.parse_u32().unwrap() as usize;
        assert_eq!(cmap_offset, 12 + 2 * 16);
        assert_eq!(&sfnt[cmap_offset..cmap_offset + cmap_length], &[1, 2, 3, 4, 5]);

        // second entry starts 4-byte aligned and inflates to the original
        assert_eq!(reader.parse_tag().unwrap(), *b"glyf");
        let _checksum = reader.parse_u32().unwrap();
        let glyf_offset = reader.parse_u32().unwrap() as usize;
        let glyf_length = reader.parse_u32().unwrap() as usize;
        assert_eq!(glyf_offset % 4, 0);
        assert_eq!(&sfnt[glyf_offset..glyf_offset + glyf_length], &compressible[..]);
    }

    #[test]
    fn truncated_payload_is_corrupt() {
        let mut woff = build_woff(0x0001_0000, &[(*b"head", vec![9; 64])]);
        woff.truncate(woff.len() - 8);

        let err = unwrap_container(&woff).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FontError>(),
            Some(FontError::CorruptContainer(_))
        ));
    }
}
