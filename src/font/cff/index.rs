use crate::error::FontResult;

/// A CFF INDEX: `count + 1` one-based offsets over a byte payload.
///
/// Offsets are relative to the byte preceding the payload, so item `i`
/// spans `offsets[i] - 1 .. offsets[i + 1] - 1` of `data`.
#[derive(Debug, Clone)]
pub struct CffIndex<'a> {
    pub count: u32,
    offsets: Vec<u32>,
    data: &'a [u8],
}

impl<'a> CffIndex<'a> {
    pub fn empty() -> Self {
        Self {
            count: 0,
            offsets: Vec::new(),
            data: &[],
        }
    }

    pub fn get(&self, idx: usize) -> Option<&'a [u8]> {
        let start = (*self.offsets.get(idx)? as usize).checked_sub(1)?;
        let end = (*self.offsets.get(idx + 1)? as usize).checked_sub(1)?;

        self.data.get(start..end)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.count as usize).map_while(|i| self.get(i))
    }

    /// Subroutine numbers are biased by a count-dependent constant
    pub fn bias(&self) -> i32 {
        if self.count < 1240 {
            107
        } else if self.count < 33900 {
            1131
        } else {
            32768
        }
    }
}

/// Parse an INDEX at `*cursor`, advancing past it. CFF2 widens the count
/// field to 32 bits.
pub fn parse_index<'a>(
    buffer: &'a [u8],
    cursor: &mut usize,
    cff2: bool,
) -> FontResult<CffIndex<'a>> {
    let count = if cff2 {
        read_be(buffer, cursor, 4)?
    } else {
        read_be(buffer, cursor, 2)?
    };

    // an empty INDEX is just its count field
    if count == 0 {
        return Ok(CffIndex::empty());
    }

    let off_size = read_be(buffer, cursor, 1)? as usize;
    anyhow::ensure!((1..=4).contains(&off_size), "invalid INDEX offSize: {}", off_size);

    let mut offsets = Vec::with_capacity(count as usize + 1);
    for _ in 0..=count {
        offsets.push(read_be(buffer, cursor, off_size)?);
    }

    anyhow::ensure!(offsets[0] == 1, "INDEX offsets must start at 1");

    // offsets are relative to the byte just before the payload
    let payload_base = *cursor - 1;
    let payload_end = payload_base + *offsets.last().unwrap() as usize;
    let data = buffer
        .get(payload_base + 1..payload_end)
        .ok_or(anyhow::anyhow!("INDEX payload past end of buffer"))?;

    *cursor = payload_end;

    Ok(CffIndex {
        count,
        offsets,
        data,
    })
}

fn read_be(buffer: &[u8], cursor: &mut usize, width: usize) -> FontResult<u32> {
    let bytes = buffer
        .get(*cursor..*cursor + width)
        .ok_or(anyhow::anyhow!("unexpected eof in INDEX"))?;
    *cursor += width;

    Ok(bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn items_are_contiguous_and_cursor_lands_past_payload() {
        // two items: [0xAA] and [0xBB, 0xCC]
        let buffer = [0x00, 0x02, 0x01, 0x01, 0x02, 0x04, 0xAA, 0xBB, 0xCC, 0x99];
        let mut cursor = 0;

        let index = parse_index(&buffer, &mut cursor, false).unwrap();

        assert_eq!(index.count, 2);
        assert_eq!(index.get(0), Some(&[0xAA][..]));
        assert_eq!(index.get(1), Some(&[0xBB, 0xCC][..]));
        assert_eq!(index.get(2), None);
        assert_eq!(cursor, 9);
        assert_eq!(buffer[cursor], 0x99);
    }

    #[test]
    fn empty_index_is_only_its_count() {
        let buffer = [0x00, 0x00, 0x55];
        let mut cursor = 0;

        let index = parse_index(&buffer, &mut cursor, false).unwrap();

        assert_eq!(index.count, 0);
        assert_eq!(index.get(0), None);
        assert_eq!(cursor, 2);
    }

    #[test]
    fn cff2_count_is_four_bytes() {
        let buffer = [0x00, 0x00, 0x00, 0x01, 0x01, 0x01, 0x03, 0x01, 0x02];
        let mut cursor = 0;

        let index = parse_index(&buffer, &mut cursor, true).unwrap();

        assert_eq!(index.count, 1);
        assert_eq!(index.get(0), Some(&[0x01, 0x02][..]));
    }

    #[test]
    fn subr_bias_tiers() {
        let mut index = CffIndex::empty();
        assert_eq!(index.bias(), 107);

        index.count = 1240;
        assert_eq!(index.bias(), 1131);

        index.count = 33900;
        assert_eq!(index.bias(), 32768);
    }
}
