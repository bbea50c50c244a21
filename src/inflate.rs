//! RFC 1951 raw DEFLATE decoding, used to unpack WOFF table payloads.

use crate::error::FontResult;

/// Order in which code-length code lengths are stored in a dynamic block
const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];
const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];
const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];
const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

const MAX_CODE_BITS: usize = 15;

/// Decompress a zlib stream (2-byte header + raw deflate). The Adler-32
/// trailer is not verified; WOFF carries its own per-table checksums.
pub fn inflate_zlib(data: &[u8], size_hint: usize) -> FontResult<Vec<u8>> {
    anyhow::ensure!(data.len() >= 2, "zlib stream too short");
    anyhow::ensure!(data[0] & 0x0F == 8, "zlib compression method must be 8");

    inflate_raw(&data[2..], size_hint)
}

/// Decompress a raw RFC 1951 stream. `size_hint` bounds the output
/// allocation; inflating past it is an error, not a reallocation.
pub fn inflate_raw(data: &[u8], size_hint: usize) -> FontResult<Vec<u8>> {
    let mut reader = BitReader::new(data);
    let mut output = Vec::with_capacity(size_hint);

    loop {
        let bfinal = reader.read_bits(1)? == 1;
        let btype = reader.read_bits(2)?;

        match btype {
            0 => inflate_stored(&mut reader, &mut output, size_hint)?,
            1 => {
                let (lit_len, dist) = fixed_tables();
                inflate_block(&mut reader, &mut output, &lit_len, &dist, size_hint)?;
            }
            2 => {
                let (lit_len, dist) = dynamic_tables(&mut reader)?;
                inflate_block(&mut reader, &mut output, &lit_len, &dist, size_hint)?;
            }
            _ => anyhow::bail!("invalid deflate block type: {}", btype),
        }

        if bfinal {
            break;
        }
    }

    Ok(output)
}

fn inflate_stored(reader: &mut BitReader, output: &mut Vec<u8>, limit: usize) -> FontResult<()> {
    reader.align_to_byte();

    let len = reader.read_u16_le()?;
    let nlen = reader.read_u16_le()?;
    anyhow::ensure!(len == !nlen, "stored block length check failed");
    anyhow::ensure!(output.len() + len as usize <= limit, "inflate output overflow");

    output.extend_from_slice(reader.read_bytes(len as usize)?);

    Ok(())
}

fn inflate_block(
    reader: &mut BitReader,
    output: &mut Vec<u8>,
    lit_len: &HuffmanTable,
    dist: &HuffmanTable,
    limit: usize,
) -> FontResult<()> {
    loop {
        let sym = lit_len.decode(reader)?;

        if sym < 256 {
            anyhow::ensure!(output.len() < limit, "inflate output overflow");
            output.push(sym as u8);
        } else if sym == 256 {
            return Ok(());
        } else {
            let idx = sym as usize - 257;
            anyhow::ensure!(idx < LENGTH_BASE.len(), "invalid length code: {}", sym);
            let length =
                LENGTH_BASE[idx] as usize + reader.read_bits(LENGTH_EXTRA[idx] as u32)? as usize;

            let dist_sym = dist.decode(reader)? as usize;
            anyhow::ensure!(dist_sym < DIST_BASE.len(), "invalid distance code: {}", dist_sym);
            let distance = DIST_BASE[dist_sym] as usize
                + reader.read_bits(DIST_EXTRA[dist_sym] as u32)? as usize;

            anyhow::ensure!(distance <= output.len(), "distance past start of output");
            anyhow::ensure!(output.len() + length <= limit, "inflate output overflow");

            // The back-reference may overlap bytes this copy emits, so the
            // copy has to run a byte at a time
            let start = output.len() - distance;
            for i in 0..length {
                let b = output[start + i];
                output.push(b);
            }
        }
    }
}

fn fixed_tables() -> (HuffmanTable, HuffmanTable) {
    let mut lengths = [0u8; 288];
    lengths[0..144].fill(8);
    lengths[144..256].fill(9);
    lengths[256..280].fill(7);
    lengths[280..288].fill(8);

    let lit_len = HuffmanTable::from_lengths(&lengths).unwrap();
    let dist = HuffmanTable::from_lengths(&[5u8; 30]).unwrap();

    (lit_len, dist)
}

fn dynamic_tables(reader: &mut BitReader) -> FontResult<(HuffmanTable, HuffmanTable)> {
    let hlit = reader.read_bits(5)? as usize + 257;
    let hdist = reader.read_bits(5)? as usize + 1;
    let hclen = reader.read_bits(4)? as usize + 4;

    let mut code_lengths = [0u8; 19];
    for i in 0..hclen {
        code_lengths[CODE_LENGTH_ORDER[i]] = reader.read_bits(3)? as u8;
    }

    let code_length_table = HuffmanTable::from_lengths(&code_lengths)?;

    let mut lengths = vec![0u8; hlit + hdist];
    let mut i = 0;
    while i < lengths.len() {
        let sym = code_length_table.decode(reader)?;
        match sym {
            0..=15 => {
                lengths[i] = sym as u8;
                i += 1;
            }
            16 => {
                anyhow::ensure!(i > 0, "repeat code with no previous length");
                let previous = lengths[i - 1];
                let count = reader.read_bits(2)? as usize + 3;
                anyhow::ensure!(i + count <= lengths.len(), "repeat past end of lengths");
                lengths[i..i + count].fill(previous);
                i += count;
            }
            17 => {
                let count = reader.read_bits(3)? as usize + 3;
                anyhow::ensure!(i + count <= lengths.len(), "repeat past end of lengths");
                i += count;
            }
            18 => {
                let count = reader.read_bits(7)? as usize + 11;
                anyhow::ensure!(i + count <= lengths.len(), "repeat past end of lengths");
                i += count;
            }
            _ => anyhow::bail!("invalid code length symbol: {}", sym),
        }
    }

    let lit_len = HuffmanTable::from_lengths(&lengths[..hlit])?;
    let dist = HuffmanTable::from_lengths(&lengths[hlit..])?;

    Ok((lit_len, dist))
}

/// Canonical Huffman decoding state: `count[n]` codes of length `n`, and the
/// symbols ordered by (length, symbol)
struct HuffmanTable {
    count: [u16; MAX_CODE_BITS + 1],
    symbols: Vec<u16>,
}

impl HuffmanTable {
    fn from_lengths(lengths: &[u8]) -> FontResult<Self> {
        let mut count = [0u16; MAX_CODE_BITS + 1];
        for &len in lengths {
            anyhow::ensure!(len as usize <= MAX_CODE_BITS, "code length too long");
            count[len as usize] += 1;
        }

        let mut offsets = [0u16; MAX_CODE_BITS + 1];
        for len in 1..MAX_CODE_BITS {
            offsets[len + 1] = offsets[len] + count[len];
        }

        let mut symbols = vec![0u16; lengths.iter().filter(|&&l| l != 0).count()];
        for (sym, &len) in lengths.iter().enumerate() {
            if len != 0 {
                symbols[offsets[len as usize] as usize] = sym as u16;
                offsets[len as usize] += 1;
            }
        }

        Ok(Self { count, symbols })
    }

    /// Walk the code one bit at a time. Canonical codes of each length are
    /// contiguous, so a symbol is found as soon as the accumulated code falls
    /// inside the current length's range
    fn decode(&self, reader: &mut BitReader) -> FontResult<u16> {
        let mut code = 0usize;
        let mut first = 0usize;
        let mut index = 0usize;

        for len in 1..=MAX_CODE_BITS {
            code |= reader.read_bits(1)? as usize;
            let count = self.count[len] as usize;
            if code < first + count {
                return Ok(self.symbols[index + (code - first)]);
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }

        anyhow::bail!("invalid huffman code")
    }
}

/// LSB-first bit reader over the compressed stream
struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    bit_buffer: u32,
    bits_in_buffer: u32,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            bit_buffer: 0,
            bits_in_buffer: 0,
        }
    }

    fn read_bits(&mut self, n: u32) -> FontResult<u32> {
        if n == 0 {
            return Ok(0);
        }

        while self.bits_in_buffer < n {
            let byte = *self
                .data
                .get(self.pos)
                .ok_or(anyhow::anyhow!("unexpected end of deflate stream"))?;
            self.bit_buffer |= (byte as u32) << self.bits_in_buffer;
            self.bits_in_buffer += 8;
            self.pos += 1;
        }

        let value = self.bit_buffer & ((1u32 << n) - 1);
        self.bit_buffer >>= n;
        self.bits_in_buffer -= n;

        Ok(value)
    }

    fn align_to_byte(&mut self) {
        self.bit_buffer = 0;
        self.bits_in_buffer = 0;
    }

    fn read_u16_le(&mut self) -> FontResult<u16> {
        let lo = self.read_byte()?;
        let hi = self.read_byte()?;

        Ok(u16::from_le_bytes([lo, hi]))
    }

    fn read_byte(&mut self) -> FontResult<u8> {
        let b = self
            .data
            .get(self.pos)
            .copied()
            .ok_or(anyhow::anyhow!("unexpected end of deflate stream"))?;
        self.pos += 1;
        Ok(b)
    }

    fn read_bytes(&mut self, n: usize) -> FontResult<&'a [u8]> {
        anyhow::ensure!(self.pos + n <= self.data.len(), "unexpected end of deflate stream");
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }
}
