//! DELTA_BINARY_PACKED for INT32/INT64.
//!
//! Layout: `varint(block_size) varint(miniblocks_per_block) varint(total_count)
//! zigzag(first_value)` then per block `zigzag(min_delta)`, one bit-width byte
//! per miniblock, and the miniblock bodies packed LSB-first. Unused trailing
//! miniblocks of the last block keep their width byte (zero) and have no body.

use std::mem;

use bytes::Bytes;
use parq_core::errors::Result;
use parq_core::util::bit_util::{bit_packer, num_required_bits, BitReader, PackOrder};
use parq_format::basic::Encoding;

use super::Encoder;

const BLOCK_SIZE: usize = 128;
const MINIBLOCKS_PER_BLOCK: usize = 4;
const MINIBLOCK_SIZE: usize = BLOCK_SIZE / MINIBLOCKS_PER_BLOCK;

pub struct DeltaBitPackEncoder {
    first_value: i64,
    previous: i64,
    total_count: usize,
    deltas: Vec<i64>,
    blocks: Vec<u8>,
}

impl DeltaBitPackEncoder {
    pub fn new() -> Self {
        Self {
            first_value: 0,
            previous: 0,
            total_count: 0,
            deltas: Vec::with_capacity(BLOCK_SIZE),
            blocks: Vec::new(),
        }
    }

    pub fn put_i64(&mut self, value: i64) {
        if self.total_count == 0 {
            self.first_value = value;
        } else {
            self.deltas.push(value.wrapping_sub(self.previous));
        }
        self.previous = value;
        self.total_count += 1;
        if self.deltas.len() == BLOCK_SIZE {
            self.flush_block();
        }
    }

    fn flush_block(&mut self) {
        debug_assert!(!self.deltas.is_empty());
        let min_delta = *self.deltas.iter().min().unwrap();
        put_zigzag(&mut self.blocks, min_delta);

        let mut widths = [0u8; MINIBLOCKS_PER_BLOCK];
        for (i, chunk) in self.deltas.chunks(MINIBLOCK_SIZE).enumerate() {
            let max_packed = chunk
                .iter()
                .map(|d| d.wrapping_sub(min_delta) as u64)
                .max()
                .unwrap_or(0);
            widths[i] = num_required_bits(max_packed);
        }
        self.blocks.extend_from_slice(&widths);

        for (i, chunk) in self.deltas.chunks(MINIBLOCK_SIZE).enumerate() {
            let width = widths[i] as usize;
            if width == 0 {
                continue;
            }
            let packer = bit_packer(PackOrder::LittleEndian, width);
            // eight-value groups, the trailing partial one zero padded
            let mut start = 0;
            while start < MINIBLOCK_SIZE {
                let mut group = [0u64; 8];
                for (j, slot) in group.iter_mut().enumerate() {
                    if let Some(d) = chunk.get(start + j) {
                        *slot = d.wrapping_sub(min_delta) as u64;
                    }
                }
                packer.pack8(&group, &mut self.blocks);
                start += 8;
            }
        }
        self.deltas.clear();
    }

    pub fn value_count(&self) -> usize {
        self.total_count
    }

    pub fn size_estimate(&self) -> usize {
        self.blocks.len() + self.deltas.len() * mem::size_of::<i64>() + 24
    }

    fn consume(&mut self) -> Vec<u8> {
        if !self.deltas.is_empty() {
            self.flush_block();
        }
        let mut out = Vec::with_capacity(self.blocks.len() + 24);
        put_varint(&mut out, BLOCK_SIZE as u64);
        put_varint(&mut out, MINIBLOCKS_PER_BLOCK as u64);
        put_varint(&mut out, self.total_count as u64);
        put_zigzag(&mut out, self.first_value);
        out.append(&mut self.blocks);
        self.first_value = 0;
        self.previous = 0;
        self.total_count = 0;
        out
    }
}

impl Default for DeltaBitPackEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<i64> for DeltaBitPackEncoder {
    fn put(&mut self, value: &i64) -> Result<()> {
        self.put_i64(*value);
        Ok(())
    }

    fn buffered_size(&self) -> usize {
        self.size_estimate()
    }

    fn allocated_size(&self) -> usize {
        self.blocks.capacity() + self.deltas.capacity() * mem::size_of::<i64>()
    }

    fn encoding(&self) -> Encoding {
        Encoding::DeltaBinaryPacked
    }

    fn take_bytes(&mut self) -> Result<Bytes> {
        Ok(Bytes::from(self.consume()))
    }
}

impl Encoder<i32> for DeltaBitPackEncoder {
    fn put(&mut self, value: &i32) -> Result<()> {
        self.put_i64(*value as i64);
        Ok(())
    }

    fn buffered_size(&self) -> usize {
        self.size_estimate()
    }

    fn allocated_size(&self) -> usize {
        self.blocks.capacity() + self.deltas.capacity() * mem::size_of::<i64>()
    }

    fn encoding(&self) -> Encoding {
        Encoding::DeltaBinaryPacked
    }

    fn take_bytes(&mut self) -> Result<Bytes> {
        Ok(Bytes::from(self.consume()))
    }
}

fn put_varint(buf: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        buf.push((v as u8 & 0x7F) | 0x80);
        v >>= 7;
    }
    buf.push(v as u8);
}

fn put_zigzag(buf: &mut Vec<u8>, v: i64) {
    put_varint(buf, ((v << 1) ^ (v >> 63)) as u64);
}

/// Test-support decoder, the exact inverse of the encoder above.
pub fn decode_delta_i64(data: &[u8]) -> Option<Vec<i64>> {
    let mut r = BitReader::new(data);
    let block_size = r.get_vlq_int()? as usize;
    let miniblocks = r.get_vlq_int()? as usize;
    let total = r.get_vlq_int()? as usize;
    let first = r.get_zigzag_vlq_int()?;
    let miniblock_size = block_size / miniblocks;

    let mut out = Vec::with_capacity(total);
    if total == 0 {
        return Some(out);
    }
    out.push(first);
    let mut previous = first;
    while out.len() < total {
        let min_delta = r.get_zigzag_vlq_int()?;
        let widths: Vec<u8> = r.get_aligned_bytes(miniblocks)?.to_vec();
        for &width in &widths {
            if out.len() >= total {
                break;
            }
            let body = r.get_aligned_bytes(miniblock_size * width as usize / 8)?;
            let mut bits = BitReader::new(body);
            for _ in 0..miniblock_size {
                let packed = if width == 0 {
                    0
                } else {
                    bits.get_value(width as usize)?
                };
                if out.len() < total {
                    previous = previous.wrapping_add(min_delta.wrapping_add(packed as i64));
                    out.push(previous);
                }
            }
        }
    }
    Some(out)
}
