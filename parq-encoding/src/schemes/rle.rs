//! Hybrid RLE / bit-packed runs, the level and dictionary-index encoding.
//!
//! Stream grammar: `varint(header)` where the low bit selects the run kind.
//! `header >> 1` is the repeat count for an RLE run (value follows, padded
//! little-endian to `ceil(bit_width / 8)` bytes) or the number of 8-value
//! groups for a bit-packed run, packed through the registry's little-endian
//! family. A literal run is capped at 63 groups so its header always patches
//! into one byte.

use std::mem;

use bytes::Bytes;
use parq_core::errors::Result;
use parq_core::util::bit_util::{bit_packer, ceil, BitPacker, PackOrder};
use parq_format::basic::Encoding;

use super::Encoder;

const MAX_GROUPS_PER_LITERAL_RUN: usize = 63;

pub struct RleEncoder {
    bit_width: u8,
    packer: &'static BitPacker,
    buf: Vec<u8>,
    buffered: [u64; 8],
    num_buffered: usize,
    current_value: u64,
    repeat_count: usize,
    /// Groups written in the open literal run, and the position of its
    /// header byte to patch when the run closes.
    group_count: usize,
    literal_header_pos: Option<usize>,
}

impl RleEncoder {
    pub fn new(bit_width: u8) -> Self {
        debug_assert!(bit_width <= 64);
        Self {
            bit_width,
            packer: bit_packer(PackOrder::LittleEndian, bit_width as usize),
            buf: Vec::new(),
            buffered: [0; 8],
            num_buffered: 0,
            current_value: 0,
            repeat_count: 0,
            group_count: 0,
            literal_header_pos: None,
        }
    }

    pub fn bit_width(&self) -> u8 {
        self.bit_width
    }

    #[inline]
    pub fn put_u64(&mut self, value: u64) {
        debug_assert!(self.bit_width == 64 || value < (1u64 << self.bit_width));
        if value == self.current_value && self.repeat_count > 0 {
            self.repeat_count += 1;
            if self.repeat_count >= 8 {
                // run continues without buffering; converted to an rle run
                // when it breaks or at flush
                return;
            }
        } else {
            if self.repeat_count >= 8 {
                self.write_rle_run();
            }
            self.repeat_count = 1;
            self.current_value = value;
        }
        self.buffered[self.num_buffered] = value;
        self.num_buffered += 1;
        if self.num_buffered == 8 {
            self.write_bit_packed_group();
        }
    }

    fn write_rle_run(&mut self) {
        self.close_literal_run();
        write_varint(&mut self.buf, (self.repeat_count as u64) << 1);
        let n = ceil(self.bit_width as usize, 8);
        self.buf
            .extend_from_slice(&self.current_value.to_le_bytes()[..n]);
        self.repeat_count = 0;
        self.num_buffered = 0;
    }

    fn write_bit_packed_group(&mut self) {
        if self.group_count >= MAX_GROUPS_PER_LITERAL_RUN {
            self.close_literal_run();
        }
        if self.literal_header_pos.is_none() {
            self.literal_header_pos = Some(self.buf.len());
            self.buf.push(0);
        }
        self.packer.pack8(&self.buffered, &mut self.buf);
        self.group_count += 1;
        self.num_buffered = 0;
        self.repeat_count = 0;
    }

    fn close_literal_run(&mut self) {
        if let Some(pos) = self.literal_header_pos.take() {
            self.buf[pos] = ((self.group_count as u8) << 1) | 1;
            self.group_count = 0;
        }
    }

    pub fn flush(&mut self) {
        if self.repeat_count >= 8 {
            self.write_rle_run();
        } else if self.num_buffered > 0 {
            self.buffered[self.num_buffered..].fill(0);
            self.num_buffered = 8;
            self.write_bit_packed_group();
        }
        self.close_literal_run();
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty() && self.repeat_count == 0 && self.num_buffered == 0
    }

    /// Flushes pending runs and drains the stream.
    pub fn consume(&mut self) -> Vec<u8> {
        self.flush();
        self.current_value = 0;
        mem::take(&mut self.buf)
    }
}

impl Encoder<u64> for RleEncoder {
    fn put(&mut self, value: &u64) -> Result<()> {
        self.put_u64(*value);
        Ok(())
    }

    fn buffered_size(&self) -> usize {
        // worst case for what is still staged: one more literal group
        self.buf.len() + 1 + self.bit_width as usize
    }

    fn allocated_size(&self) -> usize {
        self.buf.capacity()
    }

    fn encoding(&self) -> Encoding {
        Encoding::Rle
    }

    fn take_bytes(&mut self) -> Result<Bytes> {
        Ok(Bytes::from(self.consume()))
    }
}

fn write_varint(buf: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        buf.push((v as u8 & 0x7F) | 0x80);
        v >>= 7;
    }
    buf.push(v as u8);
}

/// Decoder for the hybrid stream; the exact inverse of [`RleEncoder`].
pub struct RleDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    bit_width: usize,
    packer: &'static BitPacker,
    // current run state
    rle_value: u64,
    rle_left: usize,
    literal: [u64; 8],
    literal_pos: usize,
    literal_left: usize,
    literal_groups_left: usize,
}

impl<'a> RleDecoder<'a> {
    pub fn new(data: &'a [u8], bit_width: u8) -> Self {
        Self {
            data,
            pos: 0,
            bit_width: bit_width as usize,
            packer: bit_packer(PackOrder::LittleEndian, bit_width as usize),
            rle_value: 0,
            rle_left: 0,
            literal: [0; 8],
            literal_pos: 0,
            literal_left: 0,
            literal_groups_left: 0,
        }
    }

    fn read_varint(&mut self) -> Option<u64> {
        let mut v = 0u64;
        for i in 0..10 {
            let b = *self.data.get(self.pos)?;
            self.pos += 1;
            v |= ((b & 0x7F) as u64) << (7 * i);
            if b & 0x80 == 0 {
                return Some(v);
            }
        }
        None
    }

    fn refill_literal_group(&mut self) -> bool {
        if self.pos + self.bit_width > self.data.len() {
            return false;
        }
        self.packer.unpack8(
            &self.data[self.pos..self.pos + self.bit_width],
            &mut self.literal,
        );
        self.pos += self.bit_width;
        self.literal_pos = 0;
        self.literal_left = 8;
        self.literal_groups_left -= 1;
        true
    }

    pub fn next(&mut self) -> Option<u64> {
        loop {
            if self.rle_left > 0 {
                self.rle_left -= 1;
                return Some(self.rle_value);
            }
            if self.literal_left > 0 {
                self.literal_left -= 1;
                let v = self.literal[self.literal_pos];
                self.literal_pos += 1;
                return Some(v);
            }
            if self.literal_groups_left > 0 {
                if !self.refill_literal_group() {
                    return None;
                }
                continue;
            }
            let header = self.read_varint()?;
            if header & 1 == 1 {
                self.literal_groups_left = (header >> 1) as usize;
            } else {
                let n = ceil(self.bit_width, 8);
                if self.pos + n > self.data.len() {
                    return None;
                }
                let mut word = [0u8; 8];
                word[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
                self.pos += n;
                self.rle_value = u64::from_le_bytes(word);
                self.rle_left = (header >> 1) as usize;
            }
        }
    }

    pub fn collect_n(&mut self, n: usize) -> Option<Vec<u64>> {
        (0..n).map(|_| self.next()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn roundtrip(values: &[u64], bit_width: u8) {
        let mut enc = RleEncoder::new(bit_width);
        for &v in values {
            enc.put_u64(v);
        }
        let buf = enc.consume();
        let mut dec = RleDecoder::new(&buf, bit_width);
        let got = dec.collect_n(values.len()).expect("stream too short");
        assert_eq!(got, values);
    }

    #[test]
    fn test_long_repeat_is_one_rle_run() {
        let mut enc = RleEncoder::new(3);
        for _ in 0..100 {
            enc.put_u64(4);
        }
        let buf = enc.consume();
        // varint(100 << 1) = [0xC8, 0x01], one value byte
        assert_eq!(buf, vec![0xC8, 0x01, 4]);
    }

    #[test]
    fn test_literal_run_header_patched() {
        // 8 distinct values force a single bit-packed group
        let values: Vec<u64> = (0..8).collect();
        let mut enc = RleEncoder::new(3);
        for &v in &values {
            enc.put_u64(v);
        }
        let buf = enc.consume();
        assert_eq!(buf[0], (1 << 1) | 1);
        assert_eq!(buf.len(), 1 + 3);
        roundtrip(&values, 3);
    }

    #[test]
    fn test_mixed_runs_roundtrip() {
        let mut values = Vec::new();
        values.extend(std::iter::repeat(7u64).take(20));
        values.extend(0..13u64);
        values.extend(std::iter::repeat(1u64).take(9));
        values.extend([3, 1, 4, 1, 5, 9, 2, 6]);
        roundtrip(&values, 4);
    }

    #[test]
    fn test_random_roundtrip_across_widths() {
        let mut rng = rand::thread_rng();
        for bit_width in [1u8, 2, 5, 8, 13, 20, 32] {
            let mask = if bit_width == 64 {
                u64::MAX
            } else {
                (1u64 << bit_width) - 1
            };
            let values: Vec<u64> = (0..1000)
                .map(|_| {
                    if rng.gen_bool(0.5) {
                        3 & mask
                    } else {
                        rng.gen::<u64>() & mask
                    }
                })
                .collect();
            roundtrip(&values, bit_width);
        }
    }

    #[test]
    fn test_zero_values_is_empty_stream() {
        let mut enc = RleEncoder::new(1);
        assert!(enc.consume().is_empty());
    }

    #[test]
    fn test_bit_width_zero_levels() {
        // a required-only column writes no level bytes; width 0 encodes
        // as a pure rle run with an empty value
        let mut enc = RleEncoder::new(0);
        for _ in 0..5 {
            enc.put_u64(0);
        }
        let buf = enc.consume();
        let mut dec = RleDecoder::new(&buf, 0);
        assert_eq!(dec.collect_n(5).unwrap(), vec![0; 5]);
    }
}
