use std::io::Write;

use bytes::{Bytes, BytesMut};

use crate::errors::Result;

/// An append-only byte stream held as a list of zero-copy chunks.
///
/// Page assembly concatenates level and value streams that were encoded
/// independently; keeping them chunked avoids a copy until the page is
/// compressed or written out.
#[derive(Default)]
pub struct ChunkedBytes {
    chunks: Vec<Bytes>,
    len: usize,
}

impl ChunkedBytes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: Bytes) {
        self.len += chunk.len();
        self.chunks.push(chunk);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.chunks.iter()
    }

    /// Concatenates all chunks into one contiguous buffer.
    pub fn concat(&self) -> Bytes {
        if self.chunks.len() == 1 {
            return self.chunks[0].clone();
        }
        let mut out = BytesMut::with_capacity(self.len);
        for chunk in &self.chunks {
            out.extend_from_slice(chunk);
        }
        out.freeze()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for chunk in &self.chunks {
            writer.write_all(chunk)?;
        }
        Ok(())
    }
}

impl From<Bytes> for ChunkedBytes {
    fn from(b: Bytes) -> Self {
        let mut out = Self::new();
        out.push(b);
        out
    }
}

impl FromIterator<Bytes> for ChunkedBytes {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        let mut out = Self::new();
        for chunk in iter {
            out.push(chunk);
        }
        out
    }
}

/// Position-tracked input view over a [`Bytes`] buffer. Splitting advances
/// the logical position without copying.
pub struct BytesReader {
    data: Bytes,
    pos: usize,
}

impl BytesReader {
    pub fn new(data: Bytes) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    /// Takes the next `n` bytes as a zero-copy slice.
    pub fn split_to(&mut self, n: usize) -> Option<Bytes> {
        if self.data.len() < n {
            return None;
        }
        self.pos += n;
        Some(self.data.split_to(n))
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        let b = self.split_to(1)?;
        Some(b[0])
    }

    pub fn read_u32_le(&mut self) -> Option<u32> {
        let b = self.split_to(4)?;
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn rest(self) -> Bytes {
        self.data
    }
}
