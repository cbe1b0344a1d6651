use std::fmt;

use bytes::Bytes;

/// Owned BYTE_ARRAY value. Cloning is cheap; the payload is a refcounted
/// [`Bytes`] slice.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteArray {
    data: Bytes,
}

impl ByteArray {
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_inner(self) -> Bytes {
        self.data
    }
}

impl fmt::Debug for ByteArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteArray({:?})", self.data)
    }
}

impl From<&[u8]> for ByteArray {
    fn from(v: &[u8]) -> Self {
        Self {
            data: Bytes::copy_from_slice(v),
        }
    }
}

impl From<Vec<u8>> for ByteArray {
    fn from(v: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(v),
        }
    }
}

impl From<&str> for ByteArray {
    fn from(v: &str) -> Self {
        Self {
            data: Bytes::copy_from_slice(v.as_bytes()),
        }
    }
}

impl From<Bytes> for ByteArray {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}

/// INT96: three little-endian u32 words, historically a nanosecond timestamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Int96(pub [u32; 3]);

impl Int96 {
    pub fn from_parts(lo: u32, mid: u32, hi: u32) -> Self {
        Self([lo, mid, hi])
    }

    /// The twelve-byte little-endian wire form.
    pub fn to_le_bytes(self) -> [u8; 12] {
        let mut out = [0u8; 12];
        for (i, word) in self.0.iter().enumerate() {
            out[i * 4..(i + 1) * 4].copy_from_slice(&word.to_le_bytes());
        }
        out
    }
}
