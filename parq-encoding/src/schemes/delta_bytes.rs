//! DELTA_BYTE_ARRAY: per-value shared-prefix lengths as DELTA_BINARY_PACKED,
//! then the suffixes as DELTA_LENGTH_BYTE_ARRAY.

use bytes::{BufMut, Bytes, BytesMut};
use parq_core::errors::Result;
use parq_core::value::ByteArray;
use parq_format::basic::Encoding;

use super::delta::DeltaBitPackEncoder;
use super::delta_length::DeltaLengthByteArrayEncoder;
use super::Encoder;

pub struct DeltaByteArrayEncoder {
    prefix_lengths: DeltaBitPackEncoder,
    suffixes: DeltaLengthByteArrayEncoder,
    previous: Vec<u8>,
}

impl DeltaByteArrayEncoder {
    pub fn new() -> Self {
        Self {
            prefix_lengths: DeltaBitPackEncoder::new(),
            suffixes: DeltaLengthByteArrayEncoder::new(),
            previous: Vec::new(),
        }
    }
}

impl Default for DeltaByteArrayEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<ByteArray> for DeltaByteArrayEncoder {
    fn put(&mut self, value: &ByteArray) -> Result<()> {
        let bytes = value.as_bytes();
        let prefix_len = self
            .previous
            .iter()
            .zip(bytes)
            .take_while(|(a, b)| a == b)
            .count();
        self.prefix_lengths.put_i64(prefix_len as i64);
        self.suffixes
            .put(&ByteArray::from(&bytes[prefix_len..]))?;
        self.previous.clear();
        self.previous.extend_from_slice(bytes);
        Ok(())
    }

    fn buffered_size(&self) -> usize {
        self.prefix_lengths.size_estimate() + self.suffixes.buffered_size()
    }

    fn allocated_size(&self) -> usize {
        Encoder::<i64>::allocated_size(&self.prefix_lengths) + self.suffixes.allocated_size()
    }

    fn encoding(&self) -> Encoding {
        Encoding::DeltaByteArray
    }

    fn take_bytes(&mut self) -> Result<Bytes> {
        let prefixes = Encoder::<i64>::take_bytes(&mut self.prefix_lengths)?;
        let suffixes = self.suffixes.take_bytes()?;
        self.previous.clear();
        let mut out = BytesMut::with_capacity(prefixes.len() + suffixes.len());
        out.put(prefixes);
        out.put(suffixes);
        Ok(out.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemes::delta::decode_delta_i64;

    #[test]
    fn test_shared_prefixes_are_factored_out() {
        let mut enc = DeltaByteArrayEncoder::new();
        for v in ["alpha", "alphabet", "alpine", "beta"] {
            enc.put(&ByteArray::from(v)).unwrap();
        }
        let bytes = enc.take_bytes().unwrap();
        let prefix_lengths = decode_delta_i64(&bytes).unwrap();
        assert_eq!(prefix_lengths, vec![0, 5, 3, 0]);
        assert!(bytes.ends_with(b"alphabetpinebeta"));
    }

    #[test]
    fn test_reset_between_pages() {
        let mut enc = DeltaByteArrayEncoder::new();
        enc.put(&ByteArray::from("aaaa")).unwrap();
        enc.take_bytes().unwrap();
        // previous value must not leak into the next page
        enc.put(&ByteArray::from("aaab")).unwrap();
        let bytes = enc.take_bytes().unwrap();
        assert_eq!(decode_delta_i64(&bytes).unwrap(), vec![0]);
    }
}
