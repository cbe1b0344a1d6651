//! DELTA_LENGTH_BYTE_ARRAY: all lengths as one DELTA_BINARY_PACKED stream,
//! then the concatenated raw bytes.

use bytes::{BufMut, Bytes, BytesMut};
use parq_core::encoding_err;
use parq_core::errors::Result;
use parq_core::value::ByteArray;
use parq_format::basic::Encoding;

use super::delta::DeltaBitPackEncoder;
use super::Encoder;

pub struct DeltaLengthByteArrayEncoder {
    lengths: DeltaBitPackEncoder,
    data: Vec<u8>,
}

impl DeltaLengthByteArrayEncoder {
    pub fn new() -> Self {
        Self {
            lengths: DeltaBitPackEncoder::new(),
            data: Vec::new(),
        }
    }
}

impl Default for DeltaLengthByteArrayEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<ByteArray> for DeltaLengthByteArrayEncoder {
    fn put(&mut self, value: &ByteArray) -> Result<()> {
        if value.len() > i32::MAX as usize {
            return encoding_err!("BYTE_ARRAY of {} bytes exceeds 2^31", value.len());
        }
        self.lengths.put_i64(value.len() as i64);
        self.data.extend_from_slice(value.as_bytes());
        Ok(())
    }

    fn buffered_size(&self) -> usize {
        self.lengths.size_estimate() + self.data.len()
    }

    fn allocated_size(&self) -> usize {
        Encoder::<i64>::allocated_size(&self.lengths) + self.data.capacity()
    }

    fn encoding(&self) -> Encoding {
        Encoding::DeltaLengthByteArray
    }

    fn take_bytes(&mut self) -> Result<Bytes> {
        let lengths = Encoder::<i64>::take_bytes(&mut self.lengths)?;
        let mut out = BytesMut::with_capacity(lengths.len() + self.data.len());
        out.put(lengths);
        out.put(self.data.as_slice());
        self.data.clear();
        Ok(out.freeze())
    }
}
