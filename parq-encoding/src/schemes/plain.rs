//! PLAIN: little-endian fixed width for numerics, 4-byte length-prefixed
//! bytes for BYTE_ARRAY, bare bytes for FIXED_LEN_BYTE_ARRAY, LSB-first
//! bit packing for BOOLEAN.

use std::marker::PhantomData;
use std::mem;

use byteorder::{LittleEndian, WriteBytesExt};
use bytes::Bytes;
use parq_core::encoding_err;
use parq_core::errors::Result;
use parq_core::util::bit_util::BitWriter;
use parq_core::value::{ByteArray, Int96};
use parq_format::basic::Encoding;

use super::Encoder;

/// Fixed-width little-endian append, one impl per numeric physical type.
pub trait PlainValue {
    fn append_plain(&self, buf: &mut Vec<u8>) -> Result<()>;
}

impl PlainValue for i32 {
    fn append_plain(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_i32::<LittleEndian>(*self)?;
        Ok(())
    }
}

impl PlainValue for i64 {
    fn append_plain(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_i64::<LittleEndian>(*self)?;
        Ok(())
    }
}

impl PlainValue for f32 {
    fn append_plain(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_f32::<LittleEndian>(*self)?;
        Ok(())
    }
}

impl PlainValue for f64 {
    fn append_plain(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_f64::<LittleEndian>(*self)?;
        Ok(())
    }
}

impl PlainValue for Int96 {
    fn append_plain(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.extend_from_slice(&self.to_le_bytes());
        Ok(())
    }
}

impl PlainValue for ByteArray {
    fn append_plain(&self, buf: &mut Vec<u8>) -> Result<()> {
        if self.len() > i32::MAX as usize {
            return encoding_err!("BYTE_ARRAY of {} bytes exceeds 2^31", self.len());
        }
        buf.write_u32::<LittleEndian>(self.len() as u32)?;
        buf.extend_from_slice(self.as_bytes());
        Ok(())
    }
}

pub struct PlainEncoder<T: PlainValue> {
    buffer: Vec<u8>,
    _marker: PhantomData<T>,
}

impl<T: PlainValue> PlainEncoder<T> {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<T: PlainValue> Default for PlainEncoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PlainValue> Encoder<T> for PlainEncoder<T> {
    fn put(&mut self, value: &T) -> Result<()> {
        value.append_plain(&mut self.buffer)
    }

    fn buffered_size(&self) -> usize {
        self.buffer.len()
    }

    fn allocated_size(&self) -> usize {
        self.buffer.capacity()
    }

    fn encoding(&self) -> Encoding {
        Encoding::Plain
    }

    fn take_bytes(&mut self) -> Result<Bytes> {
        Ok(Bytes::from(mem::take(&mut self.buffer)))
    }
}

/// PLAIN for FIXED_LEN_BYTE_ARRAY: bare bytes, every value `type_length` long.
pub struct PlainFixedEncoder {
    buffer: Vec<u8>,
    type_length: usize,
}

impl PlainFixedEncoder {
    pub fn new(type_length: usize) -> Self {
        Self {
            buffer: Vec::new(),
            type_length,
        }
    }
}

impl Encoder<ByteArray> for PlainFixedEncoder {
    fn put(&mut self, value: &ByteArray) -> Result<()> {
        if value.len() != self.type_length {
            return encoding_err!(
                "FIXED_LEN_BYTE_ARRAY value of {} bytes, expected {}",
                value.len(),
                self.type_length
            );
        }
        self.buffer.extend_from_slice(value.as_bytes());
        Ok(())
    }

    fn buffered_size(&self) -> usize {
        self.buffer.len()
    }

    fn allocated_size(&self) -> usize {
        self.buffer.capacity()
    }

    fn encoding(&self) -> Encoding {
        Encoding::Plain
    }

    fn take_bytes(&mut self) -> Result<Bytes> {
        Ok(Bytes::from(mem::take(&mut self.buffer)))
    }
}

/// PLAIN for BOOLEAN: one bit per value, LSB-first.
pub struct PlainBooleanEncoder {
    bits: BitWriter,
}

impl PlainBooleanEncoder {
    pub fn new() -> Self {
        Self {
            bits: BitWriter::new(),
        }
    }
}

impl Default for PlainBooleanEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<bool> for PlainBooleanEncoder {
    fn put(&mut self, value: &bool) -> Result<()> {
        self.bits.put_value(*value as u64, 1);
        Ok(())
    }

    fn buffered_size(&self) -> usize {
        self.bits.bytes_written()
    }

    fn allocated_size(&self) -> usize {
        self.bits.bytes_written()
    }

    fn encoding(&self) -> Encoding {
        Encoding::Plain
    }

    fn take_bytes(&mut self) -> Result<Bytes> {
        let out = mem::take(&mut self.bits).consume();
        Ok(Bytes::from(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_int32_little_endian() {
        let mut enc = PlainEncoder::<i32>::new();
        enc.put(&1).unwrap();
        enc.put(&-2).unwrap();
        let bytes = enc.take_bytes().unwrap();
        assert_eq!(bytes.as_ref(), [1, 0, 0, 0, 0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(enc.buffered_size(), 0);
    }

    #[test]
    fn test_plain_byte_array_length_prefixed() {
        let mut enc = PlainEncoder::<ByteArray>::new();
        enc.put(&ByteArray::from("hi")).unwrap();
        enc.put(&ByteArray::from("")).unwrap();
        let bytes = enc.take_bytes().unwrap();
        assert_eq!(bytes.as_ref(), [2, 0, 0, 0, b'h', b'i', 0, 0, 0, 0]);
    }

    #[test]
    fn test_plain_fixed_rejects_wrong_length() {
        let mut enc = PlainFixedEncoder::new(3);
        enc.put(&ByteArray::from(b"abc".as_slice())).unwrap();
        assert!(enc.put(&ByteArray::from(b"ab".as_slice())).is_err());
        assert_eq!(enc.take_bytes().unwrap().as_ref(), b"abc");
    }

    #[test]
    fn test_plain_boolean_lsb_first() {
        let mut enc = PlainBooleanEncoder::new();
        for v in [true, false, false, true, true, true, false, false, true] {
            enc.put(&v).unwrap();
        }
        let bytes = enc.take_bytes().unwrap();
        assert_eq!(bytes.as_ref(), [0b0011_1001, 0b0000_0001]);
    }
}
