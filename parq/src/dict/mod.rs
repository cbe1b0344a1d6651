//! Per-column dictionary management: an insertion-ordered value-to-id map
//! with a byte-size cap. The column writer owns the fallback policy; this
//! module only reports when the cap is crossed.

use std::collections::HashMap;
use std::hash::Hash;
use std::mem;

use byteorder::{LittleEndian, WriteBytesExt};
use bytes::Bytes;
use parq_core::errors::Result;
use parq_core::util::bit_util::num_required_bits;
use parq_core::value::{ByteArray, Int96};
use parq_encoding::schemes::rle::RleEncoder;

/// A value a dictionary can key on. Floats key on their bit pattern so NaN
/// and signed zero behave deterministically.
pub trait DictValue: Clone {
    type Key: Eq + Hash;

    fn dict_key(&self) -> Self::Key;

    /// Bytes this value contributes to the dictionary page.
    fn dict_encoded_size(&self, type_length: Option<i32>) -> usize;

    /// Dictionary pages are PLAIN encoded; `type_length` distinguishes
    /// FIXED_LEN_BYTE_ARRAY (bare bytes) from BYTE_ARRAY (length prefixed).
    fn plain_append(&self, buf: &mut Vec<u8>, type_length: Option<i32>) -> Result<()>;
}

/// Booleans never dictionary-encode; this impl only satisfies the writer's
/// generic bounds.
impl DictValue for bool {
    type Key = bool;

    fn dict_key(&self) -> bool {
        *self
    }

    fn dict_encoded_size(&self, _type_length: Option<i32>) -> usize {
        1
    }

    fn plain_append(&self, buf: &mut Vec<u8>, _type_length: Option<i32>) -> Result<()> {
        buf.push(*self as u8);
        Ok(())
    }
}

impl DictValue for i32 {
    type Key = i32;

    fn dict_key(&self) -> i32 {
        *self
    }

    fn dict_encoded_size(&self, _type_length: Option<i32>) -> usize {
        4
    }

    fn plain_append(&self, buf: &mut Vec<u8>, _type_length: Option<i32>) -> Result<()> {
        buf.write_i32::<LittleEndian>(*self)?;
        Ok(())
    }
}

impl DictValue for i64 {
    type Key = i64;

    fn dict_key(&self) -> i64 {
        *self
    }

    fn dict_encoded_size(&self, _type_length: Option<i32>) -> usize {
        8
    }

    fn plain_append(&self, buf: &mut Vec<u8>, _type_length: Option<i32>) -> Result<()> {
        buf.write_i64::<LittleEndian>(*self)?;
        Ok(())
    }
}

impl DictValue for f32 {
    type Key = u32;

    fn dict_key(&self) -> u32 {
        self.to_bits()
    }

    fn dict_encoded_size(&self, _type_length: Option<i32>) -> usize {
        4
    }

    fn plain_append(&self, buf: &mut Vec<u8>, _type_length: Option<i32>) -> Result<()> {
        buf.write_f32::<LittleEndian>(*self)?;
        Ok(())
    }
}

impl DictValue for f64 {
    type Key = u64;

    fn dict_key(&self) -> u64 {
        self.to_bits()
    }

    fn dict_encoded_size(&self, _type_length: Option<i32>) -> usize {
        8
    }

    fn plain_append(&self, buf: &mut Vec<u8>, _type_length: Option<i32>) -> Result<()> {
        buf.write_f64::<LittleEndian>(*self)?;
        Ok(())
    }
}

impl DictValue for Int96 {
    type Key = [u32; 3];

    fn dict_key(&self) -> [u32; 3] {
        self.0
    }

    fn dict_encoded_size(&self, _type_length: Option<i32>) -> usize {
        12
    }

    fn plain_append(&self, buf: &mut Vec<u8>, _type_length: Option<i32>) -> Result<()> {
        buf.extend_from_slice(&self.to_le_bytes());
        Ok(())
    }
}

impl DictValue for ByteArray {
    type Key = ByteArray;

    fn dict_key(&self) -> ByteArray {
        self.clone()
    }

    fn dict_encoded_size(&self, type_length: Option<i32>) -> usize {
        match type_length {
            Some(len) => len as usize,
            None => 4 + self.len(),
        }
    }

    fn plain_append(&self, buf: &mut Vec<u8>, type_length: Option<i32>) -> Result<()> {
        if type_length.is_none() {
            buf.write_u32::<LittleEndian>(self.len() as u32)?;
        }
        buf.extend_from_slice(self.as_bytes());
        Ok(())
    }
}

/// Insertion-ordered dictionary plus the index stream of the page being
/// built.
pub struct DictEncoder<T: DictValue> {
    map: HashMap<T::Key, u32>,
    values: Vec<T>,
    dict_bytes: usize,
    type_length: Option<i32>,
    page_indices: Vec<u32>,
}

impl<T: DictValue> DictEncoder<T> {
    pub fn new(type_length: Option<i32>) -> Self {
        Self {
            map: HashMap::new(),
            values: Vec::new(),
            dict_bytes: 0,
            type_length,
            page_indices: Vec::new(),
        }
    }

    /// Interns the value and records its index in the current page.
    pub fn put(&mut self, value: &T) {
        let index = match self.map.get(&value.dict_key()) {
            Some(&index) => index,
            None => {
                let index = self.values.len() as u32;
                self.map.insert(value.dict_key(), index);
                self.dict_bytes += value.dict_encoded_size(self.type_length);
                self.values.push(value.clone());
                index
            }
        };
        self.page_indices.push(index);
    }

    pub fn num_entries(&self) -> usize {
        self.values.len()
    }

    /// Total bytes the dictionary page would occupy.
    pub fn dict_byte_size(&self) -> usize {
        self.dict_bytes
    }

    pub fn bit_width(&self) -> u8 {
        num_required_bits(self.values.len().saturating_sub(1) as u64)
    }

    pub fn page_value_count(&self) -> usize {
        self.page_indices.len()
    }

    /// Estimated encoded size of the buffered index stream.
    pub fn indices_byte_size(&self) -> usize {
        1 + self.page_indices.len() * (self.bit_width() as usize).div_ceil(8).max(1)
    }

    /// Values of the current page, decoded back through the dictionary; used
    /// to replay buffered values into a fallback encoder.
    pub fn replay_page_values(&mut self) -> Vec<T> {
        let indices = mem::take(&mut self.page_indices);
        indices
            .into_iter()
            .map(|i| self.values[i as usize].clone())
            .collect()
    }

    /// Encodes the buffered page indices: one bit-width byte then the hybrid
    /// RLE stream.
    pub fn take_indices_page(&mut self) -> Result<Bytes> {
        let bit_width = self.bit_width();
        let mut encoder = RleEncoder::new(bit_width);
        for &index in &self.page_indices {
            encoder.put_u64(index as u64);
        }
        self.page_indices.clear();
        let body = encoder.consume();
        let mut out = Vec::with_capacity(1 + body.len());
        out.push(bit_width);
        out.extend_from_slice(&body);
        Ok(Bytes::from(out))
    }

    /// The PLAIN-encoded dictionary page payload, values in insertion order.
    pub fn dict_page_payload(&self) -> Result<Bytes> {
        let mut buf = Vec::with_capacity(self.dict_bytes);
        for value in &self.values {
            value.plain_append(&mut buf, self.type_length)?;
        }
        Ok(Bytes::from(buf))
    }

    /// Frees the map once the column has fallen back; the ordered values stay
    /// for the dictionary page that covers the already-written pages.
    pub fn retire(&mut self) {
        self.map = HashMap::new();
        self.map.shrink_to_fit();
    }
}
