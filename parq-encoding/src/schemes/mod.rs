use bytes::Bytes;
use parq_core::errors::Result;
use parq_format::basic::Encoding;

pub mod delta;
pub mod delta_bytes;
pub mod delta_length;
pub mod levels;
pub mod plain;
pub mod rle;

/// Uniform contract of a value encoder.
///
/// `take_bytes` drains the buffered stream and resets the encoder so the next
/// page starts clean. `buffered_size` is the encoded estimate used by page
/// flush decisions; `allocated_size` is raw capacity for memory accounting.
pub trait Encoder<T> {
    fn put(&mut self, value: &T) -> Result<()>;
    fn buffered_size(&self) -> usize;
    fn allocated_size(&self) -> usize;
    fn encoding(&self) -> Encoding;
    fn take_bytes(&mut self) -> Result<Bytes>;
}
