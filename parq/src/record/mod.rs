//! The ingestion surface: typed consumer callbacks plus the equivalent
//! event-stream form for callers that produce records as a flat sequence.

pub mod shredder;

use parq_core::errors::Result;
use parq_core::value::{ByteArray, Int96};
use parq_format::basic::PhysicalType;

/// One primitive value as it arrives from the caller.
#[derive(Clone, Debug)]
pub enum PrimitiveValue {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Int96(Int96),
    Float(f32),
    Double(f64),
    Bytes(ByteArray),
}

impl PrimitiveValue {
    pub fn physical_type(&self) -> PhysicalType {
        match self {
            PrimitiveValue::Boolean(_) => PhysicalType::Boolean,
            PrimitiveValue::Int32(_) => PhysicalType::Int32,
            PrimitiveValue::Int64(_) => PhysicalType::Int64,
            PrimitiveValue::Int96(_) => PhysicalType::Int96,
            PrimitiveValue::Float(_) => PhysicalType::Float,
            PrimitiveValue::Double(_) => PhysicalType::Double,
            // BYTE_ARRAY and FIXED_LEN_BYTE_ARRAY both travel as bytes;
            // the column writer checks the declared length
            PrimitiveValue::Bytes(_) => PhysicalType::ByteArray,
        }
    }
}

/// Event form of the consumer surface, for channel/generator producers.
#[derive(Clone, Debug)]
pub enum RecordEvent {
    StartMessage,
    StartField { name: String, index: usize },
    StartGroup,
    EndGroup,
    EndField { name: String, index: usize },
    AddValue(PrimitiveValue),
    EndMessage,
}

/// Consumer of record-shaped input. The shredder is the in-tree
/// implementation; adapters for external object models implement the same
/// surface.
pub trait RecordConsumer {
    fn start_message(&mut self) -> Result<()>;
    fn start_field(&mut self, name: &str, index: usize) -> Result<()>;
    fn start_group(&mut self) -> Result<()>;
    fn end_group(&mut self) -> Result<()>;
    fn end_field(&mut self, name: &str, index: usize) -> Result<()>;
    fn add_boolean(&mut self, value: bool) -> Result<()>;
    fn add_int32(&mut self, value: i32) -> Result<()>;
    fn add_int64(&mut self, value: i64) -> Result<()>;
    fn add_int96(&mut self, value: Int96) -> Result<()>;
    fn add_float(&mut self, value: f32) -> Result<()>;
    fn add_double(&mut self, value: f64) -> Result<()>;
    fn add_binary(&mut self, value: ByteArray) -> Result<()>;
    fn end_message(&mut self) -> Result<()>;

    fn consume(&mut self, event: RecordEvent) -> Result<()> {
        match event {
            RecordEvent::StartMessage => self.start_message(),
            RecordEvent::StartField { name, index } => self.start_field(&name, index),
            RecordEvent::StartGroup => self.start_group(),
            RecordEvent::EndGroup => self.end_group(),
            RecordEvent::EndField { name, index } => self.end_field(&name, index),
            RecordEvent::AddValue(value) => match value {
                PrimitiveValue::Boolean(v) => self.add_boolean(v),
                PrimitiveValue::Int32(v) => self.add_int32(v),
                PrimitiveValue::Int64(v) => self.add_int64(v),
                PrimitiveValue::Int96(v) => self.add_int96(v),
                PrimitiveValue::Float(v) => self.add_float(v),
                PrimitiveValue::Double(v) => self.add_double(v),
                PrimitiveValue::Bytes(v) => self.add_binary(v),
            },
            RecordEvent::EndMessage => self.end_message(),
        }
    }
}
