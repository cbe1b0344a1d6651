//! The closed enums of the format. Each carries its Thrift integer value.

use std::fmt;

use parq_core::errors::{Error, Result};

/// Physical storage type of a leaf column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    Int96,
    Float,
    Double,
    ByteArray,
    FixedLenByteArray,
}

impl PhysicalType {
    pub fn to_thrift(self) -> i32 {
        match self {
            PhysicalType::Boolean => 0,
            PhysicalType::Int32 => 1,
            PhysicalType::Int64 => 2,
            PhysicalType::Int96 => 3,
            PhysicalType::Float => 4,
            PhysicalType::Double => 5,
            PhysicalType::ByteArray => 6,
            PhysicalType::FixedLenByteArray => 7,
        }
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PhysicalType::Boolean => "BOOLEAN",
            PhysicalType::Int32 => "INT32",
            PhysicalType::Int64 => "INT64",
            PhysicalType::Int96 => "INT96",
            PhysicalType::Float => "FLOAT",
            PhysicalType::Double => "DOUBLE",
            PhysicalType::ByteArray => "BYTE_ARRAY",
            PhysicalType::FixedLenByteArray => "FIXED_LEN_BYTE_ARRAY",
        };
        f.write_str(s)
    }
}

/// Field cardinality.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repetition {
    Required,
    Optional,
    Repeated,
}

impl Repetition {
    pub fn to_thrift(self) -> i32 {
        match self {
            Repetition::Required => 0,
            Repetition::Optional => 1,
            Repetition::Repeated => 2,
        }
    }
}

/// Page and dictionary encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Encoding {
    Plain,
    PlainDictionary,
    Rle,
    BitPacked,
    DeltaBinaryPacked,
    DeltaLengthByteArray,
    DeltaByteArray,
    RleDictionary,
}

impl Encoding {
    pub fn to_thrift(self) -> i32 {
        match self {
            Encoding::Plain => 0,
            Encoding::PlainDictionary => 2,
            Encoding::Rle => 3,
            Encoding::BitPacked => 4,
            Encoding::DeltaBinaryPacked => 5,
            Encoding::DeltaLengthByteArray => 6,
            Encoding::DeltaByteArray => 7,
            Encoding::RleDictionary => 8,
        }
    }
}

/// Compression codec applied to page payloads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    #[default]
    Uncompressed,
    Snappy,
    Gzip,
    Brotli,
    Zstd,
    Lz4Raw,
}

impl Compression {
    pub fn to_thrift(self) -> i32 {
        match self {
            Compression::Uncompressed => 0,
            Compression::Snappy => 1,
            Compression::Gzip => 2,
            Compression::Brotli => 4,
            Compression::Zstd => 6,
            Compression::Lz4Raw => 7,
        }
    }
}

/// Page kinds this writer produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageType {
    DataPage,
    IndexPage,
    DictionaryPage,
    DataPageV2,
}

impl PageType {
    pub fn to_thrift(self) -> i32 {
        match self {
            PageType::DataPage => 0,
            PageType::IndexPage => 1,
            PageType::DictionaryPage => 2,
            PageType::DataPageV2 => 3,
        }
    }
}

/// Time/timestamp resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Millis,
    Micros,
    Nanos,
}

/// Logical annotation of a schema node. One enum covers both the modern
/// LogicalType union and the converted types that only exist in the legacy
/// representation (INTERVAL).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalType {
    String,
    Map,
    List,
    Enum,
    Decimal { precision: i32, scale: i32 },
    Date,
    Time { is_adjusted_to_utc: bool, unit: TimeUnit },
    Timestamp { is_adjusted_to_utc: bool, unit: TimeUnit },
    Integer { bit_width: i8, is_signed: bool },
    Json,
    Bson,
    Uuid,
    Interval,
}

impl LogicalType {
    /// Legacy ConvertedType thrift value, when one exists.
    pub fn converted_type(&self) -> Option<i32> {
        let v = match self {
            LogicalType::String => 0,
            LogicalType::Map => 1,
            LogicalType::List => 3,
            LogicalType::Enum => 4,
            LogicalType::Decimal { .. } => 5,
            LogicalType::Date => 6,
            LogicalType::Time { unit, .. } => match unit {
                TimeUnit::Millis => 7,
                TimeUnit::Micros => 8,
                TimeUnit::Nanos => return None,
            },
            LogicalType::Timestamp { unit, .. } => match unit {
                TimeUnit::Millis => 9,
                TimeUnit::Micros => 10,
                TimeUnit::Nanos => return None,
            },
            LogicalType::Integer {
                bit_width,
                is_signed,
            } => match (bit_width, is_signed) {
                (8, false) => 11,
                (16, false) => 12,
                (32, false) => 13,
                (64, false) => 14,
                (8, true) => 15,
                (16, true) => 16,
                (32, true) => 17,
                (64, true) => 18,
                _ => return None,
            },
            LogicalType::Json => 19,
            LogicalType::Bson => 20,
            LogicalType::Interval => 21,
            LogicalType::Uuid => return None,
        };
        Some(v)
    }

    /// Whether a modern LogicalType union entry is written for this
    /// annotation. INTERVAL only exists as a converted type.
    pub fn has_modern_form(&self) -> bool {
        !matches!(self, LogicalType::Interval)
    }

    /// Validates the annotation against the physical type it decorates.
    pub fn check_physical(
        &self,
        physical: PhysicalType,
        type_length: Option<i32>,
    ) -> Result<()> {
        let ok = match self {
            LogicalType::String | LogicalType::Enum | LogicalType::Json => {
                physical == PhysicalType::ByteArray
            }
            LogicalType::Bson => physical == PhysicalType::ByteArray,
            LogicalType::Decimal { precision, scale } => {
                if *scale < 0 || *precision < 1 || scale > precision {
                    return Err(Error::Schema(format!(
                        "DECIMAL({}, {}) requires 0 <= scale <= precision",
                        precision, scale
                    )));
                }
                let max_precision = match physical {
                    PhysicalType::Int32 => 9,
                    PhysicalType::Int64 => 18,
                    PhysicalType::FixedLenByteArray => {
                        let len = type_length.unwrap_or(0) as f64;
                        (2f64.powi(8 * len as i32 - 1) - 1.0).log10().floor() as i32
                    }
                    PhysicalType::ByteArray => i32::MAX,
                    _ => {
                        return Err(Error::Schema(format!(
                            "DECIMAL cannot annotate {}",
                            physical
                        )))
                    }
                };
                *precision <= max_precision
            }
            LogicalType::Date => physical == PhysicalType::Int32,
            LogicalType::Time { unit, .. } => match unit {
                TimeUnit::Millis => physical == PhysicalType::Int32,
                _ => physical == PhysicalType::Int64,
            },
            LogicalType::Timestamp { .. } => physical == PhysicalType::Int64,
            LogicalType::Integer { bit_width, .. } => match bit_width {
                8 | 16 | 32 => physical == PhysicalType::Int32,
                64 => physical == PhysicalType::Int64,
                _ => false,
            },
            LogicalType::Uuid => {
                physical == PhysicalType::FixedLenByteArray && type_length == Some(16)
            }
            LogicalType::Interval => {
                physical == PhysicalType::FixedLenByteArray && type_length == Some(12)
            }
            LogicalType::Map | LogicalType::List => {
                return Err(Error::Schema(format!(
                    "{:?} annotates groups, not primitives",
                    self
                )))
            }
        };
        if ok {
            Ok(())
        } else {
            Err(Error::Schema(format!(
                "{:?} cannot annotate physical type {}",
                self, physical
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thrift_values_are_stable() {
        assert_eq!(PhysicalType::ByteArray.to_thrift(), 6);
        assert_eq!(Encoding::RleDictionary.to_thrift(), 8);
        assert_eq!(Compression::Zstd.to_thrift(), 6);
        assert_eq!(Compression::Lz4Raw.to_thrift(), 7);
        assert_eq!(PageType::DataPageV2.to_thrift(), 3);
    }

    #[test]
    fn test_decimal_validation() {
        let dec = LogicalType::Decimal {
            precision: 10,
            scale: 2,
        };
        assert!(dec.check_physical(PhysicalType::Int64, None).is_ok());
        assert!(dec.check_physical(PhysicalType::Int32, None).is_err());
        let bad = LogicalType::Decimal {
            precision: 3,
            scale: 5,
        };
        assert!(bad.check_physical(PhysicalType::Int32, None).is_err());
    }

    #[test]
    fn test_interval_has_no_modern_form() {
        assert!(!LogicalType::Interval.has_modern_form());
        assert_eq!(LogicalType::Interval.converted_type(), Some(21));
        assert!(LogicalType::Uuid.has_modern_form());
        assert_eq!(LogicalType::Uuid.converted_type(), None);
    }
}
