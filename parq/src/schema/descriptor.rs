//! Per-leaf column descriptors, derived once when the schema is built.

use parq_format::basic::{LogicalType, PhysicalType};

use super::types::NodeId;

/// Order used by the column's statistics comparator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Signed,
    Unsigned,
    /// No defined order; statistics are not written.
    Undefined,
}

/// Comparator order for a physical type and its optional annotation.
pub fn sort_order_for(physical: PhysicalType, logical: Option<&LogicalType>) -> SortOrder {
    if let Some(logical) = logical {
        return match logical {
            LogicalType::String | LogicalType::Enum | LogicalType::Json | LogicalType::Bson => {
                SortOrder::Unsigned
            }
            LogicalType::Uuid => SortOrder::Unsigned,
            LogicalType::Integer { is_signed, .. } => {
                if *is_signed {
                    SortOrder::Signed
                } else {
                    SortOrder::Unsigned
                }
            }
            LogicalType::Decimal { .. } => SortOrder::Signed,
            LogicalType::Date
            | LogicalType::Time { .. }
            | LogicalType::Timestamp { .. } => SortOrder::Signed,
            LogicalType::Interval => SortOrder::Undefined,
            LogicalType::Map | LogicalType::List => SortOrder::Undefined,
        };
    }
    match physical {
        PhysicalType::Boolean
        | PhysicalType::Int32
        | PhysicalType::Int64
        | PhysicalType::Float
        | PhysicalType::Double => SortOrder::Signed,
        PhysicalType::ByteArray | PhysicalType::FixedLenByteArray => SortOrder::Unsigned,
        PhysicalType::Int96 => SortOrder::Undefined,
    }
}

/// Everything a column writer needs to know about its leaf.
#[derive(Clone, Debug)]
pub struct ColumnDescriptor {
    pub node: NodeId,
    /// Position in pre-order leaf traversal; the chunk order inside a row group.
    pub column_index: usize,
    /// Path parts from the message root, excluding the root itself.
    pub path: Vec<String>,
    pub physical: PhysicalType,
    pub type_length: Option<i32>,
    pub logical: Option<LogicalType>,
    pub max_def_level: i16,
    pub max_rep_level: i16,
    pub sort_order: SortOrder,
}

impl ColumnDescriptor {
    pub fn path_string(&self) -> String {
        self.path.join(".")
    }
}
