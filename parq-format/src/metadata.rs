//! Footer and page-header metadata structs. Field ids follow parquet.thrift;
//! the wire codec is the thrift crate's compact protocol, with these structs
//! as the writer-facing shapes on top. Optional fields are skipped when
//! absent rather than defaulted.

use parq_core::errors::{Error, Result};
use thrift::protocol::{
    TCompactOutputProtocol, TFieldIdentifier, TListIdentifier, TOutputProtocol,
    TStructIdentifier, TType,
};

use crate::basic::{Compression, Encoding, LogicalType, PageType, PhysicalType, Repetition, TimeUnit};

fn serialize<F>(write: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut dyn TOutputProtocol) -> thrift::Result<()>,
{
    let mut out = Vec::new();
    let mut prot = TCompactOutputProtocol::new(&mut out);
    write(&mut prot)
        .and_then(|_| prot.flush())
        .map_err(|e| Error::Internal(format!("thrift serialization: {}", e)))?;
    drop(prot);
    Ok(out)
}

fn field_i32(prot: &mut dyn TOutputProtocol, name: &str, id: i16, v: i32) -> thrift::Result<()> {
    prot.write_field_begin(&TFieldIdentifier::new(name, TType::I32, id))?;
    prot.write_i32(v)?;
    prot.write_field_end()
}

fn field_i64(prot: &mut dyn TOutputProtocol, name: &str, id: i16, v: i64) -> thrift::Result<()> {
    prot.write_field_begin(&TFieldIdentifier::new(name, TType::I64, id))?;
    prot.write_i64(v)?;
    prot.write_field_end()
}

fn field_i16(prot: &mut dyn TOutputProtocol, name: &str, id: i16, v: i16) -> thrift::Result<()> {
    prot.write_field_begin(&TFieldIdentifier::new(name, TType::I16, id))?;
    prot.write_i16(v)?;
    prot.write_field_end()
}

fn field_bool(prot: &mut dyn TOutputProtocol, name: &str, id: i16, v: bool) -> thrift::Result<()> {
    prot.write_field_begin(&TFieldIdentifier::new(name, TType::Bool, id))?;
    prot.write_bool(v)?;
    prot.write_field_end()
}

fn field_binary(prot: &mut dyn TOutputProtocol, name: &str, id: i16, v: &[u8]) -> thrift::Result<()> {
    prot.write_field_begin(&TFieldIdentifier::new(name, TType::String, id))?;
    prot.write_bytes(v)?;
    prot.write_field_end()
}

fn field_string(prot: &mut dyn TOutputProtocol, name: &str, id: i16, v: &str) -> thrift::Result<()> {
    prot.write_field_begin(&TFieldIdentifier::new(name, TType::String, id))?;
    prot.write_string(v)?;
    prot.write_field_end()
}

/// Union variant with an empty payload struct.
fn empty_variant(prot: &mut dyn TOutputProtocol, name: &str, id: i16) -> thrift::Result<()> {
    prot.write_field_begin(&TFieldIdentifier::new(name, TType::Struct, id))?;
    prot.write_struct_begin(&TStructIdentifier::new(name))?;
    prot.write_field_stop()?;
    prot.write_struct_end()?;
    prot.write_field_end()
}

/// Typed min/max plus counts for one page or one column chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statistics {
    pub null_count: Option<i64>,
    pub distinct_count: Option<i64>,
    pub max_value: Option<Vec<u8>>,
    pub min_value: Option<Vec<u8>>,
}

impl Statistics {
    pub fn is_empty(&self) -> bool {
        self.null_count.is_none()
            && self.distinct_count.is_none()
            && self.max_value.is_none()
            && self.min_value.is_none()
    }

    fn write_to(&self, prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        prot.write_struct_begin(&TStructIdentifier::new("Statistics"))?;
        if let Some(v) = self.null_count {
            field_i64(prot, "null_count", 3, v)?;
        }
        if let Some(v) = self.distinct_count {
            field_i64(prot, "distinct_count", 4, v)?;
        }
        if let Some(v) = &self.max_value {
            field_binary(prot, "max_value", 5, v)?;
        }
        if let Some(v) = &self.min_value {
            field_binary(prot, "min_value", 6, v)?;
        }
        prot.write_field_stop()?;
        prot.write_struct_end()
    }
}

fn statistics_field(
    prot: &mut dyn TOutputProtocol,
    id: i16,
    stats: &Option<Statistics>,
) -> thrift::Result<()> {
    if let Some(stats) = stats {
        if !stats.is_empty() {
            prot.write_field_begin(&TFieldIdentifier::new("statistics", TType::Struct, id))?;
            stats.write_to(prot)?;
            prot.write_field_end()?;
        }
    }
    Ok(())
}

/// One pre-order node of the schema tree as it appears in the footer.
#[derive(Clone, Debug)]
pub struct SchemaElement {
    pub type_: Option<PhysicalType>,
    pub type_length: Option<i32>,
    pub repetition_type: Option<Repetition>,
    pub name: String,
    pub num_children: Option<i32>,
    pub logical_type: Option<LogicalType>,
    pub field_id: Option<i32>,
}

impl SchemaElement {
    fn write_to(&self, prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        prot.write_struct_begin(&TStructIdentifier::new("SchemaElement"))?;
        if let Some(t) = self.type_ {
            field_i32(prot, "type", 1, t.to_thrift())?;
        }
        if let Some(len) = self.type_length {
            field_i32(prot, "type_length", 2, len)?;
        }
        if let Some(r) = self.repetition_type {
            field_i32(prot, "repetition_type", 3, r.to_thrift())?;
        }
        field_string(prot, "name", 4, &self.name)?;
        if let Some(n) = self.num_children {
            field_i32(prot, "num_children", 5, n)?;
        }
        if let Some(lt) = &self.logical_type {
            if let Some(ct) = lt.converted_type() {
                field_i32(prot, "converted_type", 6, ct)?;
            }
            if let LogicalType::Decimal { precision, scale } = lt {
                field_i32(prot, "scale", 7, *scale)?;
                field_i32(prot, "precision", 8, *precision)?;
            }
            if let Some(id) = self.field_id {
                field_i32(prot, "field_id", 9, id)?;
            }
            if lt.has_modern_form() {
                prot.write_field_begin(&TFieldIdentifier::new(
                    "logicalType",
                    TType::Struct,
                    10,
                ))?;
                write_logical_type(lt, prot)?;
                prot.write_field_end()?;
            }
        } else if let Some(id) = self.field_id {
            field_i32(prot, "field_id", 9, id)?;
        }
        prot.write_field_stop()?;
        prot.write_struct_end()
    }
}

fn write_time_unit(unit: TimeUnit, prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
    prot.write_struct_begin(&TStructIdentifier::new("TimeUnit"))?;
    match unit {
        TimeUnit::Millis => empty_variant(prot, "MILLIS", 1)?,
        TimeUnit::Micros => empty_variant(prot, "MICROS", 2)?,
        TimeUnit::Nanos => empty_variant(prot, "NANOS", 3)?,
    }
    prot.write_field_stop()?;
    prot.write_struct_end()
}

fn write_logical_type(lt: &LogicalType, prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
    prot.write_struct_begin(&TStructIdentifier::new("LogicalType"))?;
    match lt {
        LogicalType::String => empty_variant(prot, "STRING", 1)?,
        LogicalType::Map => empty_variant(prot, "MAP", 2)?,
        LogicalType::List => empty_variant(prot, "LIST", 3)?,
        LogicalType::Enum => empty_variant(prot, "ENUM", 4)?,
        LogicalType::Decimal { precision, scale } => {
            prot.write_field_begin(&TFieldIdentifier::new("DECIMAL", TType::Struct, 5))?;
            prot.write_struct_begin(&TStructIdentifier::new("DecimalType"))?;
            field_i32(prot, "scale", 1, *scale)?;
            field_i32(prot, "precision", 2, *precision)?;
            prot.write_field_stop()?;
            prot.write_struct_end()?;
            prot.write_field_end()?;
        }
        LogicalType::Date => empty_variant(prot, "DATE", 6)?,
        LogicalType::Time {
            is_adjusted_to_utc,
            unit,
        } => {
            prot.write_field_begin(&TFieldIdentifier::new("TIME", TType::Struct, 7))?;
            prot.write_struct_begin(&TStructIdentifier::new("TimeType"))?;
            field_bool(prot, "isAdjustedToUTC", 1, *is_adjusted_to_utc)?;
            prot.write_field_begin(&TFieldIdentifier::new("unit", TType::Struct, 2))?;
            write_time_unit(*unit, prot)?;
            prot.write_field_end()?;
            prot.write_field_stop()?;
            prot.write_struct_end()?;
            prot.write_field_end()?;
        }
        LogicalType::Timestamp {
            is_adjusted_to_utc,
            unit,
        } => {
            prot.write_field_begin(&TFieldIdentifier::new("TIMESTAMP", TType::Struct, 8))?;
            prot.write_struct_begin(&TStructIdentifier::new("TimestampType"))?;
            field_bool(prot, "isAdjustedToUTC", 1, *is_adjusted_to_utc)?;
            prot.write_field_begin(&TFieldIdentifier::new("unit", TType::Struct, 2))?;
            write_time_unit(*unit, prot)?;
            prot.write_field_end()?;
            prot.write_field_stop()?;
            prot.write_struct_end()?;
            prot.write_field_end()?;
        }
        LogicalType::Integer {
            bit_width,
            is_signed,
        } => {
            prot.write_field_begin(&TFieldIdentifier::new("INTEGER", TType::Struct, 10))?;
            prot.write_struct_begin(&TStructIdentifier::new("IntType"))?;
            prot.write_field_begin(&TFieldIdentifier::new("bitWidth", TType::I08, 1))?;
            prot.write_i8(*bit_width)?;
            prot.write_field_end()?;
            field_bool(prot, "isSigned", 2, *is_signed)?;
            prot.write_field_stop()?;
            prot.write_struct_end()?;
            prot.write_field_end()?;
        }
        LogicalType::Json => empty_variant(prot, "JSON", 12)?,
        LogicalType::Bson => empty_variant(prot, "BSON", 13)?,
        LogicalType::Uuid => empty_variant(prot, "UUID", 14)?,
        LogicalType::Interval => unreachable!("INTERVAL has no modern form"),
    }
    prot.write_field_stop()?;
    prot.write_struct_end()
}

#[derive(Clone, Debug)]
pub struct DataPageHeader {
    pub num_values: i32,
    pub encoding: Encoding,
    pub definition_level_encoding: Encoding,
    pub repetition_level_encoding: Encoding,
    pub statistics: Option<Statistics>,
}

#[derive(Clone, Debug)]
pub struct DictionaryPageHeader {
    pub num_values: i32,
    pub encoding: Encoding,
    pub is_sorted: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct DataPageHeaderV2 {
    pub num_values: i32,
    pub num_nulls: i32,
    pub num_rows: i32,
    pub encoding: Encoding,
    pub definition_levels_byte_length: i32,
    pub repetition_levels_byte_length: i32,
    pub is_compressed: bool,
    pub statistics: Option<Statistics>,
}

#[derive(Clone, Debug)]
pub struct PageHeader {
    pub type_: PageType,
    pub uncompressed_page_size: i32,
    pub compressed_page_size: i32,
    pub crc: Option<i32>,
    pub data_page_header: Option<DataPageHeader>,
    pub dictionary_page_header: Option<DictionaryPageHeader>,
    pub data_page_header_v2: Option<DataPageHeaderV2>,
}

impl PageHeader {
    fn write_to(&self, prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        prot.write_struct_begin(&TStructIdentifier::new("PageHeader"))?;
        field_i32(prot, "type", 1, self.type_.to_thrift())?;
        field_i32(prot, "uncompressed_page_size", 2, self.uncompressed_page_size)?;
        field_i32(prot, "compressed_page_size", 3, self.compressed_page_size)?;
        if let Some(crc) = self.crc {
            field_i32(prot, "crc", 4, crc)?;
        }
        if let Some(h) = &self.data_page_header {
            prot.write_field_begin(&TFieldIdentifier::new(
                "data_page_header",
                TType::Struct,
                5,
            ))?;
            prot.write_struct_begin(&TStructIdentifier::new("DataPageHeader"))?;
            field_i32(prot, "num_values", 1, h.num_values)?;
            field_i32(prot, "encoding", 2, h.encoding.to_thrift())?;
            field_i32(
                prot,
                "definition_level_encoding",
                3,
                h.definition_level_encoding.to_thrift(),
            )?;
            field_i32(
                prot,
                "repetition_level_encoding",
                4,
                h.repetition_level_encoding.to_thrift(),
            )?;
            statistics_field(prot, 5, &h.statistics)?;
            prot.write_field_stop()?;
            prot.write_struct_end()?;
            prot.write_field_end()?;
        }
        if let Some(h) = &self.dictionary_page_header {
            prot.write_field_begin(&TFieldIdentifier::new(
                "dictionary_page_header",
                TType::Struct,
                7,
            ))?;
            prot.write_struct_begin(&TStructIdentifier::new("DictionaryPageHeader"))?;
            field_i32(prot, "num_values", 1, h.num_values)?;
            field_i32(prot, "encoding", 2, h.encoding.to_thrift())?;
            if let Some(sorted) = h.is_sorted {
                field_bool(prot, "is_sorted", 3, sorted)?;
            }
            prot.write_field_stop()?;
            prot.write_struct_end()?;
            prot.write_field_end()?;
        }
        if let Some(h) = &self.data_page_header_v2 {
            prot.write_field_begin(&TFieldIdentifier::new(
                "data_page_header_v2",
                TType::Struct,
                8,
            ))?;
            prot.write_struct_begin(&TStructIdentifier::new("DataPageHeaderV2"))?;
            field_i32(prot, "num_values", 1, h.num_values)?;
            field_i32(prot, "num_nulls", 2, h.num_nulls)?;
            field_i32(prot, "num_rows", 3, h.num_rows)?;
            field_i32(prot, "encoding", 4, h.encoding.to_thrift())?;
            field_i32(
                prot,
                "definition_levels_byte_length",
                5,
                h.definition_levels_byte_length,
            )?;
            field_i32(
                prot,
                "repetition_levels_byte_length",
                6,
                h.repetition_levels_byte_length,
            )?;
            field_bool(prot, "is_compressed", 7, h.is_compressed)?;
            statistics_field(prot, 8, &h.statistics)?;
            prot.write_field_stop()?;
            prot.write_struct_end()?;
            prot.write_field_end()?;
        }
        prot.write_field_stop()?;
        prot.write_struct_end()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serialize(|prot| self.write_to(prot))
    }
}

#[derive(Clone, Debug)]
pub struct KeyValue {
    pub key: String,
    pub value: Option<String>,
}

impl KeyValue {
    fn write_to(&self, prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        prot.write_struct_begin(&TStructIdentifier::new("KeyValue"))?;
        field_string(prot, "key", 1, &self.key)?;
        if let Some(v) = &self.value {
            field_string(prot, "value", 2, v)?;
        }
        prot.write_field_stop()?;
        prot.write_struct_end()
    }
}

#[derive(Clone, Debug)]
pub struct ColumnMetaData {
    pub type_: PhysicalType,
    pub encodings: Vec<Encoding>,
    pub path_in_schema: Vec<String>,
    pub codec: Compression,
    pub num_values: i64,
    pub total_uncompressed_size: i64,
    pub total_compressed_size: i64,
    pub data_page_offset: i64,
    pub dictionary_page_offset: Option<i64>,
    pub statistics: Option<Statistics>,
}

impl ColumnMetaData {
    fn write_to(&self, prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        prot.write_struct_begin(&TStructIdentifier::new("ColumnMetaData"))?;
        field_i32(prot, "type", 1, self.type_.to_thrift())?;
        prot.write_field_begin(&TFieldIdentifier::new("encodings", TType::List, 2))?;
        prot.write_list_begin(&TListIdentifier::new(TType::I32, self.encodings.len() as i32))?;
        for e in &self.encodings {
            prot.write_i32(e.to_thrift())?;
        }
        prot.write_list_end()?;
        prot.write_field_end()?;
        prot.write_field_begin(&TFieldIdentifier::new("path_in_schema", TType::List, 3))?;
        prot.write_list_begin(&TListIdentifier::new(
            TType::String,
            self.path_in_schema.len() as i32,
        ))?;
        for p in &self.path_in_schema {
            prot.write_string(p)?;
        }
        prot.write_list_end()?;
        prot.write_field_end()?;
        field_i32(prot, "codec", 4, self.codec.to_thrift())?;
        field_i64(prot, "num_values", 5, self.num_values)?;
        field_i64(prot, "total_uncompressed_size", 6, self.total_uncompressed_size)?;
        field_i64(prot, "total_compressed_size", 7, self.total_compressed_size)?;
        field_i64(prot, "data_page_offset", 9, self.data_page_offset)?;
        if let Some(off) = self.dictionary_page_offset {
            field_i64(prot, "dictionary_page_offset", 11, off)?;
        }
        statistics_field(prot, 12, &self.statistics)?;
        prot.write_field_stop()?;
        prot.write_struct_end()
    }
}

/// Serializes a bare ColumnMetaData struct, the unit that is separately
/// encrypted when a column has its own key.
pub fn serialize_column_meta_data(meta: &ColumnMetaData) -> Result<Vec<u8>> {
    serialize(|prot| meta.write_to(prot))
}

#[derive(Clone, Debug)]
pub struct EncryptionWithColumnKey {
    pub path_in_schema: Vec<String>,
    pub key_metadata: Option<Vec<u8>>,
}

/// How one column chunk's pages and metadata are keyed.
#[derive(Clone, Debug)]
pub enum ColumnCryptoMetaData {
    EncryptionWithFooterKey,
    EncryptionWithColumnKey(EncryptionWithColumnKey),
}

impl ColumnCryptoMetaData {
    fn write_to(&self, prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        prot.write_struct_begin(&TStructIdentifier::new("ColumnCryptoMetaData"))?;
        match self {
            ColumnCryptoMetaData::EncryptionWithFooterKey => {
                empty_variant(prot, "ENCRYPTION_WITH_FOOTER_KEY", 1)?;
            }
            ColumnCryptoMetaData::EncryptionWithColumnKey(inner) => {
                prot.write_field_begin(&TFieldIdentifier::new(
                    "ENCRYPTION_WITH_COLUMN_KEY",
                    TType::Struct,
                    2,
                ))?;
                prot.write_struct_begin(&TStructIdentifier::new("EncryptionWithColumnKey"))?;
                prot.write_field_begin(&TFieldIdentifier::new(
                    "path_in_schema",
                    TType::List,
                    1,
                ))?;
                prot.write_list_begin(&TListIdentifier::new(
                    TType::String,
                    inner.path_in_schema.len() as i32,
                ))?;
                for p in &inner.path_in_schema {
                    prot.write_string(p)?;
                }
                prot.write_list_end()?;
                prot.write_field_end()?;
                if let Some(km) = &inner.key_metadata {
                    field_binary(prot, "key_metadata", 2, km)?;
                }
                prot.write_field_stop()?;
                prot.write_struct_end()?;
                prot.write_field_end()?;
            }
        }
        prot.write_field_stop()?;
        prot.write_struct_end()
    }
}

#[derive(Clone, Debug)]
pub struct ColumnChunk {
    pub file_offset: i64,
    pub meta_data: Option<ColumnMetaData>,
    pub crypto_metadata: Option<ColumnCryptoMetaData>,
    pub encrypted_column_metadata: Option<Vec<u8>>,
}

impl ColumnChunk {
    fn write_to(&self, prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        prot.write_struct_begin(&TStructIdentifier::new("ColumnChunk"))?;
        field_i64(prot, "file_offset", 2, self.file_offset)?;
        if let Some(meta) = &self.meta_data {
            prot.write_field_begin(&TFieldIdentifier::new("meta_data", TType::Struct, 3))?;
            meta.write_to(prot)?;
            prot.write_field_end()?;
        }
        if let Some(crypto) = &self.crypto_metadata {
            prot.write_field_begin(&TFieldIdentifier::new(
                "crypto_metadata",
                TType::Struct,
                8,
            ))?;
            crypto.write_to(prot)?;
            prot.write_field_end()?;
        }
        if let Some(enc) = &self.encrypted_column_metadata {
            field_binary(prot, "encrypted_column_metadata", 9, enc)?;
        }
        prot.write_field_stop()?;
        prot.write_struct_end()
    }
}

#[derive(Clone, Debug)]
pub struct RowGroup {
    pub columns: Vec<ColumnChunk>,
    pub total_byte_size: i64,
    pub num_rows: i64,
    pub file_offset: Option<i64>,
    pub total_compressed_size: Option<i64>,
    pub ordinal: Option<i16>,
}

impl RowGroup {
    fn write_to(&self, prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        prot.write_struct_begin(&TStructIdentifier::new("RowGroup"))?;
        prot.write_field_begin(&TFieldIdentifier::new("columns", TType::List, 1))?;
        prot.write_list_begin(&TListIdentifier::new(TType::Struct, self.columns.len() as i32))?;
        for c in &self.columns {
            c.write_to(prot)?;
        }
        prot.write_list_end()?;
        prot.write_field_end()?;
        field_i64(prot, "total_byte_size", 2, self.total_byte_size)?;
        field_i64(prot, "num_rows", 3, self.num_rows)?;
        if let Some(off) = self.file_offset {
            field_i64(prot, "file_offset", 5, off)?;
        }
        if let Some(size) = self.total_compressed_size {
            field_i64(prot, "total_compressed_size", 6, size)?;
        }
        if let Some(ordinal) = self.ordinal {
            field_i16(prot, "ordinal", 7, ordinal)?;
        }
        prot.write_field_stop()?;
        prot.write_struct_end()
    }
}

/// Footer column order entry; always the type-defined order here.
#[derive(Clone, Copy, Debug)]
pub enum ColumnOrder {
    TypeDefinedOrder,
}

impl ColumnOrder {
    fn write_to(&self, prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        prot.write_struct_begin(&TStructIdentifier::new("ColumnOrder"))?;
        match self {
            ColumnOrder::TypeDefinedOrder => empty_variant(prot, "TYPE_ORDER", 1)?,
        }
        prot.write_field_stop()?;
        prot.write_struct_end()
    }
}

#[derive(Clone, Debug, Default)]
pub struct AesGcmV1 {
    pub aad_prefix: Option<Vec<u8>>,
    pub aad_file_unique: Option<Vec<u8>>,
    pub supply_aad_prefix: Option<bool>,
}

impl AesGcmV1 {
    fn write_to(&self, name: &str, prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        prot.write_struct_begin(&TStructIdentifier::new(name))?;
        if let Some(p) = &self.aad_prefix {
            field_binary(prot, "aad_prefix", 1, p)?;
        }
        if let Some(u) = &self.aad_file_unique {
            field_binary(prot, "aad_file_unique", 2, u)?;
        }
        if let Some(s) = self.supply_aad_prefix {
            field_bool(prot, "supply_aad_prefix", 3, s)?;
        }
        prot.write_field_stop()?;
        prot.write_struct_end()
    }
}

#[derive(Clone, Debug)]
pub enum EncryptionAlgorithm {
    AesGcmV1(AesGcmV1),
    AesGcmCtrV1(AesGcmV1),
}

impl EncryptionAlgorithm {
    fn write_to(&self, prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        prot.write_struct_begin(&TStructIdentifier::new("EncryptionAlgorithm"))?;
        match self {
            EncryptionAlgorithm::AesGcmV1(inner) => {
                prot.write_field_begin(&TFieldIdentifier::new("AES_GCM_V1", TType::Struct, 1))?;
                inner.write_to("AesGcmV1", prot)?;
                prot.write_field_end()?;
            }
            EncryptionAlgorithm::AesGcmCtrV1(inner) => {
                prot.write_field_begin(&TFieldIdentifier::new(
                    "AES_GCM_CTR_V1",
                    TType::Struct,
                    2,
                ))?;
                inner.write_to("AesGcmCtrV1", prot)?;
                prot.write_field_end()?;
            }
        }
        prot.write_field_stop()?;
        prot.write_struct_end()
    }
}

#[derive(Clone, Debug)]
pub struct FileMetaData {
    pub version: i32,
    pub schema: Vec<SchemaElement>,
    pub num_rows: i64,
    pub row_groups: Vec<RowGroup>,
    pub key_value_metadata: Option<Vec<KeyValue>>,
    pub created_by: Option<String>,
    pub column_orders: Option<Vec<ColumnOrder>>,
    pub encryption_algorithm: Option<EncryptionAlgorithm>,
    pub footer_signing_key_metadata: Option<Vec<u8>>,
}

impl FileMetaData {
    fn write_to(&self, prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        prot.write_struct_begin(&TStructIdentifier::new("FileMetaData"))?;
        field_i32(prot, "version", 1, self.version)?;
        prot.write_field_begin(&TFieldIdentifier::new("schema", TType::List, 2))?;
        prot.write_list_begin(&TListIdentifier::new(TType::Struct, self.schema.len() as i32))?;
        for element in &self.schema {
            element.write_to(prot)?;
        }
        prot.write_list_end()?;
        prot.write_field_end()?;
        field_i64(prot, "num_rows", 3, self.num_rows)?;
        prot.write_field_begin(&TFieldIdentifier::new("row_groups", TType::List, 4))?;
        prot.write_list_begin(&TListIdentifier::new(
            TType::Struct,
            self.row_groups.len() as i32,
        ))?;
        for rg in &self.row_groups {
            rg.write_to(prot)?;
        }
        prot.write_list_end()?;
        prot.write_field_end()?;
        if let Some(kvs) = &self.key_value_metadata {
            prot.write_field_begin(&TFieldIdentifier::new(
                "key_value_metadata",
                TType::List,
                5,
            ))?;
            prot.write_list_begin(&TListIdentifier::new(TType::Struct, kvs.len() as i32))?;
            for kv in kvs {
                kv.write_to(prot)?;
            }
            prot.write_list_end()?;
            prot.write_field_end()?;
        }
        if let Some(created_by) = &self.created_by {
            field_string(prot, "created_by", 6, created_by)?;
        }
        if let Some(orders) = &self.column_orders {
            prot.write_field_begin(&TFieldIdentifier::new("column_orders", TType::List, 7))?;
            prot.write_list_begin(&TListIdentifier::new(TType::Struct, orders.len() as i32))?;
            for order in orders {
                order.write_to(prot)?;
            }
            prot.write_list_end()?;
            prot.write_field_end()?;
        }
        if let Some(algo) = &self.encryption_algorithm {
            prot.write_field_begin(&TFieldIdentifier::new(
                "encryption_algorithm",
                TType::Struct,
                8,
            ))?;
            algo.write_to(prot)?;
            prot.write_field_end()?;
        }
        if let Some(km) = &self.footer_signing_key_metadata {
            field_binary(prot, "footer_signing_key_metadata", 9, km)?;
        }
        prot.write_field_stop()?;
        prot.write_struct_end()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serialize(|prot| self.write_to(prot))
    }
}

/// Crypto header that precedes an encrypted footer.
#[derive(Clone, Debug)]
pub struct FileCryptoMetaData {
    pub encryption_algorithm: EncryptionAlgorithm,
    pub key_metadata: Option<Vec<u8>>,
}

impl FileCryptoMetaData {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serialize(|prot| {
            prot.write_struct_begin(&TStructIdentifier::new("FileCryptoMetaData"))?;
            prot.write_field_begin(&TFieldIdentifier::new(
                "encryption_algorithm",
                TType::Struct,
                1,
            ))?;
            self.encryption_algorithm.write_to(prot)?;
            prot.write_field_end()?;
            if let Some(km) = &self.key_metadata {
                field_binary(prot, "key_metadata", 2, km)?;
            }
            prot.write_field_stop()?;
            prot.write_struct_end()
        })
    }
}
