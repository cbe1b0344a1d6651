//! Column writers: buffer ⟨rep, def, value⟩ triples, attempt dictionary
//! encoding first, fall back when the dictionary overflows, and cut pages
//! when the size or row-count thresholds are hit.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;

use bytes::Bytes;
use parq_core::errors::{Error, Result};
use parq_core::internal_err;
use parq_core::util::memory::ChunkedBytes;
use parq_core::value::{ByteArray, Int96};
use parq_encoding::schemes::delta::DeltaBitPackEncoder;
use parq_encoding::schemes::delta_bytes::DeltaByteArrayEncoder;
use parq_encoding::schemes::levels::encode_levels;
use parq_encoding::schemes::plain::{PlainBooleanEncoder, PlainEncoder, PlainFixedEncoder};
use parq_encoding::schemes::Encoder;
use parq_format::basic::{Encoding, PhysicalType};
use parq_format::metadata::Statistics as StatisticsThrift;

use crate::dict::{DictEncoder, DictValue};
use crate::encryption::FileEncryptor;
use crate::options::{WriterProperties, WriterVersion};
use crate::record::PrimitiveValue;
use crate::schema::descriptor::ColumnDescriptor;
use crate::schema::types::Schema;
use crate::statistics::{StatValue, ValueStatistics};

use super::page::{Page, PageCrypto, PageWriter, SerializedPage};

/// A physical value kind a column writer can be instantiated over. Dispatch
/// is static from here down; only construction is schema-driven.
pub trait ColumnValue: StatValue + DictValue + Clone + Debug + 'static {
    const PHYSICAL: PhysicalType;

    fn from_primitive(value: &PrimitiveValue, desc: &ColumnDescriptor) -> Result<Self>;

    fn to_primitive(&self) -> PrimitiveValue;

    fn plain_encoder(desc: &ColumnDescriptor) -> Box<dyn Encoder<Self>>;

    /// Post-dictionary encoding: PLAIN for v1, the DELTA_* family for v2
    /// where one exists.
    fn fallback_encoder(desc: &ColumnDescriptor, version: WriterVersion) -> Box<dyn Encoder<Self>>;

    fn supports_dictionary() -> bool {
        true
    }
}

fn type_mismatch(desc: &ColumnDescriptor, value: &PrimitiveValue) -> Error {
    Error::Schema(format!(
        "column {} expects {}, got a {} value",
        desc.path_string(),
        desc.physical,
        value.physical_type()
    ))
}

impl ColumnValue for bool {
    const PHYSICAL: PhysicalType = PhysicalType::Boolean;

    fn from_primitive(value: &PrimitiveValue, desc: &ColumnDescriptor) -> Result<Self> {
        match value {
            PrimitiveValue::Boolean(v) => Ok(*v),
            other => Err(type_mismatch(desc, other)),
        }
    }

    fn to_primitive(&self) -> PrimitiveValue {
        PrimitiveValue::Boolean(*self)
    }

    fn plain_encoder(_desc: &ColumnDescriptor) -> Box<dyn Encoder<Self>> {
        Box::new(PlainBooleanEncoder::new())
    }

    fn fallback_encoder(desc: &ColumnDescriptor, _version: WriterVersion) -> Box<dyn Encoder<Self>> {
        Self::plain_encoder(desc)
    }

    fn supports_dictionary() -> bool {
        false
    }
}

impl ColumnValue for i32 {
    const PHYSICAL: PhysicalType = PhysicalType::Int32;

    fn from_primitive(value: &PrimitiveValue, desc: &ColumnDescriptor) -> Result<Self> {
        match value {
            PrimitiveValue::Int32(v) => Ok(*v),
            other => Err(type_mismatch(desc, other)),
        }
    }

    fn to_primitive(&self) -> PrimitiveValue {
        PrimitiveValue::Int32(*self)
    }

    fn plain_encoder(_desc: &ColumnDescriptor) -> Box<dyn Encoder<Self>> {
        Box::new(PlainEncoder::<i32>::new())
    }

    fn fallback_encoder(desc: &ColumnDescriptor, version: WriterVersion) -> Box<dyn Encoder<Self>> {
        match version {
            WriterVersion::V1 => Self::plain_encoder(desc),
            WriterVersion::V2 => Box::new(DeltaBitPackEncoder::new()),
        }
    }
}

impl ColumnValue for i64 {
    const PHYSICAL: PhysicalType = PhysicalType::Int64;

    fn from_primitive(value: &PrimitiveValue, desc: &ColumnDescriptor) -> Result<Self> {
        match value {
            PrimitiveValue::Int64(v) => Ok(*v),
            other => Err(type_mismatch(desc, other)),
        }
    }

    fn to_primitive(&self) -> PrimitiveValue {
        PrimitiveValue::Int64(*self)
    }

    fn plain_encoder(_desc: &ColumnDescriptor) -> Box<dyn Encoder<Self>> {
        Box::new(PlainEncoder::<i64>::new())
    }

    fn fallback_encoder(desc: &ColumnDescriptor, version: WriterVersion) -> Box<dyn Encoder<Self>> {
        match version {
            WriterVersion::V1 => Self::plain_encoder(desc),
            WriterVersion::V2 => Box::new(DeltaBitPackEncoder::new()),
        }
    }
}

impl ColumnValue for Int96 {
    const PHYSICAL: PhysicalType = PhysicalType::Int96;

    fn from_primitive(value: &PrimitiveValue, desc: &ColumnDescriptor) -> Result<Self> {
        match value {
            PrimitiveValue::Int96(v) => Ok(*v),
            other => Err(type_mismatch(desc, other)),
        }
    }

    fn to_primitive(&self) -> PrimitiveValue {
        PrimitiveValue::Int96(*self)
    }

    fn plain_encoder(_desc: &ColumnDescriptor) -> Box<dyn Encoder<Self>> {
        Box::new(PlainEncoder::<Int96>::new())
    }

    fn fallback_encoder(desc: &ColumnDescriptor, _version: WriterVersion) -> Box<dyn Encoder<Self>> {
        Self::plain_encoder(desc)
    }
}

impl ColumnValue for f32 {
    const PHYSICAL: PhysicalType = PhysicalType::Float;

    fn from_primitive(value: &PrimitiveValue, desc: &ColumnDescriptor) -> Result<Self> {
        match value {
            PrimitiveValue::Float(v) => Ok(*v),
            other => Err(type_mismatch(desc, other)),
        }
    }

    fn to_primitive(&self) -> PrimitiveValue {
        PrimitiveValue::Float(*self)
    }

    fn plain_encoder(_desc: &ColumnDescriptor) -> Box<dyn Encoder<Self>> {
        Box::new(PlainEncoder::<f32>::new())
    }

    fn fallback_encoder(desc: &ColumnDescriptor, _version: WriterVersion) -> Box<dyn Encoder<Self>> {
        Self::plain_encoder(desc)
    }
}

impl ColumnValue for f64 {
    const PHYSICAL: PhysicalType = PhysicalType::Double;

    fn from_primitive(value: &PrimitiveValue, desc: &ColumnDescriptor) -> Result<Self> {
        match value {
            PrimitiveValue::Double(v) => Ok(*v),
            other => Err(type_mismatch(desc, other)),
        }
    }

    fn to_primitive(&self) -> PrimitiveValue {
        PrimitiveValue::Double(*self)
    }

    fn plain_encoder(_desc: &ColumnDescriptor) -> Box<dyn Encoder<Self>> {
        Box::new(PlainEncoder::<f64>::new())
    }

    fn fallback_encoder(desc: &ColumnDescriptor, _version: WriterVersion) -> Box<dyn Encoder<Self>> {
        Self::plain_encoder(desc)
    }
}

impl ColumnValue for ByteArray {
    const PHYSICAL: PhysicalType = PhysicalType::ByteArray;

    fn from_primitive(value: &PrimitiveValue, desc: &ColumnDescriptor) -> Result<Self> {
        match value {
            PrimitiveValue::Bytes(v) => {
                if desc.physical == PhysicalType::FixedLenByteArray {
                    let expected = desc.type_length.unwrap_or(0) as usize;
                    if v.len() != expected {
                        return Err(Error::Schema(format!(
                            "column {} expects FIXED_LEN_BYTE_ARRAY({}), got {} bytes",
                            desc.path_string(),
                            expected,
                            v.len()
                        )));
                    }
                }
                Ok(v.clone())
            }
            other => Err(type_mismatch(desc, other)),
        }
    }

    fn to_primitive(&self) -> PrimitiveValue {
        PrimitiveValue::Bytes(self.clone())
    }

    fn plain_encoder(desc: &ColumnDescriptor) -> Box<dyn Encoder<Self>> {
        match desc.physical {
            PhysicalType::FixedLenByteArray => Box::new(PlainFixedEncoder::new(
                desc.type_length.unwrap_or(0) as usize,
            )),
            _ => Box::new(PlainEncoder::<ByteArray>::new()),
        }
    }

    fn fallback_encoder(desc: &ColumnDescriptor, version: WriterVersion) -> Box<dyn Encoder<Self>> {
        match version {
            WriterVersion::V1 => Self::plain_encoder(desc),
            WriterVersion::V2 => Box::new(DeltaByteArrayEncoder::new()),
        }
    }
}

enum ValuesState<T: ColumnValue> {
    /// Dictionary-first; indices buffered per page.
    Dict(DictEncoder<T>),
    /// Fell back after dictionary-encoded pages were already cut; the retired
    /// dictionary still backs the dictionary page.
    Fallback {
        dict: Option<DictEncoder<T>>,
        encoder: Box<dyn Encoder<T>>,
    },
    /// Never dictionary-encoded.
    Direct(Box<dyn Encoder<T>>),
}

/// Everything one closed column chunk hands to the file writer.
pub struct ColumnChunkData {
    pub desc: Arc<ColumnDescriptor>,
    pub dictionary: Option<SerializedPage>,
    pub pages: Vec<SerializedPage>,
    pub num_values: i64,
    pub encodings: Vec<Encoding>,
    pub statistics: Option<StatisticsThrift>,
    pub total_uncompressed_size: i64,
    pub total_compressed_size: i64,
}

pub struct TypedColumnWriter<T: ColumnValue> {
    desc: Arc<ColumnDescriptor>,
    props: Arc<WriterProperties>,
    page_writer: PageWriter,
    values: ValuesState<T>,
    rep_levels: Vec<i16>,
    def_levels: Vec<i16>,
    num_buffered_triples: u32,
    nulls_in_page: u32,
    rows_in_page: u32,
    page_stats: ValueStatistics<T>,
    chunk_stats: ValueStatistics<T>,
    total_values: u64,
    encodings: BTreeSet<Encoding>,
    dict_pages_written: u32,
}

impl<T: ColumnValue> TypedColumnWriter<T> {
    pub fn new(
        desc: Arc<ColumnDescriptor>,
        props: Arc<WriterProperties>,
        page_writer: PageWriter,
    ) -> Self {
        debug_assert!(
            desc.physical == T::PHYSICAL
                || (T::PHYSICAL == PhysicalType::ByteArray
                    && desc.physical == PhysicalType::FixedLenByteArray),
            "writer for {} bound to column {}",
            T::PHYSICAL,
            desc.path_string()
        );
        let values = if props.dictionary_enabled() && T::supports_dictionary() {
            ValuesState::Dict(DictEncoder::new(desc.type_length))
        } else {
            ValuesState::Direct(T::fallback_encoder(&desc, props.version()))
        };
        let order = desc.sort_order;
        Self {
            desc,
            props,
            page_writer,
            values,
            rep_levels: Vec::new(),
            def_levels: Vec::new(),
            num_buffered_triples: 0,
            nulls_in_page: 0,
            rows_in_page: 0,
            page_stats: ValueStatistics::new(order),
            chunk_stats: ValueStatistics::new(order),
            total_values: 0,
            encodings: BTreeSet::new(),
            dict_pages_written: 0,
        }
    }

    pub fn write_triple(
        &mut self,
        rep: i16,
        def: i16,
        value: Option<&PrimitiveValue>,
    ) -> Result<()> {
        if rep < 0 || rep > self.desc.max_rep_level || def < 0 || def > self.desc.max_def_level {
            return internal_err!(
                "levels ({}, {}) out of range for column {} (max {}, {})",
                rep,
                def,
                self.desc.path_string(),
                self.desc.max_rep_level,
                self.desc.max_def_level
            );
        }
        if value.is_some() != (def == self.desc.max_def_level) {
            return internal_err!(
                "value presence must match def == max_def for column {}",
                self.desc.path_string()
            );
        }
        if self.desc.max_rep_level > 0 {
            self.rep_levels.push(rep);
            if rep == 0 {
                self.rows_in_page += 1;
            }
        } else {
            self.rows_in_page += 1;
        }
        if self.desc.max_def_level > 0 {
            self.def_levels.push(def);
        }
        match value {
            Some(value) => {
                let value = T::from_primitive(value, &self.desc)?;
                self.page_stats.update(&value);
                let mut dict_overflowed = false;
                match &mut self.values {
                    ValuesState::Dict(dict) => {
                        dict.put(&value);
                        dict_overflowed =
                            dict.dict_byte_size() > self.props.dictionary_page_size();
                    }
                    ValuesState::Fallback { encoder, .. } | ValuesState::Direct(encoder) => {
                        encoder.put(&value)?;
                    }
                }
                if dict_overflowed {
                    self.fall_back()?;
                }
            }
            None => {
                self.page_stats.update_null();
                self.nulls_in_page += 1;
            }
        }
        self.num_buffered_triples += 1;
        // v2 pages split on record boundaries; v1 checks on every write
        if self.props.version() == WriterVersion::V1 {
            self.maybe_flush_page()?;
        }
        Ok(())
    }

    /// Record boundary. V2 uses this as the page split point.
    pub fn end_record(&mut self) -> Result<()> {
        if self.props.version() == WriterVersion::V2 {
            if self.rows_in_page as usize >= self.props.page_row_count_limit() {
                return self.add_data_page();
            }
            self.maybe_flush_page()?;
        }
        Ok(())
    }

    fn value_buffered_size(&self) -> usize {
        match &self.values {
            ValuesState::Dict(dict) => dict.indices_byte_size(),
            ValuesState::Fallback { encoder, .. } | ValuesState::Direct(encoder) => {
                encoder.buffered_size()
            }
        }
    }

    /// Unflushed triple bytes plus staged pages; the flusher probes this.
    pub fn buffered_size(&self) -> usize {
        self.rep_levels.len()
            + self.def_levels.len()
            + self.value_buffered_size()
            + match &self.values {
                ValuesState::Dict(dict) => dict.dict_byte_size(),
                ValuesState::Fallback { dict, .. } => {
                    dict.as_ref().map_or(0, |d| d.dict_byte_size())
                }
                ValuesState::Direct(_) => 0,
            }
            + self.page_writer.buffered_size()
    }

    pub fn allocated_size(&self) -> usize {
        self.rep_levels.capacity() * 2
            + self.def_levels.capacity() * 2
            + match &self.values {
                ValuesState::Dict(dict) => dict.dict_byte_size() + dict.indices_byte_size(),
                ValuesState::Fallback { encoder, .. } | ValuesState::Direct(encoder) => {
                    encoder.allocated_size()
                }
            }
            + self.page_writer.buffered_size()
    }

    fn maybe_flush_page(&mut self) -> Result<()> {
        if self.num_buffered_triples == 0 {
            return Ok(());
        }
        let buffered =
            self.rep_levels.len() + self.def_levels.len() + self.value_buffered_size();
        if buffered >= self.props.data_page_size() {
            self.add_data_page()?;
        }
        Ok(())
    }

    fn fall_back(&mut self) -> Result<()> {
        let state = std::mem::replace(
            &mut self.values,
            ValuesState::Dict(DictEncoder::new(None)),
        );
        let ValuesState::Dict(mut dict) = state else {
            return internal_err!("fallback from a non-dictionary state");
        };
        let mut encoder = T::fallback_encoder(&self.desc, self.props.version());
        for value in dict.replay_page_values() {
            encoder.put(&value)?;
        }
        log::debug!(
            "column {}: dictionary grew past {} bytes after {} entries, falling back to {:?}",
            self.desc.path_string(),
            self.props.dictionary_page_size(),
            dict.num_entries(),
            encoder.encoding()
        );
        self.values = if self.dict_pages_written == 0 {
            // nothing referenced the dictionary yet, drop it entirely
            ValuesState::Direct(encoder)
        } else {
            dict.retire();
            ValuesState::Fallback {
                dict: Some(dict),
                encoder,
            }
        };
        Ok(())
    }

    fn add_data_page(&mut self) -> Result<()> {
        if self.num_buffered_triples == 0 {
            return Ok(());
        }
        let is_dict = matches!(self.values, ValuesState::Dict(_));
        let (encoding, value_bytes) = match &mut self.values {
            ValuesState::Dict(dict) => {
                let encoding = match self.props.version() {
                    WriterVersion::V1 => Encoding::PlainDictionary,
                    WriterVersion::V2 => Encoding::RleDictionary,
                };
                (encoding, dict.take_indices_page()?)
            }
            ValuesState::Fallback { encoder, .. } | ValuesState::Direct(encoder) => {
                (encoder.encoding(), encoder.take_bytes()?)
            }
        };
        self.encodings.insert(encoding);
        if is_dict {
            self.dict_pages_written += 1;
        }
        let statistics = self
            .props
            .statistics_enabled()
            .then(|| self.page_stats.to_thrift())
            .flatten();
        self.chunk_stats.merge(&self.page_stats);
        self.page_stats = ValueStatistics::new(self.desc.sort_order);

        let num_values = self.num_buffered_triples;
        match self.props.version() {
            WriterVersion::V1 => {
                let mut buf = ChunkedBytes::new();
                if self.desc.max_rep_level > 0 {
                    buf.push(encode_levels(&self.rep_levels, self.desc.max_rep_level, true)?);
                }
                if self.desc.max_def_level > 0 {
                    buf.push(encode_levels(&self.def_levels, self.desc.max_def_level, true)?);
                }
                buf.push(value_bytes);
                self.page_writer.write_page(Page::DataV1 {
                    buf: buf.concat(),
                    num_values,
                    encoding,
                    statistics,
                })?;
            }
            WriterVersion::V2 => {
                let rep_levels = if self.desc.max_rep_level > 0 {
                    encode_levels(&self.rep_levels, self.desc.max_rep_level, false)?
                } else {
                    Bytes::new()
                };
                let def_levels = if self.desc.max_def_level > 0 {
                    encode_levels(&self.def_levels, self.desc.max_def_level, false)?
                } else {
                    Bytes::new()
                };
                self.page_writer.write_page(Page::DataV2 {
                    rep_levels,
                    def_levels,
                    values: value_bytes,
                    num_values,
                    num_nulls: self.nulls_in_page,
                    num_rows: self.rows_in_page,
                    encoding,
                    statistics,
                })?;
            }
        }
        self.total_values += num_values as u64;
        self.rep_levels.clear();
        self.def_levels.clear();
        self.num_buffered_triples = 0;
        self.nulls_in_page = 0;
        self.rows_in_page = 0;
        Ok(())
    }

    pub fn close(mut self) -> Result<ColumnChunkData> {
        self.add_data_page()?;
        let mut distinct_count = None;
        let dict_page_encoding = match self.props.version() {
            WriterVersion::V1 => Encoding::PlainDictionary,
            WriterVersion::V2 => Encoding::Plain,
        };
        match &mut self.values {
            ValuesState::Dict(dict) if dict.num_entries() > 0 => {
                distinct_count = Some(dict.num_entries() as u64);
                let payload = dict.dict_page_payload()?;
                let num_values = dict.num_entries() as u32;
                self.page_writer
                    .write_page(Page::Dictionary { buf: payload, num_values })?;
                self.encodings.insert(dict_page_encoding);
            }
            ValuesState::Fallback { dict: Some(dict), .. } if dict.num_entries() > 0 => {
                let payload = dict.dict_page_payload()?;
                let num_values = dict.num_entries() as u32;
                self.page_writer
                    .write_page(Page::Dictionary { buf: payload, num_values })?;
                self.encodings.insert(dict_page_encoding);
            }
            _ => {}
        }
        if self.desc.max_rep_level > 0 || self.desc.max_def_level > 0 {
            self.encodings.insert(Encoding::Rle);
        }
        let statistics = self
            .props
            .statistics_enabled()
            .then(|| {
                if let Some(count) = distinct_count {
                    self.chunk_stats.set_distinct_count(count);
                }
                self.chunk_stats.to_thrift()
            })
            .flatten();
        if log::log_enabled!(log::Level::Debug) {
            if let (Some(min), Some(max)) = (self.chunk_stats.min(), self.chunk_stats.max()) {
                log::debug!(
                    "column {} chunk closed: {} values, {} nulls, min={} max={}",
                    self.desc.path_string(),
                    self.total_values,
                    self.chunk_stats.null_count(),
                    crate::stringify::stringify(&self.desc, &min.to_primitive()),
                    crate::stringify::stringify(&self.desc, &max.to_primitive()),
                );
            }
        }
        let (dictionary, pages) = self.page_writer.take_pages();
        let total_uncompressed_size = dictionary
            .iter()
            .chain(pages.iter())
            .map(|p| p.uncompressed_size as i64)
            .sum();
        let total_compressed_size = dictionary
            .iter()
            .chain(pages.iter())
            .map(|p| p.compressed_size as i64)
            .sum();
        Ok(ColumnChunkData {
            desc: self.desc,
            dictionary,
            pages,
            num_values: self.total_values as i64,
            encodings: self.encodings.into_iter().collect(),
            statistics,
            total_uncompressed_size,
            total_compressed_size,
        })
    }
}

/// Static dispatch over the physical type, chosen once at construction.
pub enum ColumnWriter {
    Boolean(TypedColumnWriter<bool>),
    Int32(TypedColumnWriter<i32>),
    Int64(TypedColumnWriter<i64>),
    Int96(TypedColumnWriter<Int96>),
    Float(TypedColumnWriter<f32>),
    Double(TypedColumnWriter<f64>),
    Bytes(TypedColumnWriter<ByteArray>),
}

macro_rules! dispatch {
    ($self:expr, $writer:ident => $body:expr) => {
        match $self {
            ColumnWriter::Boolean($writer) => $body,
            ColumnWriter::Int32($writer) => $body,
            ColumnWriter::Int64($writer) => $body,
            ColumnWriter::Int96($writer) => $body,
            ColumnWriter::Float($writer) => $body,
            ColumnWriter::Double($writer) => $body,
            ColumnWriter::Bytes($writer) => $body,
        }
    };
}

impl ColumnWriter {
    pub fn new(
        desc: Arc<ColumnDescriptor>,
        props: Arc<WriterProperties>,
        page_writer: PageWriter,
    ) -> Self {
        match desc.physical {
            PhysicalType::Boolean => {
                ColumnWriter::Boolean(TypedColumnWriter::new(desc, props, page_writer))
            }
            PhysicalType::Int32 => {
                ColumnWriter::Int32(TypedColumnWriter::new(desc, props, page_writer))
            }
            PhysicalType::Int64 => {
                ColumnWriter::Int64(TypedColumnWriter::new(desc, props, page_writer))
            }
            PhysicalType::Int96 => {
                ColumnWriter::Int96(TypedColumnWriter::new(desc, props, page_writer))
            }
            PhysicalType::Float => {
                ColumnWriter::Float(TypedColumnWriter::new(desc, props, page_writer))
            }
            PhysicalType::Double => {
                ColumnWriter::Double(TypedColumnWriter::new(desc, props, page_writer))
            }
            PhysicalType::ByteArray | PhysicalType::FixedLenByteArray => {
                ColumnWriter::Bytes(TypedColumnWriter::new(desc, props, page_writer))
            }
        }
    }

    pub fn write_triple(
        &mut self,
        rep: i16,
        def: i16,
        value: Option<&PrimitiveValue>,
    ) -> Result<()> {
        dispatch!(self, writer => writer.write_triple(rep, def, value))
    }

    pub fn end_record(&mut self) -> Result<()> {
        dispatch!(self, writer => writer.end_record())
    }

    pub fn buffered_size(&self) -> usize {
        dispatch!(self, writer => writer.buffered_size())
    }

    pub fn allocated_size(&self) -> usize {
        dispatch!(self, writer => writer.allocated_size())
    }

    pub fn close(self) -> Result<ColumnChunkData> {
        dispatch!(self, writer => writer.close())
    }
}

/// One writer per leaf column, recreated at every row-group boundary.
pub struct ColumnWriteStore {
    writers: Vec<ColumnWriter>,
}

impl ColumnWriteStore {
    pub fn new(
        schema: &Schema,
        props: &Arc<WriterProperties>,
        row_group_ordinal: u16,
        encryptor: Option<&Arc<FileEncryptor>>,
    ) -> Self {
        let writers = schema
            .columns()
            .iter()
            .map(|desc| {
                let crypto = encryptor.and_then(|encryptor| {
                    encryptor
                        .props()
                        .column_setup(&desc.path_string())
                        .map(|(key, _)| PageCrypto {
                            encryptor: Arc::clone(encryptor),
                            key: key.to_vec(),
                            row_group_ordinal,
                            column_ordinal: desc.column_index as u16,
                        })
                });
                let page_writer = PageWriter::new(
                    props.compression(),
                    props.version(),
                    props.crc_enabled(),
                    crypto,
                );
                ColumnWriter::new(Arc::clone(desc), Arc::clone(props), page_writer)
            })
            .collect();
        Self { writers }
    }

    pub fn write_value(
        &mut self,
        column: usize,
        rep: i16,
        def: i16,
        value: &PrimitiveValue,
    ) -> Result<()> {
        self.writers[column].write_triple(rep, def, Some(value))
    }

    pub fn write_null(&mut self, column: usize, rep: i16, def: i16) -> Result<()> {
        self.writers[column].write_triple(rep, def, None)
    }

    pub fn end_record(&mut self) -> Result<()> {
        for writer in &mut self.writers {
            writer.end_record()?;
        }
        Ok(())
    }

    /// Live buffered bytes across all columns of the open row group.
    pub fn buffered_size(&self) -> usize {
        self.writers.iter().map(|w| w.buffered_size()).sum()
    }

    /// Raw capacity across all columns, for external back-pressure.
    pub fn allocated_size(&self) -> usize {
        self.writers.iter().map(|w| w.allocated_size()).sum()
    }

    pub fn num_columns(&self) -> usize {
        self.writers.len()
    }

    /// Forces final pages and returns the chunks in leaf order.
    pub fn close(self) -> Result<Vec<ColumnChunkData>> {
        self.writers.into_iter().map(|w| w.close()).collect()
    }
}
