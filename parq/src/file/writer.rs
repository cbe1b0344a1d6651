//! The low-level file writer: a single-use state machine that streams magic,
//! column chunks and the footer, and owns every byte offset recorded in the
//! metadata.

use std::io::Write;
use std::sync::Arc;

use byteorder::{LittleEndian, WriteBytesExt};
use parq_core::errors::Result;
use parq_core::illegal_state_err;
use parq_format::metadata::{
    ColumnChunk, ColumnCryptoMetaData, ColumnMetaData, ColumnOrder, FileCryptoMetaData,
    FileMetaData, KeyValue, RowGroup,
};
use parq_format::{FOOTER_SIZE, MAGIC, MAGIC_ENCRYPTED};

use crate::column::page::SerializedPage;
use crate::column::writer::ColumnChunkData;
use crate::encryption::aad::ModuleType;
use crate::encryption::{FileEncryptor, FOOTER_SIGNATURE_LEN};
use crate::options::{WriterProperties, WriterVersion};
use crate::schema::types::Schema;

struct TrackedWrite<W: Write> {
    inner: W,
    bytes_written: u64,
}

impl<W: Write> TrackedWrite<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.inner.write_all(buf)?;
        self.bytes_written += buf.len() as u64;
        Ok(())
    }

    fn write_u32_le(&mut self, v: u32) -> Result<()> {
        let mut buf = Vec::with_capacity(4);
        buf.write_u32::<LittleEndian>(v)?;
        self.write_all(&buf)
    }

    fn pos(&self) -> u64 {
        self.bytes_written
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Created,
    Started,
    RowGroupOpen,
    ColumnOpen,
    Ended,
}

struct CurrentColumn {
    chunk: ColumnChunkData,
    dictionary_page_offset: Option<i64>,
    data_page_offset: i64,
}

struct CurrentRowGroup {
    ordinal: u16,
    start_offset: u64,
    record_count: i64,
    columns: Vec<ColumnChunk>,
    total_byte_size: i64,
    total_compressed_size: i64,
    next_column_index: usize,
    current_column: Option<CurrentColumn>,
}

/// Streams one Parquet file. Single-use: `start` exactly once, then row
/// groups, then `end`.
pub struct FileWriter<W: Write> {
    sink: TrackedWrite<W>,
    schema: Arc<Schema>,
    props: Arc<WriterProperties>,
    encryptor: Option<Arc<FileEncryptor>>,
    state: State,
    row_groups: Vec<RowGroup>,
    num_rows: i64,
    current: Option<CurrentRowGroup>,
}

impl<W: Write> FileWriter<W> {
    pub fn new(sink: W, schema: Arc<Schema>, props: Arc<WriterProperties>) -> Self {
        let encryptor = props
            .encryption()
            .cloned()
            .map(|enc| Arc::new(FileEncryptor::new(enc)));
        Self {
            sink: TrackedWrite::new(sink),
            schema,
            props,
            encryptor,
            state: State::Created,
            row_groups: Vec::new(),
            num_rows: 0,
            current: None,
        }
    }

    /// Shared by the column writers so pages and metadata agree on keys and
    /// AADs.
    pub fn encryptor(&self) -> Option<&Arc<FileEncryptor>> {
        self.encryptor.as_ref()
    }

    pub fn bytes_written(&self) -> u64 {
        self.sink.pos()
    }

    pub fn next_row_group_ordinal(&self) -> u16 {
        self.row_groups.len() as u16
    }

    /// Writes the leading magic.
    pub fn start(&mut self) -> Result<()> {
        if self.state != State::Created {
            return illegal_state_err!("start() on a writer in state {:?}", self.state);
        }
        let encrypted_footer = self
            .encryptor
            .as_ref()
            .is_some_and(|e| !e.props().plaintext_footer());
        self.sink
            .write_all(if encrypted_footer { MAGIC_ENCRYPTED } else { MAGIC })?;
        self.state = State::Started;
        Ok(())
    }

    /// Opens a row group, padding up to the block boundary first when
    /// alignment is configured and the gap is small enough.
    pub fn start_block(&mut self, record_count: i64) -> Result<()> {
        if self.state != State::Started {
            return illegal_state_err!("start_block() on a writer in state {:?}", self.state);
        }
        if let Some(alignment) = self.props.block_alignment() {
            let position = self.sink.pos();
            let remainder = position % alignment;
            if remainder != 0 {
                let gap = (alignment - remainder) as usize;
                if gap <= self.props.max_padding_size() {
                    self.sink.write_all(&vec![0u8; gap])?;
                }
            }
        }
        self.current = Some(CurrentRowGroup {
            ordinal: self.row_groups.len() as u16,
            start_offset: self.sink.pos(),
            record_count,
            columns: Vec::new(),
            total_byte_size: 0,
            total_compressed_size: 0,
            next_column_index: 0,
            current_column: None,
        });
        self.state = State::RowGroupOpen;
        Ok(())
    }

    /// Opens the next column chunk in leaf order.
    pub fn start_column(&mut self, chunk: ColumnChunkData) -> Result<()> {
        if self.state != State::RowGroupOpen {
            return illegal_state_err!("start_column() on a writer in state {:?}", self.state);
        }
        let rg = self.current.as_mut().unwrap();
        if chunk.desc.column_index != rg.next_column_index {
            return illegal_state_err!(
                "column {} out of order; expected leaf {}",
                chunk.desc.path_string(),
                rg.next_column_index
            );
        }
        rg.current_column = Some(CurrentColumn {
            chunk,
            dictionary_page_offset: None,
            data_page_offset: 0,
        });
        self.state = State::ColumnOpen;
        Ok(())
    }

    /// Streams the optional dictionary page; must precede every data page.
    pub fn write_dictionary_page(&mut self, page: &SerializedPage) -> Result<()> {
        if !page.is_dictionary {
            return illegal_state_err!("write_dictionary_page() given a data page");
        }
        self.write_page(page)
    }

    pub fn write_data_page(&mut self, page: &SerializedPage) -> Result<()> {
        if page.is_dictionary {
            return illegal_state_err!("write_data_page() given a dictionary page");
        }
        self.write_page(page)
    }

    /// Streams one staged page of the open column.
    fn write_page(&mut self, page: &SerializedPage) -> Result<()> {
        if self.state != State::ColumnOpen {
            return illegal_state_err!("page write on a writer in state {:?}", self.state);
        }
        let offset = self.sink.pos() as i64;
        let rg = self.current.as_mut().unwrap();
        let column = rg.current_column.as_mut().unwrap();
        if page.is_dictionary {
            column.dictionary_page_offset = Some(offset);
        } else if column.data_page_offset == 0 {
            column.data_page_offset = offset;
        }
        self.sink.write_all(&page.header)?;
        self.sink.write_all(&page.body)?;
        Ok(())
    }

    /// Closes the open column and records its chunk metadata.
    pub fn end_column(&mut self) -> Result<()> {
        if self.state != State::ColumnOpen {
            return illegal_state_err!("end_column() on a writer in state {:?}", self.state);
        }
        let rg = self.current.as_mut().unwrap();
        let column = rg.current_column.take().unwrap();
        let chunk = column.chunk;
        let path_string = chunk.desc.path_string();
        let meta = ColumnMetaData {
            type_: chunk.desc.physical,
            encodings: chunk.encodings,
            path_in_schema: chunk.desc.path.clone(),
            codec: self.props.compression(),
            num_values: chunk.num_values,
            total_uncompressed_size: chunk.total_uncompressed_size,
            total_compressed_size: chunk.total_compressed_size,
            data_page_offset: column.data_page_offset,
            dictionary_page_offset: column.dictionary_page_offset,
            statistics: chunk.statistics,
        };
        let file_offset = column
            .dictionary_page_offset
            .unwrap_or(column.data_page_offset);

        let crypto = self
            .encryptor
            .as_ref()
            .and_then(|e| {
                e.props()
                    .column_setup(&path_string)
                    .map(|(key, crypto)| (Arc::clone(e), key.to_vec(), crypto))
            });
        let column_chunk = match crypto {
            Some((encryptor, key, crypto_meta)) => {
                let own_key =
                    matches!(crypto_meta, ColumnCryptoMetaData::EncryptionWithColumnKey(_));
                if own_key && !encryptor.props().plaintext_footer() {
                    // metadata travels encrypted under the column key
                    let serialized = parq_format::metadata::serialize_column_meta_data(&meta)?;
                    let sealed = encryptor.encrypt_module(
                        &key,
                        ModuleType::ColumnMetaData,
                        rg.ordinal,
                        chunk.desc.column_index as u16,
                        0,
                        &serialized,
                    )?;
                    ColumnChunk {
                        file_offset,
                        meta_data: None,
                        crypto_metadata: Some(crypto_meta),
                        encrypted_column_metadata: Some(sealed),
                    }
                } else {
                    ColumnChunk {
                        file_offset,
                        meta_data: Some(meta),
                        crypto_metadata: Some(crypto_meta),
                        encrypted_column_metadata: None,
                    }
                }
            }
            None => ColumnChunk {
                file_offset,
                meta_data: Some(meta),
                crypto_metadata: None,
                encrypted_column_metadata: None,
            },
        };
        rg.total_byte_size += chunk.total_uncompressed_size;
        rg.total_compressed_size += chunk.total_compressed_size;
        rg.columns.push(column_chunk);
        rg.next_column_index += 1;
        self.state = State::RowGroupOpen;
        Ok(())
    }

    /// Convenience: streams a closed chunk (dictionary first) and its
    /// metadata in one call.
    pub fn write_column_chunk(&mut self, mut chunk: ColumnChunkData) -> Result<()> {
        let dictionary = chunk.dictionary.take();
        let pages = std::mem::take(&mut chunk.pages);
        self.start_column(chunk)?;
        if let Some(dictionary) = &dictionary {
            self.write_dictionary_page(dictionary)?;
        }
        for page in &pages {
            self.write_data_page(page)?;
        }
        self.end_column()
    }

    /// Closes the open row group.
    pub fn end_block(&mut self) -> Result<()> {
        if self.state != State::RowGroupOpen {
            return illegal_state_err!("end_block() on a writer in state {:?}", self.state);
        }
        let rg = self.current.take().unwrap();
        if rg.next_column_index != self.schema.num_columns() {
            return illegal_state_err!(
                "row group closed after {} of {} columns",
                rg.next_column_index,
                self.schema.num_columns()
            );
        }
        log::debug!(
            "row group {}: {} records, {} compressed bytes",
            rg.ordinal,
            rg.record_count,
            rg.total_compressed_size
        );
        self.num_rows += rg.record_count;
        self.row_groups.push(RowGroup {
            columns: rg.columns,
            total_byte_size: rg.total_byte_size,
            num_rows: rg.record_count,
            file_offset: Some(rg.start_offset as i64),
            total_compressed_size: Some(rg.total_compressed_size),
            ordinal: Some(rg.ordinal as i16),
        });
        self.state = State::Started;
        Ok(())
    }

    fn merged_key_value_metadata(&self, extra: Option<Vec<KeyValue>>) -> Option<Vec<KeyValue>> {
        let mut out = self.props.key_value_metadata().cloned().unwrap_or_default();
        if let Some(extra) = extra {
            out.extend(extra);
        }
        (!out.is_empty()).then_some(out)
    }

    /// Writes the footer, its length and the trailing magic, consuming the
    /// writer.
    pub fn end(mut self, extra_metadata: Option<Vec<KeyValue>>) -> Result<W> {
        if self.state != State::Started {
            return illegal_state_err!("end() on a writer in state {:?}", self.state);
        }
        let version = match self.props.version() {
            WriterVersion::V1 => 1,
            WriterVersion::V2 => 2,
        };
        let column_orders = Some(
            self.schema
                .columns()
                .iter()
                .map(|_| ColumnOrder::TypeDefinedOrder)
                .collect(),
        );
        let mut meta = FileMetaData {
            version,
            schema: self.schema.to_schema_elements(),
            num_rows: self.num_rows,
            row_groups: std::mem::take(&mut self.row_groups),
            key_value_metadata: self.merged_key_value_metadata(extra_metadata),
            created_by: Some(self.props.created_by().to_string()),
            column_orders,
            encryption_algorithm: None,
            footer_signing_key_metadata: None,
        };

        match &self.encryptor {
            None => {
                let footer = meta.to_bytes()?;
                self.sink.write_all(&footer)?;
                self.sink.write_u32_le(footer.len() as u32)?;
                self.sink.write_all(MAGIC)?;
            }
            Some(encryptor) if encryptor.props().plaintext_footer() => {
                meta.encryption_algorithm = Some(encryptor.algorithm_thrift());
                meta.footer_signing_key_metadata =
                    encryptor.props().footer_key_metadata().cloned();
                let footer = meta.to_bytes()?;
                let signature = encryptor.sign_footer(&footer)?;
                debug_assert_eq!(signature.len(), FOOTER_SIGNATURE_LEN);
                self.sink.write_all(&footer)?;
                self.sink.write_all(&signature)?;
                self.sink
                    .write_u32_le((footer.len() + signature.len()) as u32)?;
                self.sink.write_all(MAGIC)?;
            }
            Some(encryptor) => {
                let crypto_meta = FileCryptoMetaData {
                    encryption_algorithm: encryptor.algorithm_thrift(),
                    key_metadata: encryptor.props().footer_key_metadata().cloned(),
                };
                let crypto_bytes = crypto_meta.to_bytes()?;
                let sealed_footer = encryptor.encrypt_footer(&meta.to_bytes()?)?;
                self.sink.write_all(&crypto_bytes)?;
                self.sink.write_all(&sealed_footer)?;
                self.sink
                    .write_u32_le((crypto_bytes.len() + sealed_footer.len()) as u32)?;
                self.sink.write_all(MAGIC_ENCRYPTED)?;
            }
        }
        log::debug!(
            "file closed: {} rows, {} bytes",
            self.num_rows,
            self.sink.pos()
        );
        self.state = State::Ended;
        Ok(self.sink.inner)
    }
}
