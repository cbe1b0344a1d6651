//! Page assembly. The column writer hands encoded pages here; this stage
//! compresses, computes the optional CRC, encrypts when the column is
//! configured for it, serializes the header, and stages everything until the
//! row group closes.

use std::sync::Arc;

use bytes::Bytes;
use parq_core::errors::Result;
use parq_core::util::memory::ChunkedBytes;
use parq_format::basic::{Compression, Encoding, PageType};
use parq_format::metadata::{
    DataPageHeader, DataPageHeaderV2, DictionaryPageHeader, PageHeader, Statistics,
};

use crate::compression::compress;
use crate::encryption::aad::ModuleType;
use crate::encryption::FileEncryptor;
use crate::options::WriterVersion;

/// An encoded page as the column writer produces it, pre-compression.
pub enum Page {
    DataV1 {
        /// Levels and values already concatenated.
        buf: Bytes,
        num_values: u32,
        encoding: Encoding,
        statistics: Option<Statistics>,
    },
    DataV2 {
        rep_levels: Bytes,
        def_levels: Bytes,
        values: Bytes,
        num_values: u32,
        num_nulls: u32,
        num_rows: u32,
        encoding: Encoding,
        statistics: Option<Statistics>,
    },
    Dictionary {
        buf: Bytes,
        num_values: u32,
    },
}

/// A page ready to hit the file: serialized (possibly encrypted) header plus
/// stored body. Sizes include the header, matching the chunk totals the
/// footer reports.
pub struct SerializedPage {
    pub header: Bytes,
    pub body: Bytes,
    pub is_dictionary: bool,
    pub num_values: u32,
    pub encoding: Encoding,
    pub uncompressed_size: usize,
    pub compressed_size: usize,
}

/// Encryption context of one column chunk.
#[derive(Clone)]
pub struct PageCrypto {
    pub encryptor: Arc<FileEncryptor>,
    pub key: Vec<u8>,
    pub row_group_ordinal: u16,
    pub column_ordinal: u16,
}

impl PageCrypto {
    fn encrypt(&self, module: ModuleType, page_ordinal: u16, data: &[u8]) -> Result<Vec<u8>> {
        self.encryptor.encrypt_module(
            &self.key,
            module,
            self.row_group_ordinal,
            self.column_ordinal,
            page_ordinal,
            data,
        )
    }
}

/// Per-column page sink for one row group.
pub struct PageWriter {
    codec: Compression,
    version: WriterVersion,
    crc_enabled: bool,
    crypto: Option<PageCrypto>,
    dictionary: Option<SerializedPage>,
    pages: Vec<SerializedPage>,
    data_page_ordinal: u16,
}

impl PageWriter {
    pub fn new(
        codec: Compression,
        version: WriterVersion,
        crc_enabled: bool,
        crypto: Option<PageCrypto>,
    ) -> Self {
        Self {
            codec,
            version,
            crc_enabled,
            crypto,
            dictionary: None,
            pages: Vec::new(),
            data_page_ordinal: 0,
        }
    }

    fn crc32(&self, payload: &[u8]) -> Option<i32> {
        self.crc_enabled.then(|| {
            let mut hasher = crc32fast::Hasher::new();
            hasher.update(payload);
            hasher.finalize() as i32
        })
    }

    fn seal_header(&self, header: &PageHeader, module: ModuleType, ordinal: u16) -> Result<Bytes> {
        let bytes = header.to_bytes()?;
        match &self.crypto {
            Some(crypto) => Ok(Bytes::from(crypto.encrypt(module, ordinal, &bytes)?)),
            None => Ok(Bytes::from(bytes)),
        }
    }

    pub fn write_page(&mut self, page: Page) -> Result<()> {
        match page {
            Page::DataV1 {
                buf,
                num_values,
                encoding,
                statistics,
            } => {
                let uncompressed_len = buf.len();
                let compressed = compress(self.codec, buf)?;
                let crc = self.crc32(&compressed);
                let ordinal = self.data_page_ordinal;
                let body = match &self.crypto {
                    Some(crypto) => {
                        Bytes::from(crypto.encrypt(ModuleType::DataPage, ordinal, &compressed)?)
                    }
                    None => compressed,
                };
                let header = PageHeader {
                    type_: PageType::DataPage,
                    uncompressed_page_size: uncompressed_len as i32,
                    compressed_page_size: body.len() as i32,
                    crc,
                    data_page_header: Some(DataPageHeader {
                        num_values: num_values as i32,
                        encoding,
                        definition_level_encoding: Encoding::Rle,
                        repetition_level_encoding: Encoding::Rle,
                        statistics,
                    }),
                    dictionary_page_header: None,
                    data_page_header_v2: None,
                };
                let header_bytes =
                    self.seal_header(&header, ModuleType::DataPageHeader, ordinal)?;
                self.push_data_page(header_bytes, body, num_values, encoding, uncompressed_len);
            }
            Page::DataV2 {
                rep_levels,
                def_levels,
                values,
                num_values,
                num_nulls,
                num_rows,
                encoding,
                statistics,
            } => {
                let uncompressed_len = rep_levels.len() + def_levels.len() + values.len();
                let compressed_values = compress(self.codec, values)?;
                let crc = self.crc32(&compressed_values);
                let mut body = ChunkedBytes::new();
                body.push(rep_levels.clone());
                body.push(def_levels.clone());
                body.push(compressed_values);
                let body = body.concat();
                let ordinal = self.data_page_ordinal;
                let body = match &self.crypto {
                    Some(crypto) => {
                        Bytes::from(crypto.encrypt(ModuleType::DataPage, ordinal, &body)?)
                    }
                    None => body,
                };
                let header = PageHeader {
                    type_: PageType::DataPageV2,
                    uncompressed_page_size: uncompressed_len as i32,
                    compressed_page_size: body.len() as i32,
                    crc,
                    data_page_header: None,
                    dictionary_page_header: None,
                    data_page_header_v2: Some(DataPageHeaderV2 {
                        num_values: num_values as i32,
                        num_nulls: num_nulls as i32,
                        num_rows: num_rows as i32,
                        encoding,
                        definition_levels_byte_length: def_levels.len() as i32,
                        repetition_levels_byte_length: rep_levels.len() as i32,
                        is_compressed: self.codec != Compression::Uncompressed,
                        statistics,
                    }),
                };
                let header_bytes =
                    self.seal_header(&header, ModuleType::DataPageHeader, ordinal)?;
                self.push_data_page(header_bytes, body, num_values, encoding, uncompressed_len);
            }
            Page::Dictionary { buf, num_values } => {
                let uncompressed_len = buf.len();
                let compressed = compress(self.codec, buf)?;
                let crc = self.crc32(&compressed);
                let body = match &self.crypto {
                    Some(crypto) => {
                        Bytes::from(crypto.encrypt(ModuleType::DictionaryPage, 0, &compressed)?)
                    }
                    None => compressed,
                };
                let encoding = match self.version {
                    WriterVersion::V1 => Encoding::PlainDictionary,
                    WriterVersion::V2 => Encoding::Plain,
                };
                let header = PageHeader {
                    type_: PageType::DictionaryPage,
                    uncompressed_page_size: uncompressed_len as i32,
                    compressed_page_size: body.len() as i32,
                    crc,
                    data_page_header: None,
                    dictionary_page_header: Some(DictionaryPageHeader {
                        num_values: num_values as i32,
                        encoding,
                        is_sorted: Some(false),
                    }),
                    data_page_header_v2: None,
                };
                let header_bytes =
                    self.seal_header(&header, ModuleType::DictionaryPageHeader, 0)?;
                let compressed_size = header_bytes.len() + body.len();
                self.dictionary = Some(SerializedPage {
                    uncompressed_size: header_bytes.len() + uncompressed_len,
                    compressed_size,
                    header: header_bytes,
                    body,
                    is_dictionary: true,
                    num_values,
                    encoding,
                });
            }
        }
        Ok(())
    }

    fn push_data_page(
        &mut self,
        header: Bytes,
        body: Bytes,
        num_values: u32,
        encoding: Encoding,
        uncompressed_len: usize,
    ) {
        let compressed_size = header.len() + body.len();
        self.pages.push(SerializedPage {
            uncompressed_size: header.len() + uncompressed_len,
            compressed_size,
            header,
            body,
            is_dictionary: false,
            num_values,
            encoding,
        });
        self.data_page_ordinal += 1;
    }

    /// Bytes staged for this column so far.
    pub fn buffered_size(&self) -> usize {
        self.dictionary
            .iter()
            .chain(self.pages.iter())
            .map(|p| p.header.len() + p.body.len())
            .sum()
    }

    pub fn num_data_pages(&self) -> usize {
        self.pages.len()
    }

    /// Hands the staged pages over for the row-group flush.
    pub fn take_pages(&mut self) -> (Option<SerializedPage>, Vec<SerializedPage>) {
        (self.dictionary.take(), std::mem::take(&mut self.pages))
    }
}
