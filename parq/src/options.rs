use parq_format::basic::Compression;
use parq_format::metadata::KeyValue;

use crate::encryption::FileEncryptionProperties;

pub const DEFAULT_DATA_PAGE_SIZE: usize = 1024 * 1024;
pub const DEFAULT_DICTIONARY_PAGE_SIZE: usize = 1024 * 1024;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 128 * 1024 * 1024;
pub const DEFAULT_PAGE_ROW_COUNT_LIMIT: usize = 20_000;
pub const DEFAULT_MIN_ROW_COUNT_FOR_SIZE_CHECK: usize = 100;
pub const DEFAULT_MAX_ROW_COUNT_FOR_SIZE_CHECK: usize = 10_000;

/// On-disk page format generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriterVersion {
    #[default]
    V1,
    V2,
}

fn default_created_by() -> String {
    format!(
        "parq version {} (build {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("PARQ_BUILD_HASH").unwrap_or("unknown")
    )
}

/// Immutable writer configuration. Built once, shared read-only by every
/// column writer of a file.
#[derive(Clone)]
pub struct WriterProperties {
    version: WriterVersion,
    data_page_size: usize,
    dictionary_page_size: usize,
    dictionary_enabled: bool,
    row_group_size: usize,
    page_row_count_limit: usize,
    min_row_count_for_size_check: usize,
    max_row_count_for_size_check: usize,
    estimate_row_count_for_size_check: bool,
    compression: Compression,
    crc_enabled: bool,
    statistics_enabled: bool,
    created_by: String,
    key_value_metadata: Option<Vec<KeyValue>>,
    /// Filesystem block size row groups are padded up to, when set.
    block_alignment: Option<u64>,
    max_padding_size: usize,
    encryption: Option<FileEncryptionProperties>,
}

impl Default for WriterProperties {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl WriterProperties {
    pub fn builder() -> WriterPropertiesBuilder {
        WriterPropertiesBuilder::with_defaults()
    }

    pub fn version(&self) -> WriterVersion {
        self.version
    }

    pub fn data_page_size(&self) -> usize {
        self.data_page_size
    }

    pub fn dictionary_page_size(&self) -> usize {
        self.dictionary_page_size
    }

    pub fn dictionary_enabled(&self) -> bool {
        self.dictionary_enabled
    }

    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    pub fn page_row_count_limit(&self) -> usize {
        self.page_row_count_limit
    }

    pub fn min_row_count_for_size_check(&self) -> usize {
        self.min_row_count_for_size_check
    }

    pub fn max_row_count_for_size_check(&self) -> usize {
        self.max_row_count_for_size_check
    }

    pub fn estimate_row_count_for_size_check(&self) -> bool {
        self.estimate_row_count_for_size_check
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn crc_enabled(&self) -> bool {
        self.crc_enabled
    }

    pub fn statistics_enabled(&self) -> bool {
        self.statistics_enabled
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn key_value_metadata(&self) -> Option<&Vec<KeyValue>> {
        self.key_value_metadata.as_ref()
    }

    pub fn block_alignment(&self) -> Option<u64> {
        self.block_alignment
    }

    pub fn max_padding_size(&self) -> usize {
        self.max_padding_size
    }

    pub fn encryption(&self) -> Option<&FileEncryptionProperties> {
        self.encryption.as_ref()
    }
}

pub struct WriterPropertiesBuilder {
    version: WriterVersion,
    data_page_size: usize,
    dictionary_page_size: usize,
    dictionary_enabled: bool,
    row_group_size: usize,
    page_row_count_limit: usize,
    min_row_count_for_size_check: usize,
    max_row_count_for_size_check: usize,
    estimate_row_count_for_size_check: bool,
    compression: Compression,
    crc_enabled: bool,
    statistics_enabled: bool,
    created_by: String,
    key_value_metadata: Option<Vec<KeyValue>>,
    block_alignment: Option<u64>,
    max_padding_size: usize,
    encryption: Option<FileEncryptionProperties>,
}

impl WriterPropertiesBuilder {
    /// Returns default state of the builder.
    pub fn with_defaults() -> Self {
        Self {
            version: WriterVersion::V1,
            data_page_size: DEFAULT_DATA_PAGE_SIZE,
            dictionary_page_size: DEFAULT_DICTIONARY_PAGE_SIZE,
            dictionary_enabled: true,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            page_row_count_limit: DEFAULT_PAGE_ROW_COUNT_LIMIT,
            min_row_count_for_size_check: DEFAULT_MIN_ROW_COUNT_FOR_SIZE_CHECK,
            max_row_count_for_size_check: DEFAULT_MAX_ROW_COUNT_FOR_SIZE_CHECK,
            estimate_row_count_for_size_check: true,
            compression: Compression::Uncompressed,
            crc_enabled: false,
            statistics_enabled: true,
            created_by: default_created_by(),
            key_value_metadata: None,
            block_alignment: None,
            max_padding_size: 0,
            encryption: None,
        }
    }

    /// Finalizes the configuration and returns the immutable properties.
    pub fn build(self) -> WriterProperties {
        WriterProperties {
            version: self.version,
            data_page_size: self.data_page_size,
            dictionary_page_size: self.dictionary_page_size,
            dictionary_enabled: self.dictionary_enabled,
            row_group_size: self.row_group_size,
            page_row_count_limit: self.page_row_count_limit,
            min_row_count_for_size_check: self.min_row_count_for_size_check,
            max_row_count_for_size_check: self.max_row_count_for_size_check,
            estimate_row_count_for_size_check: self.estimate_row_count_for_size_check,
            compression: self.compression,
            crc_enabled: self.crc_enabled,
            statistics_enabled: self.statistics_enabled,
            created_by: self.created_by,
            key_value_metadata: self.key_value_metadata,
            block_alignment: self.block_alignment,
            max_padding_size: self.max_padding_size,
            encryption: self.encryption,
        }
    }

    pub fn set_version(mut self, version: WriterVersion) -> Self {
        self.version = version;
        self
    }

    pub fn set_data_page_size(mut self, size: usize) -> Self {
        self.data_page_size = size;
        self
    }

    pub fn set_dictionary_page_size(mut self, size: usize) -> Self {
        self.dictionary_page_size = size;
        self
    }

    pub fn set_dictionary_enabled(mut self, enabled: bool) -> Self {
        self.dictionary_enabled = enabled;
        self
    }

    pub fn set_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    pub fn set_page_row_count_limit(mut self, limit: usize) -> Self {
        self.page_row_count_limit = limit;
        self
    }

    pub fn set_min_row_count_for_size_check(mut self, count: usize) -> Self {
        self.min_row_count_for_size_check = count;
        self
    }

    pub fn set_max_row_count_for_size_check(mut self, count: usize) -> Self {
        self.max_row_count_for_size_check = count;
        self
    }

    pub fn set_estimate_row_count_for_size_check(mut self, enabled: bool) -> Self {
        self.estimate_row_count_for_size_check = enabled;
        self
    }

    pub fn set_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn enable_crc(mut self, enabled: bool) -> Self {
        self.crc_enabled = enabled;
        self
    }

    pub fn enable_statistics(mut self, enabled: bool) -> Self {
        self.statistics_enabled = enabled;
        self
    }

    pub fn set_created_by(mut self, created_by: String) -> Self {
        self.created_by = created_by;
        self
    }

    pub fn set_key_value_metadata(mut self, kvs: Option<Vec<KeyValue>>) -> Self {
        self.key_value_metadata = kvs;
        self
    }

    pub fn set_block_alignment(mut self, alignment: Option<u64>, max_padding: usize) -> Self {
        self.block_alignment = alignment;
        self.max_padding_size = max_padding;
        self
    }

    pub fn set_encryption(mut self, encryption: Option<FileEncryptionProperties>) -> Self {
        self.encryption = encryption;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let props = WriterProperties::default();
        assert_eq!(props.version(), WriterVersion::V1);
        assert_eq!(props.data_page_size(), DEFAULT_DATA_PAGE_SIZE);
        assert!(props.dictionary_enabled());
        assert!(!props.crc_enabled());
        assert!(props.created_by().starts_with("parq version"));
    }

    #[test]
    fn test_builder_overrides() {
        let props = WriterProperties::builder()
            .set_version(WriterVersion::V2)
            .set_compression(Compression::Zstd)
            .set_data_page_size(8 * 1024)
            .enable_crc(true)
            .build();
        assert_eq!(props.version(), WriterVersion::V2);
        assert_eq!(props.compression(), Compression::Zstd);
        assert_eq!(props.data_page_size(), 8 * 1024);
        assert!(props.crc_enabled());
    }
}
