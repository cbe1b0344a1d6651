//! Codec registry. Built once at first use and immutable afterwards; page
//! writers look codecs up by tag.

use std::collections::HashMap;
use std::io::Write;
use std::sync::LazyLock;

use bytes::Bytes;
use parq_core::errors::{Error, Result};
use parq_format::basic::Compression;

/// A block codec. `decompress` needs the uncompressed size for formats whose
/// raw block form does not carry it.
pub trait Codec: Send + Sync {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;
    fn decompress(&self, data: &[u8], uncompressed_size: Option<usize>) -> Result<Vec<u8>>;
}

struct SnappyCodec;

impl Codec for SnappyCodec {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        snap::raw::Encoder::new()
            .compress_vec(data)
            .map_err(|e| Error::Compression(e.to_string()))
    }

    fn decompress(&self, data: &[u8], _uncompressed_size: Option<usize>) -> Result<Vec<u8>> {
        snap::raw::Decoder::new()
            .decompress_vec(data)
            .map_err(|e| Error::Compression(e.to_string()))
    }
}

struct GzipCodec;

impl Codec for GzipCodec {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(data)
            .and_then(|_| encoder.finish())
            .map_err(|e| Error::Compression(e.to_string()))
    }

    fn decompress(&self, data: &[u8], _uncompressed_size: Option<usize>) -> Result<Vec<u8>> {
        let mut decoder = flate2::write::GzDecoder::new(Vec::new());
        decoder
            .write_all(data)
            .and_then(|_| decoder.finish())
            .map_err(|e| Error::Compression(e.to_string()))
    }
}

struct ZstdCodec;

impl Codec for ZstdCodec {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        zstd::stream::encode_all(data, 0).map_err(|e| Error::Compression(e.to_string()))
    }

    fn decompress(&self, data: &[u8], _uncompressed_size: Option<usize>) -> Result<Vec<u8>> {
        zstd::stream::decode_all(data).map_err(|e| Error::Compression(e.to_string()))
    }
}

struct Lz4RawCodec;

impl Codec for Lz4RawCodec {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        // raw block form, no size prefix; the page header carries the size
        Ok(lz4_flex::block::compress(data))
    }

    fn decompress(&self, data: &[u8], uncompressed_size: Option<usize>) -> Result<Vec<u8>> {
        let size = uncompressed_size.ok_or_else(|| {
            Error::Compression("LZ4_RAW needs the uncompressed size".to_string())
        })?;
        lz4_flex::block::decompress(data, size).map_err(|e| Error::Compression(e.to_string()))
    }
}

struct BrotliCodec;

const BROTLI_BUFFER_SIZE: usize = 4096;
const BROTLI_QUALITY: u32 = 1;
const BROTLI_LG_WINDOW: u32 = 22;

impl Codec for BrotliCodec {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        {
            let mut writer = brotli::CompressorWriter::new(
                &mut out,
                BROTLI_BUFFER_SIZE,
                BROTLI_QUALITY,
                BROTLI_LG_WINDOW,
            );
            writer
                .write_all(data)
                .map_err(|e| Error::Compression(e.to_string()))?;
        }
        Ok(out)
    }

    fn decompress(&self, data: &[u8], _uncompressed_size: Option<usize>) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut reader = brotli::Decompressor::new(data, BROTLI_BUFFER_SIZE);
        std::io::copy(&mut reader, &mut out)
            .map_err(|e| Error::Compression(e.to_string()))?;
        Ok(out)
    }
}

static REGISTRY: LazyLock<HashMap<Compression, Box<dyn Codec>>> = LazyLock::new(|| {
    let mut map: HashMap<Compression, Box<dyn Codec>> = HashMap::new();
    map.insert(Compression::Snappy, Box::new(SnappyCodec));
    map.insert(Compression::Gzip, Box::new(GzipCodec));
    map.insert(Compression::Zstd, Box::new(ZstdCodec));
    map.insert(Compression::Lz4Raw, Box::new(Lz4RawCodec));
    map.insert(Compression::Brotli, Box::new(BrotliCodec));
    map
});

/// Compresses a page payload. UNCOMPRESSED passes the buffer through.
pub fn compress(codec: Compression, data: Bytes) -> Result<Bytes> {
    match codec {
        Compression::Uncompressed => Ok(data),
        other => {
            let codec = REGISTRY
                .get(&other)
                .ok_or_else(|| Error::Compression(format!("no codec for {:?}", other)))?;
            Ok(Bytes::from(codec.compress(&data)?))
        }
    }
}

/// Inverse of [`compress`], for tests and verification paths.
pub fn decompress(
    codec: Compression,
    data: Bytes,
    uncompressed_size: Option<usize>,
) -> Result<Bytes> {
    match codec {
        Compression::Uncompressed => Ok(data),
        other => {
            let codec = REGISTRY
                .get(&other)
                .ok_or_else(|| Error::Compression(format!("no codec for {:?}", other)))?;
            Ok(Bytes::from(codec.decompress(&data, uncompressed_size)?))
        }
    }
}
