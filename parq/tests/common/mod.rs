//! Test-side decoding of what the writer produced: enough of the footer and
//! page headers to verify structure, offsets, statistics and checksums, read
//! back through the thrift crate's compact input protocol.
#![allow(dead_code)]

use std::io::Read;

use thrift::protocol::{TCompactInputProtocol, TInputProtocol, TType};

use parq_format::{FOOTER_SIZE, MAGIC, MAGIC_ENCRYPTED};

/// Reader that tracks how many bytes the protocol consumed.
pub struct CountingRead<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> CountingRead<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Read for CountingRead<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = (&self.data[self.pos..]).read(buf)?;
        self.pos += n;
        Ok(n)
    }
}

#[derive(Debug, Default, Clone)]
pub struct PageInfo {
    pub page_type: i32,
    pub uncompressed_size: i32,
    pub compressed_size: i32,
    pub crc: Option<i32>,
    pub num_values: i32,
    pub encoding: i32,
    pub num_nulls: Option<i32>,
    pub num_rows: Option<i32>,
    pub def_levels_len: Option<i32>,
    pub rep_levels_len: Option<i32>,
    pub header_len: usize,
}

fn parse_data_page_header(prot: &mut dyn TInputProtocol, info: &mut PageInfo) {
    prot.read_struct_begin().unwrap();
    loop {
        let ident = prot.read_field_begin().unwrap();
        if ident.field_type == TType::Stop {
            break;
        }
        match ident.id.unwrap_or(0) {
            1 => info.num_values = prot.read_i32().unwrap(),
            2 => info.encoding = prot.read_i32().unwrap(),
            _ => prot.skip(ident.field_type).unwrap(),
        }
        prot.read_field_end().unwrap();
    }
    prot.read_struct_end().unwrap();
}

fn parse_data_page_header_v2(prot: &mut dyn TInputProtocol, info: &mut PageInfo) {
    prot.read_struct_begin().unwrap();
    loop {
        let ident = prot.read_field_begin().unwrap();
        if ident.field_type == TType::Stop {
            break;
        }
        match ident.id.unwrap_or(0) {
            1 => info.num_values = prot.read_i32().unwrap(),
            2 => info.num_nulls = Some(prot.read_i32().unwrap()),
            3 => info.num_rows = Some(prot.read_i32().unwrap()),
            4 => info.encoding = prot.read_i32().unwrap(),
            5 => info.def_levels_len = Some(prot.read_i32().unwrap()),
            6 => info.rep_levels_len = Some(prot.read_i32().unwrap()),
            _ => prot.skip(ident.field_type).unwrap(),
        }
        prot.read_field_end().unwrap();
    }
    prot.read_struct_end().unwrap();
}

pub fn parse_page_header(data: &[u8]) -> PageInfo {
    let mut reader = CountingRead::new(data);
    let mut info = PageInfo::default();
    {
        let mut prot = TCompactInputProtocol::new(&mut reader);
        prot.read_struct_begin().unwrap();
        loop {
            let ident = prot.read_field_begin().unwrap();
            if ident.field_type == TType::Stop {
                break;
            }
            match ident.id.unwrap_or(0) {
                1 => info.page_type = prot.read_i32().unwrap(),
                2 => info.uncompressed_size = prot.read_i32().unwrap(),
                3 => info.compressed_size = prot.read_i32().unwrap(),
                4 => info.crc = Some(prot.read_i32().unwrap()),
                5 | 7 => parse_data_page_header(&mut prot, &mut info),
                8 => parse_data_page_header_v2(&mut prot, &mut info),
                _ => prot.skip(ident.field_type).unwrap(),
            }
            prot.read_field_end().unwrap();
        }
        prot.read_struct_end().unwrap();
    }
    info.header_len = reader.position();
    info
}

#[derive(Debug, Default, Clone)]
pub struct ColumnInfo {
    pub path: Vec<String>,
    pub codec: i32,
    pub num_values: i64,
    pub total_uncompressed_size: i64,
    pub total_compressed_size: i64,
    pub data_page_offset: i64,
    pub dict_page_offset: Option<i64>,
    pub encodings: Vec<i32>,
    pub null_count: Option<i64>,
    pub distinct_count: Option<i64>,
    pub min_value: Option<Vec<u8>>,
    pub max_value: Option<Vec<u8>>,
    pub file_offset: i64,
    pub has_meta_data: bool,
    /// Path list when encrypted with a column key.
    pub column_key_path: Option<Vec<String>>,
    pub footer_key_encrypted: bool,
    pub encrypted_column_metadata: Option<Vec<u8>>,
}

fn read_string_list(prot: &mut dyn TInputProtocol) -> Vec<String> {
    let list = prot.read_list_begin().unwrap();
    let out = (0..list.size)
        .map(|_| prot.read_string().unwrap())
        .collect();
    prot.read_list_end().unwrap();
    out
}

fn parse_statistics(prot: &mut dyn TInputProtocol, col: &mut ColumnInfo) {
    prot.read_struct_begin().unwrap();
    loop {
        let ident = prot.read_field_begin().unwrap();
        if ident.field_type == TType::Stop {
            break;
        }
        match ident.id.unwrap_or(0) {
            3 => col.null_count = Some(prot.read_i64().unwrap()),
            4 => col.distinct_count = Some(prot.read_i64().unwrap()),
            5 => col.max_value = Some(prot.read_bytes().unwrap()),
            6 => col.min_value = Some(prot.read_bytes().unwrap()),
            _ => prot.skip(ident.field_type).unwrap(),
        }
        prot.read_field_end().unwrap();
    }
    prot.read_struct_end().unwrap();
}

fn parse_column_meta(prot: &mut dyn TInputProtocol, col: &mut ColumnInfo) {
    col.has_meta_data = true;
    prot.read_struct_begin().unwrap();
    loop {
        let ident = prot.read_field_begin().unwrap();
        if ident.field_type == TType::Stop {
            break;
        }
        match ident.id.unwrap_or(0) {
            2 => {
                let list = prot.read_list_begin().unwrap();
                for _ in 0..list.size {
                    col.encodings.push(prot.read_i32().unwrap());
                }
                prot.read_list_end().unwrap();
            }
            3 => col.path = read_string_list(prot),
            4 => col.codec = prot.read_i32().unwrap(),
            5 => col.num_values = prot.read_i64().unwrap(),
            6 => col.total_uncompressed_size = prot.read_i64().unwrap(),
            7 => col.total_compressed_size = prot.read_i64().unwrap(),
            9 => col.data_page_offset = prot.read_i64().unwrap(),
            11 => col.dict_page_offset = Some(prot.read_i64().unwrap()),
            12 => parse_statistics(prot, col),
            _ => prot.skip(ident.field_type).unwrap(),
        }
        prot.read_field_end().unwrap();
    }
    prot.read_struct_end().unwrap();
}

fn parse_crypto_metadata(prot: &mut dyn TInputProtocol, col: &mut ColumnInfo) {
    prot.read_struct_begin().unwrap();
    loop {
        let ident = prot.read_field_begin().unwrap();
        if ident.field_type == TType::Stop {
            break;
        }
        match ident.id.unwrap_or(0) {
            1 => {
                col.footer_key_encrypted = true;
                prot.skip(ident.field_type).unwrap();
            }
            2 => {
                prot.read_struct_begin().unwrap();
                let mut paths = Vec::new();
                loop {
                    let inner = prot.read_field_begin().unwrap();
                    if inner.field_type == TType::Stop {
                        break;
                    }
                    if inner.id == Some(1) {
                        paths = read_string_list(prot);
                    } else {
                        prot.skip(inner.field_type).unwrap();
                    }
                    prot.read_field_end().unwrap();
                }
                prot.read_struct_end().unwrap();
                col.column_key_path = Some(paths);
            }
            _ => prot.skip(ident.field_type).unwrap(),
        }
        prot.read_field_end().unwrap();
    }
    prot.read_struct_end().unwrap();
}

fn parse_column_chunk(prot: &mut dyn TInputProtocol) -> ColumnInfo {
    let mut col = ColumnInfo::default();
    prot.read_struct_begin().unwrap();
    loop {
        let ident = prot.read_field_begin().unwrap();
        if ident.field_type == TType::Stop {
            break;
        }
        match ident.id.unwrap_or(0) {
            2 => col.file_offset = prot.read_i64().unwrap(),
            3 => parse_column_meta(prot, &mut col),
            8 => parse_crypto_metadata(prot, &mut col),
            9 => col.encrypted_column_metadata = Some(prot.read_bytes().unwrap()),
            _ => prot.skip(ident.field_type).unwrap(),
        }
        prot.read_field_end().unwrap();
    }
    prot.read_struct_end().unwrap();
    col
}

#[derive(Debug, Default, Clone)]
pub struct RowGroupInfo {
    pub columns: Vec<ColumnInfo>,
    pub total_byte_size: i64,
    pub num_rows: i64,
    pub file_offset: Option<i64>,
    pub total_compressed_size: Option<i64>,
}

fn parse_row_group(prot: &mut dyn TInputProtocol) -> RowGroupInfo {
    let mut rg = RowGroupInfo::default();
    prot.read_struct_begin().unwrap();
    loop {
        let ident = prot.read_field_begin().unwrap();
        if ident.field_type == TType::Stop {
            break;
        }
        match ident.id.unwrap_or(0) {
            1 => {
                let list = prot.read_list_begin().unwrap();
                for _ in 0..list.size {
                    rg.columns.push(parse_column_chunk(prot));
                }
                prot.read_list_end().unwrap();
            }
            2 => rg.total_byte_size = prot.read_i64().unwrap(),
            3 => rg.num_rows = prot.read_i64().unwrap(),
            5 => rg.file_offset = Some(prot.read_i64().unwrap()),
            6 => rg.total_compressed_size = Some(prot.read_i64().unwrap()),
            _ => prot.skip(ident.field_type).unwrap(),
        }
        prot.read_field_end().unwrap();
    }
    prot.read_struct_end().unwrap();
    rg
}

#[derive(Debug, Default, Clone)]
pub struct FooterInfo {
    pub version: i32,
    pub schema_names: Vec<String>,
    pub num_rows: i64,
    pub row_groups: Vec<RowGroupInfo>,
    pub created_by: Option<String>,
    pub num_column_orders: usize,
    /// (is_ctr, aad_prefix, aad_file_unique) when an algorithm is recorded.
    pub algorithm: Option<(bool, Option<Vec<u8>>, Vec<u8>)>,
}

fn parse_schema_element_name(prot: &mut dyn TInputProtocol) -> String {
    let mut name = String::new();
    prot.read_struct_begin().unwrap();
    loop {
        let ident = prot.read_field_begin().unwrap();
        if ident.field_type == TType::Stop {
            break;
        }
        if ident.id == Some(4) {
            name = prot.read_string().unwrap();
        } else {
            prot.skip(ident.field_type).unwrap();
        }
        prot.read_field_end().unwrap();
    }
    prot.read_struct_end().unwrap();
    name
}

/// Parses the EncryptionAlgorithm union into (is_ctr, aad_prefix,
/// aad_file_unique).
pub fn parse_encryption_algorithm(
    prot: &mut dyn TInputProtocol,
) -> (bool, Option<Vec<u8>>, Vec<u8>) {
    let mut is_ctr = false;
    let mut prefix = None;
    let mut unique = Vec::new();
    prot.read_struct_begin().unwrap();
    loop {
        let ident = prot.read_field_begin().unwrap();
        if ident.field_type == TType::Stop {
            break;
        }
        is_ctr = ident.id == Some(2);
        prot.read_struct_begin().unwrap();
        loop {
            let inner = prot.read_field_begin().unwrap();
            if inner.field_type == TType::Stop {
                break;
            }
            match inner.id.unwrap_or(0) {
                1 => prefix = Some(prot.read_bytes().unwrap()),
                2 => unique = prot.read_bytes().unwrap(),
                _ => prot.skip(inner.field_type).unwrap(),
            }
            prot.read_field_end().unwrap();
        }
        prot.read_struct_end().unwrap();
        prot.read_field_end().unwrap();
    }
    prot.read_struct_end().unwrap();
    (is_ctr, prefix, unique)
}

pub fn parse_footer_bytes(data: &[u8]) -> FooterInfo {
    let mut info = FooterInfo::default();
    let mut prot = TCompactInputProtocol::new(data);
    prot.read_struct_begin().unwrap();
    loop {
        let ident = prot.read_field_begin().unwrap();
        if ident.field_type == TType::Stop {
            break;
        }
        match ident.id.unwrap_or(0) {
            1 => info.version = prot.read_i32().unwrap(),
            2 => {
                let list = prot.read_list_begin().unwrap();
                for _ in 0..list.size {
                    info.schema_names.push(parse_schema_element_name(&mut prot));
                }
                prot.read_list_end().unwrap();
            }
            3 => info.num_rows = prot.read_i64().unwrap(),
            4 => {
                let list = prot.read_list_begin().unwrap();
                for _ in 0..list.size {
                    info.row_groups.push(parse_row_group(&mut prot));
                }
                prot.read_list_end().unwrap();
            }
            6 => info.created_by = Some(prot.read_string().unwrap()),
            7 => {
                let list = prot.read_list_begin().unwrap();
                info.num_column_orders = list.size as usize;
                for _ in 0..list.size {
                    prot.skip(list.element_type).unwrap();
                }
                prot.read_list_end().unwrap();
            }
            8 => info.algorithm = Some(parse_encryption_algorithm(&mut prot)),
            _ => prot.skip(ident.field_type).unwrap(),
        }
        prot.read_field_end().unwrap();
    }
    prot.read_struct_end().unwrap();
    info
}

/// Splits a plaintext-footer file into (footer bytes, footer length).
pub fn footer_slice(file: &[u8]) -> (&[u8], usize) {
    assert_eq!(&file[..4], MAGIC, "leading magic");
    assert_eq!(&file[file.len() - 4..], MAGIC, "trailing magic");
    let len = u32::from_le_bytes(
        file[file.len() - FOOTER_SIZE..file.len() - 4]
            .try_into()
            .unwrap(),
    ) as usize;
    let start = file.len() - FOOTER_SIZE - len;
    (&file[start..file.len() - FOOTER_SIZE], len)
}

pub fn read_footer(file: &[u8]) -> FooterInfo {
    let (bytes, _) = footer_slice(file);
    parse_footer_bytes(bytes)
}

/// Splits an encrypted-footer file into its trailing footer region.
pub fn encrypted_footer_slice(file: &[u8]) -> &[u8] {
    assert_eq!(&file[..4], MAGIC_ENCRYPTED, "leading magic");
    assert_eq!(&file[file.len() - 4..], MAGIC_ENCRYPTED, "trailing magic");
    let len = u32::from_le_bytes(
        file[file.len() - FOOTER_SIZE..file.len() - 4]
            .try_into()
            .unwrap(),
    ) as usize;
    &file[file.len() - FOOTER_SIZE - len..file.len() - FOOTER_SIZE]
}
