//! Row-group flushing and dictionary fallback at file scope.

mod common;

use std::sync::Arc;

use parq::options::WriterProperties;
use parq::record::RecordConsumer;
use parq::schema::types::{Field, Schema};
use parq::RecordWriter;
use parq_format::basic::{PhysicalType, Repetition};

use common::{parse_page_header, read_footer};

#[test]
fn test_memory_driven_row_group_flush() {
    const ROW_GROUP_SIZE: usize = 64 * 1024;
    const N: i64 = 50_000;
    let schema = Arc::new(
        Schema::try_new(
            "m",
            vec![Field::primitive("v", Repetition::Required, PhysicalType::Int64)],
        )
        .unwrap(),
    );
    let props = WriterProperties::builder()
        .set_row_group_size(ROW_GROUP_SIZE)
        .set_min_row_count_for_size_check(10)
        .set_dictionary_enabled(false)
        .build();
    let mut writer = RecordWriter::try_new(Vec::new(), schema, props).unwrap();
    for i in 0..N {
        writer.start_message().unwrap();
        writer.start_field("v", 0).unwrap();
        writer.add_int64(i).unwrap();
        writer.end_field("v", 0).unwrap();
        writer.end_message().unwrap();
    }
    let file = writer.close(None).unwrap();
    let footer = read_footer(&file);

    assert!(footer.row_groups.len() > 1, "one row group only");
    let total: i64 = footer.row_groups.iter().map(|rg| rg.num_rows).sum();
    assert_eq!(total, N);

    // row groups land in file order with increasing offsets
    let offsets: Vec<i64> = footer
        .row_groups
        .iter()
        .map(|rg| rg.file_offset.unwrap())
        .collect();
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(offsets[0], 4);

    // every group except the last stays within the threshold plus a few
    // records' slack
    for rg in &footer.row_groups[..footer.row_groups.len() - 1] {
        let size = rg.total_byte_size as usize;
        assert!(
            size <= ROW_GROUP_SIZE + 4096,
            "row group of {} bytes exceeds bound",
            size
        );
        assert!(size >= ROW_GROUP_SIZE / 4, "row group of {} bytes", size);
    }
}

#[test]
fn test_dictionary_fallback_region_split() {
    // unique strings with a small dictionary cap: early pages stay
    // dictionary-encoded, later pages use the fallback encoding, never mixed
    // within one page
    let schema = Arc::new(
        Schema::try_new(
            "m",
            vec![Field::primitive(
                "s",
                Repetition::Required,
                PhysicalType::ByteArray,
            )],
        )
        .unwrap(),
    );
    let props = WriterProperties::builder()
        .set_data_page_size(256)
        .set_dictionary_page_size(10_000)
        .build();
    let mut writer = RecordWriter::try_new(Vec::new(), Arc::clone(&schema), props).unwrap();
    const N: usize = 2000;
    let values: Vec<String> = (0..N).map(|i| format!("value-{:010}", i * 7)).collect();
    for v in &values {
        writer.start_message().unwrap();
        writer.start_field("s", 0).unwrap();
        writer.add_binary(v.as_str().into()).unwrap();
        writer.end_field("s", 0).unwrap();
        writer.end_message().unwrap();
    }
    let file = writer.close(None).unwrap();
    let footer = read_footer(&file);
    let col = &footer.row_groups[0].columns[0];

    // both regions present in the chunk's encoding set
    assert!(col.encodings.contains(&2), "PLAIN_DICTIONARY missing");
    assert!(col.encodings.contains(&0), "PLAIN fallback missing");
    assert!(col.dict_page_offset.is_some());
    // fallback keeps no distinct count
    assert_eq!(col.distinct_count, None);

    // walk the pages: a dictionary-encoded prefix then a fallback suffix
    let mut offset = col.data_page_offset as usize;
    let mut seen = 0i64;
    let mut page_encodings = Vec::new();
    while seen < col.num_values {
        let header = parse_page_header(&file[offset..]);
        page_encodings.push(header.encoding);
        seen += header.num_values as i64;
        offset += header.header_len + header.compressed_size as usize;
    }
    assert_eq!(seen, col.num_values);
    assert!(page_encodings.len() > 2);
    let first_plain = page_encodings
        .iter()
        .position(|&e| e == 0)
        .expect("no fallback page");
    assert!(first_plain > 0, "no dictionary-encoded page before fallback");
    assert!(
        page_encodings[first_plain..].iter().all(|&e| e == 0),
        "dictionary page after fallback: {:?}",
        page_encodings
    );
    assert!(
        page_encodings[..first_plain].iter().all(|&e| e == 2),
        "unexpected prefix encodings: {:?}",
        page_encodings
    );
}

#[test]
fn test_block_alignment_padding() {
    const ALIGN: u64 = 4096;
    let schema = Arc::new(
        Schema::try_new(
            "m",
            vec![Field::primitive("v", Repetition::Required, PhysicalType::Int64)],
        )
        .unwrap(),
    );
    let props = WriterProperties::builder()
        .set_row_group_size(8 * 1024)
        .set_min_row_count_for_size_check(10)
        .set_dictionary_enabled(false)
        .set_block_alignment(Some(ALIGN), ALIGN as usize)
        .build();
    let mut writer = RecordWriter::try_new(Vec::new(), schema, props).unwrap();
    for i in 0..10_000i64 {
        writer.start_message().unwrap();
        writer.start_field("v", 0).unwrap();
        writer.add_int64(i).unwrap();
        writer.end_field("v", 0).unwrap();
        writer.end_message().unwrap();
    }
    let file = writer.close(None).unwrap();
    let footer = read_footer(&file);
    assert!(footer.row_groups.len() > 1);
    // with max padding equal to the alignment, every group after the first
    // starts on a block boundary
    for rg in &footer.row_groups[1..] {
        assert_eq!(rg.file_offset.unwrap() as u64 % ALIGN, 0);
    }
}
