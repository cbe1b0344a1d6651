//! The public record-level writer: shredder in front, column write store in
//! the middle, file writer underneath, with the memory-driven row-group
//! flusher deciding when buffered triples become a row group.

use std::io::Write;
use std::sync::Arc;

use parq_core::errors::Result;
use parq_core::value::{ByteArray, Int96};
use parq_format::metadata::KeyValue;

use crate::column::writer::ColumnWriteStore;
use crate::file::writer::FileWriter;
use crate::options::WriterProperties;
use crate::record::shredder::Shredder;
use crate::record::RecordConsumer;
use crate::schema::types::Schema;

/// Writes record-shaped input to one Parquet file. Implements
/// [`RecordConsumer`]; every `end_message` is a potential row-group flush
/// point.
pub struct RecordWriter<W: Write> {
    file_writer: FileWriter<W>,
    shredder: Shredder<ColumnWriteStore>,
    schema: Arc<Schema>,
    props: Arc<WriterProperties>,
    records_in_row_group: u64,
    records_for_next_check: u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn try_new(sink: W, schema: Arc<Schema>, props: WriterProperties) -> Result<Self> {
        let props = Arc::new(props);
        let mut file_writer = FileWriter::new(sink, Arc::clone(&schema), Arc::clone(&props));
        file_writer.start()?;
        let store = ColumnWriteStore::new(&schema, &props, 0, file_writer.encryptor());
        let shredder = Shredder::new(Arc::clone(&schema), store);
        let records_for_next_check = props.min_row_count_for_size_check() as u64;
        Ok(Self {
            file_writer,
            shredder,
            schema,
            props,
            records_in_row_group: 0,
            records_for_next_check,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn properties(&self) -> &Arc<WriterProperties> {
        &self.props
    }

    /// Live bytes buffered for the open row group.
    pub fn buffered_size(&self) -> usize {
        self.shredder.sink().buffered_size()
    }

    /// Raw buffer capacity held for the open row group.
    pub fn allocated_size(&self) -> usize {
        self.shredder.sink().allocated_size()
    }

    pub fn records_written(&self) -> u64 {
        self.shredder.records_started()
    }

    /// Checks buffered memory on a record boundary, flushing the row group or
    /// rescheduling the next probe.
    fn after_record(&mut self) -> Result<()> {
        self.records_in_row_group += 1;
        if self.records_in_row_group < self.records_for_next_check {
            return Ok(());
        }
        let buffered = self.shredder.sink().buffered_size() as u64;
        let threshold = self.props.row_group_size() as u64;
        let avg_record = (buffered / self.records_in_row_group).max(1);
        if buffered + 2 * avg_record > threshold {
            self.flush_row_group()?;
            return Ok(());
        }
        let min_check = self.props.min_row_count_for_size_check() as u64;
        let max_check = self.props.max_row_count_for_size_check() as u64;
        self.records_for_next_check = if self.props.estimate_row_count_for_size_check() {
            // rounds toward zero; tested against the size bound, not the
            // exact arithmetic
            let estimated = self.records_in_row_group + (threshold - buffered) / avg_record / 2;
            estimated
                .max(self.records_in_row_group + min_check)
                .min(self.records_in_row_group + max_check)
        } else {
            self.records_in_row_group + min_check
        };
        Ok(())
    }

    /// Forces the buffered records out as a row group and reinitializes the
    /// column writers.
    pub fn flush_row_group(&mut self) -> Result<()> {
        if self.records_in_row_group == 0 {
            return Ok(());
        }
        log::debug!(
            "flushing row group {}: {} records, ~{} buffered bytes",
            self.file_writer.next_row_group_ordinal(),
            self.records_in_row_group,
            self.shredder.sink().buffered_size()
        );
        let next_ordinal = self.file_writer.next_row_group_ordinal() + 1;
        let fresh = ColumnWriteStore::new(
            &self.schema,
            &self.props,
            next_ordinal,
            self.file_writer.encryptor(),
        );
        let store = self.shredder.replace_sink(fresh)?;
        let chunks = store.close()?;
        self.file_writer.start_block(self.records_in_row_group as i64)?;
        for chunk in chunks {
            self.file_writer.write_column_chunk(chunk)?;
        }
        self.file_writer.end_block()?;
        self.records_in_row_group = 0;
        self.records_for_next_check = self.props.min_row_count_for_size_check() as u64;
        Ok(())
    }

    /// Flushes the tail row group and writes the footer.
    pub fn close(mut self, extra_metadata: Option<Vec<KeyValue>>) -> Result<W> {
        self.flush_row_group()?;
        self.file_writer.end(extra_metadata)
    }
}

impl<W: Write> RecordConsumer for RecordWriter<W> {
    fn start_message(&mut self) -> Result<()> {
        self.shredder.start_message()
    }

    fn start_field(&mut self, name: &str, index: usize) -> Result<()> {
        self.shredder.start_field(name, index)
    }

    fn start_group(&mut self) -> Result<()> {
        self.shredder.start_group()
    }

    fn end_group(&mut self) -> Result<()> {
        self.shredder.end_group()
    }

    fn end_field(&mut self, name: &str, index: usize) -> Result<()> {
        self.shredder.end_field(name, index)
    }

    fn add_boolean(&mut self, value: bool) -> Result<()> {
        self.shredder.add_boolean(value)
    }

    fn add_int32(&mut self, value: i32) -> Result<()> {
        self.shredder.add_int32(value)
    }

    fn add_int64(&mut self, value: i64) -> Result<()> {
        self.shredder.add_int64(value)
    }

    fn add_int96(&mut self, value: Int96) -> Result<()> {
        self.shredder.add_int96(value)
    }

    fn add_float(&mut self, value: f32) -> Result<()> {
        self.shredder.add_float(value)
    }

    fn add_double(&mut self, value: f64) -> Result<()> {
        self.shredder.add_double(value)
    }

    fn add_binary(&mut self, value: ByteArray) -> Result<()> {
        self.shredder.add_binary(value)
    }

    fn end_message(&mut self) -> Result<()> {
        self.shredder.end_message()?;
        self.after_record()
    }
}
