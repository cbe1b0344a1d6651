//! Record shredding: consumer events in, per-column ⟨rep, def, value⟩
//! triples out.
//!
//! A stack of frames mirrors the open group path. Each frame knows the
//! definition level its instance stands for and the repetition level the
//! first emission inside it must use; a per-frame written set drives null
//! emission for fields the record never touched.

use std::sync::Arc;

use parq_core::errors::{Error, Result};
use parq_core::value::{ByteArray, Int96};
use parq_format::basic::Repetition;

use crate::column::writer::ColumnWriteStore;
use crate::record::{PrimitiveValue, RecordConsumer};
use crate::schema::types::{NodeId, Schema};

/// Receives the shredded triple stream, one call per triple, in record
/// order per column.
pub trait TripleSink {
    fn value(&mut self, column: usize, rep: i16, def: i16, value: &PrimitiveValue) -> Result<()>;
    fn null(&mut self, column: usize, rep: i16, def: i16) -> Result<()>;
    fn end_record(&mut self) -> Result<()>;
}

impl TripleSink for ColumnWriteStore {
    fn value(&mut self, column: usize, rep: i16, def: i16, value: &PrimitiveValue) -> Result<()> {
        self.write_value(column, rep, def, value)
    }

    fn null(&mut self, column: usize, rep: i16, def: i16) -> Result<()> {
        self.write_null(column, rep, def)
    }

    fn end_record(&mut self) -> Result<()> {
        ColumnWriteStore::end_record(self)
    }
}

struct Frame {
    node: NodeId,
    /// Child index of the field currently open, if any.
    current_field: Option<usize>,
    /// Instances emitted for the open field within this group instance.
    field_instances: u32,
    written: Vec<bool>,
    /// Definition level this instance stands for.
    def: i16,
    /// Repetition level for the first emission inside this instance.
    rep: i16,
}

pub struct Shredder<S: TripleSink> {
    schema: Arc<Schema>,
    sink: S,
    frames: Vec<Frame>,
    records: u64,
}

impl<S: TripleSink> Shredder<S> {
    pub fn new(schema: Arc<Schema>, sink: S) -> Self {
        Self {
            schema,
            sink,
            frames: Vec::new(),
            records: 0,
        }
    }

    pub fn records_started(&self) -> u64 {
        self.records
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Swaps the sink, e.g. when a row-group flush replaces the store. Only
    /// valid between records.
    pub fn replace_sink(&mut self, sink: S) -> Result<S> {
        if !self.frames.is_empty() {
            return Err(Error::IllegalState(
                "cannot replace the sink inside an open record".to_string(),
            ));
        }
        Ok(std::mem::replace(&mut self.sink, sink))
    }

    fn top(&mut self) -> Result<&mut Frame> {
        self.frames.last_mut().ok_or_else(|| {
            Error::IllegalState("no record in flight; call start_message first".to_string())
        })
    }

    /// The node of the open field, validating that a field is open.
    fn open_child(&mut self) -> Result<(NodeId, i16)> {
        let schema = Arc::clone(&self.schema);
        let frame = self.top()?;
        let field = frame.current_field.ok_or_else(|| {
            Error::Schema("value or group outside an open field".to_string())
        })?;
        let child = schema.node(frame.node).children[field];
        let child_node = schema.node(child);
        let rep = if child_node.repetition == Repetition::Repeated && frame.field_instances > 0 {
            child_node.rep_level
        } else {
            frame.rep
        };
        Ok((child, rep))
    }

    fn add_value(&mut self, value: PrimitiveValue) -> Result<()> {
        let (child, rep) = self.open_child()?;
        let node = self.schema.node(child);
        if node.is_group() {
            return Err(Error::Schema(format!(
                "field {:?} is a group; use start_group",
                node.name
            )));
        }
        let def = node.def_level;
        let column = self
            .schema
            .leaf_index(child)
            .ok_or_else(|| Error::Internal("leaf without a column".to_string()))?;
        self.sink.value(column, rep, def, &value)?;
        let frame = self.top()?;
        let field = frame.current_field.unwrap();
        frame.written[field] = true;
        frame.field_instances += 1;
        Ok(())
    }

    /// Emits one null triple per leaf under a subtree the record never
    /// opened. `def` is the level of the deepest ancestor actually present.
    fn write_null_subtree(&mut self, node_id: NodeId, rep: i16, def: i16) -> Result<()> {
        let schema = Arc::clone(&self.schema);
        let node = schema.node(node_id);
        if !node.is_group() {
            if node.repetition == Repetition::Required {
                return Err(Error::Schema(format!(
                    "missing required field {:?}",
                    node.name
                )));
            }
            let column = schema
                .leaf_index(node_id)
                .ok_or_else(|| Error::Internal("leaf without a column".to_string()))?;
            return self.sink.null(column, rep, def);
        }
        if node.repetition == Repetition::Required {
            // a required group is implicitly present; recurse so its own
            // required leaves still fail
            for &child in &node.children {
                self.write_null_subtree(child, rep, def)?;
            }
        } else {
            for leaf in schema.leaves_under(node_id) {
                let column = schema
                    .leaf_index(leaf)
                    .ok_or_else(|| Error::Internal("leaf without a column".to_string()))?;
                self.sink.null(column, rep, def)?;
            }
        }
        Ok(())
    }

    fn close_instance(&mut self, frame: Frame) -> Result<()> {
        let schema = Arc::clone(&self.schema);
        let children = &schema.node(frame.node).children;
        for (index, &child) in children.iter().enumerate() {
            if !frame.written[index] {
                self.write_null_subtree(child, frame.rep, frame.def)?;
            }
        }
        Ok(())
    }
}

impl<S: TripleSink> RecordConsumer for Shredder<S> {
    fn start_message(&mut self) -> Result<()> {
        if !self.frames.is_empty() {
            return Err(Error::IllegalState(
                "previous record still open".to_string(),
            ));
        }
        let root = self.schema.root();
        let num_children = self.schema.node(root).children.len();
        self.frames.push(Frame {
            node: root,
            current_field: None,
            field_instances: 0,
            written: vec![false; num_children],
            def: 0,
            rep: 0,
        });
        self.records += 1;
        Ok(())
    }

    fn start_field(&mut self, name: &str, index: usize) -> Result<()> {
        let schema = Arc::clone(&self.schema);
        let frame = self.top()?;
        if frame.current_field.is_some() {
            return Err(Error::Schema(format!(
                "field {:?} started while another field is open",
                name
            )));
        }
        let children = &schema.node(frame.node).children;
        let child = *children.get(index).ok_or_else(|| {
            Error::Schema(format!(
                "field index {} out of range in group {:?}",
                index,
                schema.node(frame.node).name
            ))
        })?;
        let child_name = &schema.node(child).name;
        if child_name != name {
            return Err(Error::Schema(format!(
                "field {:?} at index {} does not match schema field {:?}",
                name, index, child_name
            )));
        }
        frame.current_field = Some(index);
        frame.field_instances = 0;
        Ok(())
    }

    fn start_group(&mut self) -> Result<()> {
        let (child, rep) = self.open_child()?;
        let node = self.schema.node(child);
        if !node.is_group() {
            return Err(Error::Schema(format!(
                "field {:?} is a primitive; add a value instead",
                node.name
            )));
        }
        let def = node.def_level;
        let num_children = node.children.len();
        let frame = self.top()?;
        let field = frame.current_field.unwrap();
        frame.written[field] = true;
        frame.field_instances += 1;
        self.frames.push(Frame {
            node: child,
            current_field: None,
            field_instances: 0,
            written: vec![false; num_children],
            def,
            rep,
        });
        Ok(())
    }

    fn end_group(&mut self) -> Result<()> {
        if self.frames.len() <= 1 {
            return Err(Error::Schema(
                "end_group without a matching start_group".to_string(),
            ));
        }
        if self.frames.last().unwrap().current_field.is_some() {
            return Err(Error::Schema(
                "group ended while a field is open".to_string(),
            ));
        }
        let frame = self.frames.pop().unwrap();
        self.close_instance(frame)
    }

    fn end_field(&mut self, name: &str, index: usize) -> Result<()> {
        let frame = self.top()?;
        match frame.current_field {
            Some(open) if open == index => {
                frame.current_field = None;
                Ok(())
            }
            _ => Err(Error::Schema(format!(
                "end_field({:?}, {}) does not match the open field",
                name, index
            ))),
        }
    }

    fn add_boolean(&mut self, value: bool) -> Result<()> {
        self.add_value(PrimitiveValue::Boolean(value))
    }

    fn add_int32(&mut self, value: i32) -> Result<()> {
        self.add_value(PrimitiveValue::Int32(value))
    }

    fn add_int64(&mut self, value: i64) -> Result<()> {
        self.add_value(PrimitiveValue::Int64(value))
    }

    fn add_int96(&mut self, value: Int96) -> Result<()> {
        self.add_value(PrimitiveValue::Int96(value))
    }

    fn add_float(&mut self, value: f32) -> Result<()> {
        self.add_value(PrimitiveValue::Float(value))
    }

    fn add_double(&mut self, value: f64) -> Result<()> {
        self.add_value(PrimitiveValue::Double(value))
    }

    fn add_binary(&mut self, value: ByteArray) -> Result<()> {
        self.add_value(PrimitiveValue::Bytes(value))
    }

    fn end_message(&mut self) -> Result<()> {
        if self.frames.len() != 1 {
            return Err(Error::Schema(
                "message ended inside an open group".to_string(),
            ));
        }
        if self.frames.last().unwrap().current_field.is_some() {
            return Err(Error::Schema(
                "message ended while a field is open".to_string(),
            ));
        }
        let frame = self.frames.pop().unwrap();
        self.close_instance(frame)?;
        self.sink.end_record()
    }
}
