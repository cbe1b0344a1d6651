//! The schema tree. Users assemble an owned [`Field`] tree; [`Schema`]
//! flattens it into an arena of nodes addressed by integer ids, validates it,
//! and derives the per-leaf column descriptors.

use std::sync::Arc;

use parq_core::errors::{Error, Result};
use parq_format::basic::{LogicalType, PhysicalType, Repetition};
use parq_format::metadata::SchemaElement;

use super::descriptor::{sort_order_for, ColumnDescriptor};

/// Owned builder-side schema node.
#[derive(Clone, Debug)]
pub struct Field {
    pub name: String,
    pub repetition: Repetition,
    pub logical: Option<LogicalType>,
    pub kind: FieldKind,
}

#[derive(Clone, Debug)]
pub enum FieldKind {
    Primitive {
        physical: PhysicalType,
        type_length: Option<i32>,
    },
    Group {
        children: Vec<Field>,
    },
}

impl Field {
    pub fn primitive(name: &str, repetition: Repetition, physical: PhysicalType) -> Self {
        Self {
            name: name.to_string(),
            repetition,
            logical: None,
            kind: FieldKind::Primitive {
                physical,
                type_length: None,
            },
        }
    }

    /// FIXED_LEN_BYTE_ARRAY primitive with its mandatory length.
    pub fn fixed(name: &str, repetition: Repetition, type_length: i32) -> Self {
        Self {
            name: name.to_string(),
            repetition,
            logical: None,
            kind: FieldKind::Primitive {
                physical: PhysicalType::FixedLenByteArray,
                type_length: Some(type_length),
            },
        }
    }

    pub fn group(name: &str, repetition: Repetition, children: Vec<Field>) -> Self {
        Self {
            name: name.to_string(),
            repetition,
            logical: None,
            kind: FieldKind::Group { children },
        }
    }

    pub fn with_logical(mut self, logical: LogicalType) -> Self {
        self.logical = Some(logical);
        self
    }
}

pub type NodeId = usize;

/// One arena node. Parent links and derived levels replace the cyclic
/// references a pointer-based tree would need.
#[derive(Debug)]
pub struct SchemaNode {
    pub name: String,
    pub repetition: Repetition,
    pub logical: Option<LogicalType>,
    pub physical: Option<PhysicalType>,
    pub type_length: Option<i32>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Definition level of a value at this node when present.
    pub def_level: i16,
    /// Repetition level of this node's deepest repeated ancestor-or-self.
    pub rep_level: i16,
}

impl SchemaNode {
    pub fn is_group(&self) -> bool {
        self.physical.is_none()
    }
}

/// Validated schema: arena plus derived column descriptors in pre-order
/// leaf order.
#[derive(Debug)]
pub struct Schema {
    nodes: Vec<SchemaNode>,
    root: NodeId,
    columns: Vec<Arc<ColumnDescriptor>>,
    /// Column index per node id, `None` for groups.
    leaf_of_node: Vec<Option<usize>>,
}

impl Schema {
    /// Flattens and validates a message with the given name and fields.
    pub fn try_new(message_name: &str, fields: Vec<Field>) -> Result<Self> {
        let mut nodes = Vec::new();
        nodes.push(SchemaNode {
            name: message_name.to_string(),
            repetition: Repetition::Required,
            logical: None,
            physical: None,
            type_length: None,
            children: Vec::new(),
            parent: None,
            def_level: 0,
            rep_level: 0,
        });
        let root = 0;
        let mut schema = Self {
            nodes,
            root,
            columns: Vec::new(),
            leaf_of_node: Vec::new(),
        };
        for field in fields {
            schema.insert(root, field)?;
        }
        if schema.nodes[root].children.is_empty() {
            return Err(Error::Schema("a message needs at least one field".to_string()));
        }
        schema.leaf_of_node = vec![None; schema.nodes.len()];
        schema.derive_columns(root, &mut Vec::new());
        Ok(schema)
    }

    fn insert(&mut self, parent: NodeId, field: Field) -> Result<NodeId> {
        if field.name.is_empty() {
            return Err(Error::Schema("field names cannot be empty".to_string()));
        }
        if self
            .nodes[parent]
            .children
            .iter()
            .any(|&c| self.nodes[c].name == field.name)
        {
            return Err(Error::Schema(format!(
                "duplicate field name {:?} under {:?}",
                field.name, self.nodes[parent].name
            )));
        }
        let def_level = self.nodes[parent].def_level
            + (field.repetition != Repetition::Required) as i16;
        let rep_level =
            self.nodes[parent].rep_level + (field.repetition == Repetition::Repeated) as i16;
        let id = self.nodes.len();
        match field.kind {
            FieldKind::Primitive {
                physical,
                type_length,
            } => {
                if physical == PhysicalType::FixedLenByteArray
                    && type_length.map_or(true, |len| len <= 0)
                {
                    return Err(Error::Schema(format!(
                        "FIXED_LEN_BYTE_ARRAY field {:?} requires a length > 0",
                        field.name
                    )));
                }
                if let Some(logical) = &field.logical {
                    logical.check_physical(physical, type_length)?;
                }
                self.nodes.push(SchemaNode {
                    name: field.name,
                    repetition: field.repetition,
                    logical: field.logical,
                    physical: Some(physical),
                    type_length,
                    children: Vec::new(),
                    parent: Some(parent),
                    def_level,
                    rep_level,
                });
                self.nodes[parent].children.push(id);
            }
            FieldKind::Group { children } => {
                if children.is_empty() {
                    return Err(Error::Schema(format!(
                        "group {:?} needs at least one child",
                        field.name
                    )));
                }
                if let Some(logical) = &field.logical {
                    if !matches!(logical, LogicalType::Map | LogicalType::List) {
                        return Err(Error::Schema(format!(
                            "{:?} cannot annotate group {:?}",
                            logical, field.name
                        )));
                    }
                }
                self.nodes.push(SchemaNode {
                    name: field.name,
                    repetition: field.repetition,
                    logical: field.logical,
                    physical: None,
                    type_length: None,
                    children: Vec::new(),
                    parent: Some(parent),
                    def_level,
                    rep_level,
                });
                self.nodes[parent].children.push(id);
                for child in children {
                    self.insert(id, child)?;
                }
            }
        }
        Ok(id)
    }

    fn derive_columns(&mut self, node_id: NodeId, path: &mut Vec<String>) {
        if node_id != self.root {
            path.push(self.nodes[node_id].name.clone());
        }
        if self.nodes[node_id].is_group() {
            for child in self.nodes[node_id].children.clone() {
                self.derive_columns(child, path);
            }
        } else {
            let node = &self.nodes[node_id];
            let column_index = self.columns.len();
            self.leaf_of_node[node_id] = Some(column_index);
            self.columns.push(Arc::new(ColumnDescriptor {
                node: node_id,
                column_index,
                path: path.clone(),
                physical: node.physical.unwrap(),
                type_length: node.type_length,
                logical: node.logical,
                max_def_level: node.def_level,
                max_rep_level: node.rep_level,
                sort_order: sort_order_for(node.physical.unwrap(), node.logical.as_ref()),
            }));
        }
        if node_id != self.root {
            path.pop();
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id]
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Arc<ColumnDescriptor>] {
        &self.columns
    }

    pub fn column(&self, i: usize) -> &Arc<ColumnDescriptor> {
        &self.columns[i]
    }

    /// Column index of a leaf node id, if it is a leaf.
    pub fn leaf_index(&self, node_id: NodeId) -> Option<usize> {
        self.leaf_of_node[node_id]
    }

    /// Leaf node ids of the subtree rooted at `node_id`, pre-order.
    pub fn leaves_under(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(node_id, &mut out);
        out
    }

    fn collect_leaves(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        let node = &self.nodes[node_id];
        if node.is_group() {
            for &child in &node.children {
                self.collect_leaves(child, out);
            }
        } else {
            out.push(node_id);
        }
    }

    /// Footer form: the pre-order list of schema elements.
    pub fn to_schema_elements(&self) -> Vec<SchemaElement> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.push_elements(self.root, &mut out);
        out
    }

    fn push_elements(&self, node_id: NodeId, out: &mut Vec<SchemaElement>) {
        let node = &self.nodes[node_id];
        let is_root = node_id == self.root;
        out.push(SchemaElement {
            type_: node.physical,
            type_length: node.type_length,
            repetition_type: (!is_root).then_some(node.repetition),
            name: node.name.clone(),
            num_children: node
                .is_group()
                .then_some(node.children.len() as i32),
            logical_type: node.logical,
            field_id: None,
        });
        for &child in &node.children {
            self.push_elements(child, out);
        }
    }
}
