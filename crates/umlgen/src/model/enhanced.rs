//! The intermediate representation consumed by the code generators

use indexmap::IndexMap;
use serde::Serialize;

use super::{Cardinality, StateMachine};
use crate::core::{AttributeNode, ClassNode, MethodNode, RelationshipKind, Warning};

/// A relationship field on one class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipDescriptor {
    /// Field holding the reference or collection
    pub field_name: String,
    /// The class on the other side
    pub target: String,
    /// Seen from the class holding this descriptor
    pub cardinality: Cardinality,
    /// Whether this side owns the foreign key or join table
    pub owner: bool,
    /// Owner's field name, set on inverse sides
    pub mapped_by: Option<String>,
    /// Inverse side's field name, set on owning sides of bidirectional relationships
    pub inversed_by: Option<String>,
    /// Foreign key column for owning single references
    pub join_column: Option<String>,
    /// Join table for owning many-to-many sides
    pub join_table: Option<String>,
    pub cascade_delete: bool,
}

impl RelationshipDescriptor {
    pub fn is_collection(&self) -> bool {
        self.cardinality.is_collection()
    }
}

/// A relationship after cardinality and ownership resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEdge {
    pub source: String,
    pub target: String,
    pub kind: RelationshipKind,
    /// Seen from the source side
    pub cardinality: Cardinality,
    pub owner: String,
    pub cascade_delete: bool,
    /// Derived from a navigation attribute rather than a relationship line
    pub implied: bool,
    pub label: Option<String>,
    pub line: usize,
}

impl ResolvedEdge {
    /// Cardinality seen from `class`, `None` when it is not an endpoint
    pub fn cardinality_for(&self, class: &str) -> Option<Cardinality> {
        if class == self.source {
            Some(self.cardinality)
        } else if class == self.target {
            Some(self.cardinality.inverse())
        } else {
            None
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The endpoint that is not `class`
    pub fn other(&self, class: &str) -> &str {
        if class == self.source {
            &self.target
        } else {
            &self.source
        }
    }
}

/// One class with everything the diagram views contributed to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedClass {
    pub class: ClassNode,
    pub relationships: Vec<RelationshipDescriptor>,
    pub state_machine: Option<StateMachine>,
    /// Methods contributed by sequence and activity diagrams
    pub behaviors: Vec<MethodNode>,
}

impl EnhancedClass {
    pub fn new(class: ClassNode) -> Self {
        Self {
            class,
            relationships: Vec::new(),
            state_machine: None,
            behaviors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.class.name
    }

    pub fn is_stateful(&self) -> bool {
        self.state_machine.is_some()
    }

    pub fn is_enumeration(&self) -> bool {
        self.class.is_enumeration
    }

    /// Plain value fields; navigation attributes are emitted from descriptors
    pub fn fields(&self) -> impl Iterator<Item = &AttributeNode> {
        self.class.attributes.iter().filter(|a| !a.is_relationship)
    }

    pub fn identifier(&self) -> Option<&AttributeNode> {
        self.class.attributes.iter().find(|a| a.identifier)
    }

    pub fn relationship(&self, field_name: &str) -> Option<&RelationshipDescriptor> {
        self.relationships.iter().find(|r| r.field_name == field_name)
    }

    pub fn behavior(&self, name: &str) -> Option<&MethodNode> {
        self.behaviors.iter().find(|m| m.name == name)
    }
}

/// The built class graph
#[derive(Debug, Clone, Default, Serialize)]
pub struct Model {
    pub classes: IndexMap<String, EnhancedClass>,
    pub edges: Vec<ResolvedEdge>,
    pub warnings: Vec<Warning>,
}

impl Model {
    pub fn class(&self, name: &str) -> Option<&EnhancedClass> {
        self.classes.get(name)
    }

    /// Classes in diagram order
    pub fn classes(&self) -> impl Iterator<Item = &EnhancedClass> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
