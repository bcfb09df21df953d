//! The parsed, dialect-agnostic diagram store
//!
//! Every dialect parser writes into one [`Diagram`]. It is filled once per
//! parse and only read afterwards.

use indexmap::IndexMap;
use serde::Serialize;

use super::types::{
    BehaviorCandidate, ClassNode, Generalization, RelationshipEdge, StateBlock, Warning,
};
use super::{Database, Result};

/// Classes, relationships and the behavioral views of one input document
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagram {
    classes: IndexMap<String, ClassNode>,
    relationships: Vec<RelationshipEdge>,
    generalizations: Vec<Generalization>,
    state_blocks: Vec<StateBlock>,
    behaviors: Vec<BehaviorCandidate>,
    warnings: Vec<Warning>,
    #[serde(skip)]
    line_offset: usize,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of a block whose first line is `first_line` (1-based).
    ///
    /// Parsers see block-relative line numbers; [`Diagram::line`] maps them
    /// back to document lines.
    pub fn begin_block(&mut self, first_line: usize) {
        self.line_offset = first_line.saturating_sub(1);
    }

    /// Document line for a block-relative 1-based line
    pub fn line(&self, relative: usize) -> usize {
        self.line_offset + relative
    }

    pub fn class(&self, name: &str) -> Option<&ClassNode> {
        self.classes.get(name)
    }

    pub fn class_mut(&mut self, name: &str) -> Option<&mut ClassNode> {
        self.classes.get_mut(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassNode> {
        self.classes.values()
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Get a class by name, declaring it if absent
    pub fn get_or_create_class(&mut self, name: &str, line: usize) -> &mut ClassNode {
        self.classes.entry(name.to_string()).or_insert_with(|| {
            let mut class = ClassNode::new(name);
            class.line = line;
            class
        })
    }

    pub fn relationships(&self) -> &[RelationshipEdge] {
        &self.relationships
    }

    pub fn add_generalization(&mut self, generalization: Generalization) {
        self.generalizations.push(generalization);
    }

    pub fn generalizations(&self) -> &[Generalization] {
        &self.generalizations
    }

    pub fn add_state_block(&mut self, block: StateBlock) {
        self.state_blocks.push(block);
    }

    pub fn state_blocks(&self) -> &[StateBlock] {
        &self.state_blocks
    }

    pub fn add_behavior(&mut self, behavior: BehaviorCandidate) {
        self.behaviors.push(behavior);
    }

    pub fn behaviors(&self) -> &[BehaviorCandidate] {
        &self.behaviors
    }

    /// Record a warning at a block-relative line
    pub fn warn(&mut self, relative_line: usize, message: impl Into<String>) {
        let line = self.line(relative_line);
        self.warnings.push(Warning::new(Some(line), message));
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Flag attributes whose (element) type names a declared class
    pub fn mark_navigation_attributes(&mut self) {
        // Enumerations are value types, not navigations
        let entities: Vec<String> = self
            .classes
            .values()
            .filter(|c| !c.is_enumeration)
            .map(|c| c.name.clone())
            .collect();
        for class in self.classes.values_mut() {
            for attribute in &mut class.attributes {
                let element = attribute.element_type();
                let Some(target) = entities.iter().find(|n| n.as_str() == element) else {
                    continue;
                };
                attribute.is_relationship = true;
                attribute.role = Some(attribute.name.clone());
                attribute.target = Some(target.clone());
            }
        }
    }
}

impl Database for Diagram {
    type Node = ClassNode;
    type Edge = RelationshipEdge;

    /// Adding a class that already exists merges the two declarations
    fn add_node(&mut self, node: ClassNode) -> Result<()> {
        match self.classes.get_mut(&node.name) {
            Some(existing) => existing.absorb(node),
            None => {
                self.classes.insert(node.name.clone(), node);
            }
        }
        Ok(())
    }

    fn add_edge(&mut self, edge: RelationshipEdge) -> Result<()> {
        self.relationships.push(edge);
        Ok(())
    }

    fn get_node(&self, id: &str) -> Option<&ClassNode> {
        self.classes.get(id)
    }

    fn nodes(&self) -> impl Iterator<Item = &ClassNode> {
        self.classes.values()
    }

    fn edges(&self) -> impl Iterator<Item = &RelationshipEdge> {
        self.relationships.iter()
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn node_count(&self) -> usize {
        self.classes.len()
    }

    fn edge_count(&self) -> usize {
        self.relationships.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AttributeNode, RelationshipKind};

    #[test]
    fn test_add_node_merges_duplicates() {
        let mut diagram = Diagram::new();
        let mut first = ClassNode::new("User");
        first.attributes.push(AttributeNode::new("name", "String"));
        let mut second = ClassNode::new("User");
        second.attributes.push(AttributeNode::new("email", "String"));

        diagram.add_node(first).unwrap();
        diagram.add_node(second).unwrap();

        assert_eq!(diagram.node_count(), 1);
        assert_eq!(diagram.class("User").unwrap().attributes.len(), 2);
    }

    #[test]
    fn test_block_relative_lines() {
        let mut diagram = Diagram::new();
        diagram.begin_block(10);
        assert_eq!(diagram.line(1), 10);
        assert_eq!(diagram.line(3), 12);
        diagram.warn(2, "skipped");
        assert_eq!(diagram.warnings()[0].line, Some(11));
    }

    #[test]
    fn test_mark_navigation_attributes() {
        let mut diagram = Diagram::new();
        let mut user = ClassNode::new("User");
        user.attributes.push(AttributeNode::new("orders", "List<Order>"));
        user.attributes.push(AttributeNode::new("role", "Role"));
        user.attributes.push(AttributeNode::new("name", "String"));
        let mut role = ClassNode::new("Role");
        role.is_enumeration = true;
        diagram.add_node(user).unwrap();
        diagram.add_node(ClassNode::new("Order")).unwrap();
        diagram.add_node(role).unwrap();

        diagram.mark_navigation_attributes();

        let user = diagram.class("User").unwrap();
        assert!(user.attributes[0].is_relationship);
        assert_eq!(user.attributes[0].target.as_deref(), Some("Order"));
        assert_eq!(user.attributes[0].role.as_deref(), Some("orders"));
        assert!(!user.attributes[1].is_relationship);
        assert!(!user.attributes[2].is_relationship);
    }

    #[test]
    fn test_clear() {
        let mut diagram = Diagram::new();
        diagram.add_node(ClassNode::new("A")).unwrap();
        diagram
            .add_edge(RelationshipEdge::new("A", "A", RelationshipKind::Association))
            .unwrap();
        diagram.clear();
        assert_eq!(diagram.node_count(), 0);
        assert_eq!(diagram.edge_count(), 0);
    }
}
