//! The per-language code generator interface

use std::path::PathBuf;

use serde::Serialize;

use super::Capability;
use crate::core::{camel_case, pluralize, screaming_snake_case, snake_case, MethodNode, StateTransition};
use crate::model::{EnhancedClass, StateMachine};

/// How a language delimits class bodies, which picks the merge scanner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSyntax {
    /// `{ ... }` bodies: Java, TypeScript, C#, PHP
    #[default]
    Braces,
    /// Indented suites: Python
    Indentation,
}

/// A target language: one synthesizer per [`Capability`].
///
/// Each capability method is a pure function of the class and the
/// package or namespace.
pub trait CodeGenerator: Send + Sync {
    /// Registry key, e.g. `java`
    fn language(&self) -> &'static str;

    /// Framework tags that also resolve to this generator
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn syntax(&self) -> SourceSyntax;

    /// Package or namespace used when none is configured
    fn default_package(&self) -> &'static str;

    /// File path, relative to the output root, for one artifact
    fn output_path(&self, class: &EnhancedClass, capability: Capability, package: &str) -> PathBuf;

    /// Name of the type declared by an artifact, e.g. `OrderService`
    fn type_name(&self, class: &EnhancedClass, capability: Capability) -> String;

    /// Target-language type for a diagram type token
    fn map_type(&self, token: &str) -> String;

    fn entity(&self, class: &EnhancedClass, package: &str) -> String;

    fn repository(&self, class: &EnhancedClass, package: &str) -> String;

    fn service(&self, class: &EnhancedClass, package: &str) -> String;

    fn controller(&self, class: &EnhancedClass, package: &str) -> String;

    fn migration(&self, class: &EnhancedClass, package: &str) -> String;

    /// Synthesize one artifact
    fn generate(&self, capability: Capability, class: &EnhancedClass, package: &str) -> String {
        match capability {
            Capability::Entity => self.entity(class, package),
            Capability::Repository => self.repository(class, package),
            Capability::Service => self.service(class, package),
            Capability::Controller => self.controller(class, package),
            Capability::Migration => self.migration(class, package),
        }
    }

    /// Whether an existing artifact is merged rather than left alone;
    /// migrations are write-once
    fn mergeable(&self, capability: Capability) -> bool {
        capability != Capability::Migration
    }
}

/// Table name for a class: `OrderLine` -> `order_lines`
pub fn table_name(class: &str) -> String {
    snake_case(&pluralize(class))
}

/// Enum literal for a state: `InReview` -> `IN_REVIEW`
pub fn state_literal(state: &str) -> String {
    screaming_snake_case(state)
}

/// A guarded transition method for one event
#[derive(Debug, Clone)]
pub struct EventMethod<'a> {
    pub name: String,
    pub event: &'a str,
    pub transitions: Vec<&'a StateTransition>,
}

/// One transition method per distinct event, in first-appearance order
pub fn event_methods(machine: &StateMachine) -> Vec<EventMethod<'_>> {
    machine
        .events()
        .into_iter()
        .filter_map(|event| {
            let name = camel_case(event);
            (!name.is_empty()).then(|| EventMethod {
                name,
                event,
                transitions: machine.transitions_for(event).collect(),
            })
        })
        .collect()
}

/// Behavioral methods for the service, minus names already taken by
/// generated CRUD or transition methods
pub fn service_behaviors<'a>(class: &'a EnhancedClass, reserved: &[&str]) -> Vec<&'a MethodNode> {
    let events: Vec<String> = class
        .state_machine
        .as_ref()
        .map(|m| event_methods(m).into_iter().map(|e| e.name).collect())
        .unwrap_or_default();
    class
        .behaviors
        .iter()
        .filter(|m| !reserved.contains(&m.name.as_str()) && !events.contains(&m.name))
        .collect()
}

/// Whether a class gets artifacts beyond its entity
pub fn is_persistent(class: &EnhancedClass) -> bool {
    !class.is_enumeration() && !class.class.is_interface
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StateBlock, ClassNode};

    #[test]
    fn test_table_name() {
        assert_eq!(table_name("OrderLine"), "order_lines");
        assert_eq!(table_name("Category"), "categories");
        assert_eq!(table_name("Address"), "addresses");
    }

    #[test]
    fn test_event_methods_group_transitions() {
        let transition = |from: &str, event: &str, to: &str| StateTransition {
            from: from.to_string(),
            event: event.to_string(),
            to: to.to_string(),
        };
        let block = StateBlock {
            initial: Some("Draft".into()),
            states: vec!["Draft".into(), "Review".into(), "Published".into()],
            transitions: vec![
                transition("Draft", "submit", "Review"),
                transition("Review", "publish", "Published"),
                transition("Draft", "publish", "Published"),
            ],
            ..Default::default()
        };
        let machine = StateMachine::from_block(&block, "PostStatus").unwrap();
        let methods = event_methods(&machine);
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[1].name, "publish");
        assert_eq!(methods[1].transitions.len(), 2);
        assert_eq!(state_literal("InReview"), "IN_REVIEW");
    }

    #[test]
    fn test_service_behaviors_skip_reserved_names() {
        let mut class = EnhancedClass::new(ClassNode::new("Order"));
        class.behaviors.push(MethodNode::new("save", "Order"));
        class.behaviors.push(MethodNode::new("submitOrder", "Order"));
        let names: Vec<&str> = service_behaviors(&class, &["save"])
            .into_iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["submitOrder"]);
    }
}
