//! Builds the enhanced class graph from a parsed diagram
//!
//! Resolution runs in a fixed order: generalizations, relationship
//! cardinality and ownership, state machines, then behaviors.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, span, warn, Level};

use super::{
    Cardinality, EnhancedClass, Model, Multiplicity, RelationshipDescriptor, ResolvedEdge,
    StateMachine,
};
use crate::core::{
    camel_case, pluralize, snake_case, AttributeNode, Diagram, RelationshipKind, Result,
    StateBlock, UmlGenError, Warning,
};

/// What to do with a relationship naming an undeclared class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStrictness {
    /// Drop the relationship with a warning
    #[default]
    Lenient,
    /// Fail the build
    Strict,
}

/// A navigation attribute claimed by a relationship
#[derive(Debug, Clone)]
struct NavRef {
    name: String,
    collection: bool,
    line: usize,
}

impl NavRef {
    fn from_attribute(attribute: &AttributeNode) -> Self {
        Self {
            name: attribute.name.clone(),
            collection: attribute.is_collection(),
            line: attribute.line,
        }
    }
}

/// A resolved edge plus the navigation attributes each side declared for it
struct EdgePlan {
    edge: ResolvedEdge,
    source_field: Option<NavRef>,
    target_field: Option<NavRef>,
}

/// Turns a [`Diagram`] into a [`Model`]
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    strictness: RelationshipStrictness,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strictness(mut self, strictness: RelationshipStrictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn strictness(&self) -> RelationshipStrictness {
        self.strictness
    }

    /// Build the class graph.
    ///
    /// Only fails in strict mode, on a relationship to an undeclared class.
    pub fn build(&self, diagram: &Diagram) -> Result<Model> {
        let build_span = span!(Level::INFO, "build_model", classes = diagram.classes().count());
        let _enter = build_span.enter();

        let mut model = Model::default();
        model.warnings.extend(diagram.warnings().iter().cloned());
        for class in diagram.classes() {
            model
                .classes
                .insert(class.name.clone(), EnhancedClass::new(class.clone()));
        }

        self.apply_generalizations(diagram, &mut model);
        let plans = self.resolve_edges(diagram, &mut model)?;
        attach_descriptors(&plans, &mut model);
        model.edges = plans.into_iter().map(|plan| plan.edge).collect();
        self.attach_state_machines(diagram, &mut model);
        self.attach_behaviors(diagram, &mut model);

        info!(
            classes = model.len(),
            edges = model.edges.len(),
            stateful = model.classes().filter(|c| c.is_stateful()).count(),
            warnings = model.warnings.len(),
            "Model built"
        );
        Ok(model)
    }

    fn apply_generalizations(&self, diagram: &Diagram, model: &mut Model) {
        for generalization in diagram.generalizations() {
            let parent_is_interface = model
                .class(&generalization.parent)
                .is_some_and(|p| p.class.is_interface);
            let Some(child) = model.classes.get_mut(&generalization.child) else {
                push_warning(
                    model,
                    Some(generalization.line),
                    format!(
                        "generalization of undeclared class '{}' dropped",
                        generalization.child
                    ),
                );
                continue;
            };
            let class = &mut child.class;
            if generalization.realization || parent_is_interface {
                if !class.interfaces.contains(&generalization.parent) {
                    class.interfaces.push(generalization.parent.clone());
                }
                continue;
            }
            match &class.superclass {
                Some(existing) if *existing != generalization.parent => {
                    let message = format!(
                        "'{}' already extends '{}'; '{}' ignored",
                        class.name, existing, generalization.parent
                    );
                    push_warning(model, Some(generalization.line), message);
                }
                _ => class.superclass = Some(generalization.parent.clone()),
            }
        }
    }

    fn resolve_edges(&self, diagram: &Diagram, model: &mut Model) -> Result<Vec<EdgePlan>> {
        let mut plans = Vec::new();
        // (class, attribute) pairs already claimed by an edge
        let mut claimed: HashSet<(String, String)> = HashSet::new();

        for edge in diagram.relationships() {
            let missing = [&edge.source, &edge.target]
                .into_iter()
                .find(|name| !model.classes.contains_key(name.as_str()));
            if let Some(name) = missing {
                if self.strictness == RelationshipStrictness::Strict {
                    return Err(UmlGenError::UnresolvedRelationship {
                        source_class: edge.source.clone(),
                        target_class: edge.target.clone(),
                        line: edge.line,
                    });
                }
                let message = format!(
                    "relationship {} -> {} references undeclared class '{}' and was dropped",
                    edge.source, edge.target, name
                );
                push_warning(model, Some(edge.line), message);
                continue;
            }

            let source_field = claim_navigation(model, &mut claimed, &edge.source, &edge.target);
            let target_field = claim_navigation(model, &mut claimed, &edge.target, &edge.source);

            // An end without a label takes its multiplicity from the
            // navigation attribute declared on the opposite side
            let source_end = match edge.source_multiplicity.as_deref() {
                Some(label) => Multiplicity::parse(Some(label)),
                None => end_from_navigation(target_field.as_ref()),
            };
            let target_end = match edge.target_multiplicity.as_deref() {
                Some(label) => Multiplicity::parse(Some(label)),
                None => end_from_navigation(source_field.as_ref()),
            };
            let cardinality = Cardinality::from_ends(source_end, target_end);

            let owner = match cardinality {
                Cardinality::OneToMany => &edge.target,
                Cardinality::ManyToOne | Cardinality::ManyToMany => &edge.source,
                Cardinality::OneToOne => match (&source_field, &target_field) {
                    (Some(s), Some(t)) if t.line < s.line => &edge.target,
                    (None, Some(_)) => &edge.target,
                    _ => &edge.source,
                },
            };
            debug!(
                source = %edge.source,
                target = %edge.target,
                cardinality = %cardinality,
                owner = %owner,
                "Resolved relationship"
            );

            plans.push(EdgePlan {
                edge: ResolvedEdge {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    kind: edge.kind,
                    cardinality,
                    owner: owner.clone(),
                    cascade_delete: edge.cascade_delete,
                    implied: false,
                    label: edge.label.clone(),
                    line: edge.line,
                },
                source_field,
                target_field,
            });
        }

        plans.extend(implied_edges(model, &mut claimed));
        Ok(plans)
    }

    fn attach_state_machines(&self, diagram: &Diagram, model: &mut Model) {
        for block in diagram.state_blocks() {
            let Some((class_name, enum_name)) = match_state_block(block, model) else {
                let message = match &block.name {
                    Some(name) => format!("state diagram '{}' matches no class and was dropped", name),
                    None => "unnamed state diagram matches no single class with a status attribute and was dropped".to_string(),
                };
                push_warning(model, Some(block.line), message);
                continue;
            };
            let Some(mut machine) = StateMachine::from_block(block, enum_name.as_str()) else {
                push_warning(model, Some(block.line), "state diagram has no states".to_string());
                continue;
            };
            machine.embedded_enum = !model.class(&enum_name).is_some_and(|e| e.is_enumeration());

            let Some(class) = model.classes.get_mut(&class_name) else {
                continue;
            };
            if class.state_machine.is_some() {
                let message = format!(
                    "'{}' already has a state machine; the block at line {} was ignored",
                    class_name, block.line
                );
                push_warning(model, Some(block.line), message);
                continue;
            }
            if let Some(pos) = class
                .class
                .attributes
                .iter()
                .position(|a| is_state_attribute(a, &enum_name))
            {
                let attribute = class.class.attributes.remove(pos);
                machine.field_name = attribute.name;
            }
            debug!(
                class = %class_name,
                enum_name = %machine.enum_name,
                states = machine.states.len(),
                transitions = machine.transitions.len(),
                "Attached state machine"
            );
            class.state_machine = Some(machine);
        }
    }

    fn attach_behaviors(&self, diagram: &Diagram, model: &mut Model) {
        for candidate in diagram.behaviors() {
            let Some(name) = find_class(model, &candidate.target) else {
                debug!(target = %candidate.target, "Behavior target is not a declared class");
                continue;
            };
            let Some(class) = model.classes.get_mut(&name) else {
                continue;
            };
            match class
                .behaviors
                .iter_mut()
                .find(|m| m.name == candidate.method.name)
            {
                Some(existing) => {
                    for line in &candidate.method.logic {
                        if !existing.logic.contains(line) {
                            existing.logic.push(line.clone());
                        }
                    }
                    if existing.parameters.is_empty() {
                        existing.parameters = candidate.method.parameters.clone();
                    }
                }
                None => class.behaviors.push(candidate.method.clone()),
            }
        }
    }
}

fn push_warning(model: &mut Model, line: Option<usize>, message: String) {
    warn!(line, "{}", message);
    model.warnings.push(Warning::new(line, message));
}

fn end_from_navigation(navigation: Option<&NavRef>) -> Multiplicity {
    match navigation {
        Some(nav) if nav.collection => Multiplicity::Many,
        _ => Multiplicity::One,
    }
}

/// First unclaimed navigation attribute of `class` pointing at `target`
fn claim_navigation(
    model: &Model,
    claimed: &mut HashSet<(String, String)>,
    class: &str,
    target: &str,
) -> Option<NavRef> {
    let attribute = model.class(class)?.class.attributes.iter().find(|a| {
        a.is_relationship
            && a.target.as_deref() == Some(target)
            && !claimed.contains(&(class.to_string(), a.name.clone()))
    })?;
    claimed.insert((class.to_string(), attribute.name.clone()));
    Some(NavRef::from_attribute(attribute))
}

/// Edges implied by navigation attributes no relationship line claimed
fn implied_edges(model: &Model, claimed: &mut HashSet<(String, String)>) -> Vec<EdgePlan> {
    let mut plans = Vec::new();
    for class in model.classes() {
        for attribute in &class.class.attributes {
            let Some(target) = attribute.target.as_deref() else {
                continue;
            };
            let key = (class.name().to_string(), attribute.name.clone());
            if !attribute.is_relationship || claimed.contains(&key) {
                continue;
            }
            claimed.insert(key);
            let source_field = NavRef::from_attribute(attribute);
            let target_field = if target == class.name() {
                None
            } else {
                claim_navigation(model, claimed, target, class.name())
            };

            let (cardinality, owner) =
                match (source_field.collection, target_field.as_ref().map(|t| t.collection)) {
                    (false, None) | (false, Some(true)) => (Cardinality::ManyToOne, class.name()),
                    (true, None) | (true, Some(false)) => (Cardinality::OneToMany, target),
                    (false, Some(false)) => (Cardinality::OneToOne, class.name()),
                    (true, Some(true)) => (Cardinality::ManyToMany, class.name()),
                };
            debug!(
                source = %class.name(),
                target,
                cardinality = %cardinality,
                "Implied relationship from navigation attribute"
            );
            plans.push(EdgePlan {
                edge: ResolvedEdge {
                    source: class.name().to_string(),
                    target: target.to_string(),
                    kind: RelationshipKind::Association,
                    cardinality,
                    owner: owner.to_string(),
                    cascade_delete: false,
                    implied: true,
                    label: None,
                    line: attribute.line,
                },
                source_field: Some(source_field),
                target_field,
            });
        }
    }
    plans
}

/// Give the owning side a descriptor, and the inverse side one when it
/// declared a navigation attribute
fn attach_descriptors(plans: &[EdgePlan], model: &mut Model) {
    for plan in plans {
        let edge = &plan.edge;
        let owner_is_source = match edge.cardinality {
            Cardinality::OneToMany => false,
            Cardinality::ManyToOne | Cardinality::ManyToMany => true,
            Cardinality::OneToOne => edge.owner == edge.source,
        };
        let (owner, owner_nav, other, other_nav, owner_cardinality) = if owner_is_source {
            (&edge.source, &plan.source_field, &edge.target, &plan.target_field, edge.cardinality)
        } else {
            (
                &edge.target,
                &plan.target_field,
                &edge.source,
                &plan.source_field,
                edge.cardinality.inverse(),
            )
        };

        let Some(owner_class) = model.classes.get_mut(owner) else {
            continue;
        };
        let field_name = match owner_nav {
            Some(nav) => nav.name.clone(),
            None => unique_field_name(
                owner_class,
                &default_field_name(other, owner_cardinality.is_collection()),
            ),
        };
        let join_column = matches!(
            owner_cardinality,
            Cardinality::ManyToOne | Cardinality::OneToOne
        )
        .then(|| format!("{}_id", snake_case(&field_name)));
        let join_table = (owner_cardinality == Cardinality::ManyToMany)
            .then(|| format!("{}_{}", snake_case(owner), snake_case(other)));

        owner_class.relationships.push(RelationshipDescriptor {
            field_name: field_name.clone(),
            target: other.clone(),
            cardinality: owner_cardinality,
            owner: true,
            mapped_by: None,
            inversed_by: other_nav.as_ref().map(|nav| nav.name.clone()),
            join_column,
            join_table,
            cascade_delete: edge.cascade_delete,
        });

        if let Some(nav) = other_nav {
            if let Some(other_class) = model.classes.get_mut(other) {
                other_class.relationships.push(RelationshipDescriptor {
                    field_name: nav.name.clone(),
                    target: owner.clone(),
                    cardinality: owner_cardinality.inverse(),
                    owner: false,
                    mapped_by: Some(field_name),
                    inversed_by: None,
                    join_column: None,
                    join_table: None,
                    cascade_delete: edge.cascade_delete,
                });
            }
        }
    }
}

/// `customer` for a single reference, `orders` for a collection
fn default_field_name(target: &str, collection: bool) -> String {
    let base = camel_case(target);
    if collection {
        pluralize(&base)
    } else {
        base
    }
}

fn unique_field_name(class: &EnhancedClass, base: &str) -> String {
    let taken = |name: &str| {
        class.fields().any(|a| a.name == name) || class.relationships.iter().any(|r| r.field_name == name)
    };
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Declared class named `name`, exact match first, then case-insensitive
fn find_class(model: &Model, name: &str) -> Option<String> {
    if model.class(name).is_some_and(|c| !c.is_enumeration()) {
        return Some(name.to_string());
    }
    model
        .classes()
        .find(|c| !c.is_enumeration() && c.name().eq_ignore_ascii_case(name))
        .map(|c| c.name().to_string())
}

fn is_state_attribute(attribute: &AttributeNode, enum_name: &str) -> bool {
    attribute.type_name == enum_name
        || attribute.name.eq_ignore_ascii_case("status")
        || attribute.name.eq_ignore_ascii_case("state")
}

/// Enum naming the states of `class`: the declared enumeration its status
/// attribute uses, else `<Class>Status`
fn enum_name_for(class: &EnhancedClass, model: &Model) -> String {
    let declared_enum = |type_name: &str| model.class(type_name).is_some_and(|c| c.is_enumeration());
    let by_name = class.class.attributes.iter().find(|a| {
        (a.name.eq_ignore_ascii_case("status") || a.name.eq_ignore_ascii_case("state"))
            && declared_enum(&a.type_name)
    });
    let by_type = class.class.attributes.iter().find(|a| {
        let lower = a.type_name.to_lowercase();
        declared_enum(&a.type_name) && (lower.ends_with("status") || lower.ends_with("state"))
    });
    by_name
        .or(by_type)
        .map(|a| a.type_name.clone())
        .unwrap_or_else(|| format!("{}Status", class.name()))
}

/// Owning class and enum name for a state block
fn match_state_block(block: &StateBlock, model: &Model) -> Option<(String, String)> {
    let entities = || model.classes().filter(|c| !c.is_enumeration());

    let Some(name) = block.name.as_deref() else {
        let mut candidates = entities().filter(|c| {
            c.class.attributes.iter().any(|a| {
                a.name.eq_ignore_ascii_case("status") || a.name.eq_ignore_ascii_case("state")
            })
        });
        let class = candidates.next()?;
        if candidates.next().is_some() {
            return None;
        }
        return Some((class.name().to_string(), enum_name_for(class, model)));
    };

    if let Some(class) = entities().find(|c| c.name().eq_ignore_ascii_case(name)) {
        return Some((class.name().to_string(), enum_name_for(class, model)));
    }

    let lower = name.to_lowercase();
    if let Some(class) = entities().find(|c| {
        let class_lower = c.name().to_lowercase();
        lower == format!("{}status", class_lower) || lower == format!("{}state", class_lower)
    }) {
        let enum_name = model
            .classes()
            .find(|c| c.is_enumeration() && c.name().eq_ignore_ascii_case(name))
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| format!("{}Status", class.name()));
        return Some((class.name().to_string(), enum_name));
    }

    let enumeration = model
        .classes()
        .find(|c| c.is_enumeration() && c.name().eq_ignore_ascii_case(name))?;
    let owner = entities().find(|c| {
        c.class
            .attributes
            .iter()
            .any(|a| a.type_name == enumeration.name())
    })?;
    Some((owner.name().to_string(), enumeration.name().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::Orchestrator;

    fn build(input: &str) -> Model {
        let diagram = Orchestrator::with_all_plugins().parse(input).unwrap();
        ModelBuilder::new().build(&diagram).unwrap()
    }

    #[test]
    fn test_one_to_many_cardinality_and_ownership() {
        let model = build(
            r#"classDiagram
    class User {
        +String name
    }
    class Order {
        +Float total
    }
    User "1" -- "*" Order"#,
        );
        let edge = &model.edges[0];
        assert_eq!(edge.cardinality_for("User"), Some(Cardinality::OneToMany));
        assert_eq!(edge.cardinality_for("Order"), Some(Cardinality::ManyToOne));
        assert_eq!(edge.owner(), "Order");

        let order = model.class("Order").unwrap();
        assert_eq!(order.relationships.len(), 1);
        let user_ref = &order.relationships[0];
        assert_eq!(user_ref.field_name, "user");
        assert_eq!(user_ref.cardinality, Cardinality::ManyToOne);
        assert_eq!(user_ref.join_column.as_deref(), Some("user_id"));
        // No navigation declared on User, so no inverse descriptor
        assert!(model.class("User").unwrap().relationships.is_empty());
    }

    #[test]
    fn test_bidirectional_navigation_gets_inverse_descriptor() {
        let model = build(
            r#"classDiagram
    class User {
        +List~Order~ orders
    }
    class Order
    User "1" --> "*" Order"#,
        );
        let user = model.class("User").unwrap();
        assert_eq!(user.relationships.len(), 1);
        assert_eq!(user.relationships[0].field_name, "orders");
        assert_eq!(user.relationships[0].cardinality, Cardinality::OneToMany);
        assert!(!user.relationships[0].owner);
        assert_eq!(user.relationships[0].mapped_by.as_deref(), Some("user"));
        assert_eq!(user.fields().count(), 0);
    }

    #[test]
    fn test_many_to_many_join_table() {
        let model = build("classDiagram\n class Student\n class Course\n Student \"*\" -- \"*\" Course");
        let student = model.class("Student").unwrap();
        assert_eq!(student.relationships[0].cardinality, Cardinality::ManyToMany);
        assert_eq!(student.relationships[0].join_table.as_deref(), Some("student_course"));
        assert_eq!(student.relationships[0].field_name, "courses");
    }

    #[test]
    fn test_one_to_one_owned_by_first_declarer() {
        let model = build(
            r#"classDiagram
    class Passport {
        +Person holder
    }
    class Person {
        +Passport passport
    }
    Person "1" -- "1" Passport"#,
        );
        let edge = &model.edges[0];
        assert_eq!(edge.cardinality, Cardinality::OneToOne);
        assert_eq!(edge.owner(), "Passport");
        let passport = model.class("Passport").unwrap();
        assert!(passport.relationships[0].owner);
        assert_eq!(passport.relationships[0].field_name, "holder");
        let person = model.class("Person").unwrap();
        assert_eq!(person.relationships[0].mapped_by.as_deref(), Some("holder"));
    }

    #[test]
    fn test_implied_edge_from_navigation_attribute() {
        let model = build("classDiagram\n class Customer\n class Invoice {\n +Customer customer\n }");
        assert_eq!(model.edges.len(), 1);
        assert!(model.edges[0].implied);
        assert_eq!(model.edges[0].cardinality, Cardinality::ManyToOne);
        assert_eq!(model.edges[0].owner(), "Invoice");
    }

    #[test]
    fn test_undeclared_class_lenient_and_strict() {
        let input = "classDiagram\n class User\n User --> Ghost";
        let model = build(input);
        assert!(model.edges.is_empty());
        assert_eq!(model.warnings.len(), 1);
        assert_eq!(model.warnings[0].line, Some(3));

        let diagram = Orchestrator::with_all_plugins().parse(input).unwrap();
        let err = ModelBuilder::new()
            .with_strictness(RelationshipStrictness::Strict)
            .build(&diagram)
            .unwrap_err();
        assert!(matches!(err, UmlGenError::UnresolvedRelationship { line: 3, .. }));
    }

    #[test]
    fn test_state_machine_attached_by_name() {
        let model = build(
            r#"classDiagram
    class Post {
        +String title
        +PostStatus status
    }

stateDiagram-v2
    state Post {
        [*] --> Draft
        Draft --> Published : publish
    }"#,
        );
        let post = model.class("Post").unwrap();
        assert!(post.is_stateful());
        let machine = post.state_machine.as_ref().unwrap();
        assert_eq!(machine.initial, "Draft");
        assert_eq!(machine.enum_name, "PostStatus");
        assert_eq!(machine.field_name, "status");
        assert!(machine.embedded_enum);
        assert_eq!(machine.transitions.len(), 1);
        // The status attribute is absorbed
        assert_eq!(post.fields().count(), 1);
    }

    #[test]
    fn test_unnamed_state_block_attaches_to_single_status_class() {
        let model = build(
            r#"classDiagram
    class Ticket {
        +String status
    }
    class Agent

stateDiagram-v2
    [*] --> Open
    Open --> Closed : close"#,
        );
        assert!(model.class("Ticket").unwrap().is_stateful());
        assert!(!model.class("Agent").unwrap().is_stateful());
    }

    #[test]
    fn test_unmatched_state_block_is_warned() {
        let model = build("classDiagram\n class A\n class B\n\nstateDiagram-v2\n [*] --> On");
        assert!(model.classes().all(|c| !c.is_stateful()));
        assert_eq!(model.warnings.len(), 1);
    }

    #[test]
    fn test_behaviors_are_merged_by_name() {
        let model = build(
            r#"classDiagram
    class Order

sequenceDiagram
    Client->>Order: place(items)
    Note over Order: validate items
    Client->>Order: place(items)
    Note over Order: reserve stock
    Client->>Ghost: haunt()"#,
        );
        let order = model.class("Order").unwrap();
        assert_eq!(order.behaviors.len(), 1);
        assert_eq!(order.behaviors[0].logic, vec!["validate items", "reserve stock"]);
    }

    #[test]
    fn test_generalizations() {
        let model = build(
            r#"classDiagram
    class Payable
    <<interface>> Payable
    class Document
    class Invoice
    Document <|-- Invoice
    Payable <|.. Invoice"#,
        );
        let invoice = &model.class("Invoice").unwrap().class;
        assert_eq!(invoice.superclass.as_deref(), Some("Document"));
        assert_eq!(invoice.interfaces, vec!["Payable"]);
    }
}
