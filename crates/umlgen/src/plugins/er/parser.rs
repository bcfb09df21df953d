//! Entity-relationship diagram parser
//!
//! Entities become classes and crow's-foot relationships become
//! associations or compositions with one/many multiplicities.

use chumsky::prelude::*;
use tracing::{span, trace, Level};

use crate::core::chumsky_utils::{
    colon_label, inline_whitespace, parse_statement, strip_comment, Extra,
};
use crate::core::{
    camel_case, pascal_case, AttributeNode, ClassNode, Database, Diagram, Parser as CoreParser,
    RelationshipEdge, RelationshipKind, Result, UmlGenError,
};

/// One end of a crow's-foot relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErCardinality {
    ZeroOrOne,
    ExactlyOne,
    ZeroOrMore,
    OneOrMore,
}

impl ErCardinality {
    /// Multiplicity label understood by the model builder
    pub fn multiplicity(&self) -> &'static str {
        match self {
            ErCardinality::ZeroOrOne => "0..1",
            ErCardinality::ExactlyOne => "1",
            ErCardinality::ZeroOrMore => "0..*",
            ErCardinality::OneOrMore => "1..*",
        }
    }
}

/// A parsed `A ||--o{ B : label` line
#[derive(Debug, Clone, PartialEq)]
pub struct ErRelationship {
    pub left: String,
    pub left_cardinality: ErCardinality,
    pub identifying: bool,
    pub right_cardinality: ErCardinality,
    pub right: String,
    pub label: Option<String>,
}

/// Key markers on an entity attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Keys {
    primary: bool,
    unique: bool,
    foreign: bool,
}

/// Entity-relationship diagram parser
pub struct ErParser;

impl ErParser {
    pub fn new() -> Self {
        Self
    }

    fn entity_name<'src>() -> impl chumsky::Parser<'src, &'src str, String, Extra<'src>> + Clone {
        any()
            .filter(|c: &char| c.is_alphanumeric() || *c == '_' || *c == '-')
            .repeated()
            .at_least(1)
            .collect::<String>()
    }

    fn relationship_parser<'src>(
    ) -> impl chumsky::Parser<'src, &'src str, ErRelationship, Extra<'src>> + Clone {
        let ws = inline_whitespace();
        let left = choice((
            just("|o").to(ErCardinality::ZeroOrOne),
            just("||").to(ErCardinality::ExactlyOne),
            just("}o").to(ErCardinality::ZeroOrMore),
            just("}|").to(ErCardinality::OneOrMore),
        ));
        let right = choice((
            just("o|").to(ErCardinality::ZeroOrOne),
            just("||").to(ErCardinality::ExactlyOne),
            just("o{").to(ErCardinality::ZeroOrMore),
            just("|{").to(ErCardinality::OneOrMore),
        ));
        let line = choice((just("--").to(true), just("..").to(false)));

        Self::entity_name()
            .then_ignore(ws.clone())
            .then(left)
            .then(line)
            .then(right)
            .then_ignore(ws.clone())
            .then(Self::entity_name())
            .then_ignore(ws)
            .then(colon_label().or_not())
            .map(
                |(((((left, left_cardinality), identifying), right_cardinality), right), label)| {
                    ErRelationship {
                        left,
                        left_cardinality,
                        identifying,
                        right_cardinality,
                        right,
                        label: label
                            .map(|l| l.trim_matches('"').to_string())
                            .filter(|l| !l.is_empty()),
                    }
                },
            )
    }

    pub fn parse_relationship(&self, line: &str) -> Option<ErRelationship> {
        parse_statement(Self::relationship_parser(), line).ok()
    }

    /// Parse `type name [PK|UK|FK[, ...]] ["comment"]`
    fn parse_attribute(&self, line: &str) -> Option<(AttributeNode, Keys)> {
        let without_comment = match line.find('"') {
            Some(pos) => line[..pos].trim(),
            None => line,
        };
        let mut tokens = without_comment.split_whitespace();
        let raw_type = tokens.next()?;
        let name = tokens.next()?;
        let mut keys = Keys::default();
        for token in tokens.flat_map(|t| t.split(',')) {
            match token.trim().to_ascii_uppercase().as_str() {
                "PK" => keys.primary = true,
                "UK" => keys.unique = true,
                "FK" => keys.foreign = true,
                _ => {}
            }
        }
        let type_name = match raw_type.find('(') {
            Some(pos) => &raw_type[..pos],
            None => raw_type,
        };
        let mut attribute = AttributeNode::new(camel_case(name), type_name);
        attribute.identifier = keys.primary;
        attribute.unique = keys.primary || keys.unique;
        Some((attribute, keys))
    }
}

impl Default for ErParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreParser<Diagram> for ErParser {
    fn parse(&self, input: &str, diagram: &mut Diagram) -> Result<()> {
        let parse_span = span!(Level::DEBUG, "parse_er", input_len = input.len());
        let _enter = parse_span.enter();

        let mut open: Option<ClassNode> = None;

        for (idx, raw) in input.lines().enumerate() {
            let line_no = idx + 1;
            let line = strip_comment(raw);
            if line.is_empty() || line.to_lowercase().starts_with("erdiagram") {
                continue;
            }

            if line == "}" {
                if let Some(entity) = open.take() {
                    diagram.add_node(entity)?;
                    continue;
                }
            }
            if let Some(entity) = open.as_mut() {
                match self.parse_attribute(line) {
                    Some((_, keys)) if keys.foreign => {
                        trace!(line = line_no, "Foreign key column left to the relationship");
                    }
                    Some((mut attribute, _)) => {
                        attribute.line = diagram.line(line_no);
                        entity.attributes.push(attribute);
                    }
                    None => diagram.warn(
                        line_no,
                        format!("unrecognised entity attribute skipped: '{}'", line),
                    ),
                }
                continue;
            }

            if let Some(head) = line.strip_suffix('{') {
                let name = head.trim();
                if !name.is_empty() && !name.contains(char::is_whitespace) {
                    let mut entity = ClassNode::new(pascal_case(name));
                    entity.line = diagram.line(line_no);
                    open = Some(entity);
                    continue;
                }
            }

            if let Some(rel) = self.parse_relationship(line) {
                let doc_line = diagram.line(line_no);
                let source = pascal_case(&rel.left);
                let target = pascal_case(&rel.right);
                diagram.get_or_create_class(&source, doc_line);
                diagram.get_or_create_class(&target, doc_line);
                let kind = if rel.identifying {
                    RelationshipKind::Composition
                } else {
                    RelationshipKind::Association
                };
                let mut edge = RelationshipEdge::new(source, target, kind).with_multiplicities(
                    Some(rel.left_cardinality.multiplicity().to_string()),
                    Some(rel.right_cardinality.multiplicity().to_string()),
                );
                edge.label = rel.label;
                edge.line = doc_line;
                diagram.add_edge(edge)?;
                continue;
            }

            // A bare entity name declares the entity
            if line.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
                let name = pascal_case(line);
                diagram.get_or_create_class(&name, diagram.line(line_no));
                continue;
            }

            diagram.warn(
                line_no,
                format!("unrecognised ER diagram line skipped: '{}'", line),
            );
        }

        if let Some(entity) = open {
            return Err(UmlGenError::syntax(
                entity.line,
                format!("unterminated entity body for '{}'", entity.name),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "er"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn can_parse(&self, input: &str) -> bool {
        input.to_lowercase().contains("erdiagram")
    }
}
