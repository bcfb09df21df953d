//! Class diagram parser
//!
//! Parses class diagram syntax into the shared diagram store. Class bodies
//! are tracked line by line; relationship lines go through a chumsky parser.

use chumsky::prelude::*;
use tracing::{debug, span, trace, Level};

use crate::core::chumsky_utils::{
    colon_label, identifier, inline_whitespace, parse_statement, quoted_string, strip_comment,
    Extra,
};
use crate::core::{
    normalize_generics, AttributeNode, ClassNode, Database, Diagram, Generalization, MethodNode,
    Parameter, Parser as CoreParser, RelationshipEdge, RelationshipKind, Result, UmlGenError,
    Visibility,
};

/// Relationship marker between two class names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `--`
    Link,
    /// `..`
    DashedLink,
    /// `-->`
    AssociationTo,
    /// `<--`
    AssociationFrom,
    /// `..>`
    DependencyTo,
    /// `<..`
    DependencyFrom,
    /// `*--`, whole on the left
    CompositionFrom,
    /// `--*`, whole on the right
    CompositionTo,
    /// `o--`
    AggregationFrom,
    /// `--o`
    AggregationTo,
    /// `<|--`, parent on the left
    InheritanceFrom,
    /// `--|>`
    InheritanceTo,
    /// `<|..`
    RealizationFrom,
    /// `..|>`
    RealizationTo,
}

/// A parsed relationship line: `A "1" --> "*" B : label`
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRelationship {
    pub left: String,
    pub left_multiplicity: Option<String>,
    pub marker: Marker,
    pub right_multiplicity: Option<String>,
    pub right: String,
    pub label: Option<String>,
}

/// A parsed class body member
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Attribute(AttributeNode),
    Method(MethodNode),
}

/// Keywords that may appear in class diagrams but carry nothing for code generation
const IGNORED_KEYWORDS: &[&str] = &[
    "note", "direction", "style", "classdef", "cssclass", "click", "link", "callback",
    "namespace", "title", "accTitle", "accDescr",
];

/// Class diagram parser
pub struct ClassParser;

impl ClassParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a class reference, dropping any `~T~` generic suffix
    fn class_ref<'src>() -> impl chumsky::Parser<'src, &'src str, String, Extra<'src>> + Clone {
        identifier().then_ignore(
            just('~')
                .then(none_of('~').repeated())
                .then(just('~'))
                .or_not(),
        )
    }

    fn marker<'src>() -> impl chumsky::Parser<'src, &'src str, Marker, Extra<'src>> + Clone {
        // Longest markers first so `--` never shadows `-->`
        choice((
            just("<|--").to(Marker::InheritanceFrom),
            just("<|..").to(Marker::RealizationFrom),
            just("--|>").to(Marker::InheritanceTo),
            just("..|>").to(Marker::RealizationTo),
            just("*--").to(Marker::CompositionFrom),
            just("o--").to(Marker::AggregationFrom),
            just("--*").to(Marker::CompositionTo),
            just("--o").to(Marker::AggregationTo),
            just("-->").to(Marker::AssociationTo),
            just("<--").to(Marker::AssociationFrom),
            just("..>").to(Marker::DependencyTo),
            just("<..").to(Marker::DependencyFrom),
            just("--").to(Marker::Link),
            just("..").to(Marker::DashedLink),
        ))
    }

    fn relationship_parser<'src>(
    ) -> impl chumsky::Parser<'src, &'src str, ParsedRelationship, Extra<'src>> + Clone {
        let ws = inline_whitespace();
        let multiplicity = quoted_string().then_ignore(ws.clone()).or_not();

        Self::class_ref()
            .then_ignore(ws.clone())
            .then(multiplicity.clone())
            .then(Self::marker())
            .then_ignore(ws.clone())
            .then(multiplicity)
            .then(Self::class_ref())
            .then_ignore(ws)
            .then(colon_label().or_not())
            .map(
                |(((((left, left_multiplicity), marker), right_multiplicity), right), label)| {
                    ParsedRelationship {
                        left,
                        left_multiplicity,
                        marker,
                        right_multiplicity,
                        right,
                        label: label.filter(|l| !l.is_empty()),
                    }
                },
            )
    }

    /// Parse a relationship line
    pub fn parse_relationship(&self, line: &str) -> Option<ParsedRelationship> {
        parse_statement(Self::relationship_parser(), line).ok()
    }

    /// Parse a class body member: `+Type name`, `+name: Type`, `+name(params): Return`
    pub fn parse_member(&self, text: &str) -> Option<Member> {
        let mut rest = text.trim();
        let mut visibility = Visibility::Public;
        if let Some(v) = rest.chars().next().and_then(Visibility::from_char) {
            visibility = v;
            rest = rest[1..].trim_start();
        }

        let (cleaned, markers) = extract_markers(rest);
        let unique = markers.iter().any(|m| m == "unique");
        let mut nullable = markers.iter().any(|m| m == "nullable" || m == "optional");
        let mut identifier = markers.iter().any(|m| m == "id" || m == "pk");

        let mut rest = normalize_generics(cleaned.trim());
        let mut is_static = false;
        let mut is_abstract = false;
        loop {
            if let Some(stripped) = rest.strip_suffix('$') {
                is_static = true;
                rest = stripped.trim_end().to_string();
            } else if let Some(stripped) = rest.strip_suffix('*') {
                is_abstract = true;
                rest = stripped.trim_end().to_string();
            } else {
                break;
            }
        }
        if rest.is_empty() {
            return None;
        }

        if let Some(open) = rest.find('(') {
            let close = rest.rfind(')')?;
            if close < open {
                return None;
            }
            let head = rest[..open].trim();
            let (name, leading_return) = match head.rsplit_once(char::is_whitespace) {
                Some((ret, name)) => (name.trim(), Some(ret.trim())),
                None => (head, None),
            };
            if name.is_empty() {
                return None;
            }
            let mut tail = rest[close + 1..].trim();
            loop {
                if let Some(t) = tail.strip_prefix('$') {
                    is_static = true;
                    tail = t.trim_start();
                } else if let Some(t) = tail.strip_prefix('*') {
                    is_abstract = true;
                    tail = t.trim_start();
                } else {
                    break;
                }
            }
            let tail = tail.strip_prefix(':').map(str::trim).unwrap_or(tail);
            let return_type = if !tail.is_empty() {
                tail
            } else {
                leading_return.unwrap_or("void")
            };

            let mut method = MethodNode::new(name, return_type)
                .with_parameters(Parameter::parse_list(&rest[open + 1..close]));
            method.visibility = visibility;
            method.is_static = is_static;
            method.is_abstract = is_abstract;
            return Some(Member::Method(method));
        }

        let (name, type_name) = match rest.split_once(':') {
            Some((name, ty)) => (name.trim(), ty.trim()),
            None => match rest.rsplit_once(char::is_whitespace) {
                Some((ty, name)) => (name.trim(), ty.trim()),
                None => (rest.as_str(), "String"),
            },
        };
        let (name, optional_name) = match name.strip_suffix('?') {
            Some(n) => (n, true),
            None => (name, false),
        };
        let (type_name, optional_type) = match type_name.strip_suffix('?') {
            Some(t) => (t.trim(), true),
            None => (type_name, false),
        };
        if name.is_empty() || type_name.is_empty() {
            return None;
        }
        nullable |= optional_name || optional_type;
        identifier |= name == "id";

        let mut attribute = AttributeNode::new(name, type_name);
        attribute.visibility = visibility;
        attribute.nullable = nullable;
        attribute.unique = unique || identifier;
        attribute.identifier = identifier;
        Some(Member::Attribute(attribute))
    }

    /// Check if a line is a header line
    fn is_header_line(&self, line: &str) -> bool {
        line.to_lowercase().starts_with("classdiagram")
    }

    /// Split a class declaration into the class and the text after `{`, if any
    fn parse_declaration<'a>(&self, rest: &'a str, enumeration: bool) -> Option<(ClassNode, Option<&'a str>)> {
        let rest = rest.trim();
        let name_end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        if name.is_empty() {
            return None;
        }
        let mut class = ClassNode::new(name);
        class.is_enumeration = enumeration;

        let remainder = &rest[name_end..];
        let (header, body) = match remainder.find('{') {
            Some(pos) => (&remainder[..pos], Some(&remainder[pos + 1..])),
            None => (remainder, None),
        };
        for stereotype in stereotypes(header) {
            class.apply_stereotype(stereotype);
        }
        Some((class, body))
    }

    /// Apply one `;`-separated chunk of a class body
    fn body_member(&self, class: &mut ClassNode, text: &str, line: usize) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if text.starts_with("<<") {
            for stereotype in stereotypes(text) {
                class.apply_stereotype(stereotype);
            }
            return;
        }
        if class.is_enumeration {
            for literal in text.split(',') {
                let literal = literal.trim().trim_start_matches(['+', '-', '#', '~']).trim();
                if !literal.is_empty() && !class.literals.iter().any(|l| l == literal) {
                    class.literals.push(literal.to_string());
                }
            }
            return;
        }
        match self.parse_member(text) {
            Some(Member::Attribute(mut attribute)) => {
                attribute.line = line;
                class.attributes.push(attribute);
            }
            Some(Member::Method(mut method)) => {
                method.line = line;
                class.methods.push(method);
            }
            None => trace!(line, text, "Skipping unparseable member"),
        }
    }

    fn apply_relationship(
        &self,
        relationship: ParsedRelationship,
        line: usize,
        diagram: &mut Diagram,
    ) -> Result<()> {
        let ParsedRelationship {
            left,
            left_multiplicity,
            marker,
            right_multiplicity,
            right,
            label,
        } = relationship;

        let generalization = |child: String, parent: String, realization: bool| Generalization {
            child,
            parent,
            realization,
            line,
        };
        let (kind, reversed) = match marker {
            Marker::InheritanceFrom => {
                diagram.add_generalization(generalization(right, left, false));
                return Ok(());
            }
            Marker::InheritanceTo => {
                diagram.add_generalization(generalization(left, right, false));
                return Ok(());
            }
            Marker::RealizationFrom => {
                diagram.add_generalization(generalization(right, left, true));
                return Ok(());
            }
            Marker::RealizationTo => {
                diagram.add_generalization(generalization(left, right, true));
                return Ok(());
            }
            Marker::DependencyTo | Marker::DependencyFrom => {
                debug!(line, left = %left, right = %right, "Ignoring dependency");
                return Ok(());
            }
            Marker::Link | Marker::DashedLink | Marker::AssociationTo => {
                (RelationshipKind::Association, false)
            }
            Marker::AssociationFrom => (RelationshipKind::Association, true),
            Marker::CompositionFrom => (RelationshipKind::Composition, false),
            Marker::CompositionTo => (RelationshipKind::Composition, true),
            Marker::AggregationFrom => (RelationshipKind::Aggregation, false),
            Marker::AggregationTo => (RelationshipKind::Aggregation, true),
        };

        let (source, source_multiplicity, target, target_multiplicity) = if reversed {
            (right, right_multiplicity, left, left_multiplicity)
        } else {
            (left, left_multiplicity, right, right_multiplicity)
        };
        let mut edge = RelationshipEdge::new(source, target, kind)
            .with_multiplicities(source_multiplicity, target_multiplicity);
        if label
            .as_deref()
            .is_some_and(|l| l.to_lowercase().contains("cascade"))
        {
            edge.cascade_delete = true;
        }
        edge.label = label;
        edge.line = line;
        diagram.add_edge(edge)
    }
}

/// Find the `}` closing a class body, skipping `{unique}`-style markers
fn find_body_close(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' if depth > 0 => depth -= 1,
            '}' => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Remove `{marker}` annotations, returning the text and lowercased markers
fn extract_markers(text: &str) -> (String, Vec<String>) {
    let mut cleaned = String::with_capacity(text.len());
    let mut markers = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        cleaned.push_str(&rest[..open]);
        for marker in rest[open + 1..open + close].split(',') {
            markers.push(marker.trim().to_lowercase());
        }
        rest = &rest[open + close + 1..];
    }
    cleaned.push_str(rest);
    (cleaned, markers)
}

/// All `<<name>>` stereotypes in a piece of text
fn stereotypes(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("<<") {
        let Some(close) = rest[open + 2..].find(">>") else {
            break;
        };
        found.push(rest[open + 2..open + 2 + close].trim());
        rest = &rest[open + 2 + close + 2..];
    }
    found
}

impl Default for ClassParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreParser<Diagram> for ClassParser {
    fn parse(&self, input: &str, diagram: &mut Diagram) -> Result<()> {
        let parse_span = span!(Level::DEBUG, "parse_class", input_len = input.len());
        let _enter = parse_span.enter();

        let mut open: Option<(ClassNode, usize)> = None;

        for (idx, raw) in input.lines().enumerate() {
            let line_no = idx + 1;
            let line = strip_comment(raw);
            if line.is_empty() || self.is_header_line(line) {
                continue;
            }
            let doc_line = diagram.line(line_no);

            // Inside a class body
            if let Some((class, _)) = open.as_mut() {
                let (body, closes) = match find_body_close(line) {
                    Some(pos) => (&line[..pos], true),
                    None => (line, false),
                };
                for chunk in body.split(';') {
                    self.body_member(class, chunk, doc_line);
                }
                if closes {
                    if let Some((class, _)) = open.take() {
                        trace!(class = %class.name, "Closed class body");
                        diagram.add_node(class)?;
                    }
                }
                continue;
            }

            let lower = line.to_lowercase();
            let declaration = if let Some(rest) = line.strip_prefix("class ") {
                Some((rest, false))
            } else {
                line.strip_prefix("enum ").map(|rest| (rest, true))
            };
            if let Some((rest, enumeration)) = declaration {
                let Some((mut class, body)) = self.parse_declaration(rest, enumeration) else {
                    diagram.warn(line_no, format!("class declaration without a name: '{}'", line));
                    continue;
                };
                class.line = doc_line;
                match body {
                    None => diagram.add_node(class)?,
                    Some(body) => match find_body_close(body) {
                        Some(pos) => {
                            for chunk in body[..pos].split(';') {
                                self.body_member(&mut class, chunk, doc_line);
                            }
                            diagram.add_node(class)?;
                        }
                        None => {
                            for chunk in body.split(';') {
                                self.body_member(&mut class, chunk, doc_line);
                            }
                            open = Some((class, line_no));
                        }
                    },
                }
                continue;
            }

            // `<<interface>> Shape`
            if line.starts_with("<<") {
                if let Some(close) = line.find(">>") {
                    let name = line[close + 2..].trim();
                    if !name.is_empty() {
                        let class = diagram.get_or_create_class(name, doc_line);
                        class.apply_stereotype(&line[2..close]);
                        continue;
                    }
                }
            }

            if let Some(relationship) = self.parse_relationship(line) {
                self.apply_relationship(relationship, doc_line, diagram)?;
                continue;
            }

            // `User : +String name`
            if let Some((name, member)) = line.split_once(':') {
                let name = name.trim();
                if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    let mut class = ClassNode::new(name);
                    class.line = doc_line;
                    self.body_member(&mut class, member, doc_line);
                    diagram.add_node(class)?;
                    continue;
                }
            }

            let keyword = lower.split_whitespace().next().unwrap_or_default();
            if IGNORED_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(keyword)) || line == "}" {
                trace!(line = doc_line, "Ignoring presentation statement");
                continue;
            }
            diagram.warn(line_no, format!("unrecognised class diagram line skipped: '{}'", line));
        }

        if let Some((class, opened_at)) = open {
            return Err(UmlGenError::syntax(
                diagram.line(opened_at),
                format!("unterminated class body for '{}'", class.name),
            ));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "class"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn can_parse(&self, input: &str) -> bool {
        let lower = input.to_lowercase();
        lower.contains("classdiagram") || lower.contains("class ")
    }
}
