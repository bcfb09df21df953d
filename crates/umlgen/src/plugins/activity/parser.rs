//! Activity (flowchart) diagram parser
//!
//! Each flow labelled `Class.method` (by `title` or `subgraph`) documents one
//! behavioral method; its step labels become the method's logic lines.

use std::collections::{HashSet, VecDeque};

use chumsky::prelude::*;
use indexmap::IndexMap;
use tracing::{debug, span, trace, Level};

use crate::core::chumsky_utils::{
    identifier, inline_whitespace, parse_statement, strip_comment, whitespace_required, Extra,
};
use crate::core::{
    BehaviorCandidate, BehaviorSource, Diagram, MethodNode, Parser as CoreParser, Result,
    UmlGenError,
};

/// How a flow node reads as a logic line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Step,
    Decision,
    Terminal,
}

/// A node mention, with its label and shape when the mention declares them
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRef {
    pub id: String,
    pub label: Option<String>,
    pub kind: Option<NodeKind>,
}

/// A node followed by zero or more `--> node` links
#[derive(Debug, Clone, PartialEq)]
pub struct FlowStatement {
    pub first: NodeRef,
    /// Each link's guard label and target
    pub links: Vec<(Option<String>, NodeRef)>,
}

const IGNORED_KEYWORDS: &[&str] = &["classdef", "class", "style", "linkstyle", "click", "direction"];
const TERMINAL_LABELS: &[&str] = &["start", "end", "stop", "begin", "finish", "done"];

#[derive(Debug, Clone)]
struct FlowNode {
    label: String,
    kind: NodeKind,
}

/// The nodes and edges of one `Class.method` flow
#[derive(Debug)]
struct Flow {
    target: Option<String>,
    nodes: IndexMap<String, FlowNode>,
    edges: Vec<(String, String)>,
    line: usize,
}

impl Flow {
    fn new(target: Option<String>, line: usize) -> Self {
        Self {
            target,
            nodes: IndexMap::new(),
            edges: Vec::new(),
            line,
        }
    }

    fn touch(&mut self, node: &NodeRef) {
        let entry = self.nodes.entry(node.id.clone()).or_insert_with(|| FlowNode {
            label: node.id.clone(),
            kind: NodeKind::Step,
        });
        if let Some(label) = &node.label {
            entry.label = label.clone();
        }
        if let Some(kind) = node.kind {
            entry.kind = kind;
        }
        if TERMINAL_LABELS.contains(&entry.label.to_lowercase().as_str()) {
            entry.kind = NodeKind::Terminal;
        }
    }

    fn apply(&mut self, statement: &FlowStatement) {
        self.touch(&statement.first);
        let mut previous = statement.first.id.clone();
        for (_, node) in &statement.links {
            self.touch(node);
            self.edges.push((previous, node.id.clone()));
            previous = node.id.clone();
        }
    }

    /// Node labels breadth-first from the first node, then unreached nodes
    fn logic_lines(&self) -> Vec<String> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        for start in self.nodes.keys() {
            if !seen.insert(start.as_str()) {
                continue;
            }
            let mut queue = VecDeque::from([start.as_str()]);
            while let Some(id) = queue.pop_front() {
                order.push(id);
                for (from, to) in &self.edges {
                    if from == id && seen.insert(to.as_str()) {
                        queue.push_back(to.as_str());
                    }
                }
            }
        }

        order
            .into_iter()
            .filter_map(|id| self.nodes.get(id))
            .filter_map(|node| match node.kind {
                NodeKind::Terminal => None,
                NodeKind::Decision => Some(format!("if {}", node.label)),
                NodeKind::Step => Some(node.label.clone()),
            })
            .collect()
    }
}

/// Activity diagram parser
pub struct ActivityParser;

impl ActivityParser {
    pub fn new() -> Self {
        Self
    }

    fn label<'src>() -> impl chumsky::Parser<'src, &'src str, String, Extra<'src>> + Clone {
        none_of("[](){}|")
            .repeated()
            .at_least(1)
            .collect::<String>()
            .map(|s| s.trim().trim_matches('"').trim().to_string())
    }

    fn delimited<'src>(
        open: &'static str,
        close: &'static str,
        kind: NodeKind,
    ) -> impl chumsky::Parser<'src, &'src str, (String, NodeKind), Extra<'src>> + Clone {
        just(open)
            .ignore_then(Self::label())
            .then_ignore(just(close))
            .map(move |label| (label, kind))
    }

    fn shape<'src>(
    ) -> impl chumsky::Parser<'src, &'src str, (String, NodeKind), Extra<'src>> + Clone {
        // Longest delimiters first
        choice((
            Self::delimited("([", "])", NodeKind::Step),
            Self::delimited("((", "))", NodeKind::Terminal),
            Self::delimited("[[", "]]", NodeKind::Step),
            Self::delimited("[(", ")]", NodeKind::Step),
            Self::delimited("{{", "}}", NodeKind::Step),
            Self::delimited("[", "]", NodeKind::Step),
            Self::delimited("(", ")", NodeKind::Step),
            Self::delimited("{", "}", NodeKind::Decision),
            Self::delimited(">", "]", NodeKind::Step),
        ))
    }

    fn node_ref<'src>() -> impl chumsky::Parser<'src, &'src str, NodeRef, Extra<'src>> + Clone {
        identifier()
            .then(Self::shape().or_not())
            .map(|(id, shape)| match shape {
                Some((label, kind)) => NodeRef {
                    id,
                    label: Some(label),
                    kind: Some(kind),
                },
                None => NodeRef {
                    id,
                    label: None,
                    kind: None,
                },
            })
    }

    fn link<'src>(
    ) -> impl chumsky::Parser<'src, &'src str, Option<String>, Extra<'src>> + Clone {
        let ws = inline_whitespace();
        let pipe_label = just('|')
            .ignore_then(none_of("|").repeated().collect::<String>())
            .then_ignore(just('|'));
        let connector = choice((
            just("-.->"),
            just("==>"),
            just("-->"),
            just("---"),
            just("-.-"),
            just("==="),
        ));
        let plain = connector
            .ignore_then(ws.clone())
            .ignore_then(pipe_label.or_not());
        // `-- guard -->`
        let inline = just("--")
            .ignore_then(whitespace_required())
            .ignore_then(
                any()
                    .and_is(just("-->").not())
                    .repeated()
                    .at_least(1)
                    .collect::<String>(),
            )
            .then_ignore(just("-->"))
            .map(Some);

        ws.clone()
            .ignore_then(choice((plain, inline)))
            .then_ignore(ws)
            .map(|label| label.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()))
    }

    fn statement_parser<'src>(
    ) -> impl chumsky::Parser<'src, &'src str, FlowStatement, Extra<'src>> + Clone {
        Self::node_ref()
            .then(
                Self::link()
                    .then(Self::node_ref())
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .then_ignore(inline_whitespace())
            .map(|(first, links)| FlowStatement { first, links })
    }

    /// Parse a node declaration or an edge chain
    pub fn parse_flow_statement(&self, line: &str) -> Option<FlowStatement> {
        parse_statement(Self::statement_parser(), line)
            .ok()
            .filter(|s| !s.links.is_empty() || s.first.label.is_some())
    }
}

impl Default for ActivityParser {
    fn default() -> Self {
        Self::new()
    }
}

/// `Class.method` or `Class.method(args)` names a behavior
fn behavior_target(title: &str) -> Option<String> {
    let title = title.trim().trim_matches('"').trim();
    let (class, method) = title.split_once('.')?;
    let valid = !class.is_empty()
        && class.chars().all(|c| c.is_alphanumeric() || c == '_')
        && !method.trim().is_empty();
    valid.then(|| title.to_string())
}

/// Title of `subgraph Id [Title]`, `subgraph "Title"` or `subgraph Title`
fn subgraph_title(rest: &str) -> &str {
    match (rest.find('['), rest.rfind(']')) {
        (Some(open), Some(close)) if close > open => &rest[open + 1..close],
        _ => rest,
    }
}

impl CoreParser<Diagram> for ActivityParser {
    fn parse(&self, input: &str, diagram: &mut Diagram) -> Result<()> {
        let parse_span = span!(Level::DEBUG, "parse_activity", input_len = input.len());
        let _enter = parse_span.enter();

        let mut flows = vec![Flow::new(None, 1)];
        // Flow index and opening line of each open subgraph
        let mut open: Vec<(usize, usize)> = Vec::new();

        for (idx, raw) in input.lines().enumerate() {
            let line_no = idx + 1;
            let line = strip_comment(raw);
            if line.is_empty() {
                continue;
            }
            let first = line.split_whitespace().next().unwrap_or_default();
            let keyword = first.to_lowercase();
            let rest = line[first.len()..].trim();

            match keyword.as_str() {
                "flowchart" | "graph" | "activitydiagram" => continue,
                "title" => {
                    match behavior_target(rest) {
                        Some(target) => flows[0].target = Some(target),
                        None => diagram.warn(
                            line_no,
                            format!("activity title '{}' does not name Class.method", rest),
                        ),
                    }
                    continue;
                }
                "subgraph" => {
                    let current = open.last().map(|(flow, _)| *flow).unwrap_or(0);
                    let flow = match behavior_target(subgraph_title(rest)) {
                        Some(target) => {
                            flows.push(Flow::new(Some(target), line_no));
                            flows.len() - 1
                        }
                        None => current,
                    };
                    open.push((flow, line_no));
                    continue;
                }
                "end" => {
                    if open.pop().is_none() {
                        return Err(UmlGenError::syntax(
                            diagram.line(line_no),
                            "'end' without an open subgraph",
                        ));
                    }
                    continue;
                }
                k if IGNORED_KEYWORDS.contains(&k) => {
                    trace!(line = line_no, "Ignoring styling statement");
                    continue;
                }
                _ => {}
            }

            let current = open.last().map(|(flow, _)| *flow).unwrap_or(0);
            for segment in line.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                match self.parse_flow_statement(segment) {
                    Some(statement) => flows[current].apply(&statement),
                    None => diagram.warn(
                        line_no,
                        format!("unrecognised activity diagram statement skipped: '{}'", segment),
                    ),
                }
            }
        }

        if let Some((_, line)) = open.last() {
            return Err(UmlGenError::syntax(
                diagram.line(*line),
                "unterminated subgraph: missing 'end'",
            ));
        }

        for flow in flows {
            if flow.nodes.is_empty() {
                continue;
            }
            let Some(target) = flow.target.as_deref() else {
                diagram.warn(flow.line, "activity flow without a Class.method title ignored");
                continue;
            };
            let Some((class, method_text)) = target.split_once('.') else {
                continue;
            };
            let Some(mut method) = MethodNode::from_invocation(method_text, class) else {
                continue;
            };
            method.logic = flow.logic_lines();
            method.line = diagram.line(flow.line);
            debug!(class, method = %method.name, steps = method.logic.len(), "Activity behavior");
            diagram.add_behavior(BehaviorCandidate {
                target: class.to_string(),
                method,
                source: BehaviorSource::Activity,
                line: diagram.line(flow.line),
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "activity"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn can_parse(&self, input: &str) -> bool {
        let lower = input.trim_start().to_lowercase();
        lower.starts_with("flowchart") || lower.starts_with("graph") || input.contains("-->")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Diagram {
        let mut diagram = Diagram::new();
        ActivityParser::new().parse(input, &mut diagram).unwrap();
        diagram
    }

    #[test]
    fn test_flow_statement_chain() {
        let parser = ActivityParser::new();
        let statement = parser
            .parse_flow_statement("A([Start]) --> B[Validate order] -->|ok| C{In stock?}")
            .unwrap();
        assert_eq!(statement.first.kind, Some(NodeKind::Step));
        assert_eq!(statement.links.len(), 2);
        assert_eq!(statement.links[1].0.as_deref(), Some("ok"));
        assert_eq!(statement.links[1].1.kind, Some(NodeKind::Decision));
        assert_eq!(statement.links[1].1.label.as_deref(), Some("In stock?"));
    }

    #[test]
    fn test_inline_guard_label() {
        let parser = ActivityParser::new();
        let statement = parser.parse_flow_statement("C -- no --> D[Backorder]").unwrap();
        assert_eq!(statement.links[0].0.as_deref(), Some("no"));
        assert_eq!(statement.links[0].1.id, "D");
    }

    #[test]
    fn test_bare_identifier_is_not_a_statement() {
        assert!(ActivityParser::new().parse_flow_statement("A").is_none());
    }

    #[test]
    fn test_titled_flow_becomes_behavior() {
        let input = r#"flowchart TD
    title Order.submit(items)
    A([Start]) --> B[Validate items]
    B --> C{Stock available?}
    C -->|yes| D[Reserve stock]
    C -->|no| E[Notify customer]
    D --> F([End])
    E --> F"#;
        let diagram = parse(input);
        let behaviors = diagram.behaviors();
        assert_eq!(behaviors.len(), 1);
        assert_eq!(behaviors[0].target, "Order");
        assert_eq!(behaviors[0].source, BehaviorSource::Activity);
        assert_eq!(behaviors[0].method.name, "submit");
        assert_eq!(
            behaviors[0].method.logic,
            vec![
                "Validate items",
                "if Stock available?",
                "Reserve stock",
                "Notify customer",
            ]
        );
    }

    #[test]
    fn test_subgraph_flows() {
        let input = r#"flowchart LR
    subgraph Payment.capture
        P1[Authorize card] --> P2[Capture funds]
    end
    subgraph Payment.refund
        R1[Reverse charge]
    end"#;
        let diagram = parse(input);
        let names: Vec<_> = diagram.behaviors().iter().map(|b| b.method.name.as_str()).collect();
        assert_eq!(names, vec!["capture", "refund"]);
        assert_eq!(diagram.behaviors()[0].method.logic, vec!["Authorize card", "Capture funds"]);
    }

    #[test]
    fn test_untitled_flow_is_warned() {
        let diagram = parse("flowchart TD\n    A[One] --> B[Two]");
        assert!(diagram.behaviors().is_empty());
        assert_eq!(diagram.warnings().len(), 1);
    }

    #[test]
    fn test_unterminated_subgraph_is_error() {
        let mut diagram = Diagram::new();
        let err = ActivityParser::new()
            .parse("flowchart TD\n  subgraph Order.pay\n  A[x] --> B[y]\n", &mut diagram)
            .unwrap_err();
        assert_eq!(err.line(), Some(2));
    }
}
