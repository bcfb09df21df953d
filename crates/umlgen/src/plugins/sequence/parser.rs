//! Sequence diagram parser
//!
//! Turns solid call messages into behavioral method candidates on the
//! callee, collecting notes, nested calls and fragment guards as logic hints.

use std::collections::HashMap;

use chumsky::prelude::*;
use tracing::{debug, span, trace, Level};

use crate::core::chumsky_utils::{
    colon_label, identifier, inline_whitespace, parse_statement, strip_comment, Extra,
};
use crate::core::{
    is_ident_char, pascal_case, BehaviorCandidate, BehaviorSource, Diagram, MethodNode,
    Parser as CoreParser, Result, UmlGenError,
};

/// Line style of a message arrow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dotted,
}

/// Head of a message arrow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowHead {
    /// `->>`
    Arrow,
    /// `-)`
    Open,
    /// `-x`
    Cross,
    /// `->`
    None,
}

/// A message arrow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrowType {
    pub line: LineStyle,
    pub head: ArrowHead,
}

impl ArrowType {
    /// Solid `->>` and async `-)` messages are calls; everything else is a reply
    pub fn is_call(&self) -> bool {
        self.line == LineStyle::Solid && matches!(self.head, ArrowHead::Arrow | ArrowHead::Open)
    }
}

/// A parsed message line: `Caller->>Callee: text`
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMessage {
    pub from: String,
    pub to: String,
    pub arrow: ArrowType,
    pub text: String,
}

/// An open `alt`/`opt`/`loop`/... fragment
#[derive(Debug)]
struct Fragment {
    guard: String,
    opened_at: usize,
}

const FRAGMENT_KEYWORDS: &[&str] = &["alt", "opt", "loop", "par", "critical", "break", "rect", "box"];
const GUARDLESS_FRAGMENTS: &[&str] = &["par", "rect", "box"];
const IGNORED_KEYWORDS: &[&str] = &[
    "autonumber", "activate", "deactivate", "title", "create", "destroy", "link", "links",
    "accTitle", "accDescr",
];

/// Sequence diagram parser
pub struct SequenceParser;

impl SequenceParser {
    pub fn new() -> Self {
        Self
    }

    fn arrow<'src>() -> impl chumsky::Parser<'src, &'src str, ArrowType, Extra<'src>> + Clone {
        let arrow = |line, head| ArrowType { line, head };
        // Longest arrows first
        choice((
            just("-->>").to(arrow(LineStyle::Dotted, ArrowHead::Arrow)),
            just("--)").to(arrow(LineStyle::Dotted, ArrowHead::Open)),
            just("--x").to(arrow(LineStyle::Dotted, ArrowHead::Cross)),
            just("-->").to(arrow(LineStyle::Dotted, ArrowHead::None)),
            just("->>").to(arrow(LineStyle::Solid, ArrowHead::Arrow)),
            just("-)").to(arrow(LineStyle::Solid, ArrowHead::Open)),
            just("-x").to(arrow(LineStyle::Solid, ArrowHead::Cross)),
            just("->").to(arrow(LineStyle::Solid, ArrowHead::None)),
        ))
    }

    fn message_parser<'src>(
    ) -> impl chumsky::Parser<'src, &'src str, ParsedMessage, Extra<'src>> + Clone {
        let ws = inline_whitespace();
        let activation = one_of("+-").or_not();

        identifier()
            .then_ignore(ws.clone())
            .then(Self::arrow())
            .then_ignore(activation)
            .then_ignore(ws.clone())
            .then(identifier())
            .then_ignore(ws)
            .then(colon_label())
            .map(|(((from, arrow), to), text)| ParsedMessage {
                from,
                to,
                arrow,
                text,
            })
    }

    /// Parse a message line like "Alice->>Bob: Hello"
    pub fn parse_message(&self, line: &str) -> Option<ParsedMessage> {
        parse_statement(Self::message_parser(), line).ok()
    }

    /// Parse "participant X", "participant X as Label" or the actor forms
    fn parse_participant(&self, line: &str) -> Option<(String, String)> {
        let rest = ["participant ", "actor "]
            .iter()
            .find_map(|prefix| line.strip_prefix(prefix))?
            .trim();
        match rest.split_once(" as ") {
            Some((id, label)) => {
                let label = label.trim();
                let name = if label.chars().all(is_ident_char) {
                    label.to_string()
                } else {
                    pascal_case(label)
                };
                Some((id.trim().to_string(), name))
            }
            None => Some((rest.to_string(), rest.to_string())),
        }
    }
}

impl Default for SequenceParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable state while walking one sequence block
#[derive(Default)]
struct Walk {
    aliases: HashMap<String, String>,
    fragments: Vec<Fragment>,
    candidates: Vec<BehaviorCandidate>,
    /// Candidate currently being handled by each participant
    active: HashMap<String, usize>,
}

impl Walk {
    fn resolve(&self, id: &str) -> String {
        self.aliases.get(id).cloned().unwrap_or_else(|| id.to_string())
    }

    fn guards(&self) -> Vec<String> {
        self.fragments
            .iter()
            .filter(|f| !f.guard.is_empty())
            .map(|f| format!("when {}", f.guard))
            .collect()
    }

    fn push_logic(&mut self, participant: &str, line: String) {
        if let Some(&idx) = self.active.get(participant) {
            if let Some(candidate) = self.candidates.get_mut(idx) {
                candidate.method.logic.push(line);
            }
        }
    }
}

impl CoreParser<Diagram> for SequenceParser {
    fn parse(&self, input: &str, diagram: &mut Diagram) -> Result<()> {
        let parse_span = span!(Level::DEBUG, "parse_sequence", input_len = input.len());
        let _enter = parse_span.enter();

        let mut walk = Walk::default();

        for (idx, raw) in input.lines().enumerate() {
            let line_no = idx + 1;
            let line = strip_comment(raw);
            if line.is_empty() || line.to_lowercase().starts_with("sequencediagram") {
                continue;
            }
            let first = line.split_whitespace().next().unwrap_or_default();
            let keyword = first.trim_end_matches(':').to_lowercase();
            let keyword = keyword.as_str();
            let argument = line[first.len()..].trim();

            if let Some((id, name)) = self.parse_participant(line) {
                walk.aliases.insert(id, name);
                continue;
            }

            if FRAGMENT_KEYWORDS.contains(&keyword) {
                let guard = if GUARDLESS_FRAGMENTS.contains(&keyword) {
                    String::new()
                } else {
                    argument.to_string()
                };
                walk.fragments.push(Fragment {
                    guard,
                    opened_at: line_no,
                });
                continue;
            }
            if keyword == "else" || keyword == "and" || keyword == "option" {
                match walk.fragments.last_mut() {
                    Some(fragment) => {
                        fragment.guard = if keyword == "and" {
                            String::new()
                        } else {
                            argument.to_string()
                        };
                    }
                    None => diagram.warn(line_no, format!("'{}' outside of a fragment", keyword)),
                }
                continue;
            }
            if keyword == "end" {
                if walk.fragments.pop().is_none() {
                    return Err(UmlGenError::syntax(
                        diagram.line(line_no),
                        "'end' without an open fragment",
                    ));
                }
                continue;
            }

            if keyword == "note" {
                if let Some((target, text)) = line.split_once(':') {
                    let target = target.trim();
                    let target = ["note over ", "note right of ", "note left of "]
                        .iter()
                        .find_map(|p| {
                            target
                                .to_lowercase()
                                .starts_with(p)
                                .then(|| target[p.len()..].to_string())
                        })
                        .unwrap_or_default();
                    for participant in target.split(',') {
                        let participant = walk.resolve(participant.trim());
                        walk.push_logic(&participant, text.trim().to_string());
                    }
                }
                continue;
            }

            if IGNORED_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
                trace!(line = line_no, "Ignoring presentation statement");
                continue;
            }

            let Some(message) = self.parse_message(line) else {
                diagram.warn(
                    line_no,
                    format!("unrecognised sequence diagram line skipped: '{}'", line),
                );
                continue;
            };
            if !message.arrow.is_call() {
                trace!(line = line_no, "Skipping reply message");
                continue;
            }

            let caller = walk.resolve(&message.from);
            let callee = walk.resolve(&message.to);
            let Some(mut method) = MethodNode::from_invocation(&message.text, &callee) else {
                continue;
            };
            method.line = diagram.line(line_no);

            let arguments = method
                .parameters
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let call = format!("call {}.{}({})", callee, method.name, arguments);
            if caller != callee {
                walk.push_logic(&caller, call);
            }

            method.logic.extend(walk.guards());
            debug!(callee = %callee, method = %method.name, "Behavior candidate");
            walk.candidates.push(BehaviorCandidate {
                target: callee.clone(),
                method,
                source: BehaviorSource::Sequence,
                line: diagram.line(line_no),
            });
            walk.active.insert(callee, walk.candidates.len() - 1);
        }

        if let Some(fragment) = walk.fragments.last() {
            return Err(UmlGenError::syntax(
                diagram.line(fragment.opened_at),
                "unterminated fragment: missing 'end'",
            ));
        }

        for candidate in walk.candidates {
            diagram.add_behavior(candidate);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sequence"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn can_parse(&self, input: &str) -> bool {
        let lower = input.to_lowercase();
        lower.contains("sequencediagram") || input.contains("->>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Diagram {
        let mut diagram = Diagram::new();
        SequenceParser::new().parse(input, &mut diagram).unwrap();
        diagram
    }

    #[test]
    fn test_parse_message_arrows() {
        let parser = SequenceParser::new();
        let msg = parser.parse_message("Client->>OrderService: placeOrder(items)").unwrap();
        assert_eq!(msg.from, "Client");
        assert_eq!(msg.to, "OrderService");
        assert!(msg.arrow.is_call());

        let reply = parser.parse_message("OrderService-->>Client: order").unwrap();
        assert!(!reply.arrow.is_call());

        let async_call = parser.parse_message("A-)+B: notify()").unwrap();
        assert!(async_call.arrow.is_call());
        assert_eq!(async_call.to, "B");
    }

    #[test]
    fn test_call_becomes_candidate_on_callee() {
        let diagram = parse("sequenceDiagram\n    Client->>Order: createOrder(String customerId, items)");
        let behaviors = diagram.behaviors();
        assert_eq!(behaviors.len(), 1);
        assert_eq!(behaviors[0].target, "Order");
        assert_eq!(behaviors[0].method.name, "createOrder");
        assert_eq!(behaviors[0].method.return_type, "Order");
        assert_eq!(behaviors[0].method.parameters.len(), 2);
        assert_eq!(behaviors[0].line, 2);
    }

    #[test]
    fn test_logic_from_notes_calls_and_guards() {
        let input = r#"sequenceDiagram
    participant C as Customer
    participant O as Order
    participant I as Inventory
    C->>O: placeOrder(items)
    Note over O: validate items
    alt stock ok
        O->>I: reserve(items)
    else out of stock
        O->>I: backorder(items)
    end
    O-->>C: confirmation"#;
        let diagram = parse(input);
        let behaviors = diagram.behaviors();
        assert_eq!(behaviors.len(), 3);
        let place = &behaviors[0];
        assert_eq!(place.target, "Order");
        assert_eq!(
            place.method.logic,
            vec![
                "validate items",
                "call Inventory.reserve(items)",
                "call Inventory.backorder(items)",
            ]
        );
        assert_eq!(behaviors[1].target, "Inventory");
        assert_eq!(behaviors[1].method.logic, vec!["when stock ok"]);
        assert_eq!(behaviors[2].method.logic, vec!["when out of stock"]);
    }

    #[test]
    fn test_unterminated_fragment_is_error() {
        let mut diagram = Diagram::new();
        let err = SequenceParser::new()
            .parse("sequenceDiagram\n  loop every minute\n  A->>B: poll()\n", &mut diagram)
            .unwrap_err();
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_unmatched_end_is_error() {
        let mut diagram = Diagram::new();
        assert!(SequenceParser::new()
            .parse("sequenceDiagram\n  A->>B: poll()\n  end\n", &mut diagram)
            .is_err());
    }

    #[test]
    fn test_participant_alias_label_is_pascal_cased() {
        let diagram = parse("participant OS as Order Service\nClient->>OS: cancel(id)");
        assert_eq!(diagram.behaviors()[0].target, "OrderService");
    }
}
