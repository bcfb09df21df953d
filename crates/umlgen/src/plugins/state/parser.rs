//! State diagram parser using chumsky
//!
//! Parses state diagram syntax into [`StateBlock`]s: one for the top level
//! and one per composite state.

use chumsky::prelude::*;
use tracing::{span, trace, Level};

use crate::core::chumsky_utils::{
    colon_label, identifier, inline_whitespace, parse_statement, quoted_string, strip_comment,
    Extra,
};
use crate::core::{
    camel_case, Diagram, Parser as CoreParser, Result, StateBlock, StateTransition, UmlGenError,
};

/// Parsed state diagram statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// State declaration: `state "description" as id`
    StateDecl { id: String, label: String },
    /// Composite state opening: `state Name {`
    CompositeStart { name: String },
    /// Closing brace of a composite state
    CompositeEnd,
    /// Transition: `from --> to` or `from --> to : label`
    Transition {
        from: String,
        to: String,
        label: Option<String>,
    },
    /// Description: `Id : text`
    Description { id: String },
    /// `title Name`
    Title { name: String },
}

const TERMINAL: &str = "[*]";

/// State diagram parser
pub struct StateParser;

impl StateParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a terminal state [*]
    fn terminal_parser<'src>() -> impl chumsky::Parser<'src, &'src str, String, Extra<'src>> + Clone
    {
        just(TERMINAL).to(TERMINAL.to_string())
    }

    /// Parse a state reference (either [*] or identifier)
    fn state_ref<'src>() -> impl chumsky::Parser<'src, &'src str, String, Extra<'src>> + Clone {
        Self::terminal_parser().or(identifier())
    }

    /// Parse a transition: `from --> to` or `from --> to : label`
    fn transition_parser<'src>(
    ) -> impl chumsky::Parser<'src, &'src str, Statement, Extra<'src>> + Clone {
        let ws = inline_whitespace();

        Self::state_ref()
            .then_ignore(ws.clone())
            .then_ignore(just("-->"))
            .then_ignore(ws.clone())
            .then(Self::state_ref())
            .then_ignore(ws)
            .then(colon_label().or_not())
            .map(|((from, to), label)| Statement::Transition {
                from,
                to,
                label: label.filter(|s| !s.is_empty()),
            })
    }

    /// Parse a state declaration: `state "description" as id`
    fn state_decl_parser<'src>(
    ) -> impl chumsky::Parser<'src, &'src str, Statement, Extra<'src>> + Clone {
        let ws = one_of(" \t").repeated().at_least(1);

        just("state")
            .ignore_then(ws.clone())
            .ignore_then(quoted_string())
            .then_ignore(ws.clone())
            .then_ignore(just("as"))
            .then_ignore(ws)
            .then(identifier())
            .map(|(label, id)| Statement::StateDecl { id, label })
    }

    /// Parse a composite state opening: `state Name {` or `state "Label" as Name {`
    fn composite_parser<'src>(
    ) -> impl chumsky::Parser<'src, &'src str, Statement, Extra<'src>> + Clone {
        let ws = one_of(" \t").repeated().at_least(1);
        let aliased = quoted_string()
            .then_ignore(ws.clone())
            .then_ignore(just("as"))
            .then_ignore(ws.clone())
            .ignore_then(identifier());

        just("state")
            .ignore_then(ws)
            .ignore_then(aliased.or(identifier()))
            .then_ignore(inline_whitespace())
            .then_ignore(just('{'))
            .map(|name| Statement::CompositeStart { name })
    }

    fn description_parser<'src>(
    ) -> impl chumsky::Parser<'src, &'src str, Statement, Extra<'src>> + Clone {
        identifier()
            .then_ignore(inline_whitespace())
            .then_ignore(colon_label())
            .map(|id| Statement::Description { id })
    }

    fn title_parser<'src>() -> impl chumsky::Parser<'src, &'src str, Statement, Extra<'src>> + Clone
    {
        just("title")
            .ignore_then(one_of(" \t").repeated().at_least(1))
            .ignore_then(any().repeated().collect::<String>())
            .map(|name| Statement::Title {
                name: name.trim().to_string(),
            })
    }

    /// Parse a single statement
    fn statement_parser<'src>(
    ) -> impl chumsky::Parser<'src, &'src str, Statement, Extra<'src>> + Clone {
        choice((
            Self::composite_parser(),
            Self::state_decl_parser(),
            just('}').to(Statement::CompositeEnd),
            Self::transition_parser(),
            Self::title_parser(),
            Self::description_parser(),
        ))
    }

    /// Parse a statement from input
    pub fn parse_statement(&self, input: &str) -> Result<Statement> {
        parse_statement(Self::statement_parser(), input.trim())
            .map_err(|message| UmlGenError::syntax(0, message))
    }

    /// Check if a line is a header line
    fn is_header_line(&self, line: &str) -> bool {
        line.trim().to_lowercase().starts_with("statediagram")
    }

    /// Lines that carry no state-machine meaning
    fn is_ignored(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        lower.starts_with("direction ")
            || lower.starts_with("classdef ")
            || lower.starts_with("class ")
            || lower.starts_with("acctitle")
            || lower.starts_with("--")
            || (lower.starts_with("state ") && lower.contains("<<"))
    }
}

impl Default for StateParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Scope of the block currently being filled
struct Scope {
    block: StateBlock,
    opened_at: usize,
}

fn record_transition(block: &mut StateBlock, from: String, to: String, label: Option<String>) {
    match (from.as_str(), to.as_str()) {
        (TERMINAL, TERMINAL) => {}
        (TERMINAL, _) => {
            block.add_state(&to);
            if block.initial.is_none() {
                block.initial = Some(to);
            }
        }
        (_, TERMINAL) => {
            block.add_state(&from);
            if !block.finals.contains(&from) {
                block.finals.push(from);
            }
        }
        _ => {
            block.add_state(&from);
            block.add_state(&to);
            let event = match label.as_deref().map(camel_case) {
                Some(event) if !event.is_empty() => event,
                _ => format!("to{}", to),
            };
            block.transitions.push(StateTransition { from, event, to });
        }
    }
}

impl CoreParser<Diagram> for StateParser {
    fn parse(&self, input: &str, diagram: &mut Diagram) -> Result<()> {
        let parse_span = span!(Level::DEBUG, "parse_state", input_len = input.len());
        let _enter = parse_span.enter();

        let mut stack: Vec<Scope> = vec![Scope {
            block: StateBlock::default(),
            opened_at: 1,
        }];
        let mut in_note = false;
        let mut finished = Vec::new();

        for (idx, raw) in input.lines().enumerate() {
            let line_no = idx + 1;
            let line = strip_comment(raw);

            if line.is_empty() || self.is_header_line(line) {
                continue;
            }
            if in_note {
                in_note = !line.eq_ignore_ascii_case("end note");
                continue;
            }
            if line.to_lowercase().starts_with("note ") {
                // Multi-line notes have no colon on their first line
                in_note = !line.contains(':');
                continue;
            }
            if self.is_ignored(line) {
                trace!(line = line_no, "Ignoring presentation statement");
                continue;
            }

            let Ok(statement) = self.parse_statement(line) else {
                diagram.warn(line_no, format!("unrecognised state diagram line skipped: '{}'", line));
                continue;
            };
            let depth = stack.len();
            let Some(scope) = stack.last_mut() else {
                break;
            };
            match statement {
                Statement::StateDecl { id, .. } => scope.block.add_state(&id),
                Statement::Description { id } => scope.block.add_state(&id),
                Statement::Title { name } => {
                    if depth == 1 && !name.is_empty() {
                        scope.block.name = Some(name);
                    }
                }
                Statement::Transition { from, to, label } => {
                    record_transition(&mut scope.block, from, to, label);
                }
                Statement::CompositeStart { name } => {
                    scope.block.add_state(&name);
                    stack.push(Scope {
                        block: StateBlock {
                            name: Some(name),
                            line: diagram.line(line_no),
                            ..StateBlock::default()
                        },
                        opened_at: line_no,
                    });
                }
                Statement::CompositeEnd => {
                    if stack.len() == 1 {
                        return Err(UmlGenError::syntax(
                            diagram.line(line_no),
                            "'}' without an open composite state",
                        ));
                    }
                    if let Some(scope) = stack.pop() {
                        finished.push(scope.block);
                    }
                }
            }
        }

        if stack.len() > 1 {
            let opened_at = stack.last().map(|s| s.opened_at).unwrap_or(1);
            return Err(UmlGenError::syntax(
                diagram.line(opened_at),
                "unterminated composite state",
            ));
        }

        if let Some(mut top) = stack.pop() {
            top.block.line = diagram.line(1);
            // A top level holding only composites carries no machine of its own
            let only_composites = top.block.transitions.is_empty() && top.block.initial.is_none();
            if !only_composites {
                finished.insert(0, top.block);
            }
        }
        for mut block in finished {
            block.finish();
            trace!(name = ?block.name, states = block.states.len(), "Parsed state block");
            diagram.add_state_block(block);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "state"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn can_parse(&self, input: &str) -> bool {
        let trimmed = input.trim().to_lowercase();
        trimmed.starts_with("statediagram") || input.contains(TERMINAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Diagram {
        let mut diagram = Diagram::new();
        StateParser::new().parse(input, &mut diagram).unwrap();
        diagram
    }

    #[test]
    fn test_parse_simple_transition() {
        let parser = StateParser::new();
        let stmt = parser.parse_statement("Draft --> Published : publish").unwrap();
        assert_eq!(
            stmt,
            Statement::Transition {
                from: "Draft".to_string(),
                to: "Published".to_string(),
                label: Some("publish".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_state_declaration() {
        let parser = StateParser::new();
        let stmt = parser
            .parse_statement("state \"Waiting for payment\" as Pending")
            .unwrap();
        assert_eq!(
            stmt,
            Statement::StateDecl {
                id: "Pending".to_string(),
                label: "Waiting for payment".to_string(),
            }
        );
    }

    #[test]
    fn test_initial_state_and_transition() {
        let diagram = parse("stateDiagram-v2\n    [*] --> Draft\n    Draft --> Published : publish\n    Published --> [*]");
        let blocks = diagram.state_blocks();
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.initial.as_deref(), Some("Draft"));
        assert_eq!(block.states, vec!["Draft", "Published"]);
        assert_eq!(block.finals, vec!["Published"]);
        assert_eq!(
            block.transitions,
            vec![StateTransition {
                from: "Draft".to_string(),
                event: "publish".to_string(),
                to: "Published".to_string(),
            }]
        );
    }

    #[test]
    fn test_initial_state_ordered_first() {
        let diagram = parse("Review --> Approved : approve\n[*] --> Draft\nDraft --> Review : submit for review");
        let block = &diagram.state_blocks()[0];
        assert_eq!(block.states[0], "Draft");
        assert_eq!(block.transitions[1].event, "submitForReview");
    }

    #[test]
    fn test_unlabelled_transition_event() {
        let diagram = parse("[*] --> Open\nOpen --> Closed");
        assert_eq!(diagram.state_blocks()[0].transitions[0].event, "toClosed");
    }

    #[test]
    fn test_composite_states_become_blocks() {
        let input = r#"stateDiagram-v2
    state Order {
        [*] --> Pending
        Pending --> Paid : pay
    }
    state Shipment {
        [*] --> Packed
        Packed --> Shipped : ship
    }"#;
        let diagram = parse(input);
        let blocks = diagram.state_blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name.as_deref(), Some("Order"));
        assert_eq!(blocks[0].initial.as_deref(), Some("Pending"));
        assert_eq!(blocks[1].name.as_deref(), Some("Shipment"));
        assert_eq!(blocks[1].line, 6);
    }

    #[test]
    fn test_title_names_block_and_notes_skipped() {
        let input = r#"stateDiagram-v2
    title Article
    note right of Draft
        editors only
    end note
    [*] --> Draft
    Draft : being written
    Draft --> Published : publish"#;
        let diagram = parse(input);
        let block = &diagram.state_blocks()[0];
        assert_eq!(block.name.as_deref(), Some("Article"));
        assert_eq!(block.transitions.len(), 1);
        assert!(diagram.warnings().is_empty());
    }

    #[test]
    fn test_unterminated_composite_is_error() {
        let mut diagram = Diagram::new();
        let err = StateParser::new()
            .parse("stateDiagram\n  state Order {\n  [*] --> A\n", &mut diagram)
            .unwrap_err();
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_can_parse() {
        let parser = StateParser::new();
        assert!(parser.can_parse("stateDiagram-v2\n[*] --> A"));
        assert!(parser.can_parse("[*] --> A"));
        assert!(!parser.can_parse("graph TD; A-->B"));
    }
}
