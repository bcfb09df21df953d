//! Splitting an input document into diagram blocks
//!
//! A document may hold several diagrams appended one after another, each
//! introduced by a header line, optionally wrapped in markdown fences.

use serde::Serialize;
use tracing::{debug, trace};

use super::chumsky_utils::strip_comment;
use super::{Result, UmlGenError};

/// Diagram notations understood by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Class,
    State,
    Sequence,
    Er,
    Activity,
}

impl Dialect {
    /// Recognise a block header line
    pub fn from_header(line: &str) -> Option<Self> {
        let keyword = line.split_whitespace().next()?.to_ascii_lowercase();
        match keyword.as_str() {
            "classdiagram" | "classdiagram-v2" => Some(Dialect::Class),
            "statediagram" | "statediagram-v2" => Some(Dialect::State),
            "sequencediagram" => Some(Dialect::Sequence),
            "erdiagram" => Some(Dialect::Er),
            "flowchart" | "graph" | "activitydiagram" => Some(Dialect::Activity),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Class => "class",
            Dialect::State => "state",
            Dialect::Sequence => "sequence",
            Dialect::Er => "er",
            Dialect::Activity => "activity",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A contiguous run of document lines belonging to one diagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Dialect named by the header, `None` for headerless text
    pub dialect: Option<Dialect>,
    /// 1-based document line of the block's first line
    pub first_line: usize,
    pub text: String,
}

const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "gantt",
    "pie",
    "journey",
    "gitgraph",
    "mindmap",
    "timeline",
    "quadrantchart",
    "requirementdiagram",
    "c4context",
    "sankey-beta",
    "xychart-beta",
    "block-beta",
    "packet-beta",
    "kanban",
    "architecture-beta",
];

/// Whether a standalone line names a diagram type this crate cannot parse
fn unsupported_keyword(line: &str) -> Option<&str> {
    let keyword = line.split_whitespace().next()?;
    let lower = keyword.to_ascii_lowercase();
    if UNSUPPORTED_KEYWORDS.contains(&lower.as_str()) {
        return Some(keyword);
    }
    let looks_like_diagram = lower.len() > "diagram".len()
        && lower.ends_with("diagram")
        && keyword.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    looks_like_diagram.then_some(keyword)
}

#[derive(Default)]
struct BlockBuilder {
    dialect: Option<Dialect>,
    first_line: usize,
    lines: Vec<String>,
}

impl BlockBuilder {
    fn has_content(&self) -> bool {
        self.dialect.is_some() || self.lines.iter().any(|l| !strip_comment(l).is_empty())
    }
}

fn flush(current: &mut Option<BlockBuilder>, blocks: &mut Vec<Block>) {
    if let Some(builder) = current.take() {
        if builder.has_content() {
            trace!(
                dialect = ?builder.dialect,
                first_line = builder.first_line,
                "Closed block"
            );
            blocks.push(Block {
                dialect: builder.dialect,
                first_line: builder.first_line,
                text: builder.lines.join("\n"),
            });
        }
    }
}

/// Split a document into diagram blocks.
///
/// Fails on an unclosed markdown fence or a standalone unsupported diagram
/// keyword.
pub fn split_blocks(input: &str) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();
    let mut current: Option<BlockBuilder> = None;
    let mut fence: Option<(usize, bool)> = None;
    let mut at_boundary = true;
    // In a markdown document only fenced text is diagram text
    let fenced_document = input.lines().any(|l| l.trim().starts_with("```"));

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw.trim();

        if let Some(info) = trimmed.strip_prefix("```") {
            flush(&mut current, &mut blocks);
            at_boundary = true;
            fence = match fence {
                Some(_) => None,
                None => {
                    let info = info.trim().to_ascii_lowercase();
                    let diagram = info.is_empty() || info == "mermaid" || info == "uml";
                    Some((line_no, diagram))
                }
            };
            continue;
        }
        match fence {
            Some((_, false)) => continue,
            None if fenced_document => continue,
            _ => {}
        }

        let content = strip_comment(raw);
        if content.is_empty() {
            if trimmed.is_empty() {
                at_boundary = true;
            }
            if let Some(builder) = current.as_mut() {
                builder.lines.push(raw.to_string());
            }
            continue;
        }

        if let Some(dialect) = Dialect::from_header(content) {
            flush(&mut current, &mut blocks);
            debug!(dialect = %dialect, line = line_no, "Found diagram header");
            current = Some(BlockBuilder {
                dialect: Some(dialect),
                first_line: line_no,
                lines: vec![raw.to_string()],
            });
            at_boundary = false;
            continue;
        }

        if at_boundary {
            if let Some(keyword) = unsupported_keyword(content) {
                return Err(UmlGenError::syntax(
                    line_no,
                    format!("unknown diagram type '{}'", keyword),
                ));
            }
        }
        at_boundary = false;

        current
            .get_or_insert_with(|| BlockBuilder {
                dialect: None,
                first_line: line_no,
                lines: Vec::new(),
            })
            .lines
            .push(raw.to_string());
    }

    if let Some((line, _)) = fence {
        return Err(UmlGenError::syntax(line, "unterminated code fence"));
    }
    flush(&mut current, &mut blocks);
    Ok(blocks)
}
