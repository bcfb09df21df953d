//! Structural view of one source file: the target type's members and the
//! file's import statements

use std::ops::Range;

use serde::Serialize;

/// What a body member declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    Method,
    /// A nested type, treated as one opaque member
    Type,
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Field => "field",
            MemberKind::Method => "method",
            MemberKind::Type => "type",
        }
    }
}

/// One declaration in the target type's body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub kind: MemberKind,
    pub name: String,
    /// Field type, or comma-joined parameter types, whitespace removed
    pub signature: String,
    /// Whole lines covering the member, its annotations included
    pub span: Range<usize>,
    /// Whether a blank line precedes the member
    pub blank_before: bool,
}

/// One import statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Source module for module-aware imports (`from 'typeorm'`, `from django.db`)
    pub module: Option<String>,
    /// Imported names; for path imports, the path itself
    pub names: Vec<String>,
    /// Default-import binding (`import X from 'x'`)
    pub default: Option<String>,
    /// Statement text, trimmed
    pub text: String,
    pub span: Range<usize>,
}

impl Import {
    /// A path import such as `import java.util.List;` or `using System;`
    pub fn path(path: impl Into<String>, text: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            module: None,
            names: vec![path.into()],
            default: None,
            text: text.into(),
            span,
        }
    }
}

/// Fields, methods, nested types and imports of one file, plus the anchors
/// needed to splice new declarations in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralSnapshot {
    pub members: Vec<Member>,
    pub imports: Vec<Import>,
    /// Offset of the first line inside the body
    pub body_start: usize,
    /// Insertion point for trailing members: the closing brace line, or the
    /// end of the last body line for indentation-scoped bodies
    pub body_end: usize,
    /// Indentation of the first member, if any
    pub member_indent: Option<String>,
    /// Indentation of the type declaration
    pub type_indent: String,
    /// End of the `package`/`namespace` line, if any
    pub preamble_end: Option<usize>,
}

impl StructuralSnapshot {
    pub fn fields(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.kind == MemberKind::Field)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.kind == MemberKind::Method)
    }

    /// Members of `kind` called `name`
    pub fn named<'a>(&'a self, kind: MemberKind, name: &'a str) -> impl Iterator<Item = &'a Member> + 'a {
        self.members
            .iter()
            .filter(move |m| m.kind == kind && m.name == name)
    }

    /// Names imported from `module`, default bindings included
    pub fn imported_from(&self, module: &str) -> Vec<&str> {
        self.imports
            .iter()
            .filter(|i| i.module.as_deref() == Some(module))
            .flat_map(|i| i.names.iter().chain(i.default.iter()))
            .map(String::as_str)
            .collect()
    }

    /// Whether a path import is present
    pub fn has_path_import(&self, path: &str) -> bool {
        self.imports
            .iter()
            .any(|i| i.module.is_none() && i.names.iter().any(|n| n == path))
    }
}

/// Names added by a merge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructuralDiff {
    pub fields: Vec<String>,
    pub methods: Vec<String>,
    pub types: Vec<String>,
    /// Inserted import statements
    pub imports: Vec<String>,
}

impl StructuralDiff {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.methods.is_empty() && self.types.is_empty() && self.imports.is_empty()
    }
}

pub(crate) fn line_start(text: &[u8], pos: usize) -> usize {
    text[..pos.min(text.len())]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1)
}

/// Offset just past the newline ending the line containing `pos`
pub(crate) fn line_end(text: &[u8], pos: usize) -> usize {
    text[pos.min(text.len())..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(text.len(), |i| pos + i + 1)
}

/// 1-based line number of `pos`
pub(crate) fn line_number(text: &[u8], pos: usize) -> usize {
    text[..pos.min(text.len())].iter().filter(|&&b| b == b'\n').count() + 1
}

pub(crate) fn indent_at(text: &str, line_start: usize) -> String {
    text[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Whether the line before the one starting at `line_start` is blank
pub(crate) fn blank_line_before(text: &[u8], line_start: usize) -> bool {
    if line_start == 0 {
        return false;
    }
    let prev_start = self::line_start(text, line_start - 1);
    text[prev_start..line_start]
        .iter()
        .all(|b| b.is_ascii_whitespace())
}

pub(crate) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// Remove all whitespace, for signature comparison
pub(crate) fn squash(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Parse the clause of an ES module import: `{ A, B as C }`, `X`,
/// `X, { A }`, `* as X`, `type { A }`
pub(crate) fn parse_es_clause(clause: &str) -> (Option<String>, Vec<String>) {
    let clause = clause.trim();
    let clause = clause.strip_prefix("type ").unwrap_or(clause).trim();
    let (default, named) = match clause.find('{') {
        Some(open) => {
            let close = clause.rfind('}').unwrap_or(clause.len());
            let default = clause[..open].trim().trim_end_matches(',').trim();
            let inner = &clause[(open + 1).min(close)..close];
            (default, Some(inner))
        }
        None => (clause, None),
    };
    let default = (!default.is_empty()).then(|| default.to_string());
    let names = named
        .map(|inner| {
            inner
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    (default, names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_helpers() {
        let text = b"a\n\n  b\nc";
        assert_eq!(line_start(text, 5), 3);
        assert_eq!(line_end(text, 3), 7);
        assert_eq!(line_end(text, 8), 8);
        assert_eq!(line_number(text, 5), 3);
        assert!(blank_line_before(text, 3));
        assert!(!blank_line_before(text, 7));
    }

    #[test]
    fn test_es_clause() {
        assert_eq!(
            parse_es_clause("{ Column, Entity }"),
            (None, vec!["Column".to_string(), "Entity".to_string()])
        );
        assert_eq!(
            parse_es_clause("React, { useState }"),
            (Some("React".to_string()), vec!["useState".to_string()])
        );
        assert_eq!(parse_es_clause("* as path"), (Some("* as path".to_string()), vec![]));
    }
}
