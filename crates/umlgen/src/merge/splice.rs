//! Text insertion into an existing source without touching its other lines

use super::snapshot::{Member, MemberKind, StructuralSnapshot};

/// Indentation of one snapshot: member prefix and one nesting step
#[derive(Debug, Clone)]
pub(crate) struct IndentStyle {
    member: String,
    unit: String,
}

impl IndentStyle {
    pub(crate) fn of(snapshot: &StructuralSnapshot, fallback_unit: &str) -> Self {
        match &snapshot.member_indent {
            Some(member) => {
                let unit = member
                    .strip_prefix(snapshot.type_indent.as_str())
                    .filter(|unit| !unit.is_empty())
                    .unwrap_or(fallback_unit);
                Self {
                    member: member.clone(),
                    unit: unit.to_string(),
                }
            }
            None => Self {
                member: format!("{}{}", snapshot.type_indent, fallback_unit),
                unit: fallback_unit.to_string(),
            },
        }
    }
}

/// Move `text` from one indentation style to another, scaling nested levels
pub(crate) fn reindent(text: &str, from: &IndentStyle, to: &IndentStyle) -> String {
    if from.member == to.member && from.unit == to.unit {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            out.push_str(line.trim_start_matches([' ', '\t']));
            continue;
        }
        match line.strip_prefix(from.member.as_str()) {
            Some(rest) => {
                out.push_str(&to.member);
                let mut rest = rest;
                while let Some(deeper) = rest.strip_prefix(from.unit.as_str()) {
                    out.push_str(&to.unit);
                    rest = deeper;
                }
                out.push_str(rest);
            }
            None => out.push_str(line),
        }
    }
    out
}

/// Pending text insertions, applied back to front
#[derive(Debug, Default)]
pub(crate) struct Splice {
    insertions: Vec<(usize, String)>,
}

impl Splice {
    pub(crate) fn insert(&mut self, at: usize, text: String) {
        if !text.is_empty() {
            self.insertions.push((at, text));
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.insertions.is_empty()
    }

    /// Apply to `existing`; earlier insertions at the same offset come first
    pub(crate) fn apply(self, existing: &str) -> String {
        let crlf = existing.contains("\r\n");
        let mut ordered: Vec<(usize, usize, String)> = self
            .insertions
            .into_iter()
            .enumerate()
            .map(|(seq, (at, text))| (at.min(existing.len()), seq, text))
            .collect();
        ordered.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));

        let mut merged = existing.to_string();
        for (at, _, text) in ordered {
            let mut text = if at > 0 && !existing[..at].ends_with('\n') {
                format!("\n{}", text)
            } else {
                text
            };
            if crlf {
                text = text.replace('\n', "\r\n");
            }
            merged.insert_str(at, &text);
        }
        merged
    }
}

/// Text of `members` from `candidate`, in the existing file's indentation,
/// keeping the blank line before each member that had one. Members declared
/// by the same statement are written once.
pub(crate) fn member_block(candidate: &str, members: &[&Member], from: &IndentStyle, to: &IndentStyle) -> String {
    let mut block = String::new();
    for (idx, member) in members.iter().enumerate() {
        if members[..idx].iter().any(|m| m.span == member.span) {
            continue;
        }
        if member.blank_before {
            block.push('\n');
        }
        block.push_str(&reindent(&candidate[member.span.clone()], from, to));
        if !block.ends_with('\n') {
            block.push('\n');
        }
    }
    block
}

/// Offset for new fields: after the field block, before the first method
pub(crate) fn field_anchor(existing: &StructuralSnapshot) -> FieldAnchor {
    let first_method = existing
        .members
        .iter()
        .filter(|m| m.kind == MemberKind::Method)
        .map(|m| m.span.start)
        .min();
    let last_field = existing
        .fields()
        .filter(|f| first_method.map_or(true, |start| f.span.end <= start))
        .map(|f| f.span.end)
        .max();
    match (last_field, first_method) {
        (Some(end), _) => FieldAnchor::After(end),
        (None, Some(start)) => FieldAnchor::Before(start),
        (None, None) if existing.members.is_empty() => FieldAnchor::Empty(existing.body_end),
        (None, None) => FieldAnchor::After(existing.body_end),
    }
}

/// An insertion point sitting mid-line with only blanks before the body's
/// inline closing brace moves onto that brace
pub(crate) fn past_inline_tail(existing: &str, at: usize, body_end: usize) -> usize {
    let mid_line = at > 0 && existing.as_bytes().get(at - 1).is_some_and(|&b| b != b'\n');
    match existing.get(at..body_end) {
        Some(tail) if mid_line && tail.bytes().all(|b| b == b' ' || b == b'\t') => body_end,
        _ => at,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldAnchor {
    After(usize),
    Before(usize),
    Empty(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(member: &str, unit: &str) -> IndentStyle {
        IndentStyle {
            member: member.into(),
            unit: unit.into(),
        }
    }

    #[test]
    fn test_reindent_scales_levels() {
        let text = "    void f() {\n        run();\n\n    }\n";
        assert_eq!(
            reindent(text, &style("    ", "    "), &style("  ", "  ")),
            "  void f() {\n    run();\n\n  }\n"
        );
    }

    #[test]
    fn test_splice_orders_and_keeps_line_endings() {
        let mut splice = Splice::default();
        splice.insert(3, "b\n".into());
        splice.insert(3, "c\n".into());
        splice.insert(0, "a\n".into());
        assert_eq!(splice.apply("x\r\ny"), "a\r\nx\r\nb\r\nc\r\ny");

        let mut splice = Splice::default();
        splice.insert(1, "z\n".into());
        assert_eq!(splice.apply("x"), "x\nz\n");
    }

    #[test]
    fn test_inline_tail_moves_to_closing_brace() {
        let line = "class A { int a; }\n";
        assert_eq!(past_inline_tail(line, 16, 17), 17);
        assert_eq!(past_inline_tail("class A { int a; int b; }\n", 16, 24), 16);
        assert_eq!(past_inline_tail("class A {\n  int a;\n}\n", 19, 19), 19);
    }
}
