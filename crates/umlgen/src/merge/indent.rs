//! Structural scanner for indentation-scoped sources (Python)

use tracing::trace;

use super::snapshot::{
    blank_line_before, indent_at, line_end, line_number, squash, Import, Member, MemberKind, StructuralSnapshot,
};
use super::MergeError;

/// Blank out `#` comments and string literals, keeping newlines and offsets
pub(crate) fn mask(source: &str) -> Result<Vec<u8>, MergeError> {
    let bytes = source.as_bytes();
    let mut out = bytes.to_vec();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let end = match b {
            b'#' => bytes[i..].iter().position(|&c| c == b'\n').map_or(bytes.len(), |p| i + p),
            b'"' | b'\'' => {
                let triple = [b, b, b];
                if bytes[i..].starts_with(&triple) {
                    bytes[i + 3..]
                        .windows(3)
                        .position(|w| w == triple)
                        .map(|p| i + 3 + p + 3)
                        .ok_or(MergeError::Unbalanced { line: line_number(bytes, i) })?
                } else {
                    string_end(bytes, i).ok_or(MergeError::Unbalanced { line: line_number(bytes, i) })?
                }
            }
            _ => {
                i += 1;
                continue;
            }
        };
        for c in &mut out[i..end] {
            if *c != b'\n' {
                *c = b' ';
            }
        }
        i = end;
    }
    Ok(out)
}

fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// One physical line of the masked source
#[derive(Debug, Clone, Copy)]
struct Line {
    start: usize,
    end: usize,
    indent: usize,
    blank: bool,
}

fn lines(masked: &[u8]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut start = 0;
    while start < masked.len() {
        let end = line_end(masked, start);
        let content = &masked[start..end];
        let indent = content.iter().take_while(|&&b| b == b' ' || b == b'\t').count();
        lines.push(Line {
            start,
            end,
            indent,
            blank: content.iter().all(u8::is_ascii_whitespace),
        });
        start = end;
    }
    lines
}

fn text<'a>(masked: &'a [u8], line: &Line) -> &'a str {
    std::str::from_utf8(&masked[line.start + line.indent..line.end])
        .unwrap_or("")
        .trim_end()
}

fn paren_delta(text: &str) -> i32 {
    text.bytes().fold(0, |depth, b| match b {
        b'(' | b'[' | b'{' => depth + 1,
        b')' | b']' | b'}' => depth - 1,
        _ => depth,
    })
}

/// Last line of the bracket continuation starting at `first`
fn continuation_end(masked: &[u8], lines: &[Line], first: usize, limit: usize) -> usize {
    let mut last = first;
    let mut depth = paren_delta(text(masked, &lines[first]));
    while depth > 0 && last + 1 < limit {
        last += 1;
        depth += paren_delta(text(masked, &lines[last]));
    }
    last
}

/// Last line of the statement starting at `first`, nested block included
fn statement_end(masked: &[u8], lines: &[Line], first: usize, limit: usize) -> usize {
    let indent = lines[first].indent;
    let mut last = continuation_end(masked, lines, first, limit);
    for (idx, line) in lines.iter().enumerate().take(limit).skip(last + 1) {
        if line.blank {
            continue;
        }
        if line.indent <= indent {
            break;
        }
        last = idx;
    }
    last
}

fn identifier(text: &str) -> &str {
    let end = text
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    &text[..end]
}

fn parameters(header: &str) -> String {
    let Some(open) = header.find('(') else {
        return String::new();
    };
    let close = header.rfind(')').unwrap_or(header.len());
    let inner = &header[open + 1..close.max(open + 1)];
    let mut depth = 0i32;
    let mut parts = Vec::new();
    let mut from = 0;
    for (i, b) in inner.bytes().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(&inner[from..i]);
                from = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&inner[from..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "self" && *p != "cls" && *p != "/" && *p != "*")
        .map(|p| {
            let p = p.split('=').next().unwrap_or(p);
            match p.split_once(':') {
                Some((_, ty)) => squash(ty),
                None => "_".to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn classify(statement: &str) -> Option<(MemberKind, String, String)> {
    let statement = statement.trim();
    let def = statement
        .strip_prefix("async def ")
        .or_else(|| statement.strip_prefix("def "));
    if let Some(rest) = def {
        let name = identifier(rest.trim_start());
        let header_end = rest.rfind(':').unwrap_or(rest.len());
        return (!name.is_empty()).then(|| (MemberKind::Method, name.to_string(), parameters(&rest[..header_end])));
    }
    if let Some(rest) = statement.strip_prefix("class ") {
        let name = identifier(rest.trim_start());
        return (!name.is_empty()).then(|| (MemberKind::Type, name.to_string(), String::new()));
    }

    let name = identifier(statement);
    if name.is_empty() || matches!(name, "pass" | "return" | "if" | "for" | "while" | "with" | "try" | "import" | "from") {
        return None;
    }
    let rest = statement[name.len()..].trim_start();
    if let Some(annotation) = rest.strip_prefix(':') {
        let annotation = annotation.split('=').next().unwrap_or(annotation);
        return Some((MemberKind::Field, name.to_string(), squash(annotation)));
    }
    let value = rest.strip_prefix('=').filter(|v| !v.starts_with('='))?;
    let value = value.trim();
    let head = value.find('(').map_or(value, |open| &value[..open]);
    Some((MemberKind::Field, name.to_string(), squash(head)))
}

fn find_class(masked: &[u8], lines: &[Line], target: Option<&str>) -> Option<usize> {
    lines.iter().position(|line| {
        let text = text(masked, line);
        text.strip_prefix("class ")
            .map(|rest| identifier(rest.trim_start()))
            .is_some_and(|name| !name.is_empty() && target.map_or(true, |t| t == name))
    })
}

fn scan_imports(source: &str, masked: &[u8], lines: &[Line], limit: usize) -> Vec<Import> {
    let mut imports = Vec::new();
    let mut idx = 0;
    while idx < limit {
        let line = &lines[idx];
        let content = text(masked, line);
        if line.blank || line.indent > 0 {
            idx += 1;
            continue;
        }
        if !(content.starts_with("import ") || content.starts_with("from ")) {
            if content.starts_with('@') || content.starts_with("class ") || content.starts_with("def ") {
                break;
            }
            idx += 1;
            continue;
        }
        let last = statement_end(masked, lines, idx, limit);
        let span = line.start..lines[last].end;
        let statement = squash_lines(&source[span.clone()]);
        let import = match statement.strip_prefix("from ") {
            Some(rest) => {
                let (module, names) = rest.split_once(" import ").unwrap_or((rest, ""));
                let names = names
                    .trim()
                    .trim_start_matches('(')
                    .trim_end_matches(')')
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .collect();
                Import {
                    module: Some(module.trim().to_string()),
                    names,
                    default: None,
                    text: statement.clone(),
                    span,
                }
            }
            None => {
                let path = statement.trim_start_matches("import ").trim().to_string();
                Import::path(path, statement.clone(), span)
            }
        };
        imports.push(import);
        idx = last + 1;
    }
    imports
}

/// Join a multi-line statement onto one line
fn squash_lines(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("( ", "(")
        .replace(" )", ")")
        .replace(",)", ")")
}

/// Snapshot of the class named `target` (first class when `None`)
pub(crate) fn scan(source: &str, target: Option<&str>) -> Result<StructuralSnapshot, MergeError> {
    let masked = mask(source)?;
    let lines = lines(&masked);
    let class_idx = find_class(&masked, &lines, target).ok_or_else(|| MergeError::TargetNotFound {
        name: target.unwrap_or("class").to_string(),
    })?;
    let class_line = lines[class_idx];
    let header_last = continuation_end(&masked, &lines, class_idx, lines.len());
    let header = (class_idx..=header_last).map(|i| text(&masked, &lines[i]));
    if header.map(paren_delta).sum::<i32>() != 0 {
        return Err(MergeError::Unbalanced { line: class_idx + 1 });
    }

    let body_first = header_last + 1;
    let body_limit = lines[body_first.min(lines.len())..]
        .iter()
        .position(|l| !l.blank && l.indent <= class_line.indent)
        .map_or(lines.len(), |p| body_first + p);
    let last_body_line = lines[body_first.min(body_limit)..body_limit]
        .iter()
        .rposition(|l| !l.blank)
        .map(|p| body_first + p);

    let first_member = lines[body_first.min(body_limit)..body_limit].iter().find(|l| !l.blank);
    let member_indent = first_member.map(|l| l.indent);

    let mut members = Vec::new();
    let mut decorator_start: Option<usize> = None;
    let mut idx = body_first;
    while idx < body_limit {
        let line = lines[idx];
        if line.blank || Some(line.indent) != member_indent {
            idx += 1;
            continue;
        }
        let content = text(&masked, &line);
        if content.starts_with('@') {
            decorator_start.get_or_insert(line.start);
            idx = statement_end(&masked, &lines, idx, body_limit).max(idx) + 1;
            continue;
        }
        let last = statement_end(&masked, &lines, idx, body_limit);
        let statement = (idx..=continuation_end(&masked, &lines, idx, body_limit))
            .map(|i| text(&masked, &lines[i]))
            .collect::<Vec<_>>()
            .join(" ");
        let span_start = decorator_start.take().unwrap_or(line.start);
        if let Some((kind, name, signature)) = classify(&statement) {
            trace!(kind = kind.as_str(), %name, %signature, "Scanned member");
            members.push(Member {
                kind,
                name,
                signature,
                span: span_start..lines[last].end,
                blank_before: blank_line_before(source.as_bytes(), span_start),
            });
        }
        idx = last + 1;
    }

    let imports = scan_imports(source, &masked, &lines, class_idx);
    let body_start = lines[header_last].end;
    let body_end = last_body_line.map_or(body_start, |i| lines[i].end);
    Ok(StructuralSnapshot {
        members,
        imports,
        body_start,
        body_end,
        member_indent: first_member.map(|l| indent_at(source, l.start)),
        type_indent: indent_at(source, class_line.start),
        preamble_end: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "from django.db import models\nfrom .customer import (\n    Customer,\n    Address,\n)\n\n\nclass Order(models.Model):\n    \"\"\"An order # not a comment\"\"\"\n\n    number = models.CharField(\n        max_length=255,\n    )\n    total: float = 0.0\n\n    class Meta:\n        db_table = \"orders\"\n\n    @property\n    def label(self) -> str:\n        return f\"#{self.number}\"\n\n    def ship(self, carrier: str, express=False) -> None:\n        raise ValueError(\"no\")\n\n\ndef helper():\n    pass\n";

    #[test]
    fn test_scans_python_class() {
        let snapshot = scan(MODEL, Some("Order")).unwrap();
        let members: Vec<(MemberKind, &str, &str)> = snapshot
            .members
            .iter()
            .map(|m| (m.kind, m.name.as_str(), m.signature.as_str()))
            .collect();
        assert_eq!(
            members,
            vec![
                (MemberKind::Field, "number", "models.CharField"),
                (MemberKind::Field, "total", "float"),
                (MemberKind::Type, "Meta", ""),
                (MemberKind::Method, "label", ""),
                (MemberKind::Method, "ship", "str,_"),
            ]
        );
        let label = snapshot.named(MemberKind::Method, "label").next().unwrap();
        assert!(MODEL[label.span.clone()].starts_with("    @property\n"));
        assert!(label.blank_before);
        assert_eq!(snapshot.member_indent.as_deref(), Some("    "));
        assert!(MODEL[..snapshot.body_end].ends_with("raise ValueError(\"no\")\n"));
    }

    #[test]
    fn test_scans_python_imports() {
        let snapshot = scan(MODEL, None).unwrap();
        assert_eq!(snapshot.imported_from("django.db"), vec!["models"]);
        assert_eq!(snapshot.imported_from(".customer"), vec!["Customer", "Address"]);
        assert_eq!(snapshot.imports[1].text, "from .customer import (Customer, Address)");
    }

    #[test]
    fn test_python_errors() {
        assert_eq!(
            scan("class A:\n    x = 1\n", Some("B")).unwrap_err(),
            MergeError::TargetNotFound { name: "B".into() }
        );
        assert!(matches!(
            scan("class A:\n    x = \"open\n", None),
            Err(MergeError::Unbalanced { line: 2 })
        ));
    }
}
