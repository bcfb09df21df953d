//! Structural scanner for brace-delimited languages (Java, TypeScript, C#, PHP)
//!
//! Strings, character literals and comments are masked first so braces and
//! semicolons inside them never count. The masked copy keeps every byte
//! offset of the original.

use tracing::trace;

use super::snapshot::{
    blank_line_before, indent_at, is_ident_byte, line_end, line_number, line_start, parse_es_clause, squash,
    Import, Member, MemberKind, StructuralSnapshot,
};
use super::MergeError;

const TYPE_KEYWORDS: [&str; 5] = ["class", "interface", "enum", "record", "struct"];
const MODIFIERS: [&str; 22] = [
    "public", "private", "protected", "internal", "static", "final", "transient", "volatile", "readonly",
    "const", "virtual", "override", "abstract", "sealed", "new", "required", "declare", "async", "default",
    "synchronized", "native", "partial",
];
const PARAM_MODIFIERS: [&str; 10] = [
    "final", "readonly", "public", "private", "protected", "ref", "out", "in", "params", "this",
];
const CONTROL_WORDS: [&str; 7] = ["if", "for", "while", "switch", "catch", "using", "lock"];

/// Blank out comments and literals, keeping newlines and offsets
pub(crate) fn mask(source: &str) -> Result<Vec<u8>, MergeError> {
    let bytes = source.as_bytes();
    let mut out = bytes.to_vec();
    let mut i = 0;
    let blank = |out: &mut Vec<u8>, from: usize, to: usize| {
        for b in &mut out[from..to] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    };

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match (b, next) {
            (b'/', Some(b'/')) => {
                let end = bytes[i..].iter().position(|&c| c == b'\n').map_or(bytes.len(), |p| i + p);
                blank(&mut out, i, end);
                i = end;
            }
            (b'/', Some(b'*')) => {
                let end = find(bytes, i + 2, b"*/")
                    .map(|p| p + 2)
                    .ok_or(MergeError::Unbalanced { line: line_number(bytes, i) })?;
                blank(&mut out, i, end);
                i = end;
            }
            (b'"', _) if bytes[i..].starts_with(b"\"\"\"") => {
                let end = find(bytes, i + 3, b"\"\"\"")
                    .map(|p| p + 3)
                    .ok_or(MergeError::Unbalanced { line: line_number(bytes, i) })?;
                blank(&mut out, i, end);
                i = end;
            }
            (b'"', _) | (b'\'', _) | (b'`', _) => {
                let verbatim = b == b'"' && i > 0 && (bytes[i - 1] == b'@' || (i > 1 && bytes[i - 2] == b'@'));
                let end = literal_end(bytes, i, b, verbatim)
                    .ok_or(MergeError::Unbalanced { line: line_number(bytes, i) })?;
                blank(&mut out, i, end);
                i = end;
            }
            _ => i += 1,
        }
    }
    Ok(out)
}

fn find(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}

/// End (exclusive) of the literal opened by `quote` at `start`
fn literal_end(bytes: &[u8], start: usize, quote: u8, verbatim: bool) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' && !verbatim {
            i += 2;
            continue;
        }
        if b == quote {
            if verbatim && bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return Some(i + 1);
        }
        if b == b'\n' && quote != b'`' && !verbatim {
            return None;
        }
        i += 1;
    }
    None
}

/// Offset of the bracket closing the one opened at `open`
fn matching(masked: &[u8], open: usize) -> Option<usize> {
    let (opener, closer) = match masked[open] {
        b'{' => (b'{', b'}'),
        b'(' => (b'(', b')'),
        b'[' => (b'[', b']'),
        _ => return None,
    };
    let mut depth = 0usize;
    for (offset, &b) in masked[open..].iter().enumerate() {
        if b == opener {
            depth += 1;
        } else if b == closer {
            depth -= 1;
            if depth == 0 {
                return Some(open + offset);
            }
        }
    }
    None
}

fn check_balance(masked: &[u8]) -> Result<(), MergeError> {
    let mut open: Vec<usize> = Vec::new();
    for (i, &b) in masked.iter().enumerate() {
        match b {
            b'{' => open.push(i),
            b'}' => {
                if open.pop().is_none() {
                    return Err(MergeError::Unbalanced { line: line_number(masked, i) });
                }
            }
            _ => {}
        }
    }
    match open.last() {
        Some(&i) => Err(MergeError::Unbalanced { line: line_number(masked, i) }),
        None => Ok(()),
    }
}

fn skip_ws(masked: &[u8], mut i: usize, end: usize) -> usize {
    while i < end && masked[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn word_at(masked: &[u8], i: usize) -> &str {
    let end = masked[i..]
        .iter()
        .position(|&b| !is_ident_byte(b))
        .map_or(masked.len(), |p| i + p);
    std::str::from_utf8(&masked[i..end]).unwrap_or("")
}

/// Locate `<keyword> <name>`: declaration line, opening brace and keyword
fn find_type<'m>(masked: &'m [u8], target: Option<&str>) -> Option<(usize, usize, &'m str)> {
    let mut i = 0;
    while i < masked.len() {
        if !is_ident_byte(masked[i]) || (i > 0 && is_ident_byte(masked[i - 1])) {
            i += 1;
            continue;
        }
        let word = word_at(masked, i);
        let after = i + word.len();
        if TYPE_KEYWORDS.contains(&word) && (i == 0 || masked[i - 1] != b'@') {
            let name_at = skip_ws(masked, after, masked.len());
            let name = word_at(masked, name_at);
            if !name.is_empty() && target.map_or(true, |t| t == name) {
                let rest = &masked[name_at..];
                let open = rest.iter().position(|&b| b == b'{' || b == b';');
                if let Some(p) = open.filter(|&p| rest[p] == b'{') {
                    return Some((line_start(masked, i), name_at + p, word));
                }
            }
        }
        i = after.max(i + 1);
    }
    None
}

/// Skip `@Annotation(...)` and `[Attribute(...)]` prefixes
fn skip_annotations(masked: &[u8], mut i: usize, end: usize) -> usize {
    loop {
        i = skip_ws(masked, i, end);
        if i >= end {
            return i;
        }
        match masked[i] {
            b'@' if i + 1 < end && is_ident_byte(masked[i + 1]) => {
                i += 1;
                while i < end && (is_ident_byte(masked[i]) || masked[i] == b'.') {
                    i += 1;
                }
                let j = skip_ws(masked, i, end);
                if j < end && masked[j] == b'(' {
                    match matching(masked, j) {
                        Some(close) => i = close + 1,
                        None => return end,
                    }
                }
            }
            b'[' => match matching(masked, i) {
                Some(close) => i = close + 1,
                None => return end,
            },
            _ => return i,
        }
    }
}

/// First standalone `=` (not `==`, `=>`, `<=`, `>=`, `!=`)
fn assignment(header: &str) -> Option<usize> {
    let bytes = header.as_bytes();
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'<' | b'(' | b'[' => depth += 1,
            b'>' if i > 0 && bytes[i - 1] != b'=' => depth -= 1,
            b')' | b']' => depth -= 1,
            b'=' if depth <= 0 => {
                let prev = i.checked_sub(1).map(|p| bytes[p]);
                let next = bytes.get(i + 1).copied();
                let compound = matches!(prev, Some(b'=' | b'!' | b'<' | b'>'))
                    || matches!(next, Some(b'=' | b'>'));
                if !compound {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn strip_modifiers<'a>(mut text: &'a str, modifiers: &[&str]) -> &'a str {
    loop {
        let trimmed = text.trim_start();
        let word_len = trimmed
            .bytes()
            .position(|b| !is_ident_byte(b))
            .unwrap_or(trimmed.len());
        let word = &trimmed[..word_len];
        if word_len > 0 && modifiers.contains(&word) && trimmed[word_len..].starts_with(char::is_whitespace) {
            text = &trimmed[word_len..];
        } else {
            return trimmed;
        }
    }
}

/// Split `Type name` at the trailing identifier
fn split_declaration(text: &str) -> Option<(&str, &str)> {
    let text = text.trim();
    let name_start = text
        .bytes()
        .rposition(|b| !is_ident_byte(b))
        .map_or(0, |p| p + 1);
    let name = &text[name_start..];
    if name.is_empty() {
        return None;
    }
    Some((text[..name_start].trim(), name))
}

fn parameter_type(param: &str) -> String {
    let bytes = param.as_bytes();
    let start = skip_annotations(bytes, 0, bytes.len());
    let param = strip_modifiers(&param[start..], &PARAM_MODIFIERS);
    let param = match assignment(param) {
        Some(eq) => &param[..eq],
        None => param,
    };
    if let Some((_, ty)) = param.split_once(':') {
        return squash(ty);
    }
    match split_declaration(param) {
        Some((ty, _)) if !ty.is_empty() => squash(ty),
        _ => squash(param),
    }
}

fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'<' | b'(' | b'[' | b'{' => depth += 1,
            b'>' | b')' | b']' | b'}' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

/// `<modifiers> <keyword> <Name>` at the head of a member header
fn type_head(header: &str) -> Option<(&str, &str)> {
    let head = strip_modifiers(header, &MODIFIERS);
    let keyword_len = head.bytes().position(|b| !is_ident_byte(b)).unwrap_or(head.len());
    let (keyword, rest) = head.split_at(keyword_len);
    if !TYPE_KEYWORDS.contains(&keyword) || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    // `record struct Point`
    let rest = strip_modifiers(rest, &TYPE_KEYWORDS);
    let name_len = rest.bytes().position(|b| !is_ident_byte(b)).unwrap_or(rest.len());
    (name_len > 0).then(|| (keyword, &rest[..name_len]))
}

/// Start of a top-level `=>` opening an expression body
fn expression_body(header: &str) -> Option<usize> {
    let bytes = header.as_bytes();
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b'=' if depth == 0 => {
                let prev = i.checked_sub(1).map(|p| bytes[p]);
                let next = bytes.get(i + 1).copied();
                if next == Some(b'>') {
                    return Some(i);
                }
                if !matches!(prev, Some(b'=' | b'!' | b'<' | b'>')) && next != Some(b'=') {
                    return None;
                }
            }
            _ => {}
        }
    }
    None
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(is_ident_byte)
}

/// Names declared by `Type a, b = init, c`; `None` unless every declarator
/// after the first is a bare name
fn declarators(declaration: &str) -> Option<(String, Vec<String>)> {
    let parts = split_top_level(declaration);
    let (first, rest) = parts.split_first()?;
    let head = match assignment(first) {
        Some(eq) => &first[..eq],
        None => first,
    };
    let (ty, name) = split_declaration(head)?;
    let mut names = vec![name.to_string()];
    for part in rest {
        let name = match assignment(part) {
            Some(eq) => &part[..eq],
            None => part,
        };
        let name = name.trim();
        if !is_identifier(name) {
            return None;
        }
        names.push(name.to_string());
    }
    Some((squash(ty), names))
}

/// Classify a member header (annotations already skipped); one entry per
/// declared name
fn classify(header: &str) -> Vec<(MemberKind, String, String)> {
    let header = header.trim();
    if header.is_empty() || header.starts_with('=') {
        return Vec::new();
    }
    if let Some((_, name)) = type_head(header) {
        return vec![(MemberKind::Type, name.to_string(), String::new())];
    }
    let header = match expression_body(header) {
        Some(arrow) => header[..arrow].trim_end(),
        None => header,
    };

    let eq = assignment(header);
    let paren = header.find('(');
    match paren {
        Some(open) if eq.map_or(true, |eq| open < eq) => {
            let Some((_, name)) = split_declaration(&header[..open]) else {
                return Vec::new();
            };
            if CONTROL_WORDS.contains(&name) {
                return Vec::new();
            }
            let close = header[open..].find(')').map(|p| open + p);
            let close = close.map(|c| {
                let masked = header.as_bytes();
                matching(masked, open).unwrap_or(c)
            });
            let params = close.map_or("", |close| &header[open + 1..close]);
            let signature = split_top_level(params)
                .into_iter()
                .map(parameter_type)
                .collect::<Vec<_>>()
                .join(",");
            vec![(MemberKind::Method, name.to_string(), signature)]
        }
        _ => {
            let declaration = match eq {
                Some(eq) => &header[..eq],
                None => header,
            };
            let declaration = strip_modifiers(declaration, &MODIFIERS);
            if let Some((name, ty)) = declaration.split_once(':') {
                let name = name.trim().trim_end_matches(['?', '!']);
                return match split_declaration(name) {
                    Some((_, name)) => vec![(MemberKind::Field, name.to_string(), squash(ty))],
                    None => Vec::new(),
                };
            }
            if let Some((ty, names)) = declarators(strip_modifiers(header, &MODIFIERS)) {
                if !ty.is_empty() || eq.is_some() {
                    return names
                        .into_iter()
                        .map(|name| (MemberKind::Field, name, ty.clone()))
                        .collect();
                }
                return Vec::new();
            }
            match split_declaration(declaration) {
                Some((ty, name)) if !ty.is_empty() || eq.is_some() => {
                    vec![(MemberKind::Field, name.to_string(), squash(ty))]
                }
                _ => Vec::new(),
            }
        }
    }
}

/// End of an enum's constant list: its `;` when members follow, else the
/// closing brace
fn enum_constants_end(masked: &[u8], open: usize, close: usize) -> usize {
    let mut depth = 0i32;
    for (i, &b) in masked.iter().enumerate().take(close).skip(open + 1) {
        match b {
            b'(' | b'{' | b'[' => depth += 1,
            b')' | b'}' | b']' => depth -= 1,
            b';' if depth == 0 => return i,
            _ => {}
        }
    }
    close
}

/// Comma-joined constant names of the enum body opened at `open`
fn enum_constants(masked: &[u8], open: usize, close: usize) -> String {
    let end = enum_constants_end(masked, open, close);
    let list = std::str::from_utf8(&masked[open + 1..end]).unwrap_or("");
    split_top_level(list)
        .into_iter()
        .filter_map(|constant| {
            let bytes = constant.as_bytes();
            let constant = &constant[skip_annotations(bytes, 0, bytes.len())..];
            let len = constant.bytes().position(|b| !is_ident_byte(b)).unwrap_or(constant.len());
            (len > 0).then(|| &constant[..len])
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn scan_members(source: &str, masked: &[u8], open: usize, close: usize) -> Vec<Member> {
    let mut members = Vec::new();
    let mut i = open + 1;
    let mut floor = line_end(masked, open);
    while i < close {
        let start = skip_ws(masked, i, close);
        if start >= close {
            break;
        }
        let header_start = skip_annotations(masked, start, close);
        let mut j = header_start;
        let mut depth = 0i32;
        let mut end = close;
        while j < close {
            match masked[j] {
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth -= 1,
                b';' if depth <= 0 => {
                    end = j;
                    break;
                }
                b'{' if depth <= 0 => {
                    end = matching(masked, j).unwrap_or(close);
                    break;
                }
                _ => {}
            }
            j += 1;
        }
        let header_end = j.min(close);
        let mut member_end = end;

        // `{ get; set; } = value;` and `= () => { ... };` continue past the block
        if end < close && masked[end] == b'}' {
            let mut k = end + 1;
            while k < close && (masked[k] == b' ' || masked[k] == b'\t') {
                k += 1;
            }
            if k < close && masked[k] == b';' {
                member_end = k;
            } else if k < close && masked[k] == b'=' && masked.get(k + 1) != Some(&b'>') {
                let mut m = k;
                while m < close && masked[m] != b';' {
                    if masked[m] == b'{' {
                        m = matching(masked, m).unwrap_or(close);
                    }
                    m += 1;
                }
                member_end = m.min(close.saturating_sub(1));
            }
        }

        let header = std::str::from_utf8(&masked[header_start..header_end]).unwrap_or("");
        let declared = classify(header);
        if !declared.is_empty() {
            // Members sharing a line with earlier text start right after it
            let mut span_start = line_start(masked, start).max(i);
            // Leading comment lines belong to the member
            while span_start > floor {
                let prev = line_start(masked, span_start - 1);
                let commented = masked[prev..span_start].iter().all(u8::is_ascii_whitespace)
                    && !source.as_bytes()[prev..span_start].iter().all(u8::is_ascii_whitespace);
                if !commented {
                    break;
                }
                span_start = prev;
            }
            let span_end = line_end(masked, member_end).min(line_start(masked, close).max(member_end + 1));
            let nested_enum = header_end < close
                && masked[header_end] == b'{'
                && type_head(header).is_some_and(|(keyword, _)| keyword == "enum");
            for (kind, name, signature) in declared {
                let signature = if nested_enum {
                    enum_constants(masked, header_end, end)
                } else {
                    signature
                };
                trace!(kind = kind.as_str(), %name, %signature, "Scanned member");
                members.push(Member {
                    kind,
                    name,
                    signature,
                    span: span_start..span_end,
                    blank_before: blank_line_before(source.as_bytes(), span_start),
                });
            }
        }
        i = member_end + 1;
        floor = line_end(masked, member_end);
    }
    members
}

fn scan_preamble(source: &str, masked: &[u8], limit: usize) -> (Vec<Import>, Option<usize>) {
    let mut imports = Vec::new();
    let mut preamble_end = None;
    let mut i = 0;
    let open_tag = skip_ws(masked, 0, limit);
    if masked[open_tag..limit].starts_with(b"<?php") {
        i = open_tag + "<?php".len();
    }
    loop {
        let start = skip_ws(masked, i, limit);
        if start >= limit {
            break;
        }
        let word = word_at(masked, start);
        if !matches!(word, "import" | "using" | "use" | "package" | "namespace" | "declare") {
            break;
        }
        // TypeScript allows imports without a semicolon
        let mut end = start;
        let mut depth = 0i32;
        while end < limit {
            match masked[end] {
                b'{' if word == "namespace" => break,
                b'{' => depth += 1,
                b'}' => depth -= 1,
                b';' if depth <= 0 => break,
                b'\n' if depth <= 0 && word == "import" => {
                    let text = source[start..end].trim_end();
                    if text.ends_with(['\'', '"']) {
                        break;
                    }
                }
                _ => {}
            }
            end += 1;
        }
        if end >= limit || masked[end] == b'{' {
            break;
        }
        let text = source[start..end].trim().trim_end_matches(';').trim();
        let span = line_start(masked, start)..line_end(masked, end);
        match word {
            "package" | "namespace" | "declare" => preamble_end = Some(span.end),
            _ => imports.push(parse_import(word, text, span)),
        }
        i = end + 1;
    }
    (imports, preamble_end)
}

fn parse_import(keyword: &str, text: &str, span: std::ops::Range<usize>) -> Import {
    let body = text[keyword.len()..].trim();
    let full = format!("{};", text);
    if keyword == "import" {
        if let Some(from) = body.rfind(" from ") {
            let module = body[from + 6..].trim().trim_matches(['\'', '"']).to_string();
            let (default, names) = parse_es_clause(&body[..from]);
            return Import {
                module: Some(module),
                names,
                default,
                text: full,
                span,
            };
        }
        if body.starts_with(['\'', '"']) {
            return Import {
                module: Some(body.trim_matches(['\'', '"']).to_string()),
                names: Vec::new(),
                default: None,
                text: full,
                span,
            };
        }
    }
    Import::path(squash(body), full, span)
}

/// Snapshot of the type named `target` (first type when `None`)
pub(crate) fn scan(source: &str, target: Option<&str>) -> Result<StructuralSnapshot, MergeError> {
    let masked = mask(source)?;
    check_balance(&masked)?;
    let (decl_line, open, keyword) = find_type(&masked, target).ok_or_else(|| MergeError::TargetNotFound {
        name: target.unwrap_or("class").to_string(),
    })?;
    let close = matching(&masked, open).ok_or(MergeError::Unbalanced {
        line: line_number(&masked, open),
    })?;

    // Enum constants are opaque; only members after them are scanned
    let members_from = if keyword == "enum" {
        enum_constants_end(&masked, open, close)
    } else {
        open
    };
    let members = scan_members(source, &masked, members_from, close);
    let (imports, preamble_end) = scan_preamble(source, &masked, decl_line);

    let close_line = line_start(&masked, close);
    let inline_close = masked[close_line..close].iter().any(|b| !b.is_ascii_whitespace());
    let member_indent = members
        .iter()
        .find(|m| line_start(&masked, m.span.start) == m.span.start)
        .map(|m| indent_at(source, m.span.start));
    Ok(StructuralSnapshot {
        members,
        imports,
        body_start: line_end(&masked, open),
        body_end: if inline_close { close } else { close_line },
        member_indent,
        type_indent: indent_at(source, decl_line),
        preamble_end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAVA: &str = r#"package com.acme.entity;

import jakarta.persistence.*;
import java.util.List;

@Entity
@Table(name = "orders")
public class Order {
    public enum OrderStatus {
        DRAFT, PLACED
    }

    @Id
    private Long id;

    // braces in comments { are ignored
    @Column(nullable = false, name = "}")
    private String number;

    private List<Line> lines = new ArrayList<>();

    public String getNumber() {
        String s = "{";
        return number;
    }

    public void rename(@NotNull String name, final int count) {
    }

    public abstract void close();
}
"#;

    #[test]
    fn test_scans_java_members() {
        let snapshot = scan(JAVA, Some("Order")).unwrap();
        let members: Vec<(MemberKind, &str, &str)> = snapshot
            .members
            .iter()
            .map(|m| (m.kind, m.name.as_str(), m.signature.as_str()))
            .collect();
        assert_eq!(
            members,
            vec![
                (MemberKind::Type, "OrderStatus", "DRAFT,PLACED"),
                (MemberKind::Field, "id", "Long"),
                (MemberKind::Field, "number", "String"),
                (MemberKind::Field, "lines", "List<Line>"),
                (MemberKind::Method, "getNumber", ""),
                (MemberKind::Method, "rename", "String,int"),
                (MemberKind::Method, "close", ""),
            ]
        );
        assert_eq!(snapshot.imports.len(), 2);
        assert!(snapshot.has_path_import("java.util.List"));
        assert_eq!(snapshot.member_indent.as_deref(), Some("    "));
        assert_eq!(&JAVA[snapshot.body_end..], "}\n");
        assert!(snapshot.preamble_end.is_some());
    }

    #[test]
    fn test_field_span_includes_annotations() {
        let snapshot = scan(JAVA, Some("Order")).unwrap();
        let number = snapshot.named(MemberKind::Field, "number").next().unwrap();
        assert_eq!(
            &JAVA[number.span.clone()],
            "    // braces in comments { are ignored\n    @Column(nullable = false, name = \"}\")\n    private String number;\n"
        );
        assert!(number.blank_before);
    }

    #[test]
    fn test_scans_typescript_and_csharp_shapes() {
        let ts = "import { Column, Entity } from 'typeorm';\nimport { Customer } from './customer.entity'\n\n@Entity('orders')\nexport class Order {\n  @Column({ nullable: true })\n  note?: string | null;\n\n  status: OrderStatus = OrderStatus.DRAFT;\n\n  publish(): void {\n    throw new Error(`Cannot ${this.status}`);\n  }\n}\n";
        let snapshot = scan(ts, Some("Order")).unwrap();
        let names: Vec<&str> = snapshot.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["note", "status", "publish"]);
        assert_eq!(snapshot.imported_from("typeorm"), vec!["Column", "Entity"]);
        assert_eq!(snapshot.imported_from("./customer.entity"), vec!["Customer"]);

        let cs = "namespace Shop.Entities;\n\npublic class Order\n{\n    [Required]\n    public string Number { get; set; } = string.Empty;\n\n    public Task<List<Order>> FindAllAsync() => _context.Set<Order>().ToListAsync();\n}\n";
        let snapshot = scan(cs, Some("Order")).unwrap();
        let members: Vec<(MemberKind, &str)> = snapshot.members.iter().map(|m| (m.kind, m.name.as_str())).collect();
        assert_eq!(
            members,
            vec![(MemberKind::Field, "Number"), (MemberKind::Method, "FindAllAsync")]
        );
        let number = &snapshot.members[0];
        assert!(cs[number.span.clone()].ends_with("= string.Empty;\n"));
    }

    #[test]
    fn test_enum_constants_are_opaque() {
        let java = "public enum Status {\n    DRAFT(\"d\"),\n    PLACED(\"p\");\n\n    public boolean isFinal() {\n        return this == PLACED;\n    }\n}\n";
        let snapshot = scan(java, Some("Status")).unwrap();
        let names: Vec<&str> = snapshot.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["isFinal"]);

        let ts = "export enum OrderStatus {\n  DRAFT = 'DRAFT',\n  PLACED = 'PLACED',\n}\n";
        assert!(scan(ts, Some("OrderStatus")).unwrap().members.is_empty());
    }

    fn kinds(source: &str, target: &str) -> Vec<(MemberKind, String, String)> {
        scan(source, Some(target))
            .unwrap()
            .members
            .into_iter()
            .map(|m| (m.kind, m.name, m.signature))
            .collect()
    }

    fn member(kind: MemberKind, name: &str, signature: &str) -> (MemberKind, String, String) {
        (kind, name.to_string(), signature.to_string())
    }

    #[test]
    fn test_type_keywords_as_member_names() {
        let java = "public class Ledger {\n    private String record;\n    private Layout struct = Layout.FLAT;\n\n    public void setRecord(String record) {\n        this.record = record;\n    }\n\n    public static final class Entry {\n    }\n\n    public record Line(String code) {\n    }\n}\n";
        assert_eq!(
            kinds(java, "Ledger"),
            vec![
                member(MemberKind::Field, "record", "String"),
                member(MemberKind::Field, "struct", "Layout"),
                member(MemberKind::Method, "setRecord", "String"),
                member(MemberKind::Type, "Entry", ""),
                member(MemberKind::Type, "Line", ""),
            ]
        );

        let ts = "export class Ledger {\n  enum: string;\n  record = 0;\n}\n";
        assert_eq!(
            kinds(ts, "Ledger"),
            vec![
                member(MemberKind::Field, "enum", "string"),
                member(MemberKind::Field, "record", ""),
            ]
        );
    }

    #[test]
    fn test_multi_declarator_fields() {
        let java = "public class Address {\n    private String street, city;\n    private int floor = 1, unit;\n    private Map<String, Integer> counts = new HashMap<>();\n}\n";
        let snapshot = scan(java, Some("Address")).unwrap();
        let members: Vec<(MemberKind, &str, &str)> = snapshot
            .members
            .iter()
            .map(|m| (m.kind, m.name.as_str(), m.signature.as_str()))
            .collect();
        assert_eq!(
            members,
            vec![
                (MemberKind::Field, "street", "String"),
                (MemberKind::Field, "city", "String"),
                (MemberKind::Field, "floor", "int"),
                (MemberKind::Field, "unit", "int"),
                (MemberKind::Field, "counts", "Map<String,Integer>"),
            ]
        );
        assert_eq!(snapshot.members[0].span, snapshot.members[1].span);
    }

    #[test]
    fn test_expression_bodied_members() {
        let cs = "public class Order\n{\n    public string Label => $\"#{Number}\";\n    public bool IsOpen => Status.IsOpen();\n    public int Count() => Lines.Count;\n}\n";
        assert_eq!(
            kinds(cs, "Order"),
            vec![
                member(MemberKind::Field, "Label", "string"),
                member(MemberKind::Field, "IsOpen", "bool"),
                member(MemberKind::Method, "Count", ""),
            ]
        );
    }

    #[test]
    fn test_one_line_body() {
        let java = "public class Order { private String number; }\n";
        let snapshot = scan(java, Some("Order")).unwrap();
        let number = &snapshot.members[0];
        assert_eq!(&java[number.span.clone()], " private String number;");
        assert_eq!(snapshot.member_indent, None);
        assert_eq!(&java[snapshot.body_end..], "}\n");
    }

    #[test]
    fn test_nested_enum_signature_lists_constants() {
        let cs = "public class Post\n{\n    public enum PostStatus { Draft, Published = 2 }\n}\n";
        assert_eq!(
            kinds(cs, "Post"),
            vec![member(MemberKind::Type, "PostStatus", "Draft,Published")]
        );
    }

    #[test]
    fn test_php_preamble_and_members() {
        let php = "<?php\n\ndeclare(strict_types=1);\n\nnamespace App\\Models;\n\nuse Illuminate\\Database\\Eloquent\\Model;\nuse Illuminate\\Database\\Eloquent\\Relations\\HasMany;\n\nclass Order extends Model\n{\n    public const STATUS_DRAFT = 'DRAFT';\n\n    protected $fillable = [\n        'number',\n    ];\n\n    public function lines(): HasMany\n    {\n        return $this->hasMany(OrderLine::class);\n    }\n}\n";
        let snapshot = scan(php, Some("Order")).unwrap();
        assert!(snapshot.has_path_import("Illuminate\\Database\\Eloquent\\Model"));
        assert!(snapshot.has_path_import("Illuminate\\Database\\Eloquent\\Relations\\HasMany"));
        assert_eq!(&php[..snapshot.preamble_end.unwrap()], "<?php\n\ndeclare(strict_types=1);\n\nnamespace App\\Models;\n");
        assert_eq!(
            kinds(php, "Order"),
            vec![
                member(MemberKind::Field, "STATUS_DRAFT", ""),
                member(MemberKind::Field, "$fillable", ""),
                member(MemberKind::Method, "lines", ""),
            ]
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            scan("class A {\n  void f() {\n}\n", None).unwrap_err(),
            MergeError::Unbalanced { line: 1 }
        );
        assert_eq!(
            scan("class A {}\n", Some("B")).unwrap_err(),
            MergeError::TargetNotFound { name: "B".into() }
        );
        assert!(matches!(
            scan("class A { String s = \"open; }\n", None),
            Err(MergeError::Unbalanced { .. })
        ));
    }
}
