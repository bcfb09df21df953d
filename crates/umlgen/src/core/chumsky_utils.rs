//! Shared chumsky parser utilities for diagram parsing
//!
//! This module provides common parser combinators used across the
//! per-dialect statement parsers.

use chumsky::prelude::*;

use super::text::is_ident_char;

/// Parser extra carrying rich errors
pub type Extra<'src> = extra::Err<Rich<'src, char>>;

/// Parse inline whitespace only (spaces and tabs, no newlines).
///
/// Statements are parsed one line at a time, so newlines never appear in
/// their input.
pub fn inline_whitespace<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    one_of(" \t").repeated().ignored()
}

/// Parse required inline whitespace (at least one space or tab).
pub fn whitespace_required<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    one_of(" \t").repeated().at_least(1).ignored()
}

/// Parse an identifier made of alphanumerics and underscores
pub fn identifier<'src>() -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    any()
        .filter(|c: &char| is_ident_char(*c))
        .repeated()
        .at_least(1)
        .collect::<String>()
}

/// Parse a double-quoted string, returning its contents
pub fn quoted_string<'src>() -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    just('"')
        .ignore_then(any().filter(|c: &char| *c != '"').repeated().collect::<String>())
        .then_ignore(just('"'))
}

/// Parse `: label` up to the end of the line, trimmed
pub fn colon_label<'src>() -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    just(':')
        .ignore_then(any().repeated().collect::<String>())
        .map(|s| s.trim().to_string())
}

/// Run a statement parser against a whole line
pub fn parse_statement<'src, T>(
    parser: impl Parser<'src, &'src str, T, Extra<'src>>,
    input: &'src str,
) -> Result<T, String> {
    parser
        .then_ignore(end())
        .parse(input)
        .into_result()
        .map_err(|errors| {
            errors
                .into_iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        })
}

/// Strip `%%` and `//` comments from a line, returning the trimmed remainder
pub fn strip_comment(line: &str) -> &str {
    let trimmed = line.trim();
    if trimmed.starts_with("//") {
        return "";
    }
    match trimmed.find("%%") {
        Some(pos) => trimmed[..pos].trim_end(),
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_whitespace() {
        let parser = inline_whitespace().then(just("test"));
        assert!(parse_statement(parser.clone(), "test").is_ok());
        assert!(parse_statement(parser.clone(), " test").is_ok());
        assert!(parse_statement(parser.clone(), "\ttest").is_ok());
        // Should NOT consume newlines
        assert!(parse_statement(parser, "\ntest").is_err());
    }

    #[test]
    fn test_whitespace_required() {
        let parser = just("a").then(whitespace_required()).then(just("b"));
        assert!(parse_statement(parser.clone(), "a b").is_ok());
        assert!(parse_statement(parser.clone(), "a \t b").is_ok());
        assert!(parse_statement(parser, "ab").is_err());
    }

    #[test]
    fn test_identifier_and_quoted() {
        assert_eq!(parse_statement(identifier(), "Order_2"), Ok("Order_2".to_string()));
        assert!(parse_statement(identifier(), "").is_err());
        assert_eq!(parse_statement(quoted_string(), "\"1..*\""), Ok("1..*".to_string()));
    }

    #[test]
    fn test_colon_label() {
        assert_eq!(parse_statement(colon_label(), ":  places "), Ok("places".to_string()));
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("  %% this is a comment"), "");
        assert_eq!(strip_comment("// note"), "");
        assert_eq!(strip_comment("A --> B %% trailing"), "A --> B");
        assert_eq!(strip_comment("  class User  "), "class User");
    }
}
