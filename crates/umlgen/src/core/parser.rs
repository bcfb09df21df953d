//! Core parser trait for diagram markup
//!
//! This trait defines the interface for parsing one diagram block into a
//! database. Each dialect has its own parser implementation.

use super::{Database, Result};

/// Core trait for diagram parsers
///
/// # Example
/// ```
/// use umlgen::core::{Diagram, Parser};
/// use umlgen::plugins::class::ClassParser;
///
/// let parser = ClassParser::new();
/// let mut diagram = Diagram::new();
/// parser.parse("classDiagram\n    class User", &mut diagram).unwrap();
/// assert!(diagram.class("User").is_some());
/// ```
pub trait Parser<D: Database>: Send + Sync {
    /// Parse diagram markup into the provided database
    fn parse(&self, input: &str, database: &mut D) -> Result<()>;

    /// Get the name of this parser
    fn name(&self) -> &'static str;

    /// Get the version of this parser
    fn version(&self) -> &'static str;

    /// Check if the input can be parsed by this parser
    fn can_parse(&self, input: &str) -> bool;
}
