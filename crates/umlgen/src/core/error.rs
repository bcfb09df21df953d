//! Core error types for diagram processing and code generation
//!
//! This module defines the error types shared by the parser, the model
//! builder, the generator registry and the incremental generation manager.

use std::path::PathBuf;

use thiserror::Error;

use crate::merge::MergeError;

/// Core error type for the diagram-to-code pipeline
#[derive(Error, Debug)]
pub enum UmlGenError {
    #[error("Parse error: {message} at line {line}")]
    DiagramSyntax { line: usize, message: String },

    #[error("Unresolved relationship {source_class} -> {target_class} at line {line}: class not declared")]
    UnresolvedRelationship {
        source_class: String,
        target_class: String,
        line: usize,
    },

    #[error("Unsupported language '{language}' (available: {available})")]
    UnsupportedLanguage { language: String, available: String },

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Worker pool error: {message}")]
    WorkerPool { message: String },
}

impl UmlGenError {
    /// Create a new syntax error at a 1-based line
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::DiagramSyntax {
            line,
            message: message.into(),
        }
    }

    /// Wrap an IO error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Line number for errors that point into the diagram text
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::DiagramSyntax { line, .. } | Self::UnresolvedRelationship { line, .. } => {
                Some(*line)
            }
            _ => None,
        }
    }
}

/// Result alias used across the library
pub type Result<T, E = UmlGenError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error() {
        let error = UmlGenError::syntax(5, "unterminated class body");
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Parse error"));
        assert!(error_msg.contains("unterminated class body"));
        assert!(error_msg.contains("line 5"));
        assert_eq!(error.line(), Some(5));
    }

    #[test]
    fn test_unsupported_language() {
        let error = UmlGenError::UnsupportedLanguage {
            language: "cobol".to_string(),
            available: "java, python".to_string(),
        };
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("cobol"));
        assert!(error_msg.contains("java, python"));
        assert_eq!(error.line(), None);
    }

    #[test]
    fn test_unresolved_relationship() {
        let error = UmlGenError::UnresolvedRelationship {
            source_class: "User".to_string(),
            target_class: "Ghost".to_string(),
            line: 12,
        };
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("User -> Ghost"));
        assert_eq!(error.line(), Some(12));
    }

    #[test]
    fn test_io_error_conversion() {
        use std::io;
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: UmlGenError = io_err.into();
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("IO error"));
        assert!(error_msg.contains("File not found"));
    }

    #[test]
    fn test_io_error_with_path() {
        use std::io;
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let error = UmlGenError::io("out/Invoice.java", io_err);
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("out/Invoice.java"));
        assert!(error_msg.contains("denied"));
    }
}
