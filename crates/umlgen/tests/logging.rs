//! Tests for logging functionality
//!
//! These tests verify that logging initialization works with different
//! configurations and that the pipeline runs under a capturing subscriber.

use std::str::FromStr;

use tracing_subscriber::util::SubscriberInitExt;
use umlgen::core::logging::{init_logging, resolve_format, resolve_level, LogFormat};

#[test]
fn test_log_format_parsing() {
    assert_eq!(LogFormat::from_str("compact").unwrap(), LogFormat::Compact);
    assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
    assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
    assert!(LogFormat::from_str("xml").is_err());
    assert_eq!(LogFormat::variants(), &["compact", "pretty", "json"]);
}

#[test]
fn test_explicit_settings_win() {
    assert_eq!(resolve_level(Some("trace")), "trace");
    assert_eq!(resolve_format(Some("json")), "json");
}

#[test]
fn test_init_logging_invalid_format() {
    let result = init_logging(Some("info"), Some("invalid_format"));
    assert!(result.is_err());
}

#[test]
fn test_init_logging_does_not_panic() {
    // Only the first call can install a global subscriber
    let _ = init_logging(Some("debug"), Some("compact"));
    let _ = init_logging(Some("info"), Some("json"));
    let _ = init_logging(None, None);
}

#[test]
fn test_pipeline_under_trace_subscriber() {
    let _guard = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .set_default();

    let model = umlgen::parse_model("classDiagram\n    class Invoice {\n        +String number\n    }").unwrap();
    assert_eq!(model.len(), 1);
}
