//! Sequence diagram plugin
//!
//! Solid call messages turn into method candidates on the callee.
//!
//! Syntax examples:
//! ```text
//! sequenceDiagram
//!     participant C as Customer
//!     C->>Order: placeOrder(items)
//!     Note over Order: validate items
//!     Order-->>C: confirmation
//! ```

mod detector;
mod parser;

pub use detector::SequenceDetector;
pub use parser::{ArrowHead, ArrowType, LineStyle, ParsedMessage, SequenceParser};

use crate::core::{Detector, Dialect, DiagramPlugin};
use std::sync::Arc;

/// Sequence diagram implementation
pub struct SequencePlugin;

impl DiagramPlugin for SequencePlugin {
    type Parser = SequenceParser;

    fn dialect() -> Dialect {
        Dialect::Sequence
    }

    fn detector() -> Arc<dyn Detector> {
        Arc::new(SequenceDetector::new())
    }

    fn create_parser() -> Self::Parser {
        SequenceParser::new()
    }

    fn name() -> &'static str {
        "sequence"
    }

    fn version() -> &'static str {
        "0.1.0"
    }
}
