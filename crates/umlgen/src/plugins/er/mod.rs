//! Entity-relationship diagram plugin
//!
//! Syntax examples:
//! ```text
//! erDiagram
//!     CUSTOMER {
//!         string id PK
//!         string email UK
//!     }
//!     CUSTOMER ||--o{ ORDER : places
//! ```

mod detector;
mod parser;

pub use detector::ErDetector;
pub use parser::{ErCardinality, ErParser, ErRelationship};

use crate::core::{Detector, Dialect, DiagramPlugin};
use std::sync::Arc;

/// Entity-relationship diagram implementation
pub struct ErPlugin;

impl DiagramPlugin for ErPlugin {
    type Parser = ErParser;

    fn dialect() -> Dialect {
        Dialect::Er
    }

    fn detector() -> Arc<dyn Detector> {
        Arc::new(ErDetector::new())
    }

    fn create_parser() -> Self::Parser {
        ErParser::new()
    }

    fn name() -> &'static str {
        "er"
    }

    fn version() -> &'static str {
        "0.1.0"
    }
}
