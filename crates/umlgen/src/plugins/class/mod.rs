//! Class diagram plugin
//!
//! Syntax examples:
//! ```text
//! classDiagram
//!     class Invoice {
//!         +String number
//!         +total: Float
//!         +pay(method: String) bool
//!     }
//!     Customer "1" --> "*" Invoice : owes
//!     Document <|-- Invoice
//! ```

mod detector;
mod parser;

pub use detector::ClassDetector;
pub use parser::{ClassParser, Marker, Member, ParsedRelationship};

use crate::core::{Detector, DiagramPlugin, Dialect};
use std::sync::Arc;

/// Class diagram implementation
pub struct ClassPlugin;

impl DiagramPlugin for ClassPlugin {
    type Parser = ClassParser;

    fn dialect() -> Dialect {
        Dialect::Class
    }

    fn detector() -> Arc<dyn Detector> {
        Arc::new(ClassDetector::new())
    }

    fn create_parser() -> Self::Parser {
        ClassParser::new()
    }

    fn name() -> &'static str {
        "class"
    }

    fn version() -> &'static str {
        "0.1.0"
    }
}
