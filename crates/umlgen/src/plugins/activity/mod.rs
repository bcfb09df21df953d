//! Activity diagram plugin
//!
//! Flowchart notation whose `Class.method` title or subgraph names the
//! behavior the flow documents.
//!
//! Syntax examples:
//! ```text
//! flowchart TD
//!     title Order.submit
//!     A([Start]) --> B[Validate items]
//!     B --> C{Stock available?}
//!     C -->|yes| D[Reserve stock]
//! ```

mod detector;
mod parser;

pub use detector::ActivityDetector;
pub use parser::{ActivityParser, FlowStatement, NodeKind, NodeRef};

use crate::core::{Detector, Dialect, DiagramPlugin};
use std::sync::Arc;

/// Activity diagram implementation
pub struct ActivityPlugin;

impl DiagramPlugin for ActivityPlugin {
    type Parser = ActivityParser;

    fn dialect() -> Dialect {
        Dialect::Activity
    }

    fn detector() -> Arc<dyn Detector> {
        Arc::new(ActivityDetector::new())
    }

    fn create_parser() -> Self::Parser {
        ActivityParser::new()
    }

    fn name() -> &'static str {
        "activity"
    }

    fn version() -> &'static str {
        "0.1.0"
    }
}
