//! State diagram plugin
//!
//! Each state block later becomes the state machine of one class.
//!
//! Syntax examples:
//! ```text
//! stateDiagram-v2
//!     [*] --> Draft
//!     Draft --> Published : publish
//!     Published --> Archived : archive
//!     Archived --> [*]
//! ```

mod detector;
mod parser;

pub use detector::StateDetector;
pub use parser::{StateParser, Statement};

use crate::core::{Detector, DiagramPlugin, Dialect};
use std::sync::Arc;

/// State diagram implementation
pub struct StatePlugin;

impl DiagramPlugin for StatePlugin {
    type Parser = StateParser;

    fn dialect() -> Dialect {
        Dialect::State
    }

    fn detector() -> Arc<dyn Detector> {
        Arc::new(StateDetector::new())
    }

    fn create_parser() -> Self::Parser {
        StateParser::new()
    }

    fn name() -> &'static str {
        "state"
    }

    fn version() -> &'static str {
        "0.1.0"
    }
}
