//! Plugin trait tying a dialect's detector and parser together

use std::sync::Arc;

use super::{Detector, Diagram, Dialect, Parser};

/// One diagram dialect
///
/// The orchestrator registers plugins by type and looks them up by
/// [`Dialect`] when it meets a block.
pub trait DiagramPlugin {
    /// The parser type for this dialect
    type Parser: Parser<Diagram> + 'static;

    /// The dialect this plugin handles
    fn dialect() -> Dialect;

    /// Create the detector used for headerless blocks
    fn detector() -> Arc<dyn Detector>;

    /// Create a new parser instance
    fn create_parser() -> Self::Parser;

    /// Get the plugin name
    fn name() -> &'static str;

    /// Get the plugin version
    fn version() -> &'static str;
}
