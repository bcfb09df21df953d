//! Store trait that dialect parsers write into

use super::Result;

/// A store of parsed diagram elements
///
/// [`Diagram`](super::Diagram) keys classes by name as nodes and keeps
/// relationship lines as edges, in document order.
pub trait Database: Send + Sync {
    type Node: Clone + Send + Sync;

    type Edge: Clone + Send + Sync;

    /// Add a node; stores may merge it with an existing one of the same name
    fn add_node(&mut self, node: Self::Node) -> Result<()>;

    fn add_edge(&mut self, edge: Self::Edge) -> Result<()>;

    /// Node by name
    fn get_node(&self, id: &str) -> Option<&Self::Node>;

    fn nodes(&self) -> impl Iterator<Item = &Self::Node>;

    fn edges(&self) -> impl Iterator<Item = &Self::Edge>;

    fn clear(&mut self);

    fn node_count(&self) -> usize;

    fn edge_count(&self) -> usize;
}
