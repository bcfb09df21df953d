//! Plugin implementations for the supported diagram dialects
//!
//! Each plugin pairs a detector with a parser writing into the shared
//! [`Diagram`](crate::core::Diagram) store.

pub mod activity;
pub mod class;
pub mod er;
pub mod orchestrator;
pub mod sequence;
pub mod state;

pub use activity::*;
pub use class::*;
pub use er::*;
pub use orchestrator::*;
pub use sequence::*;
pub use state::*;
