//! The enhanced class graph built from a parsed diagram
//!
//! [`ModelBuilder`] resolves relationship cardinality and ownership, attaches
//! state machines and behavioral methods, and returns a [`Model`] keyed by
//! class name in diagram order.

mod builder;
mod cardinality;
mod enhanced;
mod state_machine;

pub use builder::{ModelBuilder, RelationshipStrictness};
pub use cardinality::{Cardinality, Multiplicity};
pub use enhanced::{EnhancedClass, Model, RelationshipDescriptor, ResolvedEdge};
pub use state_machine::{StateMachine, TransitionError};
