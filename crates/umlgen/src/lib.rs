//! umlgen - Turn UML diagrams into source code, incrementally
//!
//! A library for parsing Mermaid-style class, state, sequence, ER and
//! activity diagrams into a language-agnostic class model, generating
//! entities, repositories, services, controllers and migrations from it, and
//! merging regenerated code into files that were edited by hand.
//!
//! # Quick Start
//!
//! ```rust
//! use umlgen::{build, parse};
//!
//! let input = "classDiagram\n    class Invoice {\n        +String number\n        +Float total\n    }";
//! let diagram = parse(input).unwrap();
//! let model = build(&diagram).unwrap();
//! assert_eq!(model.len(), 1);
//! assert_eq!(model.class("Invoice").unwrap().fields().count(), 2);
//! ```
//!
//! # Generating Files
//!
//! ```rust,no_run
//! use std::path::Path;
//! use umlgen::prelude::*;
//!
//! let diagram = umlgen::parse("classDiagram\n class Order {\n +String number\n }").unwrap();
//! let model = ModelBuilder::new().build(&diagram).unwrap();
//!
//! let registry = GeneratorRegistry::with_defaults();
//! let options = GenerationOptions {
//!     capabilities: CapabilitySet::all(),
//!     ..GenerationOptions::default()
//! };
//! let manager = IncrementalGenerationManager::new(&registry, options);
//! let summary = manager.generate(model.classes(), "java", Path::new("out")).unwrap();
//! println!("{}", summary);
//! ```

pub mod codegen;
pub mod core;
pub mod generation;
pub mod merge;
pub mod model;
pub mod plugins;

pub use core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::codegen::{Capability, CapabilitySet, CodeGenerator, GeneratorRegistry, SourceSyntax};
    pub use crate::core::{Diagram, Result, UmlGenError};
    pub use crate::generation::{
        FileOutcome, GenerationMode, GenerationOptions, GenerationReport, GenerationSummary,
        IncrementalGenerationManager,
    };
    pub use crate::merge::{ConflictPolicy, IntelligentMerger, MergeError, MergeResult};
    pub use crate::model::{
        Cardinality, EnhancedClass, Model, ModelBuilder, RelationshipStrictness, StateMachine,
    };
    pub use crate::plugins::Orchestrator;
}

/// Parse a diagram document with every built-in dialect
///
/// # Example
/// ```rust
/// let diagram = umlgen::parse("stateDiagram-v2\n    [*] --> Draft\n    Draft --> Published : publish").unwrap();
/// assert_eq!(diagram.state_blocks().len(), 1);
/// ```
pub fn parse(input: &str) -> Result<Diagram> {
    plugins::Orchestrator::with_all_plugins().parse(input)
}

/// Build the enhanced class model with lenient relationship resolution
pub fn build(diagram: &Diagram) -> Result<model::Model> {
    model::ModelBuilder::new().build(diagram)
}

/// Parse and build in one step
pub fn parse_model(input: &str) -> Result<model::Model> {
    build(&parse(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_invoice() {
        let model = parse_model("classDiagram\n    class Invoice {\n        +String number\n        +Float total\n    }")
            .unwrap();
        let invoice = model.class("Invoice").unwrap();
        assert_eq!(invoice.fields().count(), 2);
        assert!(invoice.relationships.is_empty());
    }

    #[test]
    fn test_parse_error_has_line() {
        let err = parse("classDiagram\n    class Invoice {\n        +String number\n").unwrap_err();
        assert_eq!(err.line(), Some(2));
    }
}
