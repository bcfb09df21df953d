//! Code generation: the generator interface, the registry and the
//! built-in language emitters

mod capability;
mod csharp;
mod generator;
mod java;
mod php;
mod python;
mod registry;
mod source_writer;
mod sql;
mod types;
mod typescript;

pub use capability::{Capability, CapabilitySet};
pub use csharp::CSharpGenerator;
pub use generator::{
    event_methods, is_persistent, service_behaviors, state_literal, table_name, CodeGenerator, EventMethod,
    SourceSyntax,
};
pub use java::JavaGenerator;
pub use php::PhpGenerator;
pub use python::PythonGenerator;
pub use registry::GeneratorRegistry;
pub use source_writer::SourceWriter;
pub use sql::create_table;
pub use types::TypeToken;
pub use typescript::TypeScriptGenerator;
