//! Core abstractions for diagram processing
//!
//! This module defines the traits every dialect plugin implements, the
//! dialect-agnostic node types, the shared diagram store and the error type.

pub mod chumsky_utils;
mod database;
mod detector;
mod diagram;
mod document;
mod error;
pub mod logging;
mod parser;
mod plugin;
mod text;
mod types;

pub use database::*;
pub use detector::*;
pub use diagram::*;
pub use document::*;
pub use error::*;
pub use logging::*;
pub use parser::*;
pub use plugin::*;
pub use text::*;
pub use types::*;
