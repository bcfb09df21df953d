//! Writing generated code to disk
//!
//! [`IncrementalGenerationManager`] resolves a generator, fans one job per
//! class and capability out over a worker pool, and merges into existing
//! files through the [`crate::merge`] module. All writes go through
//! [`FileWriter`].

mod manager;
mod report;
mod writer;

pub use manager::{GenerationMode, GenerationOptions, IncrementalGenerationManager};
pub use report::{FileOutcome, GenerationReport, GenerationSummary, OutcomeCounts};
pub use writer::{FileWriter, StagedFile, BACKUP_DIR};
