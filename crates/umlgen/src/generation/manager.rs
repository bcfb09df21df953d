//! Incremental generation: one job per class and capability, run on a
//! bounded worker pool, each writing or merging its own file

use std::fs;
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, span, Level, Span};

use super::report::{FileOutcome, GenerationReport, GenerationSummary};
use super::writer::FileWriter;
use crate::codegen::{is_persistent, Capability, CapabilitySet, CodeGenerator, GeneratorRegistry};
use crate::core::{Result, UmlGenError};
use crate::merge::{ConflictPolicy, IntelligentMerger};
use crate::model::EnhancedClass;

/// How existing files are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Merge new declarations into existing files
    #[default]
    Incremental,
    /// Replace existing files, backing them up first
    Overwrite,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    /// Package or namespace; the generator's default when `None`
    pub package: Option<String>,
    pub capabilities: CapabilitySet,
    pub mode: GenerationMode,
    /// Worker threads; available parallelism when `None`
    pub workers: Option<usize>,
    pub conflict_policy: ConflictPolicy,
}

struct Job<'c> {
    class: &'c EnhancedClass,
    capability: Capability,
}

/// Generates code for a set of classes into an output tree
#[derive(Debug)]
pub struct IncrementalGenerationManager<'r> {
    registry: &'r GeneratorRegistry,
    options: GenerationOptions,
    writer: FileWriter,
}

impl<'r> IncrementalGenerationManager<'r> {
    pub fn new(registry: &'r GeneratorRegistry, options: GenerationOptions) -> Self {
        Self {
            registry,
            options,
            writer: FileWriter::new(),
        }
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Generate every enabled artifact for `classes` under `output_root`.
    ///
    /// Fails before touching any file when `language` is not registered or
    /// the worker pool cannot be built. Per-file failures are recorded in
    /// the summary instead.
    pub fn generate<'c, I>(&self, classes: I, language: &str, output_root: &Path) -> Result<GenerationSummary>
    where
        I: IntoIterator<Item = &'c EnhancedClass>,
    {
        let generate_span = span!(
            Level::INFO,
            "generate",
            language,
            output_root = %output_root.display()
        );
        let _enter = generate_span.enter();

        let generator = self.registry.resolve(language)?;
        let package = self
            .options
            .package
            .clone()
            .unwrap_or_else(|| generator.default_package().to_string());

        let jobs: Vec<Job<'c>> = classes
            .into_iter()
            .flat_map(|class| {
                self.options
                    .capabilities
                    .iter()
                    .filter(move |capability| *capability == Capability::Entity || is_persistent(class))
                    .map(move |capability| Job { class, capability })
            })
            .collect();

        let workers = self.options.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        });
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("umlgen-worker-{}", i))
            .build()
            .map_err(|err| UmlGenError::WorkerPool {
                message: err.to_string(),
            })?;
        debug!(jobs = jobs.len(), workers, "Starting generation");

        let reports: Vec<GenerationReport> = pool.install(|| {
            jobs.par_iter()
                .map(|job| self.generate_file(generator.as_ref(), job, &package, output_root, &generate_span))
                .collect()
        });

        let summary = GenerationSummary::new(generator.language(), output_root, reports);
        info!(
            created = summary.counts.created,
            merged = summary.counts.merged,
            skipped = summary.counts.skipped,
            overwritten = summary.counts.overwritten,
            failed = summary.counts.failed,
            "Generation complete"
        );
        Ok(summary)
    }

    fn generate_file(
        &self,
        generator: &dyn CodeGenerator,
        job: &Job<'_>,
        package: &str,
        output_root: &Path,
        parent: &Span,
    ) -> GenerationReport {
        let path = output_root.join(generator.output_path(job.class, job.capability, package));
        let file_span = span!(
            parent: parent,
            Level::DEBUG,
            "generate_file",
            class = job.class.name(),
            capability = job.capability.as_str(),
            path = %path.display()
        );
        let _enter = file_span.enter();

        match self.write_artifact(generator, job, package, &path) {
            Ok(report) => {
                debug!(outcome = report.outcome.as_str(), "File done");
                report
            }
            Err(err) => {
                error!(%err, "File generation failed");
                GenerationReport::failed(job.class.name(), job.capability, path, &err)
            }
        }
    }

    fn write_artifact(
        &self,
        generator: &dyn CodeGenerator,
        job: &Job<'_>,
        package: &str,
        path: &Path,
    ) -> Result<GenerationReport> {
        let candidate = generator.generate(job.capability, job.class, package);
        let report = |outcome| GenerationReport::new(job.class.name(), job.capability, path, outcome);

        let existing = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                self.writer.write(path, &candidate)?;
                return Ok(report(FileOutcome::Created));
            }
            Err(err) => return Err(UmlGenError::io(path, err)),
        };

        if self.options.mode == GenerationMode::Overwrite {
            if existing == candidate {
                return Ok(report(FileOutcome::Skipped));
            }
            let backup = self.writer.backup(path)?;
            self.writer.write(path, &candidate)?;
            return Ok(report(FileOutcome::Overwritten).with_backup(backup));
        }

        if !generator.mergeable(job.capability) {
            debug!("Write-once artifact already exists");
            return Ok(report(FileOutcome::Skipped));
        }

        let merger = IntelligentMerger::new(generator.syntax())
            .with_policy(self.options.conflict_policy)
            .with_target(generator.type_name(job.class, job.capability));
        let result = merger.merge(&candidate, &existing)?;
        if result.is_unchanged() {
            return Ok(report(FileOutcome::Skipped).with_merge(result));
        }

        let backup = self.writer.backup(path)?;
        self.writer.write(path, &result.merged)?;
        Ok(report(FileOutcome::Merged).with_merge(result).with_backup(backup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClassNode;

    fn class(name: &str, is_enumeration: bool) -> EnhancedClass {
        EnhancedClass::new(ClassNode {
            name: name.to_string(),
            is_enumeration,
            ..ClassNode::default()
        })
    }

    #[test]
    fn test_unsupported_language_touches_nothing() {
        let registry = GeneratorRegistry::with_defaults();
        let manager = IncrementalGenerationManager::new(&registry, GenerationOptions::default());
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let classes = [class("Order", false)];

        let err = manager.generate(&classes, "cobol", &out).unwrap_err();
        assert!(matches!(err, UmlGenError::UnsupportedLanguage { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn test_enumerations_only_get_entities() {
        let registry = GeneratorRegistry::with_defaults();
        let options = GenerationOptions {
            capabilities: CapabilitySet::all(),
            workers: Some(2),
            ..GenerationOptions::default()
        };
        let manager = IncrementalGenerationManager::new(&registry, options);
        let dir = tempfile::tempdir().unwrap();
        let classes = [class("Order", false), class("Priority", true)];

        let summary = manager.generate(&classes, "java", dir.path()).unwrap();
        assert_eq!(summary.reports.len(), 6);
        assert_eq!(summary.counts.created, 6);
        assert!(summary.report("Priority", Capability::Entity).is_some());
        assert!(summary.report("Priority", Capability::Service).is_none());
        assert_eq!(summary.reports[0].class_name, "Order");
        assert_eq!(summary.reports[5].class_name, "Priority");
    }
}
