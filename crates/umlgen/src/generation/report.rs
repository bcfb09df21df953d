//! Per-file generation reports and the run summary

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::codegen::Capability;
use crate::core::UmlGenError;
use crate::merge::{Conflict, MergeError, MergeResult};

/// What happened to one output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    /// The file did not exist and was written
    Created,
    /// New declarations were merged into the existing file
    Merged,
    /// Nothing to do; the file was not touched
    Skipped,
    /// The existing file was replaced (overwrite mode)
    Overwritten,
    Failed,
}

impl FileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileOutcome::Created => "created",
            FileOutcome::Merged => "merged",
            FileOutcome::Skipped => "skipped",
            FileOutcome::Overwritten => "overwritten",
            FileOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    pub class_name: String,
    pub capability: Capability,
    pub path: PathBuf,
    pub outcome: FileOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_fields: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_methods: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_imports: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Conflict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl GenerationReport {
    pub fn new(class_name: impl Into<String>, capability: Capability, path: impl Into<PathBuf>, outcome: FileOutcome) -> Self {
        Self {
            class_name: class_name.into(),
            capability,
            path: path.into(),
            outcome,
            added_fields: Vec::new(),
            added_methods: Vec::new(),
            added_types: Vec::new(),
            added_imports: Vec::new(),
            conflicts: Vec::new(),
            backup: None,
            error: None,
            recommendation: None,
        }
    }

    pub fn failed(class_name: impl Into<String>, capability: Capability, path: impl Into<PathBuf>, error: &UmlGenError) -> Self {
        let mut report = Self::new(class_name, capability, path, FileOutcome::Failed);
        report.error = Some(error.to_string());
        if let UmlGenError::Merge(merge) = error {
            report.recommendation = Some(merge.recommendation().to_string());
            if let MergeError::Conflicts { conflicts } = merge {
                report.conflicts = conflicts.clone();
            }
        }
        report
    }

    /// Record what a merge added
    pub fn with_merge(mut self, result: MergeResult) -> Self {
        self.added_fields = result.diff.fields;
        self.added_methods = result.diff.methods;
        self.added_types = result.diff.types;
        self.added_imports = result.diff.imports;
        self.conflicts = result.conflicts;
        self
    }

    pub fn with_backup(mut self, backup: PathBuf) -> Self {
        self.backup = Some(backup);
        self
    }
}

/// Outcome counts for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub created: usize,
    pub merged: usize,
    pub skipped: usize,
    pub overwritten: usize,
    pub failed: usize,
}

impl OutcomeCounts {
    fn add(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Created => self.created += 1,
            FileOutcome::Merged => self.merged += 1,
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Overwritten => self.overwritten += 1,
            FileOutcome::Failed => self.failed += 1,
        }
    }
}

/// Everything one `generate` call did, in job order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationSummary {
    pub language: String,
    pub output_root: PathBuf,
    pub counts: OutcomeCounts,
    pub reports: Vec<GenerationReport>,
}

impl GenerationSummary {
    pub fn new(language: impl Into<String>, output_root: &Path, reports: Vec<GenerationReport>) -> Self {
        let mut counts = OutcomeCounts::default();
        for report in &reports {
            counts.add(report.outcome);
        }
        Self {
            language: language.into(),
            output_root: output_root.to_path_buf(),
            counts,
            reports,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.counts.failed > 0
    }

    pub fn with_outcome(&self, outcome: FileOutcome) -> impl Iterator<Item = &GenerationReport> {
        self.reports.iter().filter(move |r| r.outcome == outcome)
    }

    /// Report for one class and capability
    pub fn report(&self, class_name: &str, capability: Capability) -> Option<&GenerationReport> {
        self.reports
            .iter()
            .find(|r| r.class_name == class_name && r.capability == capability)
    }
}

impl fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counts;
        writeln!(
            f,
            "{} files for {} in {}: {} created, {} merged, {} skipped, {} overwritten, {} failed",
            self.reports.len(),
            self.language,
            self.output_root.display(),
            c.created,
            c.merged,
            c.skipped,
            c.overwritten,
            c.failed
        )?;
        for report in &self.reports {
            if report.outcome == FileOutcome::Skipped {
                continue;
            }
            writeln!(f, "  {:<11} {}", report.outcome, report.path.display())?;
            if !report.added_fields.is_empty() {
                writeln!(f, "              + fields: {}", report.added_fields.join(", "))?;
            }
            if !report.added_methods.is_empty() {
                writeln!(f, "              + methods: {}", report.added_methods.join(", "))?;
            }
            for conflict in &report.conflicts {
                writeln!(f, "              ! kept {}", conflict)?;
            }
            if let Some(error) = &report.error {
                writeln!(f, "              error: {}", error)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_and_display() {
        let mut merged = GenerationReport::new("Order", Capability::Entity, "out/Order.java", FileOutcome::Merged);
        merged.added_fields = vec!["total".into()];
        let reports = vec![
            GenerationReport::new("Customer", Capability::Entity, "out/Customer.java", FileOutcome::Created),
            merged,
            GenerationReport::new("Order", Capability::Migration, "out/orders.sql", FileOutcome::Skipped),
        ];
        let summary = GenerationSummary::new("java", Path::new("out"), reports);
        assert_eq!(summary.counts.created, 1);
        assert_eq!(summary.counts.merged, 1);
        assert_eq!(summary.counts.skipped, 1);
        assert!(!summary.has_failures());

        let text = summary.to_string();
        assert!(text.starts_with("3 files for java in out: 1 created, 1 merged, 1 skipped"));
        assert!(text.contains("+ fields: total"));
        assert!(!text.contains("orders.sql"));
    }

    #[test]
    fn test_failed_report_carries_recommendation() {
        let error = UmlGenError::Merge(MergeError::Unbalanced { line: 3 });
        let report = GenerationReport::failed("Order", Capability::Entity, "Order.java", &error);
        assert_eq!(report.outcome, FileOutcome::Failed);
        assert_eq!(
            report.recommendation.as_deref(),
            Some("regenerate into a fresh directory or exclude the file")
        );
    }
}
