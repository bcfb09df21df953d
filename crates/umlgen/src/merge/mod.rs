//! Intelligent merging of regenerated sources into existing files
//!
//! The merger compares the structure of a freshly generated candidate with
//! the file already on disk and inserts only the declarations the existing
//! file lacks. Everything else in the existing file stays byte-for-byte
//! identical: hand-written methods, comments, formatting and imports.
//!
//! Brace-delimited languages and Python have separate scanners; both
//! produce a [`StructuralSnapshot`] and the merge itself is shared.

mod braces;
mod indent;
mod snapshot;
mod splice;

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, span, warn, Level};

use crate::codegen::SourceSyntax;

pub use snapshot::{Import, Member, MemberKind, StructuralDiff, StructuralSnapshot};
use splice::{field_anchor, member_block, past_inline_tail, FieldAnchor, IndentStyle, Splice};

const DEFAULT_INDENT: &str = "    ";

/// What happens when a declaration exists on both sides with different
/// signatures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Keep the existing declaration and record the conflict
    #[default]
    ExistingWins,
    /// Fail the merge so nothing is written
    Report,
}

/// A same-name declaration whose signature differs between the files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub kind: MemberKind,
    pub name: String,
    pub existing: String,
    pub candidate: String,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}': existing ({}) vs generated ({})",
            self.kind.as_str(),
            self.name,
            self.existing,
            self.candidate
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("type '{name}' not found in existing source")]
    TargetNotFound { name: String },

    #[error("unbalanced structure at line {line}")]
    Unbalanced { line: usize },

    #[error("{} conflicting declarations", .conflicts.len())]
    Conflicts { conflicts: Vec<Conflict> },
}

impl MergeError {
    /// What the user should do about a file that cannot be merged
    pub fn recommendation(&self) -> &'static str {
        match self {
            MergeError::Conflicts { .. } => {
                "resolve the conflicting declarations by hand, or regenerate into a fresh directory"
            }
            _ => "regenerate into a fresh directory or exclude the file",
        }
    }
}

/// Outcome of one merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    pub merged: String,
    pub diff: StructuralDiff,
    /// Collisions resolved in favour of the existing file
    pub conflicts: Vec<Conflict>,
}

impl MergeResult {
    /// True when the existing source was returned untouched
    pub fn is_unchanged(&self) -> bool {
        self.diff.is_empty()
    }
}

/// Structural merger for one source syntax
#[derive(Debug, Clone, Default)]
pub struct IntelligentMerger {
    syntax: SourceSyntax,
    policy: ConflictPolicy,
    target: Option<String>,
}

impl IntelligentMerger {
    pub fn new(syntax: SourceSyntax) -> Self {
        Self {
            syntax,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Merge into the type with this name instead of the first one in the file
    pub fn with_target(mut self, name: impl Into<String>) -> Self {
        self.target = Some(name.into());
        self
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Scan `source` into a structural snapshot of the target type
    pub fn snapshot(&self, source: &str) -> Result<StructuralSnapshot, MergeError> {
        let target = self.target.as_deref();
        match self.syntax {
            SourceSyntax::Braces => braces::scan(source, target),
            SourceSyntax::Indentation => indent::scan(source, target),
        }
    }

    /// Merge `candidate` into `existing`
    pub fn merge(&self, candidate: &str, existing: &str) -> Result<MergeResult, MergeError> {
        let merge_span = span!(
            Level::DEBUG,
            "merge",
            target = self.target.as_deref().unwrap_or("*")
        );
        let _enter = merge_span.enter();

        let theirs = self.snapshot(existing)?;
        let ours = self.snapshot(candidate)?;

        let mut diff = StructuralDiff::default();
        let mut conflicts = Vec::new();
        let mut new_fields = Vec::new();
        let mut new_trailing = Vec::new();

        for member in &ours.members {
            let same_name: Vec<&Member> = theirs.named(member.kind, &member.name).collect();
            match same_name.first() {
                None => {
                    match member.kind {
                        MemberKind::Field => diff.fields.push(member.name.clone()),
                        MemberKind::Method => diff.methods.push(member.name.clone()),
                        MemberKind::Type => diff.types.push(member.name.clone()),
                    }
                    if member.kind == MemberKind::Field {
                        new_fields.push(member);
                    } else {
                        new_trailing.push(member);
                    }
                }
                Some(first) if !same_name.iter().any(|m| covers(m, member)) => {
                    conflicts.push(Conflict {
                        kind: member.kind,
                        name: member.name.clone(),
                        existing: first.signature.clone(),
                        candidate: member.signature.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        if !conflicts.is_empty() {
            if self.policy == ConflictPolicy::Report {
                return Err(MergeError::Conflicts { conflicts });
            }
            for conflict in &conflicts {
                warn!(%conflict, "Keeping existing declaration");
            }
        }

        let imports = self.missing_imports(&ours, &theirs);
        diff.imports = imports.clone();

        if diff.is_empty() {
            debug!("Existing source is up to date");
            return Ok(MergeResult {
                merged: existing.to_string(),
                diff,
                conflicts,
            });
        }

        let from = IndentStyle::of(&ours, DEFAULT_INDENT);
        let to = IndentStyle::of(&theirs, DEFAULT_INDENT);
        let mut splice = Splice::default();

        if !imports.is_empty() {
            let block: String = imports.iter().map(|line| format!("{}\n", line)).collect();
            match (theirs.imports.iter().map(|i| i.span.end).max(), theirs.preamble_end) {
                (Some(end), _) => splice.insert(end, block),
                (None, Some(end)) => splice.insert(end, format!("\n{}", block)),
                (None, None) => splice.insert(0, format!("{}\n", block)),
            }
        }

        if !new_fields.is_empty() {
            let block = member_block(candidate, &new_fields, &from, &to);
            match field_anchor(&theirs) {
                FieldAnchor::After(at) => splice.insert(past_inline_tail(existing, at, theirs.body_end), block),
                FieldAnchor::Before(at) => {
                    splice.insert(at, format!("{}\n", block.trim_start_matches('\n')));
                }
                FieldAnchor::Empty(at) => splice.insert(at, block.trim_start_matches('\n').to_string()),
            }
        }

        let mut body_empty = theirs.members.is_empty() && new_fields.is_empty();
        for member in new_trailing {
            let text = member_block(candidate, &[member], &from, &to);
            let text = text.trim_start_matches('\n');
            let separated = if body_empty {
                text.to_string()
            } else {
                format!("\n{}", text)
            };
            splice.insert(theirs.body_end, separated);
            body_empty = false;
        }

        debug!(
            fields = diff.fields.len(),
            methods = diff.methods.len(),
            types = diff.types.len(),
            imports = diff.imports.len(),
            "Merged declarations"
        );
        let merged = if splice.is_empty() {
            existing.to_string()
        } else {
            splice.apply(existing)
        };
        Ok(MergeResult {
            merged,
            diff,
            conflicts,
        })
    }

    /// Candidate import statements the existing file lacks; module imports
    /// that partly exist contribute only their missing names
    fn missing_imports(&self, ours: &StructuralSnapshot, theirs: &StructuralSnapshot) -> Vec<String> {
        let mut missing = Vec::new();
        for import in &ours.imports {
            let Some(module) = import.module.as_deref() else {
                if !import.names.iter().all(|path| theirs.has_path_import(path)) {
                    missing.push(import.text.clone());
                }
                continue;
            };
            let present = theirs.imported_from(module);
            let module_known = theirs
                .imports
                .iter()
                .any(|i| i.module.as_deref() == Some(module));
            if !module_known {
                missing.push(import.text.clone());
                continue;
            }
            let names: Vec<&str> = import
                .names
                .iter()
                .map(String::as_str)
                .filter(|name| !present.contains(name))
                .collect();
            let default = import
                .default
                .as_deref()
                .filter(|name| !present.contains(name));
            if names.is_empty() && default.is_none() {
                continue;
            }
            missing.push(self.partial_import(module, default, &names, &import.text));
        }
        missing
    }

    fn partial_import(&self, module: &str, default: Option<&str>, names: &[&str], original: &str) -> String {
        match self.syntax {
            SourceSyntax::Indentation => format!("from {} import {}", module, names.join(", ")),
            SourceSyntax::Braces => {
                let quote = if original.contains('"') { '"' } else { '\'' };
                let clause = match (default, names.is_empty()) {
                    (Some(default), true) => default.to_string(),
                    (Some(default), false) => format!("{}, {{ {} }}", default, names.join(", ")),
                    (None, _) => format!("{{ {} }}", names.join(", ")),
                };
                format!("import {} from {q}{}{q};", clause, module, q = quote)
            }
        }
    }
}

/// Whether an existing declaration satisfies a generated one of the same
/// name; a nested enum only has to hold every generated constant
fn covers(existing: &Member, generated: &Member) -> bool {
    match generated.kind {
        MemberKind::Type => generated
            .signature
            .split(',')
            .filter(|constant| !constant.is_empty())
            .all(|constant| existing.signature.split(',').any(|have| have == constant)),
        MemberKind::Field | MemberKind::Method => existing.signature == generated.signature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EXISTING: &str = "package shop.entity;\n\nimport java.util.List;\n\npublic class Order {\n    private String number;\n\n    // hand-written\n    public String describe() {\n        return \"Order \" + number;\n    }\n}\n";

    const CANDIDATE: &str = "package shop.entity;\n\nimport java.math.BigDecimal;\nimport java.util.List;\n\npublic class Order {\n    private String number;\n\n    private BigDecimal total;\n\n    public void submit() {\n        throw new UnsupportedOperationException();\n    }\n}\n";

    #[test]
    fn test_merge_inserts_missing_members() {
        let merger = IntelligentMerger::new(SourceSyntax::Braces).with_target("Order");
        let result = merger.merge(CANDIDATE, EXISTING).unwrap();
        assert_eq!(
            result.merged,
            "package shop.entity;\n\nimport java.util.List;\nimport java.math.BigDecimal;\n\npublic class Order {\n    private String number;\n\n    private BigDecimal total;\n\n    // hand-written\n    public String describe() {\n        return \"Order \" + number;\n    }\n\n    public void submit() {\n        throw new UnsupportedOperationException();\n    }\n}\n"
        );
        assert_eq!(result.diff.fields, vec!["total"]);
        assert_eq!(result.diff.methods, vec!["submit"]);
        assert_eq!(result.diff.imports, vec!["import java.math.BigDecimal;"]);
        assert!(result.conflicts.is_empty());

        let again = merger.merge(CANDIDATE, &result.merged).unwrap();
        assert!(again.is_unchanged());
        assert_eq!(again.merged, result.merged);
    }

    #[test]
    fn test_conflict_policies() {
        let existing = "class Invoice {\n    private Double total;\n}\n";
        let candidate = "class Invoice {\n    private Float total;\n}\n";

        let kept = IntelligentMerger::new(SourceSyntax::Braces)
            .merge(candidate, existing)
            .unwrap();
        assert_eq!(kept.merged, existing);
        assert_eq!(
            kept.conflicts,
            vec![Conflict {
                kind: MemberKind::Field,
                name: "total".into(),
                existing: "Double".into(),
                candidate: "Float".into(),
            }]
        );

        let err = IntelligentMerger::new(SourceSyntax::Braces)
            .with_policy(ConflictPolicy::Report)
            .merge(candidate, existing)
            .unwrap_err();
        assert!(matches!(err, MergeError::Conflicts { ref conflicts } if conflicts.len() == 1));
        assert_eq!(err.to_string(), "1 conflicting declarations");
    }

    #[test]
    fn test_merge_typescript_partial_import_and_reindent() {
        let existing = "import { Column, Entity } from 'typeorm';\n\n@Entity('orders')\nexport class Order {\n    @Column()\n    number: string;\n}\n";
        let candidate = "import { Column, Entity, ManyToOne } from 'typeorm';\n\n@Entity('orders')\nexport class Order {\n  @Column()\n  number: string;\n\n  @ManyToOne(() => Customer, (customer) => customer.orders)\n  customer: Customer;\n}\n";
        let result = IntelligentMerger::new(SourceSyntax::Braces)
            .with_target("Order")
            .merge(candidate, existing)
            .unwrap();
        assert_eq!(
            result.merged,
            "import { Column, Entity } from 'typeorm';\nimport { ManyToOne } from 'typeorm';\n\n@Entity('orders')\nexport class Order {\n    @Column()\n    number: string;\n\n    @ManyToOne(() => Customer, (customer) => customer.orders)\n    customer: Customer;\n}\n"
        );
    }

    #[test]
    fn test_merge_python_class() {
        let existing = "from django.db import models\n\n\nclass Invoice(models.Model):\n    number = models.CharField(max_length=255)\n\n    def describe(self):\n        return self.number\n";
        let candidate = "from django.db import models\n\n\nclass Invoice(models.Model):\n    number = models.CharField(max_length=255)\n    total_amount = models.FloatField()\n\n    class Meta:\n        db_table = \"invoices\"\n";
        let result = IntelligentMerger::new(SourceSyntax::Indentation)
            .with_target("Invoice")
            .merge(candidate, existing)
            .unwrap();
        assert_eq!(
            result.merged,
            "from django.db import models\n\n\nclass Invoice(models.Model):\n    number = models.CharField(max_length=255)\n    total_amount = models.FloatField()\n\n    def describe(self):\n        return self.number\n\n    class Meta:\n        db_table = \"invoices\"\n"
        );
        assert_eq!(result.diff.types, vec!["Meta"]);
    }

    #[test]
    fn test_merge_into_one_line_body() {
        let existing = "public class Order { private String number; }\n";
        let candidate = "public class Order {\n    private String number;\n\n    private Double total;\n}\n";
        let merger = IntelligentMerger::new(SourceSyntax::Braces).with_target("Order");
        let result = merger.merge(candidate, existing).unwrap();
        assert_eq!(
            result.merged,
            "public class Order { private String number; \n\n    private Double total;\n}\n"
        );
        assert!(merger.merge(candidate, &result.merged).unwrap().is_unchanged());
    }

    #[test]
    fn test_multi_declarator_field_is_not_duplicated() {
        let existing = "class Address {\n    private String street, city;\n}\n";
        let candidate = "class Address {\n    private String street;\n\n    private String city;\n\n    private String zip;\n}\n";
        let result = IntelligentMerger::new(SourceSyntax::Braces)
            .with_policy(ConflictPolicy::Report)
            .merge(candidate, existing)
            .unwrap();
        assert_eq!(result.diff.fields, vec!["zip"]);
        assert!(result.conflicts.is_empty());
        assert_eq!(
            result.merged,
            "class Address {\n    private String street, city;\n\n    private String zip;\n}\n"
        );
    }

    #[test]
    fn test_nested_enum_missing_constants_are_reported() {
        let existing = "public class Post {\n    public enum PostStatus {\n        DRAFT, PUBLISHED\n    }\n\n    private PostStatus status = PostStatus.DRAFT;\n}\n";
        let candidate = "public class Post {\n    public enum PostStatus {\n        DRAFT, REVIEW, PUBLISHED\n    }\n\n    private PostStatus status = PostStatus.DRAFT;\n\n    public void review() {\n        this.status = PostStatus.REVIEW;\n    }\n}\n";
        let merger = IntelligentMerger::new(SourceSyntax::Braces).with_target("Post");

        let result = merger.merge(candidate, existing).unwrap();
        assert_eq!(result.diff.methods, vec!["review"]);
        assert_eq!(
            result.conflicts,
            vec![Conflict {
                kind: MemberKind::Type,
                name: "PostStatus".into(),
                existing: "DRAFT,PUBLISHED".into(),
                candidate: "DRAFT,REVIEW,PUBLISHED".into(),
            }]
        );

        // Extra hand-written constants are fine
        let reverse = merger.merge(existing, candidate).unwrap();
        assert!(reverse.conflicts.is_empty());
        assert!(reverse.is_unchanged());
    }

    #[test]
    fn test_unrecognizable_existing_file() {
        let err = IntelligentMerger::new(SourceSyntax::Braces)
            .with_target("Order")
            .merge("class Order {\n}\n", "// hand-written from scratch\nfunction order() {}\n")
            .unwrap_err();
        assert_eq!(err, MergeError::TargetNotFound { name: "Order".into() });
        assert!(err.recommendation().contains("fresh directory"));
    }
}
