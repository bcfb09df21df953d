//! End-to-end generation into a temporary output tree

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;
use umlgen::prelude::*;
use umlgen::generation::BACKUP_DIR;

const ORDER_V1: &str = r#"classDiagram
    class Order {
        +Long id
        +String number
    }
"#;

const ORDER_V2: &str = r#"classDiagram
    class Order {
        +Long id
        +String number
        +Float total
    }
"#;

fn run(diagram: &str, language: &str, out: &Path, options: GenerationOptions) -> GenerationSummary {
    let model = umlgen::parse_model(diagram).unwrap();
    let registry = GeneratorRegistry::with_defaults();
    let manager = IncrementalGenerationManager::new(&registry, options);
    manager.generate(model.classes(), language, out).unwrap()
}

fn incremental() -> GenerationOptions {
    GenerationOptions {
        mode: GenerationMode::Incremental,
        ..GenerationOptions::default()
    }
}

/// Non-blank lines of `after` left once every line of `before` is matched
/// in order; `None` when a line of `before` is missing or moved
fn inserted_lines<'a>(before: &str, after: &'a str) -> Option<Vec<&'a str>> {
    let mut rest = after.lines();
    let mut inserted = Vec::new();
    for line in before.lines() {
        loop {
            let next = rest.next()?;
            if next == line {
                break;
            }
            inserted.push(next);
        }
    }
    inserted.extend(rest);
    Some(inserted.into_iter().filter(|l| !l.trim().is_empty()).collect())
}

fn backups(path: &Path) -> Vec<PathBuf> {
    let dir = path.parent().unwrap().join(BACKUP_DIR);
    match fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn test_every_language_generates_all_artifacts() {
    let options = GenerationOptions {
        capabilities: CapabilitySet::all(),
        ..GenerationOptions::default()
    };
    for language in ["java", "typescript", "python", "csharp", "php"] {
        let dir = tempdir().unwrap();
        let summary = run(ORDER_V2, language, dir.path(), options.clone());
        assert_eq!(summary.counts.created, 5, "{}", language);
        assert!(!summary.has_failures());
        for report in &summary.reports {
            let text = fs::read_to_string(&report.path).unwrap();
            assert!(!text.is_empty(), "{} {}", language, report.path.display());
        }
    }
}

#[test]
fn test_second_run_is_a_no_op() {
    let options = GenerationOptions {
        capabilities: CapabilitySet::all(),
        mode: GenerationMode::Incremental,
        ..GenerationOptions::default()
    };
    for language in ["java", "typescript", "python", "csharp", "php"] {
        let dir = tempdir().unwrap();
        run(ORDER_V2, language, dir.path(), options.clone());
        let before: Vec<String> = run(ORDER_V2, language, dir.path(), options.clone())
            .reports
            .iter()
            .map(|r| fs::read_to_string(&r.path).unwrap())
            .collect();
        let summary = run(ORDER_V2, language, dir.path(), options.clone());
        assert_eq!(summary.counts.skipped, 5, "{}: {}", language, summary);
        let after: Vec<String> = summary
            .reports
            .iter()
            .map(|r| fs::read_to_string(&r.path).unwrap())
            .collect();
        assert_eq!(before, after);
    }
}

#[test]
fn test_merge_keeps_hand_edits_and_backs_up_once() {
    let dir = tempdir().unwrap();
    let first = run(ORDER_V1, "java", dir.path(), incremental());
    let path = first.reports[0].path.clone();

    let generated = fs::read_to_string(&path).unwrap();
    let close = generated.rfind('}').unwrap();
    let edited = format!(
        "{}    public String label() {{\n        return \"#\" + number;\n    }}\n{}",
        &generated[..close],
        &generated[close..]
    );
    fs::write(&path, &edited).unwrap();

    let summary = run(ORDER_V2, "java", dir.path(), incremental());
    let report = &summary.reports[0];
    assert_eq!(report.outcome, FileOutcome::Merged);
    assert_eq!(report.added_fields, vec!["total"]);
    assert!(report.added_methods.contains(&"getTotal".to_string()));

    let merged = fs::read_to_string(&path).unwrap();
    assert!(merged.contains("return \"#\" + number;"));
    assert_eq!(
        inserted_lines(&edited, &merged).expect("existing lines kept in order"),
        vec![
            "    @Column(nullable = false)",
            "    private Double total;",
            "    public Double getTotal() {",
            "        return total;",
            "    }",
            "    public void setTotal(Double total) {",
            "        this.total = total;",
            "    }",
        ]
    );

    let saved = backups(&path);
    assert_eq!(saved.len(), 1);
    assert_eq!(report.backup.as_ref(), Some(&saved[0]));
    assert_eq!(fs::read_to_string(&saved[0]).unwrap(), edited);

    let again = run(ORDER_V2, "java", dir.path(), incremental());
    assert_eq!(again.reports[0].outcome, FileOutcome::Skipped);
    assert_eq!(backups(&path).len(), 1);
}

#[test]
fn test_overwrite_mode_replaces_and_backs_up() {
    let dir = tempdir().unwrap();
    let first = run(ORDER_V1, "python", dir.path(), GenerationOptions::default());
    let path = first.reports[0].path.clone();
    fs::write(&path, "# replaced by hand\n").unwrap();

    let options = GenerationOptions {
        mode: GenerationMode::Overwrite,
        ..GenerationOptions::default()
    };
    let summary = run(ORDER_V1, "python", dir.path(), options);
    assert_eq!(summary.reports[0].outcome, FileOutcome::Overwritten);
    assert_ne!(fs::read_to_string(&path).unwrap(), "# replaced by hand\n");
    let saved = backups(&path);
    assert_eq!(saved.len(), 1);
    assert_eq!(fs::read_to_string(&saved[0]).unwrap(), "# replaced by hand\n");
}

#[test]
fn test_unparseable_file_is_reported_and_untouched() {
    let dir = tempdir().unwrap();
    let first = run(ORDER_V1, "java", dir.path(), incremental());
    let path = first.reports[0].path.clone();
    let broken = "public class Order {\n    private String number;\n";
    fs::write(&path, broken).unwrap();

    let summary = run(ORDER_V2, "java", dir.path(), incremental());
    let report = &summary.reports[0];
    assert_eq!(report.outcome, FileOutcome::Failed);
    assert!(summary.has_failures());
    assert!(report.recommendation.is_some());
    assert_eq!(fs::read_to_string(&path).unwrap(), broken);
    assert!(backups(&path).is_empty());
}

#[test]
fn test_report_policy_fails_on_changed_signature() {
    let dir = tempdir().unwrap();
    let first = run(ORDER_V1, "java", dir.path(), incremental());
    let path = first.reports[0].path.clone();
    let original = fs::read_to_string(&path).unwrap();
    let edited = original.replace("private String number;", "private Integer number;");
    fs::write(&path, &edited).unwrap();

    let lenient = run(ORDER_V1, "java", dir.path(), incremental());
    assert_eq!(lenient.reports[0].outcome, FileOutcome::Skipped);
    assert!(!lenient.reports[0].conflicts.is_empty());

    let strict = GenerationOptions {
        conflict_policy: ConflictPolicy::Report,
        ..incremental()
    };
    let summary = run(ORDER_V1, "java", dir.path(), strict);
    assert_eq!(summary.reports[0].outcome, FileOutcome::Failed);
    assert_eq!(summary.reports[0].conflicts[0].name, "number");
    assert_eq!(fs::read_to_string(&path).unwrap(), edited);
}

#[test]
fn test_member_named_like_a_type_keyword_is_merged() {
    let dir = tempdir().unwrap();
    let first = run(ORDER_V1, "java", dir.path(), incremental());
    let path = first.reports[0].path.clone();
    let before = fs::read_to_string(&path).unwrap();

    let with_record = "classDiagram\n    class Order {\n        +Long id\n        +String number\n        +String record\n    }\n";
    let summary = run(with_record, "java", dir.path(), incremental());
    let report = &summary.reports[0];
    assert_eq!(report.outcome, FileOutcome::Merged);
    assert_eq!(report.added_fields, vec!["record"]);
    assert_eq!(report.added_methods, vec!["getRecord", "setRecord"]);

    let merged = fs::read_to_string(&path).unwrap();
    assert!(merged.contains("    private String record;\n"));
    assert!(merged.contains("    public void setRecord(String record) {\n"));
    assert!(inserted_lines(&before, &merged).is_some());

    let again = run(with_record, "java", dir.path(), incremental());
    assert_eq!(again.reports[0].outcome, FileOutcome::Skipped);
}

#[test]
fn test_crlf_file_with_multi_declarator_field() {
    let dir = tempdir().unwrap();
    let first = run(ORDER_V1, "java", dir.path(), incremental());
    let path = first.reports[0].path.clone();
    let generated = fs::read_to_string(&path).unwrap();
    let edited = generated
        .replace(
            "    private String number;\n",
            "    private String number;\n\n    private String street, city;\n",
        )
        .replace('\n', "\r\n");
    fs::write(&path, &edited).unwrap();

    let with_address = "classDiagram\n    class Order {\n        +Long id\n        +String number\n        +String street\n        +String city\n        +Float total\n    }\n";
    let strict = GenerationOptions {
        conflict_policy: ConflictPolicy::Report,
        ..incremental()
    };
    let summary = run(with_address, "java", dir.path(), strict.clone());
    let report = &summary.reports[0];
    assert_eq!(report.outcome, FileOutcome::Merged, "{}", summary);
    assert!(report.conflicts.is_empty());
    assert_eq!(report.added_fields, vec!["total"]);

    let merged = fs::read_to_string(&path).unwrap();
    assert!(!merged.contains("private String street;"));
    assert!(!merged.contains("private String city;"));
    assert!(merged.contains("    private Double total;\r\n"));
    assert!(merged.contains("public String getStreet() {\r\n"));
    assert_eq!(merged.matches('\n').count(), merged.matches("\r\n").count());
    assert!(inserted_lines(&edited, &merged).is_some());

    let again = run(with_address, "java", dir.path(), strict);
    assert_eq!(again.reports[0].outcome, FileOutcome::Skipped);
}
