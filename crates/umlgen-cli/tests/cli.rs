//! End-to-end tests that run the umlgen binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

const ORDERS: &str = r#"classDiagram
    class Order {
        +Long id
        +String number
        +Float total
    }
    class Customer {
        +String name
    }
    Customer "1" --> "*" Order : orders
"#;

fn umlgen(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_umlgen"))
        .args(args)
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run umlgen")
}

fn write_diagram(dir: &Path, text: &str) -> String {
    let path = dir.join("model.mmd");
    fs::write(&path, text).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_generate_creates_java_entities() {
    let dir = tempdir().unwrap();
    let input = write_diagram(dir.path(), ORDERS);
    let out = dir.path().join("out");

    let output = umlgen(&["generate", &input, "-o", out.to_str().unwrap(), "--color", "never"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 created"), "stdout: {}", stdout);
    assert!(out.join("src/main/java/com/example/entity/Order.java").exists());
    assert!(out.join("src/main/java/com/example/entity/Customer.java").exists());
}

#[test]
fn test_second_incremental_run_skips_everything() {
    let dir = tempdir().unwrap();
    let input = write_diagram(dir.path(), ORDERS);
    let out = dir.path().join("out");
    let out = out.to_str().unwrap();
    let args = [
        "generate",
        input.as_str(),
        "-o",
        out,
        "--with-services",
        "--with-migrations",
        "--incremental",
        "--report",
        "json",
    ];

    assert!(umlgen(&args).status.success());
    let output = umlgen(&args);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["counts"]["created"], 0);
    assert_eq!(report["counts"]["merged"], 0);
    assert_eq!(report["counts"]["skipped"], 6);
}

#[test]
fn test_unknown_language_fails_without_output() {
    let dir = tempdir().unwrap();
    let input = write_diagram(dir.path(), ORDERS);
    let out = dir.path().join("out");

    let output = umlgen(&["generate", &input, "-o", out.to_str().unwrap(), "-l", "cobol"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unsupported language 'cobol'"), "stderr: {}", stderr);
    assert!(!out.exists());
}

#[test]
fn test_validate_reports_classes() {
    let dir = tempdir().unwrap();
    let input = write_diagram(dir.path(), ORDERS);

    let output = umlgen(&["validate", &input, "--color", "never"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Order: 3 fields"));
    assert!(stdout.contains("2 classes, 1 relationships, 0 warnings"));
}

#[test]
fn test_validate_strict_rejects_dangling_relationship() {
    let dir = tempdir().unwrap();
    let input = write_diagram(dir.path(), "classDiagram\n    class Order\n    Order --> Ghost : ghost\n");

    assert!(umlgen(&["validate", &input]).status.success());
    let output = umlgen(&["validate", &input, "--strict"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Error:"));
}

#[test]
fn test_languages_json() {
    let output = umlgen(&["languages", "--json"]);
    assert!(output.status.success());
    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listing["total"], 5);
    let names: Vec<&str> = listing["languages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["language"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"java"));
    assert!(names.contains(&"python"));
    assert!(names.contains(&"php"));
}

#[test]
fn test_languages_json_reports_syntax() {
    let output = umlgen(&["languages", "--json"]);
    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let python = listing["languages"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["language"] == "python")
        .unwrap();
    assert_eq!(python["syntax"], "indentation");
    assert_eq!(python["aliases"][0], "django");
}
