//! Terminal output for generation summaries and validated models
//!
//! Applies ANSI escape codes using crossterm when color is enabled.

use crossterm::style::{Color, Stylize};
use umlgen::generation::{FileOutcome, GenerationSummary};
use umlgen::model::Model;

const OUTCOMES: [FileOutcome; 5] = [
    FileOutcome::Created,
    FileOutcome::Merged,
    FileOutcome::Skipped,
    FileOutcome::Overwritten,
    FileOutcome::Failed,
];

fn outcome_color(outcome: FileOutcome) -> Color {
    match outcome {
        FileOutcome::Created => Color::Green,
        FileOutcome::Merged => Color::Cyan,
        FileOutcome::Skipped => Color::DarkGrey,
        FileOutcome::Overwritten => Color::Yellow,
        FileOutcome::Failed => Color::Red,
    }
}

/// Render a generation summary, coloring outcome words and conflict lines
pub fn render_summary(summary: &GenerationSummary, color: bool) -> String {
    let text = summary.to_string();
    if !color {
        return text;
    }

    let mut result = String::with_capacity(text.len() * 2);
    for line in text.lines() {
        let trimmed = line.trim_start();
        let indent = &line[..line.len() - trimmed.len()];
        let outcome = OUTCOMES
            .iter()
            .find(|o| trimmed.starts_with(o.as_str()) && indent.len() == 2);

        if let Some(outcome) = outcome {
            let word = outcome.as_str();
            result.push_str(indent);
            result.push_str(&format!("{}", word.with(outcome_color(*outcome))));
            result.push_str(&trimmed[word.len()..]);
        } else if trimmed.starts_with("! kept") {
            result.push_str(&format!("{}", line.with(Color::Yellow)));
        } else if trimmed.starts_with("error:") {
            result.push_str(&format!("{}", line.with(Color::Red)));
        } else {
            result.push_str(line);
        }
        result.push('\n');
    }
    result
}

/// Render the class listing printed by `validate`
pub fn render_model(model: &Model, color: bool) -> String {
    let mut out = String::new();
    for class in model.classes() {
        let name = if color {
            format!("{}", class.name().with(Color::Cyan))
        } else {
            class.name().to_string()
        };
        let mut notes = Vec::new();
        if class.is_enumeration() {
            notes.push("enumeration".to_string());
        }
        if let Some(machine) = &class.state_machine {
            notes.push(format!("{} states", machine.states.len()));
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" ({})", notes.join(", "))
        };
        out.push_str(&format!(
            "{}: {} fields, {} relationships, {} behaviors{}\n",
            name,
            class.fields().count(),
            class.relationships.len(),
            class.behaviors.len(),
            notes
        ));
    }

    for warning in &model.warnings {
        let line = format!("warning: {}", warning);
        if color {
            out.push_str(&format!("{}\n", line.with(Color::Yellow)));
        } else {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out.push_str(&format!(
        "{} classes, {} relationships, {} warnings\n",
        model.len(),
        model.edges.len(),
        model.warnings.len()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use umlgen::codegen::Capability;
    use umlgen::generation::GenerationReport;

    fn summary() -> GenerationSummary {
        GenerationSummary::new(
            "java",
            Path::new("out"),
            vec![
                GenerationReport::new("Order", Capability::Entity, "out/Order.java", FileOutcome::Created),
                GenerationReport::new("Line", Capability::Entity, "out/Line.java", FileOutcome::Merged),
            ],
        )
    }

    #[test]
    fn test_plain_summary_matches_display() {
        let summary = summary();
        assert_eq!(render_summary(&summary, false), summary.to_string());
    }

    #[test]
    fn test_colored_summary_keeps_text() {
        let output = render_summary(&summary(), true);
        assert!(output.contains("\x1b["));
        assert!(output.contains("out/Order.java"));
        assert!(output.contains("created"));
    }

    #[test]
    fn test_render_model_counts() {
        let model = umlgen::parse_model(
            "classDiagram\n    class Order {\n        +String number\n    }\n    class Line\n    Order \"1\" --> \"*\" Line : lines",
        )
        .unwrap();
        let text = render_model(&model, false);
        assert!(text.starts_with("Order: 1 fields"));
        assert!(text.ends_with("2 classes, 1 relationships, 0 warnings\n"));
    }
}
