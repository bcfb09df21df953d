//! Activity diagram detector
//!
//! Flowchart notation documenting a method's control flow.

use crate::core::Detector;
use tracing::trace;

const CONNECTORS: [&str; 5] = ["-.->", "==>", "-->", "---", "-->|"];

/// Detector for flowchart-style activity diagrams
pub struct ActivityDetector;

impl ActivityDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ActivityDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ActivityDetector {
    fn detect(&self, input: &str) -> bool {
        self.confidence(input) > 0.5
    }

    fn confidence(&self, input: &str) -> f64 {
        let lower = input.trim().to_lowercase();
        if ["flowchart", "graph", "activitydiagram"]
            .iter()
            .any(|k| lower.starts_with(k))
        {
            return 1.0;
        }

        let has_connector = CONNECTORS.iter().any(|c| input.contains(c));
        // State diagrams share `-->` but mark pseudostates with [*]
        if input.contains("[*]") {
            return 0.1;
        }
        let has_shapes = input.contains('[') && input.contains(']');
        let has_subgraph = lower.lines().any(|l| l.trim_start().starts_with("subgraph"));
        let score = match (has_connector, has_shapes || has_subgraph) {
            (true, true) => 0.7,
            (true, false) => 0.3,
            (false, true) => 0.2,
            _ => 0.0,
        };
        trace!(score, "Activity confidence");
        score
    }

    fn diagram_type(&self) -> &'static str {
        "activity"
    }

    fn patterns(&self) -> Vec<&'static str> {
        vec!["flowchart", "graph", "activityDiagram", "subgraph", "-->", "-->|"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_scoring() {
        let detector = ActivityDetector::new();
        assert_eq!(detector.confidence("flowchart TD\n A --> B"), 1.0);
        assert_eq!(detector.confidence("A[Start] --> B[Check]"), 0.7);
        assert_eq!(detector.confidence("User --> Order"), 0.3);
        assert!(detector.confidence("[*] --> Draft") < 0.5);
    }

    #[test]
    fn test_rejects_class_relationships() {
        let detector = ActivityDetector::new();
        assert!(!detector.detect("Customer \"1\" --> \"*\" Order"));
    }
}
