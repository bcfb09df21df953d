//! State diagram detector
//!
//! Identifies state diagram syntax from input text.

use crate::core::Detector;

/// Detector for state diagram syntax
pub struct StateDetector;

impl StateDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StateDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for StateDetector {
    fn detect(&self, input: &str) -> bool {
        self.confidence(input) > 0.5
    }

    fn confidence(&self, input: &str) -> f64 {
        let input_lower = input.to_lowercase();

        if input_lower.trim().starts_with("statediagram") {
            return 1.0;
        }

        let has_terminal = input.contains("[*]");
        let has_transition = input.contains("-->");
        let has_state_keyword = input_lower
            .lines()
            .any(|l| l.trim_start().starts_with("state "));

        if has_terminal && has_transition {
            return 0.9;
        }

        if has_state_keyword && has_transition {
            return 0.7;
        }

        if has_terminal {
            return 0.5;
        }

        0.0
    }

    fn diagram_type(&self) -> &'static str {
        "state"
    }

    fn patterns(&self) -> Vec<&'static str> {
        vec!["stateDiagram", "stateDiagram-v2", "[*]", "-->", "state "]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_state_diagram_keyword() {
        let detector = StateDetector::new();
        assert!(detector.detect("stateDiagram\n    [*] --> Idle"));
        assert!(detector.detect("STATEDIAGRAM-V2\n    [*] --> Idle"));
    }

    #[test]
    fn test_confidence_scoring() {
        let detector = StateDetector::new();
        assert_eq!(detector.confidence("stateDiagram-v2\n    [*] --> Idle"), 1.0);
        assert!(detector.confidence("[*] --> Draft") >= 0.9);
        assert!(detector.confidence("state Order {\nA --> B\n}") >= 0.7);
        assert_eq!(detector.confidence("[*]"), 0.5);
        assert_eq!(detector.confidence("graph TD; A-->B"), 0.0);
    }

    #[test]
    fn test_rejects_other_dialects() {
        let detector = StateDetector::new();
        assert!(!detector.detect("flowchart LR; A-->B"));
        assert!(!detector.detect("sequenceDiagram\n    Alice->>Bob: Hello"));
        assert!(!detector.detect("class User {\n}"));
    }
}
