//! Sequence diagram detector

use crate::core::Detector;

/// Detector for sequence diagram syntax
pub struct SequenceDetector;

impl SequenceDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SequenceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for SequenceDetector {
    fn detect(&self, input: &str) -> bool {
        self.confidence(input) > 0.5
    }

    fn confidence(&self, input: &str) -> f64 {
        let input_lower = input.to_lowercase();

        if input_lower.trim().starts_with("sequencediagram") {
            return 1.0;
        }

        let has_message_arrows = ["->>", "-->>", "-)", "--)"]
            .iter()
            .any(|arrow| input.contains(arrow));
        let has_participant = input_lower.lines().any(|l| {
            let l = l.trim_start();
            l.starts_with("participant ") || l.starts_with("actor ")
        });

        match (has_message_arrows, has_participant) {
            (true, true) => 0.8,
            (true, false) => 0.6,
            (false, true) => 0.4,
            _ => 0.0,
        }
    }

    fn diagram_type(&self) -> &'static str {
        "sequence"
    }

    fn patterns(&self) -> Vec<&'static str> {
        vec!["sequenceDiagram", "->>", "-->>", "-)", "--)", "participant", "actor"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_sequence_diagram_keyword() {
        let detector = SequenceDetector::new();
        assert!(detector.detect("sequenceDiagram\n    Client->>Order: place()"));
        assert!(detector.detect("SEQUENCEDIAGRAM\n    Client->>Order: place()"));
    }

    #[test]
    fn test_confidence_scoring() {
        let detector = SequenceDetector::new();
        assert_eq!(detector.confidence("sequenceDiagram\n    A->>B: hi"), 1.0);
        assert_eq!(detector.confidence("participant Alice\nAlice->>Bob: hi"), 0.8);
        assert_eq!(detector.confidence("Alice->>Bob: hi"), 0.6);
        assert_eq!(detector.confidence("participant Alice"), 0.4);
        assert_eq!(detector.confidence("flowchart LR; A-->B"), 0.0);
    }

    #[test]
    fn test_rejects_other_dialects() {
        let detector = SequenceDetector::new();
        assert!(!detector.detect("stateDiagram-v2\n    [*] --> Draft"));
        assert!(!detector.detect("classDiagram\n    User --> Order"));
    }
}
