//! Class diagram detector
//!
//! Identifies class diagram syntax from input text.

use crate::core::Detector;

/// Detector for class diagram syntax
pub struct ClassDetector;

impl ClassDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClassDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ClassDetector {
    fn detect(&self, input: &str) -> bool {
        self.confidence(input) > 0.5
    }

    fn confidence(&self, input: &str) -> f64 {
        let input_lower = input.to_lowercase();
        let trimmed = input_lower.trim();

        if trimmed.starts_with("classdiagram") {
            return 1.0;
        }

        let has_class_def = input_lower.contains("class ") && input.contains('{');
        let has_relationship = ["<|--", "--|>", "*--", "o--", "..|>", "<|.."]
            .iter()
            .any(|p| input.contains(p));
        let has_stereotype = input_lower.contains("<<interface>>")
            || input_lower.contains("<<abstract>>")
            || input_lower.contains("<<enumeration>>");

        // Class with braces = high confidence
        if has_class_def {
            return 0.8;
        }

        if has_relationship {
            return 0.7;
        }

        if has_stereotype {
            return 0.6;
        }

        // Plain association arrows are shared with flowcharts
        if input.contains("-->") && input_lower.contains("class ") {
            return 0.6;
        }

        0.0
    }

    fn diagram_type(&self) -> &'static str {
        "class"
    }

    fn patterns(&self) -> Vec<&'static str> {
        vec!["classDiagram", "class ", "<|--", "*--", "o--"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_class_keyword() {
        let detector = ClassDetector::new();
        assert!(detector.detect("classDiagram\n    class User"));
        assert_eq!(detector.confidence("classDiagram"), 1.0);
    }

    #[test]
    fn test_detects_headerless_class_syntax() {
        let detector = ClassDetector::new();
        assert!(detector.detect("class Invoice {\n  +String number\n}"));
        assert!(detector.detect("Animal <|-- Dog"));
        assert!(detector.confidence("<<interface>> Shape") > 0.5);
    }

    #[test]
    fn test_rejects_other_dialects() {
        let detector = ClassDetector::new();
        assert!(!detector.detect("[*] --> Idle"));
        assert!(!detector.detect("Alice->>Bob: hello"));
        assert_eq!(detector.confidence("random text"), 0.0);
    }
}
