//! ER diagram detector

use crate::core::Detector;

/// Detector for entity-relationship diagram syntax
pub struct ErDetector;

impl ErDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ErDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ErDetector {
    fn detect(&self, input: &str) -> bool {
        self.confidence(input) > 0.5
    }

    fn confidence(&self, input: &str) -> f64 {
        if input.trim().to_lowercase().starts_with("erdiagram") {
            return 1.0;
        }
        let crows_feet = ["||--", "}o--", "}|--", "|o--", "--o{", "--|{", "..o{", "..|{"];
        if crows_feet.iter().any(|marker| input.contains(marker)) {
            return 0.8;
        }
        0.0
    }

    fn diagram_type(&self) -> &'static str {
        "er"
    }

    fn patterns(&self) -> Vec<&'static str> {
        vec!["erDiagram", "||--o{", "}o--||", "|o--|{"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_scoring() {
        let detector = ErDetector::new();
        assert_eq!(detector.confidence("erDiagram\n  A ||--o{ B : has"), 1.0);
        assert_eq!(detector.confidence("CUSTOMER ||--o{ ORDER : places"), 0.8);
        assert_eq!(detector.confidence("classDiagram\n  A --> B"), 0.0);
    }
}
