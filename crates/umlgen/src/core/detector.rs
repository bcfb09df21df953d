//! Core detector trait for diagram dialect identification
//!
//! Detectors classify diagram text that carries no header line.

/// Core trait for diagram dialect detectors
///
/// # Example
/// ```
/// use umlgen::core::Detector;
/// use umlgen::plugins::state::StateDetector;
///
/// let detector = StateDetector::new();
/// assert!(detector.detect("[*] --> Draft\nDraft --> Published : publish"));
/// ```
pub trait Detector: Send + Sync {
    /// Detect if the input matches this dialect
    fn detect(&self, input: &str) -> bool;

    /// Get the confidence level of the detection (0.0 to 1.0)
    fn confidence(&self, input: &str) -> f64;

    /// Get the dialect name
    fn diagram_type(&self) -> &'static str;

    /// Get key patterns that this detector looks for
    fn patterns(&self) -> Vec<&'static str>;
}
