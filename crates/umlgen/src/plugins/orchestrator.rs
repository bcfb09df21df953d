//! Plugin orchestrator for the diagram parsing pipeline
//!
//! The orchestrator splits a document into blocks, picks a dialect for each
//! block (header first, detectors second) and runs the matching parser into
//! one shared [`Diagram`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, span, trace, warn, Level};

use crate::core::{split_blocks, Detector, Diagram, DiagramPlugin, Dialect, Parser, Result, UmlGenError};
use crate::plugins::{ActivityPlugin, ClassPlugin, ErPlugin, SequencePlugin, StatePlugin};

/// Plugin orchestrator that coordinates detection and parsing
pub struct Orchestrator {
    parsers: HashMap<Dialect, Box<dyn Parser<Diagram>>>,
    detectors: Vec<(Dialect, Arc<dyn Detector>)>,
}

impl Orchestrator {
    /// Create a new empty orchestrator
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
            detectors: Vec::new(),
        }
    }

    /// Create an orchestrator with every built-in dialect registered
    pub fn with_all_plugins() -> Self {
        let mut orchestrator = Self::new();
        orchestrator.register::<ClassPlugin>();
        orchestrator.register::<StatePlugin>();
        orchestrator.register::<SequencePlugin>();
        orchestrator.register::<ErPlugin>();
        orchestrator.register::<ActivityPlugin>();
        orchestrator
    }

    /// Register a plugin's parser and detector
    pub fn register<P: DiagramPlugin>(&mut self) {
        debug!(plugin = P::name(), version = P::version(), "Registering plugin");
        self.parsers
            .insert(P::dialect(), Box::new(P::create_parser()));
        self.detectors.retain(|(dialect, _)| *dialect != P::dialect());
        self.detectors.push((P::dialect(), P::detector()));
    }

    /// Dialects with a registered parser, in registration order
    pub fn dialects(&self) -> Vec<Dialect> {
        self.detectors.iter().map(|(dialect, _)| *dialect).collect()
    }

    /// Pick the dialect of headerless text: the most confident detector, else class
    pub fn detect_dialect(&self, input: &str) -> Dialect {
        let detect_span = span!(Level::DEBUG, "detect_dialect", input_len = input.len());
        let _enter = detect_span.enter();

        let mut best: Option<(Dialect, f64)> = None;
        for (dialect, detector) in &self.detectors {
            let confidence = detector.confidence(input);
            trace!(detector = detector.diagram_type(), confidence, "Checking detector");
            if detector.detect(input) && best.map_or(true, |(_, c)| confidence > c) {
                best = Some((*dialect, confidence));
            }
        }

        match best {
            Some((dialect, confidence)) => {
                debug!(dialect = %dialect, confidence, "Detected dialect");
                dialect
            }
            None => {
                debug!("No detector matched, defaulting to class dialect");
                Dialect::Class
            }
        }
    }

    /// Parse a whole document into one [`Diagram`].
    ///
    /// Fails on the first fatal syntax error; per-line problems are kept as
    /// warnings on the returned diagram.
    pub fn parse(&self, input: &str) -> Result<Diagram> {
        let parse_span = span!(Level::INFO, "parse_document", input_len = input.len());
        let _enter = parse_span.enter();

        let mut diagram = Diagram::new();
        for block in split_blocks(input)? {
            let dialect = block
                .dialect
                .unwrap_or_else(|| self.detect_dialect(&block.text));
            let block_span = span!(
                Level::DEBUG,
                "parse_block",
                dialect = %dialect,
                first_line = block.first_line
            );
            let _block_enter = block_span.enter();

            let parser = self.parsers.get(&dialect).ok_or_else(|| {
                UmlGenError::syntax(
                    block.first_line,
                    format!("no parser registered for {} diagrams", dialect),
                )
            })?;
            diagram.begin_block(block.first_line);
            parser.parse(&block.text, &mut diagram)?;
            debug!(parser = parser.name(), "Block parsed");
        }
        diagram.mark_navigation_attributes();

        for warning in diagram.warnings() {
            warn!(%warning, "Diagram line skipped");
        }
        info!(
            classes = diagram.classes().count(),
            relationships = diagram.relationships().len(),
            state_blocks = diagram.state_blocks().len(),
            behaviors = diagram.behaviors().len(),
            "Parsed document"
        );
        Ok(diagram)
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}
