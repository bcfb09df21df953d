//! State machines attached to stateful classes

use serde::Serialize;
use thiserror::Error;

use crate::core::{StateBlock, StateTransition};

/// Rejected event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("unknown state '{state}'")]
    UnknownState { state: String },

    #[error("event '{event}' is not valid from state '{state}'")]
    InvalidEvent { state: String, event: String },
}

/// The lifecycle of one class: an enum of states and its guarded transitions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateMachine {
    /// Name of the state enum, e.g. `OrderStatus`
    pub enum_name: String,
    /// Field holding the current state
    pub field_name: String,
    /// States in order, the initial state first
    pub states: Vec<String>,
    pub initial: String,
    pub finals: Vec<String>,
    pub transitions: Vec<StateTransition>,
    /// Whether the enum is emitted inside the class rather than declared separately
    pub embedded_enum: bool,
}

impl StateMachine {
    /// Build from a parsed state block; `None` when the block has no states
    pub fn from_block(block: &StateBlock, enum_name: impl Into<String>) -> Option<Self> {
        let initial = block
            .initial
            .clone()
            .or_else(|| block.states.first().cloned())?;
        let mut states = block.states.clone();
        if let Some(pos) = states.iter().position(|s| *s == initial) {
            let state = states.remove(pos);
            states.insert(0, state);
        } else {
            states.insert(0, initial.clone());
        }
        Some(Self {
            enum_name: enum_name.into(),
            field_name: "status".to_string(),
            states,
            initial,
            finals: block.finals.clone(),
            transitions: block.transitions.clone(),
            embedded_enum: true,
        })
    }

    /// Target state of `event` fired in `current`
    ///
    /// # Example
    /// ```
    /// use umlgen::core::{StateBlock, StateTransition};
    /// use umlgen::model::StateMachine;
    ///
    /// let block = StateBlock {
    ///     initial: Some("Draft".into()),
    ///     states: vec!["Draft".into(), "Published".into()],
    ///     transitions: vec![StateTransition {
    ///         from: "Draft".into(),
    ///         event: "publish".into(),
    ///         to: "Published".into(),
    ///     }],
    ///     ..Default::default()
    /// };
    /// let machine = StateMachine::from_block(&block, "PostStatus").unwrap();
    /// assert_eq!(machine.fire("Draft", "publish").unwrap(), "Published");
    /// assert!(machine.fire("Published", "publish").is_err());
    /// ```
    pub fn fire(&self, current: &str, event: &str) -> Result<&str, TransitionError> {
        if !self.states.iter().any(|s| s == current) {
            return Err(TransitionError::UnknownState {
                state: current.to_string(),
            });
        }
        self.transitions
            .iter()
            .find(|t| t.from == current && t.event == event)
            .map(|t| t.to.as_str())
            .ok_or_else(|| TransitionError::InvalidEvent {
                state: current.to_string(),
                event: event.to_string(),
            })
    }

    /// Distinct event names in first-appearance order
    pub fn events(&self) -> Vec<&str> {
        let mut events: Vec<&str> = Vec::new();
        for transition in &self.transitions {
            if !events.contains(&transition.event.as_str()) {
                events.push(&transition.event);
            }
        }
        events
    }

    /// Transitions triggered by `event`
    pub fn transitions_for<'a>(&'a self, event: &'a str) -> impl Iterator<Item = &'a StateTransition> + 'a {
        self.transitions.iter().filter(move |t| t.event == event)
    }
}
