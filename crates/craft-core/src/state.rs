//! Workflow lifecycle states and the transition table.
//!
//! ```text
//! thinking ──► shaping ──► building ──► shipped
//!     │                       ▲
//!     └───────────────────────┘   (accept --skip-shaping)
//! ```
//!
//! Everything here is pure: no I/O, no clock, no hidden state.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The four lifecycle states of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowState {
    Thinking,
    Shaping,
    Building,
    Shipped,
}

impl WorkflowState {
    /// Every state, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Thinking, Self::Shaping, Self::Building, Self::Shipped];

    /// On-disk spelling of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Thinking => "thinking",
            Self::Shaping => "shaping",
            Self::Building => "building",
            Self::Shipped => "shipped",
        }
    }

    /// Returns `true` if `raw` names one of the four states exactly.
    #[must_use]
    pub fn is_valid(raw: &str) -> bool {
        raw.parse::<Self>().is_ok()
    }

    /// `shipped` has no outgoing transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Shipped)
    }

    /// States reachable from `self` in one step.
    #[must_use]
    pub const fn successors(self) -> &'static [Self] {
        match self {
            Self::Thinking => &[Self::Shaping, Self::Building],
            Self::Shaping => &[Self::Building],
            Self::Building => &[Self::Shipped],
            Self::Shipped => &[],
        }
    }

    /// Validate whether a transition from self to `target` is allowed.
    ///
    /// Valid transitions:
    /// - `thinking -> shaping`
    /// - `thinking -> building` (skip shaping)
    /// - `shaping -> building`
    /// - `building -> shipped`
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::IllegalTransition`] for self-transitions,
    /// anything out of `shipped`, and every edge not listed above.
    pub fn can_transition_to(self, target: Self) -> Result<(), TransitionError> {
        let reason = if self.is_terminal() {
            "shipped is a terminal state"
        } else if self == target {
            "no-op transition is not allowed"
        } else if self.successors().contains(&target) {
            return Ok(());
        } else {
            "transition not allowed by lifecycle rules"
        };

        Err(TransitionError::IllegalTransition {
            from: self,
            to: target,
            reason,
        })
    }

    /// Commands a user can run from this state, for display only.
    #[must_use]
    pub const fn next_valid_actions(self) -> &'static [&'static str] {
        match self {
            Self::Thinking => &["accept", "accept --skip-shaping", "reject", "reset"],
            Self::Shaping => &["shape", "approve", "revise", "reset"],
            Self::Building => &["ship", "reset"],
            Self::Shipped => &["reset"],
        }
    }
}

/// Which side of a transition an invalid state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRole {
    Current,
    Target,
}

impl fmt::Display for StateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Current => "current",
            Self::Target => "target",
        })
    }
}

/// Error returned when a state transition is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// One side of the transition is not a recognized state.
    #[error("invalid {role} state: '{got}'")]
    InvalidState { role: StateRole, got: String },

    /// The pair is not an edge of the transition table.
    #[error("invalid transition: cannot go from {from} to {to} ({reason})")]
    IllegalTransition {
        from: WorkflowState,
        to: WorkflowState,
        reason: &'static str,
    },
}

/// Error returned when parsing a state from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown state '{got}'")]
pub struct ParseStateError {
    pub got: String,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thinking" => Ok(Self::Thinking),
            "shaping" => Ok(Self::Shaping),
            "building" => Ok(Self::Building),
            "shipped" => Ok(Self::Shipped),
            _ => Err(ParseStateError { got: s.to_string() }),
        }
    }
}

/// Validate a transition between two raw state strings.
///
/// # Errors
///
/// Returns [`TransitionError::InvalidState`] naming the offending side if
/// either string is not a state, otherwise the result of
/// [`WorkflowState::can_transition_to`].
pub fn validate_transition(from: &str, to: &str) -> Result<(), TransitionError> {
    let from = from.parse::<WorkflowState>().map_err(|e| TransitionError::InvalidState {
        role: StateRole::Current,
        got: e.got,
    })?;
    let to = to.parse::<WorkflowState>().map_err(|e| TransitionError::InvalidState {
        role: StateRole::Target,
        got: e.got,
    })?;
    from.can_transition_to(to)
}

/// Display actions for a raw state string; empty for unknown states.
#[must_use]
pub fn next_valid_actions(raw: &str) -> &'static [&'static str] {
    match raw.parse::<WorkflowState>() {
        Ok(state) => state.next_valid_actions(),
        Err(_) => &[],
    }
}
