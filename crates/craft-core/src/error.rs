use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::state::{ParseStateError, TransitionError};
use crate::workflow::ChecksumMismatch;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotFound,
    ReadFailure,
    WriteFailure,
    MalformedDocument,
    InvalidState,
    IllegalTransition,
    ChecksumMismatch,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "E1001",
            Self::ReadFailure => "E1002",
            Self::WriteFailure => "E1003",
            Self::MalformedDocument => "E2001",
            Self::InvalidState => "E2002",
            Self::IllegalTransition => "E2003",
            Self::ChecksumMismatch => "E3001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotFound => "No workflow found",
            Self::ReadFailure => "Workflow file could not be read",
            Self::WriteFailure => "Workflow file could not be written",
            Self::MalformedDocument => "Malformed workflow document",
            Self::InvalidState => "Invalid workflow state",
            Self::IllegalTransition => "Invalid state transition",
            Self::ChecksumMismatch => "Workflow checksum mismatch",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotFound => Some("Run `craft start \"<intent>\"` to begin."),
            Self::ReadFailure | Self::WriteFailure => {
                Some("Check permissions on the .craft directory and retry.")
            }
            Self::MalformedDocument | Self::InvalidState => {
                Some("Fix .craft/workflow.md by hand or abandon it with `craft reset --force`.")
            }
            Self::IllegalTransition => Some(
                "Follow valid transitions: thinking -> shaping -> building -> shipped \
                 (or thinking -> building).",
            ),
            Self::ChecksumMismatch => {
                Some("The file was edited outside craft; review it before continuing.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors surfaced by workflow decoding, transitions, and persistence.
///
/// Decode and transition failures never leave a partially mutated
/// [`Workflow`](crate::Workflow) behind.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The backing workflow file does not exist.
    #[error("no workflow found at {}", path.display())]
    NotFound { path: PathBuf },

    /// Reading the workflow file failed for a reason other than absence.
    #[error("failed to read workflow {}: {source}", path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing, renaming, or removing workflow storage failed.
    #[error("failed to write workflow {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The header block markers are missing or unbalanced.
    #[error("invalid workflow file: {0}")]
    MalformedDocument(&'static str),

    /// A stored state value is outside the known enumeration.
    #[error("invalid workflow state: {0}")]
    InvalidState(#[from] ParseStateError),

    /// The requested transition is not permitted.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Advisory: stored checksum does not match the recomputed one.
    #[error(transparent)]
    ChecksumMismatch(#[from] ChecksumMismatch),
}

impl WorkflowError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::ReadFailure { .. } => ErrorCode::ReadFailure,
            Self::WriteFailure { .. } => ErrorCode::WriteFailure,
            Self::MalformedDocument(_) => ErrorCode::MalformedDocument,
            Self::InvalidState(_) | Self::Transition(TransitionError::InvalidState { .. }) => {
                ErrorCode::InvalidState
            }
            Self::Transition(TransitionError::IllegalTransition { .. }) => {
                ErrorCode::IllegalTransition
            }
            Self::ChecksumMismatch(_) => ErrorCode::ChecksumMismatch,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    /// Returns `true` when the error only means "nothing saved yet".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, WorkflowError};
    use crate::state::{TransitionError, WorkflowState};
    use std::collections::HashSet;
    use std::path::PathBuf;

    const ALL: [ErrorCode; 7] = [
        ErrorCode::NotFound,
        ErrorCode::ReadFailure,
        ErrorCode::WriteFailure,
        ErrorCode::MalformedDocument,
        ErrorCode::InvalidState,
        ErrorCode::IllegalTransition,
        ErrorCode::ChecksumMismatch,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let raw = code.code();
            assert_eq!(raw.len(), 5);
            assert!(raw.starts_with('E'));
            assert!(raw.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn transition_errors_map_to_distinct_codes() {
        let illegal = WorkflowError::from(TransitionError::IllegalTransition {
            from: WorkflowState::Thinking,
            to: WorkflowState::Shipped,
            reason: "transition not allowed by lifecycle rules",
        });
        assert_eq!(illegal.code(), ErrorCode::IllegalTransition);

        let invalid = WorkflowError::from(TransitionError::InvalidState {
            role: crate::state::StateRole::Target,
            got: "bogus".into(),
        });
        assert_eq!(invalid.code(), ErrorCode::InvalidState);
    }

    #[test]
    fn not_found_message_names_path() {
        let err = WorkflowError::NotFound {
            path: PathBuf::from("/repo/.craft/workflow.md"),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no workflow found at /repo/.craft/workflow.md");
        assert!(err.hint().is_some());
    }
}
