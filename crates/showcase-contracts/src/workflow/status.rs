use crate::form::FormError;

use super::RequestToken;

/// Where one workflow stands. Replaces independent loading/error flags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowStatus<T> {
    #[default]
    Idle,
    InFlight,
    Succeeded(T),
    Failed(String),
}

impl<T> WorkflowStatus<T> {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, WorkflowStatus::InFlight)
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkflowStatus::Idle => "idle",
            WorkflowStatus::InFlight => "in_flight",
            WorkflowStatus::Succeeded(_) => "succeeded",
            WorkflowStatus::Failed(_) => "failed",
        }
    }
}

/// Result of one workflow invocation, handed back to whoever triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome<T> {
    Completed(T),
    /// Local validation failed; nothing was sent.
    Rejected(FormError),
    /// The collaborator call failed.
    Failed(String),
    /// A newer request of the same workflow was issued before this one
    /// resolved, so its result was dropped.
    Superseded(RequestToken),
}

impl<T> WorkflowOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, WorkflowOutcome::Completed(_))
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            WorkflowOutcome::Rejected(err) => Some(err.to_string()),
            WorkflowOutcome::Failed(message) => Some(message.clone()),
            WorkflowOutcome::Completed(_) | WorkflowOutcome::Superseded(_) => None,
        }
    }
}
