mod status;
mod tracker;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub use status::{WorkflowOutcome, WorkflowStatus};
pub use tracker::WorkflowTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowKind {
    Generate,
    Submit,
}

impl WorkflowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowKind::Generate => "generate",
            WorkflowKind::Submit => "submit",
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single error line shown above the form, tagged with the workflow that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub source: WorkflowKind,
    pub message: String,
}

/// Identity of one workflow invocation. Tokens grow monotonically per workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What happens when invocations of the same workflow overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Only the most recently issued request may update state; older
    /// completions are dropped.
    #[default]
    LatestRequest,
    /// Every completion is applied as it arrives; the last one to resolve wins.
    LastResponse,
}

impl OverlapPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            OverlapPolicy::LatestRequest => "latest-request",
            OverlapPolicy::LastResponse => "last-response",
        }
    }
}

impl fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "latest-request" | "latest" => Ok(OverlapPolicy::LatestRequest),
            "last-response" | "last" => Ok(OverlapPolicy::LastResponse),
            other => Err(format!(
                "Unknown overlap policy '{other}' (expected latest-request or last-response)."
            )),
        }
    }
}
