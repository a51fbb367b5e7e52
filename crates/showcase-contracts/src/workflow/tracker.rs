use super::{OverlapPolicy, RequestToken, WorkflowStatus};

/// Issues request tokens for one workflow and decides which completions may
/// update its status.
#[derive(Debug, Clone)]
pub struct WorkflowTracker<T> {
    status: WorkflowStatus<T>,
    issued: u64,
}

impl<T> Default for WorkflowTracker<T> {
    fn default() -> Self {
        Self {
            status: WorkflowStatus::Idle,
            issued: 0,
        }
    }
}

impl<T> WorkflowTracker<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &WorkflowStatus<T> {
        &self.status
    }

    pub fn latest(&self) -> Option<RequestToken> {
        (self.issued > 0).then_some(RequestToken(self.issued))
    }

    pub fn begin(&mut self) -> RequestToken {
        self.issued += 1;
        self.status = WorkflowStatus::InFlight;
        RequestToken(self.issued)
    }

    pub fn accepts(&self, token: RequestToken, policy: OverlapPolicy) -> bool {
        match policy {
            OverlapPolicy::LatestRequest => self.latest() == Some(token),
            OverlapPolicy::LastResponse => true,
        }
    }

    /// Records the completion of `token`. Returns whether it was applied.
    pub fn complete(
        &mut self,
        token: RequestToken,
        result: Result<T, String>,
        policy: OverlapPolicy,
    ) -> bool {
        if !self.accepts(token, policy) {
            return false;
        }
        self.status = match result {
            Ok(value) => WorkflowStatus::Succeeded(value),
            Err(message) => WorkflowStatus::Failed(message),
        };
        true
    }
}
