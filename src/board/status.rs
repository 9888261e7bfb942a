// src/board/status.rs
use crate::error::{BackendError, BackendResult};
use crate::models::ApplicationStatus;

impl ApplicationStatus {
    /// Statuses an employer may move an application to from this one.
    /// Accepted and rejected are final.
    pub fn allowed_next(self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Pending => &[Reviewed, Accepted, Rejected],
            Reviewed => &[Accepted, Rejected],
            Accepted | Rejected => &[],
        }
    }

    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }

    pub fn transition(self, next: ApplicationStatus) -> BackendResult<ApplicationStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else if self == next {
            Err(BackendError::Conflict(format!(
                "Application is already {}",
                self
            )))
        } else {
            Err(BackendError::Conflict(format!(
                "Cannot move an application from {} to {}",
                self, next
            )))
        }
    }
}
