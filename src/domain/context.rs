use std::time::{Duration, Instant};

use uuid::Uuid;

use super::errors::DomainError;

/// Per-request context forwarded from the HTTP layer down to the repositories.
///
/// The use cases never inspect it; repositories call [`Context::check`] before
/// starting work so a request whose deadline has passed stops early.
#[derive(Debug, Clone)]
pub struct Context {
    request_id: Uuid,
    deadline: Option<Instant>,
}

impl Context {
    /// A context without a deadline.
    pub fn background() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            deadline: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn is_done(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    pub fn check(&self) -> Result<(), DomainError> {
        if self.is_done() {
            return Err(DomainError::Cancelled);
        }
        Ok(())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
