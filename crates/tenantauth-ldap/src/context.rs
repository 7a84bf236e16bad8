//! Per-request context and time bounds.

use crate::error::DirectoryError;
use std::future::Future;
use std::time::Duration;
use tenantauth_core::user::Tenant;
use tokio::time::{timeout, Instant};

/// Tenant and deadline of one sign-in request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Tenant the request is scoped to
    pub tenant: Tenant,
    /// Point in time after which directory work is abandoned
    pub deadline: Option<Instant>,
}

impl RequestContext {
    /// Create a context without a deadline.
    #[must_use]
    pub const fn new(tenant: Tenant) -> Self {
        Self {
            tenant,
            deadline: None,
        }
    }

    /// Set an absolute deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Time left before the deadline, if one is set.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

/// Time budget applied to each directory operation of a request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OperationBudget {
    operation_timeout: Duration,
    deadline: Option<Instant>,
}

impl OperationBudget {
    pub(crate) const fn new(operation_timeout: Duration, deadline: Option<Instant>) -> Self {
        Self {
            operation_timeout,
            deadline,
        }
    }

    /// Run `fut` bounded by the operation timeout and the request deadline, whichever is sooner.
    pub(crate) async fn run<F, T>(
        &self,
        operation: &'static str,
        fut: F,
    ) -> Result<T, DirectoryError>
    where
        F: Future<Output = Result<T, DirectoryError>>,
    {
        let limit = match self.deadline {
            Some(deadline) => self
                .operation_timeout
                .min(deadline.saturating_duration_since(Instant::now())),
            None => self.operation_timeout,
        };

        match timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) if self.deadline_passed() => Err(DirectoryError::Deadline),
            Err(_) => Err(DirectoryError::Timeout { operation }),
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}
