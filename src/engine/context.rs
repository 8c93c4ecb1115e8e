//! Request-scoped deadline and cancellation

use crate::common::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    canceled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }
}

/// Deadline and cancellation signal carried by one request.
///
/// The engine checks it once, on entry to each operation.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl RequestContext {
    /// A context with no deadline that is never canceled
    pub fn background() -> Self {
        Self::default()
    }

    /// A deadline too far out to represent means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::background().deadline_at(deadline),
            None => Self::background(),
        }
    }

    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Fail if the request was canceled or its deadline has passed.
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_canceled() {
            return Err(Error::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_never_expires() {
        assert!(RequestContext::background().check().is_ok());
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = RequestContext::background().deadline_at(Instant::now());
        assert!(matches!(ctx.check(), Err(Error::DeadlineExceeded)));

        let ctx = RequestContext::with_timeout(Duration::from_secs(60));
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn test_unrepresentable_timeout_has_no_deadline() {
        let ctx = RequestContext::with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let ctx = RequestContext::with_timeout(Duration::from_secs(60)).with_cancel(token.clone());
        let copy = ctx.clone();

        token.cancel();
        assert!(matches!(ctx.check(), Err(Error::Canceled)));
        assert!(matches!(copy.check(), Err(Error::Canceled)));
    }

    #[test]
    fn test_cancel_wins_over_deadline() {
        let ctx = RequestContext::background().deadline_at(Instant::now());
        ctx.cancel_token().cancel();
        assert!(matches!(ctx.check(), Err(Error::Canceled)));
    }
}
