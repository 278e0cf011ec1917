//! Cooperative abort signal
//!
//! The host and the running provider share one [`AbortHandle`]. The host
//! requests [`Abort::User`] (e.g. on Ctrl+C); a provider raises
//! [`Abort::Error`] when the whole run cannot continue. The first reason set
//! wins. Export loops poll the signal between segments and between records.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio_util::sync::CancellationToken;

/// Why a run was stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Abort {
    /// Keep going
    #[default]
    None,
    /// The provider hit a run-wide unrecoverable condition
    Error,
    /// Cancellation was requested from outside
    User,
}

impl Abort {
    fn code(self) -> u8 {
        match self {
            Abort::None => 0,
            Abort::Error => 1,
            Abort::User => 2,
        }
    }

    fn from_code(code: u8) -> Self {
        match code {
            1 => Abort::Error,
            2 => Abort::User,
            _ => Abort::None,
        }
    }

    /// Check if no abort was requested
    pub fn is_none(&self) -> bool {
        matches!(self, Abort::None)
    }
}

/// Shared, cloneable abort signal
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    token: CancellationToken,
    reason: Arc<AtomicU8>,
}

impl AbortHandle {
    /// Create a new, unset signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation on behalf of the user
    ///
    /// # Returns
    /// * `bool` - `true` if this call set the reason
    pub fn abort_user(&self) -> bool {
        self.set(Abort::User)
    }

    /// Stop the run because of an unrecoverable condition
    ///
    /// # Returns
    /// * `bool` - `true` if this call set the reason
    pub fn abort_error(&self) -> bool {
        self.set(Abort::Error)
    }

    fn set(&self, abort: Abort) -> bool {
        let updated = self
            .reason
            .compare_exchange(
                Abort::None.code(),
                abort.code(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();

        if updated {
            self.token.cancel();
        }
        updated
    }

    /// Current abort state
    pub fn state(&self) -> Abort {
        Abort::from_code(self.reason.load(Ordering::Acquire))
    }

    /// Check if any abort was requested
    pub fn is_aborted(&self) -> bool {
        !self.state().is_none()
    }

    /// Cancellation token cancelled together with this signal
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait until an abort is requested
    pub async fn aborted(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_reason_wins() {
        let handle = AbortHandle::new();
        assert_eq!(handle.state(), Abort::None);
        assert!(!handle.token().is_cancelled());

        assert!(handle.abort_error());
        assert!(!handle.abort_user());
        assert_eq!(handle.state(), Abort::Error);
        assert!(handle.token().is_cancelled());
    }

    #[test]
    fn test_clones_share_state() {
        let handle = AbortHandle::new();
        let host_side = handle.clone();

        host_side.abort_user();
        assert_eq!(handle.state(), Abort::User);
        assert!(handle.is_aborted());
    }

    #[tokio::test]
    async fn test_aborted_resolves() {
        let handle = AbortHandle::new();
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.aborted().await });

        handle.abort_user();
        task.await.unwrap();
    }
}
