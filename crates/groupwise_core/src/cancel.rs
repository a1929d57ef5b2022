//! Cooperative cancellation
//!
//! Tokenization, validation, grouping and directory listing call
//! [`CancellationToken::checkpoint`] at loop boundaries (per filename, per
//! rule, per directory entry) so superseded work stops promptly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Returned from a checkpoint after cancellation was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// `Err(Cancelled)` once cancelled, for use with `?`
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_state() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert_eq!(other.checkpoint(), Ok(()));

        token.cancel();
        assert!(other.is_cancelled());
        assert_eq!(other.checkpoint(), Err(Cancelled));
    }

    #[test]
    fn test_checkpoint_short_circuits() {
        fn count_until_cancelled(
            token: &CancellationToken,
            stop_at: usize,
        ) -> Result<usize, Cancelled> {
            let mut seen = 0;
            for i in 0..10 {
                token.checkpoint()?;
                if i == stop_at {
                    token.cancel();
                }
                seen += 1;
            }
            Ok(seen)
        }

        assert_eq!(count_until_cancelled(&CancellationToken::new(), 99), Ok(10));
        assert_eq!(count_until_cancelled(&CancellationToken::new(), 3), Err(Cancelled));
    }
}
