//! Batch-level cancellation and per-process bounds.
//!
//! A `CancellationToken` is shared between the caller (typically a Ctrl-C
//! handler) and every process runner of a batch. Runners poll it while an
//! external process is alive and kill the process once it flips.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cheaply clonable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Limits applied to every external process started for a batch.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    pub cancel: CancellationToken,
    /// Upper bound for a single probe or encode invocation.
    pub timeout: Option<Duration>,
}

impl RunControl {
    #[must_use]
    pub fn new(cancel: CancellationToken, timeout: Option<Duration>) -> Self {
        Self { cancel, timeout }
    }

    /// Deadline for a process started now, if a timeout is configured.
    #[must_use]
    pub fn deadline_from(&self, start: Instant) -> Option<Instant> {
        self.timeout.map(|t| start + t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_deadline_only_with_timeout() {
        let start = Instant::now();
        assert!(RunControl::default().deadline_from(start).is_none());
        let control = RunControl::new(CancellationToken::new(), Some(Duration::from_secs(3)));
        assert_eq!(control.deadline_from(start), Some(start + Duration::from_secs(3)));
    }
}
