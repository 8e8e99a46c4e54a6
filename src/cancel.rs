//! Cooperative cancellation primitives.
//!
//! Every suspend point in the engine goes through [`CancelToken::sleep_ms`],
//! which re-checks the flag in bounded slices so worst-case cancellation
//! latency stays independent of the total wait length.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Maximum sleep slice between cancellation checks.
const SLICE_MS: u64 = 100;

/// Shared cancellation signal.
///
/// Cloning yields another handle to the same signal; any holder may cancel.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleeps up to `ms`, waking early when cancelled.
    ///
    /// Returns `true` when the full duration elapsed, `false` when the wait
    /// was cut short by cancellation.
    pub fn sleep_ms(&self, ms: u64) -> bool {
        let mut remaining = ms;
        while remaining > 0 {
            if self.is_cancelled() {
                return false;
            }
            let step = remaining.min(SLICE_MS);
            thread::sleep(Duration::from_millis(step));
            remaining -= step;
        }
        !self.is_cancelled()
    }
}
