//! Sequential combo playback with single-flight cancellation.
//!
//! At most one combo run is in flight at any instant. Starting a new run
//! cancels the active one and waits for it to unwind before proceeding
//! ("last trigger wins", triggers are never queued).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::model::Combo;
use crate::simulate::InputSimulator;
use crate::status::{StatusEvent, StatusSender};

/// Grace period granted to a cancelled run before the next one starts.
const CANCEL_GRACE_MS: u64 = 100;

pub struct ComboExecutor {
    simulator: InputSimulator,
    is_executing: AtomicBool,
    current_run: Mutex<Option<CancelToken>>,
    // Serializes run bodies so overlapping execute_combo calls cannot
    // interleave their actions.
    run_lock: Mutex<()>,
    // Ticket of the most recent execute_combo call; stale claimants that
    // queued behind the run lock bail out instead of playing.
    latest_claim: AtomicU64,
    status: StatusSender,
}

impl ComboExecutor {
    pub fn new(simulator: InputSimulator, status: StatusSender) -> Self {
        Self {
            simulator,
            is_executing: AtomicBool::new(false),
            current_run: Mutex::new(None),
            run_lock: Mutex::new(()),
            latest_claim: AtomicU64::new(0),
            status,
        }
    }

    pub fn is_executing(&self) -> bool {
        self.is_executing.load(Ordering::SeqCst)
    }

    pub fn simulator(&self) -> &InputSimulator {
        &self.simulator
    }

    /// Plays the combo's actions in order, blocking until completion or
    /// cancellation. Any run already in flight is cancelled first.
    pub fn execute_combo(&self, combo: &Combo) {
        let claim = self.latest_claim.fetch_add(1, Ordering::SeqCst) + 1;
        if self.is_executing() {
            self.stop();
            thread::sleep(Duration::from_millis(CANCEL_GRACE_MS));
        }

        let _run = lock(&self.run_lock);
        // A newer trigger arrived while this one waited for the lock or the
        // cancel grace; that one is the sole survivor.
        if self.latest_claim.load(Ordering::SeqCst) != claim {
            return;
        }
        let token = CancelToken::new();
        *lock(&self.current_run) = Some(token.clone());
        self.is_executing.store(true, Ordering::SeqCst);
        let _ = self
            .status
            .send(StatusEvent::ComboStarted(combo.name.clone()));

        for action in &combo.actions {
            if token.is_cancelled() {
                break;
            }
            self.simulator.execute_action(action, &token);
            if action.delay_after() > 0 && !token.is_cancelled() {
                token.sleep_ms(action.delay_after());
            }
        }

        let outcome = if token.is_cancelled() {
            StatusEvent::ComboCancelled
        } else {
            StatusEvent::ComboCompleted
        };
        self.is_executing.store(false, Ordering::SeqCst);
        *lock(&self.current_run) = None;
        let _ = self.status.send(outcome);
    }

    /// Runs the combo on its own thread; completion and cancellation are
    /// observable on the status stream, the handle is for callers that want
    /// to join.
    pub fn spawn(self: &Arc<Self>, combo: Combo) -> JoinHandle<()> {
        let executor = Arc::clone(self);
        thread::spawn(move || executor.execute_combo(&combo))
    }

    /// Signals cancellation of the current run. Idempotent; a no-op when
    /// nothing is running.
    pub fn stop(&self) {
        if let Some(token) = lock(&self.current_run).as_ref() {
            token.cancel();
            let _ = self.status.send(StatusEvent::ComboStopping);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
