//! Macro recording with playback-overhead compensation.
//!
//! A polling thread watches the trackable key set for rising edges and
//! appends a `KeyPress` per press. The gap between presses is written into
//! the previous action's `delay_after`, minus the synthesis overhead the
//! engine will re-introduce at playback time, so a recorded combo replays
//! at roughly the captured tempo.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use smallvec::SmallVec;

use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::hotkeys::KeyStateSource;
use crate::keymap;
use crate::model::ComboAction;
use crate::status::{StatusEvent, StatusSender};

#[derive(Debug, Clone)]
pub struct RecorderSettings {
    pub poll_ms: u64,
    /// Gaps that compensate below this are dropped entirely.
    pub min_delay_ms: u64,
    /// Playback overhead subtracted from each captured gap.
    pub compensation_ms: u64,
    /// Key that ends the session; never recorded.
    pub stop_hotkey: String,
}

impl RecorderSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            poll_ms: config.record_poll_ms,
            min_delay_ms: config.record_min_delay_ms,
            compensation_ms: config.record_compensation_ms,
            stop_hotkey: config.stop_hotkey.to_lowercase(),
        }
    }
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Edge-to-action core of the recorder. Pure in time: callers supply the
/// press timestamp, so tests can drive it without a clock or threads.
#[derive(Debug, Default)]
pub struct RecordingSession {
    actions: Vec<ComboAction>,
    last_press_ms: Option<u64>,
    min_delay_ms: u64,
    compensation_ms: u64,
}

impl RecordingSession {
    pub fn new(settings: &RecorderSettings) -> Self {
        Self {
            actions: Vec::new(),
            last_press_ms: None,
            min_delay_ms: settings.min_delay_ms,
            compensation_ms: settings.compensation_ms,
        }
    }

    /// Records one key press observed at `at_ms` since session start,
    /// returning the appended action.
    pub fn observe_press(&mut self, key: &str, at_ms: u64) -> ComboAction {
        if let Some(last) = self.last_press_ms {
            let raw = at_ms.saturating_sub(last);
            let compensated = raw.saturating_sub(self.compensation_ms);
            // Sub-threshold gaps read as one burst, not a deliberate pause.
            if raw >= self.min_delay_ms || compensated >= self.min_delay_ms {
                if let Some(previous) = self.actions.last_mut() {
                    previous.set_delay_after(compensated as i64);
                }
            }
        }
        self.last_press_ms = Some(at_ms);

        let action = ComboAction::key_press(key);
        self.actions.push(action.clone());
        action
    }

    pub fn actions(&self) -> &[ComboAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.last_press_ms = None;
    }

    pub fn take_actions(&mut self) -> Vec<ComboAction> {
        self.last_press_ms = None;
        std::mem::take(&mut self.actions)
    }

    /// Removes the action at `index`; out-of-range is a no-op.
    pub fn remove_action_at(&mut self, index: usize) {
        if index < self.actions.len() {
            self.actions.remove(index);
        }
    }

    /// Inserts at `index`, clamping to the end when past it.
    pub fn insert_action_at(&mut self, index: usize, action: ComboAction) {
        let index = index.min(self.actions.len());
        self.actions.insert(index, action);
    }

    /// Swaps the action toward the front. Returns false at the boundary with
    /// no state change.
    pub fn move_action_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.actions.len() {
            return false;
        }
        self.actions.swap(index - 1, index);
        true
    }

    /// Swaps the action toward the back. Returns false at the boundary with
    /// no state change.
    pub fn move_action_down(&mut self, index: usize) -> bool {
        if self.actions.len() < 2 || index >= self.actions.len() - 1 {
            return false;
        }
        self.actions.swap(index, index + 1);
        true
    }
}

/// The full set of codes the poll loop watches, canonical name per code.
fn trackable_codes() -> Vec<(u32, &'static str)> {
    let mut codes: Vec<(u32, &'static str)> = (1..=0xFFu32)
        .filter_map(|vk| keymap::key_name(vk).map(|name| (vk, name)))
        .collect();
    codes.extend(keymap::all_mouse_button_codes().iter().copied());
    codes
}

pub struct MacroRecorder {
    key_source: Arc<dyn KeyStateSource>,
    status: StatusSender,
    settings: RecorderSettings,
    is_recording: AtomicBool,
    session: Mutex<RecordingSession>,
    poll_token: Mutex<Option<CancelToken>>,
    poll_thread: Mutex<Option<JoinHandle<()>>>,
}

impl MacroRecorder {
    pub fn new(
        key_source: Arc<dyn KeyStateSource>,
        status: StatusSender,
        settings: RecorderSettings,
    ) -> Self {
        let session = RecordingSession::new(&settings);
        Self {
            key_source,
            status,
            settings,
            is_recording: AtomicBool::new(false),
            session: Mutex::new(session),
            poll_token: Mutex::new(None),
            poll_thread: Mutex::new(None),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    /// Starts a fresh session. Idempotent; a call while recording is a no-op.
    pub fn start_recording(self: &Arc<Self>) {
        if self.is_recording.swap(true, Ordering::SeqCst) {
            return;
        }
        lock(&self.session).clear();

        let token = CancelToken::new();
        *lock(&self.poll_token) = Some(token.clone());

        let recorder = Arc::clone(self);
        *lock(&self.poll_thread) = Some(thread::spawn(move || recorder.poll_loop(&token)));

        let _ = self.status.send(StatusEvent::RecordingStarted);
    }

    /// Ends the session and returns what was captured. Idempotent; when the
    /// session already ended (stop hotkey) this only drains the actions.
    pub fn stop_recording(&self) -> Vec<ComboAction> {
        let was_recording = self.is_recording.swap(false, Ordering::SeqCst);
        if let Some(token) = lock(&self.poll_token).take() {
            token.cancel();
        }
        if let Some(handle) = lock(&self.poll_thread).take() {
            let _ = handle.join();
        }

        let actions = lock(&self.session).take_actions();
        if was_recording {
            let _ = self.status.send(StatusEvent::RecordingStopped(actions.len()));
        }
        actions
    }

    pub fn recorded_actions(&self) -> Vec<ComboAction> {
        lock(&self.session).actions().to_vec()
    }

    pub fn clear(&self) {
        lock(&self.session).clear();
    }

    /// Runs `edit` against the live session, for action-list editing while
    /// paused between takes.
    pub fn edit_session<R>(&self, edit: impl FnOnce(&mut RecordingSession) -> R) -> R {
        edit(&mut lock(&self.session))
    }

    fn poll_loop(self: &Arc<Self>, token: &CancelToken) {
        let codes = trackable_codes();
        let stop_code = match keymap::mouse_button_code(&self.settings.stop_hotkey) {
            0 => keymap::virtual_key_code(&self.settings.stop_hotkey),
            code => code,
        };
        let mut was_down: SmallVec<[bool; 96]> = SmallVec::from_elem(false, codes.len());
        let started = Instant::now();

        while !token.is_cancelled() {
            for (slot, &(code, name)) in codes.iter().enumerate() {
                let down = self.key_source.is_key_down(code);
                let rising = down && !was_down[slot];
                was_down[slot] = down;
                if !rising {
                    continue;
                }
                if code == stop_code {
                    // Session ends itself; a later stop_recording call only
                    // drains the result.
                    if self.is_recording.swap(false, Ordering::SeqCst) {
                        let count = lock(&self.session).len();
                        let _ = self.status.send(StatusEvent::RecordingStopped(count));
                    }
                    return;
                }
                let at_ms = started.elapsed().as_millis() as u64;
                let action = lock(&self.session).observe_press(name, at_ms);
                let _ = self.status.send(StatusEvent::ActionRecorded(action));
            }
            token.sleep_ms(self.settings.poll_ms);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
