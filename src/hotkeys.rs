//! Hotkey registration, trigger dispatch, and polled monitors.
//!
//! Keyboard hotkeys arrive as ids on a trigger channel fed by the platform
//! backend. Mouse-button hotkeys and the panic button cannot use that path,
//! so they are observed by polling threads that fire on the rising edge.
//!
//! The combo and id tables are immutable snapshots behind `Arc`; updates
//! build a fresh table and swap it wholesale, so dispatch never sees a
//! half-updated mapping.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Receiver;
use smallvec::SmallVec;

use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::executor::ComboExecutor;
use crate::keymap;
use crate::model::Combo;
use crate::status::{StatusEvent, StatusSender};

/// One system-wide hotkey registration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub id: i32,
    pub vk: u32,
}

/// OS hotkey registration surface. `apply` replaces the full registration
/// set; an empty slice unregisters everything.
pub trait HotkeyBackend: Send + Sync {
    fn apply(&self, bindings: &[HotkeyBinding]);
}

/// Async key/button state, one bit per virtual-key code.
pub trait KeyStateSource: Send + Sync {
    fn is_key_down(&self, code: u32) -> bool;
}

pub struct HotkeyManager {
    executor: Arc<ComboExecutor>,
    backend: Arc<dyn HotkeyBackend>,
    triggers: Receiver<i32>,
    key_source: Arc<dyn KeyStateSource>,
    status: StatusSender,
    combos: Mutex<Arc<HashMap<String, Combo>>>,
    hotkey_ids: Mutex<Arc<HashMap<i32, String>>>,
    next_hotkey_id: AtomicI32,
    is_active: AtomicBool,
    panic_button: Mutex<String>,
    threads: Mutex<Vec<JoinHandle<()>>>,
    monitor_token: Mutex<Option<CancelToken>>,
    mouse_monitor_running: AtomicBool,
    monitor_poll_ms: u64,
    panic_debounce_ms: u64,
}

impl HotkeyManager {
    pub fn new(
        executor: Arc<ComboExecutor>,
        backend: Arc<dyn HotkeyBackend>,
        triggers: Receiver<i32>,
        key_source: Arc<dyn KeyStateSource>,
        status: StatusSender,
        config: &EngineConfig,
    ) -> Self {
        Self {
            executor,
            backend,
            triggers,
            key_source,
            status,
            combos: Mutex::new(Arc::new(HashMap::new())),
            hotkey_ids: Mutex::new(Arc::new(HashMap::new())),
            next_hotkey_id: AtomicI32::new(1),
            is_active: AtomicBool::new(false),
            panic_button: Mutex::new(config.panic_button.clone()),
            threads: Mutex::new(Vec::new()),
            monitor_token: Mutex::new(None),
            mouse_monitor_running: AtomicBool::new(false),
            monitor_poll_ms: config.monitor_poll_ms,
            panic_debounce_ms: config.panic_debounce_ms,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }

    pub fn panic_button(&self) -> String {
        lock(&self.panic_button).clone()
    }

    pub fn set_panic_button(&self, key: &str) {
        let key = key.to_lowercase();
        *lock(&self.panic_button) = key.clone();
        let _ = self.status.send(StatusEvent::PanicButtonSet(key));
    }

    /// Replaces the trigger table from the caller's combo list.
    ///
    /// Disabled combos and combos without a hotkey are skipped. When two
    /// enabled combos share a hotkey the first in list order wins and the
    /// collision is reported on the status stream.
    pub fn update_combos(self: &Arc<Self>, list: &[Combo]) {
        let mut table: HashMap<String, Combo> = HashMap::new();
        for combo in list {
            if !combo.is_enabled {
                continue;
            }
            let Some(hotkey) = combo.hotkey() else { continue };
            if table.contains_key(hotkey) {
                let _ = self
                    .status
                    .send(StatusEvent::DuplicateHotkey(hotkey.to_string()));
                continue;
            }
            table.insert(hotkey.to_string(), combo.clone());
        }
        *lock(&self.combos) = Arc::new(table);

        if self.is_active() {
            self.register_all();
            self.ensure_mouse_monitor();
        }
    }

    /// Activates triggering. Idempotent; a second call while active is a
    /// no-op.
    pub fn start(self: &Arc<Self>) {
        if self.is_active.swap(true, Ordering::SeqCst) {
            return;
        }

        let token = CancelToken::new();
        *lock(&self.monitor_token) = Some(token.clone());

        self.register_all();

        let dispatcher = Arc::clone(self);
        let dispatch_token = token.clone();
        let mut threads = vec![thread::spawn(move || {
            dispatcher.dispatch_loop(&dispatch_token)
        })];

        let panic_monitor = Arc::clone(self);
        let panic_token = token.clone();
        threads.push(thread::spawn(move || {
            panic_monitor.panic_loop(&panic_token)
        }));

        *lock(&self.threads) = threads;
        self.ensure_mouse_monitor();

        let _ = self.status.send(StatusEvent::EngineStarted);
    }

    /// Deactivates triggering and unregisters every hotkey. Idempotent.
    /// Any running combo is cancelled.
    pub fn stop(&self) {
        if !self.is_active.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(token) = lock(&self.monitor_token).take() {
            token.cancel();
        }
        let handles = std::mem::take(&mut *lock(&self.threads));
        for handle in handles {
            let _ = handle.join();
        }

        self.backend.apply(&[]);
        *lock(&self.hotkey_ids) = Arc::new(HashMap::new());
        self.executor.stop();

        let _ = self.status.send(StatusEvent::EngineStopped);
    }

    /// Registers keyboard hotkeys from the current combo table. Mouse-button
    /// hotkeys are left to the polling monitor.
    fn register_all(&self) {
        let combos = lock(&self.combos).clone();
        let mut ids: HashMap<i32, String> = HashMap::new();
        let mut bindings: SmallVec<[HotkeyBinding; 16]> = SmallVec::new();

        for hotkey in combos.keys() {
            if keymap::is_mouse_button(hotkey) {
                continue;
            }
            let vk = keymap::virtual_key_code(hotkey);
            if vk == 0 {
                let _ = self
                    .status
                    .send(StatusEvent::HotkeyRegistrationFailed(hotkey.clone()));
                continue;
            }
            let id = self.next_hotkey_id.fetch_add(1, Ordering::SeqCst);
            bindings.push(HotkeyBinding { id, vk });
            ids.insert(id, hotkey.clone());
        }

        self.backend.apply(&bindings);
        *lock(&self.hotkey_ids) = Arc::new(ids);
    }

    /// Spawns the mouse-hotkey monitor when the table holds at least one
    /// mouse-button trigger and none is running yet.
    fn ensure_mouse_monitor(self: &Arc<Self>) {
        if !self.is_active() {
            return;
        }
        let has_mouse = lock(&self.combos)
            .keys()
            .any(|hotkey| keymap::is_mouse_button(hotkey));
        if !has_mouse {
            return;
        }
        if self.mouse_monitor_running.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(token) = lock(&self.monitor_token).clone() else {
            self.mouse_monitor_running.store(false, Ordering::SeqCst);
            return;
        };
        let monitor = Arc::clone(self);
        lock(&self.threads).push(thread::spawn(move || {
            monitor.mouse_loop(&token);
            monitor.mouse_monitor_running.store(false, Ordering::SeqCst);
        }));
    }

    fn dispatch_loop(self: &Arc<Self>, token: &CancelToken) {
        while !token.is_cancelled() {
            match self.triggers.recv_timeout(Duration::from_millis(100)) {
                Ok(id) => self.handle_hotkey_trigger(id),
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    /// Fires the combo bound to a registered hotkey id. Unknown ids and
    /// triggers received while inactive are dropped.
    pub fn handle_hotkey_trigger(self: &Arc<Self>, id: i32) {
        if !self.is_active() {
            return;
        }
        let hotkey = match lock(&self.hotkey_ids).get(&id) {
            Some(hotkey) => hotkey.clone(),
            None => return,
        };
        let combo = match lock(&self.combos).get(&hotkey) {
            Some(combo) => combo.clone(),
            None => return,
        };
        // Fire and continue; the executor serializes overlapping runs.
        let _ = self.executor.spawn(combo);
    }

    /// Polls the panic button and cancels the in-flight combo when it goes
    /// down during execution.
    fn panic_loop(&self, token: &CancelToken) {
        while !token.is_cancelled() {
            let panic_key = self.panic_button();
            let code = match keymap::mouse_button_code(&panic_key) {
                0 => keymap::virtual_key_code(&panic_key),
                code => code,
            };
            if code != 0 && self.executor.is_executing() && self.key_source.is_key_down(code) {
                self.executor.stop();
                let _ = self.status.send(StatusEvent::PanicCancelled);
                // Debounce so one press does not also cancel the next run.
                token.sleep_ms(self.panic_debounce_ms);
                continue;
            }
            token.sleep_ms(self.monitor_poll_ms);
        }
    }

    /// Polls mouse-button hotkeys, firing once per press on the rising edge.
    /// Presses that land while a combo is executing are ignored, not queued.
    fn mouse_loop(self: &Arc<Self>, token: &CancelToken) {
        let buttons = keymap::all_mouse_button_codes();
        let mut was_down = [false; 5];

        while !token.is_cancelled() {
            let combos = lock(&self.combos).clone();
            let panic_key = self.panic_button();

            for (slot, &(code, name)) in buttons.iter().enumerate() {
                let down = self.key_source.is_key_down(code);
                let rising = down && !was_down[slot];
                was_down[slot] = down;

                if !rising || name == panic_key {
                    continue;
                }
                let Some(combo) = combos.get(name) else { continue };
                if self.executor.is_executing() {
                    continue;
                }
                let _ = self.executor.spawn(combo.clone());
            }

            token.sleep_ms(self.monitor_poll_ms);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
