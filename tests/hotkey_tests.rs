//! Hotkey manager behavior against fake registration and key-state backends.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use macrokey::{
    status_channel, Combo, ComboAction, ComboExecutor, EngineConfig, HotkeyBackend, HotkeyBinding,
    HotkeyManager, InputInjector, InputSimulator, KeyStateSource, MouseButton, StatusEvent,
};

#[derive(Default)]
struct FakeBackend {
    applied: Mutex<Vec<Vec<HotkeyBinding>>>,
}

impl FakeBackend {
    fn last(&self) -> Vec<HotkeyBinding> {
        self.applied.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl HotkeyBackend for FakeBackend {
    fn apply(&self, bindings: &[HotkeyBinding]) {
        self.applied.lock().unwrap().push(bindings.to_vec());
    }
}

#[derive(Default)]
struct FakeKeys {
    down: Mutex<HashSet<u32>>,
}

impl FakeKeys {
    fn press(&self, code: u32) {
        self.down.lock().unwrap().insert(code);
    }

    fn release(&self, code: u32) {
        self.down.lock().unwrap().remove(&code);
    }
}

impl KeyStateSource for FakeKeys {
    fn is_key_down(&self, code: u32) -> bool {
        self.down.lock().unwrap().contains(&code)
    }
}

#[derive(Default)]
struct NullInjector;

impl InputInjector for NullInjector {
    fn key_scan(&self, _scancode: u16, _down: bool) {}
    fn mouse_button(&self, _button: MouseButton, _down: bool) {}
}

struct Harness {
    manager: Arc<HotkeyManager>,
    backend: Arc<FakeBackend>,
    keys: Arc<FakeKeys>,
    executor: Arc<ComboExecutor>,
    status: Receiver<StatusEvent>,
    triggers: Sender<i32>,
}

fn harness() -> Harness {
    let mut config = EngineConfig::default();
    config.monitor_poll_ms = 5;
    config.panic_debounce_ms = 50;

    let (status_tx, status_rx) = status_channel();
    let (trigger_tx, trigger_rx) = crossbeam_channel::unbounded();

    let backend = Arc::new(FakeBackend::default());
    let keys = Arc::new(FakeKeys::default());
    let simulator = InputSimulator::new(Arc::new(NullInjector), 1, 1);
    let executor = Arc::new(ComboExecutor::new(simulator, status_tx.clone()));

    let manager = Arc::new(HotkeyManager::new(
        Arc::clone(&executor),
        Arc::clone(&backend) as Arc<dyn HotkeyBackend>,
        trigger_rx,
        Arc::clone(&keys) as Arc<dyn KeyStateSource>,
        status_tx,
        &config,
    ));

    Harness {
        manager,
        backend,
        keys,
        executor,
        status: status_rx,
        triggers: trigger_tx,
    }
}

fn wait_for(status: &Receiver<StatusEvent>, mut pred: impl FnMut(&StatusEvent) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if let Ok(event) = status.recv_timeout(Duration::from_millis(50)) {
            if pred(&event) {
                return true;
            }
        }
    }
    false
}

fn long_combo(name: &str, hotkey: &str) -> Combo {
    Combo::new(name)
        .with_hotkey(hotkey)
        .with_actions(vec![ComboAction::delay(10_000)])
}

#[test]
fn test_duplicate_hotkey_keeps_first_combo() {
    let h = harness();
    let combos = vec![
        Combo::new("First")
            .with_hotkey("f1")
            .with_actions(vec![ComboAction::key_press("q")]),
        Combo::new("Second")
            .with_hotkey("f1")
            .with_actions(vec![ComboAction::key_press("w")]),
    ];
    h.manager.update_combos(&combos);

    assert!(wait_for(&h.status, |e| {
        matches!(e, StatusEvent::DuplicateHotkey(hotkey) if hotkey == "f1")
    }));

    h.manager.start();
    let bindings = h.backend.last();
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].vk, 0x70); // f1

    h.triggers.send(bindings[0].id).unwrap();
    assert!(wait_for(&h.status, |e| {
        matches!(e, StatusEvent::ComboStarted(name) if name == "First")
    }));

    h.manager.stop();
}

#[test]
fn test_disabled_and_hotkeyless_combos_are_not_registered() {
    let h = harness();
    let mut disabled = long_combo("Off", "f2");
    disabled.is_enabled = false;
    let combos = vec![disabled, Combo::new("NoTrigger")];

    h.manager.update_combos(&combos);
    h.manager.start();

    assert!(h.backend.last().is_empty());
    h.manager.stop();
}

#[test]
fn test_mouse_hotkey_is_polled_and_fires_once_per_press() {
    let h = harness();
    h.manager.update_combos(&[Combo::new("Blink")
        .with_hotkey("mouse4")
        .with_actions(vec![ComboAction::key_press("q")])]);
    h.manager.start();

    // Mouse buttons never reach the registration backend.
    assert!(h.backend.last().is_empty());

    h.keys.press(0x05);
    assert!(wait_for(&h.status, |e| {
        matches!(e, StatusEvent::ComboStarted(name) if name == "Blink")
    }));

    // Held down: no retrigger until the button is released and pressed again.
    thread::sleep(Duration::from_millis(200));
    let retriggered = h
        .status
        .try_iter()
        .any(|e| matches!(e, StatusEvent::ComboStarted(_)));
    assert!(!retriggered, "combo fired again while button was held");

    h.keys.release(0x05);
    thread::sleep(Duration::from_millis(50));
    h.keys.press(0x05);
    assert!(wait_for(&h.status, |e| {
        matches!(e, StatusEvent::ComboStarted(name) if name == "Blink")
    }));

    h.manager.stop();
}

#[test]
fn test_panic_button_cancels_running_combo() {
    let h = harness();
    h.manager.update_combos(&[long_combo("Long", "f1")]);
    h.manager.start();

    let bindings = h.backend.last();
    h.triggers.send(bindings[0].id).unwrap();
    assert!(wait_for(&h.status, |e| {
        matches!(e, StatusEvent::ComboStarted(_))
    }));

    // Default panic button is the right mouse button. The panic report and
    // the run's own cancellation land in either order.
    h.keys.press(0x02);
    let mut saw_panic = false;
    let mut saw_cancelled = false;
    assert!(wait_for(&h.status, |e| {
        match e {
            StatusEvent::PanicCancelled => saw_panic = true,
            StatusEvent::ComboCancelled => saw_cancelled = true,
            _ => {}
        }
        saw_panic && saw_cancelled
    }));
    h.keys.release(0x02);

    let deadline = Instant::now() + Duration::from_secs(1);
    while h.executor.is_executing() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert!(!h.executor.is_executing());

    h.manager.stop();
}

#[test]
fn test_set_panic_button_is_lowercased_and_reported() {
    let h = harness();
    h.manager.set_panic_button("MOUSE5");

    assert_eq!(h.manager.panic_button(), "mouse5");
    assert!(wait_for(&h.status, |e| {
        matches!(e, StatusEvent::PanicButtonSet(key) if key == "mouse5")
    }));
}

#[test]
fn test_start_and_stop_are_idempotent() {
    let h = harness();
    h.manager.update_combos(&[long_combo("Long", "f1")]);

    h.manager.start();
    h.manager.start();
    h.manager.stop();
    h.manager.stop();

    let events: Vec<StatusEvent> = h.status.try_iter().collect();
    let starts = events
        .iter()
        .filter(|e| matches!(e, StatusEvent::EngineStarted))
        .count();
    let stops = events
        .iter()
        .filter(|e| matches!(e, StatusEvent::EngineStopped))
        .count();
    assert_eq!(starts, 1);
    assert_eq!(stops, 1);

    // Stop unregisters everything.
    assert!(h.backend.last().is_empty());
    assert!(!h.manager.is_active());
}

#[test]
fn test_stop_cancels_running_combo() {
    let h = harness();
    h.manager.update_combos(&[long_combo("Long", "f1")]);
    h.manager.start();

    let bindings = h.backend.last();
    h.triggers.send(bindings[0].id).unwrap();
    assert!(wait_for(&h.status, |e| {
        matches!(e, StatusEvent::ComboStarted(_))
    }));

    h.manager.stop();
    assert!(wait_for(&h.status, |e| {
        matches!(e, StatusEvent::ComboCancelled)
    }));
    assert!(!h.executor.is_executing());
}

#[test]
fn test_triggers_while_inactive_are_dropped() {
    let h = harness();
    h.manager.update_combos(&[long_combo("Long", "f1")]);

    h.manager.handle_hotkey_trigger(1);
    thread::sleep(Duration::from_millis(100));

    let fired = h
        .status
        .try_iter()
        .any(|e| matches!(e, StatusEvent::ComboStarted(_)));
    assert!(!fired);
}
