//! Translation of combo actions into low-level input events.
//!
//! The simulator is the only component that talks to the injection surface.
//! Injection is best-effort: the OS may silently drop synthetic input, and
//! that is not observable at this layer, so nothing here retries or errors.

use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::keymap;
use crate::model::{ActionType, ComboAction, MouseButton};

/// OS input-injection surface.
pub trait InputInjector: Send + Sync {
    /// Synthesizes a scan-code keyboard event.
    fn key_scan(&self, scancode: u16, down: bool);
    /// Synthesizes a mouse-button event.
    fn mouse_button(&self, button: MouseButton, down: bool);
}

pub struct InputSimulator {
    injector: Arc<dyn InputInjector>,
    key_press_delay_ms: u64,
    mouse_click_delay_ms: u64,
}

impl InputSimulator {
    pub fn new(
        injector: Arc<dyn InputInjector>,
        key_press_delay_ms: u64,
        mouse_click_delay_ms: u64,
    ) -> Self {
        Self {
            injector,
            key_press_delay_ms,
            mouse_click_delay_ms,
        }
    }

    /// Delay inserted between a synthesized key-down and key-up pair.
    /// The recorder subtracts this from captured gaps as playback overhead.
    pub fn key_press_delay_ms(&self) -> u64 {
        self.key_press_delay_ms
    }

    /// Executes one action, returning when it finished or was cancelled.
    ///
    /// Unrecognized key names are silent no-ops. A key held down is always
    /// released, even when the hold wait is cancelled mid-flight.
    pub fn execute_action(&self, action: &ComboAction, token: &CancelToken) {
        match action.action {
            ActionType::KeyPress => {
                let Some(key) = action.key() else { return };
                if let Some(button) = keymap::mouse_button_from_name(key) {
                    self.click(button, token);
                } else {
                    self.tap(key, token);
                }
            }
            ActionType::KeyHold => {
                let Some(key) = action.key() else { return };
                let Some(scan) = resolve_scan(key) else { return };
                self.injector.key_scan(scan, true);
                token.sleep_ms(action.duration());
                // Release unconditionally; a cancelled hold must not leave
                // the key physically stuck down.
                self.injector.key_scan(scan, false);
            }
            ActionType::MouseClick => self.click(action.button, token),
            ActionType::Delay => {
                token.sleep_ms(action.duration());
            }
        }
    }

    fn tap(&self, key: &str, token: &CancelToken) {
        let Some(scan) = resolve_scan(key) else { return };
        self.injector.key_scan(scan, true);
        token.sleep_ms(self.key_press_delay_ms);
        self.injector.key_scan(scan, false);
    }

    fn click(&self, button: MouseButton, token: &CancelToken) {
        self.injector.mouse_button(button, true);
        token.sleep_ms(self.mouse_click_delay_ms);
        self.injector.mouse_button(button, false);
    }
}

fn resolve_scan(key: &str) -> Option<u16> {
    let vk = keymap::virtual_key_code(key);
    if vk == 0 {
        return None;
    }
    match keymap::scan_code(vk) {
        0 => None,
        scan => Some(scan),
    }
}
