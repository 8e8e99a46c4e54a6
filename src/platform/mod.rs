//! OS backends for the engine's injection, key-state and hotkey traits.
//!
//! Only a Windows implementation ships; the rest of the crate is
//! platform-neutral and builds everywhere for tests.

#[cfg(windows)]
pub mod win;

#[cfg(windows)]
pub use win::{
    enable_high_resolution_timer, set_console_ctrl_handler, AsyncKeyState, SendInputInjector,
    WinHotkeyBackend,
};
