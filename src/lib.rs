//! Core modules for the macrokey combo engine.
//!
//! Everything except `platform` is OS-neutral so the engine can be driven
//! with fake backends in tests on any host.

pub mod cancel;
pub mod config;
pub mod executor;
pub mod hotkeys;
pub mod keymap;
pub mod model;
pub mod platform;
pub mod recorder;
pub mod simulate;
pub mod status;
pub mod storage;

pub use cancel::CancelToken;
pub use config::EngineConfig;
pub use executor::ComboExecutor;
pub use hotkeys::{HotkeyBackend, HotkeyBinding, HotkeyManager, KeyStateSource};
pub use model::{ActionType, Combo, ComboAction, MouseButton};
pub use recorder::{MacroRecorder, RecorderSettings, RecordingSession};
pub use simulate::{InputInjector, InputSimulator};
pub use status::{status_channel, StatusEvent, StatusSender};
pub use storage::ComboStore;
