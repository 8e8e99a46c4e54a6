//! Engine status event stream.
//!
//! Every user-visible state change flows through a single channel; the host
//! (CLI or editor window) decides how to render it. Recoverable conditions
//! like duplicate hotkeys or registration failures are reported here instead
//! of being raised as errors.

use std::fmt;

use crossbeam_channel::{Receiver, Sender};

use crate::model::ComboAction;

#[derive(Debug, Clone)]
pub enum StatusEvent {
    EngineStarted,
    EngineStopped,
    PanicButtonSet(String),
    ComboStarted(String),
    ComboCompleted,
    ComboCancelled,
    ComboStopping,
    PanicCancelled,
    DuplicateHotkey(String),
    HotkeyRegistrationFailed(String),
    RecordingStarted,
    RecordingStopped(usize),
    ActionRecorded(ComboAction),
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::EngineStarted => write!(f, "Macro system active"),
            StatusEvent::EngineStopped => write!(f, "Macro system stopped"),
            StatusEvent::PanicButtonSet(key) => write!(f, "Panic button set to: {key}"),
            StatusEvent::ComboStarted(name) => write!(f, "Executing: {name}"),
            StatusEvent::ComboCompleted => write!(f, "Combo completed"),
            StatusEvent::ComboCancelled => write!(f, "Combo cancelled"),
            StatusEvent::ComboStopping => write!(f, "Stopping combo..."),
            StatusEvent::PanicCancelled => write!(f, "Combo cancelled (panic button)"),
            StatusEvent::DuplicateHotkey(hotkey) => {
                write!(f, "Duplicate hotkey '{hotkey}' ignored, keeping the first combo")
            }
            StatusEvent::HotkeyRegistrationFailed(hotkey) => {
                write!(f, "Failed to register hotkey '{hotkey}'")
            }
            StatusEvent::RecordingStarted => {
                write!(f, "Recording started - press keys to record")
            }
            StatusEvent::RecordingStopped(count) => {
                write!(f, "Recording stopped - {count} actions recorded")
            }
            StatusEvent::ActionRecorded(action) => write!(f, "Recorded: {action}"),
        }
    }
}

pub type StatusSender = Sender<StatusEvent>;

pub fn status_channel() -> (Sender<StatusEvent>, Receiver<StatusEvent>) {
    crossbeam_channel::unbounded()
}
