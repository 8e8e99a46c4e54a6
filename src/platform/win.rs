//! Windows backends: SendInput injection, GetAsyncKeyState polling and
//! RegisterHotKey dispatch.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::Media::timeBeginPeriod;
use windows::Win32::System::Console::{
    SetConsoleCtrlHandler, CTRL_BREAK_EVENT, CTRL_CLOSE_EVENT, CTRL_C_EVENT,
};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, RegisterHotKey, SendInput, UnregisterHotKey, HOT_KEY_MODIFIERS, INPUT,
    INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP,
    KEYEVENTF_SCANCODE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN,
    MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_XDOWN,
    MOUSEEVENTF_XUP, MOUSEINPUT, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetMessageA, PeekMessageA, PostThreadMessageA, MSG, PM_NOREMOVE, WM_APP, WM_HOTKEY, WM_QUIT,
    WM_USER,
};
use windows::core::BOOL;

use crate::hotkeys::{HotkeyBackend, HotkeyBinding, KeyStateSource};
use crate::keymap;
use crate::model::MouseButton;
use crate::simulate::InputInjector;
use crate::status::{StatusEvent, StatusSender};

/// Tags synthesized events so hooks can tell them from physical input.
const SIMULATED_EVENT_MARKER: usize = 0x4D4B;

/// Request 1ms timer resolution for precise sleep timing.
pub fn enable_high_resolution_timer() {
    unsafe { timeBeginPeriod(1) };
}

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

pub fn set_console_ctrl_handler() -> windows::core::Result<()> {
    unsafe { SetConsoleCtrlHandler(Some(console_handler), true) }
}

#[allow(non_snake_case)]
unsafe extern "system" fn console_handler(ctrl_type: u32) -> BOOL {
    match ctrl_type {
        CTRL_C_EVENT | CTRL_BREAK_EVENT | CTRL_CLOSE_EVENT => {
            // Flag only; the main loop notices and tears the engine down.
            SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
            BOOL(1)
        }
        _ => BOOL(0),
    }
}

/// Scan-code based key and mouse-button synthesis via `SendInput`.
pub struct SendInputInjector;

impl SendInputInjector {
    fn is_extended_scancode(scancode: u16) -> bool {
        // Navigation cluster and arrows need the extended flag or they
        // land on the numpad.
        const EXTENDED_KEYS_BITMAP: u128 = (1u128 << 0x47)
            | (1u128 << 0x48)
            | (1u128 << 0x49)
            | (1u128 << 0x4B)
            | (1u128 << 0x4D)
            | (1u128 << 0x4F)
            | (1u128 << 0x50)
            | (1u128 << 0x51)
            | (1u128 << 0x52)
            | (1u128 << 0x53);
        scancode < 128 && (EXTENDED_KEYS_BITMAP >> scancode) & 1 == 1
    }
}

impl InputInjector for SendInputInjector {
    fn key_scan(&self, scancode: u16, down: bool) {
        let mut flags = KEYEVENTF_SCANCODE;
        if Self::is_extended_scancode(scancode) {
            flags |= KEYEVENTF_EXTENDEDKEY;
        }
        if !down {
            flags |= KEYEVENTF_KEYUP;
        }
        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(0),
                    wScan: scancode,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: SIMULATED_EVENT_MARKER,
                },
            },
        };
        unsafe {
            SendInput(&[input], std::mem::size_of::<INPUT>() as i32);
        }
    }

    fn mouse_button(&self, button: MouseButton, down: bool) {
        let flags = match (button, down) {
            (MouseButton::Left, true) => MOUSEEVENTF_LEFTDOWN,
            (MouseButton::Left, false) => MOUSEEVENTF_LEFTUP,
            (MouseButton::Right, true) => MOUSEEVENTF_RIGHTDOWN,
            (MouseButton::Right, false) => MOUSEEVENTF_RIGHTUP,
            (MouseButton::Middle, true) => MOUSEEVENTF_MIDDLEDOWN,
            (MouseButton::Middle, false) => MOUSEEVENTF_MIDDLEUP,
            (MouseButton::XButton1 | MouseButton::XButton2, true) => MOUSEEVENTF_XDOWN,
            (MouseButton::XButton1 | MouseButton::XButton2, false) => MOUSEEVENTF_XUP,
        };
        let mouse_data = match button {
            MouseButton::XButton1 => 1,
            MouseButton::XButton2 => 2,
            _ => 0,
        };
        let input = INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: 0,
                    dy: 0,
                    mouseData: mouse_data,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: SIMULATED_EVENT_MARKER,
                },
            },
        };
        unsafe {
            SendInput(&[input], std::mem::size_of::<INPUT>() as i32);
        }
    }
}

/// Async key and mouse-button state from `GetAsyncKeyState`.
pub struct AsyncKeyState;

impl KeyStateSource for AsyncKeyState {
    fn is_key_down(&self, code: u32) -> bool {
        unsafe { (GetAsyncKeyState(code as i32) as u16) & 0x8000 != 0 }
    }
}

/// System-wide hotkey registration on a dedicated message-loop thread.
///
/// `RegisterHotKey` is thread-affine: the registering thread must pump
/// messages to receive `WM_HOTKEY`. `apply` hands the binding set to that
/// thread and wakes its `GetMessage` wait with a posted `WM_APP`.
pub struct WinHotkeyBackend {
    commands: Sender<Vec<HotkeyBinding>>,
    loop_thread_id: Arc<AtomicU32>,
}

impl WinHotkeyBackend {
    pub fn spawn(triggers: Sender<i32>, status: StatusSender) -> Self {
        let (commands, command_rx) = crossbeam_channel::unbounded();
        let loop_thread_id = Arc::new(AtomicU32::new(0));
        let thread_id_slot = Arc::clone(&loop_thread_id);

        std::thread::spawn(move || {
            message_loop(&command_rx, &triggers, &status, &thread_id_slot);
        });

        Self {
            commands,
            loop_thread_id,
        }
    }

    fn wake_loop(&self, message: u32) {
        let thread_id = self.loop_thread_id.load(Ordering::SeqCst);
        if thread_id != 0 {
            unsafe {
                let _ = PostThreadMessageA(thread_id, message, WPARAM(0), LPARAM(0));
            }
        }
    }
}

impl HotkeyBackend for WinHotkeyBackend {
    fn apply(&self, bindings: &[HotkeyBinding]) {
        if self.commands.send(bindings.to_vec()).is_ok() {
            self.wake_loop(WM_APP);
        }
    }
}

impl Drop for WinHotkeyBackend {
    fn drop(&mut self) {
        self.wake_loop(WM_QUIT);
    }
}

fn message_loop(
    commands: &Receiver<Vec<HotkeyBinding>>,
    triggers: &Sender<i32>,
    status: &StatusSender,
    thread_id_slot: &AtomicU32,
) {
    unsafe {
        // Force create message queue before publishing the thread id.
        let mut msg = MSG::default();
        let _ = PeekMessageA(&mut msg, None, WM_USER, WM_USER, PM_NOREMOVE);
        thread_id_slot.store(GetCurrentThreadId(), Ordering::SeqCst);
    }

    let mut registered: Vec<i32> = Vec::new();
    loop {
        match drain_commands(commands, &mut registered, status) {
            LoopControl::Continue => {}
            LoopControl::Exit => break,
        }

        let mut msg = MSG::default();
        let got = unsafe { GetMessageA(&mut msg, None, 0, 0) };
        if got.0 <= 0 {
            break;
        }
        if msg.message == WM_HOTKEY {
            let _ = triggers.send(msg.wParam.0 as i32);
        }
    }

    unregister_all(&mut registered);
}

enum LoopControl {
    Continue,
    Exit,
}

fn drain_commands(
    commands: &Receiver<Vec<HotkeyBinding>>,
    registered: &mut Vec<i32>,
    status: &StatusSender,
) -> LoopControl {
    loop {
        match commands.try_recv() {
            Ok(bindings) => {
                unregister_all(registered);
                for binding in &bindings {
                    let outcome = unsafe {
                        RegisterHotKey(None, binding.id, HOT_KEY_MODIFIERS(0), binding.vk)
                    };
                    match outcome {
                        Ok(()) => registered.push(binding.id),
                        Err(_) => {
                            let name = keymap::key_name(binding.vk)
                                .map(str::to_string)
                                .unwrap_or_else(|| format!("vk 0x{:02X}", binding.vk));
                            let _ = status.send(StatusEvent::HotkeyRegistrationFailed(name));
                        }
                    }
                }
            }
            Err(TryRecvError::Empty) => return LoopControl::Continue,
            Err(TryRecvError::Disconnected) => return LoopControl::Exit,
        }
    }
}

fn unregister_all(registered: &mut Vec<i32>) {
    for id in registered.drain(..) {
        unsafe {
            let _ = UnregisterHotKey(None, id);
        }
    }
}
