//! Symbolic key/button name translation tables.
//!
//! Pure, stateless lookups between the names stored in combos and the
//! platform codes used for registration, polling and synthesis. Unknown
//! names resolve to 0 rather than erroring; callers treat that as a
//! no-op trigger.

use crate::model::MouseButton;

/// Resolves a symbolic key name to its virtual key code.
///
/// Case-insensitive; returns 0 for empty or unrecognized input.
pub fn virtual_key_code(name: &str) -> u32 {
    if name.is_empty() {
        return 0;
    }
    let key = name.to_lowercase();

    // Single letters and digits map by arithmetic offset from their base code.
    if key.len() == 1 {
        let c = key.as_bytes()[0];
        if c.is_ascii_digit() {
            return 0x30 + (c - b'0') as u32;
        }
        if c.is_ascii_lowercase() {
            return 0x41 + (c - b'a') as u32;
        }
    }

    match key.as_str() {
        // Common keys
        "space" | "spacebar" => 0x20,
        "enter" | "return" => 0x0D,
        "tab" => 0x09,
        "esc" | "escape" => 0x1B,
        "backspace" | "back" => 0x08,
        "delete" | "del" => 0x2E,
        "insert" | "ins" => 0x2D,
        // Modifier keys
        "shift" | "lshift" => 0x10,
        "rshift" => 0xA1,
        "ctrl" | "control" | "lctrl" => 0x11,
        "rctrl" => 0xA3,
        "alt" | "lalt" => 0x12,
        "ralt" => 0xA5,
        // Lock keys
        "capslock" | "caps" => 0x14,
        "numlock" | "num" => 0x90,
        "scrolllock" | "scroll" => 0x91,
        // Arrow keys
        "up" | "arrowup" | "uparrow" => 0x26,
        "down" | "arrowdown" | "downarrow" => 0x28,
        "left" | "arrowleft" | "leftarrow" => 0x25,
        "right" | "arrowright" | "rightarrow" => 0x27,
        // Navigation keys
        "home" => 0x24,
        "end" => 0x23,
        "pageup" | "pgup" => 0x21,
        "pagedown" | "pgdown" => 0x22,
        // Function keys
        "f1" => 0x70,
        "f2" => 0x71,
        "f3" => 0x72,
        "f4" => 0x73,
        "f5" => 0x74,
        "f6" => 0x75,
        "f7" => 0x76,
        "f8" => 0x77,
        "f9" => 0x78,
        "f10" => 0x79,
        "f11" => 0x7A,
        "f12" => 0x7B,
        _ => 0,
    }
}

/// Resolves a symbolic mouse-button name to its virtual key code.
///
/// Returns 0 for unrecognized input.
pub fn mouse_button_code(name: &str) -> u32 {
    match name.to_lowercase().as_str() {
        "lmb" | "leftclick" | "leftmouse" => 0x01,
        "rmb" | "rightclick" | "rightmouse" => 0x02,
        "mmb" | "middleclick" | "middlemouse" => 0x04,
        "mouse4" | "xbutton1" => 0x05,
        "mouse5" | "xbutton2" => 0x06,
        _ => 0,
    }
}

pub fn is_mouse_button(name: &str) -> bool {
    mouse_button_code(name) != 0
}

/// Fixed reverse table of every trackable mouse button, canonical name per code.
pub fn all_mouse_button_codes() -> &'static [(u32, &'static str); 5] {
    &[
        (0x01, "lmb"),
        (0x02, "rmb"),
        (0x04, "mmb"),
        (0x05, "mouse4"),
        (0x06, "mouse5"),
    ]
}

pub fn mouse_button_from_name(name: &str) -> Option<MouseButton> {
    match mouse_button_code(name) {
        0x01 => Some(MouseButton::Left),
        0x02 => Some(MouseButton::Right),
        0x04 => Some(MouseButton::Middle),
        0x05 => Some(MouseButton::XButton1),
        0x06 => Some(MouseButton::XButton2),
        _ => None,
    }
}

const LETTER_NAMES: [&str; 26] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s",
    "t", "u", "v", "w", "x", "y", "z",
];

const DIGIT_NAMES: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// Inverse of [`virtual_key_code`]: the canonical symbolic name for a
/// keyboard virtual key code.
///
/// `virtual_key_code(key_name(vk)) == vk` holds for the whole supported set.
pub fn key_name(vk: u32) -> Option<&'static str> {
    match vk {
        0x41..=0x5A => Some(LETTER_NAMES[(vk - 0x41) as usize]),
        0x30..=0x39 => Some(DIGIT_NAMES[(vk - 0x30) as usize]),
        0x20 => Some("space"),
        0x0D => Some("enter"),
        0x09 => Some("tab"),
        0x1B => Some("esc"),
        0x08 => Some("backspace"),
        0x2E => Some("delete"),
        0x2D => Some("insert"),
        0x10 => Some("shift"),
        0xA1 => Some("rshift"),
        0x11 => Some("ctrl"),
        0xA3 => Some("rctrl"),
        0x12 => Some("alt"),
        0xA5 => Some("ralt"),
        0x14 => Some("capslock"),
        0x90 => Some("numlock"),
        0x91 => Some("scrolllock"),
        0x26 => Some("up"),
        0x28 => Some("down"),
        0x25 => Some("left"),
        0x27 => Some("right"),
        0x24 => Some("home"),
        0x23 => Some("end"),
        0x21 => Some("pageup"),
        0x22 => Some("pagedown"),
        0x70 => Some("f1"),
        0x71 => Some("f2"),
        0x72 => Some("f3"),
        0x73 => Some("f4"),
        0x74 => Some("f5"),
        0x75 => Some("f6"),
        0x76 => Some("f7"),
        0x77 => Some("f8"),
        0x78 => Some("f9"),
        0x79 => Some("f10"),
        0x7A => Some("f11"),
        0x7B => Some("f12"),
        _ => None,
    }
}

/// Hardware scan code for a virtual key, 0 when unmapped.
///
/// Static table instead of a MapVirtualKey round-trip so translation stays
/// pure and testable off-OS. Right-hand modifiers share the base scan code
/// and rely on the extended flag at injection time.
pub fn scan_code(vk: u32) -> u16 {
    match vk {
        // Letters A-Z
        0x41 => 0x1E,
        0x42 => 0x30,
        0x43 => 0x2E,
        0x44 => 0x20,
        0x45 => 0x12,
        0x46 => 0x21,
        0x47 => 0x22,
        0x48 => 0x23,
        0x49 => 0x17,
        0x4A => 0x24,
        0x4B => 0x25,
        0x4C => 0x26,
        0x4D => 0x32,
        0x4E => 0x31,
        0x4F => 0x18,
        0x50 => 0x19,
        0x51 => 0x10,
        0x52 => 0x13,
        0x53 => 0x1F,
        0x54 => 0x14,
        0x55 => 0x16,
        0x56 => 0x2F,
        0x57 => 0x11,
        0x58 => 0x2D,
        0x59 => 0x15,
        0x5A => 0x2C,
        // Digits 0-9
        0x30 => 0x0B,
        0x31 => 0x02,
        0x32 => 0x03,
        0x33 => 0x04,
        0x34 => 0x05,
        0x35 => 0x06,
        0x36 => 0x07,
        0x37 => 0x08,
        0x38 => 0x09,
        0x39 => 0x0A,
        // Function keys F1-F12
        0x70 => 0x3B,
        0x71 => 0x3C,
        0x72 => 0x3D,
        0x73 => 0x3E,
        0x74 => 0x3F,
        0x75 => 0x40,
        0x76 => 0x41,
        0x77 => 0x42,
        0x78 => 0x43,
        0x79 => 0x44,
        0x7A => 0x57,
        0x7B => 0x58,
        // Special keys
        0x1B => 0x01, // esc
        0x0D => 0x1C, // enter
        0x09 => 0x0F, // tab
        0x20 => 0x39, // space
        0x08 => 0x0E, // backspace
        0x2E => 0x53, // delete
        0x2D => 0x52, // insert
        0x24 => 0x47, // home
        0x23 => 0x4F, // end
        0x21 => 0x49, // pageup
        0x22 => 0x51, // pagedown
        0x26 => 0x48, // up
        0x28 => 0x50, // down
        0x25 => 0x4B, // left
        0x27 => 0x4D, // right
        // Lock keys
        0x14 => 0x3A, // capslock
        0x90 => 0x45, // numlock
        0x91 => 0x46, // scrolllock
        // Modifiers
        0x10 => 0x2A, // shift
        0xA1 => 0x36, // rshift
        0x11 => 0x1D, // ctrl
        0xA3 => 0x1D, // rctrl (extended)
        0x12 => 0x38, // alt
        0xA5 => 0x38, // ralt (extended)
        _ => 0,
    }
}
