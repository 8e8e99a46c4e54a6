//! Combo data model.
//!
//! A [`Combo`] is a named, ordered list of [`ComboAction`]s triggerable by a
//! hotkey. Millisecond fields are clamped to zero at every mutation boundary,
//! including deserialization, so they can never go negative mid-lifecycle.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// One step kind within a combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    KeyPress,
    KeyHold,
    MouseClick,
    Delay,
}

/// Physical mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    XButton1,
    XButton2,
}

impl MouseButton {
    /// User-facing label; the X buttons read as "Mouse 4"/"Mouse 5".
    pub fn label(self) -> &'static str {
        match self {
            MouseButton::Left => "Left",
            MouseButton::Right => "Right",
            MouseButton::Middle => "Middle",
            MouseButton::XButton1 => "Mouse 4",
            MouseButton::XButton2 => "Mouse 5",
        }
    }
}

/// One step of a combo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboAction {
    #[serde(rename = "type")]
    pub action: ActionType,
    /// Symbolic key or mouse-button name, lower-cased on write.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lowercased_opt"
    )]
    key: Option<String>,
    /// Hold duration (KeyHold) or delay length (Delay) in ms.
    #[serde(default, deserialize_with = "clamped_ms")]
    duration: u64,
    /// Pause after this action completes, before the next one starts.
    #[serde(default, deserialize_with = "clamped_ms")]
    delay_after: u64,
    #[serde(default = "default_button")]
    pub button: MouseButton,
}

fn default_button() -> MouseButton {
    MouseButton::Left
}

impl ComboAction {
    pub fn key_press(key: &str) -> Self {
        Self {
            action: ActionType::KeyPress,
            key: Some(key.to_lowercase()),
            duration: 0,
            delay_after: 0,
            button: MouseButton::Left,
        }
    }

    pub fn key_hold(key: &str, duration_ms: i64) -> Self {
        Self {
            action: ActionType::KeyHold,
            key: Some(key.to_lowercase()),
            duration: clamp_ms(duration_ms),
            delay_after: 0,
            button: MouseButton::Left,
        }
    }

    pub fn mouse_click(button: MouseButton) -> Self {
        Self {
            action: ActionType::MouseClick,
            key: None,
            duration: 0,
            delay_after: 0,
            button,
        }
    }

    pub fn delay(duration_ms: i64) -> Self {
        Self {
            action: ActionType::Delay,
            key: None,
            duration: clamp_ms(duration_ms),
            delay_after: 0,
            button: MouseButton::Left,
        }
    }

    pub fn with_delay_after(mut self, ms: i64) -> Self {
        self.set_delay_after(ms);
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn set_key(&mut self, key: Option<String>) {
        self.key = key.map(|k| k.to_lowercase());
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Negative input clamps to 0.
    pub fn set_duration(&mut self, ms: i64) {
        self.duration = clamp_ms(ms);
    }

    pub fn delay_after(&self) -> u64 {
        self.delay_after
    }

    /// Negative input clamps to 0.
    pub fn set_delay_after(&mut self, ms: i64) {
        self.delay_after = clamp_ms(ms);
    }
}

impl fmt::Display for ComboAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            ActionType::KeyPress => write!(f, "Press: {}", self.key().unwrap_or("?")),
            ActionType::KeyHold => {
                write!(f, "Hold: {} for {}ms", self.key().unwrap_or("?"), self.duration)
            }
            ActionType::MouseClick => match self.button {
                MouseButton::XButton1 | MouseButton::XButton2 => {
                    write!(f, "Click: {}", self.button.label())
                }
                _ => write!(f, "Click: {} Mouse Button", self.button.label()),
            },
            ActionType::Delay => write!(f, "Delay: {}ms", self.duration),
        }
    }
}

/// A named, orderable sequence of actions.
///
/// The engine only ever reads snapshots handed to it via
/// `HotkeyManager::update_combos`; it never persists combos itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    #[serde(default = "default_name")]
    pub name: String,
    /// Trigger key or mouse-button name, lower-cased for lookup.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lowercased_opt"
    )]
    hotkey: Option<String>,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    #[serde(default)]
    pub actions: Vec<ComboAction>,
}

fn default_name() -> String {
    "New Combo".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Combo {
    fn default() -> Self {
        Self {
            name: default_name(),
            hotkey: None,
            is_enabled: true,
            actions: Vec::new(),
        }
    }
}

impl Combo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_hotkey(mut self, hotkey: &str) -> Self {
        self.set_hotkey(Some(hotkey.to_string()));
        self
    }

    pub fn with_actions(mut self, actions: Vec<ComboAction>) -> Self {
        self.actions = actions;
        self
    }

    pub fn hotkey(&self) -> Option<&str> {
        self.hotkey.as_deref()
    }

    pub fn set_hotkey(&mut self, hotkey: Option<String>) {
        self.hotkey = hotkey
            .filter(|h| !h.is_empty())
            .map(|h| h.to_lowercase());
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_enabled { "✓" } else { "✗" };
        match self.hotkey() {
            Some(hotkey) => write!(
                f,
                "{} {} [{}] - {} actions",
                status,
                self.name,
                hotkey,
                self.actions.len()
            ),
            None => write!(
                f,
                "{} {} [No Hotkey] - {} actions",
                status,
                self.name,
                self.actions.len()
            ),
        }
    }
}

fn clamp_ms(ms: i64) -> u64 {
    ms.max(0) as u64
}

fn clamped_ms<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(clamp_ms(raw))
}

fn lowercased_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(|s| s.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_duration_clamps_to_zero() {
        let mut action = ComboAction::key_hold("w", -500);
        assert_eq!(action.duration(), 0);
        action.set_duration(-1);
        assert_eq!(action.duration(), 0);
        action.set_duration(250);
        assert_eq!(action.duration(), 250);
    }

    #[test]
    fn test_negative_delay_after_clamps_to_zero() {
        let mut action = ComboAction::key_press("q");
        action.set_delay_after(-42);
        assert_eq!(action.delay_after(), 0);
        action.set_delay_after(120);
        assert_eq!(action.delay_after(), 120);
    }

    #[test]
    fn test_deserialized_negative_values_clamp() {
        let action: ComboAction = toml::from_str(
            r#"
            type = "KeyHold"
            key = "Q"
            duration = -300
            delay_after = -1
            "#,
        )
        .expect("valid action document");
        assert_eq!(action.duration(), 0);
        assert_eq!(action.delay_after(), 0);
        assert_eq!(action.key(), Some("q"));
    }

    #[test]
    fn test_keys_are_lowercased_on_write() {
        let action = ComboAction::key_press("SPACE");
        assert_eq!(action.key(), Some("space"));

        let mut combo = Combo::new("Test");
        combo.set_hotkey(Some("F5".to_string()));
        assert_eq!(combo.hotkey(), Some("f5"));
    }

    #[test]
    fn test_empty_hotkey_means_none() {
        let mut combo = Combo::new("Test");
        combo.set_hotkey(Some(String::new()));
        assert_eq!(combo.hotkey(), None);
    }

    #[test]
    fn test_combo_defaults() {
        let combo = Combo::default();
        assert_eq!(combo.name, "New Combo");
        assert!(combo.is_enabled);
        assert!(combo.hotkey().is_none());
        assert!(combo.actions.is_empty());
    }

    #[test]
    fn test_action_display() {
        assert_eq!(ComboAction::key_press("q").to_string(), "Press: q");
        assert_eq!(
            ComboAction::key_hold("w", 500).to_string(),
            "Hold: w for 500ms"
        );
        assert_eq!(
            ComboAction::mouse_click(MouseButton::XButton1).to_string(),
            "Click: Mouse 4"
        );
        assert_eq!(
            ComboAction::mouse_click(MouseButton::Left).to_string(),
            "Click: Left Mouse Button"
        );
        assert_eq!(ComboAction::delay(250).to_string(), "Delay: 250ms");
    }

    #[test]
    fn test_combo_display() {
        let combo = Combo::new("Burst")
            .with_hotkey("F1")
            .with_actions(vec![ComboAction::key_press("q")]);
        assert_eq!(combo.to_string(), "✓ Burst [f1] - 1 actions");

        let mut disabled = Combo::new("Idle");
        disabled.is_enabled = false;
        assert_eq!(disabled.to_string(), "✗ Idle [No Hotkey] - 0 actions");
    }
}
