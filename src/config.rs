//! Engine configuration.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Input that force-stops any in-flight combo execution.
    #[serde(default = "default_panic_button")]
    pub panic_button: String,
    /// Key that ends a recording session; never recorded itself.
    #[serde(default = "default_stop_hotkey")]
    pub stop_hotkey: String,
    #[serde(default = "default_key_press_delay")]
    pub key_press_delay_ms: u64,
    #[serde(default = "default_mouse_click_delay")]
    pub mouse_click_delay_ms: u64,
    #[serde(default = "default_monitor_poll")]
    pub monitor_poll_ms: u64,
    #[serde(default = "default_record_poll")]
    pub record_poll_ms: u64,
    #[serde(default = "default_record_min_delay")]
    pub record_min_delay_ms: u64,
    /// Playback overhead subtracted from recorded inter-press gaps. Tune
    /// alongside key_press_delay_ms; the two model the same engine delay.
    #[serde(default = "default_record_compensation")]
    pub record_compensation_ms: u64,
    #[serde(default = "default_panic_debounce")]
    pub panic_debounce_ms: u64,
    #[serde(default = "default_combos_path")]
    pub combos_path: String,
}

fn default_panic_button() -> String {
    "rmb".to_string()
}
fn default_stop_hotkey() -> String {
    "insert".to_string()
}
fn default_key_press_delay() -> u64 {
    20
}
fn default_mouse_click_delay() -> u64 {
    20
}
fn default_monitor_poll() -> u64 {
    50
}
fn default_record_poll() -> u64 {
    10
}
fn default_record_min_delay() -> u64 {
    10
}
fn default_record_compensation() -> u64 {
    20
}
fn default_panic_debounce() -> u64 {
    500
}
fn default_combos_path() -> String {
    "combos.toml".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            panic_button: default_panic_button(),
            stop_hotkey: default_stop_hotkey(),
            key_press_delay_ms: default_key_press_delay(),
            mouse_click_delay_ms: default_mouse_click_delay(),
            monitor_poll_ms: default_monitor_poll(),
            record_poll_ms: default_record_poll(),
            record_min_delay_ms: default_record_min_delay(),
            record_compensation_ms: default_record_compensation(),
            panic_debounce_ms: default_panic_debounce(),
            combos_path: default_combos_path(),
        }
    }
}

impl EngineConfig {
    /// Load config from file, or create default if not exists.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if !path.as_ref().exists() {
            let default_config = Self::default();
            default_config.save_to_file(&path)?;
            return Ok(default_config);
        }
        Self::load_from_file(path)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: EngineConfig = toml::from_str(&content)?;

        // Validate configuration
        if config.monitor_poll_ms < 5 {
            config.monitor_poll_ms = 5;
        }
        if config.record_poll_ms < 5 {
            config.record_poll_ms = 5;
        }
        if config.key_press_delay_ms < 1 {
            config.key_press_delay_ms = 1;
        }
        if config.mouse_click_delay_ms < 1 {
            config.mouse_click_delay_ms = 1;
        }

        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        // Add comments to make the config file more readable
        let commented = format!(
            "panic_button = \"{}\"           # Input that force-stops a running combo\n\
             stop_hotkey = \"{}\"         # Key that ends a recording session\n\
             key_press_delay_ms = {}      # Gap between synthesized key-down and key-up\n\
             mouse_click_delay_ms = {}    # Gap between synthesized button-down and button-up\n\
             monitor_poll_ms = {}         # Panic/mouse monitor poll interval\n\
             record_poll_ms = {}          # Recorder poll interval\n\
             record_min_delay_ms = {}     # Gaps shorter than this are not recorded\n\
             record_compensation_ms = {}  # Playback overhead subtracted from recorded gaps\n\
             panic_debounce_ms = {}      # Quiet period after a panic cancel\n\
             combos_path = \"{}\" # Combo list location\n",
            self.panic_button,
            self.stop_hotkey,
            self.key_press_delay_ms,
            self.mouse_click_delay_ms,
            self.monitor_poll_ms,
            self.record_poll_ms,
            self.record_min_delay_ms,
            self.record_compensation_ms,
            self.panic_debounce_ms,
            self.combos_path,
        );

        fs::write(path, commented)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.panic_button, "rmb");
        assert_eq!(config.stop_hotkey, "insert");
        assert_eq!(config.key_press_delay_ms, 20);
        assert_eq!(config.record_compensation_ms, 20);
        assert_eq!(config.panic_debounce_ms, 500);
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let path = temp_dir().join(format!("macrokey_cfg_{}.toml", std::process::id()));
        let _ = fs::remove_file(&path);

        let created = EngineConfig::load_or_create(&path).expect("create default");
        assert_eq!(created.panic_button, "rmb");
        assert!(path.exists());

        let reloaded = EngineConfig::load_or_create(&path).expect("reload");
        assert_eq!(reloaded.monitor_poll_ms, created.monitor_poll_ms);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_clamps_out_of_range_values() {
        let path = temp_dir().join(format!("macrokey_cfg_clamp_{}.toml", std::process::id()));
        fs::write(
            &path,
            "monitor_poll_ms = 1\nrecord_poll_ms = 0\nkey_press_delay_ms = 0\n",
        )
        .expect("write config");

        let config = EngineConfig::load_from_file(&path).expect("load");
        assert_eq!(config.monitor_poll_ms, 5);
        assert_eq!(config.record_poll_ms, 5);
        assert_eq!(config.key_press_delay_ms, 1);
        assert_eq!(config.panic_button, "rmb");

        let _ = fs::remove_file(&path);
    }
}
