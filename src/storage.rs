//! Combo list persistence.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::model::Combo;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ComboFile {
    #[serde(default)]
    combos: Vec<Combo>,
}

pub struct ComboStore {
    path: PathBuf,
}

impl ComboStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the combo list. A missing file is an empty list, not an error.
    pub fn load(&self) -> anyhow::Result<Vec<Combo>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        read_combo_file(&self.path)
    }

    pub fn save(&self, combos: &[Combo]) -> anyhow::Result<()> {
        write_combo_file(&self.path, combos)
    }

    /// Writes the list to an arbitrary path, leaving the store's own file
    /// untouched.
    pub fn export<P: AsRef<Path>>(&self, path: P, combos: &[Combo]) -> anyhow::Result<()> {
        write_combo_file(path.as_ref(), combos)
    }

    /// Reads a list from an arbitrary path. Unlike [`load`](Self::load), a
    /// missing file is an error here; the caller asked for that file.
    pub fn import<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<Vec<Combo>> {
        read_combo_file(path.as_ref())
    }
}

fn read_combo_file(path: &Path) -> anyhow::Result<Vec<Combo>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read combo file {}", path.display()))?;
    let file: ComboFile = toml::from_str(&content)
        .with_context(|| format!("failed to parse combo file {}", path.display()))?;
    Ok(file.combos)
}

fn write_combo_file(path: &Path, combos: &[Combo]) -> anyhow::Result<()> {
    let file = ComboFile {
        combos: combos.to_vec(),
    };
    let content = toml::to_string_pretty(&file)
        .context("failed to serialize combo list")?;
    fs::write(path, content)
        .with_context(|| format!("failed to write combo file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComboAction, MouseButton};
    use std::env::temp_dir;

    fn temp_path(tag: &str) -> PathBuf {
        temp_dir().join(format!("macrokey_{tag}_{}.toml", std::process::id()))
    }

    fn sample_combos() -> Vec<Combo> {
        vec![
            Combo::new("Burst").with_hotkey("f1").with_actions(vec![
                ComboAction::key_press("q").with_delay_after(100),
                ComboAction::key_hold("w", 500),
                ComboAction::mouse_click(MouseButton::XButton1),
                ComboAction::delay(250),
            ]),
            Combo::new("Idle"),
        ]
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let store = ComboStore::new(temp_path("missing"));
        let _ = fs::remove_file(store.path());
        let combos = store.load().expect("load");
        assert!(combos.is_empty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let store = ComboStore::new(temp_path("roundtrip"));
        let combos = sample_combos();

        store.save(&combos).expect("save");
        let loaded = store.load().expect("load");
        assert_eq!(loaded, combos);

        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_import_missing_file_is_an_error() {
        let store = ComboStore::new(temp_path("store"));
        let absent = temp_path("absent_import");
        let _ = fs::remove_file(&absent);
        assert!(store.import(&absent).is_err());
    }

    #[test]
    fn test_export_then_import() {
        let store = ComboStore::new(temp_path("export_store"));
        let target = temp_path("export_target");
        let combos = sample_combos();

        store.export(&target, &combos).expect("export");
        // The store's own file is untouched by export.
        assert!(!store.path().exists());

        let imported = store.import(&target).expect("import");
        assert_eq!(imported, combos);

        let _ = fs::remove_file(&target);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = temp_path("malformed");
        fs::write(&path, "combos = \"not a list\"").expect("write");
        let store = ComboStore::new(&path);
        assert!(store.load().is_err());
        let _ = fs::remove_file(&path);
    }
}
