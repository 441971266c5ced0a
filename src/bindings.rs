//! Binding store - persisted MIDI note to keystroke mapping
//!
//! The store owns the `BindingConfig` aggregate and is the only way to mutate
//! it. Each mutation is applied to a copy, written to disk as a whole-file
//! replacement, and only then made visible to readers.

use crate::keystroke::KeyStroke;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while loading or persisting the binding config
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize binding config: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persisted binding configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BindingConfig {
    /// MIDI note number -> injected keystroke
    #[serde(default, alias = "keyMapping")]
    pub key_mapping: BTreeMap<u8, KeyStroke>,
    /// Last selected MIDI input device (empty when none was chosen)
    #[serde(default, alias = "midiDevice")]
    pub midi_device: String,
}

/// Thread-safe owner of the binding config and its backing file
pub struct BindingStore {
    path: PathBuf,
    /// Current config, replaced wholesale after each successful write
    config: RwLock<BindingConfig>,
    /// Serializes mutate-and-persist sequences
    write_lock: Mutex<()>,
}

impl BindingStore {
    /// Load the config at `path`, creating an empty one if the file is absent
    ///
    /// A file that exists but fails to parse is an error; it is never
    /// replaced with defaults.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let config = if path.exists() {
            let json = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let config: BindingConfig =
                serde_json::from_str(&json).map_err(|source| StoreError::Parse {
                    path: path.clone(),
                    source,
                })?;
            info!(
                "Loaded {} binding(s) from {}",
                config.key_mapping.len(),
                path.display()
            );
            config
        } else {
            info!("No binding config at {}, creating one", path.display());
            let config = BindingConfig::default();
            write_config(&path, &config)?;
            config
        };

        Ok(Self {
            path,
            config: RwLock::new(config),
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keystroke bound to `note`, if any
    pub fn binding(&self, note: u8) -> Option<KeyStroke> {
        self.config.read().key_mapping.get(&note).copied()
    }

    /// Snapshot of all bindings, ordered by note number
    pub fn bindings(&self) -> BTreeMap<u8, KeyStroke> {
        self.config.read().key_mapping.clone()
    }

    /// Persisted device id (empty when unset)
    pub fn device(&self) -> String {
        self.config.read().midi_device.clone()
    }

    /// Bind `note` to `stroke`, replacing any previous binding
    pub fn set_binding(&self, note: u8, stroke: KeyStroke) -> Result<()> {
        self.mutate(|config| {
            config.key_mapping.insert(note, stroke);
            true
        })?;
        debug!(note, %stroke, "Binding set");
        Ok(())
    }

    /// Remove the binding for `note`
    ///
    /// Returns whether a binding existed. Nothing is written when it didn't.
    pub fn remove_binding(&self, note: u8) -> Result<bool> {
        let removed = self.mutate(|config| config.key_mapping.remove(&note).is_some())?;
        if removed {
            debug!(note, "Binding removed");
        }
        Ok(removed)
    }

    /// Record the selected MIDI device
    pub fn set_device(&self, device: &str) -> Result<()> {
        self.mutate(|config| {
            config.midi_device = device.to_string();
            true
        })?;
        debug!(device, "MIDI device saved");
        Ok(())
    }

    /// Apply `change` to a copy of the config; persist and publish it when
    /// `change` reports a modification
    fn mutate(&self, change: impl FnOnce(&mut BindingConfig) -> bool) -> Result<bool> {
        let _guard = self.write_lock.lock();

        let mut next = self.config.read().clone();
        if !change(&mut next) {
            return Ok(false);
        }

        write_config(&self.path, &next)?;
        *self.config.write() = next;
        Ok(true)
    }
}

/// Write the config through a temp file and rename it into place
fn write_config(path: &Path, config: &BindingConfig) -> Result<()> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let json = serde_json::to_string_pretty(config)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_creates_file_when_missing() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("Config").join("MidiBindingConfig.json");

        let store = BindingStore::load(&path).unwrap();

        assert!(path.exists());
        assert!(store.bindings().is_empty());
        assert_eq!(store.device(), "");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bindings.json");
        fs::write(&path, "{ not json").unwrap();

        let err = BindingStore::load(&path).err().unwrap();
        assert!(matches!(err, StoreError::Parse { .. }));

        // The corrupt file is left untouched
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_set_binding_persists_and_overwrites() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bindings.json");

        {
            let store = BindingStore::load(&path).unwrap();
            store.set_binding(60, KeyStroke::A).unwrap();
            store.set_binding(60, KeyStroke::Space).unwrap();
            store.set_binding(62, KeyStroke::F5).unwrap();
        }

        let store = BindingStore::load(&path).unwrap();
        assert_eq!(store.binding(60), Some(KeyStroke::Space));
        assert_eq!(store.binding(62), Some(KeyStroke::F5));
        assert_eq!(store.bindings().len(), 2);
    }

    #[test]
    fn test_remove_binding_twice() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bindings.json");
        let store = BindingStore::load(&path).unwrap();
        store.set_binding(48, KeyStroke::W).unwrap();

        assert!(store.remove_binding(48).unwrap());
        let modified = fs::metadata(&path).unwrap().modified().unwrap();
        let contents = fs::read_to_string(&path).unwrap();

        // Second removal reports nothing removed and leaves the file alone
        assert!(!store.remove_binding(48).unwrap());
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
        assert_eq!(store.binding(48), None);
    }

    #[test]
    fn test_remove_binding_persists() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bindings.json");
        {
            let store = BindingStore::load(&path).unwrap();
            store.set_binding(50, KeyStroke::Q).unwrap();
            store.remove_binding(50).unwrap();
        }

        let store = BindingStore::load(&path).unwrap();
        assert_eq!(store.binding(50), None);
    }

    #[test]
    fn test_device_persists() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bindings.json");
        {
            let store = BindingStore::load(&path).unwrap();
            store.set_device("Digital Piano").unwrap();
        }

        let store = BindingStore::load(&path).unwrap();
        assert_eq!(store.device(), "Digital Piano");
    }

    #[test]
    fn test_file_format() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bindings.json");
        let store = BindingStore::load(&path).unwrap();
        store.set_binding(60, KeyStroke::A).unwrap();
        store.set_device("Keys").unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["KeyMapping"]["60"], "A");
        assert_eq!(value["MidiDevice"], "Keys");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_accepts_camel_case_and_missing_fields() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bindings.json");
        fs::write(&path, r#"{"keyMapping": {"61": "Return"}}"#).unwrap();

        let store = BindingStore::load(&path).unwrap();
        assert_eq!(store.binding(61), Some(KeyStroke::Return));
        assert_eq!(store.device(), "");
    }

    #[test]
    fn test_failed_write_keeps_memory_in_sync() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("gone").join("bindings.json");
        let store = BindingStore::load(&path).unwrap();

        // Replace the parent directory with a plain file so writes fail
        fs::remove_dir_all(temp.path().join("gone")).unwrap();
        fs::write(temp.path().join("gone"), "").unwrap();

        assert!(store.set_binding(60, KeyStroke::A).is_err());
        assert_eq!(store.binding(60), None);
    }

    #[test]
    fn test_concurrent_writers() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bindings.json");
        let store = std::sync::Arc::new(BindingStore::load(&path).unwrap());

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || store.set_binding(i, KeyStroke::A).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let reloaded = BindingStore::load(&path).unwrap();
        assert_eq!(reloaded.bindings().len(), 8);
    }
}
