//! Startup device selection
//!
//! Restores the saved MIDI device when it is still connected, otherwise falls
//! back to the first device found. A successful choice is written back to the
//! binding store.

use crate::bindings::{BindingStore, StoreError};
use crate::transport::MidiTransport;
use tracing::{info, warn};

/// Outcome of the startup device selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceRestore {
    /// The saved device was present and selected
    Restored(String),
    /// The first enumerated device was selected
    FirstAvailable(String),
    /// No device could be selected
    NoDevice,
}

/// Select the saved device, or the first available one
pub fn restore_device<T: MidiTransport + ?Sized>(
    transport: &mut T,
    store: &BindingStore,
) -> Result<DeviceRestore, StoreError> {
    let devices = transport.list_devices();
    let saved = store.device();

    let mut outcome = DeviceRestore::NoDevice;

    if !saved.is_empty() && devices.contains(&saved) {
        if transport.select_device(&saved) {
            info!("MIDI device connected from settings: {}", saved);
            outcome = DeviceRestore::Restored(saved.clone());
        } else {
            warn!("Saved MIDI device {} could not be opened", saved);
        }
    }

    if outcome == DeviceRestore::NoDevice {
        if let Some(first) = devices.first() {
            if transport.select_device(first) {
                info!("MIDI device set to first device detected: {}", first);
                outcome = DeviceRestore::FirstAvailable(first.clone());
            }
        }
    }

    match &outcome {
        DeviceRestore::Restored(id) | DeviceRestore::FirstAvailable(id) => store.set_device(id)?,
        DeviceRestore::NoDevice => info!("No MIDI device detected"),
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use tempfile::tempdir;

    fn store_with_device(dir: &std::path::Path, device: &str) -> BindingStore {
        let store = BindingStore::load(dir.join("bindings.json")).unwrap();
        if !device.is_empty() {
            store.set_device(device).unwrap();
        }
        store
    }

    #[test]
    fn test_restores_saved_device() {
        let temp = tempdir().unwrap();
        let store = store_with_device(temp.path(), "Keys B");
        let mut transport = FakeTransport::new(&["Keys A", "Keys B"]);

        let outcome = restore_device(&mut transport, &store).unwrap();

        assert_eq!(outcome, DeviceRestore::Restored("Keys B".to_string()));
        assert_eq!(transport.selected(), vec!["Keys B".to_string()]);
        assert_eq!(store.device(), "Keys B");
    }

    #[test]
    fn test_missing_saved_device_falls_back_to_first() {
        let temp = tempdir().unwrap();
        let store = store_with_device(temp.path(), "Unplugged");
        let mut transport = FakeTransport::new(&["Keys A", "Keys B"]);

        let outcome = restore_device(&mut transport, &store).unwrap();

        assert_eq!(outcome, DeviceRestore::FirstAvailable("Keys A".to_string()));
        assert_eq!(store.device(), "Keys A");

        // The fallback is what a restart would restore
        let reloaded = BindingStore::load(store.path()).unwrap();
        assert_eq!(reloaded.device(), "Keys A");
    }

    #[test]
    fn test_no_saved_device_uses_first() {
        let temp = tempdir().unwrap();
        let store = store_with_device(temp.path(), "");
        let mut transport = FakeTransport::new(&["Only"]);

        let outcome = restore_device(&mut transport, &store).unwrap();

        assert_eq!(outcome, DeviceRestore::FirstAvailable("Only".to_string()));
    }

    #[test]
    fn test_no_devices() {
        let temp = tempdir().unwrap();
        let store = store_with_device(temp.path(), "Keys A");
        let mut transport = FakeTransport::new(&[]);

        let outcome = restore_device(&mut transport, &store).unwrap();

        assert_eq!(outcome, DeviceRestore::NoDevice);
        assert!(transport.selected().is_empty());
        // The saved choice survives until another device is picked
        assert_eq!(store.device(), "Keys A");
    }

    #[test]
    fn test_saved_device_failing_to_open_falls_back() {
        let temp = tempdir().unwrap();
        let store = store_with_device(temp.path(), "Broken");
        let mut transport = FakeTransport::new(&["Working", "Broken"]).failing_on("Broken");

        let outcome = restore_device(&mut transport, &store).unwrap();

        assert_eq!(outcome, DeviceRestore::FirstAvailable("Working".to_string()));
        assert_eq!(store.device(), "Working");
    }

    #[test]
    fn test_first_device_failing_to_open() {
        let temp = tempdir().unwrap();
        let store = store_with_device(temp.path(), "");
        let mut transport = FakeTransport::new(&["Broken"]).failing_on("Broken");

        let outcome = restore_device(&mut transport, &store).unwrap();

        assert_eq!(outcome, DeviceRestore::NoDevice);
        assert_eq!(store.device(), "");
    }
}
