//! Test doubles shared by unit tests

use crate::console::ConsoleOutput;
use crate::inject::{InjectError, KeyInjector};
use crate::keystroke::KeyStroke;
use crate::transport::MidiTransport;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A call recorded by `RecordingInjector`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injected {
    Down(KeyStroke),
    Up(KeyStroke),
}

/// Injector that records calls and can be told to fail
#[derive(Default)]
pub struct RecordingInjector {
    calls: Mutex<Vec<Injected>>,
    fail_next: AtomicBool,
}

impl RecordingInjector {
    pub fn calls(&self) -> Vec<Injected> {
        self.calls.lock().clone()
    }

    /// Make the next call fail without being recorded
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn record(
        &self,
        call: Injected,
        stroke: KeyStroke,
        direction: &'static str,
    ) -> Result<(), InjectError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(InjectError::Backend {
                stroke,
                direction,
                reason: "injected failure".to_string(),
            });
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

impl KeyInjector for RecordingInjector {
    fn name(&self) -> &str {
        "recording"
    }

    fn key_down(&self, stroke: KeyStroke) -> Result<(), InjectError> {
        self.record(Injected::Down(stroke), stroke, "down")
    }

    fn key_up(&self, stroke: KeyStroke) -> Result<(), InjectError> {
        self.record(Injected::Up(stroke), stroke, "up")
    }
}

/// Transport with a scripted device list
#[derive(Default)]
pub struct FakeTransport {
    devices: Arc<Mutex<Vec<String>>>,
    selected: Arc<Mutex<Vec<String>>>,
    failing: Vec<String>,
}

impl FakeTransport {
    pub fn new(devices: &[&str]) -> Self {
        Self {
            devices: Arc::new(Mutex::new(devices.iter().map(|d| d.to_string()).collect())),
            ..Default::default()
        }
    }

    /// Make selecting `device` fail
    pub fn failing_on(mut self, device: &str) -> Self {
        self.failing.push(device.to_string());
        self
    }

    /// Handle for changing the device list after the transport is moved
    pub fn devices_handle(&self) -> Arc<Mutex<Vec<String>>> {
        self.devices.clone()
    }

    /// Handle for inspecting selections after the transport is moved
    pub fn selected_handle(&self) -> Arc<Mutex<Vec<String>>> {
        self.selected.clone()
    }

    /// Devices successfully selected, in order
    pub fn selected(&self) -> Vec<String> {
        self.selected.lock().clone()
    }
}

impl MidiTransport for FakeTransport {
    fn list_devices(&self) -> Vec<String> {
        self.devices.lock().clone()
    }

    fn select_device(&mut self, id: &str) -> bool {
        let present = self.devices.lock().iter().any(|d| d == id);
        if !present || self.failing.iter().any(|d| d == id) {
            return false;
        }
        self.selected.lock().push(id.to_string());
        true
    }
}

/// Console output that keeps every message
#[derive(Clone, Default)]
pub struct RecordingOutput {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingOutput {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.messages.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().iter().any(|m| m.contains(needle))
    }
}

impl ConsoleOutput for RecordingOutput {
    fn message(&mut self, text: &str) {
        self.messages.lock().push(text.to_string());
    }
}
