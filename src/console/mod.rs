//! Console editor - interactive binding and device configuration
//!
//! The editor is a five-state machine driven by single console key presses.
//! While any editing state is active it is attached to the event router as
//! the note listener, so MIDI keys are captured instead of triggering their
//! bindings:
//!
//! ```text
//! Playing --A--> DeviceSelection --digit/Esc--> Playing
//! Playing --S--> EditingModeSelection --Esc--> Playing
//!                EditingModeSelection --A--> EditingAddBinding
//!                EditingModeSelection --S--> EditingRemoveBinding
//! ```
//!
//! Adding and removing return to `EditingModeSelection` once committed or
//! aborted with Escape.

pub mod input;
mod output;


pub use output::{ConsoleOutput, TerminalOutput};

use crate::bindings::{BindingStore, StoreError};
use crate::devices::{restore_device, DeviceRestore};
use crate::inject::InjectError;
use crate::keystroke::translate_console_key;
use crate::midi::{NoteEvent, NoteKind};
use crate::router::{CaptureHandle, EventRouter};
use crate::transport::MidiTransport;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Editor state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    /// Notes trigger their bindings
    Playing,
    /// Choosing a MIDI device from the list shown on entry
    DeviceSelection { devices: Vec<String> },
    /// Choosing between adding and removing a binding
    EditingModeSelection,
    /// Waiting for a MIDI key, then for the keyboard key to bind it to
    EditingAddBinding { pending: Option<u8> },
    /// Waiting for the MIDI key to unbind
    EditingRemoveBinding,
}

impl EditorState {
    /// Whether the editor captures notes in this state
    pub fn is_editing(&self) -> bool {
        matches!(
            self,
            EditorState::EditingModeSelection
                | EditorState::EditingAddBinding { .. }
                | EditorState::EditingRemoveBinding
        )
    }
}

/// Interactive console editor
pub struct ConsoleEditor<T: MidiTransport> {
    state: EditorState,
    store: Arc<BindingStore>,
    router: Arc<EventRouter>,
    transport: T,
    /// Handle given to the router while editing
    capture: CaptureHandle,
    /// Notes the router handed over while editing
    capture_rx: mpsc::UnboundedReceiver<NoteEvent>,
    output: Box<dyn ConsoleOutput>,
}

impl<T: MidiTransport> ConsoleEditor<T> {
    pub fn new(
        store: Arc<BindingStore>,
        router: Arc<EventRouter>,
        transport: T,
        output: Box<dyn ConsoleOutput>,
    ) -> Self {
        let (capture, capture_rx) = CaptureHandle::channel();
        Self {
            state: EditorState::Playing,
            store,
            router,
            transport,
            capture,
            capture_rx,
            output,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// MIDI note waiting for a keyboard key in the add flow
    pub fn pending_note(&self) -> Option<u8> {
        match self.state {
            EditorState::EditingAddBinding { pending } => pending,
            _ => None,
        }
    }

    /// Restore the MIDI device and print the playing instructions
    pub fn start(&mut self) -> Result<DeviceRestore, StoreError> {
        let outcome = restore_device(&mut self.transport, &self.store)?;

        match &outcome {
            DeviceRestore::Restored(id) => {
                self.say(&format!("Midi Device connected from settings: {}", id))
            }
            DeviceRestore::FirstAvailable(id) => {
                self.say(&format!("Midi Device set to first device detected: {}", id))
            }
            DeviceRestore::NoDevice => self.say("No Midi Device detected"),
        }

        self.print_instructions();
        Ok(outcome)
    }

    /// Handle a console key press
    pub fn handle_key(&mut self, key: &KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match self.state {
            EditorState::Playing => self.handle_playing_key(key),
            EditorState::DeviceSelection { .. } => self.handle_device_selection_key(key),
            EditorState::EditingModeSelection => self.handle_mode_selection_key(key),
            EditorState::EditingAddBinding { .. } => self.handle_add_binding_key(key),
            EditorState::EditingRemoveBinding => self.handle_remove_binding_key(key),
        }
    }

    /// Route a MIDI note, then handle anything the editor captured from it
    ///
    /// Captured notes are processed before this returns, so a console key
    /// read afterwards sees the state the note produced.
    pub fn route_note(&mut self, event: NoteEvent) -> Result<(), InjectError> {
        let result = self.router.on_note(event);
        while let Ok(captured) = self.capture_rx.try_recv() {
            self.handle_note(captured);
        }
        result
    }

    /// Handle a note captured through the router
    fn handle_note(&mut self, event: NoteEvent) {
        match event.kind {
            NoteKind::On => self.handle_note_down(event.note),
            // Releases carry no meaning for the editor
            NoteKind::Off => {}
        }
    }

    fn handle_playing_key(&mut self, key: &KeyEvent) {
        if is_char(key, 'a') {
            let devices = self.transport.list_devices();
            self.state = EditorState::DeviceSelection { devices };
            self.say("Switched to DEVICE SELECTION mode.\n");
            self.print_instructions();
        } else if is_char(key, 's') {
            self.router.attach_listener(self.capture.clone());
            self.state = EditorState::EditingModeSelection;
            self.say("Switched to EDITING mode.\n");
            self.print_instructions();
        }
    }

    fn handle_device_selection_key(&mut self, key: &KeyEvent) {
        let EditorState::DeviceSelection { devices } = &self.state else {
            return;
        };

        if key.code == KeyCode::Esc {
            self.return_to_playing();
            return;
        }

        let Some(index) = device_index(key) else {
            return;
        };
        // Out-of-range digits are ignored
        let Some(device) = devices.get(index).cloned() else {
            debug!(index, "Device index out of range");
            return;
        };

        if let Err(e) = self.store.set_device(&device) {
            self.report_store_error(&e);
        }
        if self.transport.select_device(&device) {
            info!("MIDI device changed to {}", device);
        } else {
            self.say(&format!("Failed to open Midi Device {}.", device));
        }

        self.return_to_playing();
    }

    fn handle_mode_selection_key(&mut self, key: &KeyEvent) {
        if key.code == KeyCode::Esc {
            self.return_to_playing();
        } else if is_char(key, 'a') {
            self.state = EditorState::EditingAddBinding { pending: None };
            self.print_instructions();
        } else if is_char(key, 's') {
            self.state = EditorState::EditingRemoveBinding;
            self.print_instructions();
        }
    }

    fn handle_add_binding_key(&mut self, key: &KeyEvent) {
        let Some(note) = self.pending_note() else {
            if key.code == KeyCode::Esc {
                self.say("Aborting AddBinding.");
                self.enter_mode_selection();
            } else {
                self.say("Press a Midi Key first, or ESCAPE to abort.");
            }
            return;
        };

        let Some(stroke) = translate_console_key(key) else {
            self.say(&format!("Key {} is not supported. Press another key.", describe_key(key)));
            return;
        };

        if let Err(e) = self.store.set_binding(note, stroke) {
            self.report_store_error(&e);
            return;
        }

        self.say(&format!("Bound {} to Midi Key {}.", stroke, note));
        self.enter_mode_selection();
    }

    fn handle_remove_binding_key(&mut self, key: &KeyEvent) {
        if key.code == KeyCode::Esc {
            self.say("Aborting RemoveBinding.");
            self.enter_mode_selection();
        }
    }

    fn handle_note_down(&mut self, note: u8) {
        match self.state {
            EditorState::EditingAddBinding { pending: Some(selected) } => {
                if selected != note {
                    self.say(&format!(
                        "Key {} received but Key {} has already been selected.",
                        note, selected
                    ));
                }
            }
            EditorState::EditingAddBinding { pending: None } => {
                self.state = EditorState::EditingAddBinding { pending: Some(note) };
                self.say(&format!("Key {} selected.", note));
            }
            EditorState::EditingRemoveBinding => match self.store.remove_binding(note) {
                Ok(true) => {
                    self.say(&format!("Key {} unbound.", note));
                    self.enter_mode_selection();
                }
                // Unbound keys are ignored
                Ok(false) => {}
                Err(e) => self.report_store_error(&e),
            },
            _ => {}
        }
    }

    fn enter_mode_selection(&mut self) {
        self.state = EditorState::EditingModeSelection;
        self.print_instructions();
    }

    fn return_to_playing(&mut self) {
        if self.state.is_editing() {
            self.router.detach_listener();
        }
        self.state = EditorState::Playing;
        self.say("Switched to PLAYING mode.\n");
        self.print_instructions();
    }

    fn print_instructions(&mut self) {
        match &self.state {
            EditorState::EditingModeSelection => {
                self.say(
                    "\n********* EDIT ***********\n\
                     Press ESCAPE to end binding editing and enable playing.\n\
                     Press A to Add/Edit a binding.\n\
                     Press S to Remove a binding.",
                );

                let bindings = self.store.bindings();
                if bindings.is_empty() {
                    self.say("Current Bindings: NONE");
                } else {
                    let lines = bindings
                        .iter()
                        .map(|(note, stroke)| format!("  Key {} -> {}", note, stroke))
                        .collect::<Vec<_>>()
                        .join("\n");
                    self.say(&format!("Current Bindings:\n{}", lines));
                }
            }

            EditorState::EditingAddBinding { .. } => self.say(
                "\n********* ADD ***********\n\
                 Press the Midi key to bind, then the keyboard key to bind it to.",
            ),

            EditorState::EditingRemoveBinding => self.say(
                "\n********* REMOVE ***********\n\
                 Press the Midi key to unbind.",
            ),

            EditorState::Playing => self.say(
                "\n********* PLAY ***********\n\
                 Press CTRL-Q to save and quit\n\
                 Press A to Change the current Midi Device.\n\
                 Press S to Edit current bindings.",
            ),

            EditorState::DeviceSelection { devices } => {
                let listing = if devices.is_empty() {
                    "Midi Devices: None Detected".to_string()
                } else {
                    let lines = devices
                        .iter()
                        .enumerate()
                        .map(|(i, name)| format!("  {}) {}", i + 1, name))
                        .collect::<Vec<_>>()
                        .join("\n");
                    format!("Midi Devices:\n{}", lines)
                };

                self.say(
                    "\n********* SET DEVICE ***********\n\
                     Press ESCAPE to Abort device selection.\n\
                     Press the NUMBER corresponding to a midi device below to select that device.",
                );
                self.say(&listing);
            }
        }
    }

    fn report_store_error(&mut self, e: &StoreError) {
        error!("Failed to save bindings: {}", e);
        self.say(&format!("Failed to save bindings: {}", e));
    }

    fn say(&mut self, text: &str) {
        self.output.message(text);
    }
}

fn is_char(key: &KeyEvent, c: char) -> bool {
    matches!(key.code, KeyCode::Char(k) if k.eq_ignore_ascii_case(&c))
}

/// Zero-based device index for digit keys 1-9
fn device_index(key: &KeyEvent) -> Option<usize> {
    match key.code {
        KeyCode::Char(c @ '1'..='9') => c.to_digit(10).map(|d| d as usize - 1),
        _ => None,
    }
}

fn describe_key(key: &KeyEvent) -> String {
    match key.code {
        KeyCode::Char(c) => c.to_string(),
        code => format!("{:?}", code),
    }
}
