//! MIDI input transport
//!
//! Enumerates MIDI input devices and delivers note events from the selected
//! one into a tokio channel.

use anyhow::{Context, Result};
use midir::{MidiInput, MidiInputConnection, MidiInputPort};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::midi::{format_hex, NoteEvent};

/// Client name registered with the MIDI backend
const CLIENT_NAME: &str = "KezBoard";

/// Capacity of the note event channel
pub const NOTE_CHANNEL_CAPACITY: usize = 1000;

/// Device enumeration and selection
pub trait MidiTransport {
    /// Names of the currently available input devices
    fn list_devices(&self) -> Vec<String>;

    /// Switch input to the device named `id`
    ///
    /// Returns false when the device is missing or cannot be opened.
    fn select_device(&mut self, id: &str) -> bool;
}

/// midir-backed transport
pub struct MidirTransport {
    /// Active input connection
    input_conn: Option<MidiInputConnection<()>>,
    /// Name of the connected device
    current: Option<String>,
    /// Sender for parsed note events
    note_tx: mpsc::Sender<NoteEvent>,
}

impl MidirTransport {
    /// Create a transport and the receiver its note events arrive on
    pub fn new() -> (Self, mpsc::Receiver<NoteEvent>) {
        let (note_tx, note_rx) = mpsc::channel(NOTE_CHANNEL_CAPACITY);
        let transport = Self {
            input_conn: None,
            current: None,
            note_tx,
        };
        (transport, note_rx)
    }

    /// List available MIDI input ports
    pub fn list_input_ports() -> Result<Vec<String>> {
        let midi_in = MidiInput::new("KezBoard-Scanner")?;

        let mut port_names = Vec::new();
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                port_names.push(name);
            }
        }

        Ok(port_names)
    }

    /// Find an input port by exact name
    fn find_input_port(midi_in: &MidiInput, name: &str) -> Option<MidiInputPort> {
        midi_in
            .ports()
            .into_iter()
            .find(|port| midi_in.port_name(port).map(|n| n == name).unwrap_or(false))
    }

    fn connect(&mut self, name: &str) -> Result<()> {
        self.disconnect();

        let midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI input")?;
        let port = Self::find_input_port(&midi_in, name)
            .ok_or_else(|| anyhow::anyhow!("Input port '{}' not found", name))?;

        let note_tx = self.note_tx.clone();
        let conn = midi_in
            .connect(
                &port,
                CLIENT_NAME,
                move |_timestamp, data, _| match NoteEvent::parse(data) {
                    Some(event) => {
                        // Never block the MIDI thread
                        if let Err(e) = note_tx.try_send(event) {
                            warn!("Dropping {}: {}", event, e);
                        }
                    }
                    None => debug!("Ignoring MIDI: {}", format_hex(data)),
                },
                (),
            )
            .map_err(|e| anyhow::anyhow!("Failed to connect to input port '{}': {}", name, e))?;

        self.input_conn = Some(conn);
        self.current = Some(name.to_string());
        info!("Connected to MIDI input: {}", name);
        Ok(())
    }

    /// Close the active connection
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.input_conn.take() {
            let _ = conn.close();
            if let Some(name) = self.current.take() {
                info!("Disconnected from MIDI input: {}", name);
            }
        }
    }
}

impl MidiTransport for MidirTransport {
    fn list_devices(&self) -> Vec<String> {
        match Self::list_input_ports() {
            Ok(ports) => ports,
            Err(e) => {
                warn!("Failed to enumerate MIDI inputs: {}", e);
                Vec::new()
            }
        }
    }

    fn select_device(&mut self, id: &str) -> bool {
        match self.connect(id) {
            Ok(()) => true,
            Err(e) => {
                warn!("{:#}", e);
                false
            }
        }
    }
}

impl Drop for MidirTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Print MIDI input devices for `--list-devices`
pub fn list_devices_formatted() {
    use colored::*;

    println!("\n{}", "=== Available MIDI Input Devices ===".bold().cyan());

    match MidirTransport::list_input_ports() {
        Ok(inputs) if inputs.is_empty() => {
            println!("  {}", "No input devices found".dimmed());
        }
        Ok(inputs) => {
            for (i, name) in inputs.iter().enumerate() {
                println!("  {} {}", format!("{})", i + 1).yellow(), name);
            }
        }
        Err(e) => {
            println!("  {} {}", "Failed to enumerate devices:".red(), e);
        }
    }

    println!();
}
