//! MIDI note events
//!
//! Only note-on and note-off matter to the router; every other channel or
//! system message is dropped at the transport boundary.

use std::fmt;

/// Direction of a note event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteKind {
    On,
    Off,
}

/// A key press or release on the MIDI keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteEvent {
    /// Note number (0-127)
    pub note: u8,
    pub kind: NoteKind,
}

impl NoteEvent {
    pub fn on(note: u8) -> Self {
        Self { note, kind: NoteKind::On }
    }

    pub fn off(note: u8) -> Self {
        Self { note, kind: NoteKind::Off }
    }

    /// Parse a note event from raw MIDI bytes
    ///
    /// Accepts any channel. Note On with velocity 0 is a Note Off.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&status, rest) = data.split_first()?;

        // Running status and system messages are not note events
        if status < 0x80 || status >= 0xF0 {
            return None;
        }

        if rest.len() < 2 {
            return None;
        }
        let note = rest[0] & 0x7F;
        let velocity = rest[1] & 0x7F;

        match status & 0xF0 {
            0x80 => Some(Self::off(note)),
            0x90 if velocity == 0 => Some(Self::off(note)),
            0x90 => Some(Self::on(note)),
            _ => None,
        }
    }
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoteKind::On => write!(f, "NoteOn n:{}", self.note),
            NoteKind::Off => write!(f, "NoteOff n:{}", self.note),
        }
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
