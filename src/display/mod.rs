//! Piano display broadcast
//!
//! Every routed note is published to the `DisplayHub`, which fans it out to
//! websocket clients (browser overlays). Publishing never blocks: events go
//! into a `tokio::sync::broadcast` channel and are dropped when nobody
//! listens. Default port: 5000

mod server;

pub use server::{build_router, start_server};

use crate::midi::{NoteEvent, NoteKind};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeSet;
use tokio::sync::broadcast;
use tracing::trace;

/// Default display server port
pub const DEFAULT_DISPLAY_PORT: u16 = 5000;

/// Capacity of the broadcast channel before slow clients start lagging
const CHANNEL_CAPACITY: usize = 1024;

/// Event pushed to display clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum DisplayEvent {
    KeyDown {
        key: u8,
    },
    KeyUp {
        key: u8,
    },
    /// Batched form, sent once to each client on connect
    #[serde(rename_all = "camelCase")]
    KeyboardUpdate {
        key_changes: Vec<KeyChange>,
    },
}

/// One entry of a batched keyboard update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyChange {
    pub num: u8,
    pub on: bool,
}

impl From<NoteEvent> for DisplayEvent {
    fn from(event: NoteEvent) -> Self {
        match event.kind {
            NoteKind::On => DisplayEvent::KeyDown { key: event.note },
            NoteKind::Off => DisplayEvent::KeyUp { key: event.note },
        }
    }
}

/// Fan-out point for display events
pub struct DisplayHub {
    tx: broadcast::Sender<DisplayEvent>,
    /// Notes currently held, used to bring new clients up to date
    held: Mutex<BTreeSet<u8>>,
}

impl DisplayHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            held: Mutex::new(BTreeSet::new()),
        }
    }

    /// Publish an event to all connected clients (best-effort)
    pub fn publish(&self, event: DisplayEvent) {
        let mut held = self.held.lock();
        match &event {
            DisplayEvent::KeyDown { key } => {
                held.insert(*key);
            }
            DisplayEvent::KeyUp { key } => {
                held.remove(key);
            }
            DisplayEvent::KeyboardUpdate { key_changes } => {
                for change in key_changes {
                    if change.on {
                        held.insert(change.num);
                    } else {
                        held.remove(&change.num);
                    }
                }
            }
        }

        // Sending under the lock keeps snapshot + subscription consistent
        if self.tx.send(event).is_err() {
            trace!("No display clients connected");
        }
    }

    /// Subscribe to future events, together with a snapshot of held notes
    pub fn subscribe(&self) -> (DisplayEvent, broadcast::Receiver<DisplayEvent>) {
        let held = self.held.lock();
        let snapshot = DisplayEvent::KeyboardUpdate {
            key_changes: held.iter().map(|&num| KeyChange { num, on: true }).collect(),
        };
        (snapshot, self.tx.subscribe())
    }

    /// Notes currently held down
    pub fn held_notes(&self) -> Vec<u8> {
        self.held.lock().iter().copied().collect()
    }

    /// Number of connected clients
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for DisplayHub {
    fn default() -> Self {
        Self::new()
    }
}
