//! Event router - decides where each MIDI note event goes
//!
//! A note is either captured by the console editor (while it is attached) or
//! looked up in the binding store and turned into a keystroke. Either way the
//! raw note is published to the piano display afterwards.
//!
//! Routing is synchronous per event, so a note-on is always handled and
//! broadcast before the note-off that follows it on the transport.


use crate::bindings::BindingStore;
use crate::display::{DisplayEvent, DisplayHub};
use crate::inject::{InjectError, KeyInjector};
use crate::midi::{NoteEvent, NoteKind};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Handle through which the router hands captured notes to the editor
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    tx: mpsc::UnboundedSender<NoteEvent>,
}

impl CaptureHandle {
    /// Create a handle and the receiver the editor drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NoteEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: NoteEvent) {
        if self.tx.send(event).is_err() {
            debug!("Editor capture receiver dropped, note {} discarded", event.note);
        }
    }
}

/// Current consumer of note events
#[derive(Debug, Clone, Default)]
pub enum RouteTarget {
    /// Fire the keystroke bound to the note
    #[default]
    Bindings,
    /// Hand the note to the console editor
    Editor(CaptureHandle),
}

/// Routes MIDI note events to the editor or the keystroke backend
pub struct EventRouter {
    store: Arc<BindingStore>,
    injector: Arc<dyn KeyInjector>,
    display: Arc<DisplayHub>,
    target: RwLock<RouteTarget>,
}

impl EventRouter {
    pub fn new(
        store: Arc<BindingStore>,
        injector: Arc<dyn KeyInjector>,
        display: Arc<DisplayHub>,
    ) -> Self {
        Self {
            store,
            injector,
            display,
            target: RwLock::new(RouteTarget::Bindings),
        }
    }

    /// Redirect notes to `handle`, replacing any listener already attached
    pub fn attach_listener(&self, handle: CaptureHandle) {
        *self.target.write() = RouteTarget::Editor(handle);
        debug!("Editor listener attached");
    }

    /// Restore binding-based routing
    pub fn detach_listener(&self) {
        *self.target.write() = RouteTarget::Bindings;
        debug!("Editor listener detached");
    }

    /// Whether notes are currently captured by the editor
    pub fn has_listener(&self) -> bool {
        matches!(*self.target.read(), RouteTarget::Editor(_))
    }

    pub fn on_note_on(&self, note: u8) -> Result<(), InjectError> {
        self.on_note(NoteEvent::on(note))
    }

    pub fn on_note_off(&self, note: u8) -> Result<(), InjectError> {
        self.on_note(NoteEvent::off(note))
    }

    /// Route a single note event
    ///
    /// The display broadcast happens even when the injector fails; the
    /// injector error is returned afterwards for the caller to report.
    pub fn on_note(&self, event: NoteEvent) -> Result<(), InjectError> {
        trace!("Routing {}", event);

        let target = self.target.read().clone();
        let result = match target {
            RouteTarget::Editor(handle) => {
                handle.forward(event);
                Ok(())
            }
            RouteTarget::Bindings => self.trigger_binding(event),
        };

        self.display.publish(DisplayEvent::from(event));
        result
    }

    fn trigger_binding(&self, event: NoteEvent) -> Result<(), InjectError> {
        let Some(stroke) = self.store.binding(event.note) else {
            return Ok(());
        };

        debug!(note = event.note, %stroke, kind = ?event.kind, "Binding triggered");
        match event.kind {
            NoteKind::On => self.injector.key_down(stroke),
            NoteKind::Off => self.injector.key_up(stroke),
        }
    }
}
