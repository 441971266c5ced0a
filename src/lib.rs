//! KezBoard - play keyboard shortcuts from a MIDI keyboard
//!
//! MIDI notes are routed either to their bound keystrokes or, while the
//! console editor is active, to the editor. Every note is also published to
//! the piano display overlay.

pub mod bindings;
pub mod console;
pub mod devices;
pub mod display;
pub mod inject;
pub mod keystroke;
pub mod midi;
pub mod paths;
pub mod router;
pub mod transport;

#[cfg(test)]
mod testing;
