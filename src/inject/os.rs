//! OS-level keystroke injection using rdev

use super::{InjectError, KeyInjector};
use crate::keystroke::KeyStroke;
use rdev::{simulate, EventType, Key};
use tracing::trace;

/// Injects keystrokes into whichever window has focus
pub struct RdevInjector;

impl RdevInjector {
    pub fn new() -> Self {
        Self
    }

    fn send(&self, stroke: KeyStroke, pressed: bool) -> Result<(), InjectError> {
        let key = to_rdev_key(stroke).ok_or(InjectError::Unsupported(stroke))?;
        let event = if pressed {
            EventType::KeyPress(key)
        } else {
            EventType::KeyRelease(key)
        };

        trace!(?event, "Simulating key event");
        simulate(&event).map_err(|e| InjectError::Backend {
            stroke,
            direction: if pressed { "down" } else { "up" },
            reason: format!("{:?}", e),
        })
    }
}

impl Default for RdevInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyInjector for RdevInjector {
    fn name(&self) -> &str {
        "rdev"
    }

    fn key_down(&self, stroke: KeyStroke) -> Result<(), InjectError> {
        self.send(stroke, true)
    }

    fn key_up(&self, stroke: KeyStroke) -> Result<(), InjectError> {
        self.send(stroke, false)
    }
}

/// Map a keystroke onto rdev's key set
///
/// rdev has no names for F13-F15 and the context-menu key, so those go
/// through `Key::Unknown` with the platform's native key code.
pub fn to_rdev_key(stroke: KeyStroke) -> Option<Key> {
    use KeyStroke as S;

    let key = match stroke {
        S::Backspace => Key::Backspace,
        S::Tab => Key::Tab,
        S::Return => Key::Return,
        S::Escape => Key::Escape,
        S::Space => Key::Space,
        S::PageUp => Key::PageUp,
        S::PageDown => Key::PageDown,
        S::End => Key::End,
        S::Home => Key::Home,
        S::LeftArrow => Key::LeftArrow,
        S::UpArrow => Key::UpArrow,
        S::RightArrow => Key::RightArrow,
        S::DownArrow => Key::DownArrow,
        S::Insert => Key::Insert,
        S::Delete => Key::Delete,

        S::D0 => Key::Num0,
        S::D1 => Key::Num1,
        S::D2 => Key::Num2,
        S::D3 => Key::Num3,
        S::D4 => Key::Num4,
        S::D5 => Key::Num5,
        S::D6 => Key::Num6,
        S::D7 => Key::Num7,
        S::D8 => Key::Num8,
        S::D9 => Key::Num9,

        S::A => Key::KeyA,
        S::B => Key::KeyB,
        S::C => Key::KeyC,
        S::D => Key::KeyD,
        S::E => Key::KeyE,
        S::F => Key::KeyF,
        S::G => Key::KeyG,
        S::H => Key::KeyH,
        S::I => Key::KeyI,
        S::J => Key::KeyJ,
        S::K => Key::KeyK,
        S::L => Key::KeyL,
        S::M => Key::KeyM,
        S::N => Key::KeyN,
        S::O => Key::KeyO,
        S::P => Key::KeyP,
        S::Q => Key::KeyQ,
        S::R => Key::KeyR,
        S::S => Key::KeyS,
        S::T => Key::KeyT,
        S::U => Key::KeyU,
        S::V => Key::KeyV,
        S::W => Key::KeyW,
        S::X => Key::KeyX,
        S::Y => Key::KeyY,
        S::Z => Key::KeyZ,

        S::Numpad0 => Key::Kp0,
        S::Numpad1 => Key::Kp1,
        S::Numpad2 => Key::Kp2,
        S::Numpad3 => Key::Kp3,
        S::Numpad4 => Key::Kp4,
        S::Numpad5 => Key::Kp5,
        S::Numpad6 => Key::Kp6,
        S::Numpad7 => Key::Kp7,
        S::Numpad8 => Key::Kp8,
        S::Numpad9 => Key::Kp9,
        S::Multiply => Key::KpMultiply,
        S::Add => Key::KpPlus,
        S::Minus => Key::Minus,
        S::Period => Key::Dot,
        S::Slash => Key::Slash,
        S::Comma => Key::Comma,

        S::F1 => Key::F1,
        S::F2 => Key::F2,
        S::F3 => Key::F3,
        S::F4 => Key::F4,
        S::F5 => Key::F5,
        S::F6 => Key::F6,
        S::F7 => Key::F7,
        S::F8 => Key::F8,
        S::F9 => Key::F9,
        S::F10 => Key::F10,
        S::F11 => Key::F11,
        S::F12 => Key::F12,

        S::LeftWin => Key::MetaLeft,
        S::RightWin => Key::MetaRight,

        S::F13 | S::F14 | S::F15 | S::Apps => return native_key(stroke).map(Key::Unknown),
    };

    Some(key)
}

#[cfg(target_os = "windows")]
fn native_key(stroke: KeyStroke) -> Option<u32> {
    // Virtual-key codes
    match stroke {
        KeyStroke::F13 => Some(0x7C),
        KeyStroke::F14 => Some(0x7D),
        KeyStroke::F15 => Some(0x7E),
        KeyStroke::Apps => Some(0x5D),
        _ => None,
    }
}

#[cfg(target_os = "linux")]
fn native_key(stroke: KeyStroke) -> Option<u32> {
    // X11 keycodes (evdev + 8)
    match stroke {
        KeyStroke::F13 => Some(191),
        KeyStroke::F14 => Some(192),
        KeyStroke::F15 => Some(193),
        KeyStroke::Apps => Some(135),
        _ => None,
    }
}

#[cfg(target_os = "macos")]
fn native_key(stroke: KeyStroke) -> Option<u32> {
    // kVK_* codes; macOS keyboards have no context-menu key
    match stroke {
        KeyStroke::F13 => Some(0x69),
        KeyStroke::F14 => Some(0x6B),
        KeyStroke::F15 => Some(0x71),
        _ => None,
    }
}

#[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
fn native_key(_stroke: KeyStroke) -> Option<u32> {
    None
}
