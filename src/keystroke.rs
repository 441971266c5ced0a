//! Injectable keystrokes and the console key lookup table
//!
//! `KeyStroke` is the closed set of keys a MIDI note can be bound to.
//! `translate_console_key` maps a terminal key press onto that set;
//! keys without a mapping translate to `None` and can never be bound.

use crossterm::event::{KeyCode, KeyEvent, KeyEventState, ModifierKeyCode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A key the injection backend can press and release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyStroke {
    Backspace,
    Tab,
    Return,
    Escape,
    Space,
    PageUp,
    PageDown,
    End,
    Home,
    LeftArrow,
    UpArrow,
    RightArrow,
    DownArrow,
    Insert,
    Delete,

    // Top-row digits
    D0,
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    D8,
    D9,

    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    Numpad0,
    Numpad1,
    Numpad2,
    Numpad3,
    Numpad4,
    Numpad5,
    Numpad6,
    Numpad7,
    Numpad8,
    Numpad9,
    Multiply,
    Add,
    Minus,
    Period,
    Slash,
    Comma,

    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,

    LeftWin,
    RightWin,
    Apps,
}

impl fmt::Display for KeyStroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

const DIGITS: [KeyStroke; 10] = [
    KeyStroke::D0,
    KeyStroke::D1,
    KeyStroke::D2,
    KeyStroke::D3,
    KeyStroke::D4,
    KeyStroke::D5,
    KeyStroke::D6,
    KeyStroke::D7,
    KeyStroke::D8,
    KeyStroke::D9,
];

const NUMPAD: [KeyStroke; 10] = [
    KeyStroke::Numpad0,
    KeyStroke::Numpad1,
    KeyStroke::Numpad2,
    KeyStroke::Numpad3,
    KeyStroke::Numpad4,
    KeyStroke::Numpad5,
    KeyStroke::Numpad6,
    KeyStroke::Numpad7,
    KeyStroke::Numpad8,
    KeyStroke::Numpad9,
];

const LETTERS: [KeyStroke; 26] = [
    KeyStroke::A,
    KeyStroke::B,
    KeyStroke::C,
    KeyStroke::D,
    KeyStroke::E,
    KeyStroke::F,
    KeyStroke::G,
    KeyStroke::H,
    KeyStroke::I,
    KeyStroke::J,
    KeyStroke::K,
    KeyStroke::L,
    KeyStroke::M,
    KeyStroke::N,
    KeyStroke::O,
    KeyStroke::P,
    KeyStroke::Q,
    KeyStroke::R,
    KeyStroke::S,
    KeyStroke::T,
    KeyStroke::U,
    KeyStroke::V,
    KeyStroke::W,
    KeyStroke::X,
    KeyStroke::Y,
    KeyStroke::Z,
];

const FUNCTION_KEYS: [KeyStroke; 15] = [
    KeyStroke::F1,
    KeyStroke::F2,
    KeyStroke::F3,
    KeyStroke::F4,
    KeyStroke::F5,
    KeyStroke::F6,
    KeyStroke::F7,
    KeyStroke::F8,
    KeyStroke::F9,
    KeyStroke::F10,
    KeyStroke::F11,
    KeyStroke::F12,
    KeyStroke::F13,
    KeyStroke::F14,
    KeyStroke::F15,
];

/// Translate a console key press into an injectable keystroke
///
/// Returns `None` for keys outside the supported set (media keys, F16+,
/// lock keys, punctuation without a counterpart, ...).
pub fn translate_console_key(event: &KeyEvent) -> Option<KeyStroke> {
    let keypad = event.state.contains(KeyEventState::KEYPAD);

    match event.code {
        KeyCode::Backspace => Some(KeyStroke::Backspace),
        KeyCode::Tab => Some(KeyStroke::Tab),
        KeyCode::Enter => Some(KeyStroke::Return),
        KeyCode::Esc => Some(KeyStroke::Escape),
        KeyCode::PageUp => Some(KeyStroke::PageUp),
        KeyCode::PageDown => Some(KeyStroke::PageDown),
        KeyCode::End => Some(KeyStroke::End),
        KeyCode::Home => Some(KeyStroke::Home),
        KeyCode::Left => Some(KeyStroke::LeftArrow),
        KeyCode::Up => Some(KeyStroke::UpArrow),
        KeyCode::Right => Some(KeyStroke::RightArrow),
        KeyCode::Down => Some(KeyStroke::DownArrow),
        KeyCode::Insert => Some(KeyStroke::Insert),
        KeyCode::Delete => Some(KeyStroke::Delete),
        KeyCode::Menu => Some(KeyStroke::Apps),
        KeyCode::F(n @ 1..=15) => Some(FUNCTION_KEYS[usize::from(n - 1)]),
        KeyCode::Modifier(ModifierKeyCode::LeftSuper) => Some(KeyStroke::LeftWin),
        KeyCode::Modifier(ModifierKeyCode::RightSuper) => Some(KeyStroke::RightWin),
        KeyCode::Char(c) => translate_char(c, keypad),
        _ => None,
    }
}

fn translate_char(c: char, keypad: bool) -> Option<KeyStroke> {
    if let Some(digit) = c.to_digit(10) {
        let table = if keypad { &NUMPAD } else { &DIGITS };
        return Some(table[digit as usize]);
    }

    if c.is_ascii_alphabetic() {
        let index = (c.to_ascii_lowercase() as u8 - b'a') as usize;
        return Some(LETTERS[index]);
    }

    match c {
        ' ' => Some(KeyStroke::Space),
        '*' => Some(KeyStroke::Multiply),
        // The '=' key carries '+' on US layouts
        '+' | '=' => Some(KeyStroke::Add),
        '-' => Some(KeyStroke::Minus),
        '.' => Some(KeyStroke::Period),
        '/' => Some(KeyStroke::Slash),
        ',' => Some(KeyStroke::Comma),
        _ => None,
    }
}
