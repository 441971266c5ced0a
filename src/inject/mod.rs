//! Keystroke injection backends
//!
//! The router drives a `KeyInjector` for every bound note. Two backends exist:
//! `RdevInjector` synthesizes OS-level key events, `ConsoleInjector` only logs
//! them (dry-run mode and tests without a desktop session).

use crate::keystroke::KeyStroke;
use thiserror::Error;

pub mod console;
pub mod os;

pub use console::ConsoleInjector;
pub use os::RdevInjector;

/// Errors raised by an injection backend
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("failed to simulate {stroke} {direction}: {reason}")]
    Backend {
        stroke: KeyStroke,
        direction: &'static str,
        reason: String,
    },

    #[error("{0} cannot be injected on this platform")]
    Unsupported(KeyStroke),
}

/// Keystroke backend
///
/// Methods take `&self`; backends use interior mutability for any state.
pub trait KeyInjector: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Press `stroke`
    fn key_down(&self, stroke: KeyStroke) -> Result<(), InjectError>;

    /// Release `stroke`
    fn key_up(&self, stroke: KeyStroke) -> Result<(), InjectError>;
}
