//! Console key input
//!
//! Keys are read on a dedicated thread (crossterm polling is blocking) and
//! forwarded to the event loop over a tokio channel.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// How often the reader thread checks for shutdown
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Keeps the terminal in raw mode until dropped
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = crossterm::terminal::disable_raw_mode() {
            warn!("Failed to restore terminal: {}", e);
        }
    }
}

/// Background reader forwarding key presses
pub struct KeyReader {
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl KeyReader {
    /// Start reading keys; presses arrive on the returned receiver
    pub fn spawn() -> (Self, mpsc::UnboundedReceiver<KeyEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let thread = thread::Builder::new()
            .name("console-keys".to_string())
            .spawn(move || run_reader(tx, shutdown_clone))
            .map_err(|e| warn!("Failed to spawn console reader: {}", e))
            .ok();

        (Self { shutdown, thread }, rx)
    }
}

impl Drop for KeyReader {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_reader(tx: mpsc::UnboundedSender<KeyEvent>, shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::Relaxed) {
        match event::poll(POLL_INTERVAL) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                warn!("Console input error: {}", e);
                break;
            }
        }

        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if tx.send(key).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Console input error: {}", e);
                break;
            }
        }
    }
    debug!("Console reader stopped");
}

/// CTRL+Q or CTRL+C
pub fn is_quit_key(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Char('c'))
}
