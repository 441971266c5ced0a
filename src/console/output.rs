//! Console output for editor messages

use colored::*;
use std::io::Write;

/// Sink for the editor's user-facing messages
pub trait ConsoleOutput: Send {
    fn message(&mut self, text: &str);
}

/// Prints messages to stdout
///
/// The terminal runs in raw mode, so line feeds are written as CR/LF.
/// Banner lines (`***** NAME *****`) are highlighted.
#[derive(Debug, Default)]
pub struct TerminalOutput;

impl TerminalOutput {
    pub fn new() -> Self {
        Self
    }
}

impl ConsoleOutput for TerminalOutput {
    fn message(&mut self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        for line in text.split('\n') {
            let line = if line.starts_with('*') {
                line.bold().cyan().to_string()
            } else {
                line.to_string()
            };
            // Output errors are not actionable here
            let _ = write!(stdout, "{}\r\n", line);
        }
        let _ = stdout.flush();
    }
}
