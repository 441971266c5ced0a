//! Console injector - logs keystrokes instead of sending them

use super::{InjectError, KeyInjector};
use crate::keystroke::KeyStroke;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// ConsoleInjector logs every keystroke it is asked to inject
///
/// Useful for:
/// - Trying bindings without sending keys to the focused application
/// - Running on machines without a desktop session
pub struct ConsoleInjector {
    name: String,
    /// Execution counter for debugging
    execution_count: AtomicU64,
}

impl ConsoleInjector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            execution_count: AtomicU64::new(0),
        }
    }

    /// Number of keystrokes logged so far
    pub fn execution_count(&self) -> u64 {
        self.execution_count.load(Ordering::Relaxed)
    }

    fn log(&self, stroke: KeyStroke, direction: &str) {
        let exec_num = self.execution_count.fetch_add(1, Ordering::Relaxed) + 1;

        info!(
            "🎹 [{}] Injector '{}' → {} {} [exec #{}]",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            self.name,
            stroke,
            direction,
            exec_num
        );
        debug!(
            injector = self.name,
            stroke = %stroke,
            direction,
            exec_count = exec_num,
            "ConsoleInjector execution"
        );
    }
}

impl KeyInjector for ConsoleInjector {
    fn name(&self) -> &str {
        &self.name
    }

    fn key_down(&self, stroke: KeyStroke) -> Result<(), InjectError> {
        self.log(stroke, "down");
        Ok(())
    }

    fn key_up(&self, stroke: KeyStroke) -> Result<(), InjectError> {
        self.log(stroke, "up");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_injector_counts_executions() {
        let injector = ConsoleInjector::new("dry-run");
        assert_eq!(injector.name(), "dry-run");
        assert_eq!(injector.execution_count(), 0);

        injector.key_down(KeyStroke::A).unwrap();
        injector.key_up(KeyStroke::A).unwrap();

        assert_eq!(injector.execution_count(), 2);
    }
}
