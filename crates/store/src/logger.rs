//! Operator-facing diagnostics emitted while opening a collection.
//!
//! The store never writes to stdout on its own; callers hand in a logger.

use std::sync::{Arc, Mutex};
use tracing::info;

pub trait StoreLogger: Send + Sync {
    fn log(&self, message: &str);
}

/// Discards every message. Used when no logger is supplied.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl StoreLogger for NoopLogger {
    fn log(&self, _message: &str) {}
}

/// Forwards messages to the `tracing` subscriber at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl StoreLogger for TracingLogger {
    fn log(&self, message: &str) {
        info!("{message}");
    }
}

/// Keeps messages in memory so tests can assert on them.
#[derive(Debug, Default, Clone)]
pub struct MemoryLogger {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryLogger {
    pub fn new() -> Self { Self::default() }

    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl StoreLogger for MemoryLogger {
    fn log(&self, message: &str) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_logger_keeps_order_across_clones() {
        let logger = MemoryLogger::new();
        let shared = logger.clone();
        logger.log("first");
        shared.log("second");
        assert_eq!(logger.lines(), vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn noop_logger_accepts_messages() {
        let logger: Arc<dyn StoreLogger> = Arc::new(NoopLogger);
        logger.log("ignored");
    }
}
