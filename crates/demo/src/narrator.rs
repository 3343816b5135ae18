//! Shared script of everything said during a run.

use std::sync::{Arc, Mutex, PoisonError};

/// Collects spoken lines in order and logs each one.
#[derive(Debug, Clone, Default)]
pub struct Narrator {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Narrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(&self, speaker: &str, line: impl AsRef<str>) {
        let line = format!("{speaker}: {}", line.as_ref());
        tracing::info!(speaker, "{line}");
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }

    /// Everything said so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
