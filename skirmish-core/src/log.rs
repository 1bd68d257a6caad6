//! Ordered combat log.

use serde::{Deserialize, Serialize};

/// Append-only list of human-readable combat messages.
///
/// Every line is mirrored to `tracing` so headless runs can be followed
/// with `RUST_LOG`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombatLog {
    lines: Vec<String>,
}

impl CombatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!(target: "skirmish::log", "{line}");
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Lines appended after `cursor`, for incremental readers.
    pub fn since(&self, cursor: usize) -> &[String] {
        self.lines.get(cursor..).unwrap_or(&[])
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True if any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
