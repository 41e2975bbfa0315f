//! ObservationScope for begin/complete lifecycle events
//!
//! Events are emitted through `tracing` with the event name in the
//! `event` field, so subscribers can filter on it.

use std::cell::Cell;
use std::time::Instant;

use tracing::{error, info, warn};

/// A scope that logs begin and outcome events for one operation
///
/// # Usage
///
/// ```ignore
/// let scope = ObservationScope::new("INDEX_BUILD");
/// // ... do work ...
/// scope.complete(); // logs INDEX_BUILD_COMPLETE
/// // if neither completed nor failed, logs INDEX_BUILD_INCOMPLETE on drop
/// ```
pub struct ObservationScope<'a> {
    name: &'a str,
    completed: Cell<bool>,
    fields: Vec<(&'a str, String)>,
}

impl<'a> ObservationScope<'a> {
    /// Logs `{name}_BEGIN`
    pub fn new(name: &'a str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Logs `{name}_BEGIN` with context fields, repeated on every later event
    pub fn with_fields(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        let fields: Vec<(&'a str, String)> =
            fields.iter().map(|(k, v)| (*k, v.to_string())).collect();
        info!(event = %format!("{}_BEGIN", name), fields = %render(&fields));

        Self {
            name,
            completed: Cell::new(false),
            fields,
        }
    }

    /// Logs `{name}_COMPLETE`
    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    /// Logs `{name}_COMPLETE` with additional result fields
    pub fn complete_with_fields(self, extra: &[(&'a str, &str)]) {
        self.completed.set(true);
        let mut all = self.fields.clone();
        all.extend(extra.iter().map(|(k, v)| (*k, v.to_string())));
        info!(event = %format!("{}_COMPLETE", self.name), fields = %render(&all));
    }

    /// Logs `{name}_FAILED` with the error code and reason
    pub fn fail(self, code: &str, reason: &str) {
        self.completed.set(true);
        error!(
            event = %format!("{}_FAILED", self.name),
            code,
            reason,
            fields = %render(&self.fields)
        );
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed.get() {
            warn!(
                event = %format!("{}_INCOMPLETE", self.name),
                reason = "scope dropped without completion"
            );
        }
    }
}

fn render(fields: &[(&str, String)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Elapsed-time measurement for read and eval counters
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ns(&self) -> u64 {
        self.start.elapsed().as_nanos().min(u64::MAX as u128) as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
