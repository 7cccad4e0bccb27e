//! Capped in-process log buffer exposed to viewers

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use chrono::Local;
use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Only the most recent entries are kept for display
pub const MAX_ENTRIES: usize = 1000;

/// One captured log line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub message: String,
}

/// Shared ring buffer of recent log lines.
///
/// Cloning is cheap; all clones observe the same buffer. Attach it to the
/// subscriber with [`LogBuffer::layer`] and read it with
/// [`LogBuffer::snapshot`].
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: LogEntry) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if entries.len() >= MAX_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Read a copy of the buffered entries, oldest first
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    /// A tracing layer that appends events to this buffer
    pub fn layer(&self) -> LogBufferLayer {
        LogBufferLayer {
            buffer: self.clone(),
        }
    }
}

/// Tracing layer feeding a [`LogBuffer`]
#[derive(Debug)]
pub struct LogBufferLayer {
    buffer: LogBuffer,
}

impl<S: Subscriber> Layer<S> for LogBufferLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        // Viewers get the operator-relevant levels, not debug chatter
        if level > Level::INFO {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.buffer.push(LogEntry {
            timestamp: Local::now().format("%Y/%m/%d %H:%M:%S").to_string(),
            level: level.to_string(),
            message: visitor.into_message(),
        });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    extra: String,
}

impl MessageVisitor {
    fn into_message(self) -> String {
        let mut message = self.message;
        message.push_str(&self.extra);
        message
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.extra, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            let _ = write!(self.extra, " {}={:?}", field.name(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    fn entry(message: &str) -> LogEntry {
        LogEntry {
            timestamp: "2024/06/01 12:00:00".to_string(),
            level: "INFO".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn snapshot_preserves_insertion_order() {
        let buffer = LogBuffer::new();
        buffer.push(entry("first"));
        buffer.push(entry("second"));

        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].message, "first");
        assert_eq!(snapshot[1].message, "second");
    }

    #[test]
    fn buffer_caps_at_max_entries() {
        let buffer = LogBuffer::new();
        for i in 0..(MAX_ENTRIES + 5) {
            buffer.push(entry(&format!("line {}", i)));
        }

        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.len(), MAX_ENTRIES);
        assert_eq!(snapshot[0].message, "line 5");
        assert_eq!(snapshot[MAX_ENTRIES - 1].message, format!("line {}", MAX_ENTRIES + 4));
    }

    #[test]
    fn clones_share_the_same_buffer() {
        let buffer = LogBuffer::new();
        let clone = buffer.clone();
        buffer.push(entry("shared"));

        assert_eq!(clone.snapshot().len(), 1);
    }

    #[test]
    fn layer_captures_info_and_above_only() {
        let buffer = LogBuffer::new();
        let subscriber = tracing_subscriber::registry().with(buffer.layer());

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("instance check started");
            tracing::warn!("webhook returned 404");
            tracing::error!("poll cycle failed");
            tracing::debug!("not for viewers");
            tracing::trace!("definitely not for viewers");
        });

        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].level, "INFO");
        assert_eq!(snapshot[0].message, "instance check started");
        assert_eq!(snapshot[1].level, "WARN");
        assert_eq!(snapshot[2].level, "ERROR");
    }

    #[test]
    fn layer_formats_interpolated_messages() {
        let buffer = LogBuffer::new();
        let subscriber = tracing_subscriber::registry().with(buffer.layer());

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Loaded {} notified instances", 3);
        });

        let snapshot = buffer.snapshot();
        assert_eq!(snapshot[0].message, "Loaded 3 notified instances");
    }
}
