//! In-memory capture of recent tracing events, so a front end can show the tail of
//! the log or save it to a file after a run.
use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{Event, Level, Subscriber, field::Visit};
use tracing_subscriber::layer::{Context, Layer};

use crate::error::Result;

/// Most entries kept; older ones are dropped first.
pub const LOG_BUFFER_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub timestamp: String,
    pub message: String,
    pub target: String,
}

impl LogEntry {
    pub fn new(level: Level, message: String, target: String) -> Self {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        Self {
            level,
            timestamp,
            message,
            target,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.timestamp, self.level, self.target, self.message
        )
    }
}

static LOG_BUFFER: once_cell::sync::Lazy<Arc<Mutex<VecDeque<LogEntry>>>> =
    once_cell::sync::Lazy::new(|| Arc::new(Mutex::new(VecDeque::with_capacity(LOG_BUFFER_CAPACITY))));

/// Copy of the buffered entries, oldest first.
pub fn snapshot_log_entries() -> Vec<LogEntry> {
    LOG_BUFFER
        .lock()
        .map(|buf| buf.iter().cloned().collect())
        .unwrap_or_default()
}

/// Write every buffered entry to `path`, one per line.
pub fn save_log_entries(path: &Path) -> Result<usize> {
    let entries = snapshot_log_entries();
    let mut writer = BufWriter::new(File::create(path)?);
    for entry in &entries {
        writeln!(writer, "{}", entry)?;
    }
    writer.flush()?;
    Ok(entries.len())
}

/// `tracing_subscriber` layer that records events at or above `min_level`.
pub struct CaptureLayer {
    min_level: Level,
}

impl CaptureLayer {
    pub fn new(min_level: Level) -> Self {
        Self { min_level }
    }
}

impl Default for CaptureLayer {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // More verbose levels compare greater
        if *metadata.level() > self.min_level {
            return;
        }

        let mut visitor = MessageVisitor {
            message: String::new(),
            fields: Vec::new(),
        };
        event.record(&mut visitor);

        let mut message = if visitor.message.is_empty() {
            metadata.target().to_string()
        } else {
            visitor.message
        };
        if !visitor.fields.is_empty() {
            message.push(' ');
            message.push_str(&visitor.fields.join(" "));
        }

        let entry = LogEntry::new(*metadata.level(), message, metadata.target().to_string());
        if let Ok(mut buf) = LOG_BUFFER.lock() {
            if buf.len() >= LOG_BUFFER_CAPACITY {
                buf.pop_front();
            }
            buf.push_back(entry);
        }
    }
}
