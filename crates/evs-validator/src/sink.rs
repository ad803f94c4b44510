//! # Event Sinks
//!
//! Validated events leave the pipeline through an [`EventSink`]. The sink is
//! called once per accepted event with the original, unmodified document and
//! the destination queue name. Delivery is a blocking call with no retry; a
//! failure is returned to the caller as-is.
//!
//! [`JsonLinesQueue`] is the local implementation: one append-only
//! `<destination>.jsonl` file per queue under a root directory.
//! `RecordingSink` keeps events in memory for tests; it is compiled only for
//! this crate's tests or with the `test-util` feature.

#[cfg(any(test, feature = "test-util"))]
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Acknowledgement returned by a sink for one delivered event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Identifier assigned to the message.
    pub message_id: Uuid,
    /// Queue the event was sent to.
    pub destination: String,
    /// When the sink accepted the event.
    pub delivered_at: DateTime<Utc>,
}

impl DeliveryReceipt {
    /// A fresh receipt for `destination`, stamped now.
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            destination: destination.into(),
            delivered_at: Utc::now(),
        }
    }
}

/// Failure to hand an event to its destination.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The destination name cannot be used as a queue.
    #[error("invalid queue name '{0}'")]
    InvalidDestination(String),

    /// The event could not be serialized.
    #[error("event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing to the queue failed.
    #[error("queue io error at {}: {source}", path.display())]
    Io {
        /// File or directory being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Destination for validated events.
pub trait EventSink {
    /// Deliver `event` to the queue named `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the event cannot be delivered. Callers do
    /// not retry.
    fn send(&self, event: &Value, destination: &str) -> Result<DeliveryReceipt, SinkError>;
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn send(&self, event: &Value, destination: &str) -> Result<DeliveryReceipt, SinkError> {
        (**self).send(event, destination)
    }
}

/// Append-only JSON-lines queues rooted at a directory.
#[derive(Debug, Clone)]
pub struct JsonLinesQueue {
    root: PathBuf,
}

impl JsonLinesQueue {
    /// Queues stored under `root`. The directory is created on first send.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the queues.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing the queue named `destination`.
    pub fn queue_path(&self, destination: &str) -> Result<PathBuf, SinkError> {
        let valid = !destination.is_empty()
            && destination
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !destination.starts_with('.');
        if !valid {
            return Err(SinkError::InvalidDestination(destination.to_string()));
        }
        Ok(self.root.join(format!("{destination}.jsonl")))
    }
}

impl EventSink for JsonLinesQueue {
    fn send(&self, event: &Value, destination: &str) -> Result<DeliveryReceipt, SinkError> {
        let path = self.queue_path(destination)?;
        fs::create_dir_all(&self.root).map_err(|source| SinkError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SinkError::Io {
                path: path.clone(),
                source,
            })?;
        file.write_all(line.as_bytes())
            .map_err(|source| SinkError::Io {
                path: path.clone(),
                source,
            })?;

        let receipt = DeliveryReceipt::new(destination);
        tracing::info!(
            queue = destination,
            message_id = %receipt.message_id,
            path = %path.display(),
            "event appended to queue"
        );
        Ok(receipt)
    }
}

/// In-memory sink that records every send.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: RefCell<Vec<(Value, String)>>,
    fail_with: Option<String>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingSink {
    /// A sink that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects every send with an invalid-destination error.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            sent: RefCell::default(),
            fail_with: Some(reason.into()),
        }
    }

    /// Every `(event, destination)` pair sent so far.
    pub fn sent(&self) -> Vec<(Value, String)> {
        self.sent.borrow().clone()
    }

    /// Number of sends.
    pub fn count(&self) -> usize {
        self.sent.borrow().len()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl EventSink for RecordingSink {
    fn send(&self, event: &Value, destination: &str) -> Result<DeliveryReceipt, SinkError> {
        if let Some(reason) = &self.fail_with {
            return Err(SinkError::InvalidDestination(reason.clone()));
        }
        self.sent
            .borrow_mut()
            .push((event.clone(), destination.to_string()));
        Ok(DeliveryReceipt::new(destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let queue = JsonLinesQueue::new(dir.path().join("queues"));

        let first = queue.send(&json!({"a": 1}), "valid-events-queue").unwrap();
        let second = queue.send(&json!({"b": 2}), "valid-events-queue").unwrap();
        assert_ne!(first.message_id, second.message_id);
        assert_eq!(first.destination, "valid-events-queue");

        let content =
            std::fs::read_to_string(queue.queue_path("valid-events-queue").unwrap()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, [r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[test]
    fn keeps_field_order_of_the_event() {
        let dir = tempfile::tempdir().unwrap();
        let queue = JsonLinesQueue::new(dir.path());
        queue
            .send(&json!({"zeta": 1, "alpha": 2}), "ordered")
            .unwrap();
        let content = std::fs::read_to_string(dir.path().join("ordered.jsonl")).unwrap();
        assert_eq!(content, "{\"zeta\":1,\"alpha\":2}\n");
    }

    #[test]
    fn rejects_path_like_queue_names() {
        let queue = JsonLinesQueue::new("/tmp/unused");
        for name in ["", "../escape", "a/b", ".hidden"] {
            assert!(
                matches!(queue.queue_path(name), Err(SinkError::InvalidDestination(_))),
                "{name:?} accepted"
            );
        }
    }

    #[test]
    fn recording_sink_captures_sends() {
        let sink = RecordingSink::new();
        sink.send(&json!({"x": true}), "q").unwrap();
        assert_eq!(sink.count(), 1);
        assert_eq!(sink.sent()[0], (json!({"x": true}), "q".to_string()));
    }
}
