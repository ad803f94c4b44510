//! # evs-validator — Event Validation & Delivery
//!
//! Checks JSON events against a schema tree and forwards the valid ones to a
//! queue.
//!
//! ## Validation Policy
//!
//! - **Closed world.** A schema node's `required` list is also its complete
//!   list of allowed fields. Extra fields are rejected like missing ones.
//! - **Fail fast.** The first violation ends validation and is returned.
//! - **First nested object decides.** At each level, the walk stops at the
//!   first field holding a nested object and returns that subtree's result.
//!   Sibling fields declared after it are not inspected. Callers relying on
//!   full coverage must order nested objects last in their events.
//!
//! ## Delivery
//!
//! [`EventPipeline`] sends an accepted event exactly once, unmodified, through
//! an [`EventSink`]. [`JsonLinesQueue`] is the local file-backed sink.

pub mod pipeline;
pub mod sink;
pub mod validate;

// Re-export primary types.
pub use pipeline::{EventPipeline, Outcome, PipelineError, DEFAULT_QUEUE};
pub use sink::{DeliveryReceipt, EventSink, JsonLinesQueue, SinkError};
#[cfg(any(test, feature = "test-util"))]
pub use sink::RecordingSink;
pub use validate::{is_empty_value, value_types, EventValidator, ValidationError, ValueKind};
