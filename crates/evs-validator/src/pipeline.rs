//! # Event Pipeline
//!
//! Wires validation to delivery for one event:
//!
//! 1. reject an empty event;
//! 2. reject a non-object event;
//! 3. stop if no schema is available (the loader already reported why);
//! 4. validate content against the schema;
//! 5. send the original event to the queue, exactly once.
//!
//! Rejections are ordinary outcomes. Only a missing schema or a failed send
//! is an error.

use serde_json::Value;
use thiserror::Error;

use evs_core::{SchemaNode, TypeMap};

use crate::sink::{DeliveryReceipt, EventSink, SinkError};
use crate::validate::{value_types, EventValidator, ValidationError, ValueKind};

/// Queue that receives validated events unless configured otherwise.
pub const DEFAULT_QUEUE: &str = "valid-events-queue";

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event passed validation and was sent.
    Delivered(DeliveryReceipt),
    /// The event failed validation and was not sent.
    Rejected(ValidationError),
}

impl Outcome {
    /// True for [`Outcome::Delivered`].
    pub fn is_delivered(&self) -> bool {
        matches!(self, Outcome::Delivered(_))
    }
}

/// Failure of the pipeline itself, as opposed to a rejected event.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The schema could not be loaded, so nothing was validated.
    #[error("no schema available; event was not validated")]
    SchemaUnavailable,

    /// The validated event could not be delivered.
    #[error("delivery to queue '{queue}' failed: {source}")]
    Delivery {
        /// Destination queue.
        queue: String,
        /// Sink error.
        #[source]
        source: SinkError,
    },
}

/// Validates events against one schema and forwards the valid ones.
#[derive(Debug)]
pub struct EventPipeline<S> {
    schema: Option<SchemaNode>,
    sink: S,
    queue: String,
    types: Option<TypeMap<ValueKind>>,
}

impl<S: EventSink> EventPipeline<S> {
    /// A pipeline sending to [`DEFAULT_QUEUE`]. `schema` is `None` when
    /// loading failed.
    pub fn new(schema: Option<SchemaNode>, sink: S) -> Self {
        Self {
            schema,
            sink,
            queue: DEFAULT_QUEUE.to_string(),
            types: None,
        }
    }

    /// Send valid events to `queue` instead.
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    /// Resolve declared types through `types` instead of the default map.
    pub fn with_types(mut self, types: TypeMap<ValueKind>) -> Self {
        self.types = Some(types);
        self
    }

    /// The sink events are delivered to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Destination queue name.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Run one event through the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::SchemaUnavailable`] when the pipeline has no
    /// schema and [`PipelineError::Delivery`] when the sink fails. A rejected
    /// event is `Ok(Outcome::Rejected(_))`.
    pub fn handle(&self, event: &Value) -> Result<Outcome, PipelineError> {
        let validator = EventValidator::with_types(self.types.as_ref().unwrap_or(value_types()));

        if let Err(e) = validator.validate_not_empty(event) {
            return Ok(Outcome::Rejected(e));
        }
        let map = match validator.validate_structure(event) {
            Ok(map) => map,
            Err(e) => return Ok(Outcome::Rejected(e)),
        };

        let Some(schema) = &self.schema else {
            tracing::error!("no schema available; aborting before validation");
            return Err(PipelineError::SchemaUnavailable);
        };

        if let Err(e) = validator.validate_content(schema, map) {
            return Ok(Outcome::Rejected(e));
        }

        let receipt = self
            .sink
            .send(event, &self.queue)
            .map_err(|source| {
                tracing::error!(queue = %self.queue, error = %source, "event delivery failed");
                PipelineError::Delivery {
                    queue: self.queue.clone(),
                    source,
                }
            })?;

        tracing::info!(
            queue = %self.queue,
            message_id = %receipt.message_id,
            "event sent successfully"
        );
        Ok(Outcome::Delivered(receipt))
    }
}
