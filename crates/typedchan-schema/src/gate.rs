//! Receive-path payload validation.
//!
//! The gate fails closed: a payload that does not satisfy its schema is
//! reported to a [`DiagnosticSink`] and dropped. It never panics and never
//! returns an error to the listener chain.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::registry::EventSchema;

/// Number of validation messages kept after the first one.
const EXTRA_ERRORS: usize = 3;

/// What a payload was validated for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GateTarget {
    /// An event on a channel kind.
    Channel { kind: String, event: String },
    /// A user-targeted event delivered outside any channel.
    User { event: String },
}

impl GateTarget {
    pub fn channel(kind: impl Into<String>, event: impl Into<String>) -> Self {
        GateTarget::Channel {
            kind: kind.into(),
            event: event.into(),
        }
    }

    pub fn user(event: impl Into<String>) -> Self {
        GateTarget::User {
            event: event.into(),
        }
    }

    pub fn event(&self) -> &str {
        match self {
            GateTarget::Channel { event, .. } | GateTarget::User { event } => event,
        }
    }
}

impl fmt::Display for GateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateTarget::Channel { kind, event } => write!(f, "channel {kind} event {event}"),
            GateTarget::User { event } => write!(f, "user event {event}"),
        }
    }
}

/// Validate a payload against a compiled schema.
pub fn validate(target: &GateTarget, schema: &EventSchema, payload: &Value) -> Result<()> {
    let mut errors = schema.validator().iter_errors(payload);
    if let Some(first) = errors.next() {
        let mut message = first.to_string();
        for err in errors.take(EXTRA_ERRORS) {
            message.push_str("; ");
            message.push_str(&err.to_string());
        }
        return Err(SchemaError::ValidationFailed {
            target: target.clone(),
            message,
        });
    }

    Ok(())
}

/// A payload the gate refused to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedEvent {
    pub target: GateTarget,
    pub reason: String,
}

/// Receives a diagnostic for every dropped payload.
pub trait DiagnosticSink: Send + Sync {
    fn dropped(&self, event: &DroppedEvent);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&DroppedEvent) + Send + Sync,
{
    fn dropped(&self, event: &DroppedEvent) {
        self(event)
    }
}

/// Default sink: one `warn` record per dropped payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn dropped(&self, event: &DroppedEvent) {
        tracing::warn!(subject = %event.target, reason = %event.reason, "dropping invalid payload");
    }
}

/// Schema check applied before a payload reaches a listener.
#[derive(Clone)]
pub struct PayloadGate {
    sink: Arc<dyn DiagnosticSink>,
}

impl PayloadGate {
    /// Gate reporting drops through `tracing`.
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    pub fn with_sink(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    /// Return the payload if it satisfies `schema`, otherwise report and drop it.
    pub fn admit(&self, target: &GateTarget, schema: &EventSchema, raw: &Value) -> Option<Value> {
        match validate(target, schema, raw) {
            Ok(()) => Some(raw.clone()),
            Err(err) => {
                self.report(target, err.to_string());
                None
            }
        }
    }

    /// Like [`admit`](Self::admit), then deserialize into `T`.
    ///
    /// A payload that passes the schema but does not fit `T` is dropped too.
    pub fn admit_as<T: DeserializeOwned>(
        &self,
        target: &GateTarget,
        schema: &EventSchema,
        raw: &Value,
    ) -> Option<T> {
        let value = self.admit(target, schema, raw)?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                self.report(target, format!("payload does not match the event type: {err}"));
                None
            }
        }
    }

    fn report(&self, target: &GateTarget, reason: String) {
        self.sink.dropped(&DroppedEvent {
            target: target.clone(),
            reason,
        });
    }
}

impl Default for PayloadGate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PayloadGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadGate").finish_non_exhaustive()
    }
}
