use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use typedchan_naming::{encode, ChannelTargets, InstanceId, WireChannelName};
use typedchan_schema::{
    channel_kinds, presence_channel_kinds, restricted_channel_kinds, SchemaRegistry,
};
use typedchan_transport::{BatchEvent, PublishTransport, TriggerResponse};

use crate::error::Result;
use crate::events::{ChannelKind, Event, UserEvent};
use crate::options::ChannelOptions;

/// One event of a batched publish.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub kind: String,
    pub instance: InstanceId,
    pub event: String,
    pub payload: Value,
    /// Connection excluded from delivery.
    pub socket_id: Option<String>,
    /// Channel attributes requested from the backend.
    pub info: Option<String>,
}

impl BatchEntry {
    pub fn new(
        kind: impl Into<String>,
        instance: impl Into<InstanceId>,
        event: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            kind: kind.into(),
            instance: instance.into(),
            event: event.into(),
            payload,
            socket_id: None,
            info: None,
        }
    }

    /// Entry for the typed event `E`.
    pub fn typed<E: Event>(instance: impl Into<InstanceId>, payload: &E::Payload) -> Result<Self> {
        Ok(Self::new(
            <E::Kind as ChannelKind>::NAME,
            instance,
            E::NAME,
            serde_json::to_value(payload)?,
        ))
    }

    pub fn with_socket_id(mut self, socket_id: impl Into<String>) -> Self {
        self.socket_id = Some(socket_id.into());
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }
}

/// Publishing facade: addresses channel instances by identity.
///
/// Payloads are forwarded unmodified. Unless
/// [`ChannelOptions::validate_outbound`] is set, only declared-ness of the
/// channel kind and event is checked at runtime.
pub struct TypedServer<T> {
    transport: T,
    registry: Arc<SchemaRegistry>,
    options: ChannelOptions,
}

impl<T: PublishTransport> TypedServer<T> {
    pub fn new(transport: T, registry: Arc<SchemaRegistry>) -> Result<Self> {
        Self::with_options(transport, registry, ChannelOptions::default())
    }

    /// Fails if a declared channel kind contains the configured separator.
    pub fn with_options(
        transport: T,
        registry: Arc<SchemaRegistry>,
        options: ChannelOptions,
    ) -> Result<Self> {
        registry.check_separator(options.separator)?;
        Ok(Self {
            transport,
            registry,
            options,
        })
    }

    /// Publish `event` to one or many instances of `kind` in one request.
    ///
    /// Wire names are passed to the transport in target order.
    pub async fn publish(
        &self,
        kind: &str,
        targets: impl Into<ChannelTargets>,
        event: &str,
        payload: &Value,
    ) -> Result<TriggerResponse> {
        self.check_outbound(kind, event, payload)?;
        let targets: ChannelTargets = targets.into();
        let channels: Vec<String> = targets
            .wire_names(kind, self.options.separator)
            .into_iter()
            .map(WireChannelName::into_string)
            .collect();
        debug!(?channels, event, "publishing");
        Ok(self.transport.trigger(&channels, event, payload).await?)
    }

    /// Publish the typed event `E`.
    pub async fn publish_event<E: Event>(
        &self,
        targets: impl Into<ChannelTargets>,
        payload: &E::Payload,
    ) -> Result<TriggerResponse> {
        let payload = serde_json::to_value(payload)?;
        let kind = <E::Kind as ChannelKind>::NAME;
        self.publish(kind, targets, E::NAME, &payload).await
    }

    /// Publish several events in one request, preserving entry order.
    ///
    /// Every entry is checked before anything is sent.
    pub async fn publish_batch(&self, entries: Vec<BatchEntry>) -> Result<TriggerResponse> {
        let batch = entries
            .into_iter()
            .map(|entry| -> Result<BatchEvent> {
                self.check_outbound(&entry.kind, &entry.event, &entry.payload)?;
                Ok(BatchEvent {
                    channel: encode(&entry.kind, &entry.instance, self.options.separator)
                        .into_string(),
                    name: entry.event,
                    data: entry.payload,
                    socket_id: entry.socket_id,
                    info: entry.info,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(entries = batch.len(), "publishing batch");
        Ok(self.transport.trigger_batch(&batch).await?)
    }

    /// Send a user event to every connection of `user_id`.
    pub async fn send_to_user(
        &self,
        user_id: &str,
        event: &str,
        payload: &Value,
    ) -> Result<TriggerResponse> {
        self.registry.user_event_schema(event)?;
        if self.options.validate_outbound {
            self.registry.validate_user_event(event, payload)?;
        }
        debug!(user_id, event, "sending to user");
        Ok(self.transport.send_to_user(user_id, event, payload).await?)
    }

    /// Send the typed user event `U`.
    pub async fn send_user_event<U: UserEvent>(
        &self,
        user_id: &str,
        payload: &U::Payload,
    ) -> Result<TriggerResponse> {
        let payload = serde_json::to_value(payload)?;
        self.send_to_user(user_id, U::NAME, &payload).await
    }

    /// Every declared channel kind, in declaration order.
    pub fn list_channel_kinds(&self) -> Vec<&str> {
        channel_kinds(&self.registry)
    }

    /// Declared kinds with the restricted-access prefix.
    pub fn list_restricted_channel_kinds(&self) -> Vec<&str> {
        restricted_channel_kinds(&self.registry)
    }

    /// Declared kinds with the presence-tracking prefix.
    pub fn list_presence_channel_kinds(&self) -> Vec<&str> {
        presence_channel_kinds(&self.registry)
    }

    /// Wire name for an identity, as used by both subscribe and publish.
    pub fn wire_name(&self, kind: &str, id: impl Into<InstanceId>) -> WireChannelName {
        encode(kind, &id.into(), self.options.separator)
    }

    /// The wrapped transport, for untyped access.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn options(&self) -> ChannelOptions {
        self.options
    }

    fn check_outbound(&self, kind: &str, event: &str, payload: &Value) -> Result<()> {
        if self.options.validate_outbound {
            self.registry.validate(kind, event, payload)?;
        } else {
            self.registry.event_schema(kind, event)?;
        }
        Ok(())
    }
}
