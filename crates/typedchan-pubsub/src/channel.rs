use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use typedchan_naming::{InstanceId, WireChannelName};
use typedchan_schema::{GateTarget, PayloadGate, SchemaRegistry};
use typedchan_transport::{BindingId, ChannelHandle};

use crate::dispatch::gated;
use crate::error::Result;
use crate::events::{ChannelKind, Event};

/// A joined channel instance.
///
/// [`listen`](Self::listen) registers validated listeners; [`bind`](Self::bind)
/// and [`unbind`](Self::unbind) are the transport's raw primitives.
pub struct Channel<H> {
    handle: H,
    kind: String,
    instance: InstanceId,
    wire_name: WireChannelName,
    registry: Arc<SchemaRegistry>,
    gate: PayloadGate,
}

impl<H: ChannelHandle> Channel<H> {
    pub(crate) fn new(
        handle: H,
        kind: &str,
        instance: InstanceId,
        wire_name: WireChannelName,
        registry: Arc<SchemaRegistry>,
        gate: PayloadGate,
    ) -> Self {
        Self {
            handle,
            kind: kind.to_string(),
            instance,
            wire_name,
            registry,
            gate,
        }
    }

    /// Listen for `event`, receiving only payloads valid for its schema.
    ///
    /// Invalid payloads are dropped and reported to the diagnostic sink.
    /// Fails if `event` is not declared on this channel's kind.
    pub fn listen<F>(&self, event: &str, callback: F) -> Result<BindingId>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.listen_as::<Value, F>(event, callback)
    }

    /// Listen for `event`, deserializing valid payloads into `P`.
    pub fn listen_as<P, F>(&self, event: &str, callback: F) -> Result<BindingId>
    where
        P: DeserializeOwned,
        F: Fn(P) + Send + Sync + 'static,
    {
        self.registry.event_schema(&self.kind, event)?;
        let target = GateTarget::channel(&self.kind, event);
        let wrapped = gated(self.registry.clone(), self.gate.clone(), target, callback);
        Ok(self.handle.bind(event, wrapped))
    }

    /// Raw transport bind. Payloads are not validated.
    pub fn bind<F>(&self, event: &str, callback: F) -> BindingId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.handle.bind(event, Arc::new(callback))
    }

    /// Raw transport unbind; removes validated and raw listeners alike.
    pub fn unbind(&self, event: Option<&str>, binding: Option<BindingId>) {
        self.handle.unbind(event, binding);
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn instance(&self) -> &InstanceId {
        &self.instance
    }

    pub fn wire_name(&self) -> &WireChannelName {
        &self.wire_name
    }

    /// The transport's channel handle.
    pub fn handle(&self) -> &H {
        &self.handle
    }
}

impl<H> fmt::Debug for Channel<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("kind", &self.kind)
            .field("instance", &self.instance)
            .field("wire_name", &self.wire_name)
            .finish_non_exhaustive()
    }
}

/// A joined channel instance of the compile-time kind `K`.
///
/// Dereferences to [`Channel`] for the string-keyed and raw operations.
pub struct TypedChannel<K, H> {
    channel: Channel<H>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ChannelKind, H: ChannelHandle> TypedChannel<K, H> {
    pub(crate) fn new(channel: Channel<H>) -> Self {
        Self {
            channel,
            _kind: PhantomData,
        }
    }

    /// Listen for event `E` declared on kind `K`.
    pub fn listen<E, F>(&self, callback: F) -> Result<BindingId>
    where
        E: Event<Kind = K>,
        F: Fn(E::Payload) + Send + Sync + 'static,
    {
        self.channel.listen_as::<E::Payload, F>(E::NAME, callback)
    }

    /// Remove every listener of event `E`.
    pub fn unbind_event<E>(&self)
    where
        E: Event<Kind = K>,
    {
        self.channel.unbind(Some(E::NAME), None);
    }

    pub fn into_inner(self) -> Channel<H> {
        self.channel
    }
}

impl<K, H> Deref for TypedChannel<K, H> {
    type Target = Channel<H>;

    fn deref(&self) -> &Channel<H> {
        &self.channel
    }
}

impl<K, H> fmt::Debug for TypedChannel<K, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedChannel").field(&self.channel).finish()
    }
}
