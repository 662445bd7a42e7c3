use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use typedchan_naming::{encode, InstanceId, WireChannelName};
use typedchan_schema::{DiagnosticSink, GateTarget, PayloadGate, SchemaRegistry};
use typedchan_transport::{BindingId, SubscribeTransport};

use crate::channel::{Channel, TypedChannel};
use crate::dispatch::gated;
use crate::error::Result;
use crate::events::{ChannelKind, UserEvent};
use crate::options::ChannelOptions;

/// Subscribing facade: joins channel instances by identity and validates
/// every inbound payload against the registry.
pub struct TypedClient<T> {
    transport: T,
    registry: Arc<SchemaRegistry>,
    options: ChannelOptions,
    gate: PayloadGate,
}

impl<T: SubscribeTransport> TypedClient<T> {
    /// Wrap a transport with default options.
    pub fn new(transport: T, registry: Arc<SchemaRegistry>) -> Result<Self> {
        Self::with_options(transport, registry, ChannelOptions::default())
    }

    /// Wrap a transport with explicit options.
    ///
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
            gate: PayloadGate::new(),
        })
    }

    /// Report dropped payloads to `sink` instead of `tracing`.
    ///
    /// Applies to channels joined and bindings made afterwards.
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.gate = PayloadGate::with_sink(sink);
        self
    }

    /// Wire name for an identity, as used by both subscribe and publish.
    pub fn wire_name(&self, kind: &str, id: impl Into<InstanceId>) -> WireChannelName {
        encode(kind, &id.into(), self.options.separator)
    }

    /// Subscribe to the instance `id` of channel kind `kind`.
    pub fn join_channel(
        &self,
        kind: &str,
        id: impl Into<InstanceId>,
    ) -> Result<Channel<T::Channel>> {
        self.declared(kind)?;
        let instance = id.into();
        let wire_name = encode(kind, &instance, self.options.separator);
        let handle = self.transport.subscribe(wire_name.as_str())?;
        debug!(channel = %wire_name, "joined channel");
        Ok(Channel::new(
            handle,
            kind,
            instance,
            wire_name,
            self.registry.clone(),
            self.gate.clone(),
        ))
    }

    /// Unsubscribe from the instance `id` of channel kind `kind`.
    pub fn leave_channel(&self, kind: &str, id: impl Into<InstanceId>) -> Result<()> {
        self.declared(kind)?;
        let wire_name = encode(kind, &id.into(), self.options.separator);
        self.transport.unsubscribe(wire_name.as_str())?;
        debug!(channel = %wire_name, "left channel");
        Ok(())
    }

    /// Typed [`join_channel`](Self::join_channel).
    pub fn join<K: ChannelKind>(
        &self,
        id: impl Into<InstanceId>,
    ) -> Result<TypedChannel<K, T::Channel>> {
        self.join_channel(K::NAME, id).map(TypedChannel::new)
    }

    /// Typed [`leave_channel`](Self::leave_channel).
    pub fn leave<K: ChannelKind>(&self, id: impl Into<InstanceId>) -> Result<()> {
        self.leave_channel(K::NAME, id)
    }

    /// User-scoped bindings for events sent outside any channel.
    pub fn member(&self) -> Member<'_, T> {
        Member { client: self }
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

    fn declared(&self, kind: &str) -> Result<()> {
        if self.registry.has_channel(kind) {
            return Ok(());
        }
        Err(typedchan_schema::SchemaError::UndeclaredChannel(kind.to_string()).into())
    }
}

/// Validated bindings for user-targeted events.
pub struct Member<'a, T> {
    client: &'a TypedClient<T>,
}

impl<T: SubscribeTransport> Member<'_, T> {
    /// Bind a user event, receiving only payloads valid for its schema.
    pub fn bind<F>(&self, event: &str, callback: F) -> Result<BindingId>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.bind_as::<Value, F>(event, callback)
    }

    /// Typed [`bind`](Self::bind).
    pub fn bind_event<U, F>(&self, callback: F) -> Result<BindingId>
    where
        U: UserEvent,
        F: Fn(U::Payload) + Send + Sync + 'static,
    {
        self.bind_as::<U::Payload, F>(U::NAME, callback)
    }

    pub fn unbind(&self, event: Option<&str>, binding: Option<BindingId>) {
        self.client.transport.unbind_user(event, binding);
    }

    fn bind_as<P, F>(&self, event: &str, callback: F) -> Result<BindingId>
    where
        P: serde::de::DeserializeOwned,
        F: Fn(P) + Send + Sync + 'static,
    {
        let client = self.client;
        client.registry.user_event_schema(event)?;
        let wrapped = gated(
            client.registry.clone(),
            client.gate.clone(),
            GateTarget::user(event),
            callback,
        );
        Ok(client.transport.bind_user(event, wrapped)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;
    use typedchan_naming::Separator;
    use typedchan_schema::DroppedEvent;
    use typedchan_transport::{MemoryTransport, TransportError};

    use super::*;
    use crate::error::PubSubError;

    fn registry() -> Arc<SchemaRegistry> {
        Arc::new(
            SchemaRegistry::from_manifest(
                r#"{
                    "channels": {
                        "room": {
                            "chat": {
                                "type": "object",
                                "properties": {
                                    "id": { "type": "string" },
                                    "text": { "type": "string" }
                                },
                                "required": ["id", "text"]
                            }
                        }
                    },
                    "user_events": {
                        "notice": { "type": "object", "required": ["message"] }
                    }
                }"#,
            )
            .unwrap(),
        )
    }

    fn collector() -> (Arc<Mutex<Vec<Value>>>, impl Fn(Value) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (
            seen,
            move |value: Value| sink.lock().unwrap().push(value),
        )
    }

    #[test]
    fn join_subscribes_encoded_name() {
        let transport = MemoryTransport::new();
        let client = TypedClient::new(transport.clone(), registry()).unwrap();

        let channel = client.join_channel("room", "42").unwrap();
        assert_eq!(channel.wire_name(), "room.42");
        assert_eq!(channel.kind(), "room");
        assert!(transport.is_subscribed("room.42"));

        client.leave_channel("room", "42").unwrap();
        assert!(!transport.is_subscribed("room.42"));
    }

    #[test]
    fn custom_separator_is_used_for_join() {
        let transport = MemoryTransport::new();
        let options = ChannelOptions {
            separator: Separator::At,
            ..ChannelOptions::default()
        };
        let client = TypedClient::with_options(transport.clone(), registry(), options).unwrap();
        client.join_channel("room", 7).unwrap();
        assert_eq!(transport.subscriptions(), vec!["room@7"]);
    }

    #[test]
    fn undeclared_kind_never_reaches_transport() {
        let transport = MemoryTransport::new();
        let client = TypedClient::new(transport.clone(), registry()).unwrap();

        let err = client.join_channel("lobby", "1").unwrap_err();
        assert!(err.is_undeclared());
        assert!(transport.subscriptions().is_empty());
        assert!(client
            .leave_channel("lobby", "1")
            .unwrap_err()
            .is_undeclared());
    }

    #[test]
    fn listen_rejects_undeclared_event() {
        let client = TypedClient::new(MemoryTransport::new(), registry()).unwrap();
        let channel = client.join_channel("room", "42").unwrap();
        let err = channel.listen("typing", |_| {}).unwrap_err();
        assert!(err.is_undeclared());
        assert_eq!(channel.handle().binding_count(), 0);
    }

    #[test]
    fn listen_delivers_valid_and_drops_invalid() {
        let transport = MemoryTransport::new();
        let dropped = Arc::new(Mutex::new(Vec::<DroppedEvent>::new()));
        let drops = dropped.clone();
        let client = TypedClient::new(transport.clone(), registry())
            .unwrap()
            .with_diagnostics(Arc::new(move |event: &DroppedEvent| {
                drops.lock().unwrap().push(event.clone())
            }));

        let channel = client.join_channel("room", "42").unwrap();
        let (seen, callback) = collector();
        channel.listen("chat", callback).unwrap();

        transport.deliver("room.42", "chat", &json!({"id": "1", "text": "hi"}));
        transport.deliver("room.42", "chat", &json!({"id": "1"}));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![json!({"id": "1", "text": "hi"})]
        );
        let dropped = dropped.lock().unwrap();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].target, GateTarget::channel("room", "chat"));
    }

    #[test]
    fn raw_bind_skips_validation() {
        let transport = MemoryTransport::new();
        let client = TypedClient::new(transport.clone(), registry()).unwrap();
        let channel = client.join_channel("room", "42").unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = channel.bind("chat", move |value: &Value| {
            sink.lock().unwrap().push(value.clone())
        });
        transport.deliver("room.42", "chat", &json!({"id": "1"}));
        assert_eq!(seen.lock().unwrap().len(), 1);

        channel.unbind(Some("chat"), Some(id));
        transport.deliver("room.42", "chat", &json!({"id": "1"}));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn unbinding_a_validated_listener_stops_delivery() {
        let transport = MemoryTransport::new();
        let client = TypedClient::new(transport.clone(), registry()).unwrap();
        let channel = client.join_channel("room", "42").unwrap();

        let (seen, callback) = collector();
        let (kept, keep_callback) = collector();
        let id = channel.listen("chat", callback).unwrap();
        channel.listen("chat", keep_callback).unwrap();

        let payload = json!({"id": "1", "text": "hi"});
        transport.deliver("room.42", "chat", &payload);
        channel.unbind(Some("chat"), Some(id));
        transport.deliver("room.42", "chat", &payload);

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(kept.lock().unwrap().len(), 2);
        assert_eq!(channel.handle().binding_count(), 1);
    }

    #[test]
    fn member_unbind_stops_user_delivery() {
        let transport = MemoryTransport::new();
        transport.sign_in("alice");
        let client = TypedClient::new(transport.clone(), registry()).unwrap();

        let (seen, callback) = collector();
        let id = client.member().bind("notice", callback).unwrap();
        let payload = json!({"message": "hello"});

        assert_eq!(transport.deliver_to_user("alice", "notice", &payload), 1);
        client.member().unbind(Some("notice"), Some(id));
        assert_eq!(transport.deliver_to_user("alice", "notice", &payload), 0);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn member_bind_validates_user_events() {
        let transport = MemoryTransport::new();
        transport.sign_in("alice");
        let client = TypedClient::new(transport.clone(), registry()).unwrap();

        let (seen, callback) = collector();
        client.member().bind("notice", callback).unwrap();
        assert!(client
            .member()
            .bind("other", |_| {})
            .unwrap_err()
            .is_undeclared());

        transport.deliver_to_user("alice", "notice", &json!({"message": "hello"}));
        transport.deliver_to_user("alice", "notice", &json!({"nope": true}));

        assert_eq!(*seen.lock().unwrap(), vec![json!({"message": "hello"})]);
    }

    #[test]
    fn transport_failure_is_passed_through() {
        let transport = MemoryTransport::new();
        let client = TypedClient::new(transport.clone(), registry()).unwrap();
        transport.fail_next(TransportError::Unavailable("offline".into()));

        match client.join_channel("room", "42") {
            Err(PubSubError::Transport(err)) => {
                assert_eq!(err, TransportError::Unavailable("offline".into()))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn separator_inside_kind_is_rejected() {
        let registry = Arc::new(
            SchemaRegistry::from_manifest(r#"{"channels": {"private-room": {}}}"#).unwrap(),
        );
        let options = ChannelOptions {
            separator: Separator::Hyphen,
            ..ChannelOptions::default()
        };
        assert!(TypedClient::with_options(MemoryTransport::new(), registry, options).is_err());
    }
}
