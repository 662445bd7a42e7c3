use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Listener invoked with each raw inbound payload.
pub type Callback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Transport-issued handle of one listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

impl BindingId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A subscribed channel as returned by [`SubscribeTransport::subscribe`].
pub trait ChannelHandle: Send + Sync {
    /// Wire channel name this handle is subscribed to.
    fn name(&self) -> &str;

    /// Register a raw, unvalidated listener for `event`.
    fn bind(&self, event: &str, callback: Callback) -> BindingId;

    /// Remove listeners.
    ///
    /// `None` for `event` matches every event; `None` for `binding` matches
    /// every binding of the selected events.
    fn unbind(&self, event: Option<&str>, binding: Option<BindingId>);
}

/// Client side of a pub/sub transport.
pub trait SubscribeTransport {
    type Channel: ChannelHandle;

    /// Subscribe to a wire channel name. The transport governs when the
    /// subscription becomes live.
    fn subscribe(&self, channel: &str) -> Result<Self::Channel>;

    fn unsubscribe(&self, channel: &str) -> Result<()>;

    /// Register a listener for events sent directly to the signed-in user.
    fn bind_user(&self, event: &str, callback: Callback) -> Result<BindingId>;

    fn unbind_user(&self, event: Option<&str>, binding: Option<BindingId>);
}

/// One entry of a batched trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEvent {
    pub channel: String,
    pub name: String,
    pub data: Value,
    /// Connection excluded from delivery (usually the sender).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_id: Option<String>,
    /// Attributes the backend should return about the channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

/// Backend acknowledgement of a publish request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub status: u16,
    #[serde(default)]
    pub body: Value,
}

impl TriggerResponse {
    pub fn ok() -> Self {
        Self {
            status: 200,
            body: Value::Object(Default::default()),
        }
    }
}

/// Server side of a pub/sub transport.
///
/// Every call is one request to the backend; its outcome is returned as-is.
pub trait PublishTransport: Send + Sync {
    /// Publish one event to one or more wire channel names.
    fn trigger(
        &self,
        channels: &[String],
        event: &str,
        payload: &Value,
    ) -> impl Future<Output = Result<TriggerResponse>> + Send;

    /// Publish several events in a single request, in order.
    fn trigger_batch(
        &self,
        batch: &[BatchEvent],
    ) -> impl Future<Output = Result<TriggerResponse>> + Send;

    /// Publish an event to every connection of one user.
    fn send_to_user(
        &self,
        user_id: &str,
        event: &str,
        payload: &Value,
    ) -> impl Future<Output = Result<TriggerResponse>> + Send;
}
