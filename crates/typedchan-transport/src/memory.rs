use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{
    BatchEvent, BindingId, Callback, ChannelHandle, PublishTransport, SubscribeTransport,
    TriggerResponse,
};

/// A request received by the publishing side of [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum Published {
    Trigger {
        channels: Vec<String>,
        event: String,
        payload: Value,
    },
    Batch(Vec<BatchEvent>),
    User {
        user_id: String,
        event: String,
        payload: Value,
    },
}

/// In-process transport implementing both the subscribe and publish sides.
///
/// Published events are recorded and looped back to bindings on the
/// subscribed channels. Clones share state, so one clone can act as the
/// client and another as the server.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    next_binding: AtomicU64,
}

#[derive(Default)]
struct State {
    channels: HashMap<String, MemoryChannel>,
    user_bindings: Vec<Binding>,
    user_id: Option<String>,
    socket_id: Option<String>,
    published: Vec<Published>,
    fail_next: Option<TransportError>,
}

#[derive(Clone)]
struct Binding {
    event: String,
    id: BindingId,
    callback: Callback,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat this transport as signed in as `user_id` for user events.
    pub fn sign_in(&self, user_id: impl Into<String>) {
        self.state().user_id = Some(user_id.into());
    }

    /// Give this transport a connection id.
    ///
    /// Batch entries whose `socket_id` names this connection are recorded
    /// but not looped back to its bindings.
    pub fn connect_as(&self, socket_id: impl Into<String>) {
        self.state().socket_id = Some(socket_id.into());
    }

    /// Make the next fallible call fail with `err`.
    pub fn fail_next(&self, err: TransportError) {
        self.state().fail_next = Some(err);
    }

    /// Wire names currently subscribed, sorted.
    pub fn subscriptions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state().channels.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn is_subscribed(&self, channel: &str) -> bool {
        self.state().channels.contains_key(channel)
    }

    /// Every publish request received so far, in order.
    pub fn published(&self) -> Vec<Published> {
        self.state().published.clone()
    }

    /// Deliver a raw inbound event to the bindings of a subscribed channel.
    ///
    /// Returns the number of listeners invoked.
    pub fn deliver(&self, channel: &str, event: &str, payload: &Value) -> usize {
        let handle = self.state().channels.get(channel).cloned();
        match handle {
            Some(handle) => handle.dispatch(event, payload),
            None => {
                debug!(channel, event, "no subscription, event discarded");
                0
            }
        }
    }

    /// Deliver a raw user event if `user_id` is the signed-in user.
    pub fn deliver_to_user(&self, user_id: &str, event: &str, payload: &Value) -> usize {
        let callbacks: Vec<Callback> = {
            let state = self.state();
            if state.user_id.as_deref() != Some(user_id) {
                return 0;
            }
            state
                .user_bindings
                .iter()
                .filter(|binding| binding.event == event)
                .map(|binding| binding.callback.clone())
                .collect()
        };
        for callback in &callbacks {
            callback(payload);
        }
        callbacks.len()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(&self) -> Result<()> {
        match self.state().fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_binding(&self) -> BindingId {
        BindingId::new(self.inner.next_binding.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn record(&self, published: Published) {
        self.state().published.push(published);
    }
}

impl SubscribeTransport for MemoryTransport {
    type Channel = MemoryChannel;

    fn subscribe(&self, channel: &str) -> Result<MemoryChannel> {
        self.take_failure()?;
        let mut state = self.state();
        if let Some(existing) = state.channels.get(channel) {
            return Ok(existing.clone());
        }
        debug!(channel, "subscribed");
        let handle = MemoryChannel {
            name: channel.to_string(),
            bindings: Arc::new(Mutex::new(Vec::new())),
            inner: self.inner.clone(),
        };
        state.channels.insert(channel.to_string(), handle.clone());
        Ok(handle)
    }

    fn unsubscribe(&self, channel: &str) -> Result<()> {
        self.take_failure()?;
        if self.state().channels.remove(channel).is_some() {
            debug!(channel, "unsubscribed");
        }
        Ok(())
    }

    fn bind_user(&self, event: &str, callback: Callback) -> Result<BindingId> {
        self.take_failure()?;
        let id = self.next_binding();
        self.state().user_bindings.push(Binding {
            event: event.to_string(),
            id,
            callback,
        });
        Ok(id)
    }

    fn unbind_user(&self, event: Option<&str>, binding: Option<BindingId>) {
        self.state()
            .user_bindings
            .retain(|existing| !existing.matches(event, binding));
    }
}

impl PublishTransport for MemoryTransport {
    async fn trigger(
        &self,
        channels: &[String],
        event: &str,
        payload: &Value,
    ) -> Result<TriggerResponse> {
        self.take_failure()?;
        self.record(Published::Trigger {
            channels: channels.to_vec(),
            event: event.to_string(),
            payload: payload.clone(),
        });
        for channel in channels {
            self.deliver(channel, event, payload);
        }
        Ok(TriggerResponse::ok())
    }

    async fn trigger_batch(&self, batch: &[BatchEvent]) -> Result<TriggerResponse> {
        self.take_failure()?;
        self.record(Published::Batch(batch.to_vec()));
        let own_socket = self.state().socket_id.clone();
        for entry in batch {
            if own_socket.is_some() && entry.socket_id == own_socket {
                debug!(channel = %entry.channel, "sender excluded from batch entry");
                continue;
            }
            self.deliver(&entry.channel, &entry.name, &entry.data);
        }
        Ok(TriggerResponse::ok())
    }

    async fn send_to_user(
        &self,
        user_id: &str,
        event: &str,
        payload: &Value,
    ) -> Result<TriggerResponse> {
        self.take_failure()?;
        self.record(Published::User {
            user_id: user_id.to_string(),
            event: event.to_string(),
            payload: payload.clone(),
        });
        self.deliver_to_user(user_id, event, payload);
        Ok(TriggerResponse::ok())
    }
}

/// Channel handle of a [`MemoryTransport`].
#[derive(Clone)]
pub struct MemoryChannel {
    name: String,
    bindings: Arc<Mutex<Vec<Binding>>>,
    inner: Arc<Inner>,
}

impl MemoryChannel {
    /// Number of live bindings on this channel.
    pub fn binding_count(&self) -> usize {
        self.lock_bindings().len()
    }

    fn dispatch(&self, event: &str, payload: &Value) -> usize {
        // Snapshot first: listeners may bind or unbind while running.
        let callbacks: Vec<Callback> = self
            .lock_bindings()
            .iter()
            .filter(|binding| binding.event == event)
            .map(|binding| binding.callback.clone())
            .collect();
        for callback in &callbacks {
            callback(payload);
        }
        callbacks.len()
    }

    fn lock_bindings(&self) -> MutexGuard<'_, Vec<Binding>> {
        self.bindings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChannelHandle for MemoryChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&self, event: &str, callback: Callback) -> BindingId {
        let id = BindingId::new(self.inner.next_binding.fetch_add(1, Ordering::Relaxed) + 1);
        self.lock_bindings().push(Binding {
            event: event.to_string(),
            id,
            callback,
        });
        id
    }

    fn unbind(&self, event: Option<&str>, binding: Option<BindingId>) {
        self.lock_bindings()
            .retain(|existing| !existing.matches(event, binding));
    }
}

impl std::fmt::Debug for MemoryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryChannel")
            .field("name", &self.name)
            .field("bindings", &self.binding_count())
            .finish()
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("subscriptions", &self.subscriptions())
            .finish_non_exhaustive()
    }
}

impl Binding {
    fn matches(&self, event: Option<&str>, binding: Option<BindingId>) -> bool {
        event.is_none_or(|event| self.event == event) && binding.is_none_or(|id| self.id == id)
    }
}
