//! Chat room over the in-memory transport: one client joins `room.42`, the
//! server publishes a valid and an invalid message, and only the valid one
//! reaches the listener.
//!
//! Run with:
//!   cargo run --example chat-room

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use typedchan::pubsub::{ChannelKind, Event, TypedClient, TypedServer};
use typedchan::schema::{DroppedEvent, SchemaRegistry};
use typedchan::transport::MemoryTransport;

struct Room;
impl ChannelKind for Room {
    const NAME: &'static str = "room";
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    id: String,
    text: String,
}

struct Chat;
impl Event for Chat {
    type Kind = Room;
    type Payload = ChatMessage;
    const NAME: &'static str = "chat";
}

const MANIFEST: &str = r#"{
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
    }
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = Arc::new(SchemaRegistry::from_manifest(MANIFEST)?);
    let transport = MemoryTransport::new();

    let sink = Arc::new(|dropped: &DroppedEvent| {
        eprintln!("dropped {}: {}", dropped.target, dropped.reason);
    });
    let client = TypedClient::new(transport.clone(), registry.clone())?
        .with_diagnostics(sink);
    let server = TypedServer::new(transport, registry)?;

    let room = client.join::<Room>("42")?;
    room.listen::<Chat, _>(|message| {
        eprintln!("[{}] {}", message.id, message.text);
    })?;
    eprintln!("joined {}", room.wire_name());

    server
        .publish_event::<Chat>(
            "42",
            &ChatMessage {
                id: "1".into(),
                text: "hello".into(),
            },
        )
        .await?;
    server
        .publish("room", "42", "chat", &serde_json::json!({ "id": "2" }))
        .await?;

    eprintln!("kinds: {:?}", server.list_channel_kinds());
    Ok(())
}
