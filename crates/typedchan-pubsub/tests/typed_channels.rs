use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::json;
use typedchan_pubsub::{
    BatchEntry, ChannelKind, ChannelOptions, Event, TypedClient, TypedServer, UserEvent,
};
use typedchan_schema::{DroppedEvent, GateTarget, SchemaRegistry};
use typedchan_transport::{MemoryTransport, Published};

struct Room;
impl ChannelKind for Room {
    const NAME: &'static str = "room";
}

struct PrivateYolo;
impl ChannelKind for PrivateYolo {
    const NAME: &'static str = "private-yolo";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Profile {
    id: String,
    name: String,
    age: u32,
}

struct YoloEvent;
impl Event for YoloEvent {
    type Kind = PrivateYolo;
    type Payload = Profile;
    const NAME: &'static str = "event";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Notice {
    message: String,
}

struct NoticeEvent;
impl UserEvent for NoticeEvent {
    type Payload = Notice;
    const NAME: &'static str = "notice";
}

// Declared in Rust but missing from the registry.
struct Typing;
impl Event for Typing {
    type Kind = Room;
    type Payload = serde_json::Value;
    const NAME: &'static str = "typing";
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
        },
        "private-yolo": {
            "event": {
                "type": "object",
                "properties": {
                    "id": { "type": "string" },
                    "name": { "type": "string" },
                    "age": { "type": "number" }
                },
                "required": ["id", "name", "age"]
            }
        }
    },
    "user_events": {
        "notice": {
            "type": "object",
            "properties": { "message": { "type": "string" } },
            "required": ["message"]
        }
    }
}"#;

fn registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::from_manifest(MANIFEST).expect("manifest should load"))
}

fn recording<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(T) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |value: T| sink.lock().unwrap().push(value))
}

#[test]
fn room_chat_scenario() {
    let transport = MemoryTransport::new();
    let dropped = Arc::new(Mutex::new(Vec::<DroppedEvent>::new()));
    let drops = dropped.clone();
    let client = TypedClient::new(transport.clone(), registry())
        .expect("client should build")
        .with_diagnostics(Arc::new(move |event: &DroppedEvent| {
            drops.lock().unwrap().push(event.clone())
        }));

    let room = client.join::<Room>("42").expect("room should join");
    let (seen, callback) = recording::<ChatMessage>();
    room.listen::<Chat, _>(callback).expect("chat is declared");

    assert_eq!(
        transport.deliver("room.42", "chat", &json!({"id": "1", "text": "hi"})),
        1
    );
    transport.deliver("room.42", "chat", &json!({"id": "1"}));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![ChatMessage {
            id: "1".into(),
            text: "hi".into()
        }]
    );
    let dropped = dropped.lock().unwrap();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].target, GateTarget::channel("room", "chat"));
}

#[test]
fn every_valid_delivery_arrives_once_in_order() {
    let transport = MemoryTransport::new();
    let client = TypedClient::new(transport.clone(), registry()).unwrap();
    let room = client.join::<Room>(7).unwrap();
    let (seen, callback) = recording::<ChatMessage>();
    room.listen::<Chat, _>(callback).unwrap();

    for n in 0..5 {
        transport.deliver("room.7", "chat", &json!({"id": n.to_string(), "text": "x"}));
    }

    let ids: Vec<String> = seen.lock().unwrap().iter().map(|m| m.id.clone()).collect();
    assert_eq!(ids, vec!["0", "1", "2", "3", "4"]);
}

#[test]
fn events_on_other_instances_are_not_delivered() {
    let transport = MemoryTransport::new();
    let client = TypedClient::new(transport.clone(), registry()).unwrap();
    let room = client.join::<Room>("42").unwrap();
    let (seen, callback) = recording::<ChatMessage>();
    room.listen::<Chat, _>(callback).unwrap();

    transport.deliver("room.43", "chat", &json!({"id": "1", "text": "hi"}));
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn typed_event_missing_from_registry_is_an_error() {
    let client = TypedClient::new(MemoryTransport::new(), registry()).unwrap();
    let room = client.join::<Room>("42").unwrap();
    let err = room.listen::<Typing, _>(|_| {}).unwrap_err();
    assert!(err.is_undeclared());
}

#[test]
fn leave_unsubscribes_and_stops_delivery() {
    let transport = MemoryTransport::new();
    let client = TypedClient::new(transport.clone(), registry()).unwrap();
    let room = client.join::<Room>("42").unwrap();
    let (seen, callback) = recording::<ChatMessage>();
    room.listen::<Chat, _>(callback).unwrap();

    client.leave::<Room>("42").unwrap();
    assert_eq!(
        transport.deliver("room.42", "chat", &json!({"id": "1", "text": "hi"})),
        0
    );
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn unbind_event_removes_every_typed_listener() {
    let transport = MemoryTransport::new();
    let client = TypedClient::new(transport.clone(), registry()).unwrap();
    let room = client.join::<Room>("42").unwrap();
    let (first, first_callback) = recording::<ChatMessage>();
    let (second, second_callback) = recording::<ChatMessage>();
    room.listen::<Chat, _>(first_callback).unwrap();
    room.listen::<Chat, _>(second_callback).unwrap();

    room.unbind_event::<Chat>();
    assert_eq!(
        transport.deliver("room.42", "chat", &json!({"id": "1", "text": "hi"})),
        0
    );
    assert!(first.lock().unwrap().is_empty());
    assert!(second.lock().unwrap().is_empty());
}

#[test]
fn typed_channel_unwraps_to_string_keyed_channel() {
    let transport = MemoryTransport::new();
    let client = TypedClient::new(transport.clone(), registry()).unwrap();
    let channel = client.join::<Room>(42).unwrap().into_inner();
    assert_eq!(channel.kind(), "room");
    assert_eq!(channel.wire_name(), "room.42");

    let (seen, callback) = recording::<serde_json::Value>();
    channel.listen("chat", callback).unwrap();
    transport.deliver("room.42", "chat", &json!({"id": "1", "text": "hi"}));
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn publish_forwards_encoded_trigger() {
    let transport = MemoryTransport::new();
    let server = TypedServer::new(transport.clone(), registry()).unwrap();

    server
        .publish_event::<Chat>(
            "42",
            &ChatMessage {
                id: "1".into(),
                text: "hi".into(),
            },
        )
        .await
        .unwrap();
    server
        .publish_event::<Chat>(
            vec!["42", "43"],
            &ChatMessage {
                id: "2".into(),
                text: "yo".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(
        transport.published(),
        vec![
            Published::Trigger {
                channels: vec!["room.42".into()],
                event: "chat".into(),
                payload: json!({"id": "1", "text": "hi"}),
            },
            Published::Trigger {
                channels: vec!["room.42".into(), "room.43".into()],
                event: "chat".into(),
                payload: json!({"id": "2", "text": "yo"}),
            },
        ]
    );
}

#[tokio::test]
async fn server_publish_reaches_client_listener() {
    let transport = MemoryTransport::new();
    let options = ChannelOptions {
        separator: "@".parse().unwrap(),
        ..ChannelOptions::default()
    };
    let client = TypedClient::with_options(transport.clone(), registry(), options).unwrap();
    let server = TypedServer::with_options(transport.clone(), registry(), options).unwrap();

    let yolo = client.join::<PrivateYolo>(5).unwrap();
    let (seen, callback) = recording::<Profile>();
    yolo.listen::<YoloEvent, _>(callback).unwrap();
    assert_eq!(yolo.wire_name(), "private-yolo@5");

    let profile = Profile {
        id: "u1".into(),
        name: "Ada".into(),
        age: 36,
    };
    server
        .publish_event::<YoloEvent>(5, &profile)
        .await
        .unwrap();
    // Untyped publish with a payload the schema rejects.
    server
        .publish("private-yolo", 5, "event", &json!({"id": "u2"}))
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![profile]);
}

#[tokio::test]
async fn batch_preserves_order_and_count() {
    let transport = MemoryTransport::new();
    let server = TypedServer::new(transport.clone(), registry()).unwrap();

    let entries: Vec<BatchEntry> = (0..4)
        .map(|n| {
            BatchEntry::typed::<Chat>(
                n,
                &ChatMessage {
                    id: n.to_string(),
                    text: "x".into(),
                },
            )
            .unwrap()
        })
        .collect();
    server.publish_batch(entries).await.unwrap();

    let published = transport.published();
    let [Published::Batch(batch)] = published.as_slice() else {
        panic!("expected a single batch, got {published:?}");
    };
    assert_eq!(batch.len(), 4);
    for (n, entry) in batch.iter().enumerate() {
        assert_eq!(entry.channel, format!("room.{n}"));
        assert_eq!(entry.name, "chat");
        assert_eq!(entry.data["id"], json!(n.to_string()));
    }
}

#[tokio::test]
async fn user_events_round_trip_through_member_binding() {
    let transport = MemoryTransport::new();
    transport.sign_in("alice");
    let client = TypedClient::new(transport.clone(), registry()).unwrap();
    let server = TypedServer::new(transport.clone(), registry()).unwrap();

    let (seen, callback) = recording::<Notice>();
    client.member().bind_event::<NoticeEvent, _>(callback).unwrap();

    server
        .send_user_event::<NoticeEvent>(
            "alice",
            &Notice {
                message: "hello".into(),
            },
        )
        .await
        .unwrap();
    server
        .send_to_user("alice", "notice", &json!({"message": 5}))
        .await
        .unwrap();
    server
        .send_user_event::<NoticeEvent>(
            "bob",
            &Notice {
                message: "not for alice".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![Notice {
            message: "hello".into()
        }]
    );
}

#[test]
fn introspection_matches_declaration() {
    let server = TypedServer::new(MemoryTransport::new(), registry()).unwrap();
    assert_eq!(server.list_channel_kinds(), vec!["room", "private-yolo"]);
    assert_eq!(server.list_restricted_channel_kinds(), vec!["private-yolo"]);
    assert!(server.list_presence_channel_kinds().is_empty());
}
