use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use jsonschema::Validator;
use serde_json::{Map, Value};
use typedchan_naming::Separator;

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::gate::{validate, GateTarget};
use crate::strict::close_objects;

const MANIFEST_CHANNELS: &str = "channels";
const MANIFEST_USER_EVENTS: &str = "user_events";

/// A compiled payload schema for one event.
pub struct EventSchema {
    document: Value,
    validator: Validator,
}

impl EventSchema {
    /// Compile a JSON Schema document, applying strict mode if configured.
    pub fn compile(target: &GateTarget, document: &Value, config: &RegistryConfig) -> Result<Self> {
        let mut document = document.clone();
        if config.strict_mode {
            close_objects(&mut document);
        }

        let validator =
            jsonschema::validator_for(&document).map_err(|err| SchemaError::CompileFailed {
                target: target.clone(),
                message: err.to_string(),
            })?;

        Ok(Self {
            document,
            validator,
        })
    }

    /// Schema document as compiled (after strict mode rewriting).
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn is_valid(&self, payload: &Value) -> bool {
        self.validator.is_valid(payload)
    }
}

impl fmt::Debug for EventSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

/// Event name -> schema, remembering declaration order.
#[derive(Debug, Default)]
struct EventTable {
    order: Vec<String>,
    schemas: HashMap<String, EventSchema>,
}

impl EventTable {
    /// Returns true if the event was not declared before.
    fn insert(&mut self, event: &str, schema: EventSchema) -> bool {
        let fresh = self.schemas.insert(event.to_string(), schema).is_none();
        if fresh {
            self.order.push(event.to_string());
        }
        fresh
    }

    fn get(&self, event: &str) -> Option<&EventSchema> {
        self.schemas.get(event)
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

#[derive(Debug)]
struct ChannelDeclaration {
    kind: String,
    events: EventTable,
}

/// Immutable map of channel kinds to event schemas, plus user-event schemas.
///
/// Built once through [`SchemaRegistryBuilder`] or from a manifest, then
/// shared read-only (typically behind an `Arc`).
#[derive(Debug)]
pub struct SchemaRegistry {
    channels: Vec<ChannelDeclaration>,
    index: HashMap<String, usize>,
    user_events: EventTable,
    config: RegistryConfig,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::new()
    }

    /// Build a registry from a manifest JSON string with default config.
    ///
    /// ```json
    /// {
    ///   "channels": { "room": { "chat": { "type": "object" } } },
    ///   "user_events": { "notice": { "type": "string" } }
    /// }
    /// ```
    pub fn from_manifest(manifest_json: &str) -> Result<Self> {
        Self::from_manifest_with_config(manifest_json, RegistryConfig::default())
    }

    pub fn from_manifest_with_config(manifest_json: &str, config: RegistryConfig) -> Result<Self> {
        let manifest: Value = serde_json::from_str(manifest_json)?;
        Self::from_manifest_value(&manifest, config)
    }

    /// Build a registry from an already parsed manifest.
    pub fn from_manifest_value(manifest: &Value, config: RegistryConfig) -> Result<Self> {
        let root = manifest
            .as_object()
            .ok_or_else(|| SchemaError::InvalidManifest("manifest must be an object".into()))?;

        for key in root.keys() {
            if key != MANIFEST_CHANNELS && key != MANIFEST_USER_EVENTS && !key.starts_with('$') {
                return Err(SchemaError::InvalidManifest(format!(
                    "unknown top-level key {key:?}"
                )));
            }
        }

        let mut builder = SchemaRegistryBuilder::with_config(config);

        let channels = root.get(MANIFEST_CHANNELS).ok_or_else(|| {
            SchemaError::InvalidManifest(format!("missing {MANIFEST_CHANNELS:?} object"))
        })?;
        for (kind, events) in object_entry(channels, MANIFEST_CHANNELS)? {
            let events = object_entry(events, kind)?;
            if events.is_empty() {
                builder.declare_channel(kind)?;
            }
            for (event, schema) in events {
                builder.register_event_value(kind, event, schema)?;
            }
        }

        if let Some(user_events) = root.get(MANIFEST_USER_EVENTS) {
            for (event, schema) in object_entry(user_events, MANIFEST_USER_EVENTS)? {
                builder.register_user_event_value(event, schema)?;
            }
        }

        builder.build()
    }

    /// Load a manifest file with default config.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_config(path, RegistryConfig::default())
    }

    /// Load a manifest file with explicit config.
    ///
    /// Symlinks are refused and the file size is capped at
    /// `config.max_manifest_size`.
    pub fn from_file_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let metadata = std::fs::symlink_metadata(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
        if metadata.file_type().is_symlink() {
            return Err(SchemaError::LoadFailed(format!(
                "refusing to load manifest symlink: {}",
                path.display()
            )));
        }
        if !metadata.is_file() {
            return Err(SchemaError::LoadFailed(format!(
                "not a regular file: {}",
                path.display()
            )));
        }
        if metadata.len() > config.max_manifest_size as u64 {
            return Err(SchemaError::LoadFailed(format!(
                "manifest too large ({} bytes, max {}): {}",
                metadata.len(),
                config.max_manifest_size,
                path.display()
            )));
        }

        let file = std::fs::File::open(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
        let read_limit =
            u64::try_from(config.max_manifest_size.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
        if content.len() > config.max_manifest_size {
            return Err(SchemaError::LoadFailed(format!(
                "manifest grew while reading: {}",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), bytes = content.len(), "loading manifest");
        Self::from_manifest_with_config(&content, config)
    }

    /// Look up the schema of an event on a channel kind.
    pub fn event_schema(&self, kind: &str, event: &str) -> Result<&EventSchema> {
        let declaration = self.channel(kind)?;
        declaration
            .events
            .get(event)
            .ok_or_else(|| SchemaError::UndeclaredEvent {
                channel: kind.to_string(),
                event: event.to_string(),
            })
    }

    /// Look up the schema of a user-targeted event.
    pub fn user_event_schema(&self, event: &str) -> Result<&EventSchema> {
        self.user_events
            .get(event)
            .ok_or_else(|| SchemaError::UndeclaredUserEvent(event.to_string()))
    }

    /// Look up the schema of whatever `target` names.
    pub fn schema_for(&self, target: &GateTarget) -> Result<&EventSchema> {
        match target {
            GateTarget::Channel { kind, event } => self.event_schema(kind, event),
            GateTarget::User { event } => self.user_event_schema(event),
        }
    }

    /// Validate a channel event payload.
    pub fn validate(&self, kind: &str, event: &str, payload: &Value) -> Result<()> {
        let schema = self.event_schema(kind, event)?;
        validate(&GateTarget::channel(kind, event), schema, payload)
    }

    /// Validate a user event payload.
    pub fn validate_user_event(&self, event: &str, payload: &Value) -> Result<()> {
        let schema = self.user_event_schema(event)?;
        validate(&GateTarget::user(event), schema, payload)
    }

    pub fn has_channel(&self, kind: &str) -> bool {
        self.index.contains_key(kind)
    }

    pub fn has_event(&self, kind: &str, event: &str) -> bool {
        self.event_schema(kind, event).is_ok()
    }

    /// Declared channel kinds in declaration order.
    pub fn channel_kinds(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|decl| decl.kind.as_str())
    }

    /// Events declared on a channel kind, in declaration order.
    pub fn events(&self, kind: &str) -> Result<Vec<&str>> {
        Ok(self.channel(kind)?.events.names().collect())
    }

    /// Declared user events in declaration order.
    pub fn user_events(&self) -> Vec<&str> {
        self.user_events.names().collect()
    }

    /// Number of declared channel kinds.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Check that no channel kind contains `separator`.
    ///
    /// Wire names are never decoded, but a kind containing the separator
    /// makes two identities able to share one wire name.
    pub fn check_separator(&self, separator: Separator) -> Result<()> {
        match self
            .channel_kinds()
            .find(|kind| kind.contains(separator.as_char()))
        {
            Some(kind) => Err(SchemaError::AmbiguousKind {
                kind: kind.to_string(),
                separator,
            }),
            None => Ok(()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn channel(&self, kind: &str) -> Result<&ChannelDeclaration> {
        self.index
            .get(kind)
            .map(|&idx| &self.channels[idx])
            .ok_or_else(|| SchemaError::UndeclaredChannel(kind.to_string()))
    }
}

/// Collects declarations and compiles them into a [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    channels: Vec<ChannelDeclaration>,
    index: HashMap<String, usize>,
    user_events: EventTable,
    config: RegistryConfig,
    separator: Option<Separator>,
    schema_count: usize,
}

impl SchemaRegistryBuilder {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Reject kinds containing `separator` at [`build`](Self::build) time.
    pub fn with_separator(mut self, separator: Separator) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Declare a channel kind without events yet.
    pub fn declare_channel(&mut self, kind: &str) -> Result<&mut Self> {
        self.channel_mut(kind)?;
        Ok(self)
    }

    /// Register an event schema from a JSON string.
    pub fn register_event(
        &mut self,
        kind: &str,
        event: &str,
        schema_json: &str,
    ) -> Result<&mut Self> {
        let schema: Value = serde_json::from_str(schema_json)?;
        self.register_event_value(kind, event, &schema)
    }

    /// Register an event schema from a JSON value.
    ///
    /// Registering the same (kind, event) twice replaces the schema and keeps
    /// the original declaration position.
    pub fn register_event_value(
        &mut self,
        kind: &str,
        event: &str,
        schema: &Value,
    ) -> Result<&mut Self> {
        check_name("event", event)?;
        let target = GateTarget::channel(kind, event);
        let compiled = EventSchema::compile(&target, schema, &self.config)?;
        let config = self.config;
        let declaration = self.channel_mut(kind)?;
        if declaration.events.insert(event, compiled) {
            bump_count(&mut self.schema_count, &config)?;
        }
        Ok(self)
    }

    /// Register a user-targeted event schema from a JSON string.
    pub fn register_user_event(&mut self, event: &str, schema_json: &str) -> Result<&mut Self> {
        let schema: Value = serde_json::from_str(schema_json)?;
        self.register_user_event_value(event, &schema)
    }

    /// Register a user-targeted event schema from a JSON value.
    pub fn register_user_event_value(&mut self, event: &str, schema: &Value) -> Result<&mut Self> {
        check_name("user event", event)?;
        let compiled = EventSchema::compile(&GateTarget::user(event), schema, &self.config)?;
        if self.user_events.insert(event, compiled) {
            bump_count(&mut self.schema_count, &self.config)?;
        }
        Ok(self)
    }

    pub fn build(self) -> Result<SchemaRegistry> {
        let registry = SchemaRegistry {
            channels: self.channels,
            index: self.index,
            user_events: self.user_events,
            config: self.config,
        };
        if let Some(separator) = self.separator {
            registry.check_separator(separator)?;
        }
        Ok(registry)
    }

    fn channel_mut(&mut self, kind: &str) -> Result<&mut ChannelDeclaration> {
        check_kind(kind)?;
        let idx = match self.index.get(kind) {
            Some(&idx) => idx,
            None => {
                self.channels.push(ChannelDeclaration {
                    kind: kind.to_string(),
                    events: EventTable::default(),
                });
                let idx = self.channels.len() - 1;
                self.index.insert(kind.to_string(), idx);
                idx
            }
        };
        Ok(&mut self.channels[idx])
    }
}

fn check_name(what: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SchemaError::InvalidName(format!("{what} must not be empty")));
    }
    Ok(())
}

/// Kinds end up in wire channel names, which cannot carry whitespace.
fn check_kind(kind: &str) -> Result<()> {
    check_name("channel kind", kind)?;
    if kind.chars().any(char::is_whitespace) {
        return Err(SchemaError::InvalidName(format!(
            "channel kind {kind:?} must not contain whitespace"
        )));
    }
    Ok(())
}

fn bump_count(count: &mut usize, config: &RegistryConfig) -> Result<()> {
    *count = count.saturating_add(1);
    if *count > config.max_schema_count {
        return Err(SchemaError::LoadFailed(format!(
            "schema count exceeds configured max ({})",
            config.max_schema_count
        )));
    }
    Ok(())
}

fn object_entry<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| SchemaError::InvalidManifest(format!("{what:?} must be an object")))
}
