//! Read-only queries over the declared channel kinds.

use serde::Serialize;
use typedchan_naming::{is_presence, is_restricted, ChannelVisibility};

use crate::registry::SchemaRegistry;

/// Every declared channel kind, in declaration order.
pub fn channel_kinds(registry: &SchemaRegistry) -> Vec<&str> {
    registry.channel_kinds().collect()
}

/// Declared kinds carrying the `private-` prefix (encrypted included).
pub fn restricted_channel_kinds(registry: &SchemaRegistry) -> Vec<&str> {
    registry
        .channel_kinds()
        .filter(|kind| is_restricted(kind))
        .collect()
}

/// Declared kinds carrying the `presence-` prefix.
pub fn presence_channel_kinds(registry: &SchemaRegistry) -> Vec<&str> {
    registry
        .channel_kinds()
        .filter(|kind| is_presence(kind))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSummary {
    pub kind: String,
    pub visibility: &'static str,
    pub events: Vec<String>,
}

/// One summary per declared kind, in declaration order.
pub fn describe(registry: &SchemaRegistry) -> Vec<ChannelSummary> {
    registry
        .channel_kinds()
        .map(|kind| ChannelSummary {
            kind: kind.to_string(),
            visibility: ChannelVisibility::of(kind).as_str(),
            events: registry
                .events(kind)
                .unwrap_or_default()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
        .collect()
}
