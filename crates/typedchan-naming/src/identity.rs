use std::fmt;

use serde::{Deserialize, Serialize};

use crate::separator::Separator;

/// Caller-chosen identifier of one channel instance (room id, user id, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InstanceId {
    Int(i64),
    Str(String),
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceId::Int(id) => write!(f, "{id}"),
            InstanceId::Str(id) => f.write_str(id),
        }
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        InstanceId::Str(id.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(id: String) -> Self {
        InstanceId::Str(id)
    }
}

impl From<&String> for InstanceId {
    fn from(id: &String) -> Self {
        InstanceId::Str(id.clone())
    }
}

impl From<i64> for InstanceId {
    fn from(id: i64) -> Self {
        InstanceId::Int(id)
    }
}

impl From<i32> for InstanceId {
    fn from(id: i32) -> Self {
        InstanceId::Int(i64::from(id))
    }
}

impl From<u32> for InstanceId {
    fn from(id: u32) -> Self {
        InstanceId::Int(i64::from(id))
    }
}

impl From<u64> for InstanceId {
    fn from(id: u64) -> Self {
        match i64::try_from(id) {
            Ok(id) => InstanceId::Int(id),
            Err(_) => InstanceId::Str(id.to_string()),
        }
    }
}

/// The single string a transport subscribes to or publishes against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireChannelName(String);

impl WireChannelName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Split at the first separator occurrence.
    ///
    /// Only meant for diagnostics: a kind or id containing the separator makes
    /// the split ambiguous, and none of the publish/subscribe paths decode
    /// wire names.
    pub fn split_kind(&self, separator: Separator) -> Option<(&str, &str)> {
        self.0.split_once(separator.as_char())
    }
}

impl fmt::Display for WireChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WireChannelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<WireChannelName> for String {
    fn from(name: WireChannelName) -> Self {
        name.0
    }
}

impl PartialEq<str> for WireChannelName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for WireChannelName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Encode a channel kind and instance id into a wire channel name.
pub fn encode(kind: &str, instance: &InstanceId, separator: Separator) -> WireChannelName {
    WireChannelName(format!("{kind}{}{instance}", separator.as_char()))
}

/// A (channel kind, instance id) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelIdentity {
    pub kind: String,
    pub instance: InstanceId,
}

impl ChannelIdentity {
    pub fn new(kind: impl Into<String>, instance: impl Into<InstanceId>) -> Self {
        Self {
            kind: kind.into(),
            instance: instance.into(),
        }
    }

    pub fn wire_name(&self, separator: Separator) -> WireChannelName {
        encode(&self.kind, &self.instance, separator)
    }
}

/// One or many instances targeted by a single publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelTargets {
    One(InstanceId),
    Many(Vec<InstanceId>),
}

impl ChannelTargets {
    pub fn iter(&self) -> std::slice::Iter<'_, InstanceId> {
        match self {
            ChannelTargets::One(id) => std::slice::from_ref(id).iter(),
            ChannelTargets::Many(ids) => ids.iter(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChannelTargets::One(_) => 1,
            ChannelTargets::Many(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encode every target of `kind`, preserving order.
    pub fn wire_names(&self, kind: &str, separator: Separator) -> Vec<WireChannelName> {
        self.iter().map(|id| encode(kind, id, separator)).collect()
    }
}

macro_rules! impl_targets_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ChannelTargets {
                fn from(id: $ty) -> Self {
                    ChannelTargets::One(id.into())
                }
            }

            impl From<Vec<$ty>> for ChannelTargets {
                fn from(ids: Vec<$ty>) -> Self {
                    ChannelTargets::Many(ids.into_iter().map(Into::into).collect())
                }
            }

            impl From<&[$ty]> for ChannelTargets {
                fn from(ids: &[$ty]) -> Self {
                    ChannelTargets::Many(ids.iter().cloned().map(Into::into).collect())
                }
            }

            impl<const N: usize> From<[$ty; N]> for ChannelTargets {
                fn from(ids: [$ty; N]) -> Self {
                    ChannelTargets::Many(ids.into_iter().map(Into::into).collect())
                }
            }
        )*
    };
}

impl_targets_from!(&str, String, i64, i32, u32, u64);

impl From<InstanceId> for ChannelTargets {
    fn from(id: InstanceId) -> Self {
        ChannelTargets::One(id)
    }
}

impl From<Vec<InstanceId>> for ChannelTargets {
    fn from(ids: Vec<InstanceId>) -> Self {
        ChannelTargets::Many(ids)
    }
}
