use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use typedchan_schema::{GateTarget, PayloadGate, SchemaRegistry};
use typedchan_transport::Callback;

/// Wrap `callback` so it only sees payloads that pass the gate for `target`.
///
/// The caller checks that `target` is declared before binding; the registry is
/// immutable, so the lookup inside the wrapper cannot start failing later.
pub(crate) fn gated<P, F>(
    registry: Arc<SchemaRegistry>,
    gate: PayloadGate,
    target: GateTarget,
    callback: F,
) -> Callback
where
    P: DeserializeOwned,
    F: Fn(P) + Send + Sync + 'static,
{
    Arc::new(move |raw: &Value| {
        let Ok(schema) = registry.schema_for(&target) else {
            return;
        };
        if let Some(payload) = gate.admit_as::<P>(&target, schema, raw) {
            callback(payload);
        }
    })
}
