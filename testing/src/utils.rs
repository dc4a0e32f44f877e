use gatecore::Context;
use serde_json::Value;

pub fn is_send_sync<T: Send + Sync>(_: &T) -> bool {
    true
}

/// Converts a `serde_json::json!` object into a `Context`; anything
/// other than an object produces an empty context.
pub fn context(value: Value) -> Context {
    match value {
        Value::Object(map) => map,
        _ => Context::new(),
    }
}
