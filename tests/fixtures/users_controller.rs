//! Users resource, as it would live in `controllers/v1/users.rs`.

use serde_json::{json, Map, Value};

pub async fn read(options: Map<String, Value>, _meta: Map<String, Value>) -> Value {
    json!({ "id": options.get("id") })
}

pub async fn create(options: Map<String, Value>, meta: Map<String, Value>) -> Value {
    json!({ "created": options, "by": meta.get("user") })
}

pub async fn destroy(_options: Map<String, Value>, _meta: Map<String, Value>) -> Value {
    Value::Null
}

fn audit(_event: &str) {}
