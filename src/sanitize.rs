//! Store-operator injection defense.
//!
//! Parsed JSON bodies pass through here before any handler sees them: object
//! keys beginning with `$` are dropped outright and `.` in keys is rewritten
//! to `_`, so nothing in a request body can be interpreted as a query
//! operator or a path expression by the persistence layer.

use serde_json::{Map, Value};

pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut clean = Map::with_capacity(map.len());
            for (key, inner) in map {
                if key.starts_with('$') {
                    continue;
                }
                let key = if key.contains('.') {
                    key.replace('.', "_")
                } else {
                    key
                };
                clean.insert(key, sanitize_value(inner));
            }
            Value::Object(clean)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        other => other,
    }
}
