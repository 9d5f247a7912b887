//! The document envelope and the server-timestamp write sentinel.

use std::cmp::Ordering;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Marker key identifying a server-timestamp sentinel inside a write payload.
pub const SERVER_TIMESTAMP_KEY: &str = "__serverTimestamp";

/// Sentinel usable as a top-level field value on write; the store replaces
/// it with the current time (epoch milliseconds) when the write commits.
pub fn server_timestamp() -> Value {
    json!({ SERVER_TIMESTAMP_KEY: true })
}

pub(crate) fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.len() == 1 && obj.get(SERVER_TIMESTAMP_KEY) == Some(&Value::Bool(true)))
}

/// One keyed document as read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Id within its collection.
    pub id: String,
    /// The stored payload, always a JSON object.
    pub data: Value,
}

impl Document {
    /// Decode the payload into a typed model.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }

    /// Read a single top-level field, if present.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

/// Field ordering used by `order_by` queries: numbers before strings,
/// missing fields first, everything else in insertion order.
pub(crate) fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::Number(_), _) => Ordering::Less,
            (_, Value::Number(_)) => Ordering::Greater,
            (Value::String(x), Value::String(y)) => x.cmp(y),
            _ => Ordering::Equal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_detection() {
        assert!(is_server_timestamp(&server_timestamp()));
        assert!(!is_server_timestamp(&json!(1_700_000_000_000i64)));
        assert!(!is_server_timestamp(
            &json!({ SERVER_TIMESTAMP_KEY: true, "extra": 1 })
        ));
    }

    #[test]
    fn test_field_ordering() {
        let a = json!(1);
        let b = json!(2);
        assert_eq!(compare_fields(Some(&a), Some(&b)), Ordering::Less);
        assert_eq!(compare_fields(Some(&b), Some(&a)), Ordering::Greater);
        assert_eq!(compare_fields(None, Some(&a)), Ordering::Less);

        let s1 = json!("apple");
        let s2 = json!("banana");
        assert_eq!(compare_fields(Some(&s1), Some(&s2)), Ordering::Less);
        assert_eq!(compare_fields(Some(&a), Some(&s1)), Ordering::Less);
    }
}
