// Generic response documents: decoding, the `error` marker, and paging metadata.

use serde_json::Value;
use tracing::debug;

use crate::error::Result;

/// Parse a raw response body into a generic JSON tree.
pub fn decode(raw: &str) -> Result<Value> {
    Ok(serde_json::from_str(raw)?)
}

/// The `error` member of a response, when the API reported one.
pub fn error_marker(doc: &Value) -> Option<&Value> {
    present(doc, "error")
}

/// The cursor link to the next page. Missing or empty `paging.next` ends the walk.
pub fn next_link(doc: &Value) -> Option<String> {
    doc.get("paging")
        .and_then(|paging| paging.get("next"))
        .and_then(Value::as_str)
        .filter(|link| !link.is_empty())
        .map(str::to_string)
}

/// The `data` items of a page. Empty when the page carries none.
pub fn items(doc: &Value) -> &[Value] {
    doc.get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// A child subtree that exists and carries content. Null, `false`, zero and
/// empty strings/arrays/objects all count as absent.
pub fn present<'a>(doc: &'a Value, key: &str) -> Option<&'a Value> {
    doc.get(key).filter(|child| is_truthy(child))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Best-effort non-negative count. Accepts numbers and numeric strings.
pub(crate) fn count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or_else(|| {
            // Float counts (`10.0`) truncate; negatives and non-finite values drop to 0.
            match n.as_f64() {
                Some(f) if f.is_finite() && f >= 0.0 => f as u64,
                _ => {
                    debug!(value = %n, "Dropping count that is not a non-negative number");
                    0
                }
            }
        }),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

/// Best-effort identifier/text field. Numbers are rendered as strings.
pub(crate) fn text(doc: &Value, key: &str) -> Option<String> {
    match doc.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
