use serde_json::{Map, Value};

use crate::error::PushError;

/// Top-level key every APNs payload is nested under
pub const APS_KEY: &str = "aps";

/// Key set to `1` for background (silent) pushes
pub const CONTENT_AVAILABLE_KEY: &str = "content-available";

/// Structured inputs for [`Payload::from_fields`]
#[derive(Debug, Clone, Default)]
pub struct PayloadFields {
    pub alert: Option<String>,
    pub sound: Option<String>,
    pub badge: Option<u32>,
    pub background: bool,
    /// Base dictionary the other fields are layered onto
    pub content: Option<Map<String, Value>>,
}

/// Notification body, serialized as `{"aps": {...}}`
///
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Payload {
    dictionary: Map<String, Value>,
}

impl Payload {
    /// Wraps a free-form dictionary as-is
    pub fn new(raw: Map<String, Value>) -> Self {
        Self { dictionary: raw }
    }

    /// Builds a payload from structured fields.
    ///
    /// Fields that are not supplied are left out entirely rather than
    /// serialized as `null`.
    pub fn from_fields(fields: PayloadFields) -> Self {
        let mut dictionary = fields.content.unwrap_or_default();

        if let Some(alert) = fields.alert {
            dictionary.insert("alert".to_string(), Value::String(alert));
        }
        if let Some(sound) = fields.sound {
            dictionary.insert("sound".to_string(), Value::String(sound));
        }
        if let Some(badge) = fields.badge {
            dictionary.insert("badge".to_string(), Value::from(badge));
        }
        if fields.background {
            dictionary.insert(CONTENT_AVAILABLE_KEY.to_string(), Value::from(1));
        }

        Self { dictionary }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self::from_fields(PayloadFields {
            alert: Some(text.into()),
            ..Default::default()
        })
    }

    /// Silent push that wakes the app without user-visible content
    pub fn background() -> Self {
        Self::from_fields(PayloadFields {
            background: true,
            ..Default::default()
        })
    }

    pub fn default_alert() -> Self {
        Self::alert("This is a test notification. You passed.")
    }

    pub fn default_sound() -> Self {
        Self::from_fields(PayloadFields {
            sound: Some("default".to_string()),
            ..Default::default()
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.dictionary.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.dictionary
    }

    pub fn is_background(&self) -> bool {
        self.dictionary.get(CONTENT_AVAILABLE_KEY) == Some(&Value::from(1))
    }

    /// The full document sent on the wire
    pub fn to_json(&self) -> Value {
        let mut root = Map::with_capacity(1);
        root.insert(APS_KEY.to_string(), Value::Object(self.dictionary.clone()));
        Value::Object(root)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PushError> {
        Ok(serde_json::to_vec(&self.to_json())?)
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(raw: Map<String, Value>) -> Self {
        Self::new(raw)
    }
}
