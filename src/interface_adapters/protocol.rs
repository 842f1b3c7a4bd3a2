// Wire shapes the adapter reads outside the validated envelope path.

use serde::Deserialize;
use serde_json::Value;

// Error envelope sent with non-2xx responses. Every field is best effort.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub code: Option<Value>,
}

impl ErrorBody {
    pub fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    // Only text messages are shown; anything else is dropped on its own.
    pub fn message(&self) -> Option<String> {
        match self.message.as_ref()? {
            Value::String(message) => {
                let message = message.trim();
                (!message.is_empty()).then(|| message.to_string())
            }
            _ => None,
        }
    }

    // Codes arrive as text or numbers depending on the endpoint.
    pub fn code(&self) -> Option<String> {
        match self.code.as_ref()? {
            Value::String(code) => Some(code.clone()),
            Value::Number(code) => Some(code.to_string()),
            _ => None,
        }
    }
}
