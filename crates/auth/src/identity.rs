use serde::{Deserialize, Serialize};
use serde_json::Value;

use tonerdesk_core::UserId;

/// Identity of the logged-in user, as handed over by the login flow.
///
/// `raw` keeps the upstream user payload untouched; the console core never
/// interprets it beyond the typed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub display_name: String,
    #[serde(default)]
    pub raw: Value,
}

impl Identity {
    pub fn new(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            raw: Value::Null,
        }
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = raw;
        self
    }

    /// Look up a field of the raw upstream payload.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }
}
