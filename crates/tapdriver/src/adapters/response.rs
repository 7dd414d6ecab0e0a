//! The `{sessionId, status, value}` envelope every command answers with.

use serde::Serialize;
use serde_json::Value;
use tapdriver_common::status_codes::SUCCESS;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireResponse {
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub status: i32,
    pub value: Value,
}

impl WireResponse {
    pub fn success(session_id: Option<&str>, value: Value) -> Self {
        Self {
            session_id: session_id.map(str::to_string),
            status: SUCCESS,
            value,
        }
    }

    pub fn error(session_id: Option<&str>, status: i32, body: Value) -> Self {
        Self {
            session_id: session_id.map(str::to_string),
            status,
            value: body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SUCCESS
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn to_body(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|_| b"{}".to_vec())
    }
}
