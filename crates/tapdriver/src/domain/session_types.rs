use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Opaque identifier of the single active session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    Empty,
    Whitespace,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::Empty => write!(f, "identifier cannot be empty"),
            IdError::Whitespace => write!(f, "identifier cannot contain whitespace"),
        }
    }
}

impl std::error::Error for IdError {}

fn validate_id(value: &str) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty);
    }
    if value.chars().any(char::is_whitespace) {
        return Err(IdError::Whitespace);
    }
    Ok(())
}

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn try_new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        validate_id(&id)?;
        Ok(Self(id))
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for SessionId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Opaque element handle handed to clients; resolved through the element registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Key under which handles travel on the wire.
    pub const WIRE_KEY: &'static str = "ELEMENT";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `{"ELEMENT": id}`.
    pub fn to_wire(&self) -> Value {
        let mut map = Map::new();
        map.insert(Self::WIRE_KEY.to_string(), Value::String(self.0.clone()));
        Value::Object(map)
    }

    /// Accepts a bare string or number, or the `{"ELEMENT": id}` object.
    pub fn from_wire(value: &Value) -> Option<Self> {
        match value {
            Value::String(id) if !id.is_empty() => Some(Self::new(id.as_str())),
            Value::Number(n) => Some(Self::new(n.to_string())),
            Value::Object(map) => map
                .get(Self::WIRE_KEY)
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(Self::new),
            _ => None,
        }
    }

    pub fn try_new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        validate_id(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for ElementId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for ElementId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Desired capabilities, frozen at session creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(Map<String, Value>);

impl Capabilities {
    pub const NATIVE_EVENTS: &'static str = "nativeEvents";

    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn native_events(&self) -> bool {
        self.bool_or(Self::NATIVE_EVENTS, true)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for Capabilities {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_id_try_new_rejects_empty() {
        assert_eq!(SessionId::try_new(""), Err(IdError::Empty));
        assert_eq!(SessionId::try_new("a b"), Err(IdError::Whitespace));
        assert!(SessionId::try_new("abc").is_ok());
    }

    #[test]
    fn test_generated_session_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn test_element_id_serializes_transparently() {
        let id = ElementId::new("42");
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("42"));
    }

    #[test]
    fn test_native_events_defaults_to_true() {
        let caps = Capabilities::default();
        assert!(caps.native_events());

        let caps: Capabilities = serde_json::from_value(json!({ "nativeEvents": false })).unwrap();
        assert!(!caps.native_events());
    }
}
