use serde::{Deserialize, Serialize};

use super::session_types::ElementId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PORTRAIT" => Some(Orientation::Portrait),
            "LANDSCAPE" => Some(Orientation::Landscape),
            _ => None,
        }
    }
}

/// Bounded waits a client may configure per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    Implicit,
    PageLoad,
    Script,
}

impl TimeoutKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "implicit" => Some(TimeoutKind::Implicit),
            "page load" | "pageLoad" => Some(TimeoutKind::PageLoad),
            "script" => Some(TimeoutKind::Script),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollGesture {
    FromElement {
        element: ElementId,
        x_offset: i32,
        y_offset: i32,
    },
    Offset {
        x_offset: i32,
        y_offset: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlickGesture {
    FromElement {
        element: ElementId,
        x_offset: i32,
        y_offset: i32,
        speed: i32,
    },
    Speed {
        x_speed: i32,
        y_speed: i32,
    },
}
