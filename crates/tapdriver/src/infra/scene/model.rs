//! JSON scene document: a native view tree plus zero or more web surfaces.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Cookie, Orientation, Rect, Size};

fn yes() -> bool {
    true
}

/// One node of a view tree. Everything but `rect` is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SceneNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility_id: Option<String>,
    /// Numeric platform view id, reported with the element handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_tag: Option<String>,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default = "yes")]
    pub displayed: bool,
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default)]
    pub selected: bool,
    /// Clicking toggles `selected`.
    #[serde(default)]
    pub checkable: bool,
    /// Clicking opens this alert (web surfaces only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    /// Clicking navigates here (web surfaces only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Tag name reported to clients: `tag`, else the simple class name.
    pub fn tag_name(&self) -> String {
        if let Some(tag) = &self.tag {
            return tag.clone();
        }
        self.class
            .as_deref()
            .map(|class| class.rsplit('.').next().unwrap_or(class).to_string())
            .unwrap_or_default()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" | "resourceId" => self.id.clone(),
            "class" | "className" => self.class.clone(),
            "name" => self.name.clone(),
            "text" | "value" => self.text.clone(),
            "contentDescription" | "accessibilityId" => self.accessibility_id.clone(),
            "href" => self.href.clone(),
            "viewTag" => self.view_tag.clone(),
            "displayed" => Some(self.displayed.to_string()),
            "enabled" => Some(self.enabled.to_string()),
            "selected" => Some(self.selected.to_string()),
            _ => self.attributes.get(name).cloned(),
        }
    }

    pub fn source(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A page a web surface can navigate to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScenePage {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub root: SceneNode,
    /// Alert already open when the page loads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SceneSurface {
    #[serde(default)]
    pub url: String,
    /// Pages by url; `url` should be one of them.
    #[serde(default)]
    pub pages: BTreeMap<String, ScenePage>,
    /// Canned results keyed by exact script text.
    #[serde(default)]
    pub scripts: BTreeMap<String, Value>,
    #[serde(default)]
    pub frames: Vec<String>,
    #[serde(default)]
    pub cookies: Vec<Cookie>,
}

/// Options-menu entry of the native screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneMenuItem {
    pub id: i64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default = "default_window")]
    pub window: Size,
    #[serde(default = "default_orientation")]
    pub orientation: Orientation,
    #[serde(default)]
    pub native: SceneNode,
    #[serde(default)]
    pub webviews: Vec<SceneSurface>,
    #[serde(default)]
    pub menu: Vec<SceneMenuItem>,
    /// Screen brightness in 0..=1.
    #[serde(default = "default_brightness")]
    pub brightness: f64,
}

fn default_window() -> Size {
    Size::new(1080, 1920)
}

fn default_brightness() -> f64 {
    1.0
}

fn default_orientation() -> Orientation {
    Orientation::Portrait
}

impl Default for Scene {
    fn default() -> Self {
        let window = default_window();
        Self {
            window,
            orientation: default_orientation(),
            native: SceneNode {
                class: Some("android.widget.FrameLayout".to_string()),
                rect: Rect::new(0, 0, window.width, window.height),
                displayed: true,
                enabled: true,
                ..SceneNode::default()
            },
            webviews: Vec::new(),
            menu: Vec::new(),
            brightness: default_brightness(),
        }
    }
}
