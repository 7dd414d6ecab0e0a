//! Capability interface to the platform automation backend.
//!
//! Everything here blocks the calling worker. Methods a backend does not
//! implement for its context fall back to `UnsupportedOperation`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::errors::DriverError;
use crate::domain::{
    Capabilities, Cookie, ExecutionContext, Locator, Orientation, Point, Rect, Size, WebSurfaceId,
};

/// Driver-side reference to a live UI element.
///
/// Equality is identity: two lookups that reach the same underlying element
/// return equal references.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef {
    key: String,
    platform_id: Option<i64>,
}

impl ElementRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            platform_id: None,
        }
    }

    /// Attaches the platform's own numeric view id, when it has one.
    pub fn with_platform_id(mut self, id: i64) -> Self {
        self.platform_id = Some(id);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn platform_id(&self) -> Option<i64> {
        self.platform_id
    }
}

pub trait AutomationDriver: Send + Sync {
    fn context(&self) -> ExecutionContext;

    // Lookup. `root` scopes the search to an element's subtree.
    fn find_element(
        &self,
        locator: &Locator,
        root: Option<&ElementRef>,
    ) -> Result<Option<ElementRef>, DriverError>;

    fn find_elements(
        &self,
        locator: &Locator,
        root: Option<&ElementRef>,
    ) -> Result<Vec<ElementRef>, DriverError>;

    fn active_element(&self) -> Result<Option<ElementRef>, DriverError> {
        Err(DriverError::unsupported("active element"))
    }

    // Element state and interaction.
    fn click(&self, element: &ElementRef) -> Result<(), DriverError>;

    fn text(&self, element: &ElementRef) -> Result<String, DriverError>;

    fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>, DriverError>;

    fn tag_name(&self, element: &ElementRef) -> Result<String, DriverError>;

    fn is_displayed(&self, element: &ElementRef) -> Result<bool, DriverError>;

    fn is_enabled(&self, element: &ElementRef) -> Result<bool, DriverError>;

    fn is_selected(&self, element: &ElementRef) -> Result<bool, DriverError>;

    fn rect(&self, element: &ElementRef) -> Result<Rect, DriverError>;

    fn location_in_view(&self, element: &ElementRef) -> Result<Point, DriverError> {
        self.rect(element).map(|rect| rect.origin())
    }

    fn clear(&self, _element: &ElementRef) -> Result<(), DriverError> {
        Err(DriverError::unsupported("clear"))
    }

    fn submit(&self, _element: &ElementRef) -> Result<(), DriverError> {
        Err(DriverError::unsupported("submit"))
    }

    fn send_keys(&self, _element: &ElementRef, _text: &str) -> Result<(), DriverError> {
        Err(DriverError::unsupported("send keys"))
    }

    fn send_keys_to_active(&self, _text: &str) -> Result<(), DriverError> {
        Err(DriverError::unsupported("keys"))
    }

    fn element_source(&self, _element: &ElementRef) -> Result<Value, DriverError> {
        Err(DriverError::unsupported("element source"))
    }

    // Navigation.
    fn current_url(&self) -> Result<String, DriverError> {
        Err(DriverError::unsupported("get url"))
    }

    fn navigate(&self, _url: &str, _page_load_timeout: Duration) -> Result<(), DriverError> {
        Err(DriverError::unsupported("open url"))
    }

    fn back(&self) -> Result<(), DriverError> {
        Err(DriverError::unsupported("back"))
    }

    fn forward(&self) -> Result<(), DriverError> {
        Err(DriverError::unsupported("forward"))
    }

    fn refresh(&self) -> Result<(), DriverError> {
        Err(DriverError::unsupported("refresh"))
    }

    fn title(&self) -> Result<String, DriverError> {
        Err(DriverError::unsupported("title"))
    }

    fn page_source(&self) -> Result<String, DriverError>;

    fn switch_frame(&self, _frame: &Value) -> Result<(), DriverError> {
        Err(DriverError::unsupported("frame"))
    }

    // Scripts.
    fn execute_script(&self, _script: &str, _args: &[Value]) -> Result<Value, DriverError> {
        Err(DriverError::unsupported("execute"))
    }

    fn execute_async_script(
        &self,
        _script: &str,
        _args: &[Value],
        _timeout: Duration,
    ) -> Result<Value, DriverError> {
        Err(DriverError::unsupported("execute_async"))
    }

    // Touch.
    fn tap(&self, _at: Point) -> Result<(), DriverError> {
        Err(DriverError::unsupported("touch/click"))
    }

    fn double_tap(&self, _at: Point) -> Result<(), DriverError> {
        Err(DriverError::unsupported("touch/doubleclick"))
    }

    fn long_press(&self, _at: Point) -> Result<(), DriverError> {
        Err(DriverError::unsupported("touch/longclick"))
    }

    fn touch_down(&self, _at: Point) -> Result<(), DriverError> {
        Err(DriverError::unsupported("touch/down"))
    }

    fn touch_up(&self, _at: Point) -> Result<(), DriverError> {
        Err(DriverError::unsupported("touch/up"))
    }

    fn touch_move(&self, _at: Point) -> Result<(), DriverError> {
        Err(DriverError::unsupported("touch/move"))
    }

    fn scroll(&self, _from: Option<Point>, _dx: i32, _dy: i32) -> Result<(), DriverError> {
        Err(DriverError::unsupported("touch/scroll"))
    }

    fn flick(&self, _from: Point, _dx: i32, _dy: i32, _speed: i32) -> Result<(), DriverError> {
        Err(DriverError::unsupported("touch/flick"))
    }

    fn flick_speed(&self, _x_speed: i32, _y_speed: i32) -> Result<(), DriverError> {
        Err(DriverError::unsupported("touch/flick"))
    }

    // Multi-pointer primitives used by the action scheduler. Backends that
    // track a single pointer can rely on the touch defaults.
    fn pointer_down(&self, _pointer_id: usize, at: Point) -> Result<(), DriverError> {
        self.touch_down(at)
    }

    fn pointer_move(&self, _pointer_id: usize, at: Point) -> Result<(), DriverError> {
        self.touch_move(at)
    }

    fn pointer_up(&self, _pointer_id: usize, at: Point) -> Result<(), DriverError> {
        self.touch_up(at)
    }

    // Device.
    fn window_size(&self) -> Result<Size, DriverError>;

    fn orientation(&self) -> Result<Orientation, DriverError> {
        Err(DriverError::unsupported("orientation"))
    }

    fn rotate(&self, _orientation: Orientation) -> Result<(), DriverError> {
        Err(DriverError::unsupported("orientation"))
    }

    fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        Err(DriverError::unsupported("screenshot"))
    }

    /// Screen brightness in `0.0..=1.0`; `0.0` means the screen is off.
    fn brightness(&self) -> Result<f64, DriverError> {
        Err(DriverError::unsupported("screen brightness"))
    }

    fn set_brightness(&self, _level: f64) -> Result<(), DriverError> {
        Err(DriverError::unsupported("screen brightness"))
    }

    // Native-only lookups and actions behind the bundled extensions.
    fn find_by_view_tag(&self, _tag: &str) -> Result<Vec<ElementRef>, DriverError> {
        Err(DriverError::unsupported("findElementByAndroidTag"))
    }

    fn invoke_menu_action(&self, _item_id: i64) -> Result<(), DriverError> {
        Err(DriverError::unsupported("invokeMenuActionSync"))
    }

    // Alerts. Only web surfaces raise them.
    fn is_alert_present(&self) -> Result<bool, DriverError> {
        Ok(false)
    }

    fn alert_text(&self) -> Result<String, DriverError> {
        Err(DriverError::NoAlertOpen)
    }

    fn accept_alert(&self) -> Result<(), DriverError> {
        Err(DriverError::NoAlertOpen)
    }

    fn dismiss_alert(&self) -> Result<(), DriverError> {
        Err(DriverError::NoAlertOpen)
    }

    fn set_alert_text(&self, _text: &str) -> Result<(), DriverError> {
        Err(DriverError::NoAlertOpen)
    }

    // Cookies.
    fn cookies(&self) -> Result<Vec<Cookie>, DriverError> {
        Err(DriverError::unsupported("cookie"))
    }

    fn add_cookie(&self, _cookie: Cookie) -> Result<(), DriverError> {
        Err(DriverError::unsupported("cookie"))
    }

    fn delete_cookie(&self, _name: &str) -> Result<(), DriverError> {
        Err(DriverError::unsupported("cookie"))
    }

    fn delete_all_cookies(&self) -> Result<(), DriverError> {
        Err(DriverError::unsupported("cookie"))
    }

    /// Releases resources bound to this context (e.g. detaches from a web surface).
    fn release(&self) -> Result<(), DriverError> {
        Ok(())
    }
}

/// Binds drivers to contexts and drives the application lifecycle.
pub trait DriverFactory: Send + Sync {
    fn bind(&self, context: &ExecutionContext) -> Result<Arc<dyn AutomationDriver>, DriverError>;

    /// Web surfaces the application exposes right now; never cached.
    fn web_surfaces(&self) -> Result<Vec<WebSurfaceId>, DriverError>;

    fn start_application(&self, _capabilities: &Capabilities) -> Result<(), DriverError> {
        Ok(())
    }

    fn stop_application(&self) -> Result<(), DriverError> {
        Ok(())
    }
}
