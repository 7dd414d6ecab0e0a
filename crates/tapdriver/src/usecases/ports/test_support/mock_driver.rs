use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::Value;

use crate::domain::{ExecutionContext, Locator, Point, Rect, Size};
use crate::usecases::ports::{AutomationDriver, DriverError, ElementRef};

/// Builder-configured driver that records every call it receives.
///
/// Calls are recorded as `name(args)` strings, e.g. `pointer_down(0,10,20)`.
#[derive(Debug, Default)]
pub struct MockDriver {
    context: ExecutionContext,
    elements: Vec<(String, String, ElementRef)>,
    active: Option<ElementRef>,
    rects: HashMap<ElementRef, Rect>,
    texts: HashMap<ElementRef, String>,
    view_tags: Vec<(String, ElementRef)>,
    failures: HashMap<String, DriverError>,
    panics: HashSet<String>,
    appear_after: usize,
    find_polls: AtomicUsize,
    alert: Mutex<Option<String>>,
    url: Mutex<String>,
    calls: Mutex<Vec<String>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    /// Makes `locator(using, value)` match `element`.
    pub fn with_element(mut self, using: &str, value: &str, element: ElementRef) -> Self {
        self.elements
            .push((using.to_string(), value.to_string(), element));
        self
    }

    /// Lookups see nothing for the first `polls` attempts.
    pub fn appearing_after(mut self, polls: usize) -> Self {
        self.appear_after = polls;
        self
    }

    pub fn with_active(mut self, element: ElementRef) -> Self {
        self.active = Some(element);
        self
    }

    pub fn with_rect(mut self, element: ElementRef, rect: Rect) -> Self {
        self.rects.insert(element, rect);
        self
    }

    pub fn with_text(mut self, element: ElementRef, text: &str) -> Self {
        self.texts.insert(element, text.to_string());
        self
    }

    /// Makes `find_by_view_tag` match `tag`, ignoring case.
    pub fn with_view_tag(mut self, tag: &str, element: ElementRef) -> Self {
        self.view_tags.push((tag.to_string(), element));
        self
    }

    pub fn with_alert(self, text: &str) -> Self {
        *self.alert.lock().unwrap() = Some(text.to_string());
        self
    }

    /// Every call to `method` is recorded and then fails with `error`.
    pub fn failing(mut self, method: &str, error: DriverError) -> Self {
        self.failures.insert(method.to_string(), error);
        self
    }

    /// Every call to `method` panics, as a misbehaving backend would.
    pub fn panicking(mut self, method: &str) -> Self {
        self.panics.insert(method.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_alert(&self, text: Option<&str>) {
        *self.alert.lock().unwrap() = text.map(str::to_string);
    }

    fn record(&self, method: &str, call: String) -> Result<(), DriverError> {
        self.calls.lock().unwrap().push(call);
        self.trip(method);
        match self.failures.get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn trip(&self, method: &str) {
        if self.panics.contains(method) {
            panic!("{method} blew up");
        }
    }

    fn matches(&self, locator: &Locator) -> Vec<ElementRef> {
        let poll = self.find_polls.fetch_add(1, Ordering::SeqCst);
        if poll < self.appear_after {
            return Vec::new();
        }
        self.elements
            .iter()
            .filter(|(using, value, _)| using == locator.strategy.as_str() && *value == locator.value)
            .map(|(_, _, element)| element.clone())
            .collect()
    }
}

impl AutomationDriver for MockDriver {
    fn context(&self) -> ExecutionContext {
        self.context.clone()
    }

    fn find_element(
        &self,
        locator: &Locator,
        _root: Option<&ElementRef>,
    ) -> Result<Option<ElementRef>, DriverError> {
        self.record("find_element", format!("find_element({locator})"))?;
        Ok(self.matches(locator).into_iter().next())
    }

    fn find_elements(
        &self,
        locator: &Locator,
        _root: Option<&ElementRef>,
    ) -> Result<Vec<ElementRef>, DriverError> {
        self.record("find_elements", format!("find_elements({locator})"))?;
        Ok(self.matches(locator))
    }

    fn active_element(&self) -> Result<Option<ElementRef>, DriverError> {
        self.record("active_element", "active_element".to_string())?;
        Ok(self.active.clone())
    }

    fn click(&self, element: &ElementRef) -> Result<(), DriverError> {
        self.record("click", format!("click({})", element.key()))
    }

    fn text(&self, element: &ElementRef) -> Result<String, DriverError> {
        self.record("text", format!("text({})", element.key()))?;
        Ok(self.texts.get(element).cloned().unwrap_or_default())
    }

    fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>, DriverError> {
        self.record("attribute", format!("attribute({},{name})", element.key()))?;
        Ok(None)
    }

    fn tag_name(&self, element: &ElementRef) -> Result<String, DriverError> {
        self.record("tag_name", format!("tag_name({})", element.key()))?;
        Ok("android.view.View".to_string())
    }

    fn is_displayed(&self, element: &ElementRef) -> Result<bool, DriverError> {
        self.record("is_displayed", format!("is_displayed({})", element.key()))?;
        Ok(true)
    }

    fn is_enabled(&self, element: &ElementRef) -> Result<bool, DriverError> {
        self.record("is_enabled", format!("is_enabled({})", element.key()))?;
        Ok(true)
    }

    fn is_selected(&self, element: &ElementRef) -> Result<bool, DriverError> {
        self.record("is_selected", format!("is_selected({})", element.key()))?;
        Ok(false)
    }

    fn rect(&self, element: &ElementRef) -> Result<Rect, DriverError> {
        self.record("rect", format!("rect({})", element.key()))?;
        Ok(self.rects.get(element).copied().unwrap_or_default())
    }

    fn current_url(&self) -> Result<String, DriverError> {
        self.record("current_url", "current_url".to_string())?;
        Ok(self.url.lock().unwrap().clone())
    }

    fn navigate(&self, url: &str, _page_load_timeout: Duration) -> Result<(), DriverError> {
        self.record("navigate", format!("navigate({url})"))?;
        *self.url.lock().unwrap() = url.to_string();
        Ok(())
    }

    fn page_source(&self) -> Result<String, DriverError> {
        self.record("page_source", "page_source".to_string())?;
        Ok("<hierarchy/>".to_string())
    }

    fn execute_script(&self, script: &str, args: &[Value]) -> Result<Value, DriverError> {
        self.record("execute_script", format!("execute_script({script})"))?;
        Ok(Value::Array(args.to_vec()))
    }

    fn tap(&self, at: Point) -> Result<(), DriverError> {
        self.record("tap", format!("tap({},{})", at.x, at.y))
    }

    fn pointer_down(&self, pointer_id: usize, at: Point) -> Result<(), DriverError> {
        self.record("pointer_down", format!("pointer_down({pointer_id},{},{})", at.x, at.y))
    }

    fn pointer_move(&self, pointer_id: usize, at: Point) -> Result<(), DriverError> {
        self.record("pointer_move", format!("pointer_move({pointer_id},{},{})", at.x, at.y))
    }

    fn pointer_up(&self, pointer_id: usize, at: Point) -> Result<(), DriverError> {
        self.record("pointer_up", format!("pointer_up({pointer_id},{},{})", at.x, at.y))
    }

    fn window_size(&self) -> Result<Size, DriverError> {
        self.record("window_size", "window_size".to_string())?;
        Ok(Size::new(1080, 1920))
    }

    fn find_by_view_tag(&self, tag: &str) -> Result<Vec<ElementRef>, DriverError> {
        self.record("find_by_view_tag", format!("find_by_view_tag({tag})"))?;
        Ok(self
            .view_tags
            .iter()
            .filter(|(t, _)| t.eq_ignore_ascii_case(tag))
            .map(|(_, element)| element.clone())
            .collect())
    }

    fn invoke_menu_action(&self, item_id: i64) -> Result<(), DriverError> {
        self.record("invoke_menu_action", format!("invoke_menu_action({item_id})"))
    }

    fn is_alert_present(&self) -> Result<bool, DriverError> {
        self.trip("is_alert_present");
        Ok(self.alert.lock().unwrap().is_some())
    }

    fn alert_text(&self) -> Result<String, DriverError> {
        self.alert.lock().unwrap().clone().ok_or(DriverError::NoAlertOpen)
    }

    fn accept_alert(&self) -> Result<(), DriverError> {
        self.record("accept_alert", "accept_alert".to_string())?;
        self.alert
            .lock()
            .unwrap()
            .take()
            .map(|_| ())
            .ok_or(DriverError::NoAlertOpen)
    }

    fn release(&self) -> Result<(), DriverError> {
        self.record("release", "release".to_string())
    }
}
