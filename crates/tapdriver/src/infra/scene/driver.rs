use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use tapdriver_common::mutex_lock_or_recover;
use tracing::debug;

use super::model::{Scene, SceneMenuItem, SceneNode, ScenePage, SceneSurface};
use super::query::{self, NodePath};
use crate::domain::{
    Capabilities, Cookie, ExecutionContext, Locator, Orientation, Point, Rect, Size, WebSurfaceId,
};
use crate::usecases::ports::{AutomationDriver, DriverError, DriverFactory, ElementRef};

/// 1x1 transparent PNG returned by `screenshot`.
const BLANK_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Live state of one web surface.
#[derive(Debug)]
struct SurfaceState {
    document: SceneSurface,
    history: Vec<String>,
    position: usize,
    page: ScenePage,
    generation: u64,
    alert: Option<String>,
    alert_input: Option<String>,
    cookies: Vec<Cookie>,
    frame: Option<Value>,
}

impl SurfaceState {
    fn new(document: SceneSurface) -> Self {
        let url = document.url.clone();
        let cookies = document.cookies.clone();
        let mut state = Self {
            document,
            history: vec![url.clone()],
            position: 0,
            page: ScenePage::default(),
            generation: 0,
            alert: None,
            alert_input: None,
            cookies,
            frame: None,
        };
        state.load(&url);
        state
    }

    fn url(&self) -> &str {
        self.history.get(self.position).map_or("", String::as_str)
    }

    fn load(&mut self, url: &str) {
        self.page = self.document.pages.get(url).cloned().unwrap_or_else(|| ScenePage {
            title: url.to_string(),
            ..ScenePage::default()
        });
        self.alert = self.page.alert.clone();
        self.alert_input = None;
        self.frame = None;
        self.generation += 1;
    }

    fn navigate(&mut self, url: &str) {
        self.history.truncate(self.position + 1);
        self.history.push(url.to_string());
        self.position = self.history.len() - 1;
        self.load(url);
    }

    fn step(&mut self, forward: bool) {
        let target = if forward {
            (self.position + 1 < self.history.len()).then_some(self.position + 1)
        } else {
            self.position.checked_sub(1)
        };
        if let Some(target) = target {
            self.position = target;
            let url = self.history[target].clone();
            self.load(&url);
        }
    }
}

#[derive(Debug)]
struct SceneState {
    native: SceneNode,
    surfaces: Vec<SurfaceState>,
    window: Size,
    orientation: Orientation,
    menu: Vec<SceneMenuItem>,
    brightness: f64,
    focused: Option<ElementRef>,
    running: bool,
    events: Vec<String>,
}

impl SceneState {
    fn new(scene: &Scene) -> Self {
        Self {
            native: scene.native.clone(),
            surfaces: scene.webviews.iter().cloned().map(SurfaceState::new).collect(),
            window: scene.window,
            orientation: scene.orientation,
            menu: scene.menu.clone(),
            brightness: scene.brightness,
            focused: None,
            running: false,
            events: Vec::new(),
        }
    }
}

/// Which tree a driver instance operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Native,
    Web(usize),
}

/// Drives a [`Scene`]. One instance per bound context; all share state.
pub struct SceneDriver {
    context: ExecutionContext,
    surface: Surface,
    state: Arc<Mutex<SceneState>>,
}

impl SceneDriver {
    fn state(&self) -> MutexGuard<'_, SceneState> {
        mutex_lock_or_recover(&self.state)
    }

    fn prefix(&self, state: &SceneState) -> String {
        match self.surface {
            Surface::Native => self.context.name().to_string(),
            Surface::Web(index) => {
                let generation = state.surfaces.get(index).map_or(0, |s| s.generation);
                format!("{}@{generation}", self.context.name())
            }
        }
    }

    fn element_ref(&self, state: &SceneState, path: &[usize]) -> ElementRef {
        let view_id = self
            .root(state)
            .ok()
            .and_then(|root| query::node_at(root, path))
            .and_then(|node| node.view_id);
        let key = path
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(".");
        let element = ElementRef::new(format!("{}#{key}", self.prefix(state)));
        match view_id {
            Some(id) => element.with_platform_id(id),
            None => element,
        }
    }

    fn native_only(&self, command: &str) -> Result<(), DriverError> {
        match self.surface {
            Surface::Native => Ok(()),
            Surface::Web(_) => Err(DriverError::unsupported(command)),
        }
    }

    /// Path of `element` inside this driver's current tree.
    fn path_of(&self, state: &SceneState, element: &ElementRef) -> Result<NodePath, DriverError> {
        let stale = || DriverError::stale(element.key());
        let (prefix, path) = element.key().split_once('#').ok_or_else(stale)?;
        if prefix != self.prefix(state) {
            return Err(stale());
        }
        let path = if path.is_empty() {
            Vec::new()
        } else {
            path.split('.')
                .map(|part| part.parse::<usize>().map_err(|_| stale()))
                .collect::<Result<Vec<_>, _>>()?
        };
        let root = self.root(state)?;
        query::node_at(root, &path).ok_or_else(stale)?;
        Ok(path)
    }

    fn root<'a>(&self, state: &'a SceneState) -> Result<&'a SceneNode, DriverError> {
        match self.surface {
            Surface::Native => Ok(&state.native),
            Surface::Web(index) => state
                .surfaces
                .get(index)
                .map(|surface| &surface.page.root)
                .ok_or_else(|| DriverError::no_such_context(self.context.name())),
        }
    }

    fn root_mut<'a>(&self, state: &'a mut SceneState) -> Result<&'a mut SceneNode, DriverError> {
        match self.surface {
            Surface::Native => Ok(&mut state.native),
            Surface::Web(index) => state
                .surfaces
                .get_mut(index)
                .map(|surface| &mut surface.page.root)
                .ok_or_else(|| DriverError::no_such_context(self.context.name())),
        }
    }

    fn surface_mut<'a>(&self, state: &'a mut SceneState) -> Result<&'a mut SurfaceState, DriverError> {
        match self.surface {
            Surface::Native => Err(DriverError::unsupported("web command")),
            Surface::Web(index) => state
                .surfaces
                .get_mut(index)
                .ok_or_else(|| DriverError::no_such_context(self.context.name())),
        }
    }

    fn with_node<T>(
        &self,
        element: &ElementRef,
        read: impl FnOnce(&SceneNode) -> T,
    ) -> Result<T, DriverError> {
        let state = self.state();
        let path = self.path_of(&state, element)?;
        let root = self.root(&state)?;
        query::node_at(root, &path)
            .map(read)
            .ok_or_else(|| DriverError::stale(element.key()))
    }

    fn with_node_mut<T>(
        &self,
        element: &ElementRef,
        write: impl FnOnce(&mut SceneNode) -> Result<T, DriverError>,
    ) -> Result<T, DriverError> {
        let mut state = self.state();
        let path = self.path_of(&state, element)?;
        let root = self.root_mut(&mut state)?;
        let node = query::node_at_mut(root, &path).ok_or_else(|| DriverError::stale(element.key()))?;
        write(node)
    }

    fn interactable(node: &SceneNode, key: &str) -> Result<(), DriverError> {
        if !node.displayed {
            return Err(DriverError::ElementNotVisible(format!(
                "Element '{key}' is not displayed"
            )));
        }
        if !node.enabled {
            return Err(DriverError::InvalidElementState(format!(
                "Element '{key}' is disabled"
            )));
        }
        Ok(())
    }

    /// Clicks the node at `path`: focus, toggle, open its alert, follow its link.
    fn activate(&self, state: &mut SceneState, path: &[usize]) -> Result<(), DriverError> {
        let element = self.element_ref(state, path);
        let node = query::node_at_mut(self.root_mut(state)?, path)
            .ok_or_else(|| DriverError::stale(element.key()))?;
        Self::interactable(node, element.key())?;
        if node.checkable {
            node.selected = !node.selected;
        }
        let alert = node.alert.clone();
        let href = node.href.clone();
        state.events.push(format!("click({})", element.key()));
        state.focused = Some(element);
        if let Surface::Web(_) = self.surface {
            let surface = self.surface_mut(state)?;
            if let Some(alert) = alert {
                surface.alert = Some(alert);
            } else if let Some(href) = href {
                surface.navigate(&href);
            }
        }
        Ok(())
    }

    fn record(&self, event: String) {
        debug!(context = %self.context, event = %event, "Scene gesture");
        self.state().events.push(event);
    }

    fn tap_at(&self, at: Point) -> Result<(), DriverError> {
        let mut state = self.state();
        let hit = query::hit_test(self.root(&state)?, at);
        match hit {
            Some(path) => self.activate(&mut state, &path),
            None => {
                state.events.push(format!("tap({},{})", at.x, at.y));
                Ok(())
            }
        }
    }

    fn script_result(&self, script: &str) -> Result<Value, DriverError> {
        let mut state = self.state();
        let surface = self.surface_mut(&mut state)?;
        surface.document.scripts.get(script).cloned().ok_or_else(|| {
            DriverError::JavaScript(format!("Script is not defined by the scene: {script}"))
        })
    }
}

impl AutomationDriver for SceneDriver {
    fn context(&self) -> ExecutionContext {
        self.context.clone()
    }

    fn find_element(
        &self,
        locator: &Locator,
        root: Option<&ElementRef>,
    ) -> Result<Option<ElementRef>, DriverError> {
        Ok(self.find_elements(locator, root)?.into_iter().next())
    }

    fn find_elements(
        &self,
        locator: &Locator,
        root: Option<&ElementRef>,
    ) -> Result<Vec<ElementRef>, DriverError> {
        let state = self.state();
        let scope = root
            .map(|element| self.path_of(&state, element))
            .transpose()?
            .unwrap_or_default();
        let found = query::find_all(self.root(&state)?, &scope, locator)?;
        Ok(found
            .iter()
            .map(|path| self.element_ref(&state, path))
            .collect())
    }

    fn active_element(&self) -> Result<Option<ElementRef>, DriverError> {
        let state = self.state();
        Ok(state
            .focused
            .clone()
            .filter(|element| self.path_of(&state, element).is_ok()))
    }

    fn click(&self, element: &ElementRef) -> Result<(), DriverError> {
        let mut state = self.state();
        let path = self.path_of(&state, element)?;
        self.activate(&mut state, &path)
    }

    fn text(&self, element: &ElementRef) -> Result<String, DriverError> {
        self.with_node(element, |node| node.text.clone().unwrap_or_default())
    }

    fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>, DriverError> {
        self.with_node(element, |node| node.attribute(name))
    }

    fn tag_name(&self, element: &ElementRef) -> Result<String, DriverError> {
        self.with_node(element, SceneNode::tag_name)
    }

    fn is_displayed(&self, element: &ElementRef) -> Result<bool, DriverError> {
        self.with_node(element, |node| node.displayed)
    }

    fn is_enabled(&self, element: &ElementRef) -> Result<bool, DriverError> {
        self.with_node(element, |node| node.enabled)
    }

    fn is_selected(&self, element: &ElementRef) -> Result<bool, DriverError> {
        self.with_node(element, |node| node.selected)
    }

    fn rect(&self, element: &ElementRef) -> Result<Rect, DriverError> {
        self.with_node(element, |node| node.rect)
    }

    fn clear(&self, element: &ElementRef) -> Result<(), DriverError> {
        self.with_node_mut(element, |node| {
            Self::interactable(node, element.key())?;
            node.text = Some(String::new());
            Ok(())
        })
    }

    fn submit(&self, element: &ElementRef) -> Result<(), DriverError> {
        self.record(format!("submit({})", element.key()));
        Ok(())
    }

    fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        self.with_node_mut(element, |node| {
            Self::interactable(node, element.key())?;
            node.text.get_or_insert_with(String::new).push_str(text);
            Ok(())
        })?;
        self.state().focused = Some(element.clone());
        Ok(())
    }

    fn send_keys_to_active(&self, text: &str) -> Result<(), DriverError> {
        let focused = self.active_element()?.ok_or_else(|| {
            DriverError::NoSuchElement("No element has focus".to_string())
        })?;
        self.send_keys(&focused, text)
    }

    fn element_source(&self, element: &ElementRef) -> Result<Value, DriverError> {
        self.with_node(element, SceneNode::source)
    }

    fn current_url(&self) -> Result<String, DriverError> {
        let mut state = self.state();
        Ok(self.surface_mut(&mut state)?.url().to_string())
    }

    fn navigate(&self, url: &str, _page_load_timeout: Duration) -> Result<(), DriverError> {
        let mut state = self.state();
        self.surface_mut(&mut state)?.navigate(url);
        Ok(())
    }

    fn back(&self) -> Result<(), DriverError> {
        let mut state = self.state();
        self.surface_mut(&mut state)?.step(false);
        Ok(())
    }

    fn forward(&self) -> Result<(), DriverError> {
        let mut state = self.state();
        self.surface_mut(&mut state)?.step(true);
        Ok(())
    }

    fn refresh(&self) -> Result<(), DriverError> {
        let mut state = self.state();
        let surface = self.surface_mut(&mut state)?;
        let url = surface.url().to_string();
        surface.load(&url);
        Ok(())
    }

    fn title(&self) -> Result<String, DriverError> {
        let mut state = self.state();
        Ok(self.surface_mut(&mut state)?.page.title.clone())
    }

    fn page_source(&self) -> Result<String, DriverError> {
        let state = self.state();
        serde_json::to_string_pretty(self.root(&state)?)
            .map_err(|err| DriverError::unknown_with_source("Could not render page source", err))
    }

    fn switch_frame(&self, frame: &Value) -> Result<(), DriverError> {
        let mut state = self.state();
        let surface = self.surface_mut(&mut state)?;
        let known = match frame {
            Value::Null => true,
            Value::Number(n) => n
                .as_u64()
                .is_some_and(|index| (index as usize) < surface.document.frames.len()),
            Value::String(name) => surface.document.frames.iter().any(|f| f == name),
            _ => false,
        };
        if !known {
            return Err(DriverError::NoSuchFrame(format!("Frame {frame} could not be found")));
        }
        surface.frame = (!frame.is_null()).then(|| frame.clone());
        Ok(())
    }

    fn execute_script(&self, script: &str, _args: &[Value]) -> Result<Value, DriverError> {
        self.script_result(script)
    }

    fn execute_async_script(
        &self,
        script: &str,
        _args: &[Value],
        timeout: Duration,
    ) -> Result<Value, DriverError> {
        self.script_result(script).map_err(|_| {
            DriverError::ScriptTimeout(format!(
                "Timed out after {}ms waiting for the script result",
                timeout.as_millis()
            ))
        })
    }

    fn tap(&self, at: Point) -> Result<(), DriverError> {
        self.tap_at(at)
    }

    fn double_tap(&self, at: Point) -> Result<(), DriverError> {
        self.tap_at(at)?;
        self.tap_at(at)
    }

    fn long_press(&self, at: Point) -> Result<(), DriverError> {
        self.record(format!("long_press({},{})", at.x, at.y));
        Ok(())
    }

    fn touch_down(&self, at: Point) -> Result<(), DriverError> {
        self.pointer_down(0, at)
    }

    fn touch_up(&self, at: Point) -> Result<(), DriverError> {
        self.pointer_up(0, at)
    }

    fn touch_move(&self, at: Point) -> Result<(), DriverError> {
        self.pointer_move(0, at)
    }

    fn scroll(&self, from: Option<Point>, dx: i32, dy: i32) -> Result<(), DriverError> {
        let from = from.map_or_else(|| "screen".to_string(), |p| format!("{},{}", p.x, p.y));
        self.record(format!("scroll({from},{dx},{dy})"));
        Ok(())
    }

    fn flick(&self, from: Point, dx: i32, dy: i32, speed: i32) -> Result<(), DriverError> {
        self.record(format!("flick({},{},{dx},{dy},{speed})", from.x, from.y));
        Ok(())
    }

    fn flick_speed(&self, x_speed: i32, y_speed: i32) -> Result<(), DriverError> {
        self.record(format!("flick({x_speed},{y_speed})"));
        Ok(())
    }

    fn pointer_down(&self, pointer_id: usize, at: Point) -> Result<(), DriverError> {
        self.record(format!("pointer_down({pointer_id},{},{})", at.x, at.y));
        Ok(())
    }

    fn pointer_move(&self, pointer_id: usize, at: Point) -> Result<(), DriverError> {
        self.record(format!("pointer_move({pointer_id},{},{})", at.x, at.y));
        Ok(())
    }

    fn pointer_up(&self, pointer_id: usize, at: Point) -> Result<(), DriverError> {
        self.record(format!("pointer_up({pointer_id},{},{})", at.x, at.y));
        Ok(())
    }

    fn window_size(&self) -> Result<Size, DriverError> {
        Ok(self.state().window)
    }

    fn orientation(&self) -> Result<Orientation, DriverError> {
        Ok(self.state().orientation)
    }

    fn rotate(&self, orientation: Orientation) -> Result<(), DriverError> {
        let mut state = self.state();
        if state.orientation != orientation {
            state.orientation = orientation;
            state.window = Size::new(state.window.height, state.window.width);
        }
        Ok(())
    }

    fn brightness(&self) -> Result<f64, DriverError> {
        Ok(self.state().brightness)
    }

    fn set_brightness(&self, level: f64) -> Result<(), DriverError> {
        let level = level.clamp(0.0, 1.0);
        self.state().brightness = level;
        self.record(format!("brightness({level})"));
        Ok(())
    }

    fn find_by_view_tag(&self, tag: &str) -> Result<Vec<ElementRef>, DriverError> {
        self.native_only("find by view tag")?;
        let state = self.state();
        let found = query::find_by_view_tag(&state.native, tag);
        Ok(found
            .iter()
            .map(|path| self.element_ref(&state, path))
            .collect())
    }

    fn invoke_menu_action(&self, item_id: i64) -> Result<(), DriverError> {
        self.native_only("menu action")?;
        let title = self
            .state()
            .menu
            .iter()
            .find(|item| item.id == item_id)
            .map(|item| item.title.clone())
            .ok_or_else(|| DriverError::NoSuchElement(format!("No menu item with id {item_id}")))?;
        self.record(format!("menu({title})"));
        Ok(())
    }

    fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        STANDARD
            .decode(BLANK_PNG)
            .map_err(|err| DriverError::unknown_with_source("Could not encode screenshot", err))
    }

    fn is_alert_present(&self) -> Result<bool, DriverError> {
        let state = self.state();
        Ok(match self.surface {
            Surface::Native => false,
            Surface::Web(index) => state.surfaces.get(index).is_some_and(|s| s.alert.is_some()),
        })
    }

    fn alert_text(&self) -> Result<String, DriverError> {
        let mut state = self.state();
        self.surface_mut(&mut state)
            .ok()
            .and_then(|surface| surface.alert.clone())
            .ok_or(DriverError::NoAlertOpen)
    }

    fn accept_alert(&self) -> Result<(), DriverError> {
        let mut state = self.state();
        let surface = self.surface_mut(&mut state).map_err(|_| DriverError::NoAlertOpen)?;
        surface.alert.take().ok_or(DriverError::NoAlertOpen)?;
        surface.alert_input = None;
        Ok(())
    }

    fn dismiss_alert(&self) -> Result<(), DriverError> {
        self.accept_alert()
    }

    fn set_alert_text(&self, text: &str) -> Result<(), DriverError> {
        let mut state = self.state();
        let surface = self.surface_mut(&mut state).map_err(|_| DriverError::NoAlertOpen)?;
        if surface.alert.is_none() {
            return Err(DriverError::NoAlertOpen);
        }
        surface.alert_input = Some(text.to_string());
        Ok(())
    }

    fn cookies(&self) -> Result<Vec<Cookie>, DriverError> {
        let mut state = self.state();
        Ok(self.surface_mut(&mut state)?.cookies.clone())
    }

    fn add_cookie(&self, cookie: Cookie) -> Result<(), DriverError> {
        let mut state = self.state();
        let cookies = &mut self.surface_mut(&mut state)?.cookies;
        cookies.retain(|existing| existing.name != cookie.name);
        cookies.push(cookie);
        Ok(())
    }

    fn delete_cookie(&self, name: &str) -> Result<(), DriverError> {
        let mut state = self.state();
        self.surface_mut(&mut state)?
            .cookies
            .retain(|cookie| cookie.name != name);
        Ok(())
    }

    fn delete_all_cookies(&self) -> Result<(), DriverError> {
        let mut state = self.state();
        self.surface_mut(&mut state)?.cookies.clear();
        Ok(())
    }

    fn release(&self) -> Result<(), DriverError> {
        if let Surface::Web(index) = self.surface {
            if let Some(surface) = self.state().surfaces.get_mut(index) {
                surface.frame = None;
            }
        }
        Ok(())
    }
}

/// Binds [`SceneDriver`]s over one shared scene.
pub struct SceneDriverFactory {
    scene: Scene,
    state: Arc<Mutex<SceneState>>,
}

impl SceneDriverFactory {
    pub fn new(scene: Scene) -> Self {
        let state = Arc::new(Mutex::new(SceneState::new(&scene)));
        Self { scene, state }
    }

    /// Gestures and clicks seen so far, oldest first.
    pub fn events(&self) -> Vec<String> {
        mutex_lock_or_recover(&self.state).events.clone()
    }

    pub fn is_running(&self) -> bool {
        mutex_lock_or_recover(&self.state).running
    }
}

impl Default for SceneDriverFactory {
    fn default() -> Self {
        Self::new(Scene::default())
    }
}

impl DriverFactory for SceneDriverFactory {
    fn bind(&self, context: &ExecutionContext) -> Result<Arc<dyn AutomationDriver>, DriverError> {
        let surface = match context {
            ExecutionContext::Native => Surface::Native,
            ExecutionContext::Web(id) => {
                let index = self
                    .web_surfaces()?
                    .iter()
                    .position(|surface| surface == id)
                    .ok_or_else(|| DriverError::no_such_context(id.as_str()))?;
                Surface::Web(index)
            }
        };
        Ok(Arc::new(SceneDriver {
            context: context.clone(),
            surface,
            state: Arc::clone(&self.state),
        }))
    }

    fn web_surfaces(&self) -> Result<Vec<WebSurfaceId>, DriverError> {
        let count = mutex_lock_or_recover(&self.state).surfaces.len();
        Ok((0..count).map(WebSurfaceId::indexed).collect())
    }

    /// Reloads the scene so every session starts from the document.
    fn start_application(&self, capabilities: &Capabilities) -> Result<(), DriverError> {
        let mut state = mutex_lock_or_recover(&self.state);
        *state = SceneState::new(&self.scene);
        state.running = true;
        debug!(capabilities = capabilities.len(), "Scene application started");
        Ok(())
    }

    fn stop_application(&self) -> Result<(), DriverError> {
        mutex_lock_or_recover(&self.state).running = false;
        Ok(())
    }
}
