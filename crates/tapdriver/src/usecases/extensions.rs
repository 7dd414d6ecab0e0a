//! Named plugins: a compiled-in catalog plus the table of loaded entries.
//!
//! Clients can only load what the catalog already knows; nothing is looked
//! up by an arbitrary externally supplied type name. While the session is
//! in NATIVE_APP, `execute` with a catalog name as script runs the plugin
//! directly without loading it first.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value, json};
use tapdriver_common::{rwlock_read_or_recover, rwlock_write_or_recover};
use tracing::{debug, info};

use crate::domain::{ElementId, ExecutionContext, Point};
use crate::usecases::ports::{DriverError, Extension, ExtensionContext};
use crate::usecases::session::Session;

const INVOKED: &str = "invoked";

fn require_native(context: &ExtensionContext<'_>, name: &str) -> Result<(), DriverError> {
    if context.context.is_web() {
        return Err(DriverError::UnsupportedOperation(format!(
            "{name} is only available in {}",
            ExecutionContext::Native.name()
        )));
    }
    Ok(())
}

fn first_arg<'a>(args: &'a [Value], name: &str) -> Result<&'a Value, DriverError> {
    args.first()
        .ok_or_else(|| DriverError::InvalidArgument(format!("{name} expects one argument")))
}

/// Integers arrive either as JSON numbers or as decimal strings.
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reports what the session currently looks like.
#[derive(Debug, Default)]
pub struct SessionInfoExtension;

impl Extension for SessionInfoExtension {
    fn name(&self) -> &str {
        "sessionInfo"
    }

    fn execute(&self, context: &ExtensionContext<'_>, _args: &[Value]) -> Result<Value, DriverError> {
        Ok(json!({
            "sessionId": context.session_id,
            "context": context.context.name(),
            "knownElements": context.elements.known(),
            "capabilities": context.capabilities.to_value(),
        }))
    }
}

/// Two fingers moving from their start to their end points in `steps`
/// interpolated moves, e.g. a pinch or a zoom.
#[derive(Debug, Default)]
pub struct TwoPointerGestureExtension;

impl TwoPointerGestureExtension {
    fn point(arg: &Map<String, Value>, x: &str, y: &str) -> Result<Point, DriverError> {
        let coordinate = |key: &str| {
            arg.get(key)
                .and_then(integer)
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| {
                    DriverError::InvalidArgument(format!(
                        "twoPointerGesture argument '{key}' is missing or not an integer"
                    ))
                })
        };
        Ok(Point::new(coordinate(x)?, coordinate(y)?))
    }

    fn lerp(from: i32, to: i32, step: u32, steps: u32) -> i32 {
        let value = i64::from(from)
            + (i64::from(to) - i64::from(from)) * i64::from(step) / i64::from(steps);
        i32::try_from(value).unwrap_or(to)
    }

    fn between(from: Point, to: Point, step: u32, steps: u32) -> Point {
        Point::new(
            Self::lerp(from.x, to.x, step, steps),
            Self::lerp(from.y, to.y, step, steps),
        )
    }
}

impl Extension for TwoPointerGestureExtension {
    fn name(&self) -> &str {
        "twoPointerGesture"
    }

    fn execute(&self, context: &ExtensionContext<'_>, args: &[Value]) -> Result<Value, DriverError> {
        require_native(context, self.name())?;
        if args.len() != 1 {
            return Err(DriverError::InvalidArgument(
                "twoPointerGesture expects exactly one argument".to_string(),
            ));
        }
        let arg = first_arg(args, self.name())?.as_object().ok_or_else(|| {
            DriverError::InvalidArgument("twoPointerGesture expects an object".to_string())
        })?;
        let start = [
            Self::point(arg, "startPoint1X", "startPoint1Y")?,
            Self::point(arg, "startPoint2X", "startPoint2Y")?,
        ];
        let end = [
            Self::point(arg, "endPoint1X", "endPoint1Y")?,
            Self::point(arg, "endPoint2X", "endPoint2Y")?,
        ];
        let steps = arg
            .get("steps")
            .and_then(integer)
            .map(|n| u32::try_from(n.max(1)).unwrap_or(u32::MAX))
            .ok_or_else(|| {
                DriverError::InvalidArgument(
                    "twoPointerGesture argument 'steps' is missing or not an integer".to_string(),
                )
            })?;

        let driver = &context.driver;
        for (pointer, at) in start.iter().enumerate() {
            driver.pointer_down(pointer, *at)?;
        }
        for step in 1..=steps {
            for (pointer, (from, to)) in start.iter().zip(&end).enumerate() {
                driver.pointer_move(pointer, Self::between(*from, *to, step, steps))?;
            }
        }
        for (pointer, at) in end.iter().enumerate() {
            driver.pointer_up(pointer, *at)?;
        }
        debug!(steps, "Two-pointer gesture performed");
        Ok(Value::String(INVOKED.to_string()))
    }
}

/// Whether any part of a native element lies inside the screen.
#[derive(Debug, Default)]
pub struct ViewportVisibilityExtension;

impl Extension for ViewportVisibilityExtension {
    fn name(&self) -> &str {
        "isElementDisplayedInViewport"
    }

    fn execute(&self, context: &ExtensionContext<'_>, args: &[Value]) -> Result<Value, DriverError> {
        let id = ElementId::from_wire(first_arg(args, self.name())?).ok_or_else(|| {
            DriverError::InvalidArgument(format!("{} expects an element", self.name()))
        })?;
        let element = context.elements.resolve(id.as_str())?;
        // Web elements have no on-screen view to measure.
        if context.context.is_web() {
            return Ok(Value::Bool(false));
        }
        let rect = context.driver.rect(&element)?;
        let screen = context.driver.window_size()?;
        let visible = rect.x + rect.width >= 0
            && rect.y + rect.height >= 0
            && rect.x <= screen.width
            && rect.y <= screen.height;
        Ok(Value::Bool(visible))
    }
}

/// First native view whose tag equals the argument, ignoring case.
#[derive(Debug, Default)]
pub struct FindByViewTagExtension;

impl Extension for FindByViewTagExtension {
    fn name(&self) -> &str {
        "findElementByAndroidTag"
    }

    fn execute(&self, context: &ExtensionContext<'_>, args: &[Value]) -> Result<Value, DriverError> {
        require_native(context, self.name())?;
        let tag = first_arg(args, self.name())?.as_str().ok_or_else(|| {
            DriverError::InvalidArgument(format!("{} expects a tag name", self.name()))
        })?;
        let element = context
            .driver
            .find_by_view_tag(tag)?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NoSuchElement(format!("No view is tagged '{tag}'")))?;
        Ok(context.elements.register(element).to_wire())
    }
}

/// Invokes an options-menu item by its resource id, or by an element that
/// carries one.
#[derive(Debug, Default)]
pub struct MenuActionExtension;

impl Extension for MenuActionExtension {
    fn name(&self) -> &str {
        "invokeMenuActionSync"
    }

    fn execute(&self, context: &ExtensionContext<'_>, args: &[Value]) -> Result<Value, DriverError> {
        require_native(context, self.name())?;
        let arg = first_arg(args, self.name())?;
        let item_id = match arg {
            Value::Object(_) => {
                let id = ElementId::from_wire(arg).ok_or_else(|| {
                    DriverError::InvalidArgument(format!("{} expects an element", self.name()))
                })?;
                context.elements.resolve(id.as_str())?.platform_id().ok_or_else(|| {
                    DriverError::InvalidArgument(format!("Element '{id}' has no resource id"))
                })?
            }
            other => integer(other).ok_or_else(|| {
                DriverError::InvalidArgument(format!(
                    "{} expects a resource id or an element",
                    self.name()
                ))
            })?,
        };
        context.driver.invoke_menu_action(item_id)?;
        Ok(Value::String(INVOKED.to_string()))
    }
}

pub struct ExtensionRegistry {
    catalog: BTreeMap<String, Arc<dyn Extension>>,
    loaded: RwLock<BTreeMap<String, Arc<dyn Extension>>>,
}

impl ExtensionRegistry {
    pub fn new(catalog: Vec<Arc<dyn Extension>>) -> Self {
        Self {
            catalog: catalog
                .into_iter()
                .map(|ext| (ext.name().to_string(), ext))
                .collect(),
            loaded: RwLock::new(BTreeMap::new()),
        }
    }

    /// Catalog holding the bundled extensions.
    pub fn builtin() -> Self {
        Self::new(vec![
            Arc::new(SessionInfoExtension),
            Arc::new(TwoPointerGestureExtension),
            Arc::new(ViewportVisibilityExtension),
            Arc::new(FindByViewTagExtension),
            Arc::new(MenuActionExtension),
        ])
    }

    pub fn available(&self) -> Vec<&str> {
        self.catalog.keys().map(String::as_str).collect()
    }

    /// Activates a catalog entry; loading twice is harmless.
    pub fn load(&self, name: &str) -> Result<(), DriverError> {
        let ext = self.catalog.get(name).ok_or_else(|| {
            DriverError::UnknownCommand(format!(
                "Extension '{name}' could not be found; available: {}",
                self.available().join(", ")
            ))
        })?;
        let mut loaded = rwlock_write_or_recover(&self.loaded);
        if loaded.insert(name.to_string(), Arc::clone(ext)).is_none() {
            info!(extension = name, "Extension loaded");
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, session, args), fields(session_id = %session.id()))]
    pub fn execute(&self, session: &Session, name: &str, args: &[Value]) -> Result<Value, DriverError> {
        let ext = rwlock_read_or_recover(&self.loaded)
            .get(name)
            .cloned()
            .ok_or_else(|| {
                DriverError::UnknownCommand(format!("Extension '{name}' has not been loaded"))
            })?;
        ext.execute(&Self::context(session), args)
    }

    /// Runs `script` as a catalog plugin when it names one; `None` otherwise.
    pub fn run_script(
        &self,
        session: &Session,
        script: &str,
        args: &[Value],
    ) -> Option<Result<Value, DriverError>> {
        let ext = self.catalog.get(script.trim())?;
        debug!(extension = ext.name(), "Running native script");
        Some(ext.execute(&Self::context(session), args))
    }

    fn context(session: &Session) -> ExtensionContext<'_> {
        ExtensionContext {
            session_id: session.id().as_str(),
            context: session.current_context(),
            capabilities: session.capabilities(),
            driver: session.driver(),
            elements: session,
        }
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
