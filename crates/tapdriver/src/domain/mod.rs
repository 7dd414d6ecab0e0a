//! Pure domain types: identifiers, locators, contexts, geometry and gestures.

pub mod actions;
pub mod context;
pub mod geometry;
pub mod locator;
pub mod session_types;
pub mod types;

pub use actions::{ActionBatch, ActionChain, PointerAction, PointerContext, PointerOrigin};
pub use context::{ExecutionContext, NATIVE_CONTEXT, WEB_CONTEXT_PREFIX, WebSurfaceId};
pub use geometry::{Point, Rect, Size};
pub use locator::{Locator, LocatorError, Strategy};
pub use session_types::{Capabilities, ElementId, SessionId};
pub use types::{Cookie, FlickGesture, Orientation, ScrollGesture, TimeoutKind};
