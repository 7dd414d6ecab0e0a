use std::sync::Arc;

use serde_json::Value;

use super::driver::{AutomationDriver, ElementRef};
use super::errors::DriverError;
use crate::domain::{Capabilities, ElementId, ExecutionContext};

/// The session's element handles as an extension sees them.
pub trait ElementHandles {
    fn resolve(&self, id: &str) -> Result<ElementRef, DriverError>;

    fn register(&self, element: ElementRef) -> ElementId;

    fn known(&self) -> usize;
}

/// What an extension sees of the session it runs in.
pub struct ExtensionContext<'a> {
    pub session_id: &'a str,
    pub context: ExecutionContext,
    pub capabilities: &'a Capabilities,
    pub driver: Arc<dyn AutomationDriver>,
    pub elements: &'a dyn ElementHandles,
}

/// A named plugin. Runs through `POST .../extension/:name`, or through
/// `execute` with the plugin name as script while in NATIVE_APP.
pub trait Extension: Send + Sync {
    fn name(&self) -> &str;

    fn execute(&self, context: &ExtensionContext<'_>, args: &[Value]) -> Result<Value, DriverError>;
}
