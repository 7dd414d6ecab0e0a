//! NATIVE / WEB(id) execution-context state machine.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ExecutionContext;
use crate::usecases::element_registry::ElementRegistry;
use crate::usecases::ports::{AutomationDriver, DriverError, DriverFactory};

pub struct ExecutionContextController {
    factory: Arc<dyn DriverFactory>,
    current: ExecutionContext,
    driver: Arc<dyn AutomationDriver>,
    native: Arc<dyn AutomationDriver>,
}

impl ExecutionContextController {
    /// Starts in NATIVE, bound to `native_driver`.
    pub fn new(factory: Arc<dyn DriverFactory>, native_driver: Arc<dyn AutomationDriver>) -> Self {
        Self {
            factory,
            current: ExecutionContext::Native,
            driver: Arc::clone(&native_driver),
            native: native_driver,
        }
    }

    pub fn current(&self) -> &ExecutionContext {
        &self.current
    }

    pub fn driver(&self) -> Arc<dyn AutomationDriver> {
        Arc::clone(&self.driver)
    }

    /// NATIVE followed by whatever web surfaces the application exposes now.
    pub fn enumerate(&self) -> Result<Vec<ExecutionContext>, DriverError> {
        let mut contexts = vec![ExecutionContext::Native];
        contexts.extend(
            self.factory
                .web_surfaces()?
                .into_iter()
                .map(ExecutionContext::Web),
        );
        Ok(contexts)
    }

    fn resolve_target(&self, name: &str) -> Result<ExecutionContext, DriverError> {
        let target = ExecutionContext::parse(name).ok_or_else(|| DriverError::no_such_context(name))?;
        if target == ExecutionContext::Native || target == self.current {
            return Ok(target);
        }
        let available = self.enumerate()?;
        if target.is_web_alias() {
            return available
                .into_iter()
                .find(ExecutionContext::is_web)
                .ok_or_else(|| DriverError::no_such_context(name));
        }
        if available.contains(&target) {
            Ok(target)
        } else {
            Err(DriverError::no_such_context(name))
        }
    }

    /// Switches to the context called `name`.
    ///
    /// Returns `false` when `name` already is the current context, in which
    /// case nothing (including the registry) is touched.
    pub fn switch_to(
        &mut self,
        name: &str,
        registry: &mut ElementRegistry,
    ) -> Result<bool, DriverError> {
        let target = self.resolve_target(name)?;
        if target == self.current {
            return Ok(false);
        }

        if let Err(err) = self.driver.release() {
            warn!(context = %self.current, error = %err, "Failed to release driver; continuing switch");
        }

        let driver = match self.factory.bind(&target) {
            Ok(driver) => driver,
            Err(err) => {
                warn!(target = %target, error = %err, "Failed to bind driver; restoring previous context");
                self.restore_previous(registry);
                return Err(err);
            }
        };

        registry.clear();
        info!(from = %self.current, to = %target, "Execution context switched");
        self.driver = driver;
        self.current = target;
        Ok(true)
    }

    /// Rebinds the context a failed switch left, or falls back to NATIVE.
    fn restore_previous(&mut self, registry: &mut ElementRegistry) {
        match self.factory.bind(&self.current) {
            Ok(previous) => self.driver = previous,
            Err(err) => {
                warn!(context = %self.current, error = %err, "Failed to rebind previous context; falling back to NATIVE_APP");
                if self.current != ExecutionContext::Native {
                    registry.clear();
                }
                self.current = ExecutionContext::Native;
                self.driver = Arc::clone(&self.native);
            }
        }
    }

    /// Releases the bound driver and returns to the session's native driver.
    pub fn teardown(&mut self) {
        if let Err(err) = self.driver.release() {
            warn!(context = %self.current, error = %err, "Failed to release driver during teardown");
        }
        self.current = ExecutionContext::Native;
        self.driver = Arc::clone(&self.native);
    }
}

impl std::fmt::Debug for ExecutionContextController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContextController")
            .field("current", &self.current)
            .finish()
    }
}
