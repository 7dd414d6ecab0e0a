use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::{Capabilities, ExecutionContext, WebSurfaceId};
use crate::usecases::ports::{AutomationDriver, DriverError, DriverFactory};

use super::MockDriver;

/// Hands out one [`MockDriver`] per context name and records every bind.
#[derive(Debug, Default)]
pub struct MockDriverFactory {
    surfaces: Mutex<Vec<WebSurfaceId>>,
    drivers: Mutex<HashMap<String, Arc<MockDriver>>>,
    bind_failures: Mutex<HashMap<String, DriverError>>,
    start_failure: Mutex<Option<DriverError>>,
    stop_failure: Mutex<Option<DriverError>>,
    bound: Mutex<Vec<String>>,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
}

impl MockDriverFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_surfaces(surfaces: Vec<WebSurfaceId>) -> Self {
        let factory = Self::new();
        factory.set_surfaces(surfaces);
        factory
    }

    /// Uses `driver` for the native context.
    pub fn with_native(self, driver: MockDriver) -> Self {
        self.with_driver(ExecutionContext::Native, driver)
    }

    pub fn with_driver(self, context: ExecutionContext, driver: MockDriver) -> Self {
        let name = context.name().to_string();
        self.drivers
            .lock()
            .unwrap()
            .insert(name, Arc::new(driver.with_context(context)));
        self
    }

    pub fn set_surfaces(&self, surfaces: Vec<WebSurfaceId>) {
        *self.surfaces.lock().unwrap() = surfaces;
    }

    pub fn fail_bind(&self, context: &str, error: DriverError) {
        self.bind_failures
            .lock()
            .unwrap()
            .insert(context.to_string(), error);
    }

    pub fn fail_start(&self, error: DriverError) {
        *self.start_failure.lock().unwrap() = Some(error);
    }

    pub fn fail_stop(&self, error: DriverError) {
        *self.stop_failure.lock().unwrap() = Some(error);
    }

    /// The driver bound (or to be bound) for `context`.
    pub fn driver_for(&self, context: &str) -> Arc<MockDriver> {
        let context = ExecutionContext::parse(context).unwrap_or_default();
        self.driver(&context)
    }

    fn driver(&self, context: &ExecutionContext) -> Arc<MockDriver> {
        let mut drivers = self.drivers.lock().unwrap();
        Arc::clone(
            drivers
                .entry(context.name().to_string())
                .or_insert_with(|| Arc::new(MockDriver::new().with_context(context.clone()))),
        )
    }

    pub fn bound(&self) -> Vec<String> {
        self.bound.lock().unwrap().clone()
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

impl DriverFactory for MockDriverFactory {
    fn bind(&self, context: &ExecutionContext) -> Result<Arc<dyn AutomationDriver>, DriverError> {
        if let Some(err) = self.bind_failures.lock().unwrap().get(context.name()) {
            return Err(err.clone());
        }
        self.bound.lock().unwrap().push(context.name().to_string());
        Ok(self.driver(context) as Arc<dyn AutomationDriver>)
    }

    fn web_surfaces(&self) -> Result<Vec<WebSurfaceId>, DriverError> {
        Ok(self.surfaces.lock().unwrap().clone())
    }

    fn start_application(&self, _capabilities: &Capabilities) -> Result<(), DriverError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        match self.start_failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn stop_application(&self) -> Result<(), DriverError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        match self.stop_failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
