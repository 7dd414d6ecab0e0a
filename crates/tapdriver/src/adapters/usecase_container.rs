use std::sync::Arc;

use crate::usecases::ports::{Clock, DriverFactory, Sleeper};
use crate::usecases::{
    ExtensionRegistry, FindElementUseCaseImpl, PerformActionsUseCaseImpl, SessionDefaults,
    SessionManager,
};

/// Everything handlers need, wired once at startup.
pub struct UseCaseContainer {
    pub sessions: Arc<SessionManager>,
    pub elements: FindElementUseCaseImpl,
    pub actions: PerformActionsUseCaseImpl,
    pub extensions: ExtensionRegistry,
}

impl UseCaseContainer {
    pub fn new(
        factory: Arc<dyn DriverFactory>,
        defaults: SessionDefaults,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new(factory, defaults)),
            elements: FindElementUseCaseImpl::new(Arc::clone(&clock), Arc::clone(&sleeper)),
            actions: PerformActionsUseCaseImpl::new(clock, sleeper),
            extensions: ExtensionRegistry::builtin(),
        }
    }
}
