//! The single active session and the manager that owns it.
//!
//! Lock order inside a session: `contexts` before `registry`. Nothing takes
//! the manager's `active` lock while holding a session lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::{Map, Value};
use tapdriver_common::mutex_lock_or_recover;
use tracing::{debug, info, warn};

use crate::domain::{Capabilities, ElementId, ExecutionContext, SessionId, TimeoutKind};
use crate::usecases::action_lock::DEFAULT_LOCK_TIMEOUT;
use crate::usecases::context::ExecutionContextController;
use crate::usecases::element_registry::{ElementIdStyle, ElementRegistry, HandleMinter};
use crate::usecases::implicit_wait::DEFAULT_POLL_INTERVAL;
use crate::usecases::ports::{
    AutomationDriver, DriverError, DriverFactory, ElementHandles, ElementRef,
};

/// Command whose configuration receives the `nativeEvents` capability.
pub const SEND_KEYS_COMMAND: &str = "sendKeysToElement";

/// Timeouts a client may change during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub implicit_wait: Duration,
    pub page_load: Duration,
    pub script: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            implicit_wait: Duration::ZERO,
            page_load: Duration::from_secs(30),
            script: Duration::from_secs(30),
        }
    }
}

impl Timeouts {
    pub fn set(&mut self, kind: TimeoutKind, value: Duration) {
        match kind {
            TimeoutKind::Implicit => self.implicit_wait = value,
            TimeoutKind::PageLoad => self.page_load = value,
            TimeoutKind::Script => self.script = value,
        }
    }
}

/// Server-wide defaults applied to every new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDefaults {
    pub timeouts: Timeouts,
    pub poll_interval: Duration,
    pub lock_timeout: Duration,
    pub element_ids: ElementIdStyle,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            timeouts: Timeouts::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            element_ids: ElementIdStyle::default(),
        }
    }
}

pub struct Session {
    id: SessionId,
    capabilities: Capabilities,
    contexts: Mutex<ExecutionContextController>,
    registry: Mutex<ElementRegistry>,
    command_config: Mutex<HashMap<String, Map<String, Value>>>,
    timeouts: Mutex<Timeouts>,
    action_lock: Mutex<()>,
    poll_interval: Duration,
    lock_timeout: Duration,
}

impl Session {
    fn new(
        id: SessionId,
        capabilities: Capabilities,
        contexts: ExecutionContextController,
        minter: Arc<dyn HandleMinter>,
        defaults: SessionDefaults,
    ) -> Self {
        let mut command_config = HashMap::new();
        let mut send_keys = Map::new();
        send_keys.insert(
            Capabilities::NATIVE_EVENTS.to_string(),
            Value::Bool(capabilities.native_events()),
        );
        command_config.insert(SEND_KEYS_COMMAND.to_string(), send_keys);

        Self {
            id,
            capabilities,
            contexts: Mutex::new(contexts),
            registry: Mutex::new(ElementRegistry::new(minter)),
            command_config: Mutex::new(command_config),
            timeouts: Mutex::new(defaults.timeouts),
            action_lock: Mutex::new(()),
            poll_interval: defaults.poll_interval,
            lock_timeout: defaults.lock_timeout,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Driver bound to the current context.
    pub fn driver(&self) -> Arc<dyn AutomationDriver> {
        mutex_lock_or_recover(&self.contexts).driver()
    }

    pub fn current_context(&self) -> ExecutionContext {
        mutex_lock_or_recover(&self.contexts).current().clone()
    }

    pub fn enumerate_contexts(&self) -> Result<Vec<ExecutionContext>, DriverError> {
        mutex_lock_or_recover(&self.contexts).enumerate()
    }

    pub fn switch_context(&self, name: &str) -> Result<bool, DriverError> {
        let mut contexts = mutex_lock_or_recover(&self.contexts);
        let mut registry = mutex_lock_or_recover(&self.registry);
        contexts.switch_to(name, &mut registry)
    }

    pub fn register(&self, element: ElementRef) -> ElementId {
        mutex_lock_or_recover(&self.registry).put(element)
    }

    pub fn register_all(&self, elements: Vec<ElementRef>) -> Vec<ElementId> {
        let mut registry = mutex_lock_or_recover(&self.registry);
        elements.into_iter().map(|e| registry.put(e)).collect()
    }

    pub fn resolve(&self, id: &str) -> Result<ElementRef, DriverError> {
        mutex_lock_or_recover(&self.registry).resolve(id)
    }

    /// Drops every element handle; called after navigation.
    pub fn clear_elements(&self) {
        let mut registry = mutex_lock_or_recover(&self.registry);
        registry.clear();
        debug!(session_id = %self.id, clears = registry.clear_count(), "Element handles cleared");
    }

    pub fn known_elements(&self) -> usize {
        mutex_lock_or_recover(&self.registry).len()
    }

    pub fn timeouts(&self) -> Timeouts {
        *mutex_lock_or_recover(&self.timeouts)
    }

    pub fn set_timeout(&self, kind: TimeoutKind, value: Duration) {
        mutex_lock_or_recover(&self.timeouts).set(kind, value);
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Merges `options` into the stored configuration of `command`.
    pub fn configure(&self, command: &str, options: Map<String, Value>) {
        let mut config = mutex_lock_or_recover(&self.command_config);
        config.entry(command.to_string()).or_default().extend(options);
    }

    pub fn command_config(&self, command: &str) -> Option<Map<String, Value>> {
        mutex_lock_or_recover(&self.command_config).get(command).cloned()
    }

    pub fn action_lock(&self) -> &Mutex<()> {
        &self.action_lock
    }

    fn teardown(&self) {
        let mut contexts = mutex_lock_or_recover(&self.contexts);
        contexts.teardown();
        mutex_lock_or_recover(&self.registry).clear();
    }
}

impl ElementHandles for Session {
    fn resolve(&self, id: &str) -> Result<ElementRef, DriverError> {
        Session::resolve(self, id)
    }

    fn register(&self, element: ElementRef) -> ElementId {
        Session::register(self, element)
    }

    fn known(&self) -> usize {
        self.known_elements()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("capabilities", &self.capabilities.len())
            .finish()
    }
}

/// Owns the at-most-one active session.
pub struct SessionManager {
    factory: Arc<dyn DriverFactory>,
    minter: Arc<dyn HandleMinter>,
    defaults: SessionDefaults,
    active: Mutex<Option<Arc<Session>>>,
}

impl SessionManager {
    pub fn new(factory: Arc<dyn DriverFactory>, defaults: SessionDefaults) -> Self {
        Self {
            factory,
            minter: defaults.element_ids.minter(),
            defaults,
            active: Mutex::new(None),
        }
    }

    pub fn defaults(&self) -> SessionDefaults {
        self.defaults
    }

    fn active(&self) -> MutexGuard<'_, Option<Arc<Session>>> {
        mutex_lock_or_recover(&self.active)
    }

    /// Creates the session, or refreshes and returns the existing one.
    ///
    /// Re-entry keeps the original capabilities and only clears the registry.
    pub fn create(&self, capabilities: Capabilities) -> Result<Arc<Session>, DriverError> {
        let mut active = self.active();
        if let Some(existing) = active.as_ref() {
            info!(session_id = %existing.id(), "Session already active; reusing it");
            existing.clear_elements();
            return Ok(Arc::clone(existing));
        }

        self.factory
            .start_application(&capabilities)
            .map_err(|err| match err {
                DriverError::SessionNotCreated(_) => err,
                other => DriverError::SessionNotCreated(format!(
                    "Error while starting the application: {other}"
                )),
            })?;
        let native = self
            .factory
            .bind(&ExecutionContext::Native)
            .map_err(|err| {
                DriverError::SessionNotCreated(format!("Error while binding the native driver: {err}"))
            })?;
        let contexts = ExecutionContextController::new(Arc::clone(&self.factory), native);
        let session = Arc::new(Session::new(
            SessionId::generate(),
            capabilities,
            contexts,
            Arc::clone(&self.minter),
            self.defaults,
        ));
        info!(session_id = %session.id(), "Session created");
        *active = Some(Arc::clone(&session));
        Ok(session)
    }

    /// The active session if `id` names it; NoSuchDriver otherwise.
    pub fn get(&self, id: &str) -> Result<Arc<Session>, DriverError> {
        match self.active().as_ref() {
            Some(session) if session.id().as_str() == id => Ok(Arc::clone(session)),
            Some(_) => Err(DriverError::NoSuchDriver(format!(
                "The session id '{id}' does not match the active session"
            ))),
            None => Err(DriverError::NoSuchDriver(
                "No session is active; create one first".to_string(),
            )),
        }
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        self.active().clone()
    }

    pub fn list(&self) -> Vec<Arc<Session>> {
        self.active().iter().cloned().collect()
    }

    /// Best-effort teardown. Returns whether a session was actually removed.
    ///
    /// A stale or unknown id still succeeds; only the active session's id
    /// tears anything down.
    pub fn delete(&self, id: &str) -> bool {
        let session = {
            let mut active = self.active();
            match active.as_ref() {
                Some(session) if session.id().as_str() == id => active.take(),
                _ => None,
            }
        };
        let Some(session) = session else {
            return false;
        };
        session.teardown();
        if let Err(err) = self.factory.stop_application() {
            warn!(session_id = %session.id(), error = %err, "Failed to stop application during session delete");
        }
        info!(session_id = %session.id(), "Session deleted");
        true
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("defaults", &self.defaults)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WebSurfaceId;
    use crate::usecases::ports::test_support::MockDriverFactory;
    use serde_json::json;

    fn manager(factory: &Arc<MockDriverFactory>) -> SessionManager {
        SessionManager::new(
            Arc::clone(factory) as Arc<dyn DriverFactory>,
            SessionDefaults::default(),
        )
    }

    fn caps(value: Value) -> Capabilities {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_create_twice_returns_same_id() {
        let factory = Arc::new(MockDriverFactory::new());
        let manager = manager(&factory);
        let first = manager.create(Capabilities::default()).unwrap();
        let second = manager.create(caps(json!({"other": 1}))).unwrap();
        assert_eq!(first.id(), second.id());
        assert!(second.capabilities().is_empty());
        assert_eq!(manager.list().len(), 1);
    }

    #[test]
    fn test_platform_id_style_reuses_view_ids() {
        let factory = Arc::new(MockDriverFactory::new());
        let manager = SessionManager::new(
            Arc::clone(&factory) as Arc<dyn DriverFactory>,
            SessionDefaults {
                element_ids: ElementIdStyle::PlatformId,
                ..SessionDefaults::default()
            },
        );
        let session = manager.create(Capabilities::default()).unwrap();
        let id = session.register(ElementRef::new("native/4").with_platform_id(2131));
        assert_eq!(id.as_str(), "2131");
        assert_eq!(session.resolve("2131").unwrap().key(), "native/4");
    }

    #[test]
    fn test_recreate_clears_elements() {
        let factory = Arc::new(MockDriverFactory::new());
        let manager = manager(&factory);
        let session = manager.create(Capabilities::default()).unwrap();
        let id = session.register(ElementRef::new("a"));
        manager.create(Capabilities::default()).unwrap();
        assert!(matches!(
            session.resolve(&id),
            Err(DriverError::StaleElementReference(_))
        ));
    }

    #[test]
    fn test_get_with_wrong_id_is_no_such_driver() {
        let factory = Arc::new(MockDriverFactory::new());
        let manager = manager(&factory);
        assert!(matches!(manager.get("x"), Err(DriverError::NoSuchDriver(_))));
        manager.create(Capabilities::default()).unwrap();
        assert!(matches!(manager.get("x"), Err(DriverError::NoSuchDriver(_))));
    }

    #[test]
    fn test_delete_resets_state_and_is_idempotent() {
        let factory = Arc::new(MockDriverFactory::with_surfaces(vec![WebSurfaceId::new(
            "WEBVIEW_0",
        )]));
        let manager = manager(&factory);
        let session = manager.create(Capabilities::default()).unwrap();
        session.switch_context("WEBVIEW_0").unwrap();
        let id = session.id().to_string();

        assert!(manager.delete(&id));
        assert!(manager.current().is_none());
        assert_eq!(session.current_context(), ExecutionContext::Native);
        assert_eq!(factory.stop_calls(), 1);

        assert!(!manager.delete(&id));
        assert_eq!(factory.stop_calls(), 1);
    }

    #[test]
    fn test_delete_survives_crashed_application() {
        let factory = Arc::new(MockDriverFactory::new());
        factory.fail_stop(DriverError::AppCrashed("process died".into()));
        let manager = manager(&factory);
        let session = manager.create(Capabilities::default()).unwrap();
        assert!(manager.delete(session.id()));
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_failed_start_is_session_not_created() {
        let factory = Arc::new(MockDriverFactory::new());
        factory.fail_start(DriverError::AppCrashed("boom".into()));
        let manager = manager(&factory);
        let err = manager.create(Capabilities::default()).unwrap_err();
        assert!(matches!(err, DriverError::SessionNotCreated(_)));
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_native_events_seeded_into_send_keys_config() {
        let factory = Arc::new(MockDriverFactory::new());
        let manager = manager(&factory);
        let session = manager.create(caps(json!({"nativeEvents": false}))).unwrap();
        let config = session.command_config(SEND_KEYS_COMMAND).unwrap();
        assert_eq!(config.get("nativeEvents"), Some(&json!(false)));
    }

    #[test]
    fn test_configure_merges_options() {
        let factory = Arc::new(MockDriverFactory::new());
        let manager = manager(&factory);
        let session = manager.create(Capabilities::default()).unwrap();
        let mut options = Map::new();
        options.insert("delay".into(), json!(20));
        session.configure(SEND_KEYS_COMMAND, options);
        let config = session.command_config(SEND_KEYS_COMMAND).unwrap();
        assert_eq!(config.get("nativeEvents"), Some(&json!(true)));
        assert_eq!(config.get("delay"), Some(&json!(20)));
        assert!(session.command_config("click").is_none());
    }

    #[test]
    fn test_context_switch_makes_handles_stale() {
        let factory = Arc::new(MockDriverFactory::with_surfaces(vec![WebSurfaceId::new(
            "WEBVIEW_0",
        )]));
        let manager = manager(&factory);
        let session = manager.create(Capabilities::default()).unwrap();
        let id = session.register(ElementRef::new("native/1"));
        session.switch_context("WEBVIEW_0").unwrap();
        assert!(matches!(
            session.resolve(&id),
            Err(DriverError::StaleElementReference(_))
        ));
    }

    #[test]
    fn test_set_timeout() {
        let factory = Arc::new(MockDriverFactory::new());
        let manager = manager(&factory);
        let session = manager.create(Capabilities::default()).unwrap();
        session.set_timeout(TimeoutKind::Implicit, Duration::from_millis(750));
        assert_eq!(session.timeouts().implicit_wait, Duration::from_millis(750));
        assert_eq!(session.timeouts().page_load, Duration::from_secs(30));
    }

    #[test]
    fn test_concurrent_create_yields_one_session() {
        let factory = Arc::new(MockDriverFactory::new());
        let manager = Arc::new(manager(&factory));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || manager.create(Capabilities::default()).unwrap().id().clone())
            })
            .collect();
        let ids: Vec<SessionId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(factory.start_calls(), 1);
    }
}
