//! What a handler receives and how it is described in the route table.

use std::sync::Arc;

use serde_json::Value;

use super::router::{HttpMethod, PathParams};
use super::usecase_container::UseCaseContainer;
use crate::usecases::Session;
use crate::usecases::ports::{AutomationDriver, DriverError, ElementRef};

pub type HandlerFn = fn(&CommandContext<'_>) -> Result<Value, DriverError>;

/// How a command relates to the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionScope {
    /// Runs without a session (status, list sessions, unknown commands).
    None,
    /// Creates the session; the envelope carries the new id.
    Create,
    /// `:sessionId` must name the active session.
    Required,
    /// Deletes the session; a missing session is not an error.
    Teardown,
}

#[derive(Debug, Clone, Copy)]
pub struct Handler {
    pub name: &'static str,
    pub run: HandlerFn,
    pub alert_safe: bool,
    pub scope: SessionScope,
}

impl Handler {
    pub const fn new(name: &'static str, run: HandlerFn) -> Self {
        Self {
            name,
            run,
            alert_safe: false,
            scope: SessionScope::Required,
        }
    }

    /// Runs even while a web alert is open.
    pub const fn alert_safe(mut self) -> Self {
        self.alert_safe = true;
        self
    }

    pub const fn scope(mut self, scope: SessionScope) -> Self {
        self.scope = scope;
        self
    }
}

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub method: HttpMethod,
    pub uri: String,
    pub params: PathParams,
    pub body: Value,
}

impl CommandRequest {
    pub fn session_id(&self) -> Option<&str> {
        self.params.get("sessionId")
    }
}

pub struct CommandContext<'a> {
    pub request: &'a CommandRequest,
    pub usecases: &'a UseCaseContainer,
    session: Option<Arc<Session>>,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        request: &'a CommandRequest,
        usecases: &'a UseCaseContainer,
        session: Option<Arc<Session>>,
    ) -> Self {
        Self {
            request,
            usecases,
            session,
        }
    }

    pub fn body(&self) -> &Value {
        &self.request.body
    }

    pub fn param(&self, name: &str) -> Result<&str, DriverError> {
        self.request
            .params
            .get(name)
            .ok_or_else(|| DriverError::InvalidArgument(format!("Missing path parameter '{name}'")))
    }

    pub fn session(&self) -> Result<&Arc<Session>, DriverError> {
        self.session
            .as_ref()
            .ok_or_else(|| DriverError::NoSuchDriver("No session is active; create one first".to_string()))
    }

    pub fn driver(&self) -> Result<Arc<dyn AutomationDriver>, DriverError> {
        Ok(self.session()?.driver())
    }

    /// The element named by the `:id` path segment.
    pub fn element(&self) -> Result<ElementRef, DriverError> {
        self.element_param("id")
    }

    pub fn element_param(&self, name: &str) -> Result<ElementRef, DriverError> {
        let id = self.param(name)?;
        self.session()?.resolve(id)
    }
}
