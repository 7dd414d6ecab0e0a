//! One request in, exactly one envelope out.
//!
//! Resolves the route, binds the session, refuses commands while a web alert
//! is open and turns every failure, panics included, into a wire error.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::command::{CommandContext, CommandRequest, Handler, SessionScope};
use super::error::ErrorTranslator;
use super::handlers::{build_router, common::command_span};
use super::response::WireResponse;
use super::router::{CommandRouter, NotFound};
use super::usecase_container::UseCaseContainer;
use crate::usecases::Session;
use crate::usecases::ports::DriverError;

pub struct CommandDispatcher {
    router: CommandRouter<Handler>,
    usecases: Arc<UseCaseContainer>,
    translator: ErrorTranslator,
}

impl CommandDispatcher {
    pub fn new(usecases: Arc<UseCaseContainer>) -> Self {
        Self::with_router(build_router(), usecases)
    }

    pub fn with_router(router: CommandRouter<Handler>, usecases: Arc<UseCaseContainer>) -> Self {
        Self {
            router,
            usecases,
            translator: ErrorTranslator,
        }
    }

    pub fn router(&self) -> &CommandRouter<Handler> {
        &self.router
    }

    pub fn usecases(&self) -> &UseCaseContainer {
        &self.usecases
    }

    /// `Err` only when the path is not a command at all; the edge answers 404.
    pub fn dispatch(&self, method: &str, uri: &str, body: &[u8]) -> Result<WireResponse, NotFound> {
        let resolved = self.router.resolve(method, uri)?;
        let handler = *resolved.handler;
        let request = CommandRequest {
            method: resolved.method,
            uri: uri.to_string(),
            params: resolved.params,
            body: Value::Null,
        };
        let span = command_span(&request, &handler);
        let _enter = span.enter();
        let session_id = request.session_id().map(str::to_string);
        let outcome = catch_unwind(AssertUnwindSafe(|| self.run(handler, request, body)));
        Ok(outcome.unwrap_or_else(|panic| {
            self.translator.catch_all(session_id.as_deref(), panic.as_ref())
        }))
    }

    /// Envelope for a command whose worker died outside `dispatch`.
    pub fn fault(&self, method: &str, uri: &str, panic: &(dyn Any + Send)) -> WireResponse {
        let session_id = self
            .router
            .resolve(method, uri)
            .ok()
            .and_then(|resolved| resolved.params.get("sessionId").map(str::to_string));
        self.translator.catch_all(session_id.as_deref(), panic)
    }

    fn run(&self, handler: Handler, mut request: CommandRequest, body: &[u8]) -> WireResponse {
        let session_id = request.session_id().map(str::to_string);
        let session_id = session_id.as_deref();

        match parse_body(body) {
            Ok(value) => request.body = value,
            Err(err) => return self.translator.translate(session_id, &err),
        }

        let session = match self.bind_session(&handler, session_id) {
            Ok(session) => session,
            Err(err) => return self.translator.translate(session_id, &err),
        };

        let ctx = CommandContext::new(&request, &self.usecases, session.clone());
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            if let Some(session) = session.as_deref() {
                check_alert(&handler, session)?;
            }
            (handler.run)(&ctx)
        }));

        let envelope_id = match handler.scope {
            SessionScope::Create => self
                .usecases
                .sessions
                .current()
                .map(|session| session.id().to_string()),
            _ => session_id.map(str::to_string),
        };
        let envelope_id = envelope_id.as_deref();

        match outcome {
            Ok(Ok(value)) => {
                debug!(command = handler.name, "Command succeeded");
                WireResponse::success(envelope_id, value)
            }
            Ok(Err(err)) => self.translator.translate(envelope_id, &err),
            Err(panic) => self.translator.catch_all(envelope_id, panic.as_ref()),
        }
    }

    fn bind_session(
        &self,
        handler: &Handler,
        session_id: Option<&str>,
    ) -> Result<Option<Arc<Session>>, DriverError> {
        match handler.scope {
            SessionScope::None | SessionScope::Create | SessionScope::Teardown => Ok(None),
            SessionScope::Required => {
                let id = session_id.ok_or_else(|| {
                    DriverError::NoSuchDriver("The command needs a session id".to_string())
                })?;
                self.usecases.sessions.get(id).map(Some)
            }
        }
    }
}

/// An empty body is an empty object; anything else must be JSON.
fn parse_body(body: &[u8]) -> Result<Value, DriverError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(body)
        .map_err(|err| DriverError::InvalidArgument(format!("Request body is not valid JSON: {err}")))
}

fn check_alert(handler: &Handler, session: &Session) -> Result<(), DriverError> {
    if handler.alert_safe || !session.current_context().is_web() {
        return Ok(());
    }
    let driver = session.driver();
    if driver.is_alert_present()? {
        let text = driver.alert_text().unwrap_or_default();
        return Err(DriverError::UnexpectedAlertOpen(format!(
            "Modal dialog present: {text}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::router::HttpMethod;
    use crate::domain::{ExecutionContext, Rect, WebSurfaceId};
    use crate::usecases::SessionDefaults;
    use crate::usecases::ports::{Clock, DriverFactory, ElementRef, Sleeper};
    use crate::usecases::ports::test_support::{MockClock, MockDriver, MockDriverFactory};
    use serde_json::json;

    struct Fixture {
        factory: Arc<MockDriverFactory>,
        dispatcher: CommandDispatcher,
    }

    fn fixture_with(factory: MockDriverFactory) -> Fixture {
        let factory = Arc::new(factory);
        let clock = Arc::new(MockClock::new());
        let driver_factory: Arc<dyn DriverFactory> = Arc::clone(&factory) as Arc<dyn DriverFactory>;
        let time: Arc<dyn Clock> = Arc::clone(&clock) as Arc<dyn Clock>;
        let sleeper: Arc<dyn Sleeper> = clock;
        let usecases =
            UseCaseContainer::new(driver_factory, SessionDefaults::default(), time, sleeper);
        Fixture {
            factory,
            dispatcher: CommandDispatcher::new(Arc::new(usecases)),
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MockDriverFactory::new())
    }

    impl Fixture {
        fn call(&self, method: &str, path: &str, body: Value) -> Value {
            let body = if body.is_null() { Vec::new() } else { body.to_string().into_bytes() };
            self.dispatcher
                .dispatch(method, &format!("/wd/hub{path}"), &body)
                .unwrap()
                .to_json()
        }

        fn create(&self) -> String {
            let response = self.call("POST", "/session", json!({"desiredCapabilities": {"app": "demo"}}));
            assert_eq!(response["status"], 0, "{response}");
            response["sessionId"].as_str().unwrap().to_string()
        }
    }

    #[test]
    fn test_status_is_session_less() {
        let f = fixture();
        let response = f.call("GET", "/status", Value::Null);
        assert_eq!(response["status"], 0);
        assert_eq!(response["value"]["build"]["name"], "tapdriver");
        assert!(response.get("sessionId").is_none());
    }

    #[test]
    fn test_create_is_idempotent() {
        let f = fixture();
        let first = f.create();
        let second = f.create();
        assert_eq!(first, second);
        assert_eq!(f.factory.start_calls(), 1);

        let sessions = f.call("GET", "/sessions", Value::Null);
        assert_eq!(sessions["value"][0]["id"], first.as_str());
        assert_eq!(sessions["value"][0]["capabilities"]["app"], "demo");
    }

    #[test]
    fn test_wrong_session_id_is_no_such_driver() {
        let f = fixture();
        f.create();
        let response = f.call("GET", "/session/nope/url", Value::Null);
        assert_eq!(response["status"], 6);
        assert_eq!(response["sessionId"], "nope");
    }

    #[test]
    fn test_unmatched_session_path_is_unknown_command() {
        let f = fixture();
        let id = f.create();
        let response = f.call("GET", &format!("/session/{id}/ime/available_engines"), Value::Null);
        assert_eq!(response["status"], 9);
        assert_eq!(response["value"]["class"], "UnknownCommandException");

        let response = f.call("POST", &format!("/session/{id}/no/such/thing"), json!({}));
        assert_eq!(response["status"], 9);
    }

    #[test]
    fn test_outside_prefix_is_not_found() {
        let f = fixture();
        assert_eq!(
            f.dispatcher.dispatch("GET", "/status", b"").unwrap_err(),
            NotFound::OutsidePrefix
        );
    }

    #[test]
    fn test_invalid_json_body() {
        let f = fixture();
        let id = f.create();
        let response = f
            .dispatcher
            .dispatch("POST", &format!("/wd/hub/session/{id}/element"), b"{not json")
            .unwrap();
        assert_eq!(response.status, 13);
        assert_eq!(response.value["class"], "InvalidArgumentException");
    }

    #[test]
    fn test_find_missing_element() {
        let f = fixture();
        let id = f.create();
        let response = f.call(
            "POST",
            &format!("/session/{id}/element"),
            json!({"using": "id", "value": "login"}),
        );
        assert_eq!(response["status"], 7);
        assert!(response["value"]["message"].as_str().unwrap().contains("By.id: login"));

        let info = f.call("POST", &format!("/session/{id}/extension"), json!({"name": "sessionInfo"}));
        assert_eq!(info["status"], 0);
        let info = f.call("POST", &format!("/session/{id}/extension/sessionInfo"), json!({}));
        assert_eq!(info["value"]["knownElements"], 0);
    }

    #[test]
    fn test_find_and_click() {
        let button = ElementRef::new("n/button");
        let f = fixture_with(MockDriverFactory::new().with_native(
            MockDriver::new()
                .with_element("id", "login", button.clone())
                .with_rect(button, Rect::new(0, 0, 10, 10)),
        ));
        let id = f.create();
        let found = f.call(
            "POST",
            &format!("/session/{id}/element"),
            json!({"using": "id", "value": "login"}),
        );
        let element = found["value"]["ELEMENT"].as_str().unwrap().to_string();

        let again = f.call(
            "POST",
            &format!("/session/{id}/element"),
            json!({"using": "id", "value": "login"}),
        );
        assert_eq!(again["value"]["ELEMENT"], element.as_str());

        let clicked = f.call("POST", &format!("/session/{id}/element/{element}/click"), Value::Null);
        assert_eq!(clicked["status"], 0);
        assert!(f.factory.driver_for("NATIVE_APP").calls().contains(&"click(n/button)".to_string()));

        let stale = f.call("GET", &format!("/session/{id}/element/missing/text"), Value::Null);
        assert_eq!(stale["status"], 10);
    }

    #[test]
    fn test_context_switch_round_trip() {
        let f = fixture_with(MockDriverFactory::with_surfaces(vec![WebSurfaceId::new("WEBVIEW_1")]));
        let id = f.create();
        let contexts = f.call("GET", &format!("/session/{id}/contexts"), Value::Null);
        assert_eq!(contexts["value"], json!(["NATIVE_APP", "WEBVIEW_1"]));

        let switched = f.call("POST", &format!("/session/{id}/context"), json!({"name": "WEBVIEW"}));
        assert_eq!(switched["status"], 0);
        let current = f.call("GET", &format!("/session/{id}/context"), Value::Null);
        assert_eq!(current["value"], "WEBVIEW_1");

        let missing = f.call("POST", &format!("/session/{id}/context"), json!({"name": "WEBVIEW_7"}));
        assert_eq!(missing["status"], 23);
    }

    #[test]
    fn test_open_alert_blocks_unsafe_commands() {
        let f = fixture_with(MockDriverFactory::with_surfaces(vec![WebSurfaceId::new("WEBVIEW_1")]));
        let id = f.create();
        f.call("POST", &format!("/session/{id}/context"), json!({"name": "WEBVIEW_1"}));
        f.factory.driver_for("WEBVIEW_1").set_alert(Some("Leave page?"));

        let blocked = f.call("GET", &format!("/session/{id}/url"), Value::Null);
        assert_eq!(blocked["status"], 26);
        assert!(blocked["value"]["message"].as_str().unwrap().contains("Leave page?"));

        let text = f.call("GET", &format!("/session/{id}/alert_text"), Value::Null);
        assert_eq!(text["value"], "Leave page?");
        let accepted = f.call("POST", &format!("/session/{id}/accept_alert"), Value::Null);
        assert_eq!(accepted["status"], 0);

        let url = f.call("GET", &format!("/session/{id}/url"), Value::Null);
        assert_eq!(url["status"], 0);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let f = fixture();
        let id = f.create();
        assert_eq!(f.call("DELETE", &format!("/session/{id}"), Value::Null)["status"], 0);
        assert_eq!(f.call("DELETE", &format!("/session/{id}"), Value::Null)["status"], 0);
        assert_eq!(f.factory.stop_calls(), 1);
        assert_eq!(f.call("GET", &format!("/session/{id}"), Value::Null)["status"], 6);
    }

    #[test]
    fn test_perform_actions() {
        let f = fixture();
        let id = f.create();
        let response = f.call(
            "POST",
            &format!("/session/{id}/actions"),
            json!({"payload": [{"inputDevice": "touch", "actions": [
                {"name": "pointerDown", "x": 5, "y": 6},
                {"name": "pointerUp"}
            ]}]}),
        );
        assert_eq!(response["status"], 0, "{response}");
        let calls = f.factory.driver_for("NATIVE_APP").calls();
        assert!(calls.contains(&"pointer_down(0,5,6)".to_string()));
        assert!(calls.contains(&"pointer_up(0,5,6)".to_string()));

        let rejected = f.call(
            "POST",
            &format!("/session/{id}/actions"),
            json!({"payload": [{"inputDevice": "mouse", "actions": []}]}),
        );
        assert_eq!(rejected["status"], 9);
    }

    #[test]
    fn test_panicking_alert_check_becomes_catch_all() {
        let f = fixture_with(
            MockDriverFactory::with_surfaces(vec![WebSurfaceId::new("WEBVIEW_1")]).with_driver(
                ExecutionContext::Web(WebSurfaceId::new("WEBVIEW_1")),
                MockDriver::new().panicking("is_alert_present"),
            ),
        );
        let id = f.create();
        let switched = f.call("POST", &format!("/session/{id}/context"), json!({"name": "WEBVIEW_1"}));
        assert_eq!(switched["status"], 0);

        let response = f.call("GET", &format!("/session/{id}/url"), Value::Null);
        assert_eq!(response["status"], 13);
        assert_eq!(response["sessionId"], id.as_str());
        assert_eq!(response["value"]["message"], "CATCH_ALL: is_alert_present blew up");

        let next = f.call("GET", &format!("/session/{id}/context"), Value::Null);
        assert_eq!(next["value"], "WEBVIEW_1");
    }

    #[test]
    fn test_fault_envelope_names_the_session() {
        let f = fixture();
        let response = f
            .dispatcher
            .fault("GET", "/wd/hub/session/abc/url", &"worker lost");
        assert_eq!(response.status, 13);
        let body = response.to_json();
        assert_eq!(body["sessionId"], "abc");
        assert_eq!(body["value"]["message"], "CATCH_ALL: worker lost");

        let outside = f.dispatcher.fault("GET", "/elsewhere", &"worker lost");
        assert!(outside.to_json().get("sessionId").is_none());
    }

    fn explode(_ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
        panic!("boom");
    }

    #[test]
    fn test_panicking_handler_becomes_catch_all() {
        let f = fixture();
        let mut router = CommandRouter::new();
        router.register(
            HttpMethod::Get,
            "/explode",
            Handler::new("explode", explode).scope(SessionScope::None),
        );
        let dispatcher = CommandDispatcher::with_router(router, Arc::clone(&f.dispatcher.usecases));
        let response = dispatcher.dispatch("GET", "/wd/hub/explode", b"").unwrap();
        assert_eq!(response.status, 13);
        assert_eq!(response.value["message"], "CATCH_ALL: boom");

        let next = f.call("GET", "/status", Value::Null);
        assert_eq!(next["status"], 0);
    }
}
