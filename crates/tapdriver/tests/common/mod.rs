#![allow(dead_code)]

pub mod wire_client;

pub use wire_client::{WireClient, WireReply};

use std::path::PathBuf;
use std::sync::Arc;

use assert_cmd::Command;
use tapdriver::infra::load_scene;
use tapdriver::usecases::ports::DriverFactory;
use tapdriver::{SceneDriverFactory, ServerConfig, ServerHandle, build_dispatcher, spawn_server};

pub fn tapdriver_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("tapdriver"))
}

pub fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// A server on an ephemeral port playing a scene fixture.
pub struct TestServer {
    pub factory: Arc<SceneDriverFactory>,
    pub client: WireClient,
    handle: ServerHandle,
}

impl TestServer {
    pub fn start(fixture: &str) -> Self {
        Self::with_config(fixture, ServerConfig::from_lookup(|_| None))
    }

    pub fn with_config(fixture: &str, config: ServerConfig) -> Self {
        let config = config.with_listen("127.0.0.1:0");
        let scene = load_scene(&fixtures_path().join(fixture)).expect("fixture scene");
        let factory = Arc::new(SceneDriverFactory::new(scene));
        let driver_factory: Arc<dyn DriverFactory> = Arc::clone(&factory) as Arc<dyn DriverFactory>;
        let dispatcher = Arc::new(build_dispatcher(&config, driver_factory));
        let handle = spawn_server(&config, dispatcher).expect("server starts");
        let client = WireClient::new(handle.addr());
        Self {
            factory,
            client,
            handle,
        }
    }

    /// Creates a session and returns its id.
    pub fn new_session(&self) -> String {
        let reply = self
            .client
            .post("/wd/hub/session", r#"{"desiredCapabilities": {"platformName": "Android"}}"#);
        assert_eq!(reply.status_code(), 0, "session not created: {}", reply.body);
        reply.json()["sessionId"]
            .as_str()
            .expect("session id")
            .to_string()
    }
}
