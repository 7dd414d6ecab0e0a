use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::infra::ServerConfig;

const LONG_ABOUT: &str = r#"tapdriver speaks the JSON wire protocol used by WebDriver clients and
drives a mobile application on their behalf.

Commands live below /wd/hub. Without a platform bridge the server plays a JSON
scene document (a native view tree plus web surfaces), which is enough to run
client test suites end to end.

ENVIRONMENT:
    TAPDRIVER_LISTEN               listen address (default 127.0.0.1:8080)
    TAPDRIVER_IMPLICIT_WAIT_MS     initial implicit wait (default 0)
    TAPDRIVER_POLL_INTERVAL_MS     implicit-wait poll interval (default 200)
    TAPDRIVER_PAGE_LOAD_TIMEOUT_MS page-load timeout (default 30000)
    TAPDRIVER_SCRIPT_TIMEOUT_MS    async-script timeout (default 30000)
    TAPDRIVER_LOCK_TIMEOUT         action-lock wait in seconds (default 5)
    TAPDRIVER_MAX_REQUEST          request body limit in bytes (default 1MiB)
    TAPDRIVER_SCENE                scene document to play
    TAPDRIVER_ELEMENT_IDS          random (default) or platform view ids
    TAPDRIVER_LOG                  append logs to this file
    TAPDRIVER_LOG_FORMAT           text or json

EXAMPLES:
    tapdriver serve --listen 0.0.0.0:4723 --scene login.json
    tapdriver routes"#;

#[derive(Debug, Parser)]
#[command(name = "tapdriver")]
#[command(author, version)]
#[command(about = "WebDriver-compatible remote-control server for mobile applications")]
#[command(long_about = LONG_ABOUT)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        match (&self.command, self.verbose) {
            (_, true) => "debug",
            (Commands::Serve(_), false) => "info",
            (Commands::Routes, false) => "warn",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the wire protocol until interrupted
    Serve(ServeArgs),

    /// Print the command table: method, template, command, alert-safe
    Routes,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides TAPDRIVER_LISTEN)
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Implicit wait for new sessions, in milliseconds
    #[arg(long, value_name = "MS")]
    pub implicit_wait_ms: Option<u64>,

    /// Page-load timeout for new sessions, in milliseconds
    #[arg(long, value_name = "MS")]
    pub page_load_timeout_ms: Option<u64>,

    /// Scene document to play instead of the built-in empty scene
    #[arg(long, value_name = "FILE")]
    pub scene: Option<PathBuf>,
}

impl ServeArgs {
    /// Flags win over the environment.
    pub fn apply(&self, mut config: ServerConfig) -> ServerConfig {
        if let Some(listen) = &self.listen {
            config = config.with_listen(listen.clone());
        }
        if let Some(ms) = self.implicit_wait_ms {
            config = config.with_implicit_wait(Duration::from_millis(ms));
        }
        if let Some(ms) = self.page_load_timeout_ms {
            config = config.with_page_load_timeout(Duration::from_millis(ms));
        }
        if let Some(scene) = &self.scene {
            config = config.with_scene(scene.clone());
        }
        config
    }
}
