//! Composition root: CLI parsing, wiring and the HTTP edge.

pub mod commands;
pub mod http;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tapdriver_common::telemetry;
use tracing::{debug, info};

use crate::adapters::{CommandDispatcher, CommandRouter, Handler, UseCaseContainer};
use crate::infra::{SceneDriverFactory, SceneError, ServerConfig, SystemClock, load_scene};
use crate::usecases::ports::{Clock, DriverFactory, RealSleeper, Sleeper, saturating_millis};

pub use commands::{Cli, Commands, ServeArgs};
pub use http::{ApiServerError, ServerHandle, build_app, spawn_server};

/// Parses the command line and runs the chosen command.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _telemetry = telemetry::init_tracing(cli.log_level());
    debug!(command = ?cli.command, "CLI command parsed");

    match cli.command {
        Commands::Serve(args) => serve(args.apply(ServerConfig::from_env())),
        Commands::Routes => {
            let dispatcher = build_dispatcher(
                &ServerConfig::from_env(),
                Arc::new(SceneDriverFactory::default()),
            );
            write_routes(&mut io::stdout().lock(), dispatcher.router())
                .context("failed to write the route table")
        }
    }
}

fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let factory = scene_factory(&config)?;
    let dispatcher = Arc::new(build_dispatcher(&config, factory));
    let handle = spawn_server(&config, dispatcher)
        .with_context(|| format!("failed to start the server on {}", config.listen))?;
    info!(
        listen = %handle.addr(),
        implicit_wait_ms = saturating_millis(config.implicit_wait),
        "tapdriver ready"
    );
    http::wait_for_interrupt()?;
    handle.shutdown();
    Ok(())
}

/// The scene named by the configuration, or the built-in empty one.
pub fn scene_factory(config: &ServerConfig) -> Result<Arc<dyn DriverFactory>, SceneError> {
    let factory = match &config.scene {
        Some(path) => {
            let scene = load_scene(path)?;
            info!(scene = %path.display(), webviews = scene.webviews.len(), "Scene loaded");
            SceneDriverFactory::new(scene)
        }
        None => SceneDriverFactory::default(),
    };
    Ok(Arc::new(factory))
}

/// Wires the use cases around `factory` with the real clock and sleeper.
pub fn build_dispatcher(config: &ServerConfig, factory: Arc<dyn DriverFactory>) -> CommandDispatcher {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let sleeper: Arc<dyn Sleeper> = Arc::new(RealSleeper);
    let usecases = UseCaseContainer::new(factory, config.session_defaults(), clock, sleeper);
    CommandDispatcher::new(Arc::new(usecases))
}

/// One line per route: method, template, command name, alert-safe flag.
pub fn write_routes(out: &mut impl Write, router: &CommandRouter<Handler>) -> io::Result<()> {
    for route in router.routes() {
        writeln!(
            out,
            "{:<6} {:<60} {:<28} {}",
            route.method.as_str(),
            route.template.as_str(),
            route.handler.name,
            if route.handler.alert_safe { "alert-safe" } else { "-" }
        )?;
    }
    Ok(())
}
