#![deny(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! WebDriver-compatible remote control for mobile applications.
//!
//! Layers, innermost first: `domain` (pure types), `usecases` (session
//! engine and the driver ports), `adapters` (routing, handlers, wire
//! errors), `infra` (configuration and the scene backend) and `app` (CLI
//! and HTTP edge).

pub mod adapters;
pub mod app;
pub mod domain;
pub mod infra;
pub mod usecases;

pub use adapters::{CommandDispatcher, WireResponse};
pub use app::{ServerHandle, build_dispatcher, spawn_server};
pub use infra::{SceneDriverFactory, ServerConfig};
