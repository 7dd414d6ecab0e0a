//! Concrete adapters: configuration, clocks and the bundled scene backend.

pub mod config;
pub mod scene;
pub mod system_clock;

pub use config::{ConfigError, ServerConfig};
pub use scene::{SceneDriverFactory, SceneError, load_scene};
pub use system_clock::SystemClock;
