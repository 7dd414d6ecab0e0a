//! Bundled automation backend that plays a JSON scene.
//!
//! The scene stands in for a device: a native view tree plus web surfaces
//! with pages, scripts and cookies. It backs the binary when no platform
//! bridge is attached and drives the end-to-end tests.

mod driver;
mod model;
mod query;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use driver::{SceneDriver, SceneDriverFactory};
pub use model::{Scene, SceneMenuItem, SceneNode, ScenePage, SceneSurface};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read scene {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scene {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn load_scene(path: &Path) -> Result<Scene, SceneError> {
    let raw = fs::read_to_string(path).map_err(|source| SceneError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| SceneError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
