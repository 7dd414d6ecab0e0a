use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::usecases::ports::saturating_millis;
use crate::usecases::{DEFAULT_POLL_INTERVAL, ElementIdStyle, SessionDefaults, Timeouts};

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
const DEFAULT_PAGE_LOAD_MS: u64 = 30_000;
const DEFAULT_SCRIPT_MS: u64 = 30_000;
const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 5;
const DEFAULT_MAX_REQUEST_BYTES: usize = 1_048_576; // 1MB

pub const ENV_LISTEN: &str = "TAPDRIVER_LISTEN";
pub const ENV_IMPLICIT_WAIT_MS: &str = "TAPDRIVER_IMPLICIT_WAIT_MS";
pub const ENV_POLL_INTERVAL_MS: &str = "TAPDRIVER_POLL_INTERVAL_MS";
pub const ENV_PAGE_LOAD_TIMEOUT_MS: &str = "TAPDRIVER_PAGE_LOAD_TIMEOUT_MS";
pub const ENV_SCRIPT_TIMEOUT_MS: &str = "TAPDRIVER_SCRIPT_TIMEOUT_MS";
pub const ENV_LOCK_TIMEOUT: &str = "TAPDRIVER_LOCK_TIMEOUT";
pub const ENV_MAX_REQUEST: &str = "TAPDRIVER_MAX_REQUEST";
pub const ENV_SCENE: &str = "TAPDRIVER_SCENE";
pub const ENV_ELEMENT_IDS: &str = "TAPDRIVER_ELEMENT_IDS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid listen address '{value}'")]
    InvalidListen {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen: String,
    pub implicit_wait: Duration,
    pub poll_interval: Duration,
    pub page_load_timeout: Duration,
    pub script_timeout: Duration,
    pub lock_timeout: Duration,
    pub max_request_bytes: usize,
    pub scene: Option<PathBuf>,
    pub element_ids: ElementIdStyle,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring invalid configuration value");
            default
        }),
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolves every setting through `lookup`, falling back per key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key, default| Duration::from_millis(parse_or(&lookup, key, default));
        Self {
            listen: lookup(ENV_LISTEN)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
            implicit_wait: millis(ENV_IMPLICIT_WAIT_MS, 0),
            poll_interval: millis(ENV_POLL_INTERVAL_MS, saturating_millis(DEFAULT_POLL_INTERVAL)),
            page_load_timeout: millis(ENV_PAGE_LOAD_TIMEOUT_MS, DEFAULT_PAGE_LOAD_MS),
            script_timeout: millis(ENV_SCRIPT_TIMEOUT_MS, DEFAULT_SCRIPT_MS),
            lock_timeout: Duration::from_secs(parse_or(
                &lookup,
                ENV_LOCK_TIMEOUT,
                DEFAULT_LOCK_TIMEOUT_SECS,
            )),
            max_request_bytes: parse_or(&lookup, ENV_MAX_REQUEST, DEFAULT_MAX_REQUEST_BYTES),
            scene: lookup(ENV_SCENE)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
            element_ids: parse_or(&lookup, ENV_ELEMENT_IDS, ElementIdStyle::default()),
        }
    }

    pub fn with_listen(mut self, listen: impl Into<String>) -> Self {
        self.listen = listen.into();
        self
    }

    pub fn with_implicit_wait(mut self, wait: Duration) -> Self {
        self.implicit_wait = wait;
        self
    }

    pub fn with_page_load_timeout(mut self, timeout: Duration) -> Self {
        self.page_load_timeout = timeout;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_max_request_bytes(mut self, max: usize) -> Self {
        self.max_request_bytes = max;
        self
    }

    pub fn with_scene(mut self, scene: impl Into<PathBuf>) -> Self {
        self.scene = Some(scene.into());
        self
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidListen {
                value: self.listen.clone(),
                source,
            })
    }

    pub fn session_defaults(&self) -> SessionDefaults {
        SessionDefaults {
            timeouts: Timeouts {
                implicit_wait: self.implicit_wait,
                page_load: self.page_load_timeout,
                script: self.script_timeout,
            },
            poll_interval: self.poll_interval,
            lock_timeout: self.lock_timeout,
            element_ids: self.element_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.listen, DEFAULT_LISTEN);
        assert_eq!(config.implicit_wait, Duration::ZERO);
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.page_load_timeout, Duration::from_secs(30));
        assert_eq!(config.lock_timeout, Duration::from_secs(5));
        assert_eq!(config.max_request_bytes, DEFAULT_MAX_REQUEST_BYTES);
        assert!(config.scene.is_none());
        assert_eq!(config.element_ids, ElementIdStyle::Random);
    }

    #[test]
    fn test_element_id_style() {
        let platform = config(&[(ENV_ELEMENT_IDS, "platform")]);
        assert_eq!(platform.session_defaults().element_ids, ElementIdStyle::PlatformId);
        let unknown = config(&[(ENV_ELEMENT_IDS, "sequential")]);
        assert_eq!(unknown.element_ids, ElementIdStyle::Random);
    }

    #[test]
    fn test_reads_environment_values() {
        let config = config(&[
            (ENV_LISTEN, "0.0.0.0:4723"),
            (ENV_IMPLICIT_WAIT_MS, "1500"),
            (ENV_LOCK_TIMEOUT, "2"),
            (ENV_SCENE, "/tmp/app.json"),
        ]);
        assert_eq!(config.listen, "0.0.0.0:4723");
        assert_eq!(config.implicit_wait, Duration::from_millis(1500));
        assert_eq!(config.lock_timeout, Duration::from_secs(2));
        assert_eq!(config.scene, Some(PathBuf::from("/tmp/app.json")));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config(&[(ENV_IMPLICIT_WAIT_MS, "soon"), (ENV_MAX_REQUEST, "-1")]);
        assert_eq!(config.implicit_wait, Duration::ZERO);
        assert_eq!(config.max_request_bytes, DEFAULT_MAX_REQUEST_BYTES);
    }

    #[test]
    fn test_builder_pattern() {
        let config = config(&[])
            .with_listen("127.0.0.1:0")
            .with_implicit_wait(Duration::from_millis(250))
            .with_page_load_timeout(Duration::from_secs(5))
            .with_scene("scene.json");
        let defaults = config.session_defaults();
        assert_eq!(defaults.timeouts.implicit_wait, Duration::from_millis(250));
        assert_eq!(defaults.timeouts.page_load, Duration::from_secs(5));
        assert_eq!(config.listen_addr().unwrap().port(), 0);
    }

    #[test]
    fn test_invalid_listen_address() {
        let err = config(&[(ENV_LISTEN, "not-an-address")])
            .listen_addr()
            .unwrap_err();
        assert!(err.to_string().contains("not-an-address"));
    }
}
