use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

pub const NO_SUCH_CONTEXT_MESSAGE: &str =
    "Invalid window handle was used: only 'NATIVE_APP' and 'WEBVIEW' are supported.";

/// Closed taxonomy of failures a command can end in.
///
/// Drivers translate platform faults into one of these before returning;
/// anything they cannot classify becomes [`DriverError::Unknown`].
#[derive(Error, Debug, Clone)]
pub enum DriverError {
    #[error("{0}")]
    NoSuchDriver(String),
    #[error("{0}")]
    NoSuchElement(String),
    #[error("{0}")]
    NoSuchFrame(String),
    #[error("{0}")]
    UnknownCommand(String),
    #[error("{0}")]
    UnsupportedOperation(String),
    #[error("{0}")]
    StaleElementReference(String),
    #[error("{0}")]
    ElementNotVisible(String),
    #[error("{0}")]
    InvalidElementState(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("The application under test crashed: {0}")]
    AppCrashed(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Another action chain is still running; gave up after {timeout_ms}ms")]
    SessionBusy { timeout_ms: u64 },
    #[error("{0}")]
    JavaScript(String),
    #[error("{0}")]
    Timeout(String),
    #[error("{message}")]
    NoSuchContext { requested: String, message: String },
    #[error("{0}")]
    UnexpectedAlertOpen(String),
    #[error("No alert is open")]
    NoAlertOpen,
    #[error("{0}")]
    ScriptTimeout(String),
    #[error("{0}")]
    InvalidSelector(String),
    #[error("{0}")]
    SessionNotCreated(String),
    #[error("{0}")]
    MoveTargetOutOfBounds(String),
    #[error("{message}")]
    Unknown {
        message: String,
        #[source]
        source: Option<Arc<dyn StdError + Send + Sync>>,
    },
}

impl DriverError {
    pub fn unknown(message: impl Into<String>) -> Self {
        DriverError::Unknown {
            message: message.into(),
            source: None,
        }
    }

    pub fn unknown_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        DriverError::Unknown {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    pub fn no_such_context(requested: impl Into<String>) -> Self {
        DriverError::NoSuchContext {
            requested: requested.into(),
            message: NO_SUCH_CONTEXT_MESSAGE.to_string(),
        }
    }

    pub fn unsupported(command: &str) -> Self {
        DriverError::UnsupportedOperation(format!(
            "'{command}' is not supported in the current context"
        ))
    }

    pub fn stale(id: &str) -> Self {
        DriverError::StaleElementReference(format!(
            "The element with id '{id}' was not found."
        ))
    }

    /// Messages of the `source()` chain, outermost first.
    pub fn cause_chain(&self) -> Vec<String> {
        let mut causes = Vec::new();
        let mut current = StdError::source(self);
        while let Some(err) = current {
            causes.push(err.to_string());
            current = err.source();
        }
        causes
    }
}
