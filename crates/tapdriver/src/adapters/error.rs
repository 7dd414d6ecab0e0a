//! Single mapping from [`DriverError`] to wire status codes and error bodies.

use serde_json::{Value, json};
use tapdriver_common::{ErrorCategory, poison_recovery_count};
use tapdriver_common::status_codes;
use tracing::{error, warn};

use super::response::WireResponse;
use crate::usecases::ports::DriverError;

/// Prefix of messages produced by a handler that panicked.
pub const CATCH_ALL_PREFIX: &str = "CATCH_ALL: ";

impl DriverError {
    pub fn code(&self) -> i32 {
        match self {
            DriverError::NoSuchDriver(_) => status_codes::NO_SUCH_DRIVER,
            DriverError::NoSuchElement(_) => status_codes::NO_SUCH_ELEMENT,
            DriverError::NoSuchFrame(_) => status_codes::NO_SUCH_FRAME,
            DriverError::UnknownCommand(_) | DriverError::UnsupportedOperation(_) => {
                status_codes::UNKNOWN_COMMAND
            }
            DriverError::StaleElementReference(_) => status_codes::STALE_ELEMENT_REFERENCE,
            DriverError::ElementNotVisible(_) => status_codes::ELEMENT_NOT_VISIBLE,
            DriverError::InvalidElementState(_) => status_codes::INVALID_ELEMENT_STATE,
            DriverError::PermissionDenied(_)
            | DriverError::AppCrashed(_)
            | DriverError::InvalidArgument(_)
            | DriverError::SessionBusy { .. }
            | DriverError::Unknown { .. } => status_codes::UNKNOWN_ERROR,
            DriverError::JavaScript(_) => status_codes::JAVA_SCRIPT_ERROR,
            DriverError::Timeout(_) => status_codes::TIMEOUT,
            DriverError::NoSuchContext { .. } => status_codes::NO_SUCH_WINDOW,
            DriverError::UnexpectedAlertOpen(_) => status_codes::UNEXPECTED_ALERT_OPEN,
            DriverError::NoAlertOpen => status_codes::NO_ALERT_OPEN_ERROR,
            DriverError::ScriptTimeout(_) => status_codes::SCRIPT_TIMEOUT,
            DriverError::InvalidSelector(_) => status_codes::INVALID_SELECTOR,
            DriverError::SessionNotCreated(_) => status_codes::SESSION_NOT_CREATED,
            DriverError::MoveTargetOutOfBounds(_) => status_codes::MOVE_TARGET_OUT_OF_BOUNDS,
        }
    }

    /// Stable exception class reported in the error body.
    pub fn class_name(&self) -> &'static str {
        match self {
            DriverError::NoSuchDriver(_) => "NoSuchDriverException",
            DriverError::NoSuchElement(_) => "NoSuchElementException",
            DriverError::NoSuchFrame(_) => "NoSuchFrameException",
            DriverError::UnknownCommand(_) => "UnknownCommandException",
            DriverError::UnsupportedOperation(_) => "UnsupportedOperationException",
            DriverError::StaleElementReference(_) => "StaleElementReferenceException",
            DriverError::ElementNotVisible(_) => "ElementNotVisibleException",
            DriverError::InvalidElementState(_) => "InvalidElementStateException",
            DriverError::PermissionDenied(_) => "PermissionDeniedException",
            DriverError::AppCrashed(_) => "AppCrashedException",
            DriverError::InvalidArgument(_) => "InvalidArgumentException",
            DriverError::SessionBusy { .. } => "SessionBusyException",
            DriverError::JavaScript(_) => "JavaScriptException",
            DriverError::Timeout(_) => "TimeoutException",
            DriverError::NoSuchContext { .. } => "NoSuchContextException",
            DriverError::UnexpectedAlertOpen(_) => "UnexpectedAlertOpenException",
            DriverError::NoAlertOpen => "NoAlertPresentException",
            DriverError::ScriptTimeout(_) => "ScriptTimeoutException",
            DriverError::InvalidSelector(_) => "InvalidSelectorException",
            DriverError::SessionNotCreated(_) => "SessionNotCreatedException",
            DriverError::MoveTargetOutOfBounds(_) => "MoveTargetOutOfBoundsException",
            DriverError::Unknown { .. } => "UnknownErrorException",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DriverError::SessionBusy { .. } => ErrorCategory::Busy,
            DriverError::InvalidArgument(_) => ErrorCategory::InvalidInput,
            DriverError::AppCrashed(_) | DriverError::PermissionDenied(_) => {
                ErrorCategory::External
            }
            DriverError::UnsupportedOperation(_) => ErrorCategory::Unsupported,
            _ => status_codes::category_for_code(self.code()),
        }
    }

    /// Structured detail for logs.
    pub fn context(&self) -> Value {
        match self {
            DriverError::SessionBusy { timeout_ms } => json!({ "timeout_ms": timeout_ms }),
            DriverError::NoSuchContext { requested, .. } => json!({ "requested": requested }),
            DriverError::Unknown { .. } => json!({ "causes": self.cause_chain() }),
            _ => json!({}),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            DriverError::SessionBusy { .. } => true,
            _ => status_codes::is_retryable(self.code()),
        }
    }
}

/// Turns failures into wire responses and logs them once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorTranslator;

impl ErrorTranslator {
    pub fn translate(&self, session_id: Option<&str>, err: &DriverError) -> WireResponse {
        let code = err.code();
        if matches!(err, DriverError::Unknown { .. }) {
            error!(
                status = code,
                state = status_codes::state_name(code),
                class = err.class_name(),
                context = %err.context(),
                error = %err,
                "Command failed"
            );
        } else {
            warn!(
                status = code,
                state = status_codes::state_name(code),
                class = err.class_name(),
                category = %err.category(),
                retryable = err.is_retryable(),
                error = %err,
                "Command failed"
            );
        }
        WireResponse::error(session_id, code, error_body(err))
    }

    /// Maps a panic payload caught at the dispatch boundary.
    pub fn catch_all(&self, session_id: Option<&str>, payload: &(dyn std::any::Any + Send)) -> WireResponse {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "handler panicked".to_string());
        let err = DriverError::unknown(format!("{CATCH_ALL_PREFIX}{detail}"));
        error!(
            lock_recoveries = poison_recovery_count(),
            "Handler panicked; locks it held are recovered on next use"
        );
        self.translate(session_id, &err)
    }
}

fn error_body(err: &DriverError) -> Value {
    let mut body = json!({
        "message": err.to_string(),
        "class": err.class_name(),
    });
    let causes = err.cause_chain();
    if !causes.is_empty() {
        body["stacktrace"] = json!(causes);
    }
    body
}
