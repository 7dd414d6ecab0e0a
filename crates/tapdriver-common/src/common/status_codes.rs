//! Wire status codes of the JSON wire protocol.
//!
//! Every response envelope carries one of these in its `status` field:
//! - 0: success
//! - 6..=34: command failures, one code per failure family
//!
//! Several domain conditions share a code (13 is the generic bucket), so the
//! code alone does not identify the condition; the error body's `class`
//! field does.

pub const SUCCESS: i32 = 0;

// Session
pub const NO_SUCH_DRIVER: i32 = 6;
pub const SESSION_NOT_CREATED: i32 = 33;

// Element lookup and state
pub const NO_SUCH_ELEMENT: i32 = 7;
pub const STALE_ELEMENT_REFERENCE: i32 = 10;
pub const ELEMENT_NOT_VISIBLE: i32 = 11;
pub const INVALID_ELEMENT_STATE: i32 = 12;
pub const ELEMENT_IS_NOT_SELECTABLE: i32 = 15;
pub const X_PATH_LOOKUP_ERROR: i32 = 19;
pub const INVALID_ELEMENT_COORDINATES: i32 = 29;
pub const INVALID_SELECTOR: i32 = 32;
pub const MOVE_TARGET_OUT_OF_BOUNDS: i32 = 34;

// Windows, frames, contexts
pub const NO_SUCH_FRAME: i32 = 8;
pub const NO_SUCH_WINDOW: i32 = 23;

// Commands
pub const UNKNOWN_COMMAND: i32 = 9;
pub const UNKNOWN_ERROR: i32 = 13;

// Scripts and waits
pub const JAVA_SCRIPT_ERROR: i32 = 17;
pub const TIMEOUT: i32 = 21;
pub const SCRIPT_TIMEOUT: i32 = 28;

// Cookies
pub const INVALID_COOKIE_DOMAIN: i32 = 24;
pub const UNABLE_TO_SET_COOKIE: i32 = 25;

// Alerts
pub const UNEXPECTED_ALERT_OPEN: i32 = 26;
pub const NO_ALERT_OPEN_ERROR: i32 = 27;

// Input methods
pub const IME_NOT_AVAILABLE: i32 = 30;
pub const IME_ENGINE_ACTIVATION_FAILED: i32 = 31;

/// Error category for programmatic handling by clients and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Session, element, frame, window or alert not found
    NotFound,
    /// Invalid input parameters or selector
    InvalidInput,
    /// Resource busy or locked
    Busy,
    /// Internal server error
    Internal,
    /// Failure inside the automated application or platform
    External,
    /// A bounded wait expired
    Timeout,
    /// Command recognized but not available here
    Unsupported,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::InvalidInput => "invalid_input",
            ErrorCategory::Busy => "busy",
            ErrorCategory::Internal => "internal",
            ErrorCategory::External => "external",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Unsupported => "unsupported",
        }
    }
}

impl std::str::FromStr for ErrorCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_found" => Ok(ErrorCategory::NotFound),
            "invalid_input" => Ok(ErrorCategory::InvalidInput),
            "busy" => Ok(ErrorCategory::Busy),
            "internal" => Ok(ErrorCategory::Internal),
            "external" => Ok(ErrorCategory::External),
            "timeout" => Ok(ErrorCategory::Timeout),
            "unsupported" => Ok(ErrorCategory::Unsupported),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns whether a client may reasonably retry a command that failed with `code`.
///
/// Stale references and open alerts are not retryable as-is: the client must
/// re-find the element or handle the alert first.
pub fn is_retryable(code: i32) -> bool {
    matches!(code, TIMEOUT | SCRIPT_TIMEOUT | ELEMENT_NOT_VISIBLE)
}

/// Returns the error category for a given status code.
pub fn category_for_code(code: i32) -> ErrorCategory {
    match code {
        NO_SUCH_DRIVER | NO_SUCH_ELEMENT | NO_SUCH_FRAME | NO_SUCH_WINDOW
        | STALE_ELEMENT_REFERENCE | NO_ALERT_OPEN_ERROR => ErrorCategory::NotFound,
        INVALID_SELECTOR | X_PATH_LOOKUP_ERROR | INVALID_ELEMENT_COORDINATES
        | INVALID_COOKIE_DOMAIN | MOVE_TARGET_OUT_OF_BOUNDS => ErrorCategory::InvalidInput,
        UNEXPECTED_ALERT_OPEN | ELEMENT_NOT_VISIBLE | INVALID_ELEMENT_STATE
        | ELEMENT_IS_NOT_SELECTABLE => ErrorCategory::Busy,
        JAVA_SCRIPT_ERROR | UNABLE_TO_SET_COOKIE | SESSION_NOT_CREATED | IME_NOT_AVAILABLE
        | IME_ENGINE_ACTIVATION_FAILED => ErrorCategory::External,
        TIMEOUT | SCRIPT_TIMEOUT => ErrorCategory::Timeout,
        UNKNOWN_COMMAND => ErrorCategory::Unsupported,
        _ => ErrorCategory::Internal,
    }
}

/// Short state name for a status code, as used in log fields.
pub fn state_name(code: i32) -> &'static str {
    match code {
        SUCCESS => "success",
        NO_SUCH_DRIVER => "no such driver",
        NO_SUCH_ELEMENT => "no such element",
        NO_SUCH_FRAME => "no such frame",
        UNKNOWN_COMMAND => "unknown command",
        STALE_ELEMENT_REFERENCE => "stale element reference",
        ELEMENT_NOT_VISIBLE => "element not visible",
        INVALID_ELEMENT_STATE => "invalid element state",
        ELEMENT_IS_NOT_SELECTABLE => "element not selectable",
        JAVA_SCRIPT_ERROR => "javascript error",
        X_PATH_LOOKUP_ERROR => "xpath lookup error",
        TIMEOUT => "timeout",
        NO_SUCH_WINDOW => "no such window",
        INVALID_COOKIE_DOMAIN => "invalid cookie domain",
        UNABLE_TO_SET_COOKIE => "unable to set cookie",
        UNEXPECTED_ALERT_OPEN => "unexpected alert open",
        NO_ALERT_OPEN_ERROR => "no alert open",
        SCRIPT_TIMEOUT => "script timeout",
        INVALID_ELEMENT_COORDINATES => "invalid element coordinates",
        IME_NOT_AVAILABLE => "ime not available",
        IME_ENGINE_ACTIVATION_FAILED => "ime engine activation failed",
        INVALID_SELECTOR => "invalid selector",
        SESSION_NOT_CREATED => "session not created",
        MOVE_TARGET_OUT_OF_BOUNDS => "move target out of bounds",
        _ => "unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable_timeouts() {
        assert!(is_retryable(TIMEOUT));
        assert!(is_retryable(SCRIPT_TIMEOUT));
    }

    #[test]
    fn test_not_retryable_stale() {
        assert!(!is_retryable(STALE_ELEMENT_REFERENCE));
        assert!(!is_retryable(UNEXPECTED_ALERT_OPEN));
        assert!(!is_retryable(UNKNOWN_ERROR));
    }

    #[test]
    fn test_category_for_code_not_found() {
        assert_eq!(category_for_code(NO_SUCH_ELEMENT), ErrorCategory::NotFound);
        assert_eq!(category_for_code(NO_SUCH_WINDOW), ErrorCategory::NotFound);
        assert_eq!(category_for_code(NO_SUCH_DRIVER), ErrorCategory::NotFound);
    }

    #[test]
    fn test_category_for_code_unsupported() {
        assert_eq!(
            category_for_code(UNKNOWN_COMMAND),
            ErrorCategory::Unsupported
        );
    }

    #[test]
    fn test_category_for_unknown_code_is_internal() {
        assert_eq!(category_for_code(UNKNOWN_ERROR), ErrorCategory::Internal);
        assert_eq!(category_for_code(999), ErrorCategory::Internal);
    }

    #[test]
    fn test_category_round_trips_through_str() {
        for category in [
            ErrorCategory::NotFound,
            ErrorCategory::InvalidInput,
            ErrorCategory::Busy,
            ErrorCategory::Internal,
            ErrorCategory::External,
            ErrorCategory::Timeout,
            ErrorCategory::Unsupported,
        ] {
            assert_eq!(category.as_str().parse::<ErrorCategory>(), Ok(category));
        }
        assert!("bogus".parse::<ErrorCategory>().is_err());
    }

    #[test]
    fn test_state_name() {
        assert_eq!(state_name(SUCCESS), "success");
        assert_eq!(state_name(UNEXPECTED_ALERT_OPEN), "unexpected alert open");
        assert_eq!(state_name(-1), "unknown error");
    }
}
