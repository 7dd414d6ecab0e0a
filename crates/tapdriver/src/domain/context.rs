use std::fmt;

pub const NATIVE_CONTEXT: &str = "NATIVE_APP";
pub const WEB_CONTEXT_PREFIX: &str = "WEBVIEW";

/// Identifier of a web surface as exposed by the running application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WebSurfaceId(String);

impl WebSurfaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The `n`th surface of the driver's current enumeration.
    pub fn indexed(index: usize) -> Self {
        Self(format!("{WEB_CONTEXT_PREFIX}_{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WebSurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Surface that commands currently execute against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ExecutionContext {
    #[default]
    Native,
    Web(WebSurfaceId),
}

impl ExecutionContext {
    pub fn web(id: impl Into<String>) -> Self {
        ExecutionContext::Web(WebSurfaceId::new(id))
    }

    pub fn name(&self) -> &str {
        match self {
            ExecutionContext::Native => NATIVE_CONTEXT,
            ExecutionContext::Web(id) => id.as_str(),
        }
    }

    pub fn is_web(&self) -> bool {
        matches!(self, ExecutionContext::Web(_))
    }

    /// Parses a client-supplied name.
    ///
    /// Returns `None` for names that can never denote a context; whether a
    /// `WEBVIEW*` name is currently enumerable is decided by the controller.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name == NATIVE_CONTEXT {
            return Some(ExecutionContext::Native);
        }
        if name.starts_with(WEB_CONTEXT_PREFIX) {
            return Some(ExecutionContext::web(name));
        }
        None
    }

    /// True for the bare `WEBVIEW` alias that selects the first web surface.
    pub fn is_web_alias(&self) -> bool {
        matches!(self, ExecutionContext::Web(id) if id.as_str() == WEB_CONTEXT_PREFIX)
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
