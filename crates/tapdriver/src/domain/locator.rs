use std::fmt;
use thiserror::Error;

/// Element lookup strategy as named on the wire (`using`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Id,
    Name,
    ClassName,
    TagName,
    LinkText,
    PartialLinkText,
    XPath,
    CssSelector,
    Text,
    PartialText,
    AccessibilityId,
}

impl Strategy {
    pub const ALL: [Strategy; 11] = [
        Strategy::Id,
        Strategy::Name,
        Strategy::ClassName,
        Strategy::TagName,
        Strategy::LinkText,
        Strategy::PartialLinkText,
        Strategy::XPath,
        Strategy::CssSelector,
        Strategy::Text,
        Strategy::PartialText,
        Strategy::AccessibilityId,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Id => "id",
            Strategy::Name => "name",
            Strategy::ClassName => "class name",
            Strategy::TagName => "tag name",
            Strategy::LinkText => "link text",
            Strategy::PartialLinkText => "partial link text",
            Strategy::XPath => "xpath",
            Strategy::CssSelector => "css selector",
            Strategy::Text => "text",
            Strategy::PartialText => "partial text",
            Strategy::AccessibilityId => "accessibility id",
        }
    }

    pub fn parse(using: &str) -> Option<Self> {
        let using = using.trim();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(using))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("Unsupported locator strategy: '{0}'")]
    UnknownStrategy(String),
    #[error("Locator value for '{0}' cannot be empty")]
    EmptyValue(Strategy),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    pub strategy: Strategy,
    pub value: String,
}

impl Locator {
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(Strategy::Id, value)
    }

    pub fn parse(using: &str, value: &str) -> Result<Self, LocatorError> {
        let strategy =
            Strategy::parse(using).ok_or_else(|| LocatorError::UnknownStrategy(using.to_string()))?;
        if value.is_empty() {
            return Err(LocatorError::EmptyValue(strategy));
        }
        Ok(Self::new(strategy, value))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "By.{}: {}", self.strategy, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_strategies() {
        for strategy in Strategy::ALL {
            let locator = Locator::parse(strategy.as_str(), "x").unwrap();
            assert_eq!(locator.strategy, strategy);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            Locator::parse("Link Text", "Home").unwrap().strategy,
            Strategy::LinkText
        );
    }

    #[test]
    fn test_unknown_strategy() {
        assert_eq!(
            Locator::parse("-android uiautomator", "x"),
            Err(LocatorError::UnknownStrategy(
                "-android uiautomator".to_string()
            ))
        );
    }

    #[test]
    fn test_empty_value_rejected() {
        assert_eq!(
            Locator::parse("id", ""),
            Err(LocatorError::EmptyValue(Strategy::Id))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Locator::id("login").to_string(), "By.id: login");
    }
}
