pub mod snapshot;
pub mod webdriver;

pub use snapshot::SnapshotAccessor;
pub use webdriver::WebDriverAccessor;

use crate::error::{AccessError, ConfigError, LookupError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// A CSS selector used to find elements within a scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locator(String);

impl Locator {
    /// Parse and validate a CSS selector
    pub fn css(selector: impl Into<String>) -> Result<Self, ConfigError> {
        let selector = selector.into();
        let trimmed = selector.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidLocator {
                locator: selector,
                reason: "selector is empty".to_string(),
            });
        }
        if let Err(e) = scraper::Selector::parse(trimmed) {
            return Err(ConfigError::InvalidLocator {
                locator: selector.clone(),
                reason: e.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Built-in selectors, covered by the config tests
    pub(crate) fn known(selector: &'static str) -> Self {
        Self(selector.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compile for the offline accessor
    pub(crate) fn selector(&self) -> Result<scraper::Selector, AccessError> {
        scraper::Selector::parse(&self.0)
            .map_err(|e| AccessError::Snapshot(format!("invalid selector `{}`: {}", self.0, e)))
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Locator {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Locator::css(value)
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.0
    }
}

/// Result of activating the "next page" control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Advanced,
    NoNextPage,
}

/// The three primitives the pagination core needs from a rendered page.
///
/// Every lookup reports absence as a value (`LookupError::NotFound`,
/// `AccessError::TimedOut`, `Advance::NoNextPage`) so callers must handle it.
#[async_trait]
pub trait PageContentAccessor: Send + Sync {
    /// Handle to an element of the current page
    type Element: Send + Sync;

    /// Block up to `timeout` until at least one element matches `locator`,
    /// then return every match in document order.
    async fn wait_for_containers(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<Self::Element>, AccessError>;

    /// First descendant of `scope` matching `locator`. Never searches outside `scope`.
    async fn find_child(
        &self,
        scope: &Self::Element,
        locator: &Locator,
    ) -> Result<Self::Element, LookupError>;

    /// Rendered text of an element
    async fn text(&self, element: &Self::Element) -> Result<String, LookupError>;

    /// Attribute value of an element, `None` if the attribute is absent
    async fn attr(&self, element: &Self::Element, name: &str)
    -> Result<Option<String>, LookupError>;

    /// URL of the current page, used to resolve relative links
    async fn current_url(&self) -> Result<Url, AccessError>;

    /// Activate the control matching `next`. Absence of the control is the
    /// normal end of the result set, not an error.
    async fn advance_page(
        &mut self,
        next: &Locator,
        timeout: Duration,
    ) -> Result<Advance, AccessError>;

    /// Release the underlying session
    async fn close(self) -> Result<(), AccessError>
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_accepts_compound_classes() {
        let locator = Locator::css(" .lSfe4c.r5bEn.aI5QMe ").unwrap();
        assert_eq!(locator.as_str(), ".lSfe4c.r5bEn.aI5QMe");
    }

    #[test]
    fn test_locator_rejects_garbage() {
        assert!(Locator::css("").is_err());
        assert!(Locator::css("div[").is_err());
        assert!(Locator::css("..double").is_err());
    }

    #[test]
    fn test_locator_deserializes_with_validation() {
        let ok: Locator = serde_json::from_str("\"#pnnext\"").unwrap();
        assert_eq!(ok.as_str(), "#pnnext");
        assert!(serde_json::from_str::<Locator>("\"a[\"").is_err());
    }
}
