//! Replays saved result pages without a browser.
//!
//! Elements are carried as their outer HTML, so every lookup re-parses the
//! element's own markup and can only ever see that element's subtree.

use super::{Advance, Locator, PageContentAccessor};
use crate::error::{AccessError, LookupError};
use crate::utils;
use async_trait::async_trait;
use scraper::{ElementRef, Html};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Handle to an element of a saved page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotElement {
    html: String,
}

impl SnapshotElement {
    pub fn html(&self) -> &str {
        &self.html
    }
}

pub struct SnapshotAccessor {
    pages: Vec<String>,
    current: usize,
    base_url: Url,
    pages_loaded: usize,
}

impl SnapshotAccessor {
    /// Create an accessor over in-memory pages, first page current
    pub fn from_pages(pages: Vec<String>, base_url: Url) -> Self {
        Self {
            pages,
            current: 0,
            base_url,
            pages_loaded: 0,
        }
    }

    /// Load every `page-<n>.html` file from `dir`, ordered by `n`
    pub fn from_dir(dir: impl AsRef<Path>, base_url: Url) -> Result<Self, AccessError> {
        let files = utils::read_page_files(dir.as_ref())?;
        if files.is_empty() {
            return Err(AccessError::Snapshot(format!(
                "no saved pages found in {}",
                dir.as_ref().display()
            )));
        }
        ::log::info!(
            "Replaying {} saved pages from {}",
            files.len(),
            dir.as_ref().display()
        );
        Ok(Self::from_pages(
            files.into_iter().map(|(_, html)| html).collect(),
            base_url,
        ))
    }

    /// Number of `wait_for_containers` calls that returned containers
    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    /// Zero-based index of the page currently shown
    pub fn current_page(&self) -> usize {
        self.current
    }

    fn current_html(&self) -> Result<&str, AccessError> {
        self.pages
            .get(self.current)
            .map(String::as_str)
            .ok_or_else(|| AccessError::Snapshot(format!("no page at index {}", self.current)))
    }
}

/// The single top-level element of a parsed fragment
fn fragment_root(fragment: &Html) -> Option<ElementRef<'_>> {
    fragment.root_element().children().find_map(ElementRef::wrap)
}

/// Text nodes joined as they render; only runs of real whitespace collapse
fn normalized_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn lookup_child(scope: &str, locator: &Locator) -> Result<SnapshotElement, LookupError> {
    let selector = locator
        .selector()
        .map_err(|e| LookupError::Driver(e.to_string()))?;
    let fragment = Html::parse_fragment(scope);
    let root = fragment_root(&fragment).ok_or_else(|| LookupError::NotFound {
        locator: locator.to_string(),
    })?;

    root.select(&selector)
        .find(|el| el.id() != root.id())
        .map(|el| SnapshotElement { html: el.html() })
        .ok_or_else(|| LookupError::NotFound {
            locator: locator.to_string(),
        })
}

fn with_root<T>(
    element: &SnapshotElement,
    f: impl FnOnce(ElementRef<'_>) -> T,
) -> Result<T, LookupError> {
    let fragment = Html::parse_fragment(&element.html);
    fragment_root(&fragment)
        .map(f)
        .ok_or_else(|| LookupError::Driver("element markup is empty".to_string()))
}

#[async_trait]
impl PageContentAccessor for SnapshotAccessor {
    type Element = SnapshotElement;

    async fn wait_for_containers(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<SnapshotElement>, AccessError> {
        let selector = locator.selector()?;
        let containers: Vec<SnapshotElement> = {
            let document = Html::parse_document(self.current_html()?);
            document
                .select(&selector)
                .map(|el| SnapshotElement { html: el.html() })
                .collect()
        };

        // A saved page never changes, so there is nothing to wait for.
        if containers.is_empty() {
            ::log::debug!(
                "Saved page {} has no `{}` elements",
                self.current + 1,
                locator
            );
            return Err(AccessError::TimedOut {
                locator: locator.to_string(),
                timeout,
            });
        }

        self.pages_loaded += 1;
        Ok(containers)
    }

    async fn find_child(
        &self,
        scope: &SnapshotElement,
        locator: &Locator,
    ) -> Result<SnapshotElement, LookupError> {
        lookup_child(&scope.html, locator)
    }

    async fn text(&self, element: &SnapshotElement) -> Result<String, LookupError> {
        with_root(element, normalized_text)
    }

    async fn attr(
        &self,
        element: &SnapshotElement,
        name: &str,
    ) -> Result<Option<String>, LookupError> {
        with_root(element, |el| el.value().attr(name).map(str::to_string))
    }

    async fn current_url(&self) -> Result<Url, AccessError> {
        Ok(self.base_url.clone())
    }

    async fn advance_page(
        &mut self,
        next: &Locator,
        _timeout: Duration,
    ) -> Result<Advance, AccessError> {
        let selector = next.selector()?;
        let has_next = {
            let document = Html::parse_document(self.current_html()?);
            document.select(&selector).next().is_some()
        };

        if !has_next {
            return Ok(Advance::NoNextPage);
        }
        if self.current + 1 >= self.pages.len() {
            ::log::info!(
                "Page {} links to a next page, but no further snapshot was saved",
                self.current + 1
            );
            return Ok(Advance::NoNextPage);
        }

        self.current += 1;
        Ok(Advance::Advanced)
    }

    async fn close(self) -> Result<(), AccessError> {
        ::log::debug!("Closing snapshot replay after {} pages", self.pages_loaded);
        Ok(())
    }
}
