use crate::access::snapshot::SnapshotElement;
use crate::access::{Advance, Locator, PageContentAccessor, SnapshotAccessor};
use crate::error::{AccessError, LookupError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// Snapshot replay whose driver breaks at a chosen point
pub(super) struct FaultyAccessor {
    pub inner: SnapshotAccessor,
    /// Fail `advance_page` once this many pages have been left
    pub fail_advance_after: Option<usize>,
    /// Fail every text read of an element containing this marker
    pub broken_text_marker: Option<String>,
    pub advances: usize,
    /// Every `text` call, failed or not
    pub text_reads: AtomicUsize,
}

impl FaultyAccessor {
    pub fn new(inner: SnapshotAccessor) -> Self {
        Self {
            inner,
            fail_advance_after: None,
            broken_text_marker: None,
            advances: 0,
            text_reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PageContentAccessor for FaultyAccessor {
    type Element = SnapshotElement;

    async fn wait_for_containers(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<SnapshotElement>, AccessError> {
        self.inner.wait_for_containers(locator, timeout).await
    }

    async fn find_child(
        &self,
        scope: &SnapshotElement,
        locator: &Locator,
    ) -> Result<SnapshotElement, LookupError> {
        self.inner.find_child(scope, locator).await
    }

    async fn text(&self, element: &SnapshotElement) -> Result<String, LookupError> {
        self.text_reads.fetch_add(1, Ordering::Relaxed);
        if let Some(marker) = &self.broken_text_marker {
            if element.html().contains(marker.as_str()) {
                return Err(LookupError::Driver("stale element reference".to_string()));
            }
        }
        self.inner.text(element).await
    }

    async fn attr(
        &self,
        element: &SnapshotElement,
        name: &str,
    ) -> Result<Option<String>, LookupError> {
        self.inner.attr(element, name).await
    }

    async fn current_url(&self) -> Result<Url, AccessError> {
        self.inner.current_url().await
    }

    async fn advance_page(
        &mut self,
        next: &Locator,
        timeout: Duration,
    ) -> Result<Advance, AccessError> {
        if self.fail_advance_after == Some(self.advances) {
            return Err(AccessError::Snapshot("session crashed".to_string()));
        }
        self.advances += 1;
        self.inner.advance_page(next, timeout).await
    }

    async fn close(self) -> Result<(), AccessError> {
        self.inner.close().await
    }
}
