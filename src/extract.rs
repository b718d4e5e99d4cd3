use crate::access::{Locator, PageContentAccessor};
use crate::config::LocatorConfig;
use crate::error::{ExtractionFailure, FailureCause, Field};
use crate::results::NewsRecord;
use url::Url;

/// Turns one rendered result container into a [`NewsRecord`].
///
/// Lookups follow the container's structure: anchor, content block, text
/// block, then the fields inside the text block. Each lookup is scoped to the
/// element resolved before it. The first missing piece fails the whole
/// container; no partial record is ever returned.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    locators: LocatorConfig,
}

impl RecordExtractor {
    pub fn new(locators: LocatorConfig) -> Self {
        Self { locators }
    }

    pub fn locators(&self) -> &LocatorConfig {
        &self.locators
    }

    /// Extract one record. `base` resolves relative links.
    pub async fn extract<A: PageContentAccessor>(
        &self,
        accessor: &A,
        container: &A::Element,
        base: Option<&Url>,
    ) -> Result<NewsRecord, ExtractionFailure> {
        let l = &self.locators;

        let anchor = child(accessor, Field::Anchor, container, &l.anchor).await?;
        let href = accessor
            .attr(&anchor, "href")
            .await
            .map_err(|e| ExtractionFailure::new(Field::Url, e))?
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .ok_or(ExtractionFailure::new(Field::Url, FailureCause::Empty))?;
        let url = resolve_url(&href, base).ok_or_else(|| {
            ExtractionFailure::new(Field::Url, FailureCause::UnresolvableUrl(href.clone()))
        })?;
        // Coarse headline, superseded by the nested title element below.
        // Reading it costs a driver round trip, so only for tracing.
        let anchor_title = if ::log::log_enabled!(::log::Level::Trace) {
            accessor.text(&anchor).await.ok()
        } else {
            None
        };

        let content = child(accessor, Field::ContentBlock, container, &l.content_block).await?;
        let data = child(accessor, Field::DataBlock, &content, &l.data_block).await?;

        let summary = child_text(accessor, Field::Summary, &data, &l.summary).await?;

        let source_block = child(accessor, Field::Source, &data, &l.source_block).await?;
        let source = child_text(accessor, Field::Source, &source_block, &l.source).await?;

        let title = child_text(accessor, Field::Title, &data, &l.title).await?;
        if title.is_empty() {
            return Err(ExtractionFailure::new(Field::Title, FailureCause::Empty));
        }

        let time_block = child(accessor, Field::PublishedAt, &data, &l.time_block).await?;
        let published_at = child_text(accessor, Field::PublishedAt, &time_block, &l.time).await?;

        if let Some(coarse) = anchor_title.filter(|t| !t.contains(title.as_str())) {
            ::log::trace!("Anchor text {:?} differs from title {:?}", coarse, title);
        }

        Ok(NewsRecord {
            title,
            source,
            published_at,
            summary,
            url: url.to_string(),
        })
    }
}

async fn child<A: PageContentAccessor>(
    accessor: &A,
    field: Field,
    scope: &A::Element,
    locator: &Locator,
) -> Result<A::Element, ExtractionFailure> {
    accessor
        .find_child(scope, locator)
        .await
        .map_err(|e| ExtractionFailure::new(field, e))
}

async fn child_text<A: PageContentAccessor>(
    accessor: &A,
    field: Field,
    scope: &A::Element,
    locator: &Locator,
) -> Result<String, ExtractionFailure> {
    let element = child(accessor, field, scope, locator).await?;
    accessor
        .text(&element)
        .await
        .map(|t| t.trim().to_string())
        .map_err(|e| ExtractionFailure::new(field, e))
}

/// Absolute http(s) form of a link, resolving relative links against `base`
fn resolve_url(href: &str, base: Option<&Url>) -> Option<Url> {
    let url = match Url::parse(href) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(href).ok()?,
        Err(_) => return None,
    };
    matches!(url.scheme(), "http" | "https").then_some(url)
}
