#[cfg(test)]
mod tests;

use crate::access::{Advance, Locator, PageContentAccessor};
use crate::error::AccessError;
use crate::extract::RecordExtractor;
use crate::results::{Append, ResultAccumulator, ResultSet, RunCounters};
use std::time::Duration;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// `max_quota` containers were seen
    QuotaReached,
    /// The last page had no "next page" control
    Exhausted,
    /// A page did not render its results in time
    Aborted { page: usize, reason: String },
    /// Loading or advancing failed for another reason
    Faulted { page: usize, reason: String },
}

impl Termination {
    /// Quota reached and exhausted are normal completions
    pub fn is_success(&self) -> bool {
        matches!(self, Termination::QuotaReached | Termination::Exhausted)
    }

    /// Terminal state for page `page` failing to load: a render timeout
    /// aborts, anything else is a fault
    pub fn load_failed(page: usize, error: &AccessError) -> Self {
        let reason = error.to_string();
        if error.is_timeout() {
            Termination::Aborted { page, reason }
        } else {
            Termination::Faulted { page, reason }
        }
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::QuotaReached => f.write_str("quota reached"),
            Termination::Exhausted => f.write_str("result pages exhausted"),
            Termination::Aborted { page, reason } => {
                write!(f, "aborted on page {page}: {reason}")
            }
            Termination::Faulted { page, reason } => {
                write!(f, "pagination fault on page {page}: {reason}")
            }
        }
    }
}

/// Everything a finished run hands back
#[derive(Debug)]
pub struct RunReport {
    pub termination: Termination,
    pub counters: RunCounters,
    pub records: ResultSet,
}

impl RunReport {
    /// Report of a run whose first page never opened
    pub fn first_page_failed(error: &AccessError) -> Self {
        Self {
            termination: Termination::load_failed(1, error),
            counters: RunCounters {
                items_seen: 0,
                page_index: 1,
            },
            records: ResultSet::default(),
        }
    }
}

/// Limits of the pagination loop
#[derive(Debug, Clone)]
pub struct PaginationSettings {
    pub max_quota: usize,
    pub wait_timeout: Duration,
}

enum State<E> {
    LoadingPage,
    ExtractingItems(Vec<E>),
    AdvancingPage,
    Terminal(Termination),
}

/// Drives "wait for results, extract all, continue or stop" across pages.
///
/// Pages are processed strictly one after another. A page is always
/// extracted in full before the quota is checked.
pub struct PaginationController<'a, A: PageContentAccessor> {
    accessor: &'a mut A,
    extractor: &'a RecordExtractor,
    settings: PaginationSettings,
    accumulator: ResultAccumulator,
    counters: RunCounters,
}

impl<'a, A: PageContentAccessor> PaginationController<'a, A> {
    pub fn new(
        accessor: &'a mut A,
        extractor: &'a RecordExtractor,
        settings: PaginationSettings,
    ) -> Self {
        let accumulator = ResultAccumulator::with_quota(settings.max_quota);
        Self {
            accessor,
            extractor,
            settings,
            accumulator,
            counters: RunCounters::default(),
        }
    }

    /// Run until a terminal state. Never fails: every way a run can end is a
    /// [`Termination`], and the records gathered so far are always returned.
    pub async fn run(mut self) -> RunReport {
        self.counters.page_index = 1;
        let mut state = State::LoadingPage;

        let termination = loop {
            state = match state {
                State::LoadingPage => self.load_page().await,
                State::ExtractingItems(containers) => self.extract_page(containers).await,
                State::AdvancingPage => self.advance_page().await,
                State::Terminal(termination) => break termination,
            };
        };

        match &termination {
            t if t.is_success() => ::log::info!(
                "Run finished ({}): {} records from {} items on {} pages",
                t,
                self.accumulator.len(),
                self.counters.items_seen,
                self.counters.page_index
            ),
            t => ::log::error!(
                "Run failed ({}): keeping {} records from {} items",
                t,
                self.accumulator.len(),
                self.counters.items_seen
            ),
        }

        RunReport {
            termination,
            counters: self.counters,
            records: self.accumulator.snapshot(),
        }
    }

    fn container_locator(&self) -> &'a Locator {
        &self.extractor.locators().container
    }

    async fn load_page(&mut self) -> State<A::Element> {
        let page = self.counters.page_index;
        let locator = self.container_locator();
        ::log::debug!("Waiting for results on page {}", page);

        match self
            .accessor
            .wait_for_containers(locator, self.settings.wait_timeout)
            .await
        {
            Ok(containers) => {
                ::log::debug!("Page {} has {} results", page, containers.len());
                State::ExtractingItems(containers)
            }
            Err(e) => {
                if e.is_timeout() {
                    ::log::error!("Page {} did not render: {}", page, e);
                } else {
                    ::log::error!("Failed to load page {}: {}", page, e);
                }
                State::Terminal(Termination::load_failed(page, &e))
            }
        }
    }

    async fn extract_page(&mut self, containers: Vec<A::Element>) -> State<A::Element> {
        let page = self.counters.page_index;
        let base = match self.accessor.current_url().await {
            Ok(url) => Some(url),
            Err(e) => {
                ::log::warn!(
                    "Cannot read URL of page {}, relative links will fail: {}",
                    page,
                    e
                );
                None
            }
        };

        for (index, container) in containers.iter().enumerate() {
            self.counters.items_seen += 1;
            match self
                .extractor
                .extract(&*self.accessor, container, base.as_ref())
                .await
            {
                Ok(record) => {
                    let title = record.title.clone();
                    if self.accumulator.append(record) == Append::Accepted {
                        ::log::debug!(
                            "Extracted item {} ({}): {}",
                            self.counters.items_seen,
                            self.accumulator.len(),
                            title
                        );
                    }
                }
                Err(failure) => {
                    ::log::warn!(
                        "Skipping item {} on page {}: {}",
                        index + 1,
                        page,
                        failure
                    );
                }
            }
        }

        ::log::info!(
            "Page {}: {} records collected, {} items seen",
            page,
            self.accumulator.len(),
            self.counters.items_seen
        );

        if self.counters.items_seen >= self.settings.max_quota {
            State::Terminal(Termination::QuotaReached)
        } else {
            State::AdvancingPage
        }
    }

    async fn advance_page(&mut self) -> State<A::Element> {
        let page = self.counters.page_index;
        let next = &self.extractor.locators().next_page;

        match self
            .accessor
            .advance_page(next, self.settings.wait_timeout)
            .await
        {
            Ok(Advance::Advanced) => {
                self.counters.page_index += 1;
                State::LoadingPage
            }
            Ok(Advance::NoNextPage) => {
                ::log::info!("No page after page {}", page);
                State::Terminal(Termination::Exhausted)
            }
            Err(e) => {
                ::log::error!("Failed to leave page {}: {}", page, e);
                State::Terminal(Termination::Faulted {
                    page,
                    reason: e.to_string(),
                })
            }
        }
    }
}
