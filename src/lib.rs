pub mod access;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod pagination;
pub mod preprocess;
pub mod query;
pub mod results;
pub mod utils;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types for convenience
pub use access::{PageContentAccessor, SnapshotAccessor, WebDriverAccessor};
pub use config::HarvestConfig;
pub use error::{HarvestError, Result};
pub use pagination::{RunReport, Termination};
pub use results::{NewsRecord, ResultSet};

use error::{ConfigError, ExportError};
use export::TableExporter;
use extract::RecordExtractor;
use pagination::{PaginationController, PaginationSettings};
use std::path::{Path, PathBuf};
use url::Url;

/// Main builder for a news harvest run
pub struct Harvest {
    config: HarvestConfig,
    replay_dir: Option<PathBuf>,
}

impl Harvest {
    /// Create a new Harvest builder with the given configuration
    pub fn new(config: HarvestConfig) -> Self {
        Self {
            config,
            replay_dir: None,
        }
    }

    /// Load configuration from a file
    pub fn with_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(HarvestConfig::from_file(path)?))
    }

    /// Set the maximum number of result containers to walk
    pub fn with_max_quota(mut self, max_quota: usize) -> Self {
        self.config.max_quota = max_quota;
        self
    }

    /// Replay pages saved under `dir` instead of driving a browser
    pub fn with_replay(mut self, dir: Option<PathBuf>) -> Self {
        self.replay_dir = dir;
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Run against a browser session, or against saved pages when a replay
    /// directory is set.
    ///
    /// Errors only when the run cannot start: bad configuration, no session,
    /// or no saved pages. Once a session exists, every ending (including a
    /// first page that fails to open) is the report's [`Termination`].
    pub async fn run(&self) -> Result<RunReport> {
        self.config.validate()?;
        match &self.replay_dir {
            Some(dir) => self.run_replay(dir).await,
            None => self.run_live().await,
        }
    }

    /// Drive the pagination loop over an accessor that is already on the
    /// first results page
    pub async fn run_with<A: PageContentAccessor>(&self, accessor: &mut A) -> RunReport {
        let extractor = RecordExtractor::new(self.config.locators.clone());
        let settings = PaginationSettings {
            max_quota: self.config.max_quota,
            wait_timeout: self.config.wait_timeout(),
        };
        PaginationController::new(accessor, &extractor, settings)
            .run()
            .await
    }

    /// Run, then write whatever was collected, however the run ended
    pub async fn run_and_export(&self) -> Result<Outcome> {
        let report = self.run().await?;
        let export = self.export(&report.records);
        if let Err(e) = &export {
            ::log::error!(
                "Export failed, {} records were not written: {}",
                report.records.len(),
                e
            );
        }
        Ok(Outcome { report, export })
    }

    /// Write the records as configured in `output`
    pub fn export(&self, records: &ResultSet) -> std::result::Result<(), ExportError> {
        let output = &self.config.output;
        TableExporter::new()
            .with_headers(output.headers)
            .with_byte_order_mark(output.byte_order_mark)
            .export(records, &output.path, &output.columns)
    }

    async fn run_live(&self) -> Result<RunReport> {
        let url = self.config.search.resolve()?;

        // Override the WebDriver URL with an environment variable if provided
        let webdriver_url = match std::env::var("WEBDRIVER_URL") {
            Ok(url) if !url.is_empty() => url,
            _ => self.config.webdriver_url.clone(),
        };

        let mut accessor = WebDriverAccessor::connect(&webdriver_url, self.config.headless)
            .await?
            .with_poll_interval(self.config.poll_interval())
            .with_save_pages(self.config.save_pages_dir.clone());

        if let Err(e) = accessor.open(&url).await {
            ::log::error!("Failed to open the first results page: {}", e);
            close_session(accessor).await;
            return Ok(RunReport::first_page_failed(&e));
        }

        let report = self.run_with(&mut accessor).await;
        close_session(accessor).await;
        Ok(report)
    }

    async fn run_replay(&self, dir: &Path) -> Result<RunReport> {
        // Relative links resolve against the query that produced the pages
        // when it is known
        let base = match self.config.search.resolve() {
            Ok(url) => url,
            Err(_) => Url::parse(query::DEFAULT_ENDPOINT).map_err(ConfigError::from)?,
        };

        let mut accessor = SnapshotAccessor::from_dir(dir, base)?;
        ::log::info!("Replaying saved pages from {}", dir.display());

        let report = self.run_with(&mut accessor).await;
        close_session(accessor).await;
        Ok(report)
    }
}

/// A finished run and the result of writing its records
#[derive(Debug)]
pub struct Outcome {
    pub report: RunReport,
    pub export: std::result::Result<(), ExportError>,
}

impl Outcome {
    /// The run ended normally and its table was written
    pub fn is_success(&self) -> bool {
        self.export.is_ok() && self.report.termination.is_success()
    }
}

async fn close_session<A: PageContentAccessor>(accessor: A) {
    if let Err(e) = accessor.close().await {
        ::log::warn!("Failed to close session: {}", e);
    }
}
