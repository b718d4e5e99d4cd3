use crate::access::Locator;
use crate::error::ConfigError;
use crate::export::{Column, HeaderStyle};
use crate::query::{self, SearchQuery};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Where the results come from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Complete results URL; takes precedence over keyword and dates
    #[serde(default)]
    pub url: Option<String>,

    /// Topic keyword
    #[serde(default)]
    pub keyword: Option<String>,

    /// First day of the range (inclusive, `YYYY-MM-DD`)
    #[serde(default)]
    pub date_from: Option<NaiveDate>,

    /// Last day of the range (inclusive, `YYYY-MM-DD`)
    #[serde(default)]
    pub date_to: Option<NaiveDate>,

    /// Search endpoint the keyword query is sent to
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl SearchConfig {
    /// Build the single results URL the run starts from
    pub fn resolve(&self) -> Result<Url, ConfigError> {
        if let Some(url) = &self.url {
            return Ok(Url::parse(url)?);
        }

        match (&self.keyword, self.date_from, self.date_to) {
            (Some(keyword), Some(from), Some(to)) => {
                let endpoint = self.endpoint.as_deref().unwrap_or(query::DEFAULT_ENDPOINT);
                SearchQuery::new(keyword.as_str(), from, to)?.to_url(endpoint)
            }
            _ => Err(ConfigError::InvalidValue(
                "search needs either `url` or `keyword`, `date_from` and `date_to`".to_string(),
            )),
        }
    }
}

/// CSS locators of a result container and its fields, each resolved
/// inside the previously resolved element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// One search result
    #[serde(default = "default_container")]
    pub container: Locator,

    /// Link of the result (inside the container)
    #[serde(default = "default_anchor")]
    pub anchor: Locator,

    /// Content block (inside the container)
    #[serde(default = "default_content_block")]
    pub content_block: Locator,

    /// Text block (inside the content block)
    #[serde(default = "default_data_block")]
    pub data_block: Locator,

    /// Snippet (inside the text block)
    #[serde(default = "default_summary")]
    pub summary: Locator,

    /// Publisher wrapper (inside the text block)
    #[serde(default = "default_source_block")]
    pub source_block: Locator,

    /// Publisher name (inside the publisher wrapper)
    #[serde(default = "default_source")]
    pub source: Locator,

    /// Headline (inside the text block)
    #[serde(default = "default_title")]
    pub title: Locator,

    /// Publication time wrapper (inside the text block)
    #[serde(default = "default_time_block")]
    pub time_block: Locator,

    /// Publication time (inside the time wrapper)
    #[serde(default = "default_time")]
    pub time: Locator,

    /// "Next page" control (page-wide)
    #[serde(default = "default_next_page")]
    pub next_page: Locator,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            container: default_container(),
            anchor: default_anchor(),
            content_block: default_content_block(),
            data_block: default_data_block(),
            summary: default_summary(),
            source_block: default_source_block(),
            source: default_source(),
            title: default_title(),
            time_block: default_time_block(),
            time: default_time(),
            next_page: default_next_page(),
        }
    }
}

/// Output table settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Destination file
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Column order
    #[serde(default = "default_columns")]
    pub columns: Vec<Column>,

    /// Start the file with a UTF-8 byte order mark
    #[serde(default = "default_byte_order_mark")]
    pub byte_order_mark: bool,

    /// Header row naming
    #[serde(default)]
    pub headers: HeaderStyle,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            columns: default_columns(),
            byte_order_mark: default_byte_order_mark(),
            headers: HeaderStyle::default(),
        }
    }
}

/// Configuration of a harvest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Ask the browser to run without a window
    #[serde(default)]
    pub headless: bool,

    #[serde(default)]
    pub search: SearchConfig,

    /// Stop after this many result containers have been seen
    #[serde(default = "default_max_quota")]
    pub max_quota: usize,

    /// How long to wait for a page's results to render
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// How often a pending wait is re-checked
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub locators: LocatorConfig,

    #[serde(default)]
    pub output: ExportConfig,

    /// Save the rendered source of every page here for later replay
    #[serde(default)]
    pub save_pages_dir: Option<PathBuf>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: false,
            search: SearchConfig::default(),
            max_quota: default_max_quota(),
            wait_timeout_secs: default_wait_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            locators: LocatorConfig::default(),
            output: ExportConfig::default(),
            save_pages_dir: None,
        }
    }
}

impl HarvestConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&contents)?;
        ::log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Check the values that serde cannot. The search section is checked
    /// separately by [`SearchConfig::resolve`], since replays do not need it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_quota == 0 {
            return Err(ConfigError::InvalidValue(
                "max_quota must be greater than 0".to_string(),
            ));
        }

        if self.wait_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "wait_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.webdriver_url.is_empty() {
            return Err(ConfigError::InvalidValue(
                "webdriver_url cannot be empty".to_string(),
            ));
        }

        if self.output.columns.is_empty() {
            return Err(ConfigError::InvalidValue(
                "output.columns cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for column in &self.output.columns {
            if !seen.insert(column) {
                return Err(ConfigError::InvalidValue(format!(
                    "output.columns lists {column:?} twice"
                )));
            }
        }

        Ok(())
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_max_quota() -> usize {
    4950
}

fn default_wait_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_output_path() -> PathBuf {
    PathBuf::from("news.csv")
}

fn default_columns() -> Vec<Column> {
    Column::DEFAULT_ORDER.to_vec()
}

fn default_byte_order_mark() -> bool {
    true
}

fn default_container() -> Locator {
    Locator::known(".SoaBEf")
}

fn default_anchor() -> Locator {
    Locator::known("a")
}

fn default_content_block() -> Locator {
    Locator::known(".lSfe4c.r5bEn.aI5QMe")
}

fn default_data_block() -> Locator {
    Locator::known(".SoAPf")
}

fn default_summary() -> Locator {
    Locator::known(".GI74Re.nDgy9d")
}

fn default_source_block() -> Locator {
    Locator::known(".MgUUmf.NUnG9d")
}

fn default_source() -> Locator {
    Locator::known("span")
}

fn default_title() -> Locator {
    Locator::known(".n0jPhd.ynAwRc.MBeuO.nDgy9d")
}

fn default_time_block() -> Locator {
    Locator::known(".OSrXXb.rbYSKb.LfVVr")
}

fn default_time() -> Locator {
    Locator::known("span")
}

fn default_next_page() -> Locator {
    Locator::known("#pnnext")
}
