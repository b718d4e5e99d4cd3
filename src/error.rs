use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Problems with the run configuration, detected before any page is loaded
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Invalid locator `{locator}`: {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("Invalid search URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Failures of the page-access layer
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("No element matching `{locator}` appeared within {timeout:?}")]
    TimedOut { locator: String, timeout: Duration },

    #[error("Failed to open WebDriver session: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    #[error("WebDriver command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AccessError {
    /// The page did not render in time, whether our own wait or the
    /// driver's page-load timeout gave up
    pub fn is_timeout(&self) -> bool {
        match self {
            AccessError::TimedOut { .. } => true,
            AccessError::Command(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Outcome of a scoped element lookup that did not yield an element
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no element matching `{locator}`")]
    NotFound { locator: String },

    #[error("driver error: {0}")]
    Driver(String),
}

/// Fields of a news record, in the order they are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Anchor,
    Url,
    ContentBlock,
    DataBlock,
    Summary,
    Source,
    Title,
    PublishedAt,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::Anchor => "anchor",
            Field::Url => "url",
            Field::ContentBlock => "content block",
            Field::DataBlock => "data block",
            Field::Summary => "summary",
            Field::Source => "source",
            Field::Title => "title",
            Field::PublishedAt => "published_at",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("value is empty")]
    Empty,

    #[error("link `{0}` cannot be resolved to an absolute URL")]
    UnresolvableUrl(String),
}

/// One container could not be turned into a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to extract {field}: {cause}")]
pub struct ExtractionFailure {
    pub field: Field,
    pub cause: FailureCause,
}

impl ExtractionFailure {
    pub fn new(field: Field, cause: impl Into<FailureCause>) -> Self {
        Self {
            field,
            cause: cause.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum TokenizeError {
    #[error("Tokenizer request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected tokenizer response: {0}")]
    Response(String),

    #[error("Invalid text pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that prevent a run from starting or from reaching the result page
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Page access error: {0}")]
    Access(#[from] AccessError),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
