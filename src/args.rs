use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use yield_news::HarvestConfig;
use yield_news::preprocess::hanlp::DEFAULT_HANLP_URL;

#[derive(Parser, Debug)]
#[command(name = "yield-news")]
#[command(about = "Harvests paginated news search results into a table")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Walk the result pages of a news search and export the records
    Scrape(ScrapeArgs),
    /// Segment text files with HanLP and drop stopwords
    Tokenize(TokenizeArgs),
}

#[derive(ClapArgs, Debug)]
pub struct ScrapeArgs {
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Complete results URL (overrides keyword and dates)
    #[arg(long)]
    pub url: Option<String>,

    /// Search keyword
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// First day of the date range (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day of the date range (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Stop after this many result containers
    #[arg(short = 'q', long)]
    pub max_quota: Option<usize>,

    /// Seconds to wait for a page's results to render
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Output table path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Save the rendered source of every page into this directory
    #[arg(long)]
    pub save_pages: Option<PathBuf>,

    /// Replay pages saved with --save-pages instead of opening a browser
    #[arg(long, value_name = "DIR")]
    pub replay: Option<PathBuf>,
}

impl ScrapeArgs {
    /// Apply command-line overrides on top of the file configuration
    pub fn apply(&self, config: &mut HarvestConfig) {
        if let Some(url) = &self.url {
            config.search.url = Some(url.clone());
        }
        if let Some(keyword) = &self.keyword {
            config.search.keyword = Some(keyword.clone());
        }
        if self.from.is_some() {
            config.search.date_from = self.from;
        }
        if self.to.is_some() {
            config.search.date_to = self.to;
        }
        if let Some(max_quota) = self.max_quota {
            config.max_quota = max_quota;
        }
        if let Some(timeout) = self.timeout {
            config.wait_timeout_secs = timeout;
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if self.headless {
            config.headless = true;
        }
        if self.save_pages.is_some() {
            config.save_pages_dir = self.save_pages.clone();
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct TokenizeArgs {
    /// Text file or directory of text files
    pub input: PathBuf,

    /// Stopword list, one word per line
    #[arg(short, long)]
    pub stopwords: PathBuf,

    /// Write results here instead of beside each input
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// File name suffix selected in a directory
    #[arg(short, long, default_value = ".txt")]
    pub extension: String,

    /// HanLP API address
    #[arg(long, default_value = DEFAULT_HANLP_URL)]
    pub hanlp_url: String,

    /// HanLP credentials (falls back to HANLP_AUTH)
    #[arg(long)]
    pub auth: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_overrides() {
        let args = Args::parse_from([
            "yield-news",
            "scrape",
            "--keyword",
            "光伏产业",
            "--from",
            "2023-01-01",
            "--to",
            "2023-01-31",
            "-q",
            "50",
            "--headless",
            "--output",
            "jan.csv",
        ]);
        let Command::Scrape(scrape) = args.command else {
            panic!("expected scrape");
        };

        let mut config = HarvestConfig::default();
        scrape.apply(&mut config);

        assert_eq!(config.search.keyword.as_deref(), Some("光伏产业"));
        assert_eq!(config.search.date_from, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(config.max_quota, 50);
        assert!(config.headless);
        assert_eq!(config.output.path, PathBuf::from("jan.csv"));
        assert_eq!(config.wait_timeout_secs, 10);
    }

    #[test]
    fn test_tokenize_defaults() {
        let args = Args::parse_from(["yield-news", "tokenize", "docs", "-s", "stop.txt"]);
        let Command::Tokenize(tokenize) = args.command else {
            panic!("expected tokenize");
        };
        assert_eq!(tokenize.extension, ".txt");
        assert_eq!(tokenize.hanlp_url, DEFAULT_HANLP_URL);
        assert!(tokenize.output_dir.is_none());
    }
}
