use clap::Parser;
use std::process::ExitCode;
use yield_news::preprocess::{HanlpClient, StopwordSet, TextPreprocessor};
use yield_news::{Harvest, HarvestConfig};

mod args;
use args::{Args, Command, ScrapeArgs, TokenizeArgs};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Command::Scrape(scrape) => run_scrape(scrape).await,
        Command::Tokenize(tokenize) => run_tokenize(tokenize).await,
    }
}

async fn run_scrape(args: ScrapeArgs) -> ExitCode {
    let mut config = match &args.config {
        Some(path) => match HarvestConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => HarvestConfig::default(),
    };
    args.apply(&mut config);

    if args.replay.is_none() {
        println!("Note: scraping requires a WebDriver server (e.g., ChromeDriver).");
        println!(
            "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
        );
    }

    let harvest = Harvest::new(config).with_replay(args.replay);
    let start_time = std::time::Instant::now();

    let outcome = match harvest.run_and_export().await {
        Ok(outcome) => outcome,
        Err(e) => {
            ::log::error!("Failed to start harvest: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let report = &outcome.report;
    ::log::info!(
        "Harvest ended ({}) after {:.2} seconds: {} records, {} items seen, {} pages",
        report.termination,
        start_time.elapsed().as_secs_f64(),
        report.records.len(),
        report.counters.items_seen,
        report.counters.page_index
    );

    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run_tokenize(args: TokenizeArgs) -> ExitCode {
    let auth = args
        .auth
        .clone()
        .or_else(|| std::env::var("HANLP_AUTH").ok());

    let preprocessor = match build_preprocessor(&args, auth) {
        Ok(preprocessor) => preprocessor,
        Err(e) => {
            ::log::error!("Failed to set up tokenizer: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.input.is_dir() {
        match preprocessor
            .process_directory(&args.input, &args.extension)
            .await
        {
            Ok(results) => {
                for (name, tokens) in &results {
                    println!("{}: {} tokens", name, tokens.len());
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                ::log::error!("Failed to read {}: {}", args.input.display(), e);
                ExitCode::FAILURE
            }
        }
    } else {
        match preprocessor.process_file(&args.input).await {
            Ok(tokens) => {
                println!("{}: {} tokens", args.input.display(), tokens.len());
                ExitCode::SUCCESS
            }
            Err(e) => {
                ::log::error!("Failed to process {}: {}", args.input.display(), e);
                ExitCode::FAILURE
            }
        }
    }
}

fn build_preprocessor(
    args: &TokenizeArgs,
    auth: Option<String>,
) -> Result<TextPreprocessor<HanlpClient>, yield_news::error::TokenizeError> {
    let client = HanlpClient::new(args.hanlp_url.as_str(), auth)?;
    let stopwords = StopwordSet::load(&args.stopwords)?;
    Ok(TextPreprocessor::new(client, stopwords)?.with_output_dir(args.output_dir.clone()))
}
