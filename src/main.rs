//! # bookscout CLI
//!
//! Command-line entry point for the interactive literary book search tool.
//!
//! ## Key Components
//!
//! - CLI argument parsing with clap
//! - Subcommands:
//!   - `ui`: interactive two-tab interface (search-and-analyze, discussion)
//!   - `fetch`: fetch book pages from a seed URL and print the records
//!   - `analyze`: run the full fetch-and-analysis pipeline once and print
//!     the resulting metadata cards
//!
//! The Gemini API key comes from `--api-key` or the `GEMINI_API_KEY`
//! environment variable; it is never written to disk. Without a key the
//! interface still runs, but model-dependent actions are blocked with a
//! visible warning.

mod telemetry;
mod tui;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::instrument;

use bookscout::fetcher::{self, FetcherConfig};
use bookscout::gemini::Client;
use bookscout::pipeline;
use bookscout::session::SessionContext;

#[derive(Parser)]
#[command(author, version, about = "Interactive literary book search with AI metadata extraction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the interactive two-tab interface
    Ui(UiArgs),

    /// Fetch book pages from a seed URL and print the records
    Fetch(FetchArgs),

    /// Fetch, analyze, and print AI metadata for a seed URL
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug, Default)]
struct UiArgs {
    /// LLM model to use (default: gemini-2.0-flash)
    #[arg(short, long)]
    model: Option<String>,

    /// Gemini API key (falls back to GEMINI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Book page URL to fetch
    #[arg(required = true)]
    url: String,

    /// Maximum number of pages to visit
    #[arg(short = 'p', long, default_value = "1")]
    max_pages: u32,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "5")]
    timeout: u64,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Save fetched records to file as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Book page URL to analyze
    #[arg(required = true)]
    url: String,

    /// LLM model to use
    #[arg(short, long, default_value = "gemini-2.0-flash")]
    model: String,

    /// Maximum number of pages to visit
    #[arg(short = 'p', long, default_value = "1")]
    max_pages: u32,

    /// Gemini API key (falls back to GEMINI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Ui(args)) => {
            ui_command(args).await?;
        }
        Some(Commands::Fetch(args)) => {
            telemetry::init_tracing_subscriber();
            fetch_command(args).await?;
        }
        Some(Commands::Analyze(args)) => {
            telemetry::init_tracing_subscriber();
            analyze_command(args).await?;
        }
        // Running the interface is the default action
        None => {
            ui_command(UiArgs::default()).await?;
        }
    }

    Ok(())
}

fn resolve_api_key(flag: Option<String>) -> Option<String> {
    flag.or_else(|| std::env::var("GEMINI_API_KEY").ok())
}

async fn ui_command(args: UiArgs) -> anyhow::Result<()> {
    // File-based logging while the interface owns the terminal
    tui::logging::setup_logging()?;

    let api_key = resolve_api_key(args.api_key);
    let model = args
        .model
        .unwrap_or_else(|| "gemini-2.0-flash".to_string());

    tui::run(api_key, model).await?;
    Ok(())
}

#[instrument(skip(args), fields(url = %args.url))]
async fn fetch_command(args: FetchArgs) -> anyhow::Result<()> {
    println!("Fetching {}...", args.url);

    let config = FetcherConfig::builder()
        .max_pages(args.max_pages)
        .timeout(Duration::from_secs(args.timeout))
        .build();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message("fetching pages");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let pages = match fetcher::fetch_book_pages(&args.url, &config).await {
        Ok(pages) => pages,
        Err(e) => {
            spinner.finish_and_clear();
            tracing::warn!(error = %e, "fetch failed; returning no results");
            println!("No book information found. Check the URL.");
            return Ok(());
        }
    };
    spinner.finish_and_clear();

    println!("Fetched {} page(s)", pages.len());

    if let Some(output_file) = &args.output {
        let json = serde_json::to_string_pretty(&pages)?;
        tokio::fs::write(output_file, json).await?;
        println!("Saved fetched records to {}", output_file.display());
    }

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&pages)?);
    } else {
        for page in &pages {
            println!();
            println!("{} ({})", page.title, page.url);
            println!("  platform: {}", page.platform);
            println!("  summary:  {}", page.summary);
        }
    }

    Ok(())
}

#[instrument(skip(args), fields(url = %args.url))]
async fn analyze_command(args: AnalyzeArgs) -> anyhow::Result<()> {
    let api_key = resolve_api_key(args.api_key)
        .ok_or_else(|| anyhow!("Set GEMINI_API_KEY or pass --api-key to enable AI analysis"))?;

    let client = Client::with_api_key_rate_limited(api_key);
    let models = client.models();
    let mut session = SessionContext::new();

    let config = FetcherConfig::builder().max_pages(args.max_pages).build();

    println!("Analyzing {}...", args.url);
    let stored =
        pipeline::search_and_extract(&models, &mut session, &args.url, &config, &args.model).await;

    if stored.is_empty() {
        println!("No book information found. Check the URL.");
        return Ok(());
    }

    for book in &stored {
        println!();
        bookscout::format_markdown(&format!("# {}", book.page.title))?;
        println!("Summary: {}", book.page.summary);
        println!(
            "Loan rank #{} · borrowed {} times",
            book.loan_rank, book.loan_count
        );
        println!();
        bookscout::format_markdown(&book.ai_metadata)?;
        for link in &book.page.external_links {
            println!("- [{}] {}", book.page.platform, link);
        }
    }

    Ok(())
}
