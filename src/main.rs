// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap and check them
// 2. Set up logging (stderr, so --json output on stdout stays clean)
// 3. Turn Ctrl-C into a cancellation signal for the crawl
// 4. Run the crawl and print the report
// 5. Exit with a meaningful code:
//      0   = finished, no page errors
//      1   = page errors were recorded
//      2   = bad arguments or startup failure
//      130 = interrupted by Ctrl-C (results are partial)
// =============================================================================

mod cli;
mod config;
mod crawl;
mod error;
mod page;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::CrawlConfig;
use crawl::{CrawlReport, ProgressHook, Scheduler};
use page::PageFetcher;

const EXIT_OK: i32 = 0;
const EXIT_PAGE_ERRORS: i32 = 1;
const EXIT_FAILURE: i32 = 2;
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = CrawlConfig::from_cli(&cli).context("invalid arguments")?;
    let hosts = config.host_filter()?;
    info!(target_host = hosts.target(), "restricting crawl to site");
    let fetcher = PageFetcher::new(hosts, config.word_rules(), config.timeout)
        .context("could not build the HTTP client")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing pages in flight");
            on_interrupt.cancel();
        }
    });

    let progress: ProgressHook = Arc::new(|url: &str, interrupted: bool| {
        if interrupted {
            info!(url, "skipping link, crawl interrupted");
        } else {
            info!(url, "processing link");
        }
    });

    info!("beginning run, type Ctrl-C to interrupt");
    let report = Scheduler::new(config.scheduler(), fetcher)
        .with_progress(progress)
        .run(config.seed.as_str(), &cancel)
        .await;

    print_report(&report, config.json)?;
    Ok(exit_code(&report))
}

// RUST_LOG wins when set; otherwise info (or debug with --verbose)
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_code(report: &CrawlReport) -> i32 {
    if !report.errors.is_empty() {
        EXIT_PAGE_ERRORS
    } else if report.interrupted {
        EXIT_INTERRUPTED
    } else {
        EXIT_OK
    }
}

fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else {
        print_table(report);
    }
    Ok(())
}

fn print_table(report: &CrawlReport) {
    if !report.errors.is_empty() {
        println!("Errors:");
        for failure in &report.errors {
            println!("   {} ({})", failure.url, failure.reason);
        }
        println!();
    }

    if report.interrupted {
        println!("*** Crawl interrupted, results are partial ***\n");
    }

    println!("{:<40} {:>10}", "WORD", "COUNT");
    println!("{}", "=".repeat(51));
    for entry in &report.top_words {
        println!("{:<40} {:>10}", entry.word, entry.count);
    }
    println!();

    println!("📊 Summary:");
    println!("   📄 Pages crawled: {}", report.pages_merged);
    println!("   ❌ Page errors: {}", report.errors.len());
    println!("   📋 Words shown: {}", report.top_words.len());
}
