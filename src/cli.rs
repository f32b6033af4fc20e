// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the struct below *is* the CLI. Each field becomes
// a flag or positional argument, and the doc comments become --help text.
//
// The values are checked and turned into a CrawlConfig in config.rs.
// =============================================================================

use clap::Parser;

use crate::crawl::Backpressure;

#[derive(Parser, Debug)]
#[command(
    name = "wordcrawl",
    version,
    about = "Crawl a website and report its most frequent long words",
    long_about = "wordcrawl starts at a URL, follows links that stay on the same site, \
                  and counts every word of the requested length on every page it visits. \
                  Press Ctrl-C to stop early; pages already being fetched are still counted."
)]
pub struct Cli {
    /// Website URL to start from (e.g., https://example.com)
    pub url: String,

    /// Number of pages fetched at the same time
    #[arg(long, default_value_t = 5)]
    pub concurrency: usize,

    /// Minimum word length to count, in characters
    #[arg(long, default_value_t = 10)]
    pub min_len: usize,

    /// Maximum word length to count, in characters (0 = no limit)
    #[arg(long, default_value_t = 0)]
    pub max_len: usize,

    /// Number of words to report
    #[arg(long, default_value_t = 20)]
    pub top: usize,

    /// Capacity of the task and result channels (0 = 5 x concurrency)
    #[arg(long, default_value_t = 0)]
    pub chan_buf_len: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Initial capacity of the word table
    #[arg(long, default_value_t = 10_000)]
    pub dict_size: usize,

    /// What to do when a channel is full
    #[arg(long, value_enum, default_value_t = Backpressure::Spawn)]
    pub backpressure: Backpressure,

    /// Output the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Log every fetch and hand-off (same as RUST_LOG=debug)
    #[arg(long, short)]
    pub verbose: bool,
}
