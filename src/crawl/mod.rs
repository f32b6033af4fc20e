// src/crawl/mod.rs
// =============================================================================
// The concurrent crawl core.
//
// Submodules:
// - task: Task, PageResult and the Fetcher trait workers call
// - relay: an unbounded FIFO with a never-blocking send side
// - backpressure: publishing onto a bounded channel without blocking
// - aggregator: the shared word table and error log
// - scheduler: the worker pool and the pending-work counting loop
//
// Nothing in here knows about HTTP or HTML; that lives in `page`.
// =============================================================================

mod aggregator;
mod backpressure;
mod relay;
mod scheduler;
mod task;

pub use backpressure::Backpressure;
pub use scheduler::{CrawlReport, Scheduler, SchedulerConfig};
pub use task::{CrawlFailure, Fetched, Fetcher, PageResult, ProgressHook, WordCount};
