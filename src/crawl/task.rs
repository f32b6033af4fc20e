// src/crawl/task.rs
// =============================================================================
// The units of work passed between the scheduler and its workers.
//
// - Task: one URL to fetch, plus a slot for its own failure
// - PageResult: the words counted and links found on one page
// - Fetched: a PageResult plus the failure (if any) that produced it
// - Fetcher: the page fetch/parse collaborator the workers call
// - ProgressHook: called once per dispatched task, must return quickly
//
// Every Task yields exactly one Fetched, even on failure. The scheduler's
// pending-work counter depends on it.
// =============================================================================

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;

// A URL waiting to be crawled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    url: String,
    failure: Option<String>,
}

impl Task {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            failure: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    // The only mutation a task ever sees
    pub fn record_failure(&mut self, error: &FetchError) {
        self.failure = Some(error.to_string());
    }

    // Consumes the task, yielding an error-log entry if it failed
    pub fn into_failure(self) -> Option<CrawlFailure> {
        let url = self.url;
        self.failure.map(|reason| CrawlFailure { url, reason })
    }
}

// Word counts and outgoing links from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResult {
    pub words: HashMap<String, u64>,
    pub links: Vec<String>,
}

impl PageResult {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.links.is_empty()
    }
}

// What a Fetcher hands back: always a page (possibly empty), maybe an error
#[derive(Debug, Default)]
pub struct Fetched {
    pub page: PageResult,
    pub failure: Option<FetchError>,
}

impl Fetched {
    pub fn ok(page: PageResult) -> Self {
        Self {
            page,
            failure: None,
        }
    }

    // A failure may still carry whatever was extracted before it happened
    pub fn failed(page: PageResult, error: FetchError) -> Self {
        Self {
            page,
            failure: Some(error),
        }
    }
}

/// Fetches one page and extracts its words and same-site links.
///
/// Implementations must always return. Links must already be absolute,
/// fragment-free and filtered to the crawl's host; the scheduler only
/// deduplicates them.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Fetched> + Send;
}

// Called with (url, interrupted) each time a worker picks up a task
pub type ProgressHook = Arc<dyn Fn(&str, bool) + Send + Sync>;

pub fn no_progress() -> ProgressHook {
    Arc::new(|_: &str, _: bool| {})
}

// One entry of the error log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlFailure {
    pub url: String,
    pub reason: String,
}

// One row of the ranked word list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}
