// src/crawl/scheduler.rs
// =============================================================================
// The crawl scheduler: a fixed pool of workers fed through bounded channels,
// with a counting protocol to know when an ever-growing crawl is finished.
//
// How it works:
// 1. Spawn `concurrency` workers. Each one loops: take a Task, fetch it,
//    merge the page into the Aggregator, publish the page's links back
// 2. Send the seed Task and set the pending counter to 1
// 3. Loop while pending > 0:
//    - wait for one batch of links from the result channel, pending -= 1
//    - if cancelled: throw the links away and keep draining
//    - otherwise every unvisited link is marked visited, pending += 1,
//      and published as a new Task
// 4. pending == 0 means no task is queued or running and no result is
//    in transit, so both channels can close and the workers can be joined
//
// Only this loop touches `pending` and `visited`, so neither needs a lock.
// Every Task produces exactly one result (failures and cancellations
// publish an empty batch), which is what brings `pending` back to zero.
//
// Rust concepts:
// - Arc: shared ownership of the fetcher and aggregator across tasks
// - tokio::sync::Mutex around the receiver: tokio's mpsc has one consumer,
//   the mutex lets the whole pool share it
// - CancellationToken: a cloneable, idempotent "please stop" flag
// =============================================================================

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::aggregator::Aggregator;
use super::backpressure::{Backpressure, Publisher};
use super::task::{
    no_progress, CrawlFailure, Fetched, Fetcher, PageResult, ProgressHook, Task, WordCount,
};
use crate::error::FetchError;

// The values the scheduler needs; built from CrawlConfig in config.rs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub concurrency: usize,
    pub task_capacity: usize,
    pub result_capacity: usize,
    pub backpressure: Backpressure,
    // Initial size of the word table and relay buffers
    pub dict_size: usize,
    // How many words the report keeps
    pub top: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            task_capacity: 25,
            result_capacity: 25,
            backpressure: Backpressure::Spawn,
            dict_size: 10_000,
            top: 20,
        }
    }
}

// Everything a run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    pub top_words: Vec<WordCount>,
    pub errors: Vec<CrawlFailure>,
    // True when cancellation cut the crawl short; the counts are partial
    pub interrupted: bool,
    pub pages_scheduled: usize,
    pub pages_merged: usize,
}

pub struct Scheduler<F> {
    config: SchedulerConfig,
    fetcher: Arc<F>,
    progress: ProgressHook,
}

impl<F: Fetcher> Scheduler<F> {
    pub fn new(config: SchedulerConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher: Arc::new(fetcher),
            progress: no_progress(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressHook) -> Self {
        self.progress = progress;
        self
    }

    // Crawls outward from `seed` until there is nothing left to visit, or
    // until `cancel` fires and the work already in flight has drained.
    pub async fn run(&self, seed: &str, cancel: &CancellationToken) -> CrawlReport {
        let cfg = &self.config;
        info!(
            seed,
            concurrency = cfg.concurrency,
            backpressure = ?cfg.backpressure,
            "beginning crawl"
        );

        let aggregator = Arc::new(Aggregator::with_capacity(cfg.dict_size));
        let (task_tx, task_rx) = mpsc::channel::<Task>(cfg.task_capacity);
        let (result_tx, mut result_rx) = mpsc::channel::<Vec<String>>(cfg.result_capacity);
        let task_rx = Arc::new(Mutex::new(task_rx));

        // Workers own every handle onto the result channel.
        let results = Publisher::new(cfg.backpressure, result_tx, cfg.dict_size);
        let result_handoffs = results.handoff_counter();
        let workers: Vec<JoinHandle<()>> = (0..cfg.concurrency)
            .map(|id| {
                tokio::spawn(worker(
                    id,
                    Arc::clone(&task_rx),
                    Arc::clone(&self.fetcher),
                    Arc::clone(&aggregator),
                    results.clone(),
                    Arc::clone(&self.progress),
                    cancel.clone(),
                ))
            })
            .collect();
        drop(results);

        // This loop is the only task sender.
        let tasks = Publisher::new(cfg.backpressure, task_tx, cfg.dict_size);

        // Links arrive without fragments, so the seed must match them.
        let seed = without_fragment(seed);
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(seed.to_string());
        tasks.publish(Task::new(seed)).await;

        let mut pending: usize = 1;
        let mut scheduled: usize = 1;
        let mut interrupted = false;

        while pending > 0 {
            let Some(links) = result_rx.recv().await else {
                // Every worker has gone away with work still counted.
                error!(pending, "result channel closed before the crawl finished");
                break;
            };
            pending -= 1;

            if cancel.is_cancelled() {
                if !interrupted {
                    warn!(pending, "crawl interrupted, draining queue");
                    interrupted = true;
                }
                debug!(pending, "draining queue");
                continue;
            }

            for link in links {
                if visited.contains(&link) {
                    continue;
                }
                visited.insert(link.clone());
                pending += 1;
                scheduled += 1;
                tasks.publish(Task::new(link)).await;
            }
        }

        info!(
            scheduled,
            task_handoffs = tasks.handoffs(),
            result_handoffs = result_handoffs.get(),
            "exited processing loop"
        );

        // pending == 0: no task is queued, running, or waiting to report.
        drop(tasks);
        result_rx.close();
        for joined in join_all(workers).await {
            if let Err(e) = joined {
                error!(error = %e, "worker task failed");
            }
        }

        info!(
            pages = aggregator.merges(),
            distinct_words = aggregator.distinct_words(),
            "all workers finished"
        );

        CrawlReport {
            top_words: aggregator.top(cfg.top),
            errors: aggregator.errors(),
            interrupted,
            pages_scheduled: scheduled,
            pages_merged: aggregator.merges(),
        }
    }
}

async fn worker<F: Fetcher>(
    id: usize,
    tasks: Arc<Mutex<mpsc::Receiver<Task>>>,
    fetcher: Arc<F>,
    aggregator: Arc<Aggregator>,
    results: Publisher<Vec<String>>,
    progress: ProgressHook,
    cancel: CancellationToken,
) {
    loop {
        let next = tasks.lock().await.recv().await;
        let Some(mut task) = next else {
            break;
        };

        let interrupted = cancel.is_cancelled();
        // A panicking hook must not cost the task its result.
        if catch_unwind(AssertUnwindSafe(|| progress(task.url(), interrupted))).is_err() {
            error!(url = task.url(), "progress hook panicked");
        }

        let fetched = if interrupted {
            Fetched::default()
        } else {
            // A panicking fetch must still answer for its task.
            AssertUnwindSafe(fetcher.fetch(task.url(), &cancel))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Fetched::failed(PageResult::default(), FetchError::Panicked))
        };

        if let Some(err) = &fetched.failure {
            warn!(url = task.url(), error = %err, "error processing link");
            task.record_failure(err);
        } else if !interrupted && fetched.page.is_empty() {
            debug!(url = task.url(), "page yielded no words or links");
        }
        aggregator.merge(&fetched.page, task.into_failure());
        results.publish(fetched.page.links).await;
    }

    debug!(worker = id, "task channel closed, worker exiting");
}

fn without_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(base, _)| base)
}
