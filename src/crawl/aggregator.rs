// src/crawl/aggregator.rs
// =============================================================================
// The shared word table and error log, behind one synchronized merge.
//
// Workers call merge() concurrently. Each call takes the lock once, appends
// the failure (if any), and adds the page's counts into the table. Nothing
// else can write to the table, so no update is ever lost.
//
// Reads (top, errors) are meant for after the workers have finished.
//
// Ranking: count descending, ties broken by the word itself (ascending),
// so the same table always ranks the same way whatever the merge order.
// =============================================================================

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::task::{CrawlFailure, PageResult, WordCount};

#[derive(Debug, Default)]
struct Tally {
    words: HashMap<String, u64>,
    errors: Vec<CrawlFailure>,
    merges: usize,
}

#[derive(Debug, Default)]
pub struct Aggregator {
    inner: Mutex<Tally>,
}

impl Aggregator {
    // `capacity` pre-sizes the word table
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Tally {
                words: HashMap::with_capacity(capacity),
                ..Tally::default()
            }),
        }
    }

    // A worker that panicked mid-merge can't leave a half-added count
    // behind (each += is one step), so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Tally> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn merge(&self, page: &PageResult, failure: Option<CrawlFailure>) {
        let mut tally = self.lock();
        tally.merges += 1;
        if let Some(failure) = failure {
            tally.errors.push(failure);
        }
        for (word, count) in &page.words {
            match tally.words.get_mut(word) {
                Some(total) => *total += count,
                None => {
                    tally.words.insert(word.clone(), *count);
                }
            }
        }
    }

    // The `n` most frequent words
    pub fn top(&self, n: usize) -> Vec<WordCount> {
        let tally = self.lock();
        let mut ranked: Vec<(&String, &u64)> = tally.words.iter().collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        ranked
            .into_iter()
            .take(n)
            .map(|(word, count)| WordCount {
                word: word.clone(),
                count: *count,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<CrawlFailure> {
        self.lock().errors.clone()
    }

    // Number of merge() calls so far, one per finished task
    pub fn merges(&self) -> usize {
        self.lock().merges
    }

    pub fn distinct_words(&self) -> usize {
        self.lock().words.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn page(words: &[(&str, u64)]) -> PageResult {
        PageResult {
            words: words.iter().map(|(w, c)| (w.to_string(), *c)).collect(),
            links: Vec::new(),
        }
    }

    fn wc(word: &str, count: u64) -> WordCount {
        WordCount {
            word: word.to_string(),
            count,
        }
    }

    #[test]
    fn test_merge_sums_counts() {
        let agg = Aggregator::default();
        agg.merge(&page(&[("parallelogram", 1), ("tarantulas", 1)]), None);
        agg.merge(&page(&[("parallelogram", 2), ("tarantulas", 1)]), None);

        assert_eq!(
            agg.top(10),
            vec![wc("parallelogram", 3), wc("tarantulas", 2)]
        );
        assert_eq!(agg.merges(), 2);
        assert!(agg.errors().is_empty());
    }

    #[test]
    fn test_failures_are_logged_in_order() {
        let agg = Aggregator::default();
        let fail = |url: &str| CrawlFailure {
            url: url.to_string(),
            reason: "HTTP 500".to_string(),
        };
        agg.merge(&PageResult::default(), Some(fail("https://a.test/1")));
        agg.merge(&page(&[("something", 1)]), None);
        agg.merge(&PageResult::default(), Some(fail("https://a.test/2")));

        assert_eq!(
            agg.errors(),
            vec![fail("https://a.test/1"), fail("https://a.test/2")]
        );
        assert_eq!(agg.merges(), 3);
    }

    #[test]
    fn test_top_truncates_and_ranks_descending() {
        let agg = Aggregator::with_capacity(8);
        agg.merge(&page(&[("alpha", 1), ("beta", 5), ("gamma", 3), ("delta", 4)]), None);

        let top = agg.top(2);
        assert_eq!(top, vec![wc("beta", 5), wc("delta", 4)]);
        assert!(agg.top(100).windows(2).all(|w| w[0].count >= w[1].count));
        assert_eq!(agg.top(0), Vec::new());
    }

    #[test]
    fn test_ties_rank_alphabetically_and_repeatably() {
        let agg = Aggregator::default();
        agg.merge(&page(&[("zucchini", 2), ("aardvarks", 2), ("mongooses", 2), ("best", 7)]), None);

        let first = agg.top(10);
        assert_eq!(
            first,
            vec![wc("best", 7), wc("aardvarks", 2), wc("mongooses", 2), wc("zucchini", 2)]
        );
        for _ in 0..10 {
            assert_eq!(agg.top(10), first);
        }
    }

    #[test]
    fn test_merge_order_does_not_matter() {
        let pages = vec![
            page(&[("apple", 1), ("banana", 2)]),
            page(&[("banana", 3), ("cherry", 1)]),
            page(&[("apple", 4)]),
            page(&[("cherry", 2), ("durian", 1)]),
        ];

        let forward = Aggregator::default();
        for p in &pages {
            forward.merge(p, None);
        }
        let backward = Aggregator::default();
        for p in pages.iter().rev() {
            backward.merge(p, None);
        }
        let interleaved = Aggregator::default();
        for i in [2, 0, 3, 1] {
            interleaved.merge(&pages[i], None);
        }

        assert_eq!(forward.top(10), backward.top(10));
        assert_eq!(forward.top(10), interleaved.top(10));
        assert_eq!(forward.top(1), vec![wc("banana", 5)]);
    }

    #[test]
    fn test_concurrent_merges_lose_nothing() {
        let agg = Arc::new(Aggregator::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let agg = Arc::clone(&agg);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        agg.merge(&page(&[("contended", 1), ("neighbour", 2)]), None);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(agg.top(2), vec![wc("neighbour", 8_000), wc("contended", 4_000)]);
        assert_eq!(agg.merges(), 4_000);
        assert_eq!(agg.distinct_words(), 2);
    }
}
