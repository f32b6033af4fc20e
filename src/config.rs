// src/config.rs
// =============================================================================
// Turns parsed CLI flags into a checked CrawlConfig.
//
// All validation happens here, once, before any task is spawned:
// - concurrency, channel capacity and top-N must be at least 1
// - the word length range must not be empty
// - the seed must be an absolute URL with a host (its fragment is dropped)
// =============================================================================

use std::time::Duration;

use url::Url;

use crate::cli::Cli;
use crate::crawl::{Backpressure, SchedulerConfig};
use crate::error::ConfigError;
use crate::page::{HostFilter, WordRules};

// Channel capacity per worker when --chan-buf-len isn't given
const CHANNEL_SLOTS_PER_WORKER: usize = 5;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed: Url,
    pub concurrency: usize,
    pub channel_capacity: usize,
    pub min_len: usize,
    pub max_len: Option<usize>,
    pub top: usize,
    pub timeout: Duration,
    pub dict_size: usize,
    pub backpressure: Backpressure,
    pub json: bool,
}

impl CrawlConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut seed = Url::parse(&cli.url).map_err(|e| ConfigError::InvalidSeed {
            url: cli.url.clone(),
            reason: e.to_string(),
        })?;
        seed.set_fragment(None);

        let channel_capacity = match cli.chan_buf_len {
            0 => cli.concurrency.saturating_mul(CHANNEL_SLOTS_PER_WORKER),
            n => n,
        };

        let config = Self {
            seed,
            concurrency: cli.concurrency,
            channel_capacity,
            min_len: cli.min_len,
            max_len: (cli.max_len > 0).then_some(cli.max_len),
            top: cli.top,
            timeout: Duration::from_secs(cli.timeout),
            dict_size: cli.dict_size,
            backpressure: cli.backpressure,
            json: cli.json,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency(self.concurrency));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ZeroChannelCapacity);
        }
        if self.top == 0 {
            return Err(ConfigError::ZeroTop);
        }
        if let Some(max) = self.max_len {
            if self.min_len > max {
                return Err(ConfigError::LengthRange {
                    min: self.min_len,
                    max,
                });
            }
        }
        self.host_filter()?;
        Ok(())
    }

    pub fn host_filter(&self) -> Result<HostFilter, ConfigError> {
        HostFilter::from_seed(&self.seed)
    }

    pub fn word_rules(&self) -> WordRules {
        WordRules {
            min_len: self.min_len,
            max_len: self.max_len,
        }
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            concurrency: self.concurrency,
            task_capacity: self.channel_capacity,
            result_capacity: self.channel_capacity,
            backpressure: self.backpressure,
            dict_size: self.dict_size,
            top: self.top,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(args: &[&str]) -> Result<CrawlConfig, ConfigError> {
        let cli = Cli::parse_from(std::iter::once("wordcrawl").chain(args.iter().copied()));
        CrawlConfig::from_cli(&cli)
    }

    #[test]
    fn test_defaults_derive_channel_capacity() {
        let cfg = config(&["https://www.example.com"]).unwrap();
        assert_eq!(cfg.channel_capacity, 25);
        assert_eq!(cfg.max_len, None);
        assert_eq!(cfg.seed.as_str(), "https://www.example.com/");
        assert_eq!(cfg.host_filter().unwrap().target(), "example.com");

        let sched = cfg.scheduler();
        assert_eq!(sched.concurrency, 5);
        assert_eq!(sched.task_capacity, 25);
        assert_eq!(sched.result_capacity, 25);
        assert_eq!(sched.top, 20);
    }

    #[test]
    fn test_seed_fragment_is_dropped() {
        let cfg = config(&["https://example.com/docs#intro"]).unwrap();
        assert_eq!(cfg.seed.as_str(), "https://example.com/docs");
    }

    #[test]
    fn test_explicit_values() {
        let cfg = config(&[
            "--concurrency",
            "2",
            "--chan-buf-len",
            "3",
            "--min-len",
            "4",
            "--max-len",
            "8",
            "https://example.com",
        ])
        .unwrap();
        assert_eq!(cfg.channel_capacity, 3);
        assert_eq!(
            cfg.word_rules(),
            WordRules {
                min_len: 4,
                max_len: Some(8)
            }
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        assert_eq!(
            config(&["--concurrency", "0", "https://example.com"]).unwrap_err(),
            ConfigError::ZeroConcurrency(0)
        );
        assert_eq!(
            config(&["--top", "0", "https://example.com"]).unwrap_err(),
            ConfigError::ZeroTop
        );
        assert_eq!(
            config(&["--min-len", "9", "--max-len", "3", "https://example.com"]).unwrap_err(),
            ConfigError::LengthRange { min: 9, max: 3 }
        );
        assert!(matches!(
            config(&["not a url"]).unwrap_err(),
            ConfigError::InvalidSeed { .. }
        ));
        assert!(matches!(
            config(&["file:///tmp/index.html"]).unwrap_err(),
            ConfigError::SeedWithoutHost(_)
        ));
    }
}
