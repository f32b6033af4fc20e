// src/error.rs
// =============================================================================
// Typed errors for the crawler.
//
// Two families:
// - ConfigError: the run can't start (bad flags, bad seed URL)
// - FetchError: one page couldn't be fetched or parsed
//
// A FetchError never stops the crawl. The worker that hit it records it in
// the error log and carries on; only main.rs turns errors into exit codes.
//
// Rust concepts:
// - thiserror: derives std::error::Error and Display from attributes
// - #[from]: automatic conversion so `?` works on reqwest errors
// =============================================================================

use thiserror::Error;

// Problems found while turning CLI flags into a CrawlConfig
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("concurrency must be at least 1, got {0}")]
    ZeroConcurrency(usize),

    #[error("channel capacity must be at least 1")]
    ZeroChannelCapacity,

    #[error("number of reported words must be at least 1")]
    ZeroTop,

    #[error("minimum word length {min} is greater than maximum {max}")]
    LengthRange { min: usize, max: usize },

    #[error("the url '{url}' is not syntactically valid: {reason}")]
    InvalidSeed { url: String, reason: String },

    #[error("the url '{0}' has no host to crawl")]
    SeedWithoutHost(String),
}

// Why a single page produced no (or only partial) words and links
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("not an HTML page (content type '{0}')")]
    NotHtml(String),

    #[error("could not read page body: {0}")]
    Body(String),

    #[error("page processing panicked")]
    Panicked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_problem() {
        let err = ConfigError::LengthRange { min: 12, max: 4 };
        assert_eq!(
            err.to_string(),
            "minimum word length 12 is greater than maximum 4"
        );
        assert_eq!(FetchError::Status(404).to_string(), "HTTP 404");
        assert_eq!(
            FetchError::NotHtml("image/png".into()).to_string(),
            "not an HTML page (content type 'image/png')"
        );
    }
}
