// src/page/http.rs
// =============================================================================
// The Fetcher the crawler uses in production: fetch a page over HTTP and
// hand the body to the HTML extractor.
//
// Key behaviour:
// - One shared reqwest Client (connection pooling) with a request timeout
// - Redirects are followed only while they stay on the crawled site
// - Non-2xx responses and non-HTML content are recorded as failures
// - Every outcome returns a Fetched, so the scheduler's count stays balanced
//
// Rust concepts:
// - Implementing a trait with `async fn`
// - Closures captured by the redirect policy (move + Clone)
// =============================================================================

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use super::host::HostFilter;
use super::html::extract_page;
use super::words::WordRules;
use crate::crawl::{Fetched, Fetcher, PageResult};
use crate::error::FetchError;

const MAX_REDIRECTS: usize = 10;

pub struct PageFetcher {
    client: Client,
    hosts: HostFilter,
    rules: WordRules,
}

impl PageFetcher {
    pub fn new(hosts: HostFilter, rules: WordRules, timeout: Duration) -> Result<Self, FetchError> {
        let redirect_hosts = hosts.clone();
        let policy = Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if redirect_hosts.matches(attempt.url()) {
                attempt.follow()
            } else {
                // Leaving the site: keep the redirect response itself.
                attempt.stop()
            }
        });

        let client = Client::builder()
            .timeout(timeout)
            .redirect(policy)
            .build()?;

        Ok(Self {
            client,
            hosts,
            rules,
        })
    }

    async fn fetch_page(&self, url: &str) -> Result<PageResult, FetchError> {
        let page_url = Url::parse(url)?;
        let response = self.client.get(page_url).send().await?;

        let status = response.status();
        if status.is_redirection() {
            debug!(url, %status, "redirect leaves the site, not following");
            return Ok(PageResult::default());
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        // A missing content type gets the benefit of the doubt.
        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or_default().to_ascii_lowercase();
            if !is_html(&content_type) {
                return Err(FetchError::NotHtml(content_type));
            }
        }

        // Relative links resolve against where we actually ended up.
        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(extract_page(&body, &final_url, &self.hosts, &self.rules))
    }
}

fn is_html(content_type: &str) -> bool {
    content_type.starts_with("text/html") || content_type.starts_with("application/xhtml+xml")
}

impl Fetcher for PageFetcher {
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Fetched {
        if cancel.is_cancelled() {
            return Fetched::default();
        }

        debug!(url, "fetching page");
        match self.fetch_page(url).await {
            Ok(page) => Fetched::ok(page),
            Err(e) => Fetched::failed(PageResult::default(), e),
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why stop (not fail) on off-site redirects?
//    - A page redirecting to another domain is a normal thing for a site to
//      do; it just isn't part of the crawl
//    - attempt.stop() hands back the 3xx response, which we treat as an
//      empty page
//
// 2. Why no select! on the cancel token around the request?
//    - A request already in flight is allowed to finish; its words still
//      count. The client timeout bounds how long that takes
// -----------------------------------------------------------------------------
