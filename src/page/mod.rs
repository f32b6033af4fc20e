// src/page/mod.rs
// =============================================================================
// Fetching and reading pages: everything the crawl core treats as a
// black box behind the Fetcher trait.
//
// Submodules:
// - host: which links belong to the crawled site
// - words: word matching, length rules and \uXXXX decoding
// - html: words and links from one HTML document
// - http: PageFetcher, the reqwest-backed Fetcher
// =============================================================================

mod host;
mod html;
mod http;
mod words;

pub use host::HostFilter;
pub use http::PageFetcher;
pub use words::WordRules;
