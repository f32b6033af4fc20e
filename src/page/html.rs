// src/page/html.rs
// =============================================================================
// Turns one HTML page into a PageResult: its word counts and the links
// that stay on the crawled site.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM, forgiving broken markup like browsers do
// - Decodes entities in text and attribute values for us
// - Supports CSS selectors for finding the <a href> elements
//
// Text inside links, scripts, styles and templates is not prose, so it is
// not counted.
// =============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

use scraper::{Html, Selector};
use url::Url;

use super::host::HostFilter;
use super::words::{count_words, WordRules};
use crate::crawl::PageResult;

const SKIPPED_TEXT_PARENTS: &[&str] = &["a", "script", "style", "noscript", "template"];

// "a[href]" is a constant, known-valid selector
fn anchor_selector() -> &'static Selector {
    static ANCHOR: OnceLock<Selector> = OnceLock::new();
    ANCHOR.get_or_init(|| Selector::parse("a[href]").expect("anchor selector is valid"))
}

// Parameters:
//   html: the page body
//   page_url: where the page was fetched from (for resolving relative links)
//   hosts: which links belong to the crawl
//   rules: which words get counted
pub fn extract_page(html: &str, page_url: &Url, hosts: &HostFilter, rules: &WordRules) -> PageResult {
    let document = Html::parse_document(html);

    PageResult {
        words: extract_words(&document, rules),
        links: extract_links(&document, page_url, hosts),
    }
}

fn extract_words(document: &Html, rules: &WordRules) -> HashMap<String, u64> {
    let mut words = HashMap::new();

    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_TEXT_PARENTS.contains(&el.name()))
        });
        if !skipped {
            count_words(text, rules, &mut words);
        }
    }

    words
}

fn extract_links(document: &Html, page_url: &Url, hosts: &HostFilter) -> Vec<String> {
    document
        .select(anchor_selector())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(page_url, href))
        .filter(|url| hosts.matches(url))
        .map(String::from)
        .collect()
}

// Resolves an href to an absolute, fragment-free http(s) URL
//
// Examples (page https://example.com/docs/intro):
//   "#usage"             -> None (same page)
//   "setup#step-2"       -> https://example.com/docs/setup
//   "/blog"              -> https://example.com/blog
//   "mailto:a@b.c"       -> None
fn resolve_link(page_url: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut url = page_url.join(href).ok()?;
    url.set_fragment(None);

    matches!(url.scheme(), "http" | "https").then_some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> WordRules {
        WordRules {
            min_len: 6,
            max_len: None,
        }
    }

    fn page_at(url: &str, html: &str) -> PageResult {
        let page_url = Url::parse(url).unwrap();
        let hosts = HostFilter::from_seed(&page_url).unwrap();
        extract_page(html, &page_url, &hosts, &rules())
    }

    #[test]
    fn test_counts_body_text_but_not_anchor_text() {
        let page = page_at(
            "https://example.com/",
            r#"<html><head><title>Gardening</title></head>
               <body><p>Tomatoes and more tomatoes. Tomatoes!</p>
               <a href="/peppers">Peppers peppers</a></body></html>"#,
        );

        assert_eq!(page.words.get("Tomatoes"), Some(&2));
        assert_eq!(page.words.get("tomatoes"), Some(&1));
        assert_eq!(page.words.get("Gardening"), Some(&1));
        assert_eq!(page.words.get("Peppers"), None);
        assert_eq!(page.words.get("peppers"), None);
    }

    #[test]
    fn test_scripts_and_styles_are_not_prose() {
        let page = page_at(
            "https://example.com/",
            r#"<body><script>var variable = computeSomething();</script>
               <style>.container { display: block }</style>
               <p>Visible paragraph</p></body>"#,
        );

        assert_eq!(page.words.len(), 2);
        assert_eq!(page.words.get("Visible"), Some(&1));
        assert_eq!(page.words.get("paragraph"), Some(&1));
    }

    #[test]
    fn test_entities_are_decoded() {
        let page = page_at("https://example.com/", "<p>caf&eacute;s&nbsp;cr&egrave;mes</p>");
        assert_eq!(page.words.get("cafés"), None); // 5 chars
        assert_eq!(page.words.get("crèmes"), Some(&1));
    }

    #[test]
    fn test_links_resolved_and_fragments_stripped() {
        let page = page_at(
            "https://www.example.com/docs/intro",
            r##"<a href="#usage">same page</a>
                <a href="setup#step-2">relative</a>
                <a href="/blog">rooted</a>
                <a href="https://api.example.com/v1">sub-host</a>
                <a href="https://elsewhere.org/">external</a>
                <a href="mailto:someone@example.com">mail</a>
                <a href="javascript:void(0)">script</a>
                <a href="/blog">again</a>"##,
        );

        assert_eq!(
            page.links,
            vec![
                "https://www.example.com/docs/setup",
                "https://www.example.com/blog",
                "https://api.example.com/v1",
                "https://www.example.com/blog",
            ]
        );
    }

    #[test]
    fn test_empty_document() {
        let page = page_at("https://example.com/", "");
        assert!(page.is_empty());
    }
}
