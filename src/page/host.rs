// src/page/host.rs
// =============================================================================
// Decides which links belong to the site being crawled.
//
// The target is the seed's hostname with any leading "www." removed. A link
// stays in the crawl when its host is the target itself or a sub-host of it:
//
//   seed https://www.example.com
//   example.com        -> yes
//   docs.example.com   -> yes
//   www.example.com    -> yes
//   notexample.com     -> no (not on a label boundary)
//   example.org        -> no
// =============================================================================

use url::Url;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFilter {
    target: String,
}

impl HostFilter {
    pub fn from_seed(seed: &Url) -> Result<Self, ConfigError> {
        let host = seed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ConfigError::SeedWithoutHost(seed.to_string()))?
            .to_ascii_lowercase();
        let target = host.strip_prefix("www.").unwrap_or(&host).to_string();
        Ok(Self { target })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        host == self.target
            || host
                .strip_suffix(self.target.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    pub fn matches(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|host| self.matches_host(host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(seed: &str) -> HostFilter {
        HostFilter::from_seed(&Url::parse(seed).unwrap()).unwrap()
    }

    #[test]
    fn test_www_prefix_is_stripped() {
        assert_eq!(filter("https://www.example.com/start").target(), "example.com");
        assert_eq!(filter("https://example.com").target(), "example.com");
    }

    #[test]
    fn test_same_and_sub_hosts_match() {
        let f = filter("https://www.example.com");
        assert!(f.matches_host("example.com"));
        assert!(f.matches_host("www.example.com"));
        assert!(f.matches_host("docs.example.com"));
        assert!(f.matches_host("Docs.Example.COM"));
    }

    #[test]
    fn test_other_hosts_do_not_match() {
        let f = filter("https://example.com");
        assert!(!f.matches_host("notexample.com"));
        assert!(!f.matches_host("example.org"));
        assert!(!f.matches_host("com"));
    }

    #[test]
    fn test_ip_seed_matches_itself() {
        let f = filter("http://127.0.0.1:8080/");
        assert!(f.matches(&Url::parse("http://127.0.0.1:8080/page").unwrap()));
        assert!(!f.matches(&Url::parse("http://10.0.0.1/").unwrap()));
    }

    #[test]
    fn test_seed_without_host_is_rejected() {
        let seed = Url::parse("file:///tmp/index.html").unwrap();
        assert!(matches!(
            HostFilter::from_seed(&seed),
            Err(ConfigError::SeedWithoutHost(_))
        ));
    }
}
