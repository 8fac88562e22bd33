use crate::config::RankerConfig;
use omnijump_core::url_host;

/// Icon URL for a suggestion.
///
/// Uses the domain-keyed icon service when the URL has a host, otherwise
/// falls back to `<url>/favicon.ico`.
pub fn favicon_url(raw_url: &str, cfg: &RankerConfig) -> String {
    match url_host(raw_url) {
        Some(host) => format!(
            "{}?domain={}&sz={}",
            cfg.favicon_endpoint.trim_end_matches('?'),
            host,
            cfg.favicon_size
        ),
        None => format!("{raw_url}/favicon.ico"),
    }
}
