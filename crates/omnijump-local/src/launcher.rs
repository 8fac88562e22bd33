//! Overlay helpers around the ranked list: where a raw query goes when no
//! suggestion is picked, and the fixed entries listed above suggestions.

use crate::config::RankerConfig;
use omnijump_core::{ScoredSuggestion, SuggestionKind};
use serde::{Deserialize, Serialize};

pub const NEW_TAB_URL: &str = "chrome://newtab/";
pub const CHATGPT_ENDPOINT: &str = "https://chatgpt.com/";
pub const PERPLEXITY_ENDPOINT: &str = "https://perplexity.ai/search";

const NEW_TAB_ICON: &str = "https://img.icons8.com/?size=100&id=ejub91zEY6Sl&format=png&color=000000";
const CHATGPT_ICON: &str = "https://img.icons8.com/?size=100&id=fO5yVwARGUEB&format=png&color=ffffff";
const PERPLEXITY_ICON: &str =
    "https://img.icons8.com/?size=100&id=kzJWN5jCDzpq&format=png&color=000000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Destination {
    Navigate { url: String },
    Search { url: String },
}

impl Destination {
    pub fn url(&self) -> &str {
        match self {
            Destination::Navigate { url } | Destination::Search { url } => url,
        }
    }
}

/// Treat `query` as an address when it has a dot and no spaces; otherwise search for it.
pub fn resolve_query(query: &str, cfg: &RankerConfig) -> Destination {
    let query = query.trim();
    if query.contains('.') && !query.contains(' ') {
        let url = if query.starts_with("http://") || query.starts_with("https://") {
            query.to_string()
        } else {
            format!("https://{query}")
        };
        Destination::Navigate { url }
    } else {
        Destination::Search {
            url: with_query_param(&cfg.search_endpoint, "q", query),
        }
    }
}

/// The "New Tab", "Ask ChatGPT" and "Ask Perplexity" rows, in display order.
pub fn pinned_entries(query: &str) -> Vec<ScoredSuggestion> {
    let pinned = |kind, title: String, url: String, icon: &str| ScoredSuggestion {
        kind,
        title,
        url,
        favicon_url: icon.to_string(),
        score: 0,
        last_visit_time: None,
    };
    vec![
        pinned(
            SuggestionKind::NewTab,
            "New Tab".to_string(),
            NEW_TAB_URL.to_string(),
            NEW_TAB_ICON,
        ),
        pinned(
            SuggestionKind::AskChatGpt,
            format!("Ask ChatGPT: \"{query}\""),
            with_query_param(CHATGPT_ENDPOINT, "q", query),
            CHATGPT_ICON,
        ),
        pinned(
            SuggestionKind::AskPerplexity,
            format!("Ask Perplexity: \"{query}\""),
            with_query_param(PERPLEXITY_ENDPOINT, "q", query),
            PERPLEXITY_ICON,
        ),
    ]
}

fn with_query_param(endpoint: &str, key: &str, value: &str) -> String {
    let sep = if endpoint.contains('?') { '&' } else { '?' };
    // Spaces go out as `%20`; a literal `+` is already `%2B` at this point.
    let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("{endpoint}{sep}{key}={encoded}")
}
