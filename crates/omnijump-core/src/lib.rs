use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("history lookup failed: {0}")]
    History(String),
    #[error("top sites lookup failed: {0}")]
    TopSites(String),
    #[error("snapshot error: {0}")]
    Snapshot(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error("not supported: {0}")]
    NotSupported(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Which collaborator pool a candidate came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Origin {
    History,
    TopSite,
}

/// Arguments of a history lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub text: String,
    pub max_results: usize,
    /// Unix epoch milliseconds; entries last visited before this are excluded.
    pub start_time: i64,
}

/// One entry as returned by a history lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    /// Unix epoch milliseconds.
    #[serde(default)]
    pub last_visit_time: Option<i64>,
}

/// One entry of the most-visited list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopSite {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
}

/// A candidate before scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    pub title: Option<String>,
    pub url: String,
    pub last_visit_time: Option<i64>,
    pub origin: Origin,
}

impl CandidateRecord {
    /// Title, if present and usable for display.
    pub fn display_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }
}

impl From<HistoryItem> for CandidateRecord {
    fn from(item: HistoryItem) -> Self {
        Self {
            title: item.title,
            url: item.url,
            last_visit_time: item.last_visit_time,
            origin: Origin::History,
        }
    }
}

impl From<TopSite> for CandidateRecord {
    fn from(site: TopSite) -> Self {
        Self {
            title: site.title,
            url: site.url,
            last_visit_time: None,
            origin: Origin::TopSite,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionKind {
    History,
    TopSite,
    #[serde(rename = "newtab")]
    NewTab,
    #[serde(rename = "chatgpt")]
    AskChatGpt,
    #[serde(rename = "perplexity")]
    AskPerplexity,
}

impl From<Origin> for SuggestionKind {
    fn from(o: Origin) -> Self {
        match o {
            Origin::History => SuggestionKind::History,
            Origin::TopSite => SuggestionKind::TopSite,
        }
    }
}

/// A display-ready suggestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredSuggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub title: String,
    pub url: String,
    #[serde(rename = "favicon")]
    pub favicon_url: String,
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visit_time: Option<i64>,
}

/// The two collaborator lookups the ranker draws from.
#[async_trait::async_trait]
pub trait CandidateSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn search_history(&self, q: &HistoryQuery) -> Result<Vec<HistoryItem>>;
    async fn top_sites(&self) -> Result<Vec<TopSite>>;
}

/// Host of an absolute URL, lowercased. `None` when the URL does not parse or has no host.
pub fn url_host(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}
