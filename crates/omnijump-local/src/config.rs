//! Ranking knobs.
//!
//! Defaults reproduce the extension's tuned constants. Every knob can be
//! overridden via `OMNIJUMP_*` environment variables; empty or unparseable
//! values fall back to the default.

pub const DEFAULT_HISTORY_WINDOW_DAYS: u64 = 30;
pub const DEFAULT_HISTORY_MAX_RESULTS: usize = 50;
pub const DEFAULT_DEDUP_CAP: usize = 12;
pub const DEFAULT_MAX_SUGGESTIONS: usize = 8;
pub const DEFAULT_TOP_SITES_LIMIT: usize = 10;
pub const DEFAULT_FAVICON_ENDPOINT: &str = "https://www.google.com/s2/favicons";
pub const DEFAULT_FAVICON_SIZE: u32 = 16;
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.google.com/search";

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Point weights of the relevance signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreWeights {
    pub exact_title: u32,
    pub title_prefix: u32,
    pub title_word: u32,
    pub title_substring: u32,
    pub domain_substring: u32,
    pub domain_prefix: u32,
    pub url_substring: u32,
    pub visited_within_day: u32,
    pub visited_within_week: u32,
    pub visited_within_month: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            exact_title: 100,
            title_prefix: 50,
            title_word: 20,
            title_substring: 15,
            domain_substring: 10,
            domain_prefix: 20,
            url_substring: 5,
            visited_within_day: 10,
            visited_within_week: 5,
            visited_within_month: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankerConfig {
    pub history_window_days: u64,
    pub history_max_results: usize,
    /// Cap applied after URL dedup, before title dedup.
    pub dedup_cap: usize,
    pub max_suggestions: usize,
    pub top_sites_limit: usize,
    pub favicon_endpoint: String,
    pub favicon_size: u32,
    pub search_endpoint: String,
    pub weights: ScoreWeights,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            history_window_days: DEFAULT_HISTORY_WINDOW_DAYS,
            history_max_results: DEFAULT_HISTORY_MAX_RESULTS,
            dedup_cap: DEFAULT_DEDUP_CAP,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            top_sites_limit: DEFAULT_TOP_SITES_LIMIT,
            favicon_endpoint: DEFAULT_FAVICON_ENDPOINT.to_string(),
            favicon_size: DEFAULT_FAVICON_SIZE,
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            weights: ScoreWeights::default(),
        }
    }
}

impl RankerConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            history_window_days: env_parse("OMNIJUMP_HISTORY_WINDOW_DAYS", d.history_window_days),
            history_max_results: env_parse("OMNIJUMP_HISTORY_MAX_RESULTS", d.history_max_results),
            dedup_cap: env_parse("OMNIJUMP_DEDUP_CAP", d.dedup_cap),
            max_suggestions: env_parse("OMNIJUMP_MAX_SUGGESTIONS", d.max_suggestions),
            top_sites_limit: env_parse("OMNIJUMP_TOP_SITES_LIMIT", d.top_sites_limit),
            favicon_endpoint: env_string("OMNIJUMP_FAVICON_ENDPOINT")
                .unwrap_or(d.favicon_endpoint),
            favicon_size: env_parse("OMNIJUMP_FAVICON_SIZE", d.favicon_size),
            search_endpoint: env_string("OMNIJUMP_SEARCH_ENDPOINT").unwrap_or(d.search_endpoint),
            weights: d.weights,
        }
    }

    /// Oldest visit time (unix ms) a history lookup should return.
    pub fn history_start_time(&self, now_ms: i64) -> i64 {
        let window = i64::try_from(self.history_window_days)
            .unwrap_or(i64::MAX)
            .saturating_mul(MS_PER_DAY);
        now_ms.saturating_sub(window)
    }
}

pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_string(key)
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
