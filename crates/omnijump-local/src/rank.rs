//! Suggestion ranking over history and top-site pools.
//!
//! Pipeline: score each pool (history first), drop zero scores and repeated
//! URLs, stable-sort by score, cap after URL dedup, then dedup titles
//! case-insensitively and apply the final cap.

use crate::config::RankerConfig;
use crate::favicon::favicon_url;
use crate::score::relevance_score;
use omnijump_core::{
    CandidateRecord, CandidateSource, HistoryItem, HistoryQuery, Result, ScoredSuggestion,
    TopSite,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

/// Rank already-fetched pools. Pure apart from reading `now_ms` as given.
pub fn rank_candidates(
    history: Vec<HistoryItem>,
    top_sites: Vec<TopSite>,
    query: &str,
    now_ms: i64,
    cfg: &RankerConfig,
) -> Vec<ScoredSuggestion> {
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut working: Vec<ScoredSuggestion> = Vec::with_capacity(history.len() + top_sites.len());

    let pools = history
        .into_iter()
        .map(CandidateRecord::from)
        .chain(top_sites.into_iter().map(CandidateRecord::from));

    for cand in pools {
        if cand.display_title().is_none() || seen_urls.contains(&cand.url) {
            continue;
        }
        let score = relevance_score(&cand, query, now_ms, &cfg.weights);
        if score == 0 {
            continue;
        }
        seen_urls.insert(cand.url.clone());
        working.push(ScoredSuggestion {
            kind: cand.origin.into(),
            favicon_url: favicon_url(&cand.url, cfg),
            title: cand.title.unwrap_or_default(),
            url: cand.url,
            score,
            last_visit_time: cand.last_visit_time,
        });
    }

    // `sort_by` is stable: equal scores keep pool order, then collaborator order.
    working.sort_by(|a, b| b.score.cmp(&a.score));

    let scored = working.len();
    let mut urls: HashSet<String> = HashSet::new();
    let by_url: Vec<ScoredSuggestion> = working
        .into_iter()
        .filter(|s| urls.insert(s.url.clone()))
        .take(cfg.dedup_cap)
        .collect();

    let mut titles: HashSet<String> = HashSet::new();
    let out: Vec<ScoredSuggestion> = by_url
        .into_iter()
        .filter(|s| titles.insert(s.title.to_lowercase()))
        .take(cfg.max_suggestions)
        .collect();

    tracing::debug!(scored, returned = out.len(), "ranked suggestions");
    out
}

/// Fetches both pools from a [`CandidateSource`] and ranks them.
#[derive(Clone)]
pub struct SuggestionRanker {
    source: Arc<dyn CandidateSource>,
    cfg: RankerConfig,
    now_ms: Option<i64>,
}

impl SuggestionRanker {
    pub fn new(source: Arc<dyn CandidateSource>, cfg: RankerConfig) -> Self {
        Self {
            source,
            cfg,
            now_ms: None,
        }
    }

    /// Pin "now" for deterministic outputs.
    pub fn with_now_ms(mut self, now_ms: i64) -> Self {
        self.now_ms = Some(now_ms);
        self
    }

    pub fn config(&self) -> &RankerConfig {
        &self.cfg
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Ranked suggestions for `query`. Collaborator failures yield an empty list.
    pub async fn suggestions(&self, query: &str) -> Vec<ScoredSuggestion> {
        match self.try_suggestions(query).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(source = self.source.name(), error = %e, "suggestion lookup failed");
                Vec::new()
            }
        }
    }

    pub async fn try_suggestions(&self, query: &str) -> Result<Vec<ScoredSuggestion>> {
        let now = self.now_ms.unwrap_or_else(now_epoch_ms);
        let hq = HistoryQuery {
            text: query.to_string(),
            max_results: self.cfg.history_max_results,
            start_time: self.cfg.history_start_time(now),
        };
        let (history, top_sites) = tokio::try_join!(
            self.source.search_history(&hq),
            self.source.top_sites()
        )?;
        tracing::debug!(
            source = self.source.name(),
            history = history.len(),
            top_sites = top_sites.len(),
            "fetched candidate pools"
        );
        Ok(rank_candidates(history, top_sites, query, now, &self.cfg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omnijump_core::{Error, SuggestionKind};
    use proptest::prelude::*;
    use std::sync::Mutex;

    const NOW: i64 = 1_760_000_000_000;

    fn hist(title: Option<&str>, url: &str, visited: Option<i64>) -> HistoryItem {
        HistoryItem {
            title: title.map(str::to_string),
            url: url.to_string(),
            last_visit_time: visited,
        }
    }

    fn site(title: Option<&str>, url: &str) -> TopSite {
        TopSite {
            title: title.map(str::to_string),
            url: url.to_string(),
        }
    }

    fn rank(h: Vec<HistoryItem>, t: Vec<TopSite>, q: &str) -> Vec<ScoredSuggestion> {
        rank_candidates(h, t, q, NOW, &RankerConfig::default())
    }

    #[test]
    fn history_wins_on_shared_url() {
        let out = rank(
            vec![hist(Some("GitHub"), "https://github.com", None)],
            vec![site(Some("GitHub"), "https://github.com")],
            "github",
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, SuggestionKind::History);
    }

    #[test]
    fn unscored_history_does_not_block_top_site_url() {
        // Untitled history entry is dropped before the URL is recorded as seen.
        let out = rank(
            vec![hist(None, "https://github.com", Some(NOW))],
            vec![site(Some("GitHub"), "https://github.com")],
            "github",
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, SuggestionKind::TopSite);
    }

    #[test]
    fn no_match_returns_empty() {
        let out = rank(
            vec![hist(Some("Rust"), "https://rust-lang.org", Some(NOW - 100 * 86_400_000))],
            vec![site(Some("GitHub"), "https://github.com")],
            "xyz123notfound",
        );
        assert!(out.is_empty());
    }

    #[test]
    fn top_eight_in_descending_order() {
        // Pairs of sites share a score; each pair matches one fewer query word.
        let words = ["a1", "b2", "c3", "d4", "e5", "f6", "g7", "h8", "i9", "j10"];
        let query = words.join(" ");
        let mut sites = Vec::new();
        for i in 0..20 {
            let hits = 10usize.saturating_sub(i / 2);
            let mut title = words[..hits].join(" ");
            title.push_str(&format!(" #{i:02}"));
            sites.push(site(Some(&title), &format!("https://s{i}.test/")));
        }
        let out = rank(Vec::new(), sites, &query);
        assert_eq!(out.len(), 8);
        for w in out.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
        // stable ties: within each pair of equal scores, input order is preserved
        let urls: Vec<&str> = out.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://s0.test/",
                "https://s1.test/",
                "https://s2.test/",
                "https://s3.test/",
                "https://s4.test/",
                "https://s5.test/",
                "https://s6.test/",
                "https://s7.test/",
            ]
        );
    }

    #[test]
    fn strictly_decreasing_scores_keep_exact_top_eight() {
        let words: Vec<String> = (1..=20).map(|i| format!("w{i:02}")).collect();
        let query = words.join(" ");
        // Fed in ascending score order so the sort has to do the work.
        let sites: Vec<TopSite> = (0..20)
            .rev()
            .map(|i| {
                let title = words[..20 - i].join(" ");
                site(Some(&title), &format!("https://t{i}.test/"))
            })
            .collect();
        let out = rank(Vec::new(), sites, &query);
        let urls: Vec<String> = out.iter().map(|s| s.url.clone()).collect();
        let expected: Vec<String> = (0..8).map(|i| format!("https://t{i}.test/")).collect();
        assert_eq!(urls, expected);
        assert_eq!(out[0].score, 565);
        assert_eq!(out[1].score, 380);
        assert_eq!(out[7].score, 260);
    }

    #[test]
    fn titles_dedup_case_insensitively_keeping_highest() {
        let out = rank(
            vec![
                hist(Some("docs"), "https://a.test/docs-old", None),
                hist(Some("Docs"), "https://docs.test/", Some(NOW)),
            ],
            Vec::new(),
            "docs",
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "https://docs.test/");
    }

    #[test]
    fn title_dedup_runs_after_the_first_cap() {
        // 12 distinct high scorers fill the pre-title-dedup cap; a 13th unique title is cut.
        let mut h = Vec::new();
        for i in 0..12 {
            h.push(hist(Some("same"), &format!("https://same{i}.test/"), Some(NOW)));
        }
        h.push(hist(Some("same but different"), "https://other.test/", None));
        let out = rank(h, Vec::new(), "same");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "same");
    }

    #[test]
    fn favicon_falls_back_for_bad_url() {
        let out = rank(
            vec![hist(Some("Broken"), "not a valid url", None)],
            Vec::new(),
            "broken",
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].favicon_url, "not a valid url/favicon.ico");
    }

    #[test]
    fn empty_pools_rank_to_empty() {
        assert!(rank(Vec::new(), Vec::new(), "anything").is_empty());
    }

    #[derive(Default)]
    struct FakeSource {
        history: Vec<HistoryItem>,
        top_sites: Vec<TopSite>,
        fail_history: bool,
        fail_top_sites: bool,
        seen_query: Mutex<Option<HistoryQuery>>,
    }

    #[async_trait::async_trait]
    impl CandidateSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn search_history(&self, q: &HistoryQuery) -> Result<Vec<HistoryItem>> {
            *self.seen_query.lock().unwrap() = Some(q.clone());
            if self.fail_history {
                return Err(Error::History("boom".to_string()));
            }
            Ok(self.history.clone())
        }

        async fn top_sites(&self) -> Result<Vec<TopSite>> {
            if self.fail_top_sites {
                return Err(Error::TopSites("boom".to_string()));
            }
            Ok(self.top_sites.clone())
        }
    }

    #[tokio::test]
    async fn ranker_requests_thirty_day_window_of_fifty() {
        let src = Arc::new(FakeSource {
            history: vec![hist(Some("GitHub"), "https://github.com", Some(NOW))],
            ..FakeSource::default()
        });
        let ranker = SuggestionRanker::new(src.clone(), RankerConfig::default()).with_now_ms(NOW);
        let out = ranker.suggestions("github").await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].score, 230);

        let q = src.seen_query.lock().unwrap().clone().unwrap();
        assert_eq!(q.text, "github");
        assert_eq!(q.max_results, 50);
        assert_eq!(q.start_time, NOW - 30 * 86_400_000);
    }

    #[tokio::test]
    async fn history_failure_resolves_to_empty() {
        let src = Arc::new(FakeSource {
            top_sites: vec![site(Some("GitHub"), "https://github.com")],
            fail_history: true,
            ..FakeSource::default()
        });
        let ranker = SuggestionRanker::new(src, RankerConfig::default()).with_now_ms(NOW);
        assert!(ranker.suggestions("github").await.is_empty());
        assert!(ranker.try_suggestions("github").await.is_err());
    }

    #[tokio::test]
    async fn top_sites_failure_resolves_to_empty() {
        let src = Arc::new(FakeSource {
            history: vec![hist(Some("GitHub"), "https://github.com", Some(NOW))],
            fail_top_sites: true,
            ..FakeSource::default()
        });
        let ranker = SuggestionRanker::new(src, RankerConfig::default()).with_now_ms(NOW);
        assert!(ranker.suggestions("github").await.is_empty());
    }

    fn arb_title() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            1 => Just(None),
            6 => "[A-Za-z]{1,3}( [A-Za-z]{1,3}){0,2}".prop_map(Some),
        ]
    }

    fn arb_url() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => "[a-c]{1,3}".prop_map(|h| format!("https://{h}.test/")),
            1 => Just("not a valid url".to_string()),
        ]
    }

    fn arb_history() -> impl Strategy<Value = HistoryItem> {
        (
            arb_title(),
            arb_url(),
            proptest::option::of(0i64..40 * 86_400_000),
        )
            .prop_map(|(title, url, ago)| HistoryItem {
                title,
                url,
                last_visit_time: ago.map(|a| NOW - a),
            })
    }

    fn arb_site() -> impl Strategy<Value = TopSite> {
        (arb_title(), arb_url()).prop_map(|(title, url)| TopSite { title, url })
    }

    proptest! {
        #[test]
        fn ranking_invariants_hold(
            history in proptest::collection::vec(arb_history(), 0..40),
            sites in proptest::collection::vec(arb_site(), 0..20),
            query in "[a-c]{1,2}( [a-c]{1,2})?",
        ) {
            let cfg = RankerConfig::default();
            let out = rank_candidates(history.clone(), sites.clone(), &query, NOW, &cfg);

            prop_assert!(out.len() <= 8);

            let mut urls = HashSet::new();
            let mut titles = HashSet::new();
            for s in &out {
                prop_assert!(s.score >= 1);
                prop_assert!(urls.insert(s.url.clone()));
                prop_assert!(titles.insert(s.title.to_lowercase()));
            }
            for w in out.windows(2) {
                prop_assert!(w[0].score >= w[1].score);
            }

            // Zero-score candidates never surface.
            let surfaced: HashSet<&str> = out.iter().map(|s| s.url.as_str()).collect();
            for h in &history {
                let c = CandidateRecord::from(h.clone());
                if relevance_score(&c, &query, NOW, &cfg.weights) == 0
                    && !sites.iter().any(|t| t.url == h.url)
                    && !history.iter().any(|o| o.url == h.url && o != h)
                {
                    prop_assert!(!surfaced.contains(h.url.as_str()));
                }
            }

            // Same snapshot, same answer.
            let again = rank_candidates(history, sites, &query, NOW, &cfg);
            prop_assert_eq!(out, again);
        }

        #[test]
        fn score_is_deterministic(item in arb_history(), query in "[a-z ]{0,6}") {
            let c = CandidateRecord::from(item);
            let w = RankerConfig::default().weights;
            prop_assert_eq!(
                relevance_score(&c, &query, NOW, &w),
                relevance_score(&c, &query, NOW, &w)
            );
        }
    }
}
