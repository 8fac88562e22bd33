//! Offline candidate source backed by a JSON snapshot.
//!
//! Shape: `{ "history": [HistoryItem...], "topSites": [TopSite...] }`.
//! History lookups apply the same text/time filtering a browser history
//! search would; top sites are returned as stored.

use omnijump_core::{
    CandidateSource, Error, HistoryItem, HistoryQuery, Result, TopSite,
};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub history: Vec<HistoryItem>,
    #[serde(default)]
    pub top_sites: Vec<TopSite>,
}

#[derive(Debug, Clone)]
pub struct SnapshotSource {
    snapshot: Snapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| Error::Snapshot(format!("{}: {e}", path.display())))?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Snapshot(format!("{}: {e}", path.display())))?;
        Ok(Self::new(snapshot))
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

fn matches_text(item: &HistoryItem, text_lc: &str) -> bool {
    if text_lc.is_empty() {
        return true;
    }
    item.url.to_lowercase().contains(text_lc)
        || item
            .title
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(text_lc))
}

fn within_window(item: &HistoryItem, start_time: i64) -> bool {
    match item.last_visit_time {
        Some(t) => t >= start_time,
        None => start_time <= 0,
    }
}

#[async_trait::async_trait]
impl CandidateSource for SnapshotSource {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn search_history(&self, q: &HistoryQuery) -> Result<Vec<HistoryItem>> {
        let text_lc = q.text.trim().to_lowercase();
        let mut out: Vec<HistoryItem> = self
            .snapshot
            .history
            .iter()
            .filter(|h| within_window(h, q.start_time) && matches_text(h, &text_lc))
            .cloned()
            .collect();
        out.sort_by_key(|h| Reverse(h.last_visit_time));
        out.truncate(q.max_results);
        Ok(out)
    }

    async fn top_sites(&self) -> Result<Vec<TopSite>> {
        Ok(self.snapshot.top_sites.clone())
    }
}
