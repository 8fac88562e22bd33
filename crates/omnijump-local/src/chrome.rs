//! Candidate source over a Chromium `History` SQLite database.
//!
//! The browser keeps the database locked while running, so every lookup
//! works on a temporary copy. Chromium stores visit times as microseconds
//! since 1601-01-01 UTC; they are converted to unix epoch milliseconds.

use omnijump_core::{CandidateSource, Error, HistoryItem, HistoryQuery, Result, TopSite};
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};

/// Microseconds between 1601-01-01 and 1970-01-01.
const WEBKIT_EPOCH_OFFSET_US: i64 = 11_644_473_600_000_000;

pub fn webkit_us_to_unix_ms(t: i64) -> Option<i64> {
    if t <= 0 {
        return None;
    }
    Some((t - WEBKIT_EPOCH_OFFSET_US) / 1000)
}

pub fn unix_ms_to_webkit_us(ms: i64) -> i64 {
    ms.saturating_mul(1000).saturating_add(WEBKIT_EPOCH_OFFSET_US)
}

/// Default `History` path of the Chrome "Default" profile on this platform.
pub fn default_history_path() -> Option<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()?.join("Library/Application Support/Google/Chrome")
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()?.join("Google/Chrome/User Data")
    } else {
        dirs::config_dir()?.join("google-chrome")
    };
    Some(base.join("Default").join("History"))
}

#[derive(Debug, Clone)]
pub struct ChromeHistorySource {
    db_path: PathBuf,
    top_sites_limit: usize,
}

impl ChromeHistorySource {
    pub fn new(db_path: PathBuf, top_sites_limit: usize) -> Self {
        Self {
            db_path,
            top_sites_limit,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn with_snapshot<T, F>(&self, map_err: fn(String) -> Error, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let src = self.db_path.clone();
        let joined = tokio::task::spawn_blocking(move || -> Result<T> {
            let tmp = tempfile::NamedTempFile::new().map_err(|e| map_err(e.to_string()))?;
            std::fs::copy(&src, tmp.path())
                .map_err(|e| map_err(format!("{}: {e}", src.display())))?;
            let conn = Connection::open_with_flags(tmp.path(), OpenFlags::SQLITE_OPEN_READ_ONLY)
                .map_err(|e| map_err(e.to_string()))?;
            f(&conn).map_err(|e| map_err(e.to_string()))
        })
        .await;
        joined.map_err(|e| map_err(e.to_string()))?
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('%');
    for ch in s.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

fn non_empty(title: Option<String>) -> Option<String> {
    title.filter(|t| !t.is_empty())
}

#[async_trait::async_trait]
impl CandidateSource for ChromeHistorySource {
    fn name(&self) -> &'static str {
        "chrome"
    }

    async fn search_history(&self, q: &HistoryQuery) -> Result<Vec<HistoryItem>> {
        let pattern = escape_like(q.text.trim());
        let since = unix_ms_to_webkit_us(q.start_time);
        let limit = i64::try_from(q.max_results).unwrap_or(i64::MAX);
        self.with_snapshot(Error::History, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT url, title, last_visit_time FROM urls \
                 WHERE hidden = 0 AND last_visit_time >= ?1 \
                   AND (url LIKE ?2 ESCAPE '\\' OR title LIKE ?2 ESCAPE '\\') \
                 ORDER BY last_visit_time DESC LIMIT ?3",
            )?;
            let rows = stmt.query_map(params![since, pattern, limit], |r| {
                Ok(HistoryItem {
                    url: r.get(0)?,
                    title: non_empty(r.get(1)?),
                    last_visit_time: webkit_us_to_unix_ms(r.get(2)?),
                })
            })?;
            rows.collect()
        })
        .await
    }

    async fn top_sites(&self) -> Result<Vec<TopSite>> {
        let limit = i64::try_from(self.top_sites_limit).unwrap_or(i64::MAX);
        self.with_snapshot(Error::TopSites, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT url, title FROM urls WHERE hidden = 0 \
                 ORDER BY visit_count DESC, last_visit_time DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |r| {
                Ok(TopSite {
                    url: r.get(0)?,
                    title: non_empty(r.get(1)?),
                })
            })?;
            rows.collect()
        })
        .await
    }
}
