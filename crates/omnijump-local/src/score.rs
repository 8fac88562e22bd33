//! Relevance scoring for a single candidate.
//!
//! Signals are additive; a candidate can collect several at once. The
//! function is pure: "now" is an argument so results are reproducible. Sums
//! saturate at `u32::MAX`.

use crate::config::{ScoreWeights, MS_PER_DAY};
use omnijump_core::{url_host, CandidateRecord};

/// Score `candidate` against `query` using `weights`.
///
/// A missing title scores as the empty string. Domain signals are skipped
/// when the URL does not parse; the rest still apply.
pub fn relevance_score(
    candidate: &CandidateRecord,
    query: &str,
    now_ms: i64,
    weights: &ScoreWeights,
) -> u32 {
    let query_lc = query.to_lowercase();
    let title_lc = candidate
        .title
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_default();
    let url_lc = candidate.url.to_lowercase();

    let mut score: u32 = 0;

    if title_lc == query_lc {
        score = score.saturating_add(weights.exact_title);
    }
    if title_lc.starts_with(&query_lc) {
        score = score.saturating_add(weights.title_prefix);
    }
    for word in query_lc.split_whitespace() {
        if title_lc.contains(word) {
            score = score.saturating_add(weights.title_word);
        }
    }
    if title_lc.contains(&query_lc) {
        score = score.saturating_add(weights.title_substring);
    }

    if let Some(host) = url_host(&candidate.url) {
        if host.contains(&query_lc) {
            score = score.saturating_add(weights.domain_substring);
        }
        if host.starts_with(&query_lc) {
            score = score.saturating_add(weights.domain_prefix);
        }
    }

    if url_lc.contains(&query_lc) {
        score = score.saturating_add(weights.url_substring);
    }

    if let Some(visited) = candidate.last_visit_time {
        score = score.saturating_add(recency_bonus(now_ms, visited, weights));
    }

    score
}

/// Score with the default weights.
pub fn score(candidate: &CandidateRecord, query: &str, now_ms: i64) -> u32 {
    relevance_score(candidate, query, now_ms, &ScoreWeights::default())
}

fn recency_bonus(now_ms: i64, visited_ms: i64, weights: &ScoreWeights) -> u32 {
    // Fractional days; a visit stamped in the future counts as "today".
    let days = now_ms.saturating_sub(visited_ms) as f64 / MS_PER_DAY as f64;
    if days < 1.0 {
        weights.visited_within_day
    } else if days < 7.0 {
        weights.visited_within_week
    } else if days < 30.0 {
        weights.visited_within_month
    } else {
        0
    }
}
