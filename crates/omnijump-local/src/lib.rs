//! Local ranking engine for omnijump: scoring, ranking, candidate sources,
//! and the overlay-facing helpers that sit around them.

pub mod chrome;
pub mod config;
pub mod dispatch;
pub mod favicon;
pub mod launcher;
pub mod rank;
pub mod score;
pub mod snapshot;

pub use chrome::ChromeHistorySource;
pub use config::{RankerConfig, ScoreWeights};
pub use dispatch::{Dispatcher, Effect, Request, Response};
pub use launcher::{pinned_entries, resolve_query, Destination};
pub use rank::{rank_candidates, SuggestionRanker};
pub use score::{relevance_score, score};
pub use snapshot::{Snapshot, SnapshotSource};
