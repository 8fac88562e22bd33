//! Public facade crate for `omnijump`.
//!
//! This crate intentionally contains no IO or ranking logic.
//! It re-exports the backend-agnostic types/traits from `omnijump-core`.

pub use omnijump_core::*;
