//! `omnijump` crate (library surface).
//!
//! The primary entrypoint for end users is the `omnijump` binary (CLI + stdio server).
//! This library module exists to support embedding without depending on internal
//! crate layout.

pub use omnijump_core as core;
pub use omnijump_local as local;
