//! Search orchestration: concurrent backend fan-out and result merging.
//!
//! Fans one query out to every configured backend under rate limiting
//! and retry, tolerates independent failures, and merges the outcomes
//! into a deterministically ordered result list and formatted document.

pub mod merge;
pub mod search;

pub use merge::format_results;
pub use search::{orchestrate_search, orchestrate_search_with_history, settle_outcomes};
