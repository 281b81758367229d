//! Error tracking.
//!
//! Every unit owns one [`ErrorHistory`]: a bounded, time-pruned log of
//! [`ErrorRecord`]s that the isolation policy reads and the dashboard writes.
//!
//! ```text
//! update fails ──► ErrorHistory::record ──► IsolationPolicy::evaluate
//! update ok    ──► ErrorHistory::mark_recovered   (streak reset)
//! sweep        ──► ErrorHistory::prune(retention)
//! recovered    ──► ErrorHistory::clear
//! ```

mod history;

pub use history::{ErrorHistory, ErrorRecord, HISTORY_CAPACITY};
