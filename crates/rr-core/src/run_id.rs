//! Identifiers for ranking runs.
//!
//! Every call to `RankingEngine::rank` gets a fresh ULID. Feedback records and
//! bias reports carry the run id they refer to, so an audit can tie a
//! recruiter decision back to the exact breakdown that was on screen.
//! The process id groups all runs made by one engine process in the logs.

use once_cell::sync::Lazy;
use ulid::Ulid;

static PROCESS_RUN_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

/// Process-level id, generated once at first access.
#[inline]
pub fn process() -> &'static str {
    &PROCESS_RUN_ID
}

/// Fresh, time-ordered id for a single ranking run.
#[inline]
pub fn generate() -> String {
    Ulid::new().to_string()
}
