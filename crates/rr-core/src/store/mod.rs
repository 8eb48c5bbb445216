//! Persistence seam for the engine's own decisions: weight vectors, weight
//! history, feedback, and bias reports. Features are never stored here.
//!
//! Implementations must make every method atomic per job. The engine
//! serializes writes for a job behind its per-job lock. The one multi-write
//! step, finishing an adaptation cycle, goes through
//! [`RankingStore::commit_adaptation`].

mod memory;

use thiserror::Error;

pub use memory::{JobSnapshot, MemoryStore, StoreSnapshot};

use crate::bias::BiasReport;
use crate::feedback::{FeedbackRecord, WeightHistoryEntry};
use crate::matching::weights::WeightVector;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("adaptation cursor for job {job_id} would move to {requested}, only {available} feedback records exist")]
    CursorOutOfRange {
        job_id: String,
        requested: usize,
        available: usize,
    },
    #[error("stored state for job {job_id} is corrupt: {reason}")]
    Corrupt { job_id: String, reason: String },
}

pub trait RankingStore: Send + Sync {
    fn load_weight_vector(&self, job_id: &str) -> Result<Option<WeightVector>, StorageError>;

    fn save_weight_vector(&self, job_id: &str, vector: WeightVector) -> Result<(), StorageError>;

    fn append_weight_history(&self, entry: &WeightHistoryEntry) -> Result<(), StorageError>;

    /// Oldest first.
    fn load_weight_history(&self, job_id: &str) -> Result<Vec<WeightHistoryEntry>, StorageError>;

    fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), StorageError>;

    /// Every record for the job, oldest first.
    fn load_feedback(&self, job_id: &str) -> Result<Vec<FeedbackRecord>, StorageError>;

    /// Records appended after the last completed adaptation cycle, oldest first.
    fn load_feedback_since_last_adaptation(
        &self,
        job_id: &str,
    ) -> Result<Vec<FeedbackRecord>, StorageError>;

    /// Advances the since-last-adaptation cursor by `consumed` records.
    /// Called for every completed cycle, one-sided batches included.
    fn mark_adaptation_cycle(&self, job_id: &str, consumed: usize) -> Result<(), StorageError>;

    /// Finishes an adaptation cycle: advances the cursor by `consumed` and,
    /// when the weights moved, saves `entry.new` and appends `entry`.
    ///
    /// A batch must never be applied twice. Backends with transactions
    /// should override this to write all three in one. The default advances
    /// the cursor first, so a failure part way through drops the batch
    /// instead of leaving it pending against weights it already moved.
    fn commit_adaptation(
        &self,
        job_id: &str,
        consumed: usize,
        entry: Option<&WeightHistoryEntry>,
    ) -> Result<(), StorageError> {
        self.mark_adaptation_cycle(job_id, consumed)?;
        if let Some(entry) = entry {
            self.save_weight_vector(job_id, entry.new)?;
            self.append_weight_history(entry)?;
        }
        Ok(())
    }

    fn save_bias_report(&self, report: &BiasReport) -> Result<(), StorageError>;

    /// Most recent report for the job.
    fn load_bias_report(&self, job_id: &str) -> Result<Option<BiasReport>, StorageError>;
}
