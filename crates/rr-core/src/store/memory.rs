use std::collections::BTreeMap;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::{RankingStore, StorageError};
use crate::bias::BiasReport;
use crate::feedback::{FeedbackRecord, WeightHistoryEntry};
use crate::matching::weights::WeightVector;
use crate::JobId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    #[serde(default)]
    pub weights: Option<WeightVector>,
    #[serde(default)]
    pub weight_history: Vec<WeightHistoryEntry>,
    #[serde(default)]
    pub feedback: Vec<FeedbackRecord>,
    /// Index of the first feedback record not yet consumed by an adaptation cycle.
    #[serde(default)]
    pub adaptation_cursor: usize,
    #[serde(default)]
    pub bias_report: Option<BiasReport>,
}

/// Serializable image of a [`MemoryStore`], keyed by job id in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub jobs: BTreeMap<JobId, JobSnapshot>,
}

/// In-process store backed by a sharded map. Used by tests and the CLI.
#[derive(Debug, Default)]
pub struct MemoryStore {
    jobs: DashMap<JobId, JobSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StorageError> {
        let jobs = DashMap::new();
        for (job_id, job) in snapshot.jobs {
            if job.adaptation_cursor > job.feedback.len() {
                return Err(StorageError::Corrupt {
                    job_id,
                    reason: format!(
                        "adaptation cursor {} past {} feedback records",
                        job.adaptation_cursor,
                        job.feedback.len()
                    ),
                });
            }
            jobs.insert(job_id, job);
        }
        Ok(Self { jobs })
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            jobs: self
                .jobs
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
        }
    }
}

impl RankingStore for MemoryStore {
    fn load_weight_vector(&self, job_id: &str) -> Result<Option<WeightVector>, StorageError> {
        Ok(self.jobs.get(job_id).and_then(|job| job.weights))
    }

    fn save_weight_vector(&self, job_id: &str, vector: WeightVector) -> Result<(), StorageError> {
        self.jobs.entry(job_id.to_string()).or_default().weights = Some(vector);
        Ok(())
    }

    fn append_weight_history(&self, entry: &WeightHistoryEntry) -> Result<(), StorageError> {
        self.jobs
            .entry(entry.job_id.clone())
            .or_default()
            .weight_history
            .push(entry.clone());
        Ok(())
    }

    fn load_weight_history(&self, job_id: &str) -> Result<Vec<WeightHistoryEntry>, StorageError> {
        Ok(self
            .jobs
            .get(job_id)
            .map(|job| job.weight_history.clone())
            .unwrap_or_default())
    }

    fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), StorageError> {
        self.jobs
            .entry(record.job_id.clone())
            .or_default()
            .feedback
            .push(record.clone());
        Ok(())
    }

    fn load_feedback(&self, job_id: &str) -> Result<Vec<FeedbackRecord>, StorageError> {
        Ok(self
            .jobs
            .get(job_id)
            .map(|job| job.feedback.clone())
            .unwrap_or_default())
    }

    fn load_feedback_since_last_adaptation(
        &self,
        job_id: &str,
    ) -> Result<Vec<FeedbackRecord>, StorageError> {
        let Some(job) = self.jobs.get(job_id) else {
            return Ok(Vec::new());
        };
        Ok(job
            .feedback
            .get(job.adaptation_cursor..)
            .map(<[FeedbackRecord]>::to_vec)
            .unwrap_or_default())
    }

    fn mark_adaptation_cycle(&self, job_id: &str, consumed: usize) -> Result<(), StorageError> {
        let mut job = self.jobs.entry(job_id.to_string()).or_default();
        let requested = job.adaptation_cursor + consumed;
        if requested > job.feedback.len() {
            return Err(StorageError::CursorOutOfRange {
                job_id: job_id.to_string(),
                requested,
                available: job.feedback.len(),
            });
        }
        job.adaptation_cursor = requested;
        Ok(())
    }

    fn commit_adaptation(
        &self,
        job_id: &str,
        consumed: usize,
        entry: Option<&WeightHistoryEntry>,
    ) -> Result<(), StorageError> {
        // one shard lock for cursor, weights, and history
        let mut job = self.jobs.entry(job_id.to_string()).or_default();
        let requested = job.adaptation_cursor + consumed;
        if requested > job.feedback.len() {
            return Err(StorageError::CursorOutOfRange {
                job_id: job_id.to_string(),
                requested,
                available: job.feedback.len(),
            });
        }
        job.adaptation_cursor = requested;
        if let Some(entry) = entry {
            job.weights = Some(entry.new);
            job.weight_history.push(entry.clone());
        }
        Ok(())
    }

    fn save_bias_report(&self, report: &BiasReport) -> Result<(), StorageError> {
        self.jobs.entry(report.job_id.clone()).or_default().bias_report = Some(report.clone());
        Ok(())
    }

    fn load_bias_report(&self, job_id: &str) -> Result<Option<BiasReport>, StorageError> {
        Ok(self.jobs.get(job_id).and_then(|job| job.bias_report.clone()))
    }
}
