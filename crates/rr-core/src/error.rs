use thiserror::Error;

use crate::config::ConfigError;
use crate::matching::weights::WeightVector;
use crate::store::StorageError;
use crate::{CandidateId, JobId};

/// Malformed features. Per-candidate variants become skip reasons inside a
/// ranking run; job-level variants abort the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInput {
    #[error("candidate {candidate_id}: years of experience must be a non-negative number, got {value}")]
    InvalidYearsOfExperience { candidate_id: CandidateId, value: f64 },
    #[error("{owner}: {embedding} embedding dimension {actual} does not match job dimension {expected}")]
    EmbeddingDimensionMismatch {
        owner: String,
        embedding: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{owner}: embedding contains non-finite values")]
    NonFiniteEmbedding { owner: String },
    #[error("job {job_id} has no required or preferred skills to match against")]
    EmptyJobSkills { job_id: JobId },
    #[error("job {job_id} has no {embedding} embedding")]
    MissingJobEmbedding {
        job_id: JobId,
        embedding: &'static str,
    },
    #[error("job {job_id}: invalid experience range min={min_years} max={max_years:?}")]
    InvalidExperienceRange {
        job_id: JobId,
        min_years: f64,
        max_years: Option<f64>,
    },
    #[error("job {job_id}: initial weights rejected: {reason}")]
    InvalidWeights { job_id: JobId, reason: String },
    #[error("duplicate candidate id in batch: {candidate_id}")]
    DuplicateCandidate { candidate_id: CandidateId },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
    #[error("unknown job: {0}")]
    UnknownJob(JobId),
    #[error("job {job_id} has no ranking run to attach feedback to")]
    NoRankingForJob { job_id: JobId },
    #[error("candidate {candidate_id} was not part of the latest ranking for job {job_id}")]
    CandidateNotRanked {
        job_id: JobId,
        candidate_id: CandidateId,
    },
    #[error("no bias report available for job {0}")]
    NoBiasReport(JobId),
    #[error("weight invariant violated for job {job_id}: {vector:?} ({reason})")]
    WeightInvariantViolation {
        job_id: JobId,
        vector: WeightVector,
        reason: String,
    },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("job state lock poisoned: {0}")]
    LockPoisoned(JobId),
}

impl EngineError {
    /// Faults that must never be swallowed by a caller retry loop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::WeightInvariantViolation { .. } | EngineError::LockPoisoned(_)
        )
    }
}
