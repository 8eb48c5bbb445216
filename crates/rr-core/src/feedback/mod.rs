//! Recruiter feedback and the per-job adaptation cycle.
//!
//! Feedback is append-only. Every `feedback_threshold` new records for a job
//! form a batch; the batch is handed to [`adapter::WeightAdapter`] and then
//! consumed whether or not the weights moved.

pub mod adapter;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::matching::scoring::ScoreBreakdown;
use crate::matching::weights::WeightVector;
use crate::{CandidateId, JobId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Decision {
    Accept,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    pub decision: Decision,
    /// Breakdown shown to the recruiter, captured from the ranking run.
    pub breakdown: ScoreBreakdown,
    pub run_id: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightHistoryEntry {
    pub job_id: JobId,
    pub timestamp: DateTime<Utc>,
    pub previous: WeightVector,
    pub new: WeightVector,
    /// Feedback records consumed by the cycle that produced this entry.
    pub feedback_count: usize,
    pub trigger: String,
}

/// Result of `RankingEngine::submit_feedback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeedbackOutcome {
    /// Recorded; not enough new records for an adaptation cycle yet.
    Pending { pending: usize, threshold: usize },
    /// Batch consumed without a weight change: it held only accepts or only rejects.
    SkippedOneSided { consumed: usize },
    Adapted { entry: WeightHistoryEntry },
}

impl FeedbackOutcome {
    pub fn adapted(&self) -> bool {
        matches!(self, FeedbackOutcome::Adapted { .. })
    }
}

/// Decision counts over the latest decision per candidate; a recruiter
/// changing their mind replaces the earlier decision instead of adding to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackStats {
    /// Candidates with at least one decision.
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// `None` until the first record arrives.
    pub acceptance_rate: Option<f64>,
    /// Every record appended, repeats included.
    pub records: usize,
    /// Cycles that moved the weights; one-sided batches are not counted.
    pub adaptations: usize,
    /// Records waiting for the next cycle.
    pub pending: usize,
}

impl FeedbackStats {
    /// `records` must be oldest first, as the store returns them.
    pub fn from_records(records: &[FeedbackRecord], adaptations: usize, pending: usize) -> Self {
        let latest: HashMap<&str, Decision> = records
            .iter()
            .map(|r| (r.candidate_id.as_str(), r.decision))
            .collect();
        let accepted = latest.values().filter(|d| **d == Decision::Accept).count();
        let total = latest.len();
        Self {
            total,
            accepted,
            rejected: total - accepted,
            acceptance_rate: (total > 0).then(|| accepted as f64 / total as f64),
            records: records.len(),
            adaptations,
            pending,
        }
    }
}

/// Adaptation state of one job.
///
/// `Idle { pending }` moves to `BatchReady` once `pending` reaches the
/// threshold. A ready batch resolves to `Adapted` or `SkippedOneSided`, and
/// both return to `Idle { pending: 0 }` once the cursor is advanced.
#[derive(Debug, Clone, PartialEq)]
pub enum AdaptationPhase {
    Idle { pending: usize },
    BatchReady { size: usize },
    Adapted { entry: WeightHistoryEntry },
    SkippedOneSided { consumed: usize },
}

impl Default for AdaptationPhase {
    fn default() -> Self {
        AdaptationPhase::Idle { pending: 0 }
    }
}

impl AdaptationPhase {
    /// Feedback arrived and the store now holds `pending` unconsumed records.
    pub fn record(self, pending: usize, threshold: usize) -> Self {
        match self {
            AdaptationPhase::Idle { .. } if pending >= threshold => {
                AdaptationPhase::BatchReady { size: pending }
            }
            AdaptationPhase::Idle { .. } => AdaptationPhase::Idle { pending },
            other => other,
        }
    }

    /// Attach the adapter's verdict to a ready batch.
    pub fn resolve(self, entry: Option<WeightHistoryEntry>) -> Self {
        match (self, entry) {
            (AdaptationPhase::BatchReady { .. }, Some(entry)) => AdaptationPhase::Adapted { entry },
            (AdaptationPhase::BatchReady { size }, None) => {
                AdaptationPhase::SkippedOneSided { consumed: size }
            }
            (other, _) => other,
        }
    }

    /// The batch has been consumed in the store.
    pub fn settle(self) -> Self {
        match self {
            AdaptationPhase::Adapted { .. } | AdaptationPhase::SkippedOneSided { .. } => {
                AdaptationPhase::Idle { pending: 0 }
            }
            other => other,
        }
    }

    pub fn outcome(&self, threshold: usize) -> FeedbackOutcome {
        match self {
            AdaptationPhase::Idle { pending } => FeedbackOutcome::Pending {
                pending: *pending,
                threshold,
            },
            AdaptationPhase::BatchReady { size } => FeedbackOutcome::Pending {
                pending: *size,
                threshold,
            },
            AdaptationPhase::Adapted { entry } => FeedbackOutcome::Adapted {
                entry: entry.clone(),
            },
            AdaptationPhase::SkippedOneSided { consumed } => FeedbackOutcome::SkippedOneSided {
                consumed: *consumed,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> WeightHistoryEntry {
        WeightHistoryEntry {
            job_id: "job-1".into(),
            timestamp: Utc::now(),
            previous: WeightVector::default(),
            new: WeightVector::new(0.42, 0.29, 0.29),
            feedback_count: 5,
            trigger: adapter::TRIGGER_FEEDBACK_BATCH.into(),
        }
    }

    #[test]
    fn idle_accumulates_until_threshold() {
        let phase = AdaptationPhase::default().record(4, 5);
        assert_eq!(phase, AdaptationPhase::Idle { pending: 4 });

        let phase = phase.record(5, 5);
        assert_eq!(phase, AdaptationPhase::BatchReady { size: 5 });
    }

    #[test]
    fn one_sided_batch_returns_to_idle() {
        let phase = AdaptationPhase::BatchReady { size: 5 }.resolve(None);
        assert_eq!(
            phase.outcome(5),
            FeedbackOutcome::SkippedOneSided { consumed: 5 }
        );
        assert_eq!(phase.settle(), AdaptationPhase::Idle { pending: 0 });
    }

    #[test]
    fn adapted_batch_reports_entry() {
        let phase = AdaptationPhase::BatchReady { size: 5 }.resolve(Some(entry()));
        assert!(phase.outcome(5).adapted());
        assert_eq!(phase.settle(), AdaptationPhase::Idle { pending: 0 });
    }

    #[test]
    fn idle_cannot_be_resolved() {
        let phase = AdaptationPhase::Idle { pending: 2 }.resolve(Some(entry()));
        assert_eq!(phase, AdaptationPhase::Idle { pending: 2 });
    }

    #[test]
    fn stats_count_latest_decision_per_candidate() {
        let record = |candidate: &str, decision| FeedbackRecord {
            job_id: "job-1".into(),
            candidate_id: candidate.into(),
            decision,
            breakdown: ScoreBreakdown {
                skill_score: 0.0,
                experience_score: 0.0,
                relevance_score: 0.0,
                total_score: 0.0,
            },
            run_id: "r".into(),
            notes: None,
            recorded_at: Utc::now(),
        };
        let records = vec![
            record("a", Decision::Accept),
            record("b", Decision::Reject),
            record("c", Decision::Accept),
            record("d", Decision::Accept),
        ];

        let stats = FeedbackStats::from_records(&records, 0, 4);
        assert_eq!(stats.accepted, 3);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.acceptance_rate, Some(0.75));
        assert_eq!(stats.records, 4);
        assert_eq!(FeedbackStats::from_records(&[], 0, 0).acceptance_rate, None);
    }

    #[test]
    fn changed_mind_replaces_earlier_decision() {
        let record = |candidate: &str, decision| FeedbackRecord {
            job_id: "job-1".into(),
            candidate_id: candidate.into(),
            decision,
            breakdown: ScoreBreakdown {
                skill_score: 0.5,
                experience_score: 0.5,
                relevance_score: 0.5,
                total_score: 0.5,
            },
            run_id: "r".into(),
            notes: None,
            recorded_at: Utc::now(),
        };
        let records = vec![
            record("a", Decision::Accept),
            record("a", Decision::Accept),
            record("b", Decision::Accept),
            record("b", Decision::Reject),
        ];

        let stats = FeedbackStats::from_records(&records, 0, 4);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.acceptance_rate, Some(0.5));
        assert_eq!(stats.records, 4);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(FeedbackOutcome::Pending {
            pending: 3,
            threshold: 5,
        })
        .unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["pending"], 3);
    }
}
