use chrono::Utc;
use tracing::{debug, info, warn};

use super::{Decision, FeedbackRecord, WeightHistoryEntry};
use crate::error::EngineError;
use crate::matching::weights::{Factor, WeightVector};

pub const TRIGGER_FEEDBACK_BATCH: &str = "feedback_batch";

/// Turns a batch of recruiter decisions into a new bounded weight vector.
#[derive(Debug, Clone, Copy)]
pub struct WeightAdapter {
    learning_rate: f64,
}

impl WeightAdapter {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }

    /// Per-factor `mean(accepted) − mean(rejected)`, in [`Factor::ALL`] order.
    /// `None` when the batch holds only one kind of decision.
    pub fn signals(batch: &[FeedbackRecord]) -> Option<[f64; 3]> {
        let (accepted, rejected): (Vec<_>, Vec<_>) = batch
            .iter()
            .partition(|record| record.decision == Decision::Accept);
        if accepted.is_empty() || rejected.is_empty() {
            return None;
        }

        let mean = |records: &[&FeedbackRecord], factor: Factor| {
            records
                .iter()
                .map(|r| r.breakdown.factor(factor))
                .sum::<f64>()
                / records.len() as f64
        };

        Some(Factor::ALL.map(|factor| mean(&accepted, factor) - mean(&rejected, factor)))
    }

    pub fn propose(&self, current: &WeightVector, signals: [f64; 3]) -> WeightVector {
        let mut raw = current.as_array();
        for (weight, signal) in raw.iter_mut().zip(signals) {
            *weight += self.learning_rate * signal;
        }
        WeightVector::clamp_and_renormalize(raw)
    }

    /// Runs one cycle. `Ok(None)` means the batch was one-sided and the
    /// weights stay as they are. Nothing is persisted here.
    pub fn adapt(
        &self,
        job_id: &str,
        current: WeightVector,
        batch: &[FeedbackRecord],
    ) -> Result<Option<WeightHistoryEntry>, EngineError> {
        let Some(signals) = Self::signals(batch) else {
            info!(
                job_id,
                batch = batch.len(),
                "one-sided feedback batch; weights unchanged"
            );
            return Ok(None);
        };

        let updated = self.propose(&current, signals);
        if let Err(reason) = updated.check_invariant() {
            warn!(job_id, ?updated, %reason, "adapted weights violate invariant");
            return Err(EngineError::WeightInvariantViolation {
                job_id: job_id.to_string(),
                vector: updated,
                reason,
            });
        }

        debug!(
            job_id,
            skill_signal = signals[0],
            experience_signal = signals[1],
            relevance_signal = signals[2],
            "feedback signals computed"
        );

        Ok(Some(WeightHistoryEntry {
            job_id: job_id.to_string(),
            timestamp: Utc::now(),
            previous: current,
            new: updated,
            feedback_count: batch.len(),
            trigger: TRIGGER_FEEDBACK_BATCH.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::scoring::ScoreBreakdown;

    fn record(decision: Decision, skill: f64, experience: f64, relevance: f64) -> FeedbackRecord {
        FeedbackRecord {
            job_id: "job-1".into(),
            candidate_id: "c".into(),
            decision,
            breakdown: ScoreBreakdown {
                skill_score: skill,
                experience_score: experience,
                relevance_score: relevance,
                total_score: 0.5,
            },
            run_id: "run".into(),
            notes: None,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn signals_are_mean_differences() {
        let batch = vec![
            record(Decision::Accept, 0.9, 0.4, 0.5),
            record(Decision::Accept, 0.7, 0.6, 0.5),
            record(Decision::Reject, 0.2, 0.5, 0.7),
        ];
        let signals = WeightAdapter::signals(&batch).unwrap();
        assert!((signals[0] - 0.6).abs() < 1e-12);
        assert!(signals[1].abs() < 1e-12);
        assert!((signals[2] + 0.2).abs() < 1e-12);
    }

    #[test]
    fn one_sided_batch_has_no_signal() {
        let batch = vec![
            record(Decision::Accept, 0.9, 0.4, 0.5),
            record(Decision::Accept, 0.7, 0.6, 0.5),
        ];
        assert!(WeightAdapter::signals(&batch).is_none());

        let adapter = WeightAdapter::new(0.05);
        assert!(adapter
            .adapt("job-1", WeightVector::default(), &batch)
            .unwrap()
            .is_none());
    }

    #[test]
    fn accepted_skill_advantage_raises_skill_weight() {
        let batch = vec![
            record(Decision::Accept, 0.9, 0.5, 0.5),
            record(Decision::Accept, 0.9, 0.5, 0.5),
            record(Decision::Reject, 0.3, 0.5, 0.5),
            record(Decision::Reject, 0.3, 0.5, 0.5),
            record(Decision::Reject, 0.3, 0.5, 0.5),
        ];
        let adapter = WeightAdapter::new(0.05);
        let entry = adapter
            .adapt("job-1", WeightVector::default(), &batch)
            .unwrap()
            .unwrap();

        // raw [0.43, 0.30, 0.30] divided by 1.03
        assert!((entry.new.skill - 0.43 / 1.03).abs() < 1e-12);
        assert!(entry.new.experience < 0.30);
        assert!(entry.new.check_invariant().is_ok());
        assert_eq!(entry.previous, WeightVector::default());
        assert_eq!(entry.feedback_count, 5);
        assert_eq!(entry.trigger, TRIGGER_FEEDBACK_BATCH);
    }

    #[test]
    fn non_finite_breakdown_is_a_fatal_violation() {
        let batch = vec![
            record(Decision::Accept, f64::NAN, 0.5, 0.5),
            record(Decision::Reject, 0.3, 0.5, 0.5),
        ];
        let err = WeightAdapter::new(0.05)
            .adapt("job-1", WeightVector::default(), &batch)
            .unwrap_err();
        assert!(matches!(err, EngineError::WeightInvariantViolation { .. }));
        assert!(err.is_fatal());
    }
}
