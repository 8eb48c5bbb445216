use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{
    scoring::{score_candidate, sort_ranked, CandidateScore, JobContext, ScoreBreakdown},
    weights::WeightVector,
};
use crate::{
    bias::{BiasAnalyzer, BiasReport, BiasThresholds, RankingContext},
    config::EngineConfig,
    error::{EngineError, InvalidInput},
    explain::explain,
    feedback::{
        adapter::WeightAdapter, AdaptationPhase, Decision, FeedbackOutcome, FeedbackRecord,
        FeedbackStats, WeightHistoryEntry,
    },
    run_id,
    store::{MemoryStore, RankingStore},
    Candidate, CandidateId, JobId, JobPosting,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// 1-based.
    pub rank: usize,
    pub candidate_id: CandidateId,
    pub score_breakdown: ScoreBreakdown,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub years_experience: Option<f64>,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCandidate {
    pub candidate_id: CandidateId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRun {
    pub run_id: String,
    pub job_id: JobId,
    pub ranked_at: DateTime<Utc>,
    pub weights: WeightVector,
    pub ranked: Vec<RankedCandidate>,
    /// Input order.
    pub skipped: Vec<SkippedCandidate>,
}

impl RankingRun {
    pub fn find(&self, candidate_id: &str) -> Option<&RankedCandidate> {
        self.ranked.iter().find(|c| c.candidate_id == candidate_id)
    }
}

/// Mutable per-job state. Guarded by its own mutex so jobs never contend.
#[derive(Debug, Default)]
struct JobSlot {
    last_run: Option<RankingRun>,
    bias_report: Option<BiasReport>,
    phase: AdaptationPhase,
}

/// Coordinates scoring, ranking, bias analysis, and weight adaptation.
pub struct RankingEngine {
    config: EngineConfig,
    store: Arc<dyn RankingStore>,
    adapter: WeightAdapter,
    bias: BiasAnalyzer,
    jobs: DashMap<JobId, Arc<JobPosting>>,
    slots: DashMap<JobId, Arc<Mutex<JobSlot>>>,
}

impl RankingEngine {
    pub fn new(config: EngineConfig, store: Arc<dyn RankingStore>) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            adapter: WeightAdapter::new(config.learning_rate),
            bias: BiasAnalyzer::new(BiasThresholds::from(&config)),
            config,
            store,
            jobs: DashMap::new(),
            slots: DashMap::new(),
        })
    }

    pub fn with_memory_store(config: EngineConfig) -> Result<Self, EngineError> {
        Self::new(config, Arc::new(MemoryStore::new()))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RankingStore> {
        &self.store
    }

    /// Makes a job's features known. The job's weight vector seeds the store
    /// only when the store has none; learned weights survive re-registration.
    #[instrument(skip_all, fields(job_id = %job.id))]
    pub fn register_job(&self, job: JobPosting) -> Result<WeightVector, EngineError> {
        job.validate()?;

        let weights = match self.store.load_weight_vector(&job.id)? {
            Some(stored) => stored,
            None => {
                self.store.save_weight_vector(&job.id, job.weights)?;
                job.weights
            }
        };

        let replaced = self
            .jobs
            .insert(job.id.clone(), Arc::new(job))
            .is_some();
        info!(replaced, ?weights, "job registered");
        Ok(weights)
    }

    fn job(&self, job_id: &str) -> Result<Arc<JobPosting>, EngineError> {
        self.jobs
            .get(job_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EngineError::UnknownJob(job_id.to_string()))
    }

    fn slot(&self, job_id: &str) -> Arc<Mutex<JobSlot>> {
        Arc::clone(self.slots.entry(job_id.to_string()).or_default().value())
    }

    fn lock<'a>(slot: &'a Mutex<JobSlot>, job_id: &str) -> Result<MutexGuard<'a, JobSlot>, EngineError> {
        slot.lock()
            .map_err(|_| EngineError::LockPoisoned(job_id.to_string()))
    }

    fn load_weights(&self, job: &JobPosting) -> Result<WeightVector, EngineError> {
        Ok(self.store.load_weight_vector(&job.id)?.unwrap_or(job.weights))
    }

    pub fn current_weights(&self, job_id: &str) -> Result<WeightVector, EngineError> {
        let job = self.job(job_id)?;
        self.load_weights(&job)
    }

    /// Scores every candidate against the job with its current weights.
    ///
    /// Candidates with malformed features are reported in `skipped` and do
    /// not stop the run. The returned run becomes the reference for feedback
    /// and its bias report is cached and persisted.
    #[instrument(skip_all, fields(job_id = %job_id, candidates = candidates.len()))]
    pub fn rank(&self, job_id: &str, candidates: &[Candidate]) -> Result<RankingRun, EngineError> {
        let job = self.job(job_id)?;
        let weights = self.load_weights(&job)?;
        let ctx = JobContext::new(&job, weights);

        let mut seen = HashSet::with_capacity(candidates.len());
        let mut unique = Vec::with_capacity(candidates.len());
        let mut skipped: Vec<(usize, SkippedCandidate)> = Vec::new();
        for (index, candidate) in candidates.iter().enumerate() {
            if seen.insert(candidate.id.as_str()) {
                unique.push((index, candidate));
            } else {
                let reason = InvalidInput::DuplicateCandidate {
                    candidate_id: candidate.id.clone(),
                };
                skipped.push((index, skip(&candidate.id, &reason)));
            }
        }

        let results: Vec<(usize, Result<CandidateScore, InvalidInput>)> = unique
            .par_iter()
            .map(|(index, candidate)| (*index, score_candidate(candidate, &ctx)))
            .collect();

        let mut scored = Vec::with_capacity(results.len());
        for (index, result) in results {
            match result {
                Ok(score) => scored.push(score),
                Err(reason) => {
                    let candidate_id = &candidates[index].id;
                    warn!(candidate_id = %candidate_id, %reason, "candidate skipped");
                    skipped.push((index, skip(candidate_id, &reason)));
                }
            }
        }
        skipped.sort_by_key(|(index, _)| *index);
        sort_ranked(&mut scored);

        let run_id = run_id::generate();
        let ranked_at = Utc::now();
        let report = self.bias.analyze(
            RankingContext {
                job_id,
                run_id: &run_id,
                ranked_at,
                weights: &weights,
            },
            &scored,
        );

        let ranked = scored
            .into_iter()
            .enumerate()
            .map(|(position, score)| {
                let rank = position + 1;
                RankedCandidate {
                    rank,
                    explanation: explain(rank, &score, &ctx.experience),
                    candidate_id: score.candidate_id,
                    score_breakdown: score.breakdown,
                    matched_skills: score.matched_skills,
                    missing_skills: score.missing_skills,
                    years_experience: score.years_experience,
                }
            })
            .collect();

        let run = RankingRun {
            run_id,
            job_id: job_id.to_string(),
            ranked_at,
            weights,
            ranked,
            skipped: skipped.into_iter().map(|(_, s)| s).collect(),
        };

        // cache and store are written under the job lock; an older run never replaces a newer one
        let slot = self.slot(job_id);
        let mut state = Self::lock(&slot, job_id)?;
        let superseded = state
            .last_run
            .as_ref()
            .is_some_and(|last| last.ranked_at > run.ranked_at);
        if superseded {
            debug!(run_id = %run.run_id, "newer run already published, not caching");
        } else {
            self.store.save_bias_report(&report)?;
            state.last_run = Some(run.clone());
            state.bias_report = Some(report);
        }
        drop(state);

        info!(
            run_id = %run.run_id,
            process_run_id = run_id::process(),
            ranked = run.ranked.len(),
            skipped = run.skipped.len(),
            top_score = run.ranked.first().map(|c| c.score_breakdown.total_score),
            "ranking run complete"
        );
        Ok(run)
    }

    /// Records a recruiter decision against the job's latest ranking run and
    /// runs an adaptation cycle once enough new records have accumulated.
    #[instrument(skip(self, decision, notes), fields(decision = decision.as_ref()))]
    pub fn submit_feedback(
        &self,
        job_id: &str,
        candidate_id: &str,
        decision: Decision,
        notes: Option<String>,
    ) -> Result<FeedbackOutcome, EngineError> {
        let job = self.job(job_id)?;
        let slot = self.slot(job_id);
        let mut state = Self::lock(&slot, job_id)?;

        let run = state
            .last_run
            .as_ref()
            .ok_or_else(|| EngineError::NoRankingForJob {
                job_id: job_id.to_string(),
            })?;
        let entry = run
            .find(candidate_id)
            .ok_or_else(|| EngineError::CandidateNotRanked {
                job_id: job_id.to_string(),
                candidate_id: candidate_id.to_string(),
            })?;

        let record = FeedbackRecord {
            job_id: job_id.to_string(),
            candidate_id: candidate_id.to_string(),
            decision,
            breakdown: entry.score_breakdown,
            run_id: run.run_id.clone(),
            notes,
            recorded_at: Utc::now(),
        };
        self.store.append_feedback(&record)?;

        let batch = self.store.load_feedback_since_last_adaptation(job_id)?;
        let threshold = self.config.feedback_threshold;
        let phase = std::mem::take(&mut state.phase).record(batch.len(), threshold);

        let AdaptationPhase::BatchReady { size } = phase else {
            let outcome = phase.outcome(threshold);
            state.phase = phase;
            return Ok(outcome);
        };

        let resolved = match self.run_cycle(&job, &batch, size) {
            Ok(entry) => phase.resolve(entry),
            Err(err) => {
                // the store's cursor decides whether the next submission retries the batch
                warn!(job_id = %job_id, batch = size, error = %err, "adaptation cycle failed");
                state.phase = AdaptationPhase::default();
                return Err(err);
            }
        };

        let outcome = resolved.outcome(threshold);
        state.phase = resolved.settle();
        Ok(outcome)
    }

    fn run_cycle(
        &self,
        job: &JobPosting,
        batch: &[FeedbackRecord],
        size: usize,
    ) -> Result<Option<WeightHistoryEntry>, EngineError> {
        let current = self.load_weights(job)?;
        let entry = self.adapter.adapt(&job.id, current, batch)?;

        self.store.commit_adaptation(&job.id, size, entry.as_ref())?;
        if let Some(entry) = &entry {
            info!(
                job_id = %job.id,
                previous = ?entry.previous,
                new = ?entry.new,
                feedback_count = entry.feedback_count,
                "weights adapted"
            );
        }
        Ok(entry)
    }

    /// Report for the latest ranking run, from cache or the store.
    pub fn get_bias_report(&self, job_id: &str) -> Result<BiasReport, EngineError> {
        self.job(job_id)?;

        let slot = self.slot(job_id);
        if let Some(report) = Self::lock(&slot, job_id)?.bias_report.clone() {
            return Ok(report);
        }

        self.store
            .load_bias_report(job_id)?
            .ok_or_else(|| EngineError::NoBiasReport(job_id.to_string()))
    }

    pub fn get_weight_history(&self, job_id: &str) -> Result<Vec<WeightHistoryEntry>, EngineError> {
        self.job(job_id)?;
        Ok(self.store.load_weight_history(job_id)?)
    }

    pub fn feedback_stats(&self, job_id: &str) -> Result<FeedbackStats, EngineError> {
        self.job(job_id)?;
        let records = self.store.load_feedback(job_id)?;
        let pending = self.store.load_feedback_since_last_adaptation(job_id)?.len();
        let adaptations = self.store.load_weight_history(job_id)?.len();
        Ok(FeedbackStats::from_records(&records, adaptations, pending))
    }

    /// Latest ranking run for the job, if any.
    pub fn last_run(&self, job_id: &str) -> Result<Option<RankingRun>, EngineError> {
        self.job(job_id)?;
        let slot = self.slot(job_id);
        let state = Self::lock(&slot, job_id)?;
        Ok(state.last_run.clone())
    }
}

fn skip(candidate_id: &str, reason: &InvalidInput) -> SkippedCandidate {
    SkippedCandidate {
        candidate_id: candidate_id.to_string(),
        reason: reason.to_string(),
    }
}
