//! Correlational audit of a finished ranking.
//!
//! Reports how strongly the ranking tracks years of experience and raw
//! keyword overlap, and how much of the average total each factor carries.
//! The analyzer only reads a ranking; nothing here feeds back into scoring.

pub mod spearman;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::AsRefStr;
use tracing::info;

use crate::config::EngineConfig;
use crate::matching::scoring::CandidateScore;
use crate::matching::weights::{Factor, WeightVector};
use crate::{CandidateId, JobId};

pub const DISCLAIMER: &str = "Bias signals in this report are rank correlations and score-share ratios. \
They are correlational, not causal: a flagged signal may reflect legitimate job requirements, \
and a report without flags is not a fairness certification. \
Scores can inherit bias present in job descriptions and historical hiring decisions. \
Every hiring decision requires human review.";

/// Candidates examined for the experience-skew affected list.
const SKEW_TOP_N: usize = 3;
/// A top candidate is affected when its experience exceeds this multiple of the mean.
const SKEW_YOE_MULTIPLE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SignalStatus {
    Computed,
    ZeroVariance,
    InsufficientSample,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSignal {
    /// Spearman ρ in [-1, 1]; `None` when the statistic is undefined.
    pub value: Option<f64>,
    pub status: SignalStatus,
}

impl CorrelationSignal {
    pub fn compute(x: &[f64], y: &[f64], min_sample: usize) -> Self {
        if x.len() < min_sample {
            return Self {
                value: None,
                status: SignalStatus::InsufficientSample,
            };
        }
        match spearman::spearman(x, y) {
            Some(rho) => Self {
                value: Some(rho),
                status: SignalStatus::Computed,
            },
            None => Self {
                value: None,
                status: SignalStatus::ZeroVariance,
            },
        }
    }

    pub fn magnitude(&self) -> Option<f64> {
        self.value.map(f64::abs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BiasSeverity {
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BiasSignal {
    ExperienceSkew,
    KeywordOverfit,
    FactorDominance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasFlag {
    pub signal: BiasSignal,
    pub severity: BiasSeverity,
    /// Set for factor dominance flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<Factor>,
    /// |ρ| for correlation flags, the share ratio for dominance flags.
    pub value: f64,
    pub description: String,
    pub affected_candidates: Vec<CandidateId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorDominance {
    pub factor: Factor,
    pub weight: f64,
    pub mean_score: f64,
    /// `w × mean(score) / mean(total)`; `None` when the mean total is zero.
    pub ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasReport {
    pub job_id: JobId,
    pub run_id: String,
    pub ranked_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub candidates_analyzed: usize,
    pub experience_skew: CorrelationSignal,
    pub keyword_overfit: CorrelationSignal,
    pub factor_dominance: Vec<FactorDominance>,
    pub flags: Vec<BiasFlag>,
    pub disclaimer: String,
}

impl BiasReport {
    pub fn flags_for(&self, signal: BiasSignal) -> impl Iterator<Item = &BiasFlag> {
        self.flags.iter().filter(move |flag| flag.signal == signal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasThresholds {
    pub experience_skew: f64,
    pub experience_skew_high: f64,
    pub keyword_overfit: f64,
    pub keyword_overfit_high: f64,
    pub dominance: f64,
    pub min_sample: usize,
}

impl From<&EngineConfig> for BiasThresholds {
    fn from(config: &EngineConfig) -> Self {
        Self {
            experience_skew: config.experience_skew_threshold,
            experience_skew_high: config.experience_skew_high,
            keyword_overfit: config.keyword_overfit_threshold,
            keyword_overfit_high: config.keyword_overfit_high,
            dominance: config.dominance_threshold,
            min_sample: config.min_bias_sample,
        }
    }
}

/// Identifies the ranking a report is about.
#[derive(Debug, Clone, Copy)]
pub struct RankingContext<'a> {
    pub job_id: &'a str,
    pub run_id: &'a str,
    pub ranked_at: DateTime<Utc>,
    pub weights: &'a WeightVector,
}

#[derive(Debug, Clone, Copy)]
pub struct BiasAnalyzer {
    thresholds: BiasThresholds,
}

impl BiasAnalyzer {
    pub fn new(thresholds: BiasThresholds) -> Self {
        Self { thresholds }
    }

    /// `ranked` must be in rank order.
    pub fn analyze(&self, ctx: RankingContext<'_>, ranked: &[CandidateScore]) -> BiasReport {
        let totals: Vec<f64> = ranked.iter().map(|c| c.breakdown.total_score).collect();
        let years: Vec<f64> = ranked
            .iter()
            .map(|c| c.years_experience.unwrap_or(0.0))
            .collect();
        let skills: Vec<f64> = ranked.iter().map(|c| c.breakdown.skill_score).collect();

        let experience_skew = CorrelationSignal::compute(&years, &totals, self.thresholds.min_sample);
        let keyword_overfit = CorrelationSignal::compute(&skills, &totals, self.thresholds.min_sample);
        let factor_dominance = factor_dominance(ranked, ctx.weights);

        let mut flags = Vec::new();
        if let Some(flag) = self.experience_skew_flag(&experience_skew, ranked, &years) {
            flags.push(flag);
        }
        if let Some(flag) = self.keyword_overfit_flag(&keyword_overfit) {
            flags.push(flag);
        }
        flags.extend(self.dominance_flags(&factor_dominance));

        info!(
            job_id = ctx.job_id,
            run_id = ctx.run_id,
            candidates = ranked.len(),
            experience_skew = ?experience_skew.value,
            keyword_overfit = ?keyword_overfit.value,
            flags = flags.len(),
            "bias analysis complete"
        );

        BiasReport {
            job_id: ctx.job_id.to_string(),
            run_id: ctx.run_id.to_string(),
            ranked_at: ctx.ranked_at,
            generated_at: Utc::now(),
            candidates_analyzed: ranked.len(),
            experience_skew,
            keyword_overfit,
            factor_dominance,
            flags,
            disclaimer: DISCLAIMER.to_string(),
        }
    }

    fn experience_skew_flag(
        &self,
        signal: &CorrelationSignal,
        ranked: &[CandidateScore],
        years: &[f64],
    ) -> Option<BiasFlag> {
        let rho = signal.magnitude()?;
        if rho <= self.thresholds.experience_skew {
            return None;
        }

        let (severity, description) = if rho > self.thresholds.experience_skew_high {
            (
                BiasSeverity::High,
                format!(
                    "Strong rank correlation ({rho:.2}) between years of experience and total score. \
                     Candidates with fewer years may be ranked down even when their skills fit the role."
                ),
            )
        } else {
            (
                BiasSeverity::Medium,
                format!(
                    "Moderate rank correlation ({rho:.2}) between years of experience and total score. \
                     Check whether the experience range is a real requirement for this role."
                ),
            )
        };

        let mean_years = years.iter().sum::<f64>() / years.len() as f64;
        let affected_candidates = ranked
            .iter()
            .zip(years)
            .take(SKEW_TOP_N)
            .filter(|(_, yoe)| **yoe > mean_years * SKEW_YOE_MULTIPLE)
            .map(|(c, _)| c.candidate_id.clone())
            .collect();

        Some(BiasFlag {
            signal: BiasSignal::ExperienceSkew,
            severity,
            factor: None,
            value: rho,
            description,
            affected_candidates,
        })
    }

    fn keyword_overfit_flag(&self, signal: &CorrelationSignal) -> Option<BiasFlag> {
        let rho = signal.magnitude()?;
        if rho <= self.thresholds.keyword_overfit {
            return None;
        }

        let (severity, description) = if rho > self.thresholds.keyword_overfit_high {
            (
                BiasSeverity::High,
                format!(
                    "Ranking closely follows the skill match score ({rho:.2}). \
                     Candidates who describe equivalent skills in other words may be ranked too low; \
                     consider more weight on role relevance."
                ),
            )
        } else {
            (
                BiasSeverity::Medium,
                format!(
                    "Skill match has a moderate influence on the ranking ({rho:.2}). \
                     Review skill normalization for synonyms and spelling variants."
                ),
            )
        };

        Some(BiasFlag {
            signal: BiasSignal::KeywordOverfit,
            severity,
            factor: None,
            value: rho,
            description,
            affected_candidates: Vec::new(),
        })
    }

    fn dominance_flags<'a>(
        &'a self,
        dominance: &'a [FactorDominance],
    ) -> impl Iterator<Item = BiasFlag> + 'a {
        dominance.iter().filter_map(move |entry| {
            let ratio = entry.ratio?;
            (ratio > self.thresholds.dominance).then(|| BiasFlag {
                signal: BiasSignal::FactorDominance,
                severity: BiasSeverity::Medium,
                factor: Some(entry.factor),
                value: ratio,
                description: format!(
                    "The {} factor carries {:.0}% of the average total score (weight {:.2}). \
                     Consider rebalancing through recruiter feedback.",
                    entry.factor.label(),
                    ratio * 100.0,
                    entry.weight
                ),
                affected_candidates: Vec::new(),
            })
        })
    }
}

fn factor_dominance(ranked: &[CandidateScore], weights: &WeightVector) -> Vec<FactorDominance> {
    if ranked.is_empty() {
        return Vec::new();
    }

    let n = ranked.len() as f64;
    let mean_total = ranked.iter().map(|c| c.breakdown.total_score).sum::<f64>() / n;

    Factor::ALL
        .iter()
        .map(|&factor| {
            let weight = weights.get(factor);
            let mean_score = ranked.iter().map(|c| c.breakdown.factor(factor)).sum::<f64>() / n;
            let ratio = (mean_total > 0.0).then(|| weight * mean_score / mean_total);
            FactorDominance {
                factor,
                weight,
                mean_score,
                ratio,
            }
        })
        .collect()
}
