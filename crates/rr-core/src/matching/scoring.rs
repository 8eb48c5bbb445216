use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{
    experience::{score_experience, ExperienceRange},
    relevance::score_relevance,
    skills::score_skills,
    weights::{Factor, WeightVector},
};
use crate::error::InvalidInput;
use crate::skill_normalizer::normalize_skill_set;
use crate::{Candidate, CandidateId, JobPosting};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skill_score: f64,
    pub experience_score: f64,
    pub relevance_score: f64,
    pub total_score: f64,
}

impl ScoreBreakdown {
    pub fn factor(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Skill => self.skill_score,
            Factor::Experience => self.experience_score,
            Factor::Relevance => self.relevance_score,
        }
    }
}

/// Weighted sum of the factor scores.
pub fn aggregate(skill: f64, experience: f64, relevance: f64, weights: &WeightVector) -> ScoreBreakdown {
    let total = weights.skill * skill + weights.experience * experience + weights.relevance * relevance;

    ScoreBreakdown {
        skill_score: skill,
        experience_score: experience,
        relevance_score: relevance,
        total_score: total.clamp(0.0, 1.0),
    }
}

/// Job features that every candidate is scored against; computed once per run.
#[derive(Debug, Clone)]
pub struct JobContext<'a> {
    pub job: &'a JobPosting,
    pub skills: BTreeSet<String>,
    pub required_skills: BTreeSet<String>,
    pub experience: ExperienceRange,
    pub weights: WeightVector,
}

impl<'a> JobContext<'a> {
    pub fn new(job: &'a JobPosting, weights: WeightVector) -> Self {
        Self {
            job,
            skills: job.skill_set(),
            required_skills: normalize_skill_set(&job.required_skills),
            experience: job.experience_range(),
            weights,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub candidate_id: CandidateId,
    pub breakdown: ScoreBreakdown,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub years_experience: Option<f64>,
}

pub fn validate_candidate(candidate: &Candidate, job: &JobPosting) -> Result<(), InvalidInput> {
    if let Some(years) = candidate.years_experience {
        if !years.is_finite() || years < 0.0 {
            return Err(InvalidInput::InvalidYearsOfExperience {
                candidate_id: candidate.id.clone(),
                value: years,
            });
        }
    }

    if candidate.document_embedding.iter().any(|v| !v.is_finite())
        || candidate.skill_embedding.iter().any(|v| !v.is_finite())
    {
        return Err(InvalidInput::NonFiniteEmbedding {
            owner: candidate.id.clone(),
        });
    }

    for (embedding, actual, expected) in [
        (
            "document",
            candidate.document_embedding.len(),
            job.document_embedding.len(),
        ),
        (
            "skill",
            candidate.skill_embedding.len(),
            job.skill_embedding.len(),
        ),
    ] {
        if actual != expected {
            return Err(InvalidInput::EmbeddingDimensionMismatch {
                owner: candidate.id.clone(),
                embedding,
                expected,
                actual,
            });
        }
    }

    Ok(())
}

/// Scores one candidate. Pure: no shared state, safe to fan out.
pub fn score_candidate(candidate: &Candidate, ctx: &JobContext<'_>) -> Result<CandidateScore, InvalidInput> {
    validate_candidate(candidate, ctx.job)?;

    let candidate_skills = normalize_skill_set(&candidate.skills);
    let skills = score_skills(
        &candidate_skills,
        &ctx.skills,
        &ctx.required_skills,
        &candidate.skill_embedding,
        &ctx.job.skill_embedding,
    );
    let experience = score_experience(candidate.years_experience, &ctx.experience);
    let relevance = score_relevance(&candidate.document_embedding, &ctx.job.document_embedding);

    Ok(CandidateScore {
        candidate_id: candidate.id.clone(),
        breakdown: aggregate(skills.score, experience, relevance, &ctx.weights),
        matched_skills: skills.matched_skills,
        missing_skills: skills.missing_skills,
        years_experience: candidate.years_experience,
    })
}

/// Total order for ranked output: total desc, skill desc, id asc.
pub fn compare_ranked(a: &CandidateScore, b: &CandidateScore) -> Ordering {
    b.breakdown
        .total_score
        .total_cmp(&a.breakdown.total_score)
        .then_with(|| b.breakdown.skill_score.total_cmp(&a.breakdown.skill_score))
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}

pub fn sort_ranked(scores: &mut [CandidateScore]) {
    scores.sort_by(compare_ranked);
}
