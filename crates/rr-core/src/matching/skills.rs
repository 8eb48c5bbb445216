use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::similarity::{clamped_cosine, jaccard};

pub const JACCARD_SHARE: f64 = 0.6;
pub const EMBEDDING_SHARE: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatchResult {
    pub score: f64,
    pub jaccard: f64,
    pub embedding_similarity: f64,
    /// Job skills (required or preferred) the candidate has, sorted.
    pub matched_skills: Vec<String>,
    /// Required skills the candidate lacks, sorted.
    pub missing_skills: Vec<String>,
}

/// Skill match: `0.6 × Jaccard + 0.4 × clamp(cosine, 0, 1)`.
///
/// All sets must already be normalized with
/// [`crate::skill_normalizer::normalize_skill_set`].
pub fn score_skills(
    candidate_skills: &BTreeSet<String>,
    job_skills: &BTreeSet<String>,
    required_skills: &BTreeSet<String>,
    candidate_embedding: &[f32],
    job_embedding: &[f32],
) -> SkillMatchResult {
    let jaccard = jaccard(candidate_skills, job_skills);
    let embedding_similarity = clamped_cosine(candidate_embedding, job_embedding);
    let score = (JACCARD_SHARE * jaccard + EMBEDDING_SHARE * embedding_similarity).clamp(0.0, 1.0);

    let matched_skills = job_skills.intersection(candidate_skills).cloned().collect();
    let missing_skills = required_skills
        .difference(candidate_skills)
        .cloned()
        .collect();

    SkillMatchResult {
        score,
        jaccard,
        embedding_similarity,
        matched_skills,
        missing_skills,
    }
}
