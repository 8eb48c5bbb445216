pub mod api;
pub mod bias;
pub mod config;
pub mod error;
pub mod explain;
pub mod feedback;
pub mod logging;
pub mod matching;
pub mod run_id;
pub mod skill_normalizer;
pub mod store;

use serde::{Deserialize, Serialize};

pub use bias::{BiasReport, BiasSeverity, CorrelationSignal};
pub use config::EngineConfig;
pub use error::{EngineError, InvalidInput};
pub use feedback::{Decision, FeedbackOutcome, FeedbackRecord, WeightHistoryEntry};
pub use matching::pipeline::{RankedCandidate, RankingEngine, RankingRun, SkippedCandidate};
pub use matching::scoring::ScoreBreakdown;
pub use matching::weights::{Factor, WeightVector};
pub use store::{MemoryStore, RankingStore, StorageError};

pub type CandidateId = String;
pub type JobId = String;

// Feature records handed over by the extraction and embedding collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub years_experience: Option<f64>,
    #[serde(default)]
    pub document_embedding: Vec<f32>,
    #[serde(default)]
    pub skill_embedding: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub min_years: f64,
    /// `None` means no upper bound: over-qualification is never penalized.
    #[serde(default)]
    pub max_years: Option<f64>,
    #[serde(default)]
    pub document_embedding: Vec<f32>,
    #[serde(default)]
    pub skill_embedding: Vec<f32>,
    #[serde(default)]
    pub weights: WeightVector,
}

impl JobPosting {
    /// Required ∪ preferred, normalized. This is the set skill matching runs against.
    pub fn skill_set(&self) -> std::collections::BTreeSet<String> {
        let mut skills = skill_normalizer::normalize_skill_set(&self.required_skills);
        skills.extend(skill_normalizer::normalize_skill_set(&self.preferred_skills));
        skills
    }

    pub fn experience_range(&self) -> matching::experience::ExperienceRange {
        matching::experience::ExperienceRange {
            min_years: self.min_years,
            max_years: self.max_years,
        }
    }

    /// Job-level checks. A failure here makes every candidate unscoreable,
    /// so it is reported as an error instead of per-candidate skips.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if self.skill_set().is_empty() {
            return Err(InvalidInput::EmptyJobSkills {
                job_id: self.id.clone(),
            });
        }

        if !self.min_years.is_finite() || self.min_years < 0.0 {
            return Err(InvalidInput::InvalidExperienceRange {
                job_id: self.id.clone(),
                min_years: self.min_years,
                max_years: self.max_years,
            });
        }

        if let Some(max) = self.max_years {
            if !max.is_finite() || max < self.min_years {
                return Err(InvalidInput::InvalidExperienceRange {
                    job_id: self.id.clone(),
                    min_years: self.min_years,
                    max_years: self.max_years,
                });
            }
        }

        for (embedding, values) in [
            ("document", &self.document_embedding),
            ("skill", &self.skill_embedding),
        ] {
            if values.is_empty() {
                return Err(InvalidInput::MissingJobEmbedding {
                    job_id: self.id.clone(),
                    embedding,
                });
            }
        }

        if self.document_embedding.iter().any(|v| !v.is_finite())
            || self.skill_embedding.iter().any(|v| !v.is_finite())
        {
            return Err(InvalidInput::NonFiniteEmbedding {
                owner: self.id.clone(),
            });
        }

        self.weights
            .check_invariant()
            .map_err(|reason| InvalidInput::InvalidWeights {
                job_id: self.id.clone(),
                reason,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobPosting {
        JobPosting {
            id: "job-1".into(),
            required_skills: vec!["Python".into(), "Java".into()],
            preferred_skills: vec!["python".into(), "Docker".into()],
            min_years: 2.0,
            max_years: Some(5.0),
            document_embedding: vec![1.0, 0.0],
            skill_embedding: vec![0.0, 1.0],
            ..JobPosting::default()
        }
    }

    #[test]
    fn skill_set_is_normalized_union() {
        let skills: Vec<_> = job().skill_set().into_iter().collect();
        assert_eq!(skills, vec!["docker", "java", "python"]);
    }

    #[test]
    fn rejects_job_without_skills() {
        let mut job = job();
        job.required_skills.clear();
        job.preferred_skills = vec!["  ".into()];

        assert!(matches!(
            job.validate(),
            Err(InvalidInput::EmptyJobSkills { .. })
        ));
    }

    #[test]
    fn rejects_inverted_experience_range() {
        let mut job = job();
        job.min_years = 6.0;

        assert!(matches!(
            job.validate(),
            Err(InvalidInput::InvalidExperienceRange { .. })
        ));
    }

    #[test]
    fn rejects_weights_outside_bounds() {
        let mut job = job();
        job.weights = WeightVector::new(0.8, 0.1, 0.1);

        assert!(matches!(
            job.validate(),
            Err(InvalidInput::InvalidWeights { .. })
        ));
    }

    #[test]
    fn rejects_job_without_skill_embedding() {
        let job: JobPosting = serde_json::from_str(
            r#"{"id": "job-1", "required_skills": ["python"], "document_embedding": [1.0, 0.0]}"#,
        )
        .unwrap();

        assert_eq!(
            job.validate(),
            Err(InvalidInput::MissingJobEmbedding {
                job_id: "job-1".into(),
                embedding: "skill",
            })
        );
    }

    #[test]
    fn rejects_job_without_document_embedding() {
        let mut job = job();
        job.document_embedding.clear();

        assert!(matches!(
            job.validate(),
            Err(InvalidInput::MissingJobEmbedding { embedding: "document", .. })
        ));
    }

    #[test]
    fn unbounded_max_is_valid() {
        let mut job = job();
        job.max_years = None;
        assert!(job.validate().is_ok());
    }
}
