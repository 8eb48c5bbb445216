use serde::Deserialize;

use super::feedback_request::FeedbackRequest;
use crate::{Candidate, JobPosting};

/// One job, its candidate pool, and optionally the recruiter decisions to
/// replay against the resulting ranking.
#[derive(Debug, Clone, Deserialize)]
pub struct RankRequest {
    pub job: JobPosting,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub feedback: Vec<FeedbackRequest>,
}
