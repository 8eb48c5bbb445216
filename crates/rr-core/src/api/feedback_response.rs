use serde::{Deserialize, Serialize};

use crate::feedback::{FeedbackOutcome, FeedbackStats, WeightHistoryEntry};
use crate::matching::weights::WeightVector;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub job_id: String,
    pub candidate_id: String,
    pub outcome: FeedbackOutcome,
    /// Weights in effect after this submission.
    pub current_weights: WeightVector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightHistoryResponse {
    pub job_id: String,
    pub current_weights: WeightVector,
    pub history: Vec<WeightHistoryEntry>,
    pub stats: FeedbackStats,
}
