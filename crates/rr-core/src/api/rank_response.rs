use serde::{Deserialize, Serialize};

use crate::bias::BiasReport;
use crate::matching::pipeline::RankingRun;

use super::feedback_response::{FeedbackResponse, WeightHistoryResponse};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankResponse {
    pub run: RankingRun,
    pub bias_report: BiasReport,
    /// Present when the request carried feedback to replay.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feedback: Vec<FeedbackResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<WeightHistoryResponse>,
}
