use serde::{Deserialize, Serialize};

use crate::feedback::Decision;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub candidate_id: String,
    pub decision: Decision,
    #[serde(default)]
    pub notes: Option<String>,
}
