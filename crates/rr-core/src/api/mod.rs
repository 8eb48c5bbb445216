pub mod feedback_request;
pub mod feedback_response;
pub mod rank_request;
pub mod rank_response;
