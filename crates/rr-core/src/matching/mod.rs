pub mod experience;
pub mod pipeline;
pub mod relevance;
pub mod scoring;
pub mod similarity;
pub mod skills;
pub mod weights;
