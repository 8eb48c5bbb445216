use serde::{Deserialize, Serialize};

pub const OVERQUALIFIED_PENALTY_PER_YEAR: f64 = 0.04;
pub const OVERQUALIFIED_PENALTY_CAP: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRange {
    pub min_years: f64,
    /// `None` = unbounded.
    pub max_years: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceFit {
    UnderQualified,
    WithinRange,
    OverQualified,
}

impl ExperienceRange {
    pub fn fit(&self, years: f64) -> ExperienceFit {
        if years < self.min_years {
            ExperienceFit::UnderQualified
        } else if self.max_years.is_some_and(|max| years > max) {
            ExperienceFit::OverQualified
        } else {
            ExperienceFit::WithinRange
        }
    }
}

/// Experience alignment in [0, 1]. Unknown experience counts as zero years.
pub fn score_experience(years: Option<f64>, range: &ExperienceRange) -> f64 {
    let years = years.unwrap_or(0.0);

    match range.fit(years) {
        ExperienceFit::UnderQualified => {
            // min > years >= 0 here, so min is strictly positive.
            let penalty = (range.min_years - years) / range.min_years;
            (1.0 - penalty).max(0.0)
        }
        ExperienceFit::WithinRange => 1.0,
        ExperienceFit::OverQualified => {
            let max = range.max_years.unwrap_or(f64::INFINITY);
            let penalty = ((years - max) * OVERQUALIFIED_PENALTY_PER_YEAR).min(OVERQUALIFIED_PENALTY_CAP);
            1.0 - penalty
        }
    }
}
