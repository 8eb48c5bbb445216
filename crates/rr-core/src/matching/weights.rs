use serde::{Deserialize, Serialize};
use strum::AsRefStr;

/// Lower bound for every factor weight after adaptation.
pub const MIN_WEIGHT: f64 = 0.10;
/// Upper bound for every factor weight after adaptation.
pub const MAX_WEIGHT: f64 = 0.70;
/// Float slack allowed when checking bounds and the unit sum.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

pub const DEFAULT_WEIGHTS: WeightVector = WeightVector {
    skill: 0.40,
    experience: 0.30,
    relevance: 0.30,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Factor {
    Skill,
    Experience,
    Relevance,
}

impl Factor {
    pub const ALL: [Factor; 3] = [Factor::Skill, Factor::Experience, Factor::Relevance];

    pub fn label(&self) -> &'static str {
        match self {
            Factor::Skill => "skill match",
            Factor::Experience => "experience alignment",
            Factor::Relevance => "role relevance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub skill: f64,
    pub experience: f64,
    pub relevance: f64,
}

impl Default for WeightVector {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl WeightVector {
    pub fn new(skill: f64, experience: f64, relevance: f64) -> Self {
        Self {
            skill,
            experience,
            relevance,
        }
    }

    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Skill => self.skill,
            Factor::Experience => self.experience,
            Factor::Relevance => self.relevance,
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.skill, self.experience, self.relevance]
    }

    pub fn from_array(values: [f64; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }

    pub fn sum(&self) -> f64 {
        self.skill + self.experience + self.relevance
    }

    /// Checks the persisted-state contract: every component in
    /// [MIN_WEIGHT, MAX_WEIGHT] and a unit sum.
    pub fn check_invariant(&self) -> Result<(), String> {
        for factor in Factor::ALL {
            let value = self.get(factor);
            if !value.is_finite() {
                return Err(format!("{} weight is not finite", factor.as_ref()));
            }
            if value < MIN_WEIGHT - WEIGHT_TOLERANCE || value > MAX_WEIGHT + WEIGHT_TOLERANCE {
                return Err(format!(
                    "{} weight {value} outside [{MIN_WEIGHT}, {MAX_WEIGHT}]",
                    factor.as_ref()
                ));
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(format!("weights sum to {sum}, expected 1.0"));
        }

        Ok(())
    }

    /// Clamp every component to the bounds, then rescale to a unit sum.
    ///
    /// Plain division by the sum can push a component back across a bound
    /// (e.g. clamped `[0.70, 0.15, 0.10]` → `0.737` after division). Such a
    /// component is pinned at the bound and the remainder is spread over the
    /// free components in proportion to their size. With three factors and
    /// `3 × MIN ≤ 1 ≤ 3 × MAX` this settles in at most three passes.
    pub fn clamp_and_renormalize(raw: [f64; 3]) -> Self {
        let mut values = raw.map(|v| v.clamp(MIN_WEIGHT, MAX_WEIGHT));
        let sum: f64 = values.iter().sum();
        for v in values.iter_mut() {
            *v /= sum;
        }

        let mut pinned = [false; 3];
        for _ in 0..values.len() {
            let mut moved = false;
            for (value, pin) in values.iter_mut().zip(pinned.iter_mut()) {
                if *pin {
                    continue;
                }
                if *value > MAX_WEIGHT {
                    *value = MAX_WEIGHT;
                    *pin = true;
                    moved = true;
                } else if *value < MIN_WEIGHT {
                    *value = MIN_WEIGHT;
                    *pin = true;
                    moved = true;
                }
            }
            if !moved {
                break;
            }

            let pinned_sum: f64 = values
                .iter()
                .zip(pinned.iter())
                .filter(|(_, pin)| **pin)
                .map(|(v, _)| *v)
                .sum();
            let free_sum: f64 = values
                .iter()
                .zip(pinned.iter())
                .filter(|(_, pin)| !**pin)
                .map(|(v, _)| *v)
                .sum();
            let free_count = pinned.iter().filter(|pin| !**pin).count();
            if free_count == 0 {
                break;
            }

            let target = 1.0 - pinned_sum;
            for (value, pin) in values.iter_mut().zip(pinned.iter()) {
                if *pin {
                    continue;
                }
                *value = if free_sum > 0.0 {
                    *value * target / free_sum
                } else {
                    target / free_count as f64
                };
            }
        }

        Self::from_array(values)
    }
}
