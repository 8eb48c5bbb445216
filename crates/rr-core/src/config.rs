use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("learning_rate must be in (0, 1], got {0}")]
    LearningRate(f64),
    #[error("feedback_threshold must be at least 1")]
    FeedbackThreshold,
    #[error("{name} must be in (0, 1], got {value}")]
    Threshold { name: &'static str, value: f64 },
    #[error("high severity cut-off for {name} ({high}) is below its flag threshold ({flag})")]
    SeverityOrder {
        name: &'static str,
        flag: f64,
        high: f64,
    },
}

/// Deployment-wide tuning. Weight bounds are constants in [`crate::matching::weights`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Step size of the weight update.
    pub learning_rate: f64,
    /// Feedback records per adaptation cycle.
    pub feedback_threshold: usize,
    pub experience_skew_threshold: f64,
    pub experience_skew_high: f64,
    pub keyword_overfit_threshold: f64,
    pub keyword_overfit_high: f64,
    pub dominance_threshold: f64,
    /// Below this many ranked candidates, rank correlations are reported as undefined.
    pub min_bias_sample: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            feedback_threshold: 5,
            experience_skew_threshold: 0.45,
            experience_skew_high: 0.70,
            keyword_overfit_threshold: 0.50,
            keyword_overfit_high: 0.75,
            dominance_threshold: 0.35,
            min_bias_sample: 3,
        }
    }
}

impl EngineConfig {
    /// Reads `RR_*` overrides. Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            learning_rate: env_or("RR_LEARNING_RATE", defaults.learning_rate),
            feedback_threshold: env_or("RR_FEEDBACK_THRESHOLD", defaults.feedback_threshold),
            experience_skew_threshold: env_or(
                "RR_EXPERIENCE_SKEW_THRESHOLD",
                defaults.experience_skew_threshold,
            ),
            experience_skew_high: env_or("RR_EXPERIENCE_SKEW_HIGH", defaults.experience_skew_high),
            keyword_overfit_threshold: env_or(
                "RR_KEYWORD_OVERFIT_THRESHOLD",
                defaults.keyword_overfit_threshold,
            ),
            keyword_overfit_high: env_or("RR_KEYWORD_OVERFIT_HIGH", defaults.keyword_overfit_high),
            dominance_threshold: env_or("RR_DOMINANCE_THRESHOLD", defaults.dominance_threshold),
            min_bias_sample: env_or("RR_MIN_BIAS_SAMPLE", defaults.min_bias_sample),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ConfigError::LearningRate(self.learning_rate));
        }
        if self.feedback_threshold == 0 {
            return Err(ConfigError::FeedbackThreshold);
        }

        for (name, value) in [
            ("experience_skew_threshold", self.experience_skew_threshold),
            ("experience_skew_high", self.experience_skew_high),
            ("keyword_overfit_threshold", self.keyword_overfit_threshold),
            ("keyword_overfit_high", self.keyword_overfit_high),
            ("dominance_threshold", self.dominance_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Threshold { name, value });
            }
        }

        if self.experience_skew_high < self.experience_skew_threshold {
            return Err(ConfigError::SeverityOrder {
                name: "experience_skew",
                flag: self.experience_skew_threshold,
                high: self.experience_skew_high,
            });
        }
        if self.keyword_overfit_high < self.keyword_overfit_threshold {
            return Err(ConfigError::SeverityOrder {
                name: "keyword_overfit",
                flag: self.keyword_overfit_threshold,
                high: self.keyword_overfit_high,
            });
        }

        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        use std::sync::Mutex;
        static ENV_GUARD: Mutex<()> = Mutex::new(());
        let _guard = ENV_GUARD.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let prev: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, value)| {
                let previous = std::env::var(key).ok();
                match value {
                    Some(v) => std::env::set_var(key, v),
                    None => std::env::remove_var(key),
                }
                (key.to_string(), previous)
            })
            .collect();

        f();

        for (key, value) in prev {
            match value {
                Some(v) => std::env::set_var(&key, v),
                None => std::env::remove_var(&key),
            }
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.feedback_threshold, 5);
        assert!((config.learning_rate - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn reads_overrides_from_env() {
        with_env(
            &[
                ("RR_LEARNING_RATE", Some("0.1")),
                ("RR_DOMINANCE_THRESHOLD", Some("0.5")),
                ("RR_FEEDBACK_THRESHOLD", None),
            ],
            || {
                let config = EngineConfig::from_env();
                assert!((config.learning_rate - 0.1).abs() < f64::EPSILON);
                assert!((config.dominance_threshold - 0.5).abs() < f64::EPSILON);
                assert_eq!(config.feedback_threshold, 5);
            },
        );
    }

    #[test]
    fn unparseable_env_falls_back_to_default() {
        with_env(&[("RR_FEEDBACK_THRESHOLD", Some("five"))], || {
            assert_eq!(EngineConfig::from_env().feedback_threshold, 5);
        });
    }

    #[test]
    fn rejects_zero_learning_rate() {
        let config = EngineConfig {
            learning_rate: 0.0,
            ..EngineConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::LearningRate(0.0)));
    }

    #[test]
    fn rejects_high_cutoff_below_flag_threshold() {
        let config = EngineConfig {
            keyword_overfit_high: 0.4,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SeverityOrder { name: "keyword_overfit", .. })
        ));
    }
}
