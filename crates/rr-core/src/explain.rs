//! Recruiter-facing text for a ranked candidate.
//!
//! Pure template over the numbers already in the breakdown: the same
//! ranking always produces byte-identical explanations.

use std::fmt::Write as _;

use crate::matching::experience::{ExperienceFit, ExperienceRange};
use crate::matching::scoring::CandidateScore;

pub const LEVEL_STRONG: f64 = 0.70;
pub const LEVEL_MODERATE: f64 = 0.45;
pub const LEVEL_LIMITED: f64 = 0.25;

const MAX_LISTED_MATCHED: usize = 4;
const MAX_LISTED_MISSING: usize = 3;

fn level(score: f64) -> &'static str {
    if score >= LEVEL_STRONG {
        "strong"
    } else if score >= LEVEL_MODERATE {
        "moderate"
    } else if score >= LEVEL_LIMITED {
        "limited"
    } else {
        "weak"
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn years_label(years: Option<f64>) -> String {
    match years {
        Some(years) => format!("{years:.0} yrs"),
        None => "not stated".to_string(),
    }
}

fn strengths(score: &CandidateScore) -> Vec<String> {
    let breakdown = &score.breakdown;
    let mut parts = Vec::new();

    if breakdown.skill_score >= LEVEL_MODERATE && !score.matched_skills.is_empty() {
        let listed: Vec<&str> = score
            .matched_skills
            .iter()
            .take(MAX_LISTED_MATCHED)
            .map(String::as_str)
            .collect();
        parts.push(format!(
            "{} skill alignment with {}",
            level(breakdown.skill_score),
            listed.join(", ")
        ));
    }

    if breakdown.experience_score >= LEVEL_STRONG {
        parts.push(format!(
            "well-matched experience ({})",
            years_label(score.years_experience)
        ));
    } else if breakdown.experience_score >= LEVEL_MODERATE {
        parts.push(format!(
            "adequate experience ({})",
            years_label(score.years_experience)
        ));
    }

    if breakdown.relevance_score >= LEVEL_STRONG {
        parts.push("strong semantic alignment with the role".to_string());
    } else if breakdown.relevance_score >= LEVEL_MODERATE {
        parts.push("moderate role-level fit".to_string());
    }

    parts
}

fn weaknesses(score: &CandidateScore, range: &ExperienceRange) -> Vec<String> {
    let mut parts = Vec::new();

    if !score.missing_skills.is_empty() {
        let listed: Vec<&str> = score
            .missing_skills
            .iter()
            .take(MAX_LISTED_MISSING)
            .map(String::as_str)
            .collect();
        let remainder = score.missing_skills.len() - listed.len();
        let mut text = format!("lacks required skills: {}", listed.join(", "));
        if remainder > 0 {
            let _ = write!(text, " (+{remainder} more)");
        }
        parts.push(text);
    }

    let years = score.years_experience.unwrap_or(0.0);
    match range.fit(years) {
        ExperienceFit::UnderQualified if score.breakdown.experience_score < LEVEL_MODERATE => {
            let shortfall = ((range.min_years - years) * 10.0).floor() / 10.0;
            parts.push(format!("under-qualified by ~{shortfall:.1} yrs of experience"));
        }
        ExperienceFit::OverQualified => {
            if let Some(max) = range.max_years {
                let excess = ((years - max) * 10.0).floor() / 10.0;
                parts.push(format!("exceeds the experience range by ~{excess:.1} yrs"));
            }
        }
        _ => {}
    }

    parts
}

/// Builds the explanation for one ranked entry. `rank` is 1-based.
pub fn explain(rank: usize, score: &CandidateScore, range: &ExperienceRange) -> String {
    let breakdown = &score.breakdown;
    let mut text = format!(
        "Ranked #{rank} overall (score: {:.2}/1.00). ",
        breakdown.total_score
    );

    let strengths = strengths(score);
    if strengths.is_empty() {
        text.push_str("Limited alignment with this role. ");
    } else {
        let _ = write!(text, "{}. ", capitalize(&strengths.join(", ")));
    }

    let weaknesses = weaknesses(score, range);
    if !weaknesses.is_empty() {
        let _ = write!(text, "However, {}. ", weaknesses.join("; "));
    }

    if breakdown.skill_score > 0.85 && breakdown.relevance_score > 0.85 && breakdown.experience_score < 0.6 {
        text.push_str("Note: strong skill signals outweigh tenure. ");
    }

    let _ = write!(
        text,
        "[Skill: {:.2} | Experience: {:.2} | Role Fit: {:.2}]",
        breakdown.skill_score, breakdown.experience_score, breakdown.relevance_score
    );
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::scoring::ScoreBreakdown;

    fn score(skill: f64, experience: f64, relevance: f64, years: Option<f64>) -> CandidateScore {
        CandidateScore {
            candidate_id: "cand-1".into(),
            breakdown: ScoreBreakdown {
                skill_score: skill,
                experience_score: experience,
                relevance_score: relevance,
                total_score: 0.4 * skill + 0.3 * experience + 0.3 * relevance,
            },
            matched_skills: vec!["python".into()],
            missing_skills: vec!["java".into()],
            years_experience: years,
        }
    }

    fn range(min: f64, max: Option<f64>) -> ExperienceRange {
        ExperienceRange {
            min_years: min,
            max_years: max,
        }
    }

    #[test]
    fn worked_example_reads_naturally() {
        let text = explain(1, &score(0.52, 1.0, 0.6, Some(3.0)), &range(2.0, Some(5.0)));
        assert_eq!(
            text,
            "Ranked #1 overall (score: 0.69/1.00). Moderate skill alignment with python, \
             well-matched experience (3 yrs), moderate role-level fit. \
             However, lacks required skills: java. \
             [Skill: 0.52 | Experience: 1.00 | Role Fit: 0.60]"
        );
    }

    #[test]
    fn reports_experience_shortfall() {
        let text = explain(4, &score(0.2, 0.25, 0.1, Some(1.0)), &range(4.0, None));
        assert!(text.starts_with("Ranked #4 overall"));
        assert!(text.contains("Limited alignment with this role."));
        assert!(text.contains("under-qualified by ~3.0 yrs"));
    }

    #[test]
    fn lists_overflowing_missing_skills() {
        let mut entry = score(0.2, 1.0, 0.1, Some(3.0));
        entry.missing_skills = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        let text = explain(2, &entry, &range(0.0, None));
        assert!(text.contains("lacks required skills: a, b, c (+2 more)"));
    }

    #[test]
    fn same_input_same_text() {
        let entry = score(0.9, 0.3, 0.95, None);
        let r = range(5.0, Some(8.0));
        assert_eq!(explain(1, &entry, &r), explain(1, &entry, &r));
        assert!(explain(1, &entry, &r).contains("strong skill signals outweigh tenure"));
    }
}
