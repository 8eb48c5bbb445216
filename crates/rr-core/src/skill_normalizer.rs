//! Comparison keys for skill strings.
//!
//! Skill sets arrive already canonicalized by the extraction collaborator
//! ("Python", "Apache Spark"). Matching still has to be insensitive to case,
//! full-width forms and stray whitespace, so every comparison goes through
//! [`normalize_skill`]. The transformation is idempotent.

use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;

/// NFKC, lower-case, trimmed, inner whitespace collapsed to a single space.
pub fn normalize_skill(skill: &str) -> String {
    skill
        .nfkc()
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized, deduplicated, ordered skill set. Blank entries are dropped.
pub fn normalize_skill_set(skills: &[String]) -> BTreeSet<String> {
    skills
        .iter()
        .map(|s| normalize_skill(s))
        .filter(|s| !s.is_empty())
        .collect()
}
