use proptest::prelude::*;

use rr_core::feedback::adapter::WeightAdapter;
use rr_core::matching::scoring::{score_candidate, JobContext};
use rr_core::matching::weights::{MAX_WEIGHT, MIN_WEIGHT};
use rr_core::{Candidate, JobPosting, WeightVector};

const DIM: usize = 4;

fn embedding() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0f32..1.0, DIM)
}

fn skills() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::sample::select(vec!["rust", "go", "sql", "kafka", "react", "aws"]),
        0..6,
    )
    .prop_map(|v| v.into_iter().map(String::from).collect())
}

fn weights() -> impl Strategy<Value = WeightVector> {
    (0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0)
        .prop_map(|(a, b, c)| WeightVector::clamp_and_renormalize([a, b, c]))
}

proptest! {
    #[test]
    fn breakdown_components_stay_in_unit_range(
        candidate_skills in skills(),
        job_skills in skills(),
        years in prop::option::of(0.0f64..60.0),
        min_years in 0.0f64..15.0,
        span in prop::option::of(0.0f64..15.0),
        candidate_doc in embedding(),
        candidate_skill_vec in embedding(),
        job_doc in embedding(),
        job_skill_vec in embedding(),
        weights in weights(),
    ) {
        let mut job_skills = job_skills;
        job_skills.push("rust".into());
        let job = JobPosting {
            id: "job".into(),
            required_skills: job_skills,
            min_years,
            max_years: span.map(|s| min_years + s),
            document_embedding: job_doc,
            skill_embedding: job_skill_vec,
            weights,
            ..JobPosting::default()
        };
        let candidate = Candidate {
            id: "cand".into(),
            skills: candidate_skills,
            years_experience: years,
            document_embedding: candidate_doc,
            skill_embedding: candidate_skill_vec,
        };

        let ctx = JobContext::new(&job, weights);
        let b = score_candidate(&candidate, &ctx).unwrap().breakdown;
        for value in [b.skill_score, b.experience_score, b.relevance_score, b.total_score] {
            prop_assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn renormalization_always_satisfies_the_invariant(
        a in -1.0f64..3.0,
        b in -1.0f64..3.0,
        c in -1.0f64..3.0,
    ) {
        let w = WeightVector::clamp_and_renormalize([a, b, c]);
        prop_assert!(w.check_invariant().is_ok(), "{w:?}");
        for v in w.as_array() {
            prop_assert!(v >= MIN_WEIGHT - 1e-9 && v <= MAX_WEIGHT + 1e-9);
        }
    }

    #[test]
    fn adaptation_preserves_the_invariant(
        start in weights(),
        signals in prop::array::uniform3(-1.0f64..1.0),
        learning_rate in 0.001f64..1.0,
    ) {
        let next = WeightAdapter::new(learning_rate).propose(&start, signals);
        prop_assert!(next.check_invariant().is_ok(), "{start:?} -> {next:?}");
    }
}
