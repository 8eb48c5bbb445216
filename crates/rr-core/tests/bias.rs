use rr_core::bias::{BiasSignal, SignalStatus, DISCLAIMER};
use rr_core::{Candidate, EngineConfig, EngineError, JobPosting, RankingEngine, RankingStore};

fn job() -> JobPosting {
    JobPosting {
        id: "job-1".into(),
        required_skills: vec!["go".into(), "postgres".into(), "kubernetes".into()],
        min_years: 2.0,
        max_years: None,
        document_embedding: vec![1.0, 0.0],
        skill_embedding: vec![1.0, 0.0],
        ..JobPosting::default()
    }
}

fn candidate(id: &str, skills: &[&str], years: f64, relevance: f32) -> Candidate {
    Candidate {
        id: id.into(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        years_experience: Some(years),
        document_embedding: vec![relevance, (1.0 - relevance * relevance).sqrt()],
        skill_embedding: vec![1.0, 0.0],
    }
}

fn engine() -> RankingEngine {
    let engine = RankingEngine::with_memory_store(EngineConfig::default()).unwrap();
    engine.register_job(job()).unwrap();
    engine
}

#[test]
fn identical_experience_gives_undefined_skew_and_no_flag() {
    let engine = engine();
    engine
        .rank(
            "job-1",
            &[
                candidate("a", &["go", "postgres", "kubernetes"], 4.0, 0.9),
                candidate("b", &["go", "postgres"], 4.0, 0.7),
                candidate("c", &["go"], 4.0, 0.4),
                candidate("d", &[], 4.0, 0.2),
            ],
        )
        .unwrap();

    let report = engine.get_bias_report("job-1").unwrap();
    assert_eq!(report.experience_skew.value, None);
    assert_eq!(report.experience_skew.status, SignalStatus::ZeroVariance);
    assert_eq!(report.flags_for(BiasSignal::ExperienceSkew).count(), 0);
    assert_eq!(report.disclaimer, DISCLAIMER);
}

#[test]
fn keyword_driven_ranking_is_flagged() {
    let engine = engine();
    engine
        .rank(
            "job-1",
            &[
                candidate("a", &["go", "postgres", "kubernetes"], 3.0, 0.5),
                candidate("b", &["go", "postgres"], 6.0, 0.5),
                candidate("c", &["go"], 2.0, 0.5),
                candidate("d", &[], 5.0, 0.5),
            ],
        )
        .unwrap();

    let report = engine.get_bias_report("job-1").unwrap();
    assert!((report.keyword_overfit.value.unwrap() - 1.0).abs() < 1e-12);
    let flag = report.flags_for(BiasSignal::KeywordOverfit).next().unwrap();
    assert_eq!(flag.severity, rr_core::BiasSeverity::High);
}

#[test]
fn report_is_persisted_for_later_lookup() {
    let engine = engine();
    let run = engine
        .rank("job-1", &[candidate("a", &["go"], 3.0, 0.5)])
        .unwrap();

    let stored = engine.store().load_bias_report("job-1").unwrap().unwrap();
    assert_eq!(stored.run_id, run.run_id);
    assert_eq!(stored.candidates_analyzed, 1);
    assert_eq!(stored.experience_skew.status, SignalStatus::InsufficientSample);
}

#[test]
fn unknown_job_has_no_report() {
    let engine = engine();
    assert!(matches!(
        engine.get_bias_report("job-2"),
        Err(EngineError::UnknownJob(_))
    ));
}
