use super::similarity::clamped_cosine;

/// Role relevance: document-embedding cosine clamped to [0, 1].
pub fn score_relevance(candidate_document: &[f32], job_document: &[f32]) -> f64 {
    clamped_cosine(candidate_document, job_document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_document_cosine() {
        let score = score_relevance(&[0.6, 0.8], &[1.0, 0.0]);
        assert!((score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn unrelated_documents_score_zero() {
        assert_eq!(score_relevance(&[0.0, 1.0], &[0.0, -1.0]), 0.0);
        assert_eq!(score_relevance(&[0.0, 1.0], &[1.0, 0.0]), 0.0);
    }
}
