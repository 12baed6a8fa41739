//! Reranker for coarse candidates
//!
//! Fuses the cheap coarse score with the lexical score of each candidate,
//! applies the similarity threshold, and orders the survivors best first.

use crate::lexical::LexicalScorer;
use dupfind_core::{round4, CandidateMatch, Error, MatcherConfig, NormalizedItem, Result, ScoredMatch};

/// Score components of one (incoming, catalog) pair, rounded to 4 decimals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedScore {
    pub lexical: f64,
    pub coarse: f64,
    pub combined: f64,
}

/// Reranker that computes fused similarity scores
#[derive(Debug, Clone, Copy)]
pub struct Reranker {
    lexical_weight: f64,
    coarse_weight: f64,
    threshold: f64,
}

impl Default for Reranker {
    fn default() -> Self {
        Self::from_config(&MatcherConfig::default())
    }
}

impl Reranker {
    pub fn new(lexical_weight: f64, coarse_weight: f64, threshold: f64) -> Self {
        Self {
            lexical_weight,
            coarse_weight,
            threshold,
        }
    }

    pub fn from_config(config: &MatcherConfig) -> Self {
        Self::new(
            config.lexical_weight,
            config.coarse_weight,
            config.similarity_threshold,
        )
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Combine the lexical score of `a`/`b` with a coarse score (absent counts as 0.0).
    ///
    /// All three components are rounded to 4 decimals, and the threshold
    /// decision is taken on the rounded combined score.
    pub fn combine(
        &self,
        scorer: &dyn LexicalScorer,
        a: &str,
        b: &str,
        coarse_score: Option<f64>,
    ) -> FusedScore {
        let lexical = scorer.score(a, b);
        let coarse = coarse_score.unwrap_or(0.0);
        let combined = self.lexical_weight * lexical + self.coarse_weight * coarse;
        FusedScore {
            lexical: round4(lexical),
            coarse: round4(coarse),
            combined: round4(combined),
        }
    }

    /// Inclusive threshold test
    #[inline]
    pub fn accepts(&self, score: &FusedScore) -> bool {
        score.combined >= self.threshold
    }

    /// Score every candidate of one incoming title, keep those at or above the
    /// threshold, and sort them by combined score descending (stable on ties).
    ///
    /// # Errors
    /// A candidate pointing outside `catalog` is a retrieval failure.
    pub fn rerank(
        &self,
        scorer: &dyn LexicalScorer,
        incoming_normalized: &str,
        candidates: &[CandidateMatch],
        catalog: &[NormalizedItem],
    ) -> Result<Vec<ScoredMatch>> {
        let mut matches = Vec::new();
        for candidate in candidates {
            let entry = catalog.get(candidate.catalog_index).ok_or_else(|| {
                Error::Retrieval(format!(
                    "candidate index {} outside catalog of {} items",
                    candidate.catalog_index,
                    catalog.len()
                ))
            })?;
            let fused = self.combine(
                scorer,
                incoming_normalized,
                &entry.normalized_title,
                Some(candidate.coarse_score),
            );
            if self.accepts(&fused) {
                matches.push(ScoredMatch {
                    catalog_id: entry.id.clone(),
                    catalog_title: entry.raw_title.clone(),
                    catalog_normalized: entry.normalized_title.clone(),
                    lexical_score: fused.lexical,
                    coarse_score: fused.coarse,
                    combined_score: fused.combined,
                });
            }
        }

        // Sort by score descending
        matches.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::TokenSetScorer;

    /// Scores every pair with a fixed value
    struct FixedScorer(f64);

    impl LexicalScorer for FixedScorer {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn score(&self, _a: &str, _b: &str) -> f64 {
            self.0
        }
    }

    fn catalog_item(id: &str, title: &str) -> NormalizedItem {
        NormalizedItem {
            id: id.to_string(),
            raw_title: title.to_string(),
            normalized_title: title.to_lowercase(),
        }
    }

    #[test]
    fn test_combine_weights_and_rounding() {
        let reranker = Reranker::default();
        let fused = reranker.combine(&FixedScorer(0.123456), "a", "b", Some(0.654321));
        assert_eq!(fused.lexical, 0.1235);
        assert_eq!(fused.coarse, 0.6543);
        assert_eq!(fused.combined, round4(0.6 * 0.123456 + 0.4 * 0.654321));
    }

    #[test]
    fn test_missing_coarse_counts_as_zero() {
        let fused = Reranker::default().combine(&FixedScorer(1.0), "a", "b", None);
        assert_eq!(fused.coarse, 0.0);
        assert_eq!(fused.combined, 0.6);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let reranker = Reranker::new(1.0, 0.0, 0.8);
        let at = reranker.combine(&FixedScorer(0.8), "a", "b", None);
        assert!(reranker.accepts(&at));

        let below = reranker.combine(&FixedScorer(0.7999), "a", "b", None);
        assert!(!reranker.accepts(&below));
    }

    #[test]
    fn test_threshold_uses_exactly_rounded_score() {
        // 0.99874999... rounds down to 0.9987, one step under the threshold
        let reranker = Reranker::new(1.0, 0.0, 0.9988);
        let fused = reranker.combine(&FixedScorer(0.9987499999999999), "a", "b", None);
        assert_eq!(fused.lexical, 0.9987);
        assert_eq!(fused.combined, 0.9987);
        assert!(!reranker.accepts(&fused));
    }

    #[test]
    fn test_rerank_filters_and_sorts() {
        let reranker = Reranker::default();
        let catalog = vec![
            catalog_item("1", "Banana"),
            catalog_item("2", "xiaomi note"),
            catalog_item("3", "xiaomi note 8 gb"),
        ];
        let candidates = vec![
            CandidateMatch::new(0, 0.9),
            CandidateMatch::new(1, 0.7),
            CandidateMatch::new(2, 0.95),
        ];

        let results = reranker
            .rerank(&TokenSetScorer, "xiaomi note 8 gb", &candidates, &catalog)
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].catalog_id, "3");
        assert_eq!(results[0].combined_score, 0.98);
        assert_eq!(results[1].catalog_id, "2");
        assert_eq!(results[1].combined_score, 0.88);
    }

    #[test]
    fn test_rerank_ties_keep_candidate_order() {
        let reranker = Reranker::default();
        let catalog = vec![catalog_item("a", "x"), catalog_item("b", "y")];
        let candidates = vec![CandidateMatch::new(1, 1.0), CandidateMatch::new(0, 1.0)];
        let results = reranker
            .rerank(&FixedScorer(1.0), "z", &candidates, &catalog)
            .unwrap();
        let ids: Vec<_> = results.iter().map(|m| m.catalog_id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn test_rerank_rejects_bad_index() {
        let catalog = vec![catalog_item("1", "x")];
        let err = Reranker::default()
            .rerank(&FixedScorer(1.0), "x", &[CandidateMatch::new(5, 0.5)], &catalog)
            .unwrap_err();
        assert!(matches!(err, Error::Retrieval(_)));
    }
}
