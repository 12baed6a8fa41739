use serde::{Deserialize, Serialize};

/// A product title as loaded from a catalog or incoming file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub raw_title: String,
}

impl Item {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, raw_title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw_title: raw_title.into(),
        }
    }
}

impl<I: Into<String>, T: Into<String>> From<(I, T)> for Item {
    fn from((id, title): (I, T)) -> Self {
        Item::new(id, title)
    }
}

/// An item paired with its canonical title. `normalized_title` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedItem {
    pub id: String,
    pub raw_title: String,
    pub normalized_title: String,
}

/// A catalog entry proposed by coarse retrieval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateMatch {
    pub catalog_index: usize,
    pub coarse_score: f64,
}

impl CandidateMatch {
    #[inline]
    pub fn new(catalog_index: usize, coarse_score: f64) -> Self {
        Self {
            catalog_index,
            coarse_score,
        }
    }
}

/// A candidate that passed the similarity threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub catalog_id: String,
    pub catalog_title: String,
    pub catalog_normalized: String,
    pub lexical_score: f64,
    pub coarse_score: f64,
    pub combined_score: f64,
}

/// Matches found for one incoming item, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub incoming_title: String,
    pub incoming_normalized: String,
    pub matches: Vec<ScoredMatch>,
}

impl MatchReport {
    #[inline]
    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Highest scoring match, if any
    pub fn best(&self) -> Option<&ScoredMatch> {
        self.matches.first()
    }
}
