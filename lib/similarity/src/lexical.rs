//! Lexical similarity scorers
//!
//! The fine-grained stage of matching. Two interchangeable strategies sit
//! behind [`LexicalScorer`]; [`scorer_for`] picks one from the configuration
//! and [`CachedScorer`] memoizes any of them.

use crate::distance::{jaccard_tokens, sequence_ratio, token_set_ratio};
use dupfind_core::{BoundedCache, LexicalBackend, MatcherConfig};
use std::borrow::Borrow;
use std::hash::{Hash, Hasher};

/// Memo table for lexical scores, keyed on the ordered pair of titles
pub type PairCache = BoundedCache<TitlePair, f64>;

/// Owned cache key of an ordered title pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TitlePair {
    first: String,
    second: String,
}

impl TitlePair {
    pub fn new(first: &str, second: &str) -> Self {
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }
}

/// Borrowed view of a title pair, so lookups need no allocation.
///
/// Hashing and equality must agree with the derived impls on [`TitlePair`].
pub trait PairKey {
    fn pair(&self) -> (&str, &str);
}

impl PairKey for TitlePair {
    fn pair(&self) -> (&str, &str) {
        (&self.first, &self.second)
    }
}

impl PairKey for (&str, &str) {
    fn pair(&self) -> (&str, &str) {
        (self.0, self.1)
    }
}

impl<'a> Borrow<dyn PairKey + 'a> for TitlePair {
    fn borrow(&self) -> &(dyn PairKey + 'a) {
        self
    }
}

impl Hash for dyn PairKey + '_ {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // same field order as the derived `Hash` of `TitlePair`
        let (first, second) = self.pair();
        first.hash(state);
        second.hash(state);
    }
}

impl PartialEq for dyn PairKey + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.pair() == other.pair()
    }
}

impl Eq for dyn PairKey + '_ {}

/// Bounded [0, 1] similarity between two normalized titles
pub trait LexicalScorer: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, a: &str, b: &str) -> f64;
}

/// Token-set fuzzy ratio
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSetScorer;

impl LexicalScorer for TokenSetScorer {
    fn name(&self) -> &'static str {
        LexicalBackend::TokenSet.as_str()
    }

    fn score(&self, a: &str, b: &str) -> f64 {
        token_set_ratio(a, b)
    }
}

/// `jaccard_weight * token_jaccard + sequence_weight * sequence_ratio`
#[derive(Debug, Clone, Copy)]
pub struct JaccardSequenceScorer {
    pub jaccard_weight: f64,
    pub sequence_weight: f64,
}

impl Default for JaccardSequenceScorer {
    fn default() -> Self {
        Self {
            jaccard_weight: 0.6,
            sequence_weight: 0.4,
        }
    }
}

impl LexicalScorer for JaccardSequenceScorer {
    fn name(&self) -> &'static str {
        LexicalBackend::JaccardSequence.as_str()
    }

    fn score(&self, a: &str, b: &str) -> f64 {
        let has_tokens = |s: &str| s.split_whitespace().next().is_some();
        if !has_tokens(a) && !has_tokens(b) {
            return 1.0;
        }
        self.jaccard_weight * jaccard_tokens(a, b) + self.sequence_weight * sequence_ratio(a, b)
    }
}

/// Build the scorer selected by `config.lexical_backend`
pub fn scorer_for(config: &MatcherConfig) -> Box<dyn LexicalScorer> {
    match config.lexical_backend {
        LexicalBackend::TokenSet => Box::new(TokenSetScorer),
        LexicalBackend::JaccardSequence => Box::new(JaccardSequenceScorer {
            jaccard_weight: config.jaccard_weight,
            sequence_weight: config.sequence_weight,
        }),
    }
}

/// Wraps a scorer with a bounded memo table owned by the caller
pub struct CachedScorer<'a> {
    inner: &'a dyn LexicalScorer,
    cache: &'a PairCache,
}

impl<'a> CachedScorer<'a> {
    pub fn new(inner: &'a dyn LexicalScorer, cache: &'a PairCache) -> Self {
        Self { inner, cache }
    }
}

impl LexicalScorer for CachedScorer<'_> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn score(&self, a: &str, b: &str) -> f64 {
        if let Some(score) = self.cache.get(&(a, b) as &dyn PairKey) {
            return score;
        }
        let score = self.inner.score(a, b);
        self.cache.insert(TitlePair::new(a, b), score);
        score
    }
}
