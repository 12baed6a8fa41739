//! Run-wide matcher configuration
//!
//! A [`MatcherConfig`] is built once at startup (defaults, optionally a JSON
//! file, then CLI overrides) and shared read-only by every component.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Coarse retrieval strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoarseBackend {
    /// TF-IDF weighted n-gram vectors compared by cosine similarity
    #[default]
    Tfidf,
    /// Jaccard overlap of normalized token sets
    TokenOverlap,
}

impl CoarseBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoarseBackend::Tfidf => "tfidf",
            CoarseBackend::TokenOverlap => "token_overlap",
        }
    }
}

impl FromStr for CoarseBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tfidf" => Ok(CoarseBackend::Tfidf),
            "token_overlap" | "token-overlap" => Ok(CoarseBackend::TokenOverlap),
            other => Err(format!("unknown coarse backend: {}", other)),
        }
    }
}

/// Lexical scoring strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LexicalBackend {
    /// Indel ratio over sorted unique token sets
    #[default]
    TokenSet,
    /// Weighted token Jaccard plus character sequence ratio
    JaccardSequence,
}

impl LexicalBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            LexicalBackend::TokenSet => "token_set",
            LexicalBackend::JaccardSequence => "jaccard_sequence",
        }
    }
}

impl FromStr for LexicalBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "token_set" | "token-set" => Ok(LexicalBackend::TokenSet),
            "jaccard_sequence" | "jaccard-sequence" => Ok(LexicalBackend::JaccardSequence),
            other => Err(format!("unknown lexical backend: {}", other)),
        }
    }
}

/// Lookup tables used by the text normalizer.
///
/// Each table is an ordered list of `(from, to)` pairs. Order matters: earlier
/// entries are applied first (`робот-пылесос` must run before `пылесос`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationTables {
    pub units: Vec<(String, String)>,
    pub generic_words: Vec<(String, String)>,
    pub colors: Vec<(String, String)>,
    pub brand_fixes: Vec<(String, String)>,
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for NormalizationTables {
    fn default() -> Self {
        Self {
            units: pairs(&[
                ("гб", "gb"),
                ("гигабайт", "gb"),
                ("гбайт", "gb"),
                ("мб", "mb"),
                ("мм", "mm"),
                ("дюйм", "inch"),
                ("дюйма", "inch"),
            ]),
            generic_words: pairs(&[
                ("телефон", ""),
                ("смартфон", ""),
                ("планшет", ""),
                ("робот-пылесос", "robot vacuum"),
                ("пылесос", "vacuum"),
            ]),
            colors: pairs(&[
                ("черный", "black"),
                ("белый", "white"),
                ("синий", "blue"),
                ("красный", "red"),
                ("зеленый", "green"),
                ("желтый", "yellow"),
                ("розовый", "pink"),
                ("фиолетовый", "purple"),
                ("серый", "gray"),
                ("золотой", "gold"),
                ("серебристый", "silver"),
                ("black", "black"),
                ("white", "white"),
                ("blue", "blue"),
                ("red", "red"),
                ("green", "green"),
                ("yellow", "yellow"),
                ("pink", "pink"),
                ("purple", "purple"),
                ("gray", "gray"),
                ("gold", "gold"),
                ("silver", "silver"),
            ]),
            brand_fixes: pairs(&[("huawei", "huawei"), ("huaweI", "huawei")]),
        }
    }
}

/// Configuration for a duplicate-finding run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Inclusive lower bound on the combined score of a reported match
    pub similarity_threshold: f64,
    /// Candidates retrieved per incoming item
    pub top_k: usize,
    /// Character n-gram lengths for the TF-IDF fit (inclusive)
    pub char_ngram_range: (usize, usize),
    /// Word n-gram lengths used when the character fit fails (inclusive)
    pub word_ngram_range: (usize, usize),
    /// Run titles through the normalizer; when off titles are compared as-is
    pub normalize: bool,
    pub lexical_weight: f64,
    pub coarse_weight: f64,
    pub jaccard_weight: f64,
    pub sequence_weight: f64,
    pub normalize_cache_capacity: usize,
    pub lexical_cache_capacity: usize,
    pub coarse_backend: CoarseBackend,
    pub lexical_backend: LexicalBackend,
    /// Spread retrieval and scoring across the rayon thread pool
    pub parallel: bool,
    pub tables: NormalizationTables,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.80,
            top_k: 12,
            char_ngram_range: (2, 5),
            word_ngram_range: (1, 2),
            normalize: true,
            lexical_weight: 0.6,
            coarse_weight: 0.4,
            jaccard_weight: 0.6,
            sequence_weight: 0.4,
            normalize_cache_capacity: 10_000,
            lexical_cache_capacity: 50_000,
            coarse_backend: CoarseBackend::default(),
            lexical_backend: LexicalBackend::default(),
            parallel: true,
            tables: NormalizationTables::default(),
        }
    }
}

impl MatcherConfig {
    /// Read a (possibly partial) JSON config file; missing keys take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: MatcherConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::InvalidConfig(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be positive".to_string()));
        }
        for (name, (lo, hi)) in [
            ("char_ngram_range", self.char_ngram_range),
            ("word_ngram_range", self.word_ngram_range),
        ] {
            if lo == 0 || lo > hi {
                return Err(Error::InvalidConfig(format!(
                    "{} must satisfy 1 <= min <= max, got ({}, {})",
                    name, lo, hi
                )));
            }
        }
        for (name, weight) in [
            ("lexical_weight", self.lexical_weight),
            ("coarse_weight", self.coarse_weight),
            ("jaccard_weight", self.jaccard_weight),
            ("sequence_weight", self.sequence_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        if self.normalize_cache_capacity == 0 || self.lexical_cache_capacity == 0 {
            return Err(Error::InvalidConfig(
                "cache capacities must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
