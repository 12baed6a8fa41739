//! # dupfind Core
//!
//! Core library for the dupfind product-duplicate finder.
//!
//! This crate provides the shared building blocks used by every other crate:
//!
//! - [`MatcherConfig`] - Immutable run-wide configuration and lookup tables
//! - [`TextNormalizer`] - Canonicalizes noisy product titles
//! - [`BoundedCache`] - Thread-safe LRU memoization cache
//! - [`SparseVector`] - Sparse weighted feature vector with cosine similarity
//! - [`Item`], [`MatchReport`], [`ReportMap`] - Input and output data model
//!
//! ## Example
//!
//! ```rust
//! use dupfind_core::{BoundedCache, MatcherConfig, TextNormalizer};
//!
//! let config = MatcherConfig::default();
//! let normalizer = TextNormalizer::from_config(&config).unwrap();
//! let cache = BoundedCache::new(config.normalize_cache_capacity);
//!
//! assert_eq!(normalizer.normalize_cached("Смартфон Xiaomi 8ГБ", &cache), "xiaomi 8 gb");
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod item;
pub mod normalize;
pub mod report;
pub mod sparse;

pub use cache::{BoundedCache, CacheStats};
pub use config::{CoarseBackend, LexicalBackend, MatcherConfig, NormalizationTables};
pub use error::{Error, Result, Stage};
pub use item::{CandidateMatch, Item, MatchReport, NormalizedItem, ScoredMatch};
pub use normalize::{TextNormalizer, EMPTY_TITLE_SENTINEL};
pub use report::ReportMap;
pub use sparse::SparseVector;

/// Round a score to 4 decimal digits for reporting.
///
/// Rounds the exact binary value, matching Python's `round(x, 4)`.
pub fn round4(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.4}", value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round4() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round4(0.8), 0.8);
        assert_eq!(round4(0.79994), 0.7999);
        assert_eq!(round4(1.0), 1.0);
    }

    #[test]
    fn test_round4_uses_exact_value() {
        // just below the half in the fifth decimal
        assert_eq!(round4(0.9987499999999999), 0.9987);
        assert_eq!(round4(0.12344999999999999), 0.1234);
        assert_eq!(round4(0.0), 0.0);
        assert!(round4(f64::NAN).is_nan());
    }
}
