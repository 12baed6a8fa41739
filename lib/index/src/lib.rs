//! # dupfind Index
//!
//! Coarse candidate retrieval (blocking) for the duplicate finder.
//!
//! - [`TfIdfVectorizer`] - Smoothed TF-IDF over word-bounded character n-grams or word n-grams
//! - [`PostingMatrix`] - Inverted catalog vectors for one-pass similarity against all items
//! - [`CoarseRetriever`] - Strategy interface, with [`VectorCoarseRetriever`] and
//!   [`TokenOverlapCoarseRetriever`] implementations chosen by [`build_retriever`]
//!
//! ## Example
//!
//! ```rust
//! use dupfind_core::MatcherConfig;
//! use dupfind_index::{build_retriever, CoarseRetriever};
//!
//! let catalog = vec!["xiaomi note 8 gb".to_string(), "robot vacuum".to_string()];
//! let incoming = vec!["xiaomi note 8 gb blue".to_string()];
//!
//! let retriever = build_retriever(&MatcherConfig::default(), &catalog, &incoming).unwrap();
//! let candidates = retriever.candidates_batch(12, false).unwrap();
//! assert_eq!(candidates[0][0].catalog_index, 0);
//! // top_k larger than the catalog is clamped
//! assert_eq!(candidates[0].len(), 2);
//! ```

pub mod posting;
pub mod retriever;
pub mod vectorizer;

pub use posting::PostingMatrix;
pub use retriever::{
    build_retriever, top_k_desc, CoarseRetriever, TokenOverlapCoarseRetriever,
    VectorCoarseRetriever,
};
pub use vectorizer::{Analyzer, TfIdfVectorizer};
