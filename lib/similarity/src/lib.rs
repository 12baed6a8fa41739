//! # dupfind Similarity
//!
//! Fine-grained scoring of coarse candidates.
//!
//! - **Distances**: token Jaccard, indel ratio, token-set ratio, Ratcliff/Obershelp sequence ratio
//! - **Lexical scorers**: pluggable [`LexicalScorer`] strategies with a memoizing wrapper
//! - **Reranking**: fusion of lexical and coarse scores, threshold decision, ordering
//!
//! ## Example
//!
//! ```rust
//! use dupfind_core::{CandidateMatch, MatcherConfig, NormalizedItem};
//! use dupfind_similarity::{scorer_for, Reranker};
//!
//! let config = MatcherConfig::default();
//! let scorer = scorer_for(&config);
//! let reranker = Reranker::from_config(&config);
//!
//! let catalog = vec![NormalizedItem {
//!     id: "1001".to_string(),
//!     raw_title: "Xiaomi Note 8GB".to_string(),
//!     normalized_title: "xiaomi note 8 gb".to_string(),
//! }];
//! let matches = reranker
//!     .rerank(scorer.as_ref(), "xiaomi note 8 gb", &[CandidateMatch::new(0, 0.9)], &catalog)
//!     .unwrap();
//! assert_eq!(matches[0].catalog_id, "1001");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Candidates │────>│   Lexical   │────>│  Reranker   │
//! │ (coarse)    │     │   scorer    │     │ (fuse, cut) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                    │
//!                     ┌─────────────┐      ┌─────────────┐
//!                     │  PairCache  │      │ ScoredMatch │
//!                     └─────────────┘      └─────────────┘
//! ```

pub mod distance;
pub mod lexical;
pub mod rerank;

pub use distance::{indel_distance, jaccard_sets, jaccard_tokens, sequence_ratio, token_set_ratio};
pub use lexical::{scorer_for, CachedScorer, JaccardSequenceScorer, LexicalScorer, PairCache, PairKey, TitlePair, TokenSetScorer};
pub use rerank::{FusedScore, Reranker};
