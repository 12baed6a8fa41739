//! # dupfind
//!
//! Fuzzy product-duplicate finder for noisy, mixed Cyrillic/Latin titles.
//!
//! Incoming titles are matched against a catalog in two stages: a cheap
//! coarse retrieval (TF-IDF cosine over character n-grams, or token overlap)
//! narrows each item to its top-k candidates, then an exact lexical scorer
//! re-ranks them. Coarse and lexical scores are fused and thresholded.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! dupfind --catalog catalog.tsv --incoming incoming.tsv --output report.json
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use dupfind::prelude::*;
//!
//! let finder = DuplicateFinder::new(MatcherConfig::default()).unwrap();
//! let catalog = vec![Item::new("1001", "Смартфон Xiaomi Note 6.1\" 8/128GB синий")];
//! let incoming = vec![Item::new("2001", "смартфон xiaomi note 6.1 8 128gb синий")];
//!
//! let output = finder.run(&catalog, &incoming).unwrap();
//! let report = output.report.get("2001").unwrap();
//! assert_eq!(report.matches[0].catalog_id, "1001");
//! ```
//!
//! ## Crate Structure
//!
//! - `dupfind-core` - Configuration, errors, data model, normalizer, caches, sparse vectors
//! - `dupfind-similarity` - String distances, lexical scorers, score fusion
//! - `dupfind-index` - TF-IDF vectorizer and coarse retrievers
//! - `dupfind-storage` - Tab-separated loader and JSON report writer

pub mod pipeline;

pub use pipeline::{DuplicateFinder, RunOutput, RunStats};

// Re-export core types
pub use dupfind_core::{
    CoarseBackend, Error, Item, LexicalBackend, MatchReport, MatcherConfig, NormalizedItem,
    ReportMap, Result, ScoredMatch, Stage, TextNormalizer,
};

// Re-export storage
pub use dupfind_storage::{load_tab_file, write_report};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        load_tab_file, write_report, CoarseBackend, DuplicateFinder, Error, Item,
        LexicalBackend, MatchReport, MatcherConfig, ReportMap, Result, RunOutput, RunStats,
        ScoredMatch, Stage,
    };
}
