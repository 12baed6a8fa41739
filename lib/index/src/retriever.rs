//! Coarse candidate retrieval
//!
//! Narrows the all-pairs comparison down to the `top_k` most promising catalog
//! entries per incoming title. The strategy is chosen once by
//! [`build_retriever`]; the pipeline only sees [`CoarseRetriever`].

use crate::posting::PostingMatrix;
use crate::vectorizer::{Analyzer, TfIdfVectorizer};
use ahash::AHashSet;
use dupfind_core::{CandidateMatch, CoarseBackend, Error, MatcherConfig, Result, SparseVector};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Produces ranked catalog candidates for each incoming title
pub trait CoarseRetriever: Send + Sync {
    fn backend(&self) -> CoarseBackend;

    fn catalog_len(&self) -> usize;

    fn incoming_len(&self) -> usize;

    /// Up to `top_k` candidates for one incoming item, best first, ties by
    /// ascending catalog index.
    fn candidates(&self, incoming_index: usize, top_k: usize) -> Result<Vec<CandidateMatch>>;

    /// Candidates for every incoming item, in incoming order
    fn candidates_batch(&self, top_k: usize, parallel: bool) -> Result<Vec<Vec<CandidateMatch>>> {
        if parallel {
            (0..self.incoming_len())
                .into_par_iter()
                .map(|i| self.candidates(i, top_k))
                .collect()
        } else {
            (0..self.incoming_len())
                .map(|i| self.candidates(i, top_k))
                .collect()
        }
    }
}

/// The `k` best scores (k clamped to `scores.len()`), descending, ties broken
/// by ascending index.
pub fn top_k_desc(scores: &[f64], k: usize) -> Vec<CandidateMatch> {
    let k = k.min(scores.len());
    if k == 0 {
        return Vec::new();
    }
    let order = |a: &usize, b: &usize| scores[*b].total_cmp(&scores[*a]).then(a.cmp(b));

    let mut idx: Vec<usize> = (0..scores.len()).collect();
    if k < idx.len() {
        idx.select_nth_unstable_by(k - 1, order);
        idx.truncate(k);
    }
    idx.sort_unstable_by(order);
    idx.into_iter()
        .map(|i| CandidateMatch::new(i, scores[i]))
        .collect()
}

fn check_finite(incoming_index: usize, scores: &[f64]) -> Result<()> {
    match scores.iter().position(|s| !s.is_finite()) {
        Some(j) => Err(Error::Retrieval(format!(
            "non-finite similarity {} between incoming item {} and catalog item {}",
            scores[j], incoming_index, j
        ))),
        None => Ok(()),
    }
}

/// Cosine similarity over TF-IDF vectors fitted jointly on catalog and incoming titles
#[derive(Debug, Clone)]
pub struct VectorCoarseRetriever {
    vectorizer: TfIdfVectorizer,
    catalog: PostingMatrix,
    incoming: Vec<SparseVector>,
}

impl VectorCoarseRetriever {
    /// Fit on character n-grams; if that fails, refit on word n-grams.
    ///
    /// # Errors
    /// [`Error::Vectorization`] when both fits fail.
    pub fn build<S: AsRef<str>>(
        catalog: &[S],
        incoming: &[S],
        char_ngram_range: (usize, usize),
        word_ngram_range: (usize, usize),
    ) -> Result<Self> {
        let corpus: Vec<&str> = catalog
            .iter()
            .chain(incoming.iter())
            .map(|s| s.as_ref())
            .collect();

        let char_analyzer = Analyzer::CharWordBounded {
            min_n: char_ngram_range.0,
            max_n: char_ngram_range.1,
        };
        let vectorizer = match TfIdfVectorizer::fit(char_analyzer, &corpus) {
            Ok(v) => v,
            Err(e) => {
                warn!("Character n-gram fit failed ({}), falling back to word n-grams", e);
                let word_analyzer = Analyzer::Word {
                    min_n: word_ngram_range.0,
                    max_n: word_ngram_range.1,
                };
                TfIdfVectorizer::fit(word_analyzer, &corpus)?
            }
        };
        debug!(
            "Fitted {} vectorizer: {} features over {} documents",
            vectorizer.analyzer().name(),
            vectorizer.vocabulary_len(),
            corpus.len()
        );

        let catalog_vectors = vectorizer.transform_all(catalog);
        let incoming = vectorizer.transform_all(incoming);
        Ok(Self {
            vectorizer,
            catalog: PostingMatrix::new(&catalog_vectors),
            incoming,
        })
    }

    pub fn analyzer(&self) -> Analyzer {
        self.vectorizer.analyzer()
    }

    fn row(&self, incoming_index: usize) -> Result<Vec<f64>> {
        let query = self.incoming.get(incoming_index).ok_or_else(|| {
            Error::Retrieval(format!(
                "incoming index {} outside {} indexed items",
                incoming_index,
                self.incoming.len()
            ))
        })?;
        Ok(self.catalog.dot_all(query))
    }

    /// Cosine similarity of every incoming item (rows) against every catalog item (columns)
    pub fn similarity_matrix(&self, parallel: bool) -> Result<Vec<Vec<f64>>> {
        if parallel {
            (0..self.incoming.len())
                .into_par_iter()
                .map(|i| self.row(i))
                .collect()
        } else {
            (0..self.incoming.len()).map(|i| self.row(i)).collect()
        }
    }
}

impl CoarseRetriever for VectorCoarseRetriever {
    fn backend(&self) -> CoarseBackend {
        CoarseBackend::Tfidf
    }

    fn catalog_len(&self) -> usize {
        self.catalog.n_docs()
    }

    fn incoming_len(&self) -> usize {
        self.incoming.len()
    }

    fn candidates(&self, incoming_index: usize, top_k: usize) -> Result<Vec<CandidateMatch>> {
        let scores = self.row(incoming_index)?;
        check_finite(incoming_index, &scores)?;
        Ok(top_k_desc(&scores, top_k))
    }

    fn candidates_batch(&self, top_k: usize, parallel: bool) -> Result<Vec<Vec<CandidateMatch>>> {
        let matrix = self.similarity_matrix(parallel)?;
        matrix
            .iter()
            .enumerate()
            .map(|(i, scores)| {
                check_finite(i, scores)?;
                Ok(top_k_desc(scores, top_k))
            })
            .collect()
    }
}

/// Jaccard overlap of token sets, compared against every catalog item
#[derive(Debug, Clone)]
pub struct TokenOverlapCoarseRetriever {
    catalog_tokens: Vec<AHashSet<String>>,
    incoming_tokens: Vec<AHashSet<String>>,
}

fn token_set(title: &str) -> AHashSet<String> {
    title.split_whitespace().map(str::to_string).collect()
}

impl TokenOverlapCoarseRetriever {
    pub fn build<S: AsRef<str>>(catalog: &[S], incoming: &[S]) -> Self {
        Self {
            catalog_tokens: catalog.iter().map(|s| token_set(s.as_ref())).collect(),
            incoming_tokens: incoming.iter().map(|s| token_set(s.as_ref())).collect(),
        }
    }
}

impl CoarseRetriever for TokenOverlapCoarseRetriever {
    fn backend(&self) -> CoarseBackend {
        CoarseBackend::TokenOverlap
    }

    fn catalog_len(&self) -> usize {
        self.catalog_tokens.len()
    }

    fn incoming_len(&self) -> usize {
        self.incoming_tokens.len()
    }

    fn candidates(&self, incoming_index: usize, top_k: usize) -> Result<Vec<CandidateMatch>> {
        let query = self.incoming_tokens.get(incoming_index).ok_or_else(|| {
            Error::Retrieval(format!(
                "incoming index {} outside {} indexed items",
                incoming_index,
                self.incoming_tokens.len()
            ))
        })?;
        let scores: Vec<f64> = self
            .catalog_tokens
            .iter()
            .map(|tokens| {
                let shared = query.intersection(tokens).count();
                let union = query.len() + tokens.len() - shared;
                shared as f64 / union.max(1) as f64
            })
            .collect();
        Ok(top_k_desc(&scores, top_k))
    }
}

/// Build the retriever selected by `config.coarse_backend` over the given
/// normalized titles.
pub fn build_retriever<S: AsRef<str>>(
    config: &MatcherConfig,
    catalog: &[S],
    incoming: &[S],
) -> Result<Box<dyn CoarseRetriever>> {
    let retriever: Box<dyn CoarseRetriever> = match config.coarse_backend {
        CoarseBackend::Tfidf => Box::new(VectorCoarseRetriever::build(
            catalog,
            incoming,
            config.char_ngram_range,
            config.word_ngram_range,
        )?),
        CoarseBackend::TokenOverlap => {
            Box::new(TokenOverlapCoarseRetriever::build(catalog, incoming))
        }
    };
    info!(
        "Coarse index ready: backend={}, catalog={}, incoming={}",
        retriever.backend().as_str(),
        retriever.catalog_len(),
        retriever.incoming_len()
    );
    Ok(retriever)
}
