//! TF-IDF vectorizer over character or word n-grams
//!
//! Weighting follows the usual smoothed scheme:
//!
//! ```text
//! idf(t)    = ln((1 + n_docs) / (1 + df(t))) + 1
//! w(t, d)   = count(t, d) * idf(t)          then L2-normalized per document
//! ```
//!
//! Because every transformed vector has unit length, a plain dot product of
//! two vectors is their cosine similarity.

use ahash::AHashMap;
use dupfind_core::{Error, Result, SparseVector};

/// How a document is split into features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analyzer {
    /// Character n-grams taken inside each whitespace-separated word, the word
    /// padded with one space on each side
    CharWordBounded { min_n: usize, max_n: usize },
    /// Word n-grams over runs of alphanumeric characters
    Word { min_n: usize, max_n: usize },
}

impl Analyzer {
    pub fn name(&self) -> &'static str {
        match self {
            Analyzer::CharWordBounded { .. } => "char_wb",
            Analyzer::Word { .. } => "word",
        }
    }

    /// Extract the features of a document, duplicates included
    pub fn features(&self, doc: &str) -> Vec<String> {
        let lowered = doc.to_lowercase();
        match *self {
            Analyzer::CharWordBounded { min_n, max_n } => char_wb_ngrams(&lowered, min_n, max_n),
            Analyzer::Word { min_n, max_n } => word_ngrams(&lowered, min_n, max_n),
        }
    }
}

fn char_wb_ngrams(doc: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let mut grams = Vec::new();
    for word in doc.split_whitespace() {
        let padded: Vec<char> = std::iter::once(' ')
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        let len = padded.len();
        for n in min_n..=max_n {
            let mut offset = 0;
            grams.push(padded[offset..(offset + n).min(len)].iter().collect());
            while offset + n < len {
                offset += 1;
                grams.push(padded[offset..offset + n].iter().collect());
            }
            // a word shorter than n is emitted once, whole
            if offset == 0 {
                break;
            }
        }
    }
    grams
}

fn word_ngrams(doc: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let tokens: Vec<&str> = doc
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .collect();
    let mut grams = Vec::new();
    for n in min_n..=max_n {
        if n > tokens.len() {
            break;
        }
        grams.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
    grams
}

/// A TF-IDF model fitted on a fixed corpus
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    analyzer: Analyzer,
    vocabulary: AHashMap<String, u32>,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    /// Learn the vocabulary and document frequencies of `docs`.
    ///
    /// # Errors
    /// [`Error::Vectorization`] when the corpus yields no features at all.
    pub fn fit<S: AsRef<str>>(analyzer: Analyzer, docs: &[S]) -> Result<Self> {
        let mut vocabulary: AHashMap<String, u32> = AHashMap::new();
        let mut doc_freq: Vec<u32> = Vec::new();
        let mut seen: Vec<u32> = Vec::new();

        for (doc_idx, doc) in docs.iter().enumerate() {
            let doc_mark = doc_idx as u32 + 1;
            for feature in analyzer.features(doc.as_ref()) {
                let next_id = vocabulary.len() as u32;
                let id = *vocabulary.entry(feature).or_insert(next_id);
                if id == next_id {
                    doc_freq.push(0);
                    seen.push(0);
                }
                // count each feature once per document
                if seen[id as usize] != doc_mark {
                    seen[id as usize] = doc_mark;
                    doc_freq[id as usize] += 1;
                }
            }
        }

        if vocabulary.is_empty() {
            return Err(Error::Vectorization(format!(
                "empty vocabulary: {} documents produced no {} features",
                docs.len(),
                analyzer.name()
            )));
        }

        let n_docs = docs.len() as f64;
        let idf = doc_freq
            .iter()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Ok(Self {
            analyzer,
            vocabulary,
            idf,
        })
    }

    #[inline]
    pub fn analyzer(&self) -> Analyzer {
        self.analyzer
    }

    /// Number of distinct features learned by `fit`
    #[inline]
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Unit-length TF-IDF vector of a document; features outside the
    /// vocabulary are ignored.
    pub fn transform(&self, doc: &str) -> SparseVector {
        let pairs: Vec<(u32, f64)> = self
            .analyzer
            .features(doc)
            .iter()
            .filter_map(|f| self.vocabulary.get(f.as_str()))
            .map(|&id| (id, self.idf[id as usize]))
            .collect();
        SparseVector::from_pairs(pairs).normalized()
    }

    pub fn transform_all<S: AsRef<str>>(&self, docs: &[S]) -> Vec<SparseVector> {
        docs.iter().map(|d| self.transform(d.as_ref())).collect()
    }
}
