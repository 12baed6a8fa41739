// Column-oriented storage of the catalog vectors for batched similarity
use dupfind_core::SparseVector;

/// Inverted view of a set of sparse document vectors:
/// feature -> [(document, weight)].
///
/// Multiplying a query vector against it yields the dot product with every
/// document at once, touching only features the query actually has.
#[derive(Debug, Clone, Default)]
pub struct PostingMatrix {
    postings: Vec<Vec<(u32, f64)>>,
    n_docs: usize,
}

impl PostingMatrix {
    pub fn new(docs: &[SparseVector]) -> Self {
        let n_features = docs
            .iter()
            .filter_map(|d| d.indices().last())
            .map(|&i| i as usize + 1)
            .max()
            .unwrap_or(0);

        let mut postings: Vec<Vec<(u32, f64)>> = vec![Vec::new(); n_features];
        for (doc_id, doc) in docs.iter().enumerate() {
            for (feature, weight) in doc.iter() {
                postings[feature as usize].push((doc_id as u32, weight));
            }
        }

        Self {
            postings,
            n_docs: docs.len(),
        }
    }

    #[inline]
    pub fn n_docs(&self) -> usize {
        self.n_docs
    }

    /// Dot product of `query` with every document, indexed by document
    pub fn dot_all(&self, query: &SparseVector) -> Vec<f64> {
        let mut scores = vec![0.0f64; self.n_docs];
        for (feature, q_weight) in query.iter() {
            if let Some(docs) = self.postings.get(feature as usize) {
                for &(doc_id, d_weight) in docs {
                    scores[doc_id as usize] += q_weight * d_weight;
                }
            }
        }
        scores
    }
}
