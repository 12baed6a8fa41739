//! Duplicate-finding pipeline
//!
//! `loaded -> normalized -> indexed -> retrieved -> scored -> filtered -> reported`
//!
//! The coarse index is built once per run and only read afterwards, so the
//! per-item stages can run on the rayon pool. The two memo caches are owned by
//! the [`DuplicateFinder`] and survive across runs.

use dupfind_core::{
    BoundedCache, CacheStats, CandidateMatch, Error, Item, MatchReport, MatcherConfig,
    NormalizedItem, ReportMap, Result, ScoredMatch, Stage, TextNormalizer,
};
use dupfind_index::build_retriever;
use dupfind_similarity::{scorer_for, CachedScorer, LexicalScorer, PairCache, Reranker};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Counters collected over one run.
///
/// Cache hits and misses count only lookups made during the run, while the
/// cache sizes are those at its end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub catalog_items: usize,
    pub incoming_items: usize,
    /// Titles whose normalization came out empty and used the fallback rule
    pub degenerate_titles: usize,
    pub candidates_scored: usize,
    pub matches_accepted: usize,
    /// `None` when no index was built (one of the collections was empty)
    pub coarse_backend: Option<&'static str>,
    pub lexical_backend: &'static str,
    pub normalize_cache: CacheStats,
    pub lexical_cache: CacheStats,
}

/// Result of [`DuplicateFinder::run`]
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub report: ReportMap,
    pub stats: RunStats,
}

/// Matches incoming product titles against a catalog
pub struct DuplicateFinder {
    config: MatcherConfig,
    normalizer: TextNormalizer,
    scorer: Box<dyn LexicalScorer>,
    reranker: Reranker,
    normalize_cache: BoundedCache<String, String>,
    lexical_cache: PairCache,
}

impl DuplicateFinder {
    /// Validate the configuration and compile the normalization tables.
    pub fn new(config: MatcherConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = TextNormalizer::from_config(&config)?;
        let scorer = scorer_for(&config);
        let reranker = Reranker::from_config(&config);
        let normalize_cache = BoundedCache::new(config.normalize_cache_capacity);
        let lexical_cache = PairCache::new(config.lexical_cache_capacity);

        Ok(Self {
            config,
            normalizer,
            scorer,
            reranker,
            normalize_cache,
            lexical_cache,
        })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    /// Normalize one raw title through the shared cache
    pub fn normalize(&self, raw: &str) -> String {
        self.normalizer.normalize_cached(raw, &self.normalize_cache)
    }

    /// Cached lexical score of two normalized titles
    pub fn lexical_score(&self, a: &str, b: &str) -> f64 {
        CachedScorer::new(self.scorer.as_ref(), &self.lexical_cache).score(a, b)
    }

    /// Normalize a collection, returning the items and how many hit the
    /// empty-result fallback.
    pub fn normalize_all(&self, items: &[Item]) -> (Vec<NormalizedItem>, usize) {
        let normalize = |item: &Item| {
            let (normalized, degenerate) =
                self.normalizer.normalize_item(item, &self.normalize_cache);
            if degenerate {
                debug!(
                    id = %item.id,
                    fallback = %normalized.normalized_title,
                    "Normalization came out empty, using raw tokens"
                );
            }
            (normalized, degenerate)
        };

        let pairs: Vec<(NormalizedItem, bool)> = if self.config.parallel {
            items.par_iter().map(normalize).collect()
        } else {
            items.iter().map(normalize).collect()
        };

        let degenerate = pairs.iter().filter(|(_, d)| *d).count();
        (pairs.into_iter().map(|(item, _)| item).collect(), degenerate)
    }

    /// Run the full pipeline over a catalog and an incoming collection.
    ///
    /// Every incoming id gets exactly one report, with an empty match list
    /// when nothing passes the threshold.
    ///
    /// # Errors
    /// Any failure aborts the run and carries the stage it happened in
    /// (see [`Error::stage`]).
    pub fn run(&self, catalog: &[Item], incoming: &[Item]) -> Result<RunOutput> {
        let started = Instant::now();
        let normalize_start = self.normalize_cache.stats();
        let lexical_start = self.lexical_cache.stats();
        let mut stats = RunStats {
            catalog_items: catalog.len(),
            incoming_items: incoming.len(),
            lexical_backend: self.scorer.name(),
            ..Default::default()
        };

        if catalog.is_empty() {
            warn!("Catalog is empty, every incoming item will have no matches");
        }
        if incoming.is_empty() {
            warn!("Incoming collection is empty, the report will be empty");
        }

        // normalized
        let stage_start = Instant::now();
        let (catalog_norm, catalog_degenerate) = self.normalize_all(catalog);
        let (incoming_norm, incoming_degenerate) = self.normalize_all(incoming);
        stats.degenerate_titles = catalog_degenerate + incoming_degenerate;
        debug!(
            stage = %Stage::Normalized,
            elapsed_ms = stage_start.elapsed().as_millis() as u64,
            degenerate = stats.degenerate_titles,
            "Stage complete"
        );

        // indexed + retrieved
        let candidates = if catalog.is_empty() || incoming.is_empty() {
            vec![Vec::new(); incoming.len()]
        } else {
            let stage_start = Instant::now();
            let catalog_titles: Vec<&str> = catalog_norm
                .iter()
                .map(|i| i.normalized_title.as_str())
                .collect();
            let incoming_titles: Vec<&str> = incoming_norm
                .iter()
                .map(|i| i.normalized_title.as_str())
                .collect();
            let retriever = build_retriever(&self.config, &catalog_titles, &incoming_titles)
                .map_err(|e| e.at(Stage::Indexed))?;
            stats.coarse_backend = Some(retriever.backend().as_str());
            debug!(
                stage = %Stage::Indexed,
                elapsed_ms = stage_start.elapsed().as_millis() as u64,
                "Stage complete"
            );

            let stage_start = Instant::now();
            let candidates = retriever
                .candidates_batch(self.config.top_k, self.config.parallel)
                .map_err(|e| e.at(Stage::Retrieved))?;
            debug!(
                stage = %Stage::Retrieved,
                elapsed_ms = stage_start.elapsed().as_millis() as u64,
                "Stage complete"
            );
            candidates
        };
        stats.candidates_scored = candidates.iter().map(Vec::len).sum();

        // scored + filtered
        let stage_start = Instant::now();
        let matches = self
            .score_all(&incoming_norm, &candidates, &catalog_norm)
            .map_err(|e| e.at(Stage::Scored))?;
        stats.matches_accepted = matches.iter().map(Vec::len).sum();
        debug!(
            stage = %Stage::Filtered,
            elapsed_ms = stage_start.elapsed().as_millis() as u64,
            candidates = stats.candidates_scored,
            accepted = stats.matches_accepted,
            "Stage complete"
        );

        // reported
        let mut report = ReportMap::with_capacity(incoming_norm.len());
        for (item, matches) in incoming_norm.into_iter().zip(matches) {
            let replaced = report.insert(
                item.id,
                MatchReport {
                    incoming_title: item.raw_title,
                    incoming_normalized: item.normalized_title,
                    matches,
                },
            );
            if replaced.is_some() {
                debug!("Duplicate incoming id, keeping the later report");
            }
        }

        stats.normalize_cache = self.normalize_cache.stats().since(&normalize_start);
        stats.lexical_cache = self.lexical_cache.stats().since(&lexical_start);
        debug!(
            normalize_hits = stats.normalize_cache.hits,
            normalize_misses = stats.normalize_cache.misses,
            lexical_hits = stats.lexical_cache.hits,
            lexical_misses = stats.lexical_cache.misses,
            "Cache statistics"
        );
        info!(
            "Run finished in {:?}: {} incoming, {} catalog, {} matches",
            started.elapsed(),
            stats.incoming_items,
            stats.catalog_items,
            stats.matches_accepted
        );

        Ok(RunOutput { report, stats })
    }

    fn score_all(
        &self,
        incoming: &[NormalizedItem],
        candidates: &[Vec<CandidateMatch>],
        catalog: &[NormalizedItem],
    ) -> Result<Vec<Vec<ScoredMatch>>> {
        if incoming.len() != candidates.len() {
            return Err(Error::Retrieval(format!(
                "{} candidate lists for {} incoming items",
                candidates.len(),
                incoming.len()
            )));
        }

        let scorer = CachedScorer::new(self.scorer.as_ref(), &self.lexical_cache);
        let score_one = |(item, candidates): (&NormalizedItem, &Vec<CandidateMatch>)| {
            self.reranker
                .rerank(&scorer, &item.normalized_title, candidates, catalog)
        };

        if self.config.parallel {
            incoming
                .par_iter()
                .zip(candidates.par_iter())
                .map(score_one)
                .collect()
        } else {
            incoming.iter().zip(candidates.iter()).map(score_one).collect()
        }
    }
}

impl std::fmt::Debug for DuplicateFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateFinder")
            .field("config", &self.config)
            .field("lexical_backend", &self.scorer.name())
            .field("normalize_cache", &self.normalize_cache)
            .field("lexical_cache", &self.lexical_cache)
            .finish()
    }
}
