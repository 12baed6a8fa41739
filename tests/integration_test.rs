// Integration tests for dupfind
use dupfind::prelude::*;
use dupfind_core::{BoundedCache, CandidateMatch, NormalizedItem, TextNormalizer};
use dupfind_index::{build_retriever, CoarseRetriever};
use dupfind_similarity::{JaccardSequenceScorer, LexicalScorer, Reranker, TokenSetScorer};
use dupfind_storage::{decode_text, parse_records};
use std::io::Write;

const TITLES: &[&str] = &[
    "Смартфон Xiaomi Note 6.1\" 8/128GB синий",
    "смартфон xiaomi note 6.1 8 128gb синий",
    "Робот-пылесос Irbis X",
    "Смартфон Apple Pro",
    "тел.8гб",
    "Планшет Samsung Galaxy Tab S10+ 256 Гб серебристый",
    "Экран 15.6” 8 / 256",
    "“Galaxy S10+”",
    "Пылесос Dyson V11 ЧЕРНЫЙ",
    "  ",
    "",
    "iPhone13Pro 1ТБ",
];

fn items(pairs: &[(&str, &str)]) -> Vec<Item> {
    pairs.iter().map(|&(id, title)| Item::new(id, title)).collect()
}

fn sequential() -> MatcherConfig {
    MatcherConfig {
        parallel: false,
        ..Default::default()
    }
}

fn normalizer() -> TextNormalizer {
    TextNormalizer::from_config(&MatcherConfig::default()).unwrap()
}

/// Scores every pair with the same value
struct FixedScorer(f64);

impl LexicalScorer for FixedScorer {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn score(&self, _a: &str, _b: &str) -> f64 {
        self.0
    }
}

#[test]
fn test_normalization_is_idempotent() {
    let normalizer = normalizer();
    for title in TITLES {
        let once = normalizer.normalize(title);
        assert_eq!(normalizer.normalize(&once), once, "title {:?}", title);
    }
}

#[test]
fn test_normalized_item_never_empty() {
    let normalizer = normalizer();
    let cache = BoundedCache::new(64);
    for (i, title) in TITLES.iter().enumerate() {
        let (item, _) = normalizer.normalize_item(&Item::new(i.to_string(), *title), &cache);
        assert!(!item.normalized_title.trim().is_empty(), "title {:?}", title);
    }
}

#[test]
fn test_unit_canonicalization() {
    let normalizer = normalizer();
    let glued = normalizer.normalize("Смартфон Xiaomi 8ГБ");
    let spaced = normalizer.normalize("смартфон xiaomi 8 GB");

    let mut a: Vec<&str> = glued.split_whitespace().collect();
    let mut b: Vec<&str> = spaced.split_whitespace().collect();
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, b);
    assert!(a.contains(&"gb"));
}

#[test]
fn test_lexical_range_and_reflexivity() {
    let normalizer = normalizer();
    let normalized: Vec<String> = TITLES.iter().map(|t| normalizer.normalize(t)).collect();
    let scorers: [Box<dyn LexicalScorer>; 2] =
        [Box::new(TokenSetScorer), Box::new(JaccardSequenceScorer::default())];

    for scorer in &scorers {
        for a in &normalized {
            if !a.is_empty() {
                assert_eq!(scorer.score(a, a), 1.0, "{} on {:?}", scorer.name(), a);
            }
            for b in &normalized {
                let score = scorer.score(a, b);
                assert!((0.0..=1.0).contains(&score), "{} gave {}", scorer.name(), score);
            }
        }
    }
}

#[test]
fn test_fallback_scorer_empty_pair_is_match() {
    assert_eq!(JaccardSequenceScorer::default().score("", ""), 1.0);
}

#[test]
fn test_combined_score_range() {
    let reranker = Reranker::default();
    for lexical in [0.0, 0.25, 0.8, 1.0] {
        for coarse in [0.0, 0.5, 1.0] {
            let fused = reranker.combine(&FixedScorer(lexical), "a", "b", Some(coarse));
            assert!((0.0..=1.0).contains(&fused.combined));
        }
    }
}

#[test]
fn test_threshold_boundary_is_inclusive() {
    let reranker = Reranker::new(0.6, 0.4, 0.8);
    let catalog = vec![NormalizedItem {
        id: "1".to_string(),
        raw_title: "x".to_string(),
        normalized_title: "x".to_string(),
    }];

    let at = reranker
        .rerank(&FixedScorer(0.8), "x", &[CandidateMatch::new(0, 0.8)], &catalog)
        .unwrap();
    assert_eq!(at.len(), 1);
    assert_eq!(at[0].combined_score, 0.8);

    let below = reranker
        .rerank(&FixedScorer(0.7999), "x", &[CandidateMatch::new(0, 0.7999)], &catalog)
        .unwrap();
    assert!(below.is_empty());
}

#[test]
fn test_top_k_clamped_to_catalog() {
    let catalog = ["xiaomi note", "robot vacuum irbis x", "apple pro"];
    let incoming = ["xiaomi note 8 gb"];
    for backend in [CoarseBackend::Tfidf, CoarseBackend::TokenOverlap] {
        let config = MatcherConfig {
            coarse_backend: backend,
            ..Default::default()
        };
        let retriever = build_retriever(&config, &catalog, &incoming).unwrap();
        let candidates = retriever.candidates_batch(50, false).unwrap();
        assert_eq!(candidates[0].len(), 3, "{:?}", backend);
        assert_eq!(candidates[0][0].catalog_index, 0, "{:?}", backend);
    }
}

#[test]
fn test_report_is_complete() {
    let finder = DuplicateFinder::new(sequential()).unwrap();
    let catalog = items(&[("1001", "Робот-пылесос Irbis X")]);
    let incoming = items(&[
        ("2001", "Смартфон Apple Pro"),
        ("2002", "Ноутбук Lenovo"),
        ("2003", ""),
    ]);

    let output = finder.run(&catalog, &incoming).unwrap();
    assert_eq!(
        output.report.ids().collect::<Vec<_>>(),
        ["2001", "2002", "2003"]
    );
    for (_, report) in output.report.iter() {
        assert!(report.matches.is_empty());
    }
}

#[test]
fn test_end_to_end_positive() {
    let finder = DuplicateFinder::new(MatcherConfig::default()).unwrap();
    let catalog = items(&[("1001", "Смартфон Xiaomi Note 6.1\" 8/128GB синий")]);
    let incoming = items(&[("2001", "смартфон xiaomi note 6.1 8 128gb синий")]);

    let output = finder.run(&catalog, &incoming).unwrap();
    let report = output.report.get("2001").unwrap();
    assert_eq!(report.incoming_normalized, "xiaomi note 6 1 8 128 gb blue");
    assert_eq!(report.matches.len(), 1);

    let m = &report.matches[0];
    assert_eq!(m.catalog_id, "1001");
    assert_eq!(m.catalog_normalized, "xiaomi note 6 1 inch 8/128 gb blue");
    assert!(m.combined_score > 0.8, "combined {}", m.combined_score);
}

#[test]
fn test_end_to_end_negative() {
    let finder = DuplicateFinder::new(MatcherConfig::default()).unwrap();
    let catalog = items(&[("1001", "Робот-пылесос Irbis X")]);
    let incoming = items(&[("2001", "Смартфон Apple Pro")]);

    let output = finder.run(&catalog, &incoming).unwrap();
    assert!(output.report.get("2001").unwrap().matches.is_empty());
    assert_eq!(output.stats.candidates_scored, 1);
    assert_eq!(output.stats.matches_accepted, 0);
}

#[test]
fn test_disabled_normalization_compares_raw_titles() {
    let config = MatcherConfig {
        normalize: false,
        parallel: false,
        ..Default::default()
    };
    let finder = DuplicateFinder::new(config).unwrap();
    let catalog = items(&[("1", "Apple iPhone 13")]);
    let incoming = items(&[("a", "Apple iPhone 13")]);

    let output = finder.run(&catalog, &incoming).unwrap();
    let report = output.report.get("a").unwrap();
    assert_eq!(report.incoming_normalized, "Apple iPhone 13");
    assert_eq!(report.matches[0].combined_score, 1.0);
}

#[test]
fn test_matches_sorted_by_combined_score() {
    let finder = DuplicateFinder::new(sequential()).unwrap();
    let catalog = items(&[
        ("1", "Смартфон Xiaomi Note 8 128GB"),
        ("2", "Смартфон Xiaomi Note 8 128GB синий"),
        ("3", "Робот-пылесос Irbis X"),
    ]);
    let incoming = items(&[("a", "xiaomi note 8 128 gb синий")]);

    let output = finder.run(&catalog, &incoming).unwrap();
    let matches = &output.report.get("a").unwrap().matches;
    assert!(!matches.is_empty());
    assert_eq!(matches[0].catalog_id, "2");
    for pair in matches.windows(2) {
        assert!(pair[0].combined_score >= pair[1].combined_score);
    }
}

#[test]
fn test_caches_are_reused_across_runs() {
    let finder = DuplicateFinder::new(sequential()).unwrap();
    let catalog = items(&[("1", "Смартфон Xiaomi 8ГБ")]);
    let incoming = items(&[("a", "смартфон xiaomi 8 GB")]);

    let first = finder.run(&catalog, &incoming).unwrap();
    let second = finder.run(&catalog, &incoming).unwrap();
    assert_eq!(first.report, second.report);
    assert!(second.stats.normalize_cache.hits >= 2);
    assert!(second.stats.lexical_cache.hits >= 1);
}

#[test]
fn test_loader_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("catalog.txt");
    let mut file = std::fs::File::create(&catalog_path).unwrap();
    file.write_all("1001\tСмартфон Xiaomi Note 6.1\" 8/128GB синий\n\n1002  Робот-пылесос Irbis X\nbroken\n".as_bytes())
        .unwrap();

    let catalog = load_tab_file(&catalog_path).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog[1].id, "1002");
    assert_eq!(catalog[1].raw_title, "Робот-пылесос Irbis X");
}

#[test]
fn test_loader_decodes_legacy_encodings() {
    // "Пылесос" in Windows-1251
    let cp1251 = [
        b'7', b'\t', 0xCF, 0xFB, 0xEB, 0xE5, 0xF1, 0xEE, 0xF1,
    ];
    let (text, encoding) = decode_text(&cp1251).unwrap();
    assert_eq!(encoding, "windows-1251");
    let parsed = parse_records(&text, "cp1251");
    assert_eq!(parsed[0].raw_title, "Пылесос");
}

#[test]
fn test_missing_input_is_input_format_error() {
    let err = load_tab_file("/nonexistent/dupfind/new_items.txt")
        .map_err(|e| e.at(Stage::Loaded))
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Loaded));
    assert!(err.to_string().starts_with("Stage 'loaded' failed"), "{}", err);
    match err {
        Error::Stage { source, .. } => assert!(matches!(*source, Error::InputFormat(_))),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_vectorization_failure_is_reported() {
    let config = MatcherConfig::default();
    let result = build_retriever(&config, &["  "], &[" "]);
    assert!(matches!(result, Err(Error::Vectorization(_))));
}

#[test]
fn test_report_json_shape() {
    let finder = DuplicateFinder::new(sequential()).unwrap();
    let catalog = items(&[("1001", "Смартфон Xiaomi Note 6.1\" 8/128GB синий")]);
    let incoming = items(&[
        ("2001", "смартфон xiaomi note 6.1 8 128gb синий"),
        ("2002", "Робот-пылесос Irbis X"),
    ]);
    let output = finder.run(&catalog, &incoming).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("duplicates.json");
    write_report(&path, &output.report).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("смартфон xiaomi note 6.1 8 128gb синий"));
    assert!(raw.find("\"2001\"").unwrap() < raw.find("\"2002\"").unwrap());

    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = value["2001"].as_object().unwrap();
    let mut keys: Vec<&str> = entry.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["incoming_normalized", "incoming_title", "matches"]);

    let m = value["2001"]["matches"][0].as_object().unwrap();
    let mut keys: Vec<&str> = m.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        [
            "catalog_id",
            "catalog_normalized",
            "catalog_title",
            "coarse_score",
            "combined_score",
            "lexical_score",
        ]
    );
    assert_eq!(value["2002"]["matches"].as_array().unwrap().len(), 0);
}
