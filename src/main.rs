use anyhow::Context;
use clap::Parser;
use dupfind::{
    load_tab_file, write_report, CoarseBackend, DuplicateFinder, LexicalBackend, MatcherConfig,
    Stage,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Find catalog duplicates of incoming product titles
#[derive(Parser, Debug)]
#[command(name = "dupfind")]
#[command(about = "Fuzzy product-duplicate finder", long_about = None)]
struct Args {
    /// Catalog file, one `id<TAB>title` per line
    #[arg(short, long, default_value = "catalog.txt")]
    catalog: PathBuf,

    /// Incoming items file, same format as the catalog
    #[arg(short, long, default_value = "new_items.txt")]
    incoming: PathBuf,

    /// Where to write the JSON report
    #[arg(short, long, default_value = "duplicates.json")]
    output: PathBuf,

    /// JSON configuration file; missing keys take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum combined score of a reported match
    #[arg(long)]
    threshold: Option<f64>,

    /// Candidates retrieved per incoming item
    #[arg(long)]
    top_k: Option<usize>,

    /// Compare raw titles without normalization
    #[arg(long)]
    no_normalize: bool,

    /// Coarse retrieval backend (tfidf, token_overlap)
    #[arg(long)]
    coarse_backend: Option<CoarseBackend>,

    /// Lexical scoring backend (token_set, jaccard_sequence)
    #[arg(long)]
    lexical_backend: Option<LexicalBackend>,

    /// Run on a single thread
    #[arg(long)]
    sequential: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn matcher_config(&self) -> anyhow::Result<MatcherConfig> {
        let mut config = match &self.config {
            Some(path) => MatcherConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {:?}", path))?,
            None => MatcherConfig::default(),
        };
        if let Some(threshold) = self.threshold {
            config.similarity_threshold = threshold;
        }
        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
        if self.no_normalize {
            config.normalize = false;
        }
        if let Some(backend) = self.coarse_backend {
            config.coarse_backend = backend;
        }
        if let Some(backend) = self.lexical_backend {
            config.lexical_backend = backend;
        }
        if self.sequential {
            config.parallel = false;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting dupfind v{}", env!("CARGO_PKG_VERSION"));
    info!("Catalog: {:?}", args.catalog);
    info!("Incoming: {:?}", args.incoming);

    let config = args.matcher_config()?;
    let finder = DuplicateFinder::new(config)?;

    let catalog = load_tab_file(&args.catalog).map_err(|e| e.at(Stage::Loaded))?;
    let incoming = load_tab_file(&args.incoming).map_err(|e| e.at(Stage::Loaded))?;
    info!(
        "Loaded {} catalog items and {} incoming items",
        catalog.len(),
        incoming.len()
    );

    let output = finder.run(&catalog, &incoming)?;
    write_report(&args.output, &output.report).map_err(|e| e.at(Stage::Reported))?;
    info!("Saved results to {:?}", args.output);

    for (id, report) in output.report.iter() {
        info!("New {}: {}", id, report.incoming_title);
        if report.matches.is_empty() {
            info!("  -> No matches above threshold");
        }
        for m in &report.matches {
            info!(
                "  -> {}: {} (score={})",
                m.catalog_id, m.catalog_title, m.combined_score
            );
        }
    }

    let stats = &output.stats;
    info!(
        "Done: {} of {} incoming items matched, {} matches, {} candidates scored, backends {}/{}",
        output.report.iter().filter(|(_, r)| r.has_matches()).count(),
        stats.incoming_items,
        stats.matches_accepted,
        stats.candidates_scored,
        stats.coarse_backend.unwrap_or("none"),
        stats.lexical_backend
    );
    Ok(())
}
