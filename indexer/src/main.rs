mod ingest;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quarry_core::persist::{load_index, save_index, IndexPaths};
use quarry_core::{EngineConfig, IdfMode, IndexBuilder, QueryMode, SearchEngine, Tokenizer};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "quarry-indexer")]
#[command(about = "Build, inspect and query a TF-IDF inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        /// Engine config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Apply English stemming to terms
        #[arg(long, default_value_t = false)]
        stem: bool,
    },
    /// Run a query against a built index
    Query {
        /// Index directory
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        /// Maximum hits to print
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Treat plain word lists as a free-text bag instead of AND
        #[arg(long, default_value_t = false)]
        any: bool,
        /// Use smoothed IDF = ln(1 + N/df) instead of ln(N/df)
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
        /// Print the parsed query instead of running it
        #[arg(long, default_value_t = false)]
        explain: bool,
        query: String,
    },
    /// Print index statistics as JSON
    Stats {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, config, stem } => build_index(&input, &output, config.as_deref(), stem),
        Commands::Query { index, limit, any, smoothed_idf, explain, query } => {
            run_query(&index, &query, limit, any, smoothed_idf, explain)
        }
        Commands::Stats { index } => {
            let (idx, meta) = load_index(&IndexPaths::new(&index))?;
            let mut out = serde_json::to_value(idx.stats())?;
            out["created_at"] = serde_json::Value::String(meta.created_at);
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
    }
}

fn build_index(input: &Path, output: &Path, config: Option<&Path>, stem: bool) -> Result<()> {
    let mut cfg = match config {
        Some(path) => EngineConfig::from_json_file(path).with_context(|| format!("reading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if stem {
        cfg.tokenizer.stemming = true;
    }

    let docs = ingest::load_documents(input)?;
    let index = IndexBuilder::new(Tokenizer::new(cfg.tokenizer.clone())).build(docs)?;
    save_index(&IndexPaths::new(output), &index, &cfg.tokenizer)?;
    Ok(())
}

fn run_query(index: &Path, query: &str, limit: usize, any: bool, smoothed_idf: bool, explain: bool) -> Result<()> {
    let (idx, meta) = load_index(&IndexPaths::new(index))?;
    let mut cfg = EngineConfig { tokenizer: meta.tokenizer, ..Default::default() };
    if any {
        cfg.mode = QueryMode::Any;
    }
    if smoothed_idf {
        cfg.ranker.idf = IdfMode::Smoothed;
    }
    let engine = SearchEngine::with_index(cfg, idx);

    if explain {
        println!("{}", engine.explain(query)?);
        return Ok(());
    }

    let results = engine.search(query, limit)?;
    println!("{} hits", results.total_hits);
    for (rank, hit) in results.hits.iter().enumerate() {
        let label = hit
            .meta
            .title
            .as_deref()
            .or(hit.meta.external_id.as_deref())
            .unwrap_or("");
        println!("{:>3}. [{}] {:.4} {}", rank + 1, hit.doc_id, hit.score, label);
    }
    Ok(())
}
