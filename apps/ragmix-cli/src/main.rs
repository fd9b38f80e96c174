use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ragmix_core::config::Config;
use ragmix_core::settings::{LoggingSettings, Settings};
use ragmix_core::source::DirectorySource;
use ragmix_core::traits::DocumentSource;
use ragmix_core::{Document, RankedResult};
use ragmix_hybrid::{HybridSearchEngine, IngestReport};

#[derive(Parser)]
#[command(name = "ragmix")]
#[command(about = "Hybrid BM25 + embedding retrieval over a folder of text files")]
#[command(version)]
struct Cli {
    /// Configuration file; defaults to config.toml (+ config.<RUST_ENV>.toml) and APP_* variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a folder, then answer one question or read questions from stdin
    Ingest {
        dir: PathBuf,
        /// Answer this question and exit instead of prompting
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Ingest a folder and print the fused ranking for a query
    Search {
        dir: PathBuf,
        query: String,
        #[arg(short = 'n', long, default_value_t = 5)]
        max_results: usize,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ingest a folder and answer a question from it
    Ask { dir: PathBuf, question: String },
}

fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let config = match path {
        Some(p) => Config::from_file(p).with_context(|| format!("loading {}", p.display()))?,
        None => Config::load()?,
    };
    Ok(config.settings()?)
}

fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    let documents = DirectorySource::new(dir).documents()?;
    if documents.is_empty() {
        bail!("no documents found in {}", dir.display());
    }
    Ok(documents)
}

fn ingest_with_progress(rt: &Runtime, engine: &HybridSearchEngine, documents: Vec<Document>, batch: usize) -> Result<IngestReport> {
    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    let mut total = IngestReport::default();
    let mut offset = 0;
    let mut documents = documents.into_iter().peekable();
    while documents.peek().is_some() {
        let chunk: Vec<Document> = documents.by_ref().take(batch).collect();
        let n = chunk.len();
        let report = rt.block_on(engine.ingest(chunk))?;
        total.documents += report.documents;
        total.segments += report.segments;
        total.failures.extend(report.failures.into_iter().map(|mut f| {
            f.document += offset;
            f
        }));
        offset += n;
        pb.inc(n as u64);
        pb.set_message(format!("{} segments", total.segments));
    }
    pb.finish_with_message(format!("{} segments", total.segments));
    for failure in &total.failures {
        eprintln!("skipped document #{}: {}", failure.document, failure.reason);
    }
    Ok(total)
}

fn print_results(results: &[RankedResult]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }
    for (rank, r) in results.iter().enumerate() {
        let source = r.metadata().get("file_name").map_or("-", String::as_str);
        let snippet: String = r.text().split_whitespace().collect::<Vec<_>>().join(" ").chars().take(160).collect();
        println!("{:>2}. [{:.4}] {}  {}", rank + 1, r.score, source, snippet);
    }
}

fn print_answer(rt: &Runtime, engine: &HybridSearchEngine, question: &str) -> Result<()> {
    let answer = rt.block_on(engine.ask(question))?;
    println!("{}\n", answer.text);
    if !answer.sources.is_empty() {
        println!("Sources:");
        print_results(&answer.sources);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    init_tracing(&settings.logging);

    // built outside the runtime: blocking HTTP clients must not be created or
    // dropped on an async worker
    let engine = HybridSearchEngine::init(&settings)?;
    let rt = Runtime::new()?;
    let batch = settings.retrieval.ingest_concurrency * 4;

    let dir = match &cli.command {
        Commands::Ingest { dir, .. } | Commands::Search { dir, .. } | Commands::Ask { dir, .. } => dir.clone(),
    };
    let documents = load_documents(&dir)?;
    info!(documents = documents.len(), dir = %dir.display(), "loading");
    let report = ingest_with_progress(&rt, &engine, documents, batch)?;
    println!("Indexed {} segments from {} documents ({} skipped)", report.segments, report.documents, report.failures.len());

    match cli.command {
        Commands::Search { query, max_results, json, .. } => {
            let weights = &settings.retrieval;
            let results = rt.block_on(engine.retrieve_hybrid(&query, max_results, weights.bm25_weight, weights.embedding_weight))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_results(&results);
            }
        }
        Commands::Ask { question, .. } => print_answer(&rt, &engine, &question)?,
        Commands::Ingest { query: Some(question), .. } => print_answer(&rt, &engine, &question)?,
        Commands::Ingest { query: None, .. } => {
            let stdin = std::io::stdin();
            loop {
                print!("> ");
                std::io::stdout().flush()?;
                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }
                let question = line.trim();
                if question.is_empty() {
                    break;
                }
                print_answer(&rt, &engine, question)?;
            }
        }
    }

    engine.shutdown();
    Ok(())
}
