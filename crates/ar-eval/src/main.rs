use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, info};

use ar_common::catalog::{CatalogError, load_catalog};
use ar_common::evaluation::{
    LabelledRow, PredictionRow, QueryRow, evaluate, group_labelled_rows, predict,
};
use ar_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use ar_common::query::KeywordQueryAnalyzer;
use ar_common::ranking::RankingEngine;
use ar_common::recommend::{Recommender, RecommenderConfig};
use ar_common::retrieval::{HashEmbeddingIndex, IndexConfig};
use ar_common::run_id;

#[derive(Debug, thiserror::Error)]
enum EvalError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("csv error in {path}: {source}")]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{name} must be between 1 and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: usize,
        max: usize,
    },
}

fn check_result_count(
    recommender: &Recommender,
    name: &'static str,
    value: usize,
) -> Result<(), EvalError> {
    let max = recommender.config().max_results;
    if value == 0 || value > max {
        return Err(EvalError::OutOfRange { name, value, max });
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(name = "ar-eval", about = "Offline evaluation of assessment recommendations")]
struct Cli {
    /// Crawled catalog (JSON array of assessments)
    #[arg(long, env = "AR_CATALOG_PATH", default_value = "data/assessments.json")]
    catalog: PathBuf,

    /// Retrieval pool size, overrides AR_RETRIEVAL_POOL_SIZE
    #[arg(long)]
    pool_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Mean Recall@K and MAP@K over labelled `Query,Assessment_url` rows
    Evaluate {
        /// CSV with a `Query,Assessment_url` header (`.json` for a JSON array)
        #[arg(long)]
        train: PathBuf,
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// JSON report destination; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Top-n urls per query, written as long-format `Query,Assessment_url` rows
    Predict {
        /// CSV with a `Query` column (`.json` for a JSON array)
        #[arg(long)]
        test: PathBuf,
        #[arg(long, default_value_t = 10)]
        n: usize,
        /// CSV destination (`.json` for a JSON array); stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Row files are CSV unless they carry a `.json` extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowFormat {
    Csv,
    Json,
}

impl RowFormat {
    fn of(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("json") => RowFormat::Json,
            _ => RowFormat::Csv,
        }
    }
}

const PREDICTION_HEADER: [&str; 2] = ["Query", "Assessment_url"];

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> EvalError + '_ {
    move |source| EvalError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, EvalError> {
    if RowFormat::of(path) == RowFormat::Csv {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_error(path))?;
        return reader
            .deserialize()
            .collect::<Result<Vec<T>, _>>()
            .map_err(csv_error(path));
    }

    let raw = fs::read_to_string(path).map_err(|source| EvalError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| EvalError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Header first, even when there are no rows.
fn write_prediction_csv<W: io::Write>(
    sink: W,
    rows: &[PredictionRow],
    path: &Path,
) -> Result<(), EvalError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(sink);
    writer
        .write_record(PREDICTION_HEADER)
        .map_err(csv_error(path))?;
    for row in rows {
        writer.serialize(row).map_err(csv_error(path))?;
    }
    writer.flush().map_err(|source| EvalError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_predictions(rows: &[PredictionRow], output: Option<&Path>) -> Result<(), EvalError> {
    match output {
        Some(path) if RowFormat::of(path) == RowFormat::Json => write_json(&rows, Some(path)),
        Some(path) => {
            let file = fs::File::create(path).map_err(|source| EvalError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            write_prediction_csv(file, rows, path)
        }
        None => write_prediction_csv(io::stdout().lock(), rows, Path::new("<stdout>")),
    }
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), EvalError> {
    let encoded = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => fs::write(path, encoded).map_err(|source| EvalError::Write {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            println!("{encoded}");
            Ok(())
        }
    }
}

fn build_recommender(catalog: &Path, pool_size: Option<usize>) -> Result<Recommender, EvalError> {
    let entries = load_catalog(catalog)?;
    info!(assessments = entries.len(), "catalog loaded");

    let mut config = RecommenderConfig::from_env();
    if let Some(pool_size) = pool_size {
        config.pool_size = pool_size.max(1);
    }

    let index = HashEmbeddingIndex::new(entries, IndexConfig::from_env());
    Ok(Recommender::new(
        Arc::new(index),
        Arc::new(KeywordQueryAnalyzer::new()),
        RankingEngine::default(),
        config,
    ))
}

fn run(cli: Cli) -> Result<(), EvalError> {
    let recommender = build_recommender(&cli.catalog, cli.pool_size)?;

    match cli.command {
        Command::Evaluate { train, k, output } => {
            check_result_count(&recommender, "--k", k)?;
            let rows: Vec<LabelledRow> = read_rows(&train)?;
            let queries = group_labelled_rows(&rows);
            let report = evaluate(&recommender, &queries, k);
            write_json(&report, output.as_deref())
        }
        Command::Predict { test, n, output } => {
            check_result_count(&recommender, "--n", n)?;
            let rows: Vec<QueryRow> = read_rows(&test)?;
            let queries: Vec<&str> = rows.iter().map(|row| row.query.as_str()).collect();
            let predictions = predict(&recommender, &queries, n);
            write_predictions(&predictions, output.as_deref())?;
            info!(
                queries = queries.len(),
                rows = predictions.len(),
                "predictions written"
            );
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    let cli = Cli::parse();
    info!(run_id = run_id::get(), "ar-eval starting");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "ar-eval failed");
            eprintln!("ar-eval: {err}");
            ExitCode::FAILURE
        }
    }
}
