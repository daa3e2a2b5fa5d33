use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, Request, header::CONTENT_TYPE},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use clap::Parser;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{Span, info};

use ar_common::catalog::{CatalogEntry, load_catalog, parse_catalog};
use ar_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use ar_common::query::KeywordQueryAnalyzer;
use ar_common::ranking::RankingEngine;
use ar_common::recommend::{Recommender, RecommenderConfig};
use ar_common::retrieval::{HashEmbeddingIndex, IndexConfig};
use ar_common::run_id;

pub mod error;
pub mod handlers;

use error::ApiError;
use handlers::{health, recommend};

const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_BODY_BYTES: usize = 64 * 1024;
/// Time between readiness going false and the listener closing.
const READINESS_DRAIN: Duration = Duration::from_millis(200);
const DEFAULT_METRICS_PORT: u16 = 9100;

#[derive(Debug, Clone, Parser)]
#[command(name = "ar-api", about = "HTTP API for assessment recommendations")]
struct Cli {
    /// Crawled catalog (JSON array of assessments)
    #[arg(long, env = "AR_CATALOG_PATH", default_value = "data/assessments.json")]
    catalog_path: PathBuf,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Comma separated browser origins allowed to call the API
    #[arg(long, env = "AR_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog_path: PathBuf,
    pub port: u16,
    pub cors_origins: Vec<HeaderValue>,
    /// Prometheus exporter on `AR_METRICS_PORT`, toggled by `AR_METRICS_ENABLED`.
    pub metrics_enabled: bool,
}

/// Explicit origins only; `*` and values that are not valid header values
/// are configuration errors.
fn parse_cors_origins(raw: &str) -> Result<Vec<HeaderValue>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            if origin == "*" {
                return Err(ApiError::BadRequest(
                    "AR_CORS_ORIGINS must list explicit origins".into(),
                ));
            }
            HeaderValue::from_str(origin)
                .map_err(|_| ApiError::BadRequest(format!("invalid CORS origin {origin:?}")))
        })
        .collect()
}

impl AppConfig {
    fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        Ok(Self {
            cors_origins: parse_cors_origins(&cli.cors_origins)?,
            catalog_path: cli.catalog_path,
            port: cli.port,
            metrics_enabled: ar_metrics::metrics_enabled("AR_METRICS_ENABLED", false),
        })
    }

    pub fn for_tests() -> Self {
        Self {
            catalog_path: PathBuf::from("data/assessments.json"),
            port: 8000,
            cors_origins: vec![HeaderValue::from_static("http://localhost:3000")],
            metrics_enabled: false,
        }
    }
}

pub struct AppState {
    pub config: AppConfig,
    pub recommender: Recommender,
    pub catalog_size: usize,
    /// Cleared on shutdown so `/readyz` starts failing before the drain.
    pub readiness: Arc<AtomicBool>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wires the in-process index and the keyword analyzer over `entries`.
    pub fn from_catalog(
        config: AppConfig,
        entries: Vec<CatalogEntry>,
        index_config: IndexConfig,
        recommender_config: RecommenderConfig,
    ) -> Self {
        let catalog_size = entries.len();
        let recommender = Recommender::new(
            Arc::new(HashEmbeddingIndex::new(entries, index_config)),
            Arc::new(KeywordQueryAnalyzer::new()),
            RankingEngine::default(),
            recommender_config,
        );
        Self {
            config,
            recommender,
            catalog_size,
            readiness: Arc::new(AtomicBool::new(true)),
        }
    }
}

fn request_id_of<B>(request: &Request<B>) -> Option<String> {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .map(str::to_owned)
}

async fn scope_request_id(req: Request<Body>, next: Next) -> Response {
    let request_id = request_id_of(&req);
    error::with_request_id(request_id, next.run(req)).await
}

fn http_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "http",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id_of(request).unwrap_or_default(),
    )
}

pub fn create_router(state: SharedState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let cors = CorsLayer::new()
        .allow_origin(state.config.cors_origins.clone())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, request_id.clone()]);

    let recommend_routes = get(recommend::recommend_get).post(recommend::recommend_post);

    Router::new()
        .route("/", get(health::index))
        .route("/health", get(health::readyz))
        .route("/readyz", get(health::readyz))
        .route("/livez", get(health::livez))
        .route("/recommend", recommend_routes)
        .layer(middleware::from_fn(scope_request_id))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http().make_span_with(http_span))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

const TEST_CATALOG: &str = r#"[
  {"name": "Core Java (Entry Level)", "url": "https://catalog.test/core-java",
   "description": "Java fundamentals", "test_type": ["Knowledge & Skills"],
   "skills": ["Java"], "duration": "15 minutes"},
  {"name": "Teamwork Questionnaire", "url": "https://catalog.test/teamwork",
   "description": "Collaboration at work", "test_type": ["Personality & Behaviour"],
   "skills": ["Teamwork"], "duration": "20 minutes"},
  {"name": "Numerical Reasoning", "url": "https://catalog.test/numerical",
   "test_type": ["Ability & Aptitude"], "duration": "25 minutes"}
]"#;

/// Small in-memory catalog for router tests.
pub fn test_state() -> SharedState {
    let entries = parse_catalog(TEST_CATALOG).unwrap_or_default();
    Arc::new(AppState::from_catalog(
        AppConfig::for_tests(),
        entries,
        IndexConfig::default(),
        RecommenderConfig::default(),
    ))
}

fn build_state(config: AppConfig) -> Result<AppState, ApiError> {
    let entries = load_catalog(&config.catalog_path)?;
    Ok(AppState::from_catalog(
        config,
        entries,
        IndexConfig::from_env(),
        RecommenderConfig::from_env(),
    ))
}

pub async fn run() -> Result<(), ApiError> {
    dotenvy::dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    let config = AppConfig::from_cli(Cli::parse())?;
    if config.metrics_enabled {
        ar_metrics::init_metrics("AR_METRICS_PORT", DEFAULT_METRICS_PORT);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state: SharedState = Arc::new(build_state(config)?);
    let readiness = Arc::clone(&state.readiness);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(format!("bind {addr}: {err}")))?;
    info!(
        %addr,
        run_id = run_id::get(),
        assessments = state.catalog_size,
        "ar-api listening"
    );

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(drain_on_shutdown(readiness))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))
}

async fn termination_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                _ = tokio::signal::ctrl_c() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            },
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                "SIGINT"
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        "ctrl-c"
    }
}

async fn drain_on_shutdown(readiness: Arc<AtomicBool>) {
    let signal = termination_signal().await;
    readiness.store(false, Ordering::SeqCst);
    info!(signal, "shutdown requested; draining");
    tokio::time::sleep(READINESS_DRAIN).await;
}
