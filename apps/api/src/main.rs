mod assessment;
mod backend_client;
mod config;
mod credentials;
mod errors;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assessment::controller::SessionDeps;
use crate::assessment::evaluator::LlmEvaluator;
use crate::assessment::generator::QuestionGenerator;
use crate::assessment::registry::SessionRegistry;
use crate::backend_client::BackendClient;
use crate::config::Config;
use crate::llm_client::{CompletionService, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;

const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Session API v{}", env!("CARGO_PKG_VERSION"));

    // One LLM client serves both question generation and code evaluation
    let llm: Arc<dyn CompletionService> = Arc::new(LlmClient::new(config.groq_api_key.clone())?);
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let backend = Arc::new(BackendClient::new(config.backend_api_url.clone())?);
    info!("Backend client initialized ({})", config.backend_api_url);

    let deps = SessionDeps {
        topics: backend.clone(),
        generator: QuestionGenerator::new(llm.clone()),
        evaluator: Arc::new(LlmEvaluator::new(llm)),
        scores: backend,
    };

    let settings = config.session_settings();
    info!(
        "Sessions: {}s time limit, {} runs per question",
        settings.time_limit_secs, settings.runs_per_question
    );

    let sessions = SessionRegistry::new(Duration::from_secs(config.session_retention_secs));
    sessions.spawn_eviction(EVICTION_INTERVAL);

    let state = AppState {
        config: config.clone(),
        sessions,
        deps,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
