//! PaperDraft API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Authentication and authorization
//! - Rate limiting
//! - Request routing
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;
mod services;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use paperdraft_common::{
    config::AppConfig,
    db::{DbPool, Repository},
    llm::{create_llm_client, LlmClient},
    metrics,
    storage::Storage,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repo: Repository,
    pub llm: Arc<dyn LlmClient>,
    pub storage: Storage,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(true)
        .json()
        .init();

    info!("Starting PaperDraft API Gateway v{}", paperdraft_common::VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    let config = Arc::new(config);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port > 0 {
        let metrics_addr =
            SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    // Initialize LLM client and object storage
    let llm = create_llm_client(&config.llm)?;
    let storage = Storage::new(&config.storage).await;

    // Create app state
    let state = AppState {
        config: config.clone(),
        repo: Repository::new(db),
        llm,
        storage,
    };

    // Build the router
    let limiter = middleware::rate_limit::create_rate_limiter(
        config.rate_limit.requests_per_second,
        config.rate_limit.burst,
    );
    let app = create_router(state, config.rate_limit.enabled.then_some(limiter));

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(
    state: AppState,
    limiter: Option<Arc<middleware::rate_limit::GlobalRateLimiter>>,
) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Paper endpoints
        .route("/papers", post(handlers::papers::create_paper))
        .route("/papers", get(handlers::papers::list_papers))
        .route("/papers/recycle-bin", get(handlers::papers::list_recycle_bin))
        .route("/papers/{id}", get(handlers::papers::get_paper))
        .route("/papers/{id}", patch(handlers::papers::update_paper))
        .route("/papers/{id}", delete(handlers::papers::delete_paper))
        .route("/papers/{id}/restore", post(handlers::papers::restore_paper))
        .route("/papers/{id}/permanent", delete(handlers::papers::purge_paper))
        // Generation endpoints
        .route("/papers/{id}/outline", post(handlers::papers::generate_outline))
        .route("/papers/{id}/content", post(handlers::papers::generate_content))
        // Version endpoints
        .route("/papers/{id}/versions", get(handlers::versions::list_versions))
        .route(
            "/papers/{id}/versions/{number}",
            get(handlers::versions::get_version),
        )
        .route(
            "/papers/{id}/versions/{number}/restore",
            post(handlers::versions::restore_version),
        )
        // Reference endpoints
        .route(
            "/papers/{id}/references",
            post(handlers::references::create_reference),
        )
        .route(
            "/papers/{id}/references",
            get(handlers::references::list_references),
        )
        .route(
            "/papers/{id}/references/formatted",
            get(handlers::references::formatted_references),
        )
        .route(
            "/papers/{id}/references/{reference_id}",
            patch(handlers::references::update_reference),
        )
        .route(
            "/papers/{id}/references/{reference_id}",
            delete(handlers::references::delete_reference),
        )
        // Quality check endpoints
        .route("/papers/{id}/quality-check", post(handlers::quality::check_quality))
        .route("/papers/{id}/quality-check", get(handlers::quality::latest_quality))
        // Export endpoints
        .route("/papers/{id}/export", post(handlers::export::export))
        // Writing tool endpoints
        .route("/polish", post(handlers::polish::polish))
        .route("/polish/history", get(handlers::polish::polish_history))
        .route("/translate", post(handlers::translation::translate))
        .route("/charts/generate", post(handlers::charts::generate))
        // Knowledge base endpoints
        .route("/knowledge/documents", post(handlers::knowledge::upload_document))
        .route("/knowledge/documents", get(handlers::knowledge::list_documents))
        .route("/knowledge/documents/{id}", get(handlers::knowledge::get_document))
        .route(
            "/knowledge/documents/{id}",
            delete(handlers::knowledge::delete_document),
        )
        .route(
            "/knowledge/documents/{id}/ask",
            post(handlers::knowledge::ask_document),
        )
        .route("/knowledge/ask", post(handlers::knowledge::ask))
        // Dashboard endpoints
        .route("/dashboard/stats", get(handlers::dashboard::stats));

    // Compose the app
    let mut router = Router::new()
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id);

    if let Some(limiter) = limiter {
        router = router.layer(axum::middleware::from_fn(move |request, next| {
            middleware::rate_limit::rate_limit_middleware(request, next, limiter.clone())
        }));
    }

    router.with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
