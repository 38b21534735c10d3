//! PaperCompass API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Account registration, login and administration
//! - Paper search, export and history
//! - Conference catalogs and the model panel
//! - Observability (logging, metrics)

mod handlers;
mod middleware;
mod state;


use axum::{
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use papercompass_common::{
    config::{AppConfig, ObservabilityConfig},
    db::DbPool,
    metrics, Repository,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    // Initialize tracing
    init_tracing(&config.observability);

    info!(
        service = %config.observability.service_name,
        "Starting PaperCompass API Gateway v{}",
        papercompass_common::VERSION
    );

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .with_http_listener(metrics_addr)
            .install()?;
        info!("Metrics exported on {}", metrics_addr);
    }

    // Account store: create tables and seed the administrator
    let db = DbPool::new(&config.database).await?;
    db.create_schema().await?;
    let repo = Repository::new(db);
    repo.ensure_admin(&config.auth.admin_username, &config.auth.admin_password).await?;

    let state = AppState::new(config.clone(), repo)?;
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let timeout = state.config.request_timeout();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Accounts
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/password-reset", post(handlers::auth::request_password_reset))

        // Administrator panel
        .route("/admin/users", get(handlers::admin::list_users))
        .route("/admin/users/{id}", put(handlers::admin::update_user))
        .route("/admin/password-resets", get(handlers::admin::list_password_resets))
        .route("/admin/password-resets/{id}", post(handlers::admin::complete_password_reset))

        // Conference catalogs
        .route("/conferences", get(handlers::conferences::list_conferences))
        .route("/conferences/{name}/key-fields", get(handlers::conferences::key_fields))
        .route("/conferences/{name}/categories", get(handlers::conferences::categories))
        .route("/conferences/{name}/years", get(handlers::conferences::years))

        // Search
        .route("/search", post(handlers::search::search))
        .route("/search/export", post(handlers::search::export))
        .route("/history", get(handlers::history::history))
        .route("/expansion/probe", post(handlers::expansion::probe_expansion))

        // Model panel
        .route("/model/load", post(handlers::model::load))
        .route("/model/train", post(handlers::model::train))
        .route("/model/evaluate", post(handlers::model::evaluate))
        .route("/model/predict", post(handlers::model::predict))
        .route("/data/quality-report", post(handlers::model::data_quality))
        .route_layer(from_fn(middleware::metrics::track_metrics));

    // Compose the app
    Router::new()
        .nest("/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(timeout)),
        )
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
