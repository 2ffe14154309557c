use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vocalis_core::capability::CapabilityContext;
use vocalis_core::registry::CapabilityRegistry;
use vocalis_core::resolver::CapabilityResolver;
use vocalis_core::store::Store;
use vocalis_inference::HttpInferenceBackend;
use vocalis_worker::{ExecutionEngine, JobExecutor};

use vocalis_api::config::ServerConfig;
use vocalis_api::router::build_app_router;
use vocalis_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "vocalis_api=debug,vocalis_worker=debug,vocalis_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let registry = CapabilityRegistry::load(&config.model_config_path).unwrap_or_else(|e| {
        panic!(
            "Failed to load model config '{}': {e}",
            config.model_config_path
        )
    });
    tracing::info!(
        path = %config.model_config_path,
        models = ?registry.names(),
        "Capability registry loaded",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = vocalis_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    vocalis_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    vocalis_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let store: Arc<dyn Store> = Arc::new(vocalis_db::PgStore::new(pool));

    // --- Execution engine ---
    let backend = Arc::new(HttpInferenceBackend::new(config.inference.clone()));
    tracing::info!(url = %config.inference.base_url, "Inference backend configured");

    let resolver = Arc::new(CapabilityResolver::new(Arc::new(registry)));
    let executor = Arc::new(JobExecutor::new(
        Arc::clone(&store),
        Arc::clone(&resolver),
        CapabilityContext::new(backend),
    ));

    let engine_cancel = CancellationToken::new();
    let (engine, engine_handle) =
        ExecutionEngine::start(executor, config.engine, engine_cancel.clone());

    // --- App state ---
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
        resolver,
        engine,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Queued jobs are marked failed; running jobs get the shutdown timeout.
    engine_cancel.cancel();
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    match tokio::time::timeout(shutdown_timeout, engine_handle).await {
        Ok(Ok(())) => tracing::info!("Execution engine stopped"),
        Ok(Err(e)) => tracing::error!(error = %e, "Execution engine task failed"),
        Err(_) => tracing::warn!(
            timeout_secs = config.shutdown_timeout_secs,
            "Execution engine did not stop in time",
        ),
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
