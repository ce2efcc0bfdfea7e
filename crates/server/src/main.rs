//! aspirez-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use aspirez_api::{AppState, auth_middleware, router as api_router};
use aspirez_common::{Config, IdGenerator};
use aspirez_core::{
    AccountService, ConnectionService, CredentialStore, EmailSenderRef, JwtSigner,
    LoggingEmailSender, SessionService, TokenSignerRef,
};
use aspirez_db::repositories::{ConnectionRepository, UserRepository};
use axum::{Router, middleware};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Windows, this only listens for Ctrl+C.
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
            Ok(mut stream) => {
                stream.recv().await;
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
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aspirez=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting aspirez-rs server...");

    let config = Config::load().context("loading configuration")?;

    info!("Connecting to database...");
    let db = aspirez_db::init(&config.database).await?;

    info!("Running migrations...");
    aspirez_db::migrate(&db).await?;

    let db = Arc::new(db);
    let timeout = Duration::from_millis(config.database.operation_timeout_ms);

    // Repositories
    let user_repo = UserRepository::new(Arc::clone(&db)).with_timeout(timeout);
    let connection_repo = ConnectionRepository::new(Arc::clone(&db)).with_timeout(timeout);

    // Collaborators
    let id_gen = IdGenerator::new();
    let credentials = CredentialStore::new(&config.password)?;
    let email: EmailSenderRef = Arc::new(LoggingEmailSender::new(config.email.clone()));
    let signer: TokenSignerRef = Arc::new(JwtSigner::new(&config.auth)?);

    // Services
    let account_service = AccountService::new(
        user_repo.clone(),
        credentials.clone(),
        email,
        id_gen.clone(),
    );
    let session_service = SessionService::new(
        user_repo.clone(),
        credentials,
        signer,
        id_gen.clone(),
        &config.auth,
    );
    let connection_service = ConnectionService::new(connection_repo, user_repo, id_gen);

    let state = AppState::new(account_service, session_service, connection_service);

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("parsing server address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
