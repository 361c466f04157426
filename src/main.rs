use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use sulat::auth::token::{random_secret, TokenIssuer};
use sulat::config::{Cli, Config};
use sulat::state::AppState;
use sulat::{db, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::create_pool(config.db_path())?;
    db::run_migrations(&pool)?;

    // Token signing secret. Without a configured secret every restart
    // invalidates all outstanding tokens.
    let secret = match config.auth.token_secret.clone() {
        Some(secret) => secret,
        None => {
            tracing::warn!("No auth.token_secret configured; using a random secret, tokens will not survive a restart");
            random_secret()
        }
    };
    let tokens = TokenIssuer::new(&secret, config.auth.token_ttl_hours);

    // Build app state
    let state = AppState {
        db: pool,
        config: config.clone(),
        tokens: Arc::new(tokens),
    };

    // Build router
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
