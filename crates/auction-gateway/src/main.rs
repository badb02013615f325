mod api;
mod arguments;
mod identity;
mod state;

use {
    auction_engine::PgPersistence,
    clap::Parser,
    std::sync::Arc,
    tracing_subscriber::EnvFilter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = arguments::Arguments::parse();

    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(&args.log_filter)).init();
    tracing::info!(%args, "starting auction-gateway");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(args.db_pool_size)
        .connect(&args.db_url)
        .await?;

    let persistence: Arc<dyn auction_engine::Persistence> = Arc::new(PgPersistence::new(pool));
    let app = api::router(state::AppState::new(persistence, args.max_event_backlog, args.default_timer_seconds));

    let listener = tokio::net::TcpListener::bind(args.bind_address).await?;
    tracing::info!(bind_address = %args.bind_address, "serving HTTP API");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Waits for either Ctrl-C or SIGTERM, whichever arrives first, so the
/// process drains in-flight requests before a container orchestrator kills
/// it outright.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
