use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use ragdesk::config::AppConfig;
use ragdesk::routes::create_router;

const SESSION_REAP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "server",
        server_host = %config.server_host,
        server_port = config.server_port,
        upload_dir = %config.upload_dir.display(),
        upload_max_bytes = config.upload_max_bytes,
        seed_fixtures = config.seed_fixtures,
        bootstrap_admin = config.bootstrap_admin_password_hash.is_some(),
        "loaded configuration"
    );
    if config.bootstrap_admin_password_hash.is_none() {
        tracing::warn!(
            "BOOTSTRAP_ADMIN_PASSWORD_HASH is not set; no account can sign in until one is invited"
        );
    }

    let listen_addr: SocketAddr = config.bind_address().parse()?;
    let state = ragdesk::build_state(config)?;
    let reaper = ragdesk::spawn_session_reaper(state.clone(), SESSION_REAP_INTERVAL);
    let router = create_router(state);

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    reaper.abort();
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
