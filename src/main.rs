use identity_token_service::config::Config;
use identity_token_service::http::{AppState, router};
use identity_token_service::keys::KeySource;
use identity_token_service::observability::{TracingConfig, init_tracing};
use identity_token_service::shutdown::serve_with_graceful_shutdown;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(&TracingConfig::from(&config))?;

    info!("Starting Identity Token Service");

    let keys = KeySource::from_config(&config).await?;
    let app = router(AppState::new(&config, keys), config.request_timeout);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Identity Token Service listening on {}", addr);

    serve_with_graceful_shutdown(listener, app, config.shutdown_timeout).await?;

    info!("Identity Token Service stopped");
    Ok(())
}
