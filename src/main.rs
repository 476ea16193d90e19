// sociograph server

use std::net::SocketAddr;
use tokio::net::TcpListener;

use sociograph::{app_state::AppState, config::Config, http};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    let address = config.server_address();

    // Initialize application state
    let state = AppState::new(config).await?;

    // Build application router
    let app = http::router(state);

    let addr: SocketAddr = address.parse()?;
    tracing::info!("sociograph listening on http://{addr}");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
