//! Standalone HTTP server for the savings calculator

use savings_calculator::{api::run_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("savings_calculator=info,tower_http=info"),
    )
    .init();

    let config = ServerConfig::from_env()?;
    log::info!(
        "Allowed origins: {}",
        config.cors.allowed_origins.join(", ")
    );

    run_server(config).await
}
