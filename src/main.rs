use anyhow::Result;
use groupchat_server::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    groupchat_server::logging::init_tracing(&config.logging);

    tracing::info!("=== Group Chat Server Starting ===");
    tracing::info!("Port: {}", config.port);

    groupchat_server::run(config).await
}
