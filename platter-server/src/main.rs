use platter_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. .env and logging
    setup_environment();

    print_banner();

    // 2. Configuration
    let config = Config::from_env();
    tracing::info!(
        env = %config.environment,
        port = config.http_port,
        store = ?config.store_backend,
        "Platter server starting..."
    );

    // 3. Store and services
    let state = ServerState::initialize(&config).await?;

    // 4. Serve until Ctrl-C
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
