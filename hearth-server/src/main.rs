use hearth_server::{Config, Server, ServerState, print_banner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, logging)
    dotenv::dotenv().ok();

    let config = Config::from_env();
    let log_level = std::env::var("HEARTH_LOG_LEVEL").ok();
    hearth_server::init_logger_with_file(log_level.as_deref(), config.log_dir.as_deref());

    print_banner();
    tracing::info!("🍲 Hearth Order Server starting...");

    // 2. Server state (opens the database, runs migrations)
    let state = ServerState::initialize(&config).await?;

    // 3. HTTP server
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
