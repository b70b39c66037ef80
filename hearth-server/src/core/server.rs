use std::net::SocketAddr;

use crate::core::{Config, ServerState};
use crate::routes::build_app;

pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (tests wire their own).
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        // Build fully configured app with all middleware, then apply state
        let app = build_app(&state).with_state(state.clone());
        let addr = SocketAddr::new(self.config.host.parse()?, self.config.http_port);

        self.print_start_banner(&state);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("HTTP server listening on {addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    fn print_start_banner(&self, state: &ServerState) {
        let addr = format!("{}:{}", self.config.host, self.config.http_port);

        println!("\n");
        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║                 🍲 Hearth Order Server 🍲                  ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ 🌐 HTTP Listener  : http://{:<32} ║", addr);
        println!("║ 💾 Database       : {:<39} ║", self.config.database_path);
        println!("║ 🕐 Timezone       : {:<39} ║", self.config.timezone);
        println!("║ 💱 Currency       : {:<39} ║", self.config.currency);
        println!("║ 🏷  Environment    : {:<39} ║", state.config.environment);
        println!("╚════════════════════════════════════════════════════════════╝");
        println!("\n");
    }
}

/// Graceful shutdown handler
///
/// Listens for SIGTERM (Kubernetes) and Ctrl+C signals
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
