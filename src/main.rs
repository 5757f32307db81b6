use clap::Parser;
use tracing_subscriber::EnvFilter;

use tenant_org_api::app::{app, shutdown_signal, AppState};
use tenant_org_api::config;

#[derive(Parser)]
#[command(name = "tenant-org-api")]
#[command(about = "Organization registry API with per-tenant collections")]
#[command(version)]
struct Args {
    #[arg(long, help = "Address to bind (overrides API_HOST)")]
    host: Option<String>,

    #[arg(long, help = "Port to listen on (overrides API_PORT / PORT)")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let mut config = config::config().clone();
    if let Some(host) = args.host {
        config.api.host = host;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }

    let default_filter = if config.api.enable_request_logging {
        "info,tower_http=debug"
    } else {
        "info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    tracing::info!("Starting tenant-org-api in {:?} mode", config.environment);

    let bind_addr = format!("{}:{}", config.api.host, config.api.port);
    let state = AppState::from_config(config).await?;
    let database = state.database.clone();

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(database) = database {
        database.close().await;
    }
    Ok(())
}
