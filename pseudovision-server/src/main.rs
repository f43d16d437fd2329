//! Pseudovision server: HTTP surface for the playout build engine.
//! Loads configuration, migrates and connects to Postgres, and serves
//! the CRUD + playout routes.

mod config;
mod errors;
mod handlers;
mod routes;
mod state;

#[cfg(test)]
mod tests;

use std::net::SocketAddr;

use clap::Parser;
use pseudovision_core::PostgresDatabase;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use state::AppState;

/// Command line overrides for the Pseudovision server.
#[derive(Parser, Debug)]
#[command(name = "pseudovision-server")]
#[command(about = "HTTP surface for the Pseudovision playout build engine")]
struct Args {
    /// Server port (overrides `SERVER_PORT`)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(port) = args.port {
        config.server_port = port;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = PostgresDatabase::connect(&config.database_url).await?;
    db.migrate().await?;
    tracing::info!("database migrated");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let state = AppState::new(db, config);
    let app = routes::build_router(state);

    tracing::info!(%addr, "starting pseudovision-server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
