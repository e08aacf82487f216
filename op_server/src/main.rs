//! Open-play registration server.
//!
//! Serves the admission/cancellation endpoints, the bulk-promotion job
//! endpoint, and the organizer ranking RPCs over a Postgres-backed
//! registration store.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use pico_args::Arguments;
use tracing::info;

use op_server::api::{create_router, AppState};
use op_server::config::ServerConfig;
use op_server::{logging, metrics};
use open_play::db::{Database, PgRegistrationStore};
use open_play::GroupPolicy;

const HELP: &str = "\
Run the open-play registration server

USAGE:
  op_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  GROUP_SIZE               Players admitted together (default: 4)
  ADMIN_TOKEN              Shared secret for organizer endpoints
  METRICS_BIND             Prometheus exporter address (unset disables it)
  MAX_RETRY_ATTEMPTS       Conflict retry cap (default: 5)
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    logging::init();

    let mut config = ServerConfig::from_env();
    if let Ok(bind) = pargs.value_from_str::<_, SocketAddr>("--bind") {
        config.bind = bind;
    }
    if let Ok(db_url) = pargs.value_from_str::<_, String>("--db-url") {
        config.database.database_url = db_url;
    }

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(Error::msg)?;
        info!("Prometheus exporter listening on {metrics_bind}");
    }

    info!("Connecting to database");
    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {e}"))?;
    db.health_check().await?;
    info!("Database connected successfully");

    let state = AppState {
        store: Arc::new(PgRegistrationStore::new(db.pool().clone())),
        policy: GroupPolicy::new(config.group_size),
        admin_token: config.admin_token.clone(),
        max_retry_attempts: config.max_retry_attempts,
    };

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Registration server listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
