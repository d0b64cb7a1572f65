//! Survey Store Daemon
//!
//! ## Usage
//!
//! ```bash
//! # Start with defaults
//! survey-store
//!
//! # Start with custom config
//! survey-store --config /path/to/config.toml
//!
//! # Custom port and storage directory
//! survey-store --http-port 8091 --storage-dir /data/surveys
//!
//! # Reject responses for unknown surveys, log as JSON
//! survey-store --require-existing-survey --log-json
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use survey_store::services::events::spawn_logging_listener;
use survey_store::{Config, HttpServer, Services, SurveyDb};

#[derive(Parser, Debug)]
#[command(name = "survey-store")]
#[command(about = "Survey storage and analytics service")]
struct Args {
    /// Path to config file
    #[arg(short, long, env = "SURVEY_STORE_CONFIG")]
    config: Option<PathBuf>,

    /// Storage directory
    #[arg(long, env = "SURVEY_STORE_DIR")]
    storage_dir: Option<PathBuf>,

    /// HTTP API port
    #[arg(long, env = "SURVEY_STORE_PORT")]
    http_port: Option<u16>,

    /// Address to bind the HTTP API to
    #[arg(long, env = "SURVEY_STORE_BIND")]
    bind_address: Option<String>,

    /// Reject responses that reference a survey that does not exist
    #[arg(long, env = "REQUIRE_EXISTING_SURVEY")]
    require_existing_survey: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("survey_store={},info", log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json);

    // Load config
    let mut config = if let Some(config_path) = &args.config {
        Config::load(config_path)?
    } else {
        Config::default()
    };

    // Apply CLI overrides
    if let Some(dir) = args.storage_dir {
        config.storage_dir = dir;
    }
    if let Some(port) = args.http_port {
        config.http_port = port;
    }
    if let Some(bind) = args.bind_address {
        config.bind_address = bind;
    }
    if args.require_existing_survey {
        config.require_existing_survey = true;
    }

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!(
        storage_dir = %config.storage_dir.display(),
        http_port = config.http_port,
        require_existing_survey = config.require_existing_survey,
        "Starting survey-store"
    );

    tokio::fs::create_dir_all(&config.storage_dir).await?;

    // Save default config if it doesn't exist
    let config_path = config.config_path();
    if !config_path.exists() {
        config.save(&config_path)?;
        info!(path = %config_path.display(), "Created default config");
    }

    let db = Arc::new(SurveyDb::open(&config.database_path())?);
    let services = Arc::new(Services::new(db.clone(), &config));
    let listener_handle = spawn_logging_listener(services.events.clone());

    let http_addr: SocketAddr = config.listen_addr().parse()?;
    let http_server = Arc::new(HttpServer::new(services, http_addr));

    info!("HTTP API available at http://{}", http_addr);
    info!("Endpoints:");
    info!("  GET  /health                   - Health check");
    info!("  GET  /surveys[?id=ID]          - List surveys or fetch one");
    info!("  POST /surveys                  - Create a survey");
    info!("  GET  /responses?surveyId=ID    - Responses for a survey");
    info!("  POST /responses                - Submit a response");
    info!("  GET  /analytics?surveyId=ID    - Aggregated results");
    info!("Press Ctrl+C to stop.");

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down...");
    };

    tokio::select! {
        result = http_server.run() => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server error");
            }
        }
        _ = shutdown => {}
    }

    listener_handle.abort();

    if let Ok(stats) = db.stats() {
        info!(
            surveys = stats.survey_count,
            responses = stats.response_count,
            "Final storage stats"
        );
    }

    Ok(())
}
