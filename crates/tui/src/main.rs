mod app;
mod args;

use std::fs::{self, OpenOptions};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tracing_subscriber::{prelude::*, EnvFilter};

use depboard_core::{
    config::{self, AppConfig},
    ldb::{LdbApi, LdbClient, LdbConfig, MockLdbClient},
    session::{spawn_ticker, SessionController, SessionEvent},
    stations::StationDirectory,
};

use args::{is_valid_token, parse_launch, resolve_startup, Startup};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let launch = parse_launch(&argv)?;

    let directory = Arc::new(
        StationDirectory::load(&config.station_file).with_context(|| {
            format!(
                "failed to load station list {}",
                config.station_file.display()
            )
        })?,
    );
    tracing::info!(stations = directory.len(), "station directory loaded");

    let token = launch
        .token()
        .map(str::to_string)
        .or_else(|| config.token.clone());

    let (session_tx, session_rx) = mpsc::channel::<SessionEvent>(128);
    let (startup, notice) = resolve_startup(&launch, &directory);
    if let Some(n) = &notice {
        tracing::warn!(notice = n.as_str(), "startup station validation failed");
    }

    if config.mock {
        let client = MockLdbClient::new(directory.clone());
        return run_app(directory, client, &config, session_tx, session_rx, startup, notice)
            .await;
    }

    let Some(token) = token else {
        bail!(
            "no bearer token: pass one as an argument or set `token` in {}",
            config_path.display()
        );
    };
    if !is_valid_token(&token) {
        bail!("invalid bearer token: {token}");
    }

    let client = LdbClient::new(LdbConfig::new(token).with_base_url(config.base_url.clone()))?;
    run_app(directory, client, &config, session_tx, session_rx, startup, notice).await
}

async fn run_app<C: LdbApi>(
    directory: Arc<StationDirectory>,
    client: C,
    config: &AppConfig,
    session_tx: mpsc::Sender<SessionEvent>,
    session_rx: mpsc::Receiver<SessionEvent>,
    startup: Startup,
    notice: Option<String>,
) -> Result<()> {
    let controller = SessionController::new(directory.clone(), client, session_tx.clone());
    spawn_ticker(config.refresh_period(), session_tx);

    let mut app = app::BoardApp::new(controller, directory);
    app.run(session_rx, startup, notice).await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("depboard.log");

    let env_filter = EnvFilter::from_default_env();

    // stdout is owned by the alternate screen, so only the file layer runs.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
