//! `conductor` binary entry point
//!
//! Loads `.env`, installs logging on stderr, resolves settings and runs the
//! interactive orchestrator on stdin/stdout. Ctrl-C cancels the session.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use conductor_core::{App, CancellationToken, EnvSecretStore, Logger, Settings, TracingLogger};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

/// Overrides the config file location
const CONFIG_ENV: &str = "CONDUCTOR_CONFIG";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    // A missing .env is fine; the variables may come from the environment.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let settings = match Settings::load(config_path.as_deref(), &EnvSecretStore::new()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(run(settings));

    // stdin reads sit on a blocking thread that cannot be interrupted
    runtime.shutdown_timeout(Duration::from_millis(250));
    code
}

async fn run(settings: Settings) -> ExitCode {
    let logger: Arc<dyn Logger> = Arc::new(TracingLogger::default());
    let cancel = CancellationToken::new();

    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let app = App::new(settings, logger);
    let input = BufReader::new(tokio::io::stdin());

    match app.run(input, tokio::io::stdout(), cancel).await {
        Ok(exit) => {
            tracing::debug!(?exit, "session finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("conductor: {}", e);
            ExitCode::FAILURE
        }
    }
}
