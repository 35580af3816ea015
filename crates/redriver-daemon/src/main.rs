mod config;
mod http;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use redriver_core::{
    DeadLetterSink, EngineSink, LogDeadLetterSink, Redriver, RocksDbStore, Store,
};

use config::DaemonConfig;
use http::{HttpEngineSink, WebhookDeadLetterSink};

#[derive(Parser)]
#[command(name = "redriver-daemon", about = "Workflow message redriver")]
struct Cli {
    /// Path to the configuration file. Without it, the default search
    /// path is used.
    #[arg(long)]
    config: Option<String>,
}

fn load_config(cli_path: Option<&str>) -> DaemonConfig {
    let default_paths = ["redriver.toml", "/etc/redriver/redriver.toml"];
    let paths: Vec<&str> = match cli_path {
        Some(path) => vec![path],
        None => default_paths.to_vec(),
    };

    for path in &paths {
        if Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => {
                        info!(path, "loaded configuration");
                        return config;
                    }
                    Err(e) => {
                        eprintln!("error parsing {path}: {e}");
                        std::process::exit(1);
                    }
                },
                Err(e) => {
                    eprintln!("error reading {path}: {e}");
                    std::process::exit(1);
                }
            }
        }
    }

    if let Some(path) = cli_path {
        eprintln!("config file not found: {path}");
        std::process::exit(1);
    }

    info!("no config file found, using defaults");
    DaemonConfig::default()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    redriver_core::telemetry::init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let store: Arc<dyn Store> = Arc::new(RocksDbStore::open(&config.store.data_dir)?);
    let engine: Arc<dyn EngineSink> = Arc::new(HttpEngineSink::new(&config.engine)?);
    let dead_letters: Arc<dyn DeadLetterSink> =
        match WebhookDeadLetterSink::from_config(&config.alerting)? {
            Some(webhook) => Arc::new(webhook),
            None => Arc::new(LogDeadLetterSink),
        };

    info!(
        data_dir = %config.store.data_dir,
        submit_url = %config.engine.submit_url,
        "starting redriver"
    );
    let redriver = Redriver::new(config.redriver, store, engine, dead_letters)?;

    // The blocking HTTP sinks live on the poller thread; the async runtime
    // here exists only to wait for shutdown signals.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(shutdown_signal());

    redriver.shutdown()?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {},
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.expect("failed to install CTRL+C handler");
    }

    info!("received shutdown signal");
}
