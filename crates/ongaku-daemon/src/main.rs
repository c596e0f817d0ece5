mod bridge;
mod control;
mod frame;
mod poller;
mod state;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ongaku_core::{AppConfig, CoreError, TokenStore};

#[derive(Debug, Parser)]
#[command(name = "ongakud", about = "Now-playing detection daemon and status relay")]
struct Args {
    /// Backend origin override, e.g. http://127.0.0.1:8888
    #[arg(long)]
    backend: Option<String>,

    /// Bridge socket port override
    #[arg(long)]
    bridge_port: Option<u16>,

    /// Control socket port override
    #[arg(long)]
    control_port: Option<u16>,

    /// Log to stderr instead of the data-dir log file
    #[arg(long)]
    stderr_log: bool,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ongaku_daemon=debug"))
}

#[tokio::main]
async fn main() -> Result<(), CoreError> {
    let args = Args::parse();

    // The appender guard must outlive the runtime for logs to flush.
    let mut _log_guard = None;
    if args.stderr_log {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .init();
    } else {
        let log_dir = AppConfig::log_dir();
        std::fs::create_dir_all(&log_dir)?;
        let appender = tracing_appender::rolling::daily(&log_dir, "ongakud.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        _log_guard = Some(guard);
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(writer)
            .with_ansi(false)
            .init();
        info!("log dir: {}", log_dir.display());
    }

    let mut config = AppConfig::load()?;
    if let Some(backend) = args.backend {
        config.backend.origin = backend;
    }
    if let Some(port) = args.bridge_port {
        config.bridge.port = port;
    }
    if let Some(port) = args.control_port {
        config.control.port = port;
    }

    let tokens = TokenStore::open_default()?;
    let daemon = state::Daemon::new(config, tokens);

    let _bridge_task = daemon.bridge.spawn_listener(daemon.config.bridge.port);
    let _control_task = control::spawn_listener(daemon.clone(), daemon.config.control.port);
    let _report_task = poller::spawn_report_loop(daemon.clone());
    let _display_task = poller::spawn_display_loop(daemon.clone());

    info!(
        backend = %daemon.config.backend.origin,
        report_interval = daemon.config.poll.report_interval_secs,
        display_interval = daemon.config.poll.display_interval_secs,
        "ongakud running"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}
