//! Conntester Binary Entry Point
//!
//! Runs a connection monitor against one host until interrupted.
//! Core functionality is provided by the `conntester` library crate.

use std::time::Duration;

use clap::Parser;
use conntester::{
    AppConfig, ChannelObserver, Monitor, MonitorEvent, TracingObserver, config::parse_duration,
};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Capacity of the event channel feeding the console output.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Conntester - Connection Quality Monitor
#[derive(Parser, Debug)]
#[command(name = "conntester", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "CONNTESTER_CONFIG"
    )]
    config: String,

    /// Target host (overrides config file)
    #[arg(long, env = "CONNTESTER_HOST")]
    host: Option<String>,

    /// Probe interval, e.g. `500ms`, `2s` (overrides config file)
    #[arg(long, env = "CONNTESTER_INTERVAL", value_parser = parse_duration)]
    interval: Option<Duration>,

    /// Print every event as a JSON line on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,conntester=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration from file
    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::load(&cli.config)?;

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(host) = cli.host {
        config.monitor.host = host;
    }
    if let Some(interval) = cli.interval {
        config.monitor.interval = interval;
    }
    config.validate()?;

    tracing::info!(
        "Target: {} ({}), interval {:?}, timeout {:?}, history {:?}",
        config.monitor.host,
        config.monitor.probe,
        config.monitor.interval,
        config.monitor.timeout,
        config.monitor.history,
    );

    let (events, rx) = ChannelObserver::new(EVENT_CHANNEL_CAPACITY);
    let mut monitor = Monitor::new(config.to_monitor_config()?, config.build_probe()?)
        .with_observer(TracingObserver::new(&config.monitor.host))
        .with_observer(events);

    monitor.start()?;
    let printer = tokio::spawn(print_events(rx, cli.json));

    tracing::info!("Press Ctrl+C to shutdown");
    shutdown_signal().await;

    tracing::info!("Shutting down monitor...");
    match monitor.shutdown().await {
        Ok(Some(recorder)) => {
            tracing::info!(status = %recorder.status(), "Final: {}", recorder.statistics());
        }
        Ok(None) => {}
        Err(e) => tracing::error!("Failed to shutdown monitor: {}", e),
    }

    // The recorder held the last sender; the printer ends once it is dropped.
    if let Err(e) = printer.await {
        tracing::error!("Event printer failed: {}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Render monitor events on stdout.
async fn print_events(mut rx: broadcast::Receiver<MonitorEvent>, json: bool) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Console output lagging, events skipped");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        if json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "Failed to serialize event"),
            }
            continue;
        }

        match event {
            MonitorEvent::Statistics(stats) => println!("{stats}"),
            MonitorEvent::StatusChanged(t) => println!("Status: {} -> {}", t.from, t.to),
        }
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
