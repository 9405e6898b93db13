//! pingcheck Binary Entry Point
//!
//! Loads the receiver configuration and either runs collection on its
//! schedule until interrupted, or runs a single cycle with `--once`.

use std::sync::Arc;

use clap::Parser;
use pingcheck::{
    LogConsumer, MetricsConsumer, PingScraper, ReceiverConfig, ScrapeController,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// pingcheck - ICMP reachability prober
#[derive(Parser, Debug)]
#[command(name = "pingcheck", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "PINGCHECK_CONFIG"
    )]
    config: String,

    /// Use raw ICMP sockets (overrides config file)
    #[arg(long)]
    privileged: bool,

    /// Run a single collection cycle, print it as JSON and exit
    #[arg(long)]
    once: bool,

    /// Print every metric batch to stdout as a JSON line
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so JSON output on stdout stays machine-readable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pingcheck=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    tracing::info!(path = %cli.config, "Loading configuration");
    let mut config = ReceiverConfig::load(&cli.config)?;
    if cli.privileged {
        config.privileged = true;
    }

    tracing::info!(
        targets = config.targets.len(),
        privileged = config.privileged,
        timeout = ?config.cycle_timeout(),
        "Configuration loaded"
    );

    let consumer = Arc::new(LogConsumer::new().with_json(cli.json || cli.once));
    let scraper = PingScraper::with_icmp(config);
    let controller = ScrapeController::new(scraper, consumer.clone()).await?;

    if cli.once {
        return run_once(&controller, consumer.as_ref()).await;
    }

    let job = controller.start().await?;
    tracing::info!(schedule = %job.schedule, "Press Ctrl+C to shutdown");

    shutdown_signal().await;

    tracing::info!("Shutting down ping collection...");
    if let Err(e) = controller.shutdown().await {
        tracing::error!(error = %e, "Failed to shutdown ping collection");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Run a single cycle outside the scheduler.
async fn run_once(
    controller: &ScrapeController,
    consumer: &LogConsumer,
) -> Result<(), Box<dyn std::error::Error>> {
    controller.scraper().start(&CancellationToken::new()).await?;

    let (batch, err) = controller.collect_once().await;
    if let Some(err) = err {
        tracing::warn!(failed = err.len(), error = %err, "Ping cycle completed with errors");
    }
    let result = consumer.consume(batch).await;

    controller.scraper().shutdown().await?;
    result?;
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
