use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio::signal;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ratecount::config::MeterConfig;
use ratecount::{RateCounter, RatedReader, Unit};

/// Copy stdin to stdout while reporting the transfer rate.
#[derive(Parser, Debug)]
#[command(name = "ratecount", version, about)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Width of one slot in milliseconds
    #[arg(short, long)]
    resolution_ms: Option<u64>,

    /// Number of closed slots averaged into the rate
    #[arg(short = 'n', long)]
    windows: Option<usize>,

    /// Reporting interval in milliseconds
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Unit to report in (b, kb, mb, gb, tb, kib, mib, gib, tib)
    #[arg(short, long)]
    unit: Option<Unit>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing; stdout carries the data, so logs go to stderr
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    debug!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args)?;
    let settings = &config.meter;
    info!(
        resolution_ms = settings.resolution_ms,
        windows = settings.windows,
        unit = %settings.unit,
        "Configuration loaded"
    );

    let counter = Arc::new(config.build_counter()?);
    let unit = settings.unit;

    let copy = async {
        let mut reader = RatedReader::new(tokio::io::stdin(), counter.clone());
        let mut stdout = tokio::io::stdout();
        let copied = tokio::io::copy(&mut reader, &mut stdout).await?;
        stdout.flush().await?;
        Ok::<u64, std::io::Error>(copied)
    };
    tokio::pin!(copy);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut ticker = tokio::time::interval(settings.report_interval());
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            result = &mut copy => {
                let copied = result?;
                info!(bytes = copied, "Input exhausted");
                report(&counter, unit)?;
                break;
            }
            _ = ticker.tick() => {
                report(&counter, unit)?;
            }
            _ = &mut shutdown => {
                report(&counter, unit)?;
                break;
            }
        }
    }

    Ok(())
}

/// Build the configuration from the optional file, then apply CLI overrides.
fn load_config(args: &Args) -> anyhow::Result<MeterConfig> {
    let mut config = match &args.config {
        Some(path) => MeterConfig::from_file(path)?,
        None => MeterConfig::default(),
    };

    if let Some(resolution_ms) = args.resolution_ms {
        config.meter.resolution_ms = resolution_ms;
    }
    if let Some(windows) = args.windows {
        config.meter.windows = windows;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.meter.report_interval_ms = interval_ms;
    }
    if let Some(unit) = args.unit {
        config.meter.unit = unit;
    }

    config.validate()?;
    Ok(config)
}

/// Log the averaged rate in the configured unit.
fn report(counter: &RateCounter, unit: Unit) -> anyhow::Result<()> {
    let rate = counter.rate_per(unit.divisor())?;
    info!(
        "{} {} per {:?} (averaged over {:?})",
        rate,
        unit,
        counter.resolution(),
        counter.span()
    );
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping");
        }
        _ = terminate => {
            info!("Received SIGTERM, stopping");
        }
    }
}
