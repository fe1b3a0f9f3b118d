//! landmark-osc - Landmark Tracking Telemetry Service
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use landmark_osc::{
    config::Config,
    handle_event,
    output::OscEmitter,
    tracking::{pipeline::TrackingPipeline, receiver::DetectorReceiver},
    TrackingMode,
};

/// landmark-osc - smoothed face/body tracking telemetry over OSC
#[derive(Parser, Debug)]
#[command(name = "landmark-osc", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial tracking mode: face or body (overrides config)
    #[arg(short, long)]
    mode: Option<TrackingMode>,

    /// UDP port for detector packets (overrides config)
    #[arg(short, long)]
    listen_port: Option<u16>,

    /// OSC target host (overrides config)
    #[arg(long)]
    osc_host: Option<String>,

    /// OSC target port (overrides config)
    #[arg(long)]
    osc_port: Option<u16>,

    /// Smooth the raw body joint channels too
    #[arg(long)]
    smooth_joints: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", landmark_osc::NAME, landmark_osc::VERSION);

    let config = load_config(&args)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(config))?;

    info!("{} stopped", landmark_osc::NAME);
    Ok(())
}

/// Load configuration and apply CLI overrides
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    if let Some(mode) = args.mode {
        config.pipeline.initial_mode = mode;
    }
    if let Some(port) = args.listen_port {
        config.input.port = port;
    }
    if let Some(ref host) = args.osc_host {
        config.output.host = host.clone();
    }
    if let Some(port) = args.osc_port {
        config.output.port = port;
    }
    if args.smooth_joints {
        // Drop the passthrough entry so joints use the default parameters
        config.filters.channels.remove("body");
    }

    config.validate()?;

    info!("Initial mode: {}", config.pipeline.initial_mode);
    info!(
        "Default frame size: {}x{}",
        config.pipeline.frame_width, config.pipeline.frame_height
    );
    info!(
        "Body distance: visibility > {}, at least {} joints",
        config.pipeline.visibility_threshold, config.pipeline.min_visible_points
    );

    Ok(config)
}

/// Receive detector packets until shutdown, emitting telemetry per frame
async fn run(config: Config) -> anyhow::Result<()> {
    let mut pipeline = TrackingPipeline::new(&config.pipeline, &config.filters)?;
    let mut emitter = OscEmitter::new(&config.output)?;

    let mut receiver = DetectorReceiver::new(&config.input, config.pipeline.frame_size());
    receiver.start().await?;

    info!(
        "Tracking started (listen: {}:{}, osc: {})",
        config.input.listen_address,
        config.input.port,
        emitter.target()
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut parse_errors: u64 = 0;

    loop {
        tokio::select! {
            result = receiver.recv() => {
                match result {
                    Ok(event) => {
                        handle_event(&mut pipeline, &mut emitter, event);
                    }
                    Err(landmark_osc::LandmarkOscError::Tracking(
                        e @ landmark_osc::error::TrackingError::Parse(_),
                    )) => {
                        parse_errors += 1;
                        warn!("Dropping detector packet ({} so far): {}", parse_errors, e);
                    }
                    Err(e) => {
                        error!("Detector receive error: {}", e);
                        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    receiver.stop();
    info!(
        "Processed {} frames ({:.1} fps at exit)",
        pipeline.stats().frames(),
        pipeline.stats().fps()
    );

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
