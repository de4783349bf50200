//! qr-wayfinder daemon
//!
//! Reads decoded QR payloads from stdin, serves the IPC socket and speaks
//! guidance through the configured player. The `markers` command writes the
//! printable QR marker for every graph node.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::BufReader;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use qr_wayfinder::config::{Config, VoiceConfig};
use qr_wayfinder::controller::SessionController;
use qr_wayfinder::events::Event;
use qr_wayfinder::graph::{sample, Graph};
use qr_wayfinder::ipc::Server;
use qr_wayfinder::lifecycle::ShutdownSignal;
use qr_wayfinder::markers;
use qr_wayfinder::navigation::Navigator;
use qr_wayfinder::scan::ScanReader;
use qr_wayfinder::voice::{AudioOutput, CommandOutput, CueTable, LogOutput, VoiceService};

#[derive(Parser)]
#[command(name = "qr-wayfinder")]
#[command(author, version, about = "Indoor wayfinding by QR marker scans", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the wayfinding daemon (default)
    Run,

    /// Write one QR marker image per graph node
    Markers(MarkersArgs),
}

#[derive(Args)]
struct MarkersArgs {
    /// Output directory
    #[arg(short, long, default_value = "qr_codes")]
    out: PathBuf,

    /// Graph file, instead of the configured graph
    #[arg(short, long)]
    graph: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Markers(args) => write_markers(&config, args),
    }
}

/// Graph from `path`, or the built-in campus when none is configured
fn load_graph(path: Option<&PathBuf>) -> Result<Graph> {
    match path {
        Some(path) => Graph::load(path)
            .with_context(|| format!("failed to load graph {}", path.display())),
        None => Ok(sample::campus()),
    }
}

fn write_markers(config: &Config, args: MarkersArgs) -> Result<()> {
    let graph = load_graph(args.graph.as_ref().or(config.graph_path.as_ref()))?;
    let written = markers::write_all(&graph, &args.out)?;
    info!(count = written.len(), out = %args.out.display(), "markers written");
    Ok(())
}

async fn run(config: Config) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "qr-wayfinder starting");

    config.ensure_dirs()?;
    info!(?config.socket_path, ?config.graph_path, "configuration loaded");

    let graph = Arc::new(load_graph(config.graph_path.as_ref())?);

    let destination = config
        .default_destination
        .clone()
        .or_else(|| graph.destinations().first().map(|label| label.to_string()))
        .unwrap_or_default();
    if graph.destination_node_for(&destination).is_none() {
        warn!(%destination, "starting destination is not declared by any node");
    }
    info!(nodes = graph.len(), %destination, "graph ready");

    let shutdown = ShutdownSignal::new();

    // Controller and voice service -> IPC subscribers and the event log
    let (event_tx, _event_rx) = broadcast::channel::<Event>(64);
    // Scan reader and IPC clients -> controller
    let (control_tx, control_rx) = mpsc::channel(32);

    let (voice_service, voice) = VoiceService::new(
        build_output(&config.voice),
        CueTable::in_dir(&config.voice.audio_dir),
        event_tx.clone(),
    );
    tokio::spawn(voice_service.run());

    if config.voice.intro_on_start {
        voice.announce_intro().await;
    }

    let mut controller = SessionController::new(
        Navigator::new(Arc::clone(&graph), &destination),
        voice.clone(),
        event_tx.clone(),
    );

    let scan_reader = ScanReader::new(
        BufReader::new(tokio::io::stdin()),
        config.scan.lockout,
        control_tx.clone(),
    );
    tokio::spawn(scan_reader.run());

    let server = Server::new(
        &config.socket_path,
        control_tx,
        voice.clone(),
        controller.snapshots(),
        event_tx.clone(),
    )?;

    let mut log_rx = event_tx.subscribe();

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        _ = controller.run(control_rx) => {
            info!("session controller exited");
        }

        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        _ = async {
            loop {
                match log_rx.recv().await {
                    Ok(event) => info!(%event, "event"),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "event log receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        } => {
            info!("event log exited");
        }

        result = shutdown.wait() => match result {
            Ok(signal) => info!(?signal, "shutdown signal received"),
            Err(e) => error!(?e, "failed to register signal handlers"),
        }
    }

    // Cleanup
    info!("shutting down...");

    voice.set_muted(true).await;
    server.shutdown().await;

    info!("qr-wayfinder stopped");

    Ok(())
}

/// Pick the audio output for the configured player
fn build_output(config: &VoiceConfig) -> Box<dyn AudioOutput> {
    match config.player.split_first() {
        Some((program, args)) => {
            info!(%program, "using external player");
            let mut output =
                CommandOutput::new(program.clone(), args.to_vec(), config.require_gesture);
            if let Some(clip) = &config.unlock_clip {
                output = output.with_unlock_clip(clip.to_string_lossy());
            }
            Box::new(output)
        }
        None => {
            info!("no player configured, cues will be logged");
            Box::new(LogOutput::new(config.log_clip, config.require_gesture))
        }
    }
}
