use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use owl_panel::gps::{FixedPositionSource, NoPositionSource};
use owl_panel::recording::status_line;
use owl_panel::{
    Config, ConnectionState, Dispatcher, GpsSample, HttpTransport, Panel, PanelViews, PositionSource,
    Progress, RecordingView, SessionState, StatusBoard, StatusPoller, StatusView,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "owl-panel", version, about = "Control panel for an OWL appliance")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/owl-panel")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show system telemetry
    Status {
        /// Fetch once and exit instead of polling
        #[arg(long)]
        once: bool,
    },
    /// Record a clip; stops at the ceiling or on Ctrl-C
    Record {
        /// Attach a fixed position: LAT,LON[,ACC]
        #[arg(long)]
        gps: Option<String>,
    },
    /// Download the current camera frame
    Frame,
    /// Enable or disable weed detection
    Detection {
        #[arg(value_enum)]
        action: DetectionAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DetectionAction {
    Start,
    Stop,
}

struct TerminalRecordingView;

impl RecordingView for TerminalRecordingView {
    fn on_state(&self, state: SessionState) {
        let label = match state {
            SessionState::Idle => "Start Recording",
            SessionState::Starting => "Starting...",
            SessionState::Active => "Stop Recording",
            SessionState::Stopping => "Saving...",
        };
        println!("[{}]", label);
    }

    fn on_progress(&self, progress: &Progress, gps: Option<&GpsSample>) {
        println!("{}", status_line(progress, gps));
    }

    fn on_saved(&self, path: &Path) {
        println!("Saved {}", path.display());
    }
}

struct TerminalStatusView;

impl StatusView for TerminalStatusView {
    fn show_cpu(&self, percent: f64, _color: &str) {
        println!("CPU:         {}%", percent);
    }

    fn show_temperature(&self, celsius: f64, _color: &str) {
        println!("Temperature: {}°C", celsius);
    }

    fn show_memory(&self, percent: f64) {
        println!("Memory:      {}%", percent);
    }

    fn show_disk(&self, percent: f64) {
        println!("Disk:        {}%", percent);
    }

    fn show_detection(&self, enabled: bool) {
        println!("Detection:   {}", if enabled { "Enabled" } else { "Disabled" });
    }

    fn show_recording(&self, recording: bool) {
        println!("Recording:   {}", if recording { "Recording" } else { "Stopped" });
    }

    fn show_timestamp(&self, timestamp: &str) {
        println!("Updated:     {}", timestamp);
    }

    fn show_connection(&self, connection: &ConnectionState) {
        println!("Connection:  {}", connection.label());
    }
}

/// Telemetry is not shown while recording
struct QuietStatusView;

impl StatusView for QuietStatusView {}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("OWL panel v{}", env!("CARGO_PKG_VERSION"));
    info!("Appliance: {}", cfg.device.base_url);

    match cli.command {
        Command::Status { once } => run_status(&cfg, once).await,
        Command::Record { gps } => run_record(&cfg, gps.as_deref()).await,
        Command::Frame => {
            let panel = connect(&cfg, Arc::new(NoPositionSource))?;
            let result = panel.device.download_frame().await;
            panel.shutdown().await;
            let path = result.context("Frame download failed")?;
            println!("Saved {}", path.display());
            Ok(())
        }
        Command::Detection { action } => {
            let panel = connect(&cfg, Arc::new(NoPositionSource))?;
            let result = match action {
                DetectionAction::Start => panel.device.start_detection().await,
                DetectionAction::Stop => panel.device.stop_detection().await,
            };
            panel.shutdown().await;
            let ack = result.context("Detection command failed")?;
            println!("{}", ack.message.unwrap_or_else(|| "OK".to_string()));
            if !ack.success {
                bail!("Appliance rejected the command");
            }
            Ok(())
        }
    }
}

fn connect(cfg: &Config, position: Arc<dyn PositionSource>) -> Result<Panel> {
    let views = PanelViews {
        recording: Arc::new(TerminalRecordingView),
        status: Arc::new(QuietStatusView),
    };
    Panel::connect(cfg, position, views).context("Failed to create panel")
}

async fn run_status(cfg: &Config, once: bool) -> Result<()> {
    let transport = Arc::new(HttpTransport::new(&cfg.device.base_url)?);
    let dispatcher = Arc::new(Dispatcher::new(transport, cfg.dispatcher.default_timeout()));

    if once {
        let mut board = StatusBoard::default();
        StatusPoller::poll_once(&dispatcher, &mut board, &TerminalStatusView).await;
        if board.stats.is_none() {
            bail!("Could not reach {}", cfg.device.base_url);
        }
        return Ok(());
    }

    let mut poller = StatusPoller::spawn(dispatcher, &cfg.status, Arc::new(TerminalStatusView));
    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    poller.stop();
    Ok(())
}

async fn run_record(cfg: &Config, gps: Option<&str>) -> Result<()> {
    let position: Arc<dyn PositionSource> = match gps {
        Some(fix) => Arc::new(FixedPositionSource::parse(fix)?),
        None => Arc::new(NoPositionSource),
    };

    let mut panel = connect(cfg, position)?;
    if gps.is_some() {
        panel.gps.enable().context("Cannot start GPS")?;
        // Give the watch a chance to deliver its first fix
        let mut samples = panel.gps.samples();
        let _ = tokio::time::timeout(std::time::Duration::from_secs(2), samples.changed()).await;
    }

    let mut notifications = panel.notifications.subscribe();
    tokio::spawn(async move {
        while let Ok(n) = notifications.recv().await {
            println!("{}: {}", n.title, n.message);
        }
    });

    if panel.recording.start().await != SessionState::Active {
        panel.shutdown().await;
        bail!("Recording did not start");
    }

    let mut state = panel.recording.subscribe();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, stopping recording");
            panel.recording.stop().await;
        }
        _ = state.wait_for(|s| *s == SessionState::Idle) => {}
    }

    panel.shutdown().await;
    Ok(())
}
