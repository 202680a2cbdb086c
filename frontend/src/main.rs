// frontend/src/main.rs

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use observatory_frontend::api::HttpApi;
use observatory_frontend::config::{self, DashboardConfig};
use observatory_frontend::control::{ChannelEvent, ControlChannel};
use observatory_frontend::dashboard::ChannelAction;
use observatory_frontend::status::{ServerPhase, StatusEvent, StatusPoller};
use observatory_frontend::telemetry::{GpsPanel, TelemetryEvent, TelemetrySubscriber};
use observatory_frontend::tools::local_sync_time;
use observatory_frontend::{Command, Dashboard};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tracing_subscriber::EnvFilter;

const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Headless observatory dashboard client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file (defaults to $OBS_DASHBOARD_CONFIG, then config/dashboard.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Device server base URL, overrides the config file
    #[arg(long)]
    base_url: Option<String>,
    /// Control channel websocket URL
    #[arg(long)]
    control_url: Option<String>,
    /// Log filter, overrides RUST_LOG (e.g. "debug" or "observatory_frontend=trace")
    #[arg(long)]
    log_level: Option<String>,
    /// Write the latest sschart/skymap PNGs into this directory
    #[arg(long)]
    image_dir: Option<PathBuf>,
    /// Open the control channel once the device server is running
    #[arg(long, default_value_t = false)]
    control: bool,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the device server status and active drivers
    Status,
    /// Start the device server with the configured device selection
    Start,
    /// Stop the device server
    Stop,
    /// Push the local clock (or --time) to the server
    SyncTime {
        /// Timestamp in Y:M:D-h:m:s form
        #[arg(long)]
        time: Option<String>,
    },
    /// Push an observing location to the server
    SyncLocation {
        #[arg(allow_hyphen_values = true)]
        lon: String,
        #[arg(allow_hyphen_values = true)]
        lat: String,
    },
    /// Check that plate-solver templates are installed
    CheckSolver {
        /// astrometry | astap
        solver: String,
    },
    /// Poll status, follow GPS telemetry and optionally the control channel
    Watch,
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(l) => EnvFilter::new(l),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_config(args: &Args) -> anyhow::Result<DashboardConfig> {
    let mut cfg = config::load_config(args.config.as_deref())?;
    if let Some(url) = &args.base_url {
        cfg.base_url = config::normalize_base_url(url.clone());
    }
    if let Some(url) = &args.control_url {
        cfg.control_url = url.clone();
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    let cfg = build_config(&args)?;
    tracing::info!("[MAIN] device server {}", cfg.base_http());
    let api = Arc::new(HttpApi::new(&cfg.base_http()).context("invalid base url")?);
    let poller = StatusPoller::new(api.clone());
    let mut dash = Dashboard::new(cfg);

    match args.command.unwrap_or(Cmd::Watch) {
        Cmd::Status => {
            dash.handle(poller.poll().await.into());
            print_server(&dash);
        }
        Cmd::Start => toggle_to(&mut dash, &poller, ServerPhase::Running).await?,
        Cmd::Stop => toggle_to(&mut dash, &poller, ServerPhase::Idle).await?,
        Cmd::SyncTime { time } => {
            dash.tools.fill_time(time.unwrap_or_else(local_sync_time));
            dash.tools.sync_time(api.as_ref(), &mut dash.notes).await;
            report(&dash.tools.time_info, dash.notes.last_error())?;
        }
        Cmd::SyncLocation { lon, lat } => {
            dash.tools.longitude = lon;
            dash.tools.latitude = lat;
            dash.tools.sync_location(api.as_ref(), &mut dash.notes).await;
            if !dash.tools.location_error.is_empty() && dash.notes.last_error().is_none() {
                bail!("{}", dash.tools.location_error);
            }
            report(&dash.tools.location_info, dash.notes.last_error())?;
        }
        Cmd::CheckSolver { solver } => {
            let present = dash
                .tools
                .check_solver(api.as_ref(), &solver, &mut dash.notes)
                .await;
            if !present {
                bail!("{}", dash.notes.last_error().unwrap_or("templates missing"));
            }
            println!("{solver}: templates present {}", dash.tools.solver_info);
        }
        Cmd::Watch => {
            let ctrl_c = async {
                let _ = tokio::signal::ctrl_c().await;
            };
            watch(dash, poller, args.image_dir, args.control, ctrl_c).await?
        }
    }
    Ok(())
}

/// Polls, then clicks the server button only if the server is not already
/// in the `target` phase.
async fn toggle_to(
    dash: &mut Dashboard,
    poller: &StatusPoller,
    target: ServerPhase,
) -> anyhow::Result<()> {
    dash.handle(poller.poll().await.into());
    if dash.server.phase == target {
        print_server(dash);
        return Ok(());
    }

    let Some(action) = dash.toggle_server() else {
        bail!("server request already in flight");
    };
    let mut cmds = dash.handle(poller.execute(action).await.into());
    while cmds.contains(&Command::PollStatus) {
        cmds = dash.handle(poller.poll().await.into());
    }
    if let Some(err) = dash.notes.last_error() {
        bail!("{err}");
    }
    print_server(dash);
    Ok(())
}

fn report(info: &str, error: Option<&str>) -> anyhow::Result<()> {
    if let Some(err) = error {
        bail!("{err}");
    }
    if !info.is_empty() {
        println!("{info}");
    }
    Ok(())
}

fn print_server(dash: &Dashboard) {
    println!("server: {:?} ({})", dash.server.phase, dash.server.notify);
    for d in &dash.server.drivers {
        println!("  driver: {d}");
    }
}

fn print_gps(gps: &GpsPanel) {
    println!(
        "{} fix={} lat={} lon={} sats={}/{}",
        gps.time, gps.fix, gps.lat_dms, gps.lon_dms, gps.used_count, gps.visible_count
    );
}

fn dump_images(gps: &GpsPanel, dir: &Path) {
    for (name, png) in [("sschart.png", gps.sschart_png()), ("skymap.png", gps.skymap_png())] {
        match png {
            Some(Ok(bytes)) => {
                if let Err(e) = std::fs::write(dir.join(name), bytes) {
                    tracing::warn!("[GPS] failed to write {name}: {e}");
                }
            }
            Some(Err(e)) => tracing::warn!("[GPS] bad {name} payload: {e}"),
            None => {}
        }
    }
}

fn spawn_poll(poller: &StatusPoller, tx: &UnboundedSender<StatusEvent>) {
    let poller = poller.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let _ = tx.send(poller.poll().await);
    });
}

fn spawn_connect(channel: &ControlChannel, tx: &UnboundedSender<ChannelEvent>) {
    let channel = channel.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        // failures already arrive as ChannelEvent::Error
        let _ = channel.connect(tx).await;
    });
}

async fn watch(
    mut dash: Dashboard,
    poller: StatusPoller,
    image_dir: Option<PathBuf>,
    mut want_control: bool,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    if let Some(dir) = &image_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {dir:?}"))?;
    }

    let (status_tx, mut status_rx) = unbounded_channel::<StatusEvent>();
    let (chan_tx, mut chan_rx) = unbounded_channel::<ChannelEvent>();
    let (tele_tx, mut tele_rx) = unbounded_channel::<TelemetryEvent>();

    let alive = Arc::new(AtomicBool::new(true));
    let subscriber = TelemetrySubscriber::new(dash.config.telemetry_ws_url());
    {
        let alive = alive.clone();
        tokio::spawn(async move { subscriber.supervise(tele_tx, alive).await });
    }

    let base = dash.config.base_http();
    let client = reqwest::Client::new();
    match dash.skymap.load_overlay(&client, &base).await {
        Ok(n) => tracing::info!("[SKY] {n} overlay features"),
        Err(e) => tracing::warn!("[SKY] overlay unavailable: {e}"),
    }

    let channel = ControlChannel::new(dash.config.control_url.clone());
    let mut ticker = tokio::time::interval(STATUS_POLL_INTERVAL);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => spawn_poll(&poller, &status_tx),
            Some(ev) = status_rx.recv() => {
                for cmd in dash.handle(ev.into()) {
                    match cmd {
                        Command::PollStatus => spawn_poll(&poller, &status_tx),
                    }
                }
                if want_control && dash.toggle_channel() == Some(ChannelAction::Connect) {
                    want_control = false;
                    spawn_connect(&channel, &chan_tx);
                }
            }
            Some(ev) = chan_rx.recv() => {
                dash.handle(ev.into());
            }
            Some(ev) = tele_rx.recv() => {
                let is_sample = matches!(ev, TelemetryEvent::Sample(_));
                dash.handle(ev.into());
                if is_sample {
                    print_gps(&dash.gps);
                    if let Some(dir) = &image_dir {
                        dump_images(&dash.gps, dir);
                    }
                }
            }
            _ = &mut shutdown => {
                tracing::info!("[MAIN] shutting down");
                break;
            }
        }
        for err in dash.notes.take_errors() {
            eprintln!("error: {err}");
        }
    }

    alive.store(false, Ordering::Relaxed);
    channel.disconnect();
    Ok(())
}
