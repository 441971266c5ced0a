//! KezBoard - turn a MIDI keyboard into a macro keyboard
//!
//! Routes MIDI notes to OS keystrokes, with an interactive console editor for
//! bindings and a websocket piano overlay.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kezboard::bindings::BindingStore;
use kezboard::console::input::{is_quit_key, KeyReader, RawModeGuard};
use kezboard::console::{ConsoleEditor, TerminalOutput};
use kezboard::display::{self, DisplayHub, DEFAULT_DISPLAY_PORT};
use kezboard::inject::{ConsoleInjector, KeyInjector, RdevInjector};
use kezboard::paths::AppPaths;
use kezboard::router::EventRouter;
use kezboard::transport::{self, MidirTransport};

/// KezBoard - play keyboard shortcuts from a MIDI keyboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the binding config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log to stderr instead of the rolling log file
    #[arg(long)]
    log_stderr: bool,

    /// Piano display port
    #[arg(long, env = "KEZBOARD_DISPLAY_PORT", default_value_t = DEFAULT_DISPLAY_PORT)]
    display_port: u16,

    /// Piano display bind address
    #[arg(long, default_value = "0.0.0.0")]
    display_bind: IpAddr,

    /// Do not start the piano display server
    #[arg(long)]
    no_display: bool,

    /// Log keystrokes instead of sending them to the OS
    #[arg(long)]
    dry_run: bool,

    /// List available MIDI input devices
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    if args.list_devices {
        transport::list_devices_formatted();
        return Ok(());
    }

    let mut paths = AppPaths::detect();
    if let Some(config) = &args.config {
        paths = paths.with_config(config);
    }
    paths.ensure_directories()?;

    let _log_guard = init_logging(&args.log_level, args.log_stderr, &paths)?;

    info!("Starting KezBoard v{}...", env!("CARGO_PKG_VERSION"));
    info!("Binding config: {}", paths.config.display());

    let store = Arc::new(BindingStore::load(&paths.config).with_context(|| {
        format!("Failed to load bindings from {}", paths.config.display())
    })?);
    info!("Loaded {} bindings", store.bindings().len());

    let injector: Arc<dyn KeyInjector> = if args.dry_run {
        Arc::new(ConsoleInjector::new("dry-run"))
    } else {
        Arc::new(RdevInjector::new())
    };
    info!("Keystroke injector: {}", injector.name());

    let hub = Arc::new(DisplayHub::new());
    if args.no_display {
        info!("Piano display disabled");
    } else {
        let addr = SocketAddr::new(args.display_bind, args.display_port);
        let server_hub = hub.clone();
        tokio::spawn(async move {
            if let Err(e) = display::start_server(server_hub, addr).await {
                error!("Piano display server failed: {:#}", e);
            }
        });
    }

    let router = Arc::new(EventRouter::new(store.clone(), injector, hub));

    run_app(store, router).await?;

    info!("KezBoard shutdown complete");
    Ok(())
}

async fn run_app(store: Arc<BindingStore>, router: Arc<EventRouter>) -> Result<()> {
    let (transport, mut note_rx) = MidirTransport::new();
    let mut editor = ConsoleEditor::new(
        store,
        router,
        transport,
        Box::new(TerminalOutput::new()),
    );
    let _raw_mode = RawModeGuard::enable()
        .map_err(|e| warn!("Console is not interactive: {:#}", e))
        .ok();

    editor.start().context("Failed to save MIDI device")?;

    let (_key_reader, mut key_rx) = KeyReader::spawn();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    info!("Starting main event loop...");

    loop {
        tokio::select! {
            Some(event) = note_rx.recv() => {
                debug!(note = event.note, kind = ?event.kind, "MIDI note");
                if let Err(e) = editor.route_note(event) {
                    warn!("Keystroke delivery failed: {}", e);
                }
            }

            Some(key) = key_rx.recv() => {
                if is_quit_key(&key) {
                    info!("Quit requested from console");
                    break;
                }
                editor.handle_key(&key);
            }

            _ = &mut shutdown => {
                break;
            }
        }
    }

    Ok(())
}

/// Set up logging to the rolling file or stderr
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging(level: &str, to_stderr: bool, paths: &AppPaths) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if to_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()
            .context("Failed to initialize logging")?;
        return Ok(None);
    }

    // The console belongs to the editor, so logs go to a file
    let appender = tracing_appender::rolling::daily(&paths.logs_dir, "kezboard.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(Some(guard))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}
