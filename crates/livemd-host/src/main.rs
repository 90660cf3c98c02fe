//! `livemd`: live browser preview for a markdown file.
//!
//! # Startup Sequence
//!
//! 1. Parse the command line
//! 2. Load configuration (`--config`, else `livemd.yaml`, else defaults)
//! 3. Initialize structured logging (tracing)
//! 4. Open the source file and start the preview
//! 5. Print the preview URL
//! 6. Run the event loop until Ctrl-C or a fatal error
//! 7. Stop the preview server
//!
//! While running, the file is polled for modification, stdin lines of the
//! form `<line>[:<col>]` move the cursor, and double-clicks in the viewer
//! are logged as navigation requests.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use livemd_host::HostError;
use livemd_host::bridge::{EditorBridge, NAVIGATION_QUEUE_CAPACITY};
use livemd_host::config::{HostConfig, LogFormat, LoggingConfig};
use livemd_host::editor::{FileEditor, parse_cursor_command};
use livemd_host::live_preview::LivePreview;
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Live browser preview for a markdown file.
#[derive(Parser)]
#[command(name = "livemd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Markdown file to preview
    file: PathBuf,

    /// Path to the configuration file (defaults to ./livemd.yaml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), HostError> {
    let cli = Cli::parse();

    let mut config = HostConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_logging(&config.logging);
    info!(
        host = config.server.host,
        port = config.server.port,
        poll_interval_ms = config.watch.poll_interval_ms,
        "Configuration loaded"
    );

    let preview = Arc::new(LivePreview::with_markdown(config.server.clone()));
    let editor = FileEditor::open(&cli.file).await?;
    let mut bridge = EditorBridge::new(editor, Arc::clone(&preview), NAVIGATION_QUEUE_CAPACITY);

    let url = bridge.start().await?;
    println!("livemd preview: {url}");

    let result = run(&mut bridge, &config).await;

    info!("shutting down");
    preview.stop().await?;
    result
}

/// Initialize `tracing-subscriber`. `RUST_LOG` wins over the configured
/// level. Logs go to stderr so stdout stays clean for the URL.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init(),
    }
}

/// Drive the bridge from file changes, stdin and viewer requests until
/// Ctrl-C.
async fn run(bridge: &mut EditorBridge<FileEditor>, config: &HostConfig) -> Result<(), HostError> {
    let mut poll = tokio::time::interval(config.watch.poll_interval());
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                if let Err(e) = signal {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                }
                return Ok(());
            }

            _ = poll.tick() => match bridge.editor_mut().poll_changed().await {
                Ok(true) => {
                    info!(path = %bridge.editor().path().display(), "source changed");
                    if let Err(e) = bridge.buffer_changed().await {
                        warn!(error = %e, "failed to publish source");
                    }
                }
                Ok(false) => {}
                // Editors that save by rename leave the path missing briefly.
                Err(e) => warn!(error = %e, "failed to check source"),
            },

            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match parse_cursor_command(&line) {
                    Some(cursor) => bridge.cursor_moved(cursor.line, cursor.col).await?,
                    None => warn!(input = %line, "expected <line>[:<col>]"),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "stdin read failed, ignoring further input");
                    stdin_open = false;
                }
            },

            Some(line) = bridge.next_navigation() => {
                if let Err(e) = bridge.handle_navigation(line).await {
                    warn!(line, error = %e, "failed to publish navigated cursor");
                }
            }
        }
    }
}
