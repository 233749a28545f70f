//! Headless tracking client.
//!
//! Reads sensor samples and user commands as newline-delimited JSON on stdin
//! and drives a map session whose rendering goes to the log.
//!
//! ```text
//! {"type": "sample", "coordinate": {"latitude": 21.25, "longitude": 81.63}, "accuracy_m": 12}
//! {"type": "sensor_error", "code": "timeout"}
//! {"type": "route", "destination": "Telibandha Talab"}
//! {"type": "nearest", "kind": "police"}
//! {"type": "close_panel"}
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use zonewatch::config::ClientConfig;
use zonewatch::session::HttpMapSession;
use zonewatch::surface::TracingSurface;
use zonewatch::tracking::{self, Sample, SensorFeed};
use zonewatch::{FacilityKind, SensorError};

type Session = HttpMapSession<TracingSurface>;

#[derive(Parser, Debug)]
#[command(name = "tracker")]
#[command(about = "Live crime-zone tracking client")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Zone server URL, overrides the configuration
    #[arg(short, long)]
    server: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Command {
    Sample(Sample),
    SensorError {
        code: SensorErrorCode,
        #[serde(default)]
        message: Option<String>,
    },
    Route {
        destination: String,
    },
    ClearRoute,
    ClosePanel,
    Nearest {
        kind: String,
    },
    Weather,
    Zones,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SensorErrorCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

impl SensorErrorCode {
    fn into_error(self, message: Option<String>) -> SensorError {
        match self {
            SensorErrorCode::PermissionDenied => SensorError::PermissionDenied,
            SensorErrorCode::PositionUnavailable => {
                SensorError::PositionUnavailable(message.unwrap_or_default())
            }
            SensorErrorCode::Timeout => SensorError::Timeout,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => ClientConfig::load_from_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(server) = args.server {
        config.server.base_url = server;
    }

    info!("Zonewatch Tracker");
    info!("Zone server: {}", config.server.base_url);

    let ui = Arc::new(TracingSurface::new(config.map.initial_zoom));
    let session = Session::from_config(&config, ui)?;
    let (feed, sensor) = tracking::channel();

    let zones = session.start().await;
    info!("{} zones on the map", zones);

    let commands = read_commands(&session, feed);
    let (tracked, read) = tokio::join!(session.track(&sensor), commands);
    read?;
    tracked.context("Location tracking failed")?;

    info!("Input closed, exiting");
    Ok(())
}

/// Forward stdin lines until EOF. User commands run concurrently with each
/// other and with sample processing.
async fn read_commands(session: &Session, feed: SensorFeed) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = FuturesUnordered::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("Failed to read stdin")? {
                    Some(line) => {
                        if let Some(task) = dispatch(session, &feed, &line) {
                            pending.push(task);
                        }
                    }
                    None => break,
                }
            }
            Some(()) = pending.next(), if !pending.is_empty() => {}
        }
    }

    // Ends the sensor stream, and with it tracking
    drop(feed);
    while pending.next().await.is_some() {}
    Ok(())
}

fn dispatch<'a>(
    session: &'a Session,
    feed: &SensorFeed,
    line: &str,
) -> Option<LocalBoxFuture<'a, ()>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let command: Command = match serde_json::from_str(line) {
        Ok(command) => command,
        Err(e) => {
            warn!("Ignoring malformed input line: {}", e);
            return None;
        }
    };

    match command {
        Command::Sample(sample) => {
            feed.sample(sample);
            None
        }
        Command::SensorError { code, message } => {
            feed.error(code.into_error(message));
            None
        }
        Command::Route { destination } => Some(
            async move {
                if let Ok(route) = session.request_route(&destination).await {
                    info!(id = %route.id, "Route active to {}", route.destination_query);
                }
            }
            .boxed_local(),
        ),
        Command::ClearRoute => {
            session.clear_route();
            None
        }
        Command::ClosePanel => {
            session.close_panel();
            None
        }
        Command::Nearest { kind } => {
            let kind = FacilityKind::from_tag(&kind);
            Some(
                async move {
                    let _ = session.locate_nearest(&kind).await;
                }
                .boxed_local(),
            )
        }
        Command::Weather => Some(
            async move {
                let _ = session.show_weather().await;
            }
            .boxed_local(),
        ),
        Command::Zones => Some(
            async move {
                session.draw_zones().await;
            }
            .boxed_local(),
        ),
    }
}
