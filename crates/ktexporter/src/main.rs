//! ktexporter - Prometheus exporter for Kyoto Tycoon.
//!
//! Every scrape of the telemetry path fetches `/rpc/report` from the
//! configured server once and exports what it finds.

mod access_log;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use clap::Parser;
use tower_http::compression::CompressionLayer;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use ktexporter_core::collector::{Collector, CollectorConfig, DEFAULT_SERVER, MetricDescriptors};

use access_log::AccessLogLayer;
use state::{ExporterInner, SharedState};

// ============================================================
// CLI
// ============================================================

#[derive(Parser, Debug)]
#[command(
    name = "ktexporter",
    about = "Prometheus exporter for Kyoto Tycoon",
    version = ktexporter_core::VERSION
)]
struct Args {
    /// HTTP API address of a Kyoto Tycoon server.
    #[arg(long = "kt.server", default_value = DEFAULT_SERVER, env = "KT_SERVER")]
    kt_server: String,

    /// Timeout on HTTP requests to Kyoto Tycoon (e.g. "200ms", "2s").
    #[arg(
        long = "kt.timeout",
        default_value = "200ms",
        env = "KT_TIMEOUT",
        value_parser = parse_timeout
    )]
    kt_timeout: Duration,

    /// Address to listen on for web interface and telemetry.
    #[arg(
        long = "web.listen-address",
        default_value = "0.0.0.0:9107",
        env = "KT_EXPORTER_LISTEN"
    )]
    listen_address: String,

    /// Path under which to expose metrics.
    #[arg(long = "web.telemetry-path", default_value = "/metrics")]
    telemetry_path: String,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Parses `--kt.timeout`. A bare `0` is accepted as a zero duration.
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(s).map_err(|e| format!("invalid duration {s:?}: {e}"))
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["ktexporter", "ktexporter_core"] {
        if let Ok(directive) = format!("{target}={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

// ============================================================
// Router
// ============================================================

const SNAPSHOT_PATH: &str = "/api/v1/snapshot";
const HEALTH_PATH: &str = "/health";

/// Checks that the telemetry path is a plain absolute path that does not
/// collide with the other routes.
fn validate_telemetry_path(path: &str) -> Result<(), String> {
    if !path.starts_with('/') {
        return Err(format!("telemetry path must start with '/': {path}"));
    }
    if ["/", SNAPSHOT_PATH, HEALTH_PATH].contains(&path) {
        return Err(format!("telemetry path is already served by another route: {path}"));
    }
    if path.contains(['{', '}', ':', '*']) {
        return Err(format!(
            "telemetry path must not contain route parameters or wildcards: {path}"
        ));
    }
    Ok(())
}

fn app(state: SharedState) -> Router {
    let telemetry_path = state.telemetry_path.clone();

    Router::new()
        .route("/", get(handlers::handle_index))
        .route(&telemetry_path, get(handlers::handle_metrics))
        .route(SNAPSHOT_PATH, get(handlers::handle_snapshot))
        .route(HEALTH_PATH, get(handlers::handle_health))
        .with_state(state)
        .layer(AccessLogLayer::new(&telemetry_path))
        .layer(CompressionLayer::new())
}

// ============================================================
// Main
// ============================================================

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(async_main(args)) {
        error!("{e}");
        process::exit(1);
    }
}

async fn async_main(args: Args) -> Result<(), String> {
    info!(version = ktexporter_core::VERSION, "starting ktexporter");

    validate_telemetry_path(&args.telemetry_path)?;

    let descriptors = Arc::new(MetricDescriptors::standard());
    let config = CollectorConfig {
        server: args.kt_server.clone(),
        timeout: args.kt_timeout,
    };
    let collector = Collector::new(&config, descriptors).map_err(|e| e.to_string())?;

    info!(
        url = collector.report_url(),
        timeout_ms = config.timeout.as_millis() as u64,
        telemetry_path = %args.telemetry_path,
        "collector configured"
    );

    let state: SharedState = Arc::new(ExporterInner {
        collector,
        telemetry_path: args.telemetry_path.clone(),
    });

    let app = app(state).into_make_service_with_connect_info::<SocketAddr>();

    let addr: SocketAddr = args
        .listen_address
        .parse()
        .map_err(|e| format!("invalid listen address {}: {e}", args.listen_address))?;
    info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("server error: {e}"))
}
