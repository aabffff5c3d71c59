use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[cfg(target_os = "linux")]
use hostpulse_core::collector::RealFs;
#[cfg(not(target_os = "linux"))]
use hostpulse_core::collector::mock::MockFs;
use hostpulse_core::Store;
use hostpulse_core::collector::{Collector, CollectorConfig};
use hostpulse_web::background::collect_loop;
use hostpulse_web::{ListenerConfig, api_dispatcher, app, serve};

// ============================================================
// CLI
// ============================================================

#[derive(Parser)]
#[command(name = "hostpulse", about = "Host telemetry agent serving /proc readings as JSON", version = hostpulse_core::VERSION)]
struct Args {
    /// Address to bind, e.g. 0.0.0.0.
    address: String,

    /// Port to bind.
    port: u16,

    /// Path to /proc filesystem.
    #[arg(long, default_value = "/proc", env = "HOSTPULSE_PROC_PATH")]
    proc_path: PathBuf,

    /// Collector poll interval in milliseconds.
    #[arg(long, default_value = "1000", env = "HOSTPULSE_INTERVAL_MS")]
    interval_ms: u64,

    /// Kernel clock ticks per second.
    #[arg(long, default_value = "100")]
    clk_tck: u64,

    /// Maximum concurrent connections.
    #[arg(long, default_value = "256")]
    max_connections: usize,

    /// Seconds a client may take to send request headers.
    #[arg(long, default_value = "30")]
    header_timeout_secs: u64,

    /// Seconds allowed to handle one request.
    #[arg(long, default_value = "10")]
    request_timeout_secs: u64,

    /// Seconds a response write may stall on a client that is not reading.
    #[arg(long, default_value = "30")]
    write_timeout_secs: u64,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log errors only.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
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
    runtime.block_on(async_main(args));
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let default_filter = format!("hostpulse={level},hostpulse_web={level},hostpulse_core={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

async fn async_main(args: Args) {
    info!(version = hostpulse_core::VERSION, "starting");

    let store = Arc::new(Store::new());
    let collector_config = CollectorConfig {
        proc_path: args.proc_path.clone(),
        poll_interval: Duration::from_millis(args.interval_ms),
        clk_tck: args.clk_tck,
    };
    spawn_collector(store.clone(), collector_config);

    let listener_config = ListenerConfig {
        max_connections: args.max_connections,
        header_read_timeout: Duration::from_secs(args.header_timeout_secs),
        request_timeout: Duration::from_secs(args.request_timeout_secs),
        write_timeout: Duration::from_secs(args.write_timeout_secs),
    };
    let router = app(
        Arc::new(api_dispatcher(store)),
        listener_config.request_timeout,
    );

    let listener = match tokio::net::TcpListener::bind((args.address.as_str(), args.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(address = %args.address, port = args.port, error = %e, "failed to bind");
            process::exit(1);
        }
    };

    tokio::select! {
        _ = serve(listener, router, listener_config) => {}
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => info!("interrupted, exiting"),
                Err(e) => error!(error = %e, "failed to listen for ctrl-c"),
            }
        }
    }
}

fn spawn_collector(store: Arc<Store>, config: CollectorConfig) {
    #[cfg(target_os = "linux")]
    let fs = RealFs::new();
    #[cfg(not(target_os = "linux"))]
    let fs = MockFs::typical_system();

    let collector = Arc::new(Collector::new(fs, store, config));
    let config = collector.config();
    info!(
        proc_path = %config.proc_path.display(),
        interval_ms = config.poll_interval.as_millis() as u64,
        clk_tck = config.clk_tck,
        "starting collector"
    );
    tokio::spawn(collect_loop(collector));
}
