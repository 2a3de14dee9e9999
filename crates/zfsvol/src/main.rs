use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use zfsvol_apiserver::{ApiServer, AppState, Config as ApiConfig, DEFAULT_SOCKET_PATH};
use zfsvol_driver::{
    DriverConfig, MountStrategy, VolumeDriver, VolumeManager, ZfsPool, DEFAULT_VOLUME_BASE,
};

#[derive(Parser)]
#[command(name = "zfsvol", about = "Docker volume plugin backed by ZFS datasets")]
struct Cli {
    /// Root dataset to manage volumes under (e.g. rpool/docker)
    #[arg(long, env = "ZFSVOL_ROOT_DATASET")]
    root_dataset: String,
    /// Base path for volume mount directories and the state file
    #[arg(long, env = "ZFSVOL_VOLUME_BASE", default_value = DEFAULT_VOLUME_BASE)]
    volume_base: PathBuf,
    /// Socket to listen on when not socket-activated
    #[arg(long, env = "ZFSVOL_SOCKET", default_value = DEFAULT_SOCKET_PATH)]
    socket: PathBuf,
    /// Propagated-mount directory when running as a managed plugin
    #[arg(long, env = "ZFSVOL_PROPAGATED_MOUNT")]
    propagated_mount: Option<PathBuf>,
    /// Append logs to this file instead of stderr
    #[arg(long, env = "ZFSVOL_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_file.as_ref())?;

    run(cli).await
}

/// Install the log subscriber; `RUST_LOG` wins over the `DEBUG` toggle
fn init_tracing(log_file: Option<&PathBuf>) -> miette::Result<()> {
    let debug = std::env::var("DEBUG")
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(false);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(debug)));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    miette::miette!("Failed to open log file '{}': {}", path.display(), e)
                })?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

fn default_level(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Boolean spellings accepted for the `DEBUG` toggle
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn mount_strategy(propagated_mount: Option<&PathBuf>) -> MountStrategy {
    match propagated_mount {
        Some(anchor) => MountStrategy::escaped_from_anchor(anchor),
        None => MountStrategy::Direct,
    }
}

async fn run(cli: Cli) -> miette::Result<()> {
    info!(
        "Starting zfsvol: root_dataset={}, volume_base={}",
        cli.root_dataset,
        cli.volume_base.display()
    );

    let strategy = mount_strategy(cli.propagated_mount.as_ref());
    info!("Mountpoint strategy: {:?}", strategy);

    let config = DriverConfig::new(cli.root_dataset, cli.volume_base).with_mount_strategy(strategy);
    let manager = VolumeManager::open(config, Arc::new(ZfsPool::new())).await?;
    let driver: Arc<dyn VolumeDriver> = Arc::new(manager);

    let server = ApiServer::new(
        ApiConfig {
            socket_path: cli.socket,
        },
        Arc::new(AppState::new(driver)),
    );

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutting down gracefully...");
        signal_token.cancel();
    });

    if let Err(e) = server.run(token.cancelled_owned()).await {
        error!("Failed to serve volume plugin: {}", e);
        return Err(miette::miette!("Failed to serve volume plugin: {}", e));
    }

    info!("Shutdown complete");
    Ok(())
}

/// Resolve on ctrl-c or SIGTERM
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
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
