//! Points daemon: entry point for serving a points ledger over HTTP.

mod config;
mod shutdown;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use points_ledger::PointsLedger;
use points_rpc::{AppState, RpcServer};
use points_store_lmdb::{check_data_dir, check_integrity, LmdbEnvironment};
use points_utils::{init_logging, LogFormat};
use tracing::{error, info};

use crate::config::DaemonConfig;

/// Databases opened in the environment, with headroom for later additions.
const MAX_DBS: u32 = 8;

#[derive(Parser)]
#[command(name = "points-daemon", about = "FIFO points ledger daemon")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "POINTS_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the LMDB environment.
    #[arg(long, env = "POINTS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// LMDB map size in megabytes.
    #[arg(long, env = "POINTS_MAP_SIZE_MB")]
    map_size_mb: Option<usize>,

    /// Address the HTTP server binds to.
    #[arg(long, env = "POINTS_BIND_ADDRESS")]
    bind_address: Option<IpAddr>,

    /// HTTP port.
    #[arg(long, env = "POINTS_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Log format: "human" or "json".
    #[arg(long, env = "POINTS_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "POINTS_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Open the ledger and serve HTTP until interrupted.
    Serve,
    /// Print the effective configuration as TOML.
    PrintConfig,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<DaemonConfig> {
        let base = match &self.config {
            Some(path) => DaemonConfig::from_toml_file(path)?,
            None => DaemonConfig::default(),
        };
        Ok(DaemonConfig {
            data_dir: self.data_dir.clone().unwrap_or(base.data_dir),
            map_size_mb: self.map_size_mb.unwrap_or(base.map_size_mb),
            bind_address: self.bind_address.unwrap_or(base.bind_address),
            rpc_port: self.rpc_port.unwrap_or(base.rpc_port),
            log_format: self.log_format.unwrap_or(base.log_format),
            log_level: self.log_level.clone().unwrap_or(base.log_level),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    match cli.command {
        Command::Serve => serve(config).await,
        Command::PrintConfig => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

async fn serve(config: DaemonConfig) -> anyhow::Result<()> {
    init_logging(config.log_format, &config.log_level);
    info!(
        data_dir = %config.data_dir.display(),
        map_size_mb = config.map_size_mb,
        "starting points daemon"
    );

    check_data_dir(&config.data_dir).map_err(anyhow::Error::msg)?;
    let env = LmdbEnvironment::open(&config.data_dir, MAX_DBS, config.map_size_bytes())
        .with_context(|| format!("failed to open ledger at {}", config.data_dir.display()))?;

    let report = check_integrity(&env)?;
    if !report.is_healthy() {
        for problem in &report.errors {
            error!("integrity: {}", problem);
        }
        anyhow::bail!(
            "ledger integrity check failed with {} error(s)",
            report.errors.len()
        );
    }

    let ledger = PointsLedger::new(env.grant_store());
    let summary = ledger.summary()?;
    info!(
        grants = summary.grants,
        payers = summary.payers,
        total_remaining = summary.total_remaining,
        "ledger opened"
    );

    let addr = SocketAddr::new(config.bind_address, config.rpc_port);
    let state = Arc::new(AppState::new(ledger));
    RpcServer::new(addr, state)
        .serve(shutdown::wait_for_signal())
        .await?;

    info!("points daemon exited cleanly");
    Ok(())
}
