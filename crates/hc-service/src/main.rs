use anyhow::Context;
use clap::{Parser, Subcommand};
use hc_service::{AppState, build_state};
use hcm_cloud::{Kit, ResourceKind, Vendor};
use hcm_config::ServiceConfig;
use hcm_sync::SyncRequest;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// How long queued notices get to drain on shutdown
const NOTICE_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "hc-service")]
#[command(about = "HCM vendor adaptor service", long_about = None)]
struct Cli {
    /// Config file (default: HCM_CONFIG_PATH, ./hc-service.yaml, ~/.config/hcm/hc-service.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Listen address, overrides server.listen
        #[arg(short, long)]
        listen: Option<String>,
    },
    /// Config file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Run one sync pass and print the result
    Sync {
        /// tcloud, aws, huawei, gcp or azure
        vendor: Vendor,
        /// vpc, subnet or network-interface
        kind: ResourceKind,
        #[arg(long)]
        account_id: String,
        #[arg(long, default_value = "")]
        region: String,
        #[arg(long)]
        zone: Option<String>,
        /// Azure resource group
        #[arg(long)]
        resource_group: Option<String>,
        /// Restrict the pass to these cloud ids (repeatable)
        #[arg(long = "cloud-id")]
        cloud_ids: Vec<String>,
        /// Network interfaces of these instances (repeatable)
        #[arg(long = "cloud-cvm-id")]
        cloud_cvm_ids: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a default config file
    Init {
        #[arg(short, long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hc_service=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { listen } => {
            let mut config = ServiceConfig::load(cli.config.as_deref())?;
            if let Some(listen) = listen {
                config.server.listen = listen;
            }
            let addr = config.listen_addr()?;

            let (state, worker) = build_state(&config).await?;
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("bind {}", addr))?;

            hc_service::serve(listener, Arc::new(state), shutdown_signal()).await?;

            // the queue closes once the last state clone is gone
            if tokio::time::timeout(NOTICE_DRAIN_TIMEOUT, worker).await.is_err() {
                tracing::warn!("notice worker did not drain in time");
            }
        }
        Commands::Config { command } => match command {
            ConfigCommands::Init { path, force } => {
                let path = match path {
                    Some(path) => path,
                    None => hcm_config::default_config_path()?,
                };
                let written = hcm_config::init_config(&path, force)?;
                println!("wrote {}", written.display());
            }
            ConfigCommands::Show => {
                let config = ServiceConfig::load(cli.config.as_deref())?;
                print!("{}", config.to_yaml()?);
            }
        },
        Commands::Sync {
            vendor,
            kind,
            account_id,
            region,
            zone,
            resource_group,
            cloud_ids,
            cloud_cvm_ids,
        } => {
            let config = ServiceConfig::load(cli.config.as_deref())?;
            let (state, _worker) = build_state(&config).await?;

            let mut req = SyncRequest::new(account_id, region)
                .with_cloud_ids(cloud_ids)
                .with_cloud_cvm_ids(cloud_cvm_ids);
            if let Some(zone) = zone {
                req = req.with_zone(zone);
            }
            if let Some(rg) = resource_group {
                req = req.with_resource_group(rg);
            }

            run_sync(&state, vendor, kind, &req).await?;
        }
    }

    Ok(())
}

async fn run_sync(
    state: &AppState,
    vendor: Vendor,
    kind: ResourceKind,
    req: &SyncRequest,
) -> anyhow::Result<()> {
    let kt = Kit::new();
    let result = state
        .sync(&kt, vendor, kind, req)
        .await
        .with_context(|| format!("sync {} {} (rid {})", vendor, kind, kt.rid))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
