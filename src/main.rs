//! Leafside sidecar pair entry point.
//!
//! `leafside registry` runs the reconciliation service next to the leaf
//! broker; `leafside client` runs next to an application component and
//! announces/retracts its participation.

mod cli;
mod error;
mod observability;

use std::sync::Arc;

use clap::Parser;
use leafside_client::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use leafside_client::{ClientConfig, RegistryClient};
use leafside_registry::{JetStreamDrainer, Reconciler, RegistrySettings, RequestResponder};
use tokio::sync::watch;
use tracing::{info, warn};

use cli::{Cli, ClientArgs, Commands, RegistryArgs};
use error::{Error, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    observability::init_observability();

    match cli.command {
        Commands::Registry(args) => run_registry(args).await,
        Commands::Client(args) => run_client(args).await,
    }
}

/// Runs the registry until SIGINT/SIGTERM.
async fn run_registry(args: RegistryArgs) -> Result<()> {
    let settings = registry_settings(args)?;
    info!(
        nats_uri = %settings.nats_uri,
        config_file = %settings.config_file.display(),
        state_file = %settings.state_file.display(),
        "starting registry"
    );

    let drainer = Arc::new(JetStreamDrainer::new(
        settings.drain_interval(),
        settings.drain_max_attempts,
    ));
    let engine = Arc::new(Reconciler::new(settings.clone(), drainer)?);
    let nc = leafside_registry::responder::connect(&settings).await?;
    let responder = RequestResponder::new(nc, engine);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let responder_task = tokio::spawn(responder.run(shutdown_rx));

    wait_for_signal().await;
    info!("signal received, shutting down");
    // in-flight operations finish before the responder returns
    let _ = shutdown_tx.send(true);
    responder_task.await??;
    Ok(())
}

/// Registers the component, waits for a signal, unregisters.
async fn run_client(args: ClientArgs) -> Result<()> {
    let config = ClientConfig {
        nats_uri: args.nats_uri,
        component: args.component,
        creds_file: args.creds_file,
        network: args.network,
        remote_address: args.remote,
        account_public_key: args.account_public_key,
        request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
    };
    let nc = async_nats::connect(&config.nats_uri)
        .await
        .map_err(|e| Error::Connection(e.to_string()))?;
    let client = RegistryClient::new(nc, config)?;

    client.register().await?;
    info!("registered, waiting for shutdown signal");

    wait_for_signal().await;
    client.unregister().await?;
    info!("goodbye");
    Ok(())
}

/// Builds the registry settings from the optional TOML file plus flag
/// overrides.
fn registry_settings(args: RegistryArgs) -> Result<RegistrySettings> {
    let mut settings = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            toml::from_str::<RegistrySettings>(&text)
                .map_err(|e| Error::Config(e.to_string()))?
        }
        None => RegistrySettings::default(),
    };
    if let Some(nats_uri) = args.nats_uri {
        settings.nats_uri = nats_uri;
    }
    if let Some(creds_dir) = args.creds_dir {
        settings.creds_dir = creds_dir;
    }
    if let Some(config_file) = args.config_file {
        settings.config_file = config_file;
    }
    if let Some(state_file) = args.state_file {
        settings.state_file = state_file;
    }
    Ok(settings)
}

/// Waits for SIGINT or SIGTERM.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(e) = result {
                            warn!(error = %e, "failed to listen for SIGINT");
                        }
                    }
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "failed to listen for SIGINT");
                }
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for SIGINT");
        }
    }
}
