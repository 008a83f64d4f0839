//! Command line interface of the sidecar pair.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "leafside")]
#[command(version)]
#[command(about = "Sidecar pair joining dynamically created components to a NATS leaf-node fabric")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Run the registry sidecar next to the leaf broker
    Registry(RegistryArgs),
    /// Run the client sidecar next to an application component
    Client(ClientArgs),
}

#[derive(Args, Debug)]
pub(crate) struct RegistryArgs {
    /// Optional TOML configuration file; flags below override its values
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// NATS server to listen on for register/unregister requests
    #[arg(long)]
    pub(crate) nats_uri: Option<String>,

    /// Directory holding one creds file per network
    #[arg(long)]
    pub(crate) creds_dir: Option<PathBuf>,

    /// Broker configuration file to reconcile
    #[arg(long)]
    pub(crate) config_file: Option<PathBuf>,

    /// Usage-state file
    #[arg(long)]
    pub(crate) state_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ClientArgs {
    /// NATS server the registry listens on
    #[arg(long, default_value = "nats://leaf-nats.nats:4222")]
    pub(crate) nats_uri: String,

    /// Name of the component this is the sidecar for
    #[arg(long)]
    pub(crate) component: String,

    /// Path of the component's credentials file ({network}.creds)
    #[arg(long)]
    pub(crate) creds_file: PathBuf,

    /// Remote NATS address the leaf-node connects to for this network
    #[arg(long)]
    pub(crate) remote: String,

    /// Logical network to join; defaults to the creds file basename
    #[arg(long)]
    pub(crate) network: Option<String>,

    /// Public key of the network account
    #[arg(long)]
    pub(crate) account_public_key: Option<String>,
}
