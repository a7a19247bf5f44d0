//! # CLI Interface
//!
//! Command-line arguments for `valyu-node`, defined with `clap` derive.
//! Every option that configures storage or key sealing also reads from a
//! `VALYU_*` environment variable.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// did:valyu identifier service.
///
/// Mints and resolves did:valyu user and data identifiers, either as a
/// long-running HTTP service or through one-shot subcommands.
#[derive(Parser, Debug)]
#[command(
    name = "valyu-node",
    about = "did:valyu identifier service",
    version,
    propagate_version = true
)]
pub struct ValyuNodeCli {
    /// Log output format: "pretty" or "json".
    #[arg(long, global = true, env = "VALYU_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP API and Prometheus metrics.
    Run(RunArgs),
    /// Create a user identifier and print its DID Document.
    CreateUser(CreateUserArgs),
    /// Create a data identifier and print its DID Document.
    CreateData(CreateDataArgs),
    /// Resolve a DID and print the resolution result.
    Resolve(ResolveArgs),
    /// Print version information and exit.
    Version,
}

/// Storage and key-sealing options shared by every stateful subcommand.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Directory holding the identifier database. Created if missing.
    #[arg(long, short = 'd', env = "VALYU_DATA_DIR", default_value = "./valyu-data")]
    pub data_dir: PathBuf,

    /// Hex-encoded 32-byte secret used to seal private keys at rest.
    #[arg(long, env = "VALYU_KMS_SECRET_KEY", hide_env_values = true)]
    pub kms_secret_key: String,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Port for the HTTP API.
    #[arg(long, env = "VALYU_API_PORT", default_value_t = 8080)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "VALYU_METRICS_PORT", default_value_t = 9090)]
    pub metrics_port: u16,
}

#[derive(Args, Debug)]
pub struct CreateUserArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub alias: String,
}

#[derive(Args, Debug)]
pub struct CreateDataArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub alias: String,

    /// Address of the data token contract.
    #[arg(long)]
    pub data_token_address: String,

    /// Chain the data token lives on.
    #[arg(long)]
    pub chain_id: String,

    /// Endpoint where the data can be accessed.
    #[arg(long)]
    pub access_endpoint: String,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// The DID to resolve.
    pub did: String,
}
