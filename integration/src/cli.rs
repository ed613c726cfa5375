//! Definition of the CLI arguments for integration tests

use clap::Parser;
use orbit_scripts::{
    cli::ScriptPaths,
    env::{ChainEndpoints, Wallets},
};

use crate::constants::DEFAULT_DOMAIN;

/// CLI tool for running the deployment smoke tests against live chains.
///
/// Under CI the chains are reached on their local ports, otherwise on the
/// public testnet endpoints of the configured domain.
#[derive(Parser)]
pub(crate) struct Cli {
    /// Test to run, every test if unset
    #[arg(short, long)]
    pub(crate) test: Option<String>,

    /// Set when running under CI
    #[arg(long, env = "CI")]
    pub(crate) ci: Option<String>,

    /// Domain of the public testnet endpoints
    #[arg(long, env = "DOMAIN", default_value = DEFAULT_DOMAIN)]
    pub(crate) domain: String,

    /// The bridged chains
    #[command(flatten)]
    pub(crate) endpoints: ChainEndpoints,

    /// The vault wallet
    #[command(flatten)]
    pub(crate) wallets: Wallets,

    /// The artifacts and templates the deployment reads
    #[command(flatten)]
    pub(crate) paths: ScriptPaths,
}
