//! Implementations of the various deploy scripts

mod configure_tangle;
mod deploy;
mod deposit;
mod faucet;
mod transfer_ownership;

pub use configure_tangle::configure_tangle;
pub use deploy::deploy_with_args;
pub use deposit::deposit;
pub use faucet::faucet;
pub use transfer_ownership::transfer_ownership;

use alloy::transports::http::reqwest::Url;

use crate::{
    cli::ScriptPaths,
    env::{ChainEndpoints, Wallets},
    errors::ScriptError,
};

/// Everything a command needs besides its own arguments
#[derive(Debug, Clone)]
pub struct ScriptContext {
    /// The chain ids and local ports of the bridged chains
    pub endpoints: ChainEndpoints,
    /// The vault and deployer wallets
    pub wallets: Wallets,
    /// The files read and written by the commands
    pub paths: ScriptPaths,
    /// JSON-RPC URLs used instead of the local ports, in chain order
    pub remote_rpc_urls: Option<Vec<Url>>,
}

impl ScriptContext {
    /// A context connecting to the chains on their local ports
    pub fn new(endpoints: ChainEndpoints, wallets: Wallets, paths: ScriptPaths) -> Self {
        Self {
            endpoints,
            wallets,
            paths,
            remote_rpc_urls: None,
        }
    }

    /// The JSON-RPC URLs of every chain the commands operate on
    pub fn rpc_urls(&self) -> Result<Vec<Url>, ScriptError> {
        match &self.remote_rpc_urls {
            Some(urls) => Ok(urls.clone()),
            None => self.endpoints.rpc_urls(),
        }
    }
}
