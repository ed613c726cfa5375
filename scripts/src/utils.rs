//! Utilities for the deploy scripts.

use std::{fs, path::Path, process::Command};

use alloy::{
    contract::{CallBuilder, CallDecoder},
    network::{Ethereum, TransactionBuilder},
    primitives::{utils::format_ether, Address, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use colored::Colorize;
use futures::future::try_join_all;
use tracing::debug;

use crate::{errors::ScriptError, types::Deployment};

/// The call builder type used for every contract call in the scripts
pub type ScriptCallBuilder<'a, C> = CallBuilder<&'a DynProvider<Ethereum>, C, Ethereum>;

/// A signing provider on a single chain
#[derive(Clone)]
pub struct SignerClient {
    /// The provider, filling and signing transactions with `signer`
    pub provider: DynProvider<Ethereum>,
    /// The signer of every transaction sent through the provider
    pub signer: PrivateKeySigner,
    /// The EVM chain id of the chain
    pub chain_id: u64,
}

impl SignerClient {
    /// The address of the signer
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// The native balance of the given account
    pub async fn balance_of(&self, account: Address) -> Result<U256, ScriptError> {
        self.provider
            .get_balance(account)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }
}

// -----------
// | Clients |
// -----------

/// Open a read-only provider for each URL, checking the connections one by one
pub async fn connect_providers(urls: &[Url]) -> Result<Vec<DynProvider<Ethereum>>, ScriptError> {
    let mut providers = Vec::with_capacity(urls.len());
    for url in urls {
        let provider = ProviderBuilder::new().connect_http(url.clone());
        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ScriptError::ClientInitialization(format!("{url}: {e}")))?;

        println!(
            "{} {} {}",
            "Connected to".green(),
            url.as_str().blue(),
            format!("(chain id {chain_id})").dimmed()
        );
        providers.push(DynProvider::new(provider));
    }

    Ok(providers)
}

/// A provider signing with the given signer, with the recommended fillers
pub fn connect_signer(rpc_url: &Url, signer: &PrivateKeySigner) -> DynProvider<Ethereum> {
    let provider = ProviderBuilder::new()
        .wallet(signer.clone())
        .connect_http(rpc_url.clone());
    DynProvider::new(provider)
}

/// Sets up a signing client for the given chain, resolving its chain id
pub async fn setup_client(
    rpc_url: &Url,
    signer: &PrivateKeySigner,
) -> Result<SignerClient, ScriptError> {
    let provider = connect_signer(rpc_url, signer);
    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(format!("{rpc_url}: {e}")))?;

    Ok(SignerClient {
        provider,
        signer: signer.clone(),
        chain_id,
    })
}

/// Sets up a signing client for each chain in parallel
pub async fn setup_clients(
    rpc_urls: &[Url],
    signer: &PrivateKeySigner,
) -> Result<Vec<SignerClient>, ScriptError> {
    try_join_all(rpc_urls.iter().map(|url| setup_client(url, signer))).await
}

/// Query the chain id of every provider in parallel
pub async fn chain_ids(providers: &[DynProvider<Ethereum>]) -> Result<Vec<u64>, ScriptError> {
    try_join_all(providers.iter().map(|provider| async move {
        provider
            .get_chain_id()
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))
    }))
    .await
}

// ----------------
// | Transactions |
// ----------------

/// Send native value from the client's signer and wait for the receipt
pub async fn send_funds(
    from: &SignerClient,
    to: Address,
    value: U256,
) -> Result<TransactionReceipt, ScriptError> {
    let tx = TransactionRequest::default().with_to(to).with_value(value);
    let receipt = from
        .provider
        .send_transaction(tx)
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    if !receipt.status() {
        return Err(ScriptError::ContractInteraction(format!(
            "transfer {} reverted",
            receipt.transaction_hash
        )));
    }

    println!(
        "{} {} {} {} {} {}",
        "Sent".green(),
        format!("{} ETH", format_ether(value)).bold(),
        "from".green(),
        from.address().to_string().blue(),
        "to".green(),
        to.to_string().blue(),
    );
    println!(
        "  {}",
        format!(
            "chain id {} | tx hash {}",
            from.chain_id, receipt.transaction_hash
        )
        .dimmed()
    );

    Ok(receipt)
}

/// Send a contract call and wait for it to succeed
pub async fn send_tx<C: CallDecoder>(
    tx: ScriptCallBuilder<'_, C>,
) -> Result<TransactionReceipt, ScriptError> {
    let receipt = tx
        .send()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    if !receipt.status() {
        return Err(ScriptError::ContractInteraction(format!(
            "transaction {} reverted",
            receipt.transaction_hash
        )));
    }

    debug!(tx_hash = %receipt.transaction_hash, "transaction succeeded");
    Ok(receipt)
}

// ---------
// | Files |
// ---------

/// Write the deployment to the deployments file as pretty JSON
pub fn write_deployments(path: &Path, deployment: &Deployment) -> Result<(), ScriptError> {
    let json = serde_json::to_string_pretty(deployment)
        .map_err(|e| ScriptError::Serde(e.to_string()))?;
    fs::write(path, json).map_err(|e| ScriptError::WriteFile(format!("{}: {e}", path.display())))
}

/// Read a deployment back from the deployments file
pub fn read_deployment(path: &Path) -> Result<Deployment, ScriptError> {
    let json = fs::read_to_string(path)
        .map_err(|e| ScriptError::ReadFile(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&json).map_err(|e| ScriptError::Serde(e.to_string()))
}

/// Runs the command, returning its stdout, or an error with the given message
/// if it fails
pub fn command_output_or(mut cmd: Command, err_msg: &str) -> Result<Vec<u8>, ScriptError> {
    let output = cmd
        .output()
        .map_err(|e| ScriptError::Proving(format!("{err_msg}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ScriptError::Proving(format!("{err_msg}: {}", stderr.trim())));
    }

    Ok(output.stdout)
}
