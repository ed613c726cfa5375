//! Deployment and verification of the WETH and Multicall3 helper contracts

use alloy::primitives::Address;
use colored::Colorize;

use crate::{
    artifacts::{ArtifactDeployer, DeployedContract},
    constants::{MULTICALL3_ARTIFACT, WETH9_ARTIFACT, WETH_SYMBOL},
    errors::ScriptError,
    solidity::IERC20,
    utils::SignerClient,
};

/// Deploy a `WETH9` contract, returning its address
pub async fn deploy_weth9(deployer: &mut ArtifactDeployer<'_>) -> Result<Address, ScriptError> {
    let DeployedContract { address, .. } = deployer.deploy(WETH9_ARTIFACT, &[]).await?;
    Ok(address)
}

/// Deploy a `Multicall3` contract, returning its address and creation block
pub async fn deploy_multicall3(
    deployer: &mut ArtifactDeployer<'_>,
) -> Result<DeployedContract, ScriptError> {
    deployer.deploy(MULTICALL3_ARTIFACT, &[]).await
}

/// Check that the contract at `address` reports the WETH symbol
pub async fn verify_weth(client: &SignerClient, address: Address) -> Result<(), ScriptError> {
    let weth = IERC20::new(address, client.provider.clone());
    let symbol = weth
        .symbol()
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    if symbol != WETH_SYMBOL {
        return Err(ScriptError::Verification(format!(
            "invalid WETH symbol on chain {}: expected {WETH_SYMBOL}, got {symbol}",
            client.chain_id
        )));
    }

    println!(
        "{}",
        format!("WETH verified on {}!", client.chain_id).green().bold()
    );
    Ok(())
}
