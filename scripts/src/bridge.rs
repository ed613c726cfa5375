//! Deployment of the variable anchor bridge
//!
//! Every chain gets its own side of the bridge: a signature bridge governing
//! a token wrapper handler and an anchor handler, a fungible token wrapper,
//! and a variable anchor holding deposits of that token. The deployer acts as
//! the initial governor, registering resources through signed proposals, and
//! finally hands the bridge over to the configured governor.

use std::{collections::BTreeMap, path::Path};

use alloy::{
    primitives::{Address, B256, U256},
    providers::DynProvider,
    sol_types::SolValue,
};
use colored::Colorize;
use tracing::info;

use crate::{
    artifacts::ArtifactDeployer,
    chain_id::{ResourceId, TypedChainId},
    constants::{
        ADMIN_SET_RESOURCE_SIGNATURE, ANCHOR_HANDLER_ARTIFACT, FUNGIBLE_TOKEN_WRAPPER_ARTIFACT,
        MAX_EDGES_LARGE, MAX_EDGES_SMALL, POSEIDON_HASHER_ARTIFACT, SIGNATURE_BRIDGE_ARTIFACT,
        SIZED_VERIFIER_ARTIFACTS, TOKEN_WRAPPER_HANDLER_ARTIFACT, VANCHOR_ARTIFACT,
        VANCHOR_TREE_LEVELS, VANCHOR_VERIFIER_ARTIFACT, WEBB_TOKEN_FEE_PERCENTAGE,
    },
    errors::ScriptError,
    proposals::{
        add_token_proposal_data, function_signature, set_resource_proposal_data, sign_proposal,
    },
    solidity::{
        IFungibleTokenWrapper::{self, IFungibleTokenWrapperInstance},
        ISignatureBridge::{self, ISignatureBridgeInstance},
        IVAnchor,
    },
    utils::{send_tx, SignerClient},
};

/// The name and symbol of the webb token deployed on a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebbTokenConfig {
    /// The token name
    pub name: String,
    /// The token symbol
    pub symbol: String,
}

/// The governor the bridge on a chain is handed over to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernorConfig {
    /// The governor address
    pub address: Address,
    /// The nonce of the ownership transfer
    pub nonce: u32,
}

/// What to deploy on each chain
#[derive(Debug, Clone, Default)]
pub struct BridgeInput {
    /// The chains to deploy to
    pub chains: Vec<TypedChainId>,
    /// The tokens wrapped by the webb token on each chain. The zero address
    /// stands for the native token
    pub tokens: BTreeMap<TypedChainId, Vec<Address>>,
    /// The webb token on each chain
    pub webb_tokens: BTreeMap<TypedChainId, WebbTokenConfig>,
}

/// The deployed bridge, per typed chain id
#[derive(Debug, Clone, Default)]
pub struct VBridge {
    /// The signature bridge on each chain
    pub sides: BTreeMap<TypedChainId, Address>,
    /// The VAnchor on each chain
    pub anchors: BTreeMap<TypedChainId, Address>,
    /// The webb token on each chain
    pub webb_tokens: BTreeMap<TypedChainId, Address>,
}

/// The contracts making up a single side of the bridge
#[derive(Debug, Clone, Copy)]
struct BridgeSide {
    bridge: Address,
    anchor: Address,
    webb_token: Address,
}

/// The number of neighbor edges of each anchor, given the number of chains
pub fn max_edges(num_chains: usize) -> u8 {
    if num_chains > 2 {
        MAX_EDGES_LARGE
    } else {
        MAX_EDGES_SMALL
    }
}

/// Deploy the variable anchor bridge on every chain of the input, in typed
/// chain id order
pub async fn deploy_variable_anchor_bridge(
    input: &BridgeInput,
    deployers: &BTreeMap<TypedChainId, SignerClient>,
    governors: &BTreeMap<TypedChainId, GovernorConfig>,
    artifacts_dir: &Path,
) -> Result<VBridge, ScriptError> {
    let max_edges = max_edges(input.chains.len());
    let mut chains = input.chains.clone();
    chains.sort();
    chains.dedup();

    let mut vbridge = VBridge::default();
    for typed_chain_id in chains {
        let client = deployers.get(&typed_chain_id).ok_or_else(|| {
            ScriptError::ClientInitialization(format!("no deployer for chain {typed_chain_id}"))
        })?;
        let governor = governors.get(&typed_chain_id).ok_or_else(|| {
            ScriptError::InvalidAddress(format!("no governor for chain {typed_chain_id}"))
        })?;
        let webb_token = input.webb_tokens.get(&typed_chain_id).ok_or_else(|| {
            ScriptError::CalldataConstruction(format!(
                "no webb token config for chain {typed_chain_id}"
            ))
        })?;
        let tokens = input
            .tokens
            .get(&typed_chain_id)
            .map(Vec::as_slice)
            .unwrap_or_default();

        println!(
            "{}",
            format!("Deploying bridge side on chain {}", client.chain_id).yellow()
        );
        let mut deployer = ArtifactDeployer::new(artifacts_dir, client);
        let side = deploy_bridge_side(
            &mut deployer,
            typed_chain_id,
            tokens,
            webb_token,
            governor,
            max_edges,
        )
        .await?;

        vbridge.sides.insert(typed_chain_id, side.bridge);
        vbridge.anchors.insert(typed_chain_id, side.anchor);
        vbridge.webb_tokens.insert(typed_chain_id, side.webb_token);
    }

    Ok(vbridge)
}

/// Deploy and wire up one side of the bridge
async fn deploy_bridge_side(
    deployer: &mut ArtifactDeployer<'_>,
    typed_chain_id: TypedChainId,
    tokens: &[Address],
    webb_token: &WebbTokenConfig,
    governor: &GovernorConfig,
    max_edges: u8,
) -> Result<BridgeSide, ScriptError> {
    let client = deployer.client().clone();
    let admin = client.address();

    // The deployer is the initial governor, at nonce 0
    let bridge = deployer
        .deploy(SIGNATURE_BRIDGE_ARTIFACT, &(admin, 0u32).abi_encode_params())
        .await?
        .address;
    let bridge_contract = ISignatureBridge::new(bridge, client.provider.clone());
    let bridge_resource_id = ResourceId::from_evm_address(bridge, typed_chain_id);
    info!(%bridge, chain_id = client.chain_id, "deployed signature bridge");

    // Handlers start out without any resources
    let handler_args =
        (bridge, Vec::<B256>::new(), Vec::<Address>::new()).abi_encode_params();
    let token_wrapper_handler = deployer
        .deploy(TOKEN_WRAPPER_HANDLER_ARTIFACT, &handler_args)
        .await?
        .address;
    let anchor_handler = deployer
        .deploy(ANCHOR_HANDLER_ARTIFACT, &handler_args)
        .await?
        .address;

    // --- Webb token ---
    let webb_token_address = deployer
        .deploy(
            FUNGIBLE_TOKEN_WRAPPER_ARTIFACT,
            &(webb_token.name.clone(), webb_token.symbol.clone()).abi_encode_params(),
        )
        .await?
        .address;
    let token_contract = IFungibleTokenWrapper::new(webb_token_address, client.provider.clone());
    let is_native_allowed = tokens.contains(&Address::ZERO);
    send_tx(token_contract.initialize(
        WEBB_TOKEN_FEE_PERCENTAGE,
        admin,
        token_wrapper_handler,
        U256::MAX,
        is_native_allowed,
        admin,
    ))
    .await?;

    let token_resource_id = ResourceId::from_evm_address(webb_token_address, typed_chain_id);
    set_resource_with_signature(
        &bridge_contract,
        &client,
        &bridge_resource_id,
        &token_resource_id,
        token_wrapper_handler,
    )
    .await?;
    for token in tokens.iter().filter(|token| !token.is_zero()) {
        add_token_with_signature(
            &bridge_contract,
            &token_contract,
            &client,
            &token_resource_id,
            *token,
        )
        .await?;
    }

    // --- Verifiers and hasher ---
    let mut sized_verifiers = [Address::ZERO; SIZED_VERIFIER_ARTIFACTS.len()];
    for (verifier, artifact) in sized_verifiers.iter_mut().zip(SIZED_VERIFIER_ARTIFACTS) {
        *verifier = deployer.deploy(artifact, &[]).await?.address;
    }
    let [verifier_2_2, verifier_2_16, verifier_8_2, verifier_8_16] = sized_verifiers;
    let verifier = deployer
        .deploy(
            VANCHOR_VERIFIER_ARTIFACT,
            &(verifier_2_2, verifier_2_16, verifier_8_2, verifier_8_16).abi_encode_params(),
        )
        .await?
        .address;
    let hasher = deployer.deploy(POSEIDON_HASHER_ARTIFACT, &[]).await?.address;

    // --- Anchor ---
    let anchor = deployer
        .deploy(
            VANCHOR_ARTIFACT,
            &anchor_constructor_args(
                verifier,
                hasher,
                anchor_handler,
                webb_token_address,
                max_edges,
            ),
        )
        .await?
        .address;
    let anchor_contract = IVAnchor::new(anchor, client.provider.clone());
    send_tx(anchor_contract.initialize(U256::ZERO, U256::MAX)).await?;
    info!(%anchor, max_edges, "deployed variable anchor");

    let anchor_resource_id = ResourceId::from_evm_address(anchor, typed_chain_id);
    set_resource_with_signature(
        &bridge_contract,
        &client,
        &bridge_resource_id,
        &anchor_resource_id,
        anchor_handler,
    )
    .await?;

    let minter_role = token_contract
        .MINTER_ROLE()
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    send_tx(token_contract.grantRole(minter_role, anchor)).await?;

    // --- Governance handover ---
    send_tx(bridge_contract.transferOwnership(governor.address, governor.nonce)).await?;
    info!(governor = %governor.address, nonce = governor.nonce, "transferred bridge ownership");

    Ok(BridgeSide {
        bridge,
        anchor,
        webb_token: webb_token_address,
    })
}

/// Register `resource_id` with `handler` through a proposal signed by the
/// client's signer
async fn set_resource_with_signature(
    bridge: &ISignatureBridgeInstance<DynProvider>,
    client: &SignerClient,
    bridge_resource_id: &ResourceId,
    resource_id: &ResourceId,
    handler: Address,
) -> Result<(), ScriptError> {
    let nonce = bridge
        .proposalNonce()
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
        + 1;

    let data = set_resource_proposal_data(bridge_resource_id, nonce, resource_id, handler);
    let sig = sign_proposal(&client.signer, &data)?;

    send_tx(bridge.adminSetResourceWithSignature(
        bridge_resource_id.to_fixed_bytes(),
        function_signature(ADMIN_SET_RESOURCE_SIGNATURE),
        nonce,
        resource_id.to_fixed_bytes(),
        handler,
        sig,
    ))
    .await?;

    Ok(())
}

/// Add `token` to the token wrapper through a proposal signed by the
/// client's signer
async fn add_token_with_signature(
    bridge: &ISignatureBridgeInstance<DynProvider>,
    token_wrapper: &IFungibleTokenWrapperInstance<DynProvider>,
    client: &SignerClient,
    token_resource_id: &ResourceId,
    token: Address,
) -> Result<(), ScriptError> {
    let nonce = token_wrapper
        .proposalNonce()
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
        + 1;

    let data = add_token_proposal_data(token_resource_id, nonce, token);
    let sig = sign_proposal(&client.signer, &data)?;
    send_tx(bridge.executeProposalWithSignature(data.into(), sig)).await?;

    Ok(())
}

/// The ABI-encoded `VAnchorTree` constructor arguments
fn anchor_constructor_args(
    verifier: Address,
    hasher: Address,
    handler: Address,
    token: Address,
    max_edges: u8,
) -> Vec<u8> {
    (
        verifier,
        VANCHOR_TREE_LEVELS,
        hasher,
        handler,
        token,
        U256::from(max_edges),
    )
        .abi_encode_params()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_constructor_args() {
        let verifier = Address::repeat_byte(1);
        let token = Address::repeat_byte(4);
        let args = anchor_constructor_args(
            verifier,
            Address::repeat_byte(2),
            Address::repeat_byte(3),
            token,
            7,
        );

        assert_eq!(args.len(), 6 * 32);
        assert_eq!(&args[12..32], verifier.as_slice());
        assert_eq!(U256::from_be_slice(&args[32..64]), U256::from(VANCHOR_TREE_LEVELS));
        assert_eq!(&args[4 * 32 + 12..5 * 32], token.as_slice());
        assert_eq!(U256::from_be_slice(&args[5 * 32..]), U256::from(7u8));
    }

    #[test]
    fn test_max_edges() {
        assert_eq!(max_edges(1), 1);
        assert_eq!(max_edges(2), 1);
        assert_eq!(max_edges(3), 7);
        assert_eq!(max_edges(4), 7);
    }
}
