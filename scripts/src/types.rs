//! Type definitions used throughout the scripts

use std::collections::BTreeMap;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// The result of a full bridge deployment, as written to the deployments file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// The signature bridge address on the last deployed chain
    pub bridge_address: Address,
    /// The VAnchor address on the last deployed chain
    pub anchor_address: Address,
    /// The webb token address on the last deployed chain
    pub webb_token_address: Address,
    /// The WETH address, if WETH was deployed or given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weth_address: Option<Address>,
    /// The Multicall3 address on the last chain it was deployed to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multicall3_address: Option<Address>,
    /// The contracts deployed on each chain, keyed by typed chain id
    #[serde(default)]
    pub chains: BTreeMap<u64, ChainDeployment>,
}

/// The contracts deployed on a single chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDeployment {
    /// The EVM chain id
    pub chain_id: u64,
    /// The signature bridge
    pub bridge_address: Option<Address>,
    /// The VAnchor
    pub anchor_address: Option<Address>,
    /// The webb token
    pub webb_token_address: Option<Address>,
    /// The Multicall3 contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multicall3_address: Option<Address>,
}
