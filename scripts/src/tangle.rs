//! Configuration of the Tangle Substrate chain
//!
//! The proposal, asset registry and anchor pallets are configured through a
//! single `Sudo::sudo(Utility::batch_all(..))` extrinsic. Calls are only
//! queued for state the chain does not have yet, so configuring twice is a
//! no-op apart from the proposer transfers.

use std::collections::BTreeSet;

use colored::Colorize;
use subxt::{
    dynamic::{self, Value},
    ext::scale_value::{Composite, ValueDef},
    storage::{DynamicAddress, StorageKey},
    tx::{DynamicPayload, TxStatus},
    utils::AccountId32,
    OnlineClient, PolkadotConfig,
};
use subxt_signer::sr25519::Keypair;
use tracing::info;

use crate::{
    chain_id::{ChainType, ResourceId, TypedChainId},
    constants::{
        NATIVE_ASSET_ID, PROPOSER_FUNDING_UNITS, TANGLE_NATIVE_DECIMALS,
        WEBB_ASSET_EXISTENTIAL_DEPOSIT,
    },
    errors::ScriptError,
};

/// A webb asset to register in the asset registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebbAssetConfig {
    /// The asset name, also its registry key
    pub name: String,
    /// The asset symbol
    pub symbol: String,
    /// The asset decimals
    pub decimals: u8,
}

/// A VAnchor to create on the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VAnchorConfig {
    /// The number of neighbor edges
    pub max_edges: u32,
    /// The depth of the Merkle tree
    pub depth: u8,
    /// The name of the webb asset held by the anchor, registered in this
    /// batch or earlier
    pub asset_name: String,
}

/// Everything the configuration makes sure of
#[derive(Debug, Clone)]
pub struct TangleConfig {
    /// The resources to register, whose chains get whitelisted
    pub resource_ids: Vec<ResourceId>,
    /// The accounts to register as proposers
    pub proposers: Vec<AccountId32>,
    /// The symbol of the native asset
    pub native_asset_symbol: String,
    /// The decimals of the native asset
    pub native_asset_decimals: u8,
    /// The webb asset to register, if any
    pub webb_asset: Option<WebbAssetConfig>,
    /// The VAnchor to create, if any
    pub vanchor: Option<VAnchorConfig>,
    /// The sudo account, which funds the proposers
    pub sudo: AccountId32,
}

/// A call batched into the configuration extrinsic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TangleCall {
    /// `DkgProposals::whitelist_chain`
    WhitelistChain(TypedChainId),
    /// `DkgProposals::set_resource`
    SetResource(ResourceId),
    /// `DkgProposals::add_proposer`, with an empty external account
    AddProposer(AccountId32),
    /// `AssetRegistry::register` of a pool share of the native asset
    RegisterAsset {
        /// The asset name
        name: String,
        /// The existential deposit
        existential_deposit: u128,
    },
    /// `AssetRegistry::set_metadata`
    SetMetadata {
        /// The asset id
        asset_id: u32,
        /// The asset symbol
        symbol: String,
        /// The asset decimals
        decimals: u8,
    },
    /// `VAnchorBn254::create`
    CreateVAnchor {
        /// The number of neighbor edges
        max_edges: u32,
        /// The depth of the Merkle tree
        depth: u8,
        /// The asset held by the anchor
        asset_id: u32,
    },
    /// `Balances::force_transfer`
    ForceTransfer {
        /// The source account
        from: AccountId32,
        /// The destination account
        to: AccountId32,
        /// The amount, in the smallest unit
        amount: u128,
    },
}

impl TangleCall {
    /// The pallet and call names
    pub fn name(&self) -> (&'static str, &'static str) {
        match self {
            TangleCall::WhitelistChain(_) => ("DkgProposals", "whitelist_chain"),
            TangleCall::SetResource(_) => ("DkgProposals", "set_resource"),
            TangleCall::AddProposer(_) => ("DkgProposals", "add_proposer"),
            TangleCall::RegisterAsset { .. } => ("AssetRegistry", "register"),
            TangleCall::SetMetadata { .. } => ("AssetRegistry", "set_metadata"),
            TangleCall::CreateVAnchor { .. } => ("VAnchorBn254", "create"),
            TangleCall::ForceTransfer { .. } => ("Balances", "force_transfer"),
        }
    }

    /// The call as a dynamic extrinsic payload
    pub fn to_payload(&self) -> Result<DynamicPayload, ScriptError> {
        let fields = match self {
            TangleCall::WhitelistChain(chain) => vec![typed_chain_id_value(*chain)?],
            TangleCall::SetResource(resource_id) => vec![
                Value::from_bytes(resource_id.as_bytes()),
                // The only execution method
                Value::from_bytes([0u8]),
            ],
            TangleCall::AddProposer(account) => vec![
                Value::from_bytes(account.0),
                Value::from_bytes(Vec::<u8>::new()),
            ],
            TangleCall::RegisterAsset {
                name,
                existential_deposit,
            } => vec![
                Value::from_bytes(name.as_bytes()),
                Value::unnamed_variant(
                    "PoolShare",
                    [Value::unnamed_composite([Value::u128(NATIVE_ASSET_ID.into())])],
                ),
                Value::u128(*existential_deposit),
            ],
            TangleCall::SetMetadata {
                asset_id,
                symbol,
                decimals,
            } => vec![
                Value::u128((*asset_id).into()),
                Value::from_bytes(symbol.as_bytes()),
                Value::u128((*decimals).into()),
            ],
            TangleCall::CreateVAnchor {
                max_edges,
                depth,
                asset_id,
            } => vec![
                Value::u128((*max_edges).into()),
                Value::u128((*depth).into()),
                Value::u128((*asset_id).into()),
            ],
            TangleCall::ForceTransfer { from, to, amount } => vec![
                multi_address(from),
                multi_address(to),
                Value::u128(*amount),
            ],
        };

        let (pallet, call) = self.name();
        Ok(dynamic::tx(pallet, call, fields))
    }
}

/// The `TypedChainId` enum of the proposals pallet
fn typed_chain_id_value(typed_chain_id: TypedChainId) -> Result<Value, ScriptError> {
    let variant = match typed_chain_id.chain_type {
        ChainType::Evm => "Evm",
        ChainType::Substrate => "Substrate",
        other => return Err(ScriptError::UnsupportedChainType(other as u16)),
    };

    Ok(Value::unnamed_variant(
        variant,
        [Value::u128(typed_chain_id.chain_id.into())],
    ))
}

/// A `MultiAddress::Id`
fn multi_address(account: &AccountId32) -> Value {
    Value::unnamed_variant("Id", [Value::from_bytes(account.0)])
}

// ---------
// | State |
// ---------

/// The on-chain state the configuration depends on
#[allow(async_fn_in_trait)]
pub trait TangleState {
    /// Whether the chain already has a proposal nonce
    async fn is_chain_whitelisted(&self, chain: TypedChainId) -> Result<bool, ScriptError>;
    /// Whether the resource is already registered
    async fn is_resource_registered(&self, resource_id: &ResourceId) -> Result<bool, ScriptError>;
    /// Whether the account is already a proposer
    async fn is_proposer(&self, account: &AccountId32) -> Result<bool, ScriptError>;
    /// The id of the asset registered under `name`
    async fn asset_id(&self, name: &str) -> Result<Option<u32>, ScriptError>;
    /// The `NextAssetId` counter of the asset registry
    async fn next_asset_id(&self) -> Result<u32, ScriptError>;
    /// The `NextTreeId` counter of the Merkle tree pallet
    async fn next_tree_id(&self) -> Result<u32, ScriptError>;
}

/// The calls needed to bring the chain to the given configuration, in
/// submission order
pub async fn plan_calls<S: TangleState>(
    state: &S,
    config: &TangleConfig,
) -> Result<Vec<TangleCall>, ScriptError> {
    let mut calls = Vec::new();

    println!("=> {}", "Whitelist the chain ids".green().bold());
    let mut queued_chains = BTreeSet::new();
    for resource_id in &config.resource_ids {
        let chain = resource_id.typed_chain_id()?;
        if state.is_chain_whitelisted(chain).await? || queued_chains.contains(&chain) {
            println!("[x] {}", format!("Chain {} is already whitelisted", chain.chain_id).yellow());
        } else {
            typed_chain_id_value(chain)?;
            queued_chains.insert(chain);
            calls.push(TangleCall::WhitelistChain(chain));
            println!("[+] {}", format!("Chain {} whitelisted", chain.chain_id).green());
        }
    }

    println!("=> {}", "Register the resource ids".green().bold());
    let mut queued_resources = BTreeSet::new();
    for resource_id in &config.resource_ids {
        if state.is_resource_registered(resource_id).await?
            || !queued_resources.insert(*resource_id.as_bytes())
        {
            println!("[x] {}", format!("Resource {resource_id} is already registered").yellow());
        } else {
            calls.push(TangleCall::SetResource(*resource_id));
            println!("[+] {}", format!("Resource {resource_id} registered").green());
        }
    }

    println!("=> {}", "Register the proposers".green().bold());
    for proposer in &config.proposers {
        if state.is_proposer(proposer).await? {
            println!("[x] {}", format!("Proposer {proposer} is already registered").yellow());
        } else {
            calls.push(TangleCall::AddProposer(proposer.clone()));
            println!("[+] {}", format!("Proposer {proposer} registered").green());
        }
    }

    if let Some(asset) = &config.webb_asset {
        println!("=> {}", "Register the webb asset".bold());
        if state.asset_id(&asset.name).await?.is_some() {
            println!("[x] {}", format!("Webb asset {} is already registered", asset.name).yellow());
        } else {
            calls.push(TangleCall::RegisterAsset {
                name: asset.name.clone(),
                existential_deposit: WEBB_ASSET_EXISTENTIAL_DEPOSIT,
            });
            calls.push(TangleCall::SetMetadata {
                asset_id: state.next_asset_id().await? + 1,
                symbol: asset.symbol.clone(),
                decimals: asset.decimals,
            });
            println!("[+] {}", format!("{} registered", asset.name).green());
        }
    }

    println!("=> {}", "Update the native asset metadata".bold());
    calls.push(TangleCall::SetMetadata {
        asset_id: NATIVE_ASSET_ID,
        symbol: config.native_asset_symbol.clone(),
        decimals: config.native_asset_decimals,
    });

    if let Some(vanchor) = &config.vanchor {
        println!("=> {}", "Create the VAnchor".bold());
        let asset_id = match state.asset_id(&vanchor.asset_name).await? {
            Some(asset_id) => {
                println!("[x] {}", format!("Found webb asset {asset_id}").blue());
                asset_id
            }
            None => state.next_asset_id().await? + 1,
        };
        let tree_id = state.next_tree_id().await? + 1;

        calls.push(TangleCall::CreateVAnchor {
            max_edges: vanchor.max_edges,
            depth: vanchor.depth,
            asset_id,
        });
        println!(
            "[+] {}",
            format!("VAnchor (Id: {tree_id}) with Asset: {asset_id} created").green()
        );
    }

    println!("=> {}", "Transferring funds to proposers".bold());
    let unit = 10u128.pow(TANGLE_NATIVE_DECIMALS);
    for proposer in &config.proposers {
        calls.push(TangleCall::ForceTransfer {
            from: config.sudo.clone(),
            to: proposer.clone(),
            amount: PROPOSER_FUNDING_UNITS * unit,
        });
        println!(
            "[+] {}",
            format!("{proposer} received {PROPOSER_FUNDING_UNITS} tokens").green()
        );
    }

    Ok(calls)
}

// ----------
// | Client |
// ----------

/// A connection to the Tangle node
pub struct TangleClient {
    /// The RPC client
    api: OnlineClient<PolkadotConfig>,
}

impl TangleClient {
    /// Connect to the node at the given WebSocket endpoint
    pub async fn connect(ws_endpoint: &str) -> Result<Self, ScriptError> {
        let api = OnlineClient::<PolkadotConfig>::from_url(ws_endpoint)
            .await
            .map_err(|e| ScriptError::ClientInitialization(format!("{ws_endpoint}: {e}")))?;
        Ok(Self { api })
    }

    /// Submit all calls as one sudo batch, waiting for in-block inclusion
    pub async fn submit_as_sudo(
        &self,
        calls: &[TangleCall],
        sudo: &Keypair,
    ) -> Result<(), ScriptError> {
        let calls = calls
            .iter()
            .map(|call| call.to_payload().map(DynamicPayload::into_value))
            .collect::<Result<Vec<_>, _>>()?;
        let batch = dynamic::tx("Utility", "batch_all", vec![Value::unnamed_composite(calls)]);
        let sudo_call = dynamic::tx("Sudo", "sudo", vec![batch.into_value()]);

        let mut progress = self
            .api
            .tx()
            .sign_and_submit_then_watch_default(&sudo_call, sudo)
            .await
            .map_err(substrate_error)?;

        let events = loop {
            let status = progress
                .next()
                .await
                .ok_or_else(|| ScriptError::Substrate("transaction status stream ended".into()))?
                .map_err(substrate_error)?;

            match status {
                TxStatus::InBestBlock(in_block) | TxStatus::InFinalizedBlock(in_block) => {
                    break in_block.wait_for_success().await.map_err(substrate_error)?;
                }
                TxStatus::Error { message }
                | TxStatus::Invalid { message }
                | TxStatus::Dropped { message } => return Err(ScriptError::Substrate(message)),
                _ => continue,
            }
        };

        for event in events.iter() {
            let event = event.map_err(substrate_error)?;
            if event.pallet_name() != "Sudo" || event.variant_name() != "Sudid" {
                continue;
            }

            let fields = event.field_values().map_err(substrate_error)?;
            if let Some(error) = sudo_error(&fields) {
                return Err(ScriptError::Substrate(format!("sudo call failed: {error}")));
            }
        }

        info!(extrinsic = ?events.extrinsic_hash(), "sudo batch executed");
        Ok(())
    }

    /// Fetch a storage value, if set
    async fn fetch<Keys: StorageKey>(
        &self,
        address: &DynamicAddress<Keys>,
    ) -> Result<Option<Value<u32>>, ScriptError> {
        let storage = self.api.storage().at_latest().await.map_err(substrate_error)?;
        match storage.fetch(address).await.map_err(substrate_error)? {
            Some(thunk) => Ok(Some(thunk.to_value().map_err(substrate_error)?)),
            None => Ok(None),
        }
    }

    /// Fetch an integer storage value, zero if unset
    async fn fetch_u32<Keys: StorageKey>(
        &self,
        address: &DynamicAddress<Keys>,
    ) -> Result<Option<u32>, ScriptError> {
        let Some(value) = self.fetch(address).await? else {
            return Ok(None);
        };

        value
            .as_u128()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| ScriptError::Substrate(format!("expected a u32, got {value}")))
    }
}

impl TangleState for TangleClient {
    async fn is_chain_whitelisted(&self, chain: TypedChainId) -> Result<bool, ScriptError> {
        let address =
            dynamic::storage("DkgProposals", "ChainNonces", vec![typed_chain_id_value(chain)?]);
        Ok(self.fetch(&address).await?.is_some())
    }

    async fn is_resource_registered(&self, resource_id: &ResourceId) -> Result<bool, ScriptError> {
        let address = dynamic::storage(
            "DkgProposals",
            "Resources",
            vec![Value::from_bytes(resource_id.as_bytes())],
        );
        Ok(self.fetch(&address).await?.is_some())
    }

    async fn is_proposer(&self, account: &AccountId32) -> Result<bool, ScriptError> {
        let address =
            dynamic::storage("DkgProposals", "Proposers", vec![Value::from_bytes(account.0)]);
        Ok(self
            .fetch(&address)
            .await?
            .and_then(|value| value.as_bool())
            .unwrap_or(false))
    }

    async fn asset_id(&self, name: &str) -> Result<Option<u32>, ScriptError> {
        let address =
            dynamic::storage("AssetRegistry", "AssetIds", vec![Value::from_bytes(name.as_bytes())]);
        self.fetch_u32(&address).await
    }

    async fn next_asset_id(&self) -> Result<u32, ScriptError> {
        let address = dynamic::storage("AssetRegistry", "NextAssetId", ());
        Ok(self.fetch_u32(&address).await?.unwrap_or_default())
    }

    async fn next_tree_id(&self) -> Result<u32, ScriptError> {
        let address = dynamic::storage("MerkleTreeBn254", "NextTreeId", ());
        Ok(self.fetch_u32(&address).await?.unwrap_or_default())
    }
}

/// The error carried by the fields of a `Sudo::Sudid` event, if the call
/// failed
fn sudo_error<T>(fields: &Composite<T>) -> Option<String> {
    let result = fields.values().next()?;
    match &result.value {
        ValueDef::Variant(variant) if variant.name == "Err" => Some(result.to_string()),
        _ => None,
    }
}

/// Map a subxt error into a script error
fn substrate_error(e: impl ToString) -> ScriptError {
    ScriptError::Substrate(e.to_string())
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, str::FromStr};

    use alloy::primitives::Address;

    use super::*;

    /// An in-memory view of the chain state
    #[derive(Default)]
    struct MockState {
        whitelisted: Vec<TypedChainId>,
        resources: Vec<ResourceId>,
        proposers: Vec<AccountId32>,
        assets: HashMap<String, u32>,
        next_asset_id: u32,
        next_tree_id: u32,
    }

    impl TangleState for MockState {
        async fn is_chain_whitelisted(&self, chain: TypedChainId) -> Result<bool, ScriptError> {
            Ok(self.whitelisted.contains(&chain))
        }

        async fn is_resource_registered(&self, id: &ResourceId) -> Result<bool, ScriptError> {
            Ok(self.resources.contains(id))
        }

        async fn is_proposer(&self, account: &AccountId32) -> Result<bool, ScriptError> {
            Ok(self.proposers.contains(account))
        }

        async fn asset_id(&self, name: &str) -> Result<Option<u32>, ScriptError> {
            Ok(self.assets.get(name).copied())
        }

        async fn next_asset_id(&self) -> Result<u32, ScriptError> {
            Ok(self.next_asset_id)
        }

        async fn next_tree_id(&self) -> Result<u32, ScriptError> {
            Ok(self.next_tree_id)
        }
    }

    fn resource(byte: u8, chain_id: u32) -> ResourceId {
        ResourceId::from_evm_address(Address::repeat_byte(byte), TypedChainId::evm(chain_id))
    }

    fn config() -> TangleConfig {
        TangleConfig {
            resource_ids: vec![resource(1, 5001), resource(2, 5001), resource(3, 5002)],
            proposers: vec![AccountId32([7u8; 32])],
            native_asset_symbol: "tTNT".to_string(),
            native_asset_decimals: 18,
            webb_asset: None,
            vanchor: None,
            sudo: AccountId32([1u8; 32]),
        }
    }

    #[tokio::test]
    async fn test_plan_order_and_dedup() {
        let calls = plan_calls(&MockState::default(), &config()).await.unwrap();
        let names: Vec<_> = calls.iter().map(|c| c.name().1).collect();
        assert_eq!(
            names,
            vec![
                "whitelist_chain",
                "whitelist_chain",
                "set_resource",
                "set_resource",
                "set_resource",
                "add_proposer",
                "set_metadata",
                "force_transfer",
            ]
        );

        assert_eq!(calls[0], TangleCall::WhitelistChain(TypedChainId::evm(5001)));
        assert_eq!(calls[1], TangleCall::WhitelistChain(TypedChainId::evm(5002)));
        assert_eq!(
            calls[7],
            TangleCall::ForceTransfer {
                from: AccountId32([1u8; 32]),
                to: AccountId32([7u8; 32]),
                amount: 1000 * 10u128.pow(18),
            }
        );
    }

    #[tokio::test]
    async fn test_existing_state_is_skipped() {
        let state = MockState {
            whitelisted: vec![TypedChainId::evm(5001), TypedChainId::evm(5002)],
            resources: vec![resource(1, 5001), resource(2, 5001), resource(3, 5002)],
            proposers: vec![AccountId32([7u8; 32])],
            ..Default::default()
        };

        let calls = plan_calls(&state, &config()).await.unwrap();
        let names: Vec<_> = calls.iter().map(|c| c.name().1).collect();
        assert_eq!(names, vec!["set_metadata", "force_transfer"]);
    }

    #[tokio::test]
    async fn test_webb_asset_and_vanchor() {
        let mut config = config();
        config.resource_ids.clear();
        config.proposers.clear();
        config.webb_asset = Some(WebbAssetConfig {
            name: "webbtTNT".to_string(),
            symbol: "webbtTNT".to_string(),
            decimals: 18,
        });
        config.vanchor = Some(VAnchorConfig {
            max_edges: 7,
            depth: 30,
            asset_name: "webbtTNT".to_string(),
        });

        let state = MockState {
            next_asset_id: 4,
            next_tree_id: 2,
            ..Default::default()
        };
        let calls = plan_calls(&state, &config).await.unwrap();
        assert_eq!(
            calls,
            vec![
                TangleCall::RegisterAsset {
                    name: "webbtTNT".to_string(),
                    existential_deposit: 10u128.pow(14),
                },
                TangleCall::SetMetadata {
                    asset_id: 5,
                    symbol: "webbtTNT".to_string(),
                    decimals: 18,
                },
                TangleCall::SetMetadata {
                    asset_id: NATIVE_ASSET_ID,
                    symbol: "tTNT".to_string(),
                    decimals: 18,
                },
                TangleCall::CreateVAnchor {
                    max_edges: 7,
                    depth: 30,
                    asset_id: 5,
                },
            ]
        );

        // An existing asset is reused by the anchor
        let state = MockState {
            assets: HashMap::from([("webbtTNT".to_string(), 3)]),
            ..Default::default()
        };
        let calls = plan_calls(&state, &config).await.unwrap();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[1], TangleCall::CreateVAnchor { asset_id: 3, .. }));
    }

    #[tokio::test]
    async fn test_vanchor_uses_previously_registered_asset() {
        let mut config = config();
        config.resource_ids.clear();
        config.proposers.clear();
        config.vanchor = Some(VAnchorConfig {
            max_edges: 7,
            depth: 30,
            asset_name: "webbtTNT".to_string(),
        });

        let state = MockState {
            assets: HashMap::from([("webbtTNT".to_string(), 3)]),
            next_asset_id: 9,
            ..Default::default()
        };
        let calls = plan_calls(&state, &config).await.unwrap();
        assert_eq!(
            calls.last(),
            Some(&TangleCall::CreateVAnchor {
                max_edges: 7,
                depth: 30,
                asset_id: 3,
            })
        );
    }

    #[test]
    fn test_sudo_error() {
        let failed = Composite::unnamed([Value::unnamed_variant(
            "Err",
            [Value::unnamed_variant("BadOrigin", [])],
        )]);
        assert!(sudo_error(&failed).unwrap().contains("BadOrigin"));

        let succeeded =
            Composite::unnamed([Value::unnamed_variant("Ok", [Value::unnamed_composite([])])]);
        assert_eq!(sudo_error(&succeeded), None);
        assert_eq!(sudo_error(&Composite::<()>::unnamed([])), None);
    }

    #[tokio::test]
    async fn test_unsupported_chain_type() {
        let mut config = config();
        let cosmos = TypedChainId {
            chain_type: ChainType::Cosmos,
            chain_id: 1,
        };
        config.resource_ids = vec![ResourceId::new([0u8; 26], cosmos)];

        assert!(matches!(
            plan_calls(&MockState::default(), &config).await,
            Err(ScriptError::UnsupportedChainType(0x0400))
        ));
    }

    #[test]
    fn test_proposer_ss58() {
        // Alice
        let alice = AccountId32::from_str("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY").unwrap();
        assert_eq!(TangleCall::AddProposer(alice).name(), ("DkgProposals", "add_proposer"));
    }
}
