//! Definitions of CLI arguments and commands for deploy scripts

use std::{path::PathBuf, str::FromStr};

use alloy::primitives::Address;
use clap::{ArgAction, Args, Parser, Subcommand};
use subxt::utils::AccountId32;

use crate::{
    chain_id::ResourceId,
    commands::{
        configure_tangle, deploy_with_args, deposit, faucet, transfer_ownership, ScriptContext,
    },
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_PATH, DEFAULT_FIXTURES_DIR,
        DEFAULT_PROVER_PROGRAM, DEFAULT_RELAYER_CONFIG_OUTPUT, DEFAULT_RELAYER_CONFIG_TEMPLATE,
        DEFAULT_TANGLE_WS_ENDPOINT,
    },
    env::{ChainEndpoints, Wallets},
    errors::ScriptError,
};

/// Deployment and maintenance scripts for the Orbit testnet
#[derive(Parser)]
#[command(name = "orbit")]
pub struct Cli {
    /// The bridged chains
    #[command(flatten)]
    pub endpoints: ChainEndpoints,

    /// The vault and deployer wallets
    #[command(flatten)]
    pub wallets: Wallets,

    /// The files read and written by the commands
    #[command(flatten)]
    pub paths: ScriptPaths,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The files read and written by the commands
#[derive(Args, Debug, Clone)]
pub struct ScriptPaths {
    /// Path to the file the deployed addresses are written to
    #[arg(long, default_value = DEFAULT_DEPLOYMENTS_PATH, global = true)]
    pub deployments_path: PathBuf,

    /// Directory holding the compiled contract artifacts
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR, global = true)]
    pub artifacts_dir: PathBuf,

    /// Path to the relayer configuration template
    #[arg(long, default_value = DEFAULT_RELAYER_CONFIG_TEMPLATE, global = true)]
    pub relayer_config_template: PathBuf,

    /// Path the rendered relayer configuration is written to
    #[arg(long, default_value = DEFAULT_RELAYER_CONFIG_OUTPUT, global = true)]
    pub relayer_config_output: PathBuf,

    /// Directory holding the circuit fixtures
    #[arg(long, default_value = DEFAULT_FIXTURES_DIR, global = true)]
    pub fixtures_dir: PathBuf,
}

impl Default for ScriptPaths {
    fn default() -> Self {
        Self {
            deployments_path: DEFAULT_DEPLOYMENTS_PATH.into(),
            artifacts_dir: DEFAULT_ARTIFACTS_DIR.into(),
            relayer_config_template: DEFAULT_RELAYER_CONFIG_TEMPLATE.into(),
            relayer_config_output: DEFAULT_RELAYER_CONFIG_OUTPUT.into(),
            fixtures_dir: DEFAULT_FIXTURES_DIR.into(),
        }
    }
}

#[derive(Subcommand)]
#[allow(missing_docs)]
pub enum Command {
    Deploy(DeployArgs),
    TransferOwnership(TransferOwnershipArgs),
    Faucet(FaucetArgs),
    Deposit(DepositArgs),
    ConfigureTangle(ConfigureTangleArgs),
}

impl Command {
    /// Run the command
    pub async fn run(self, ctx: ScriptContext) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => deploy_with_args(&args, &ctx).await.map(|_| ()),
            Command::TransferOwnership(args) => transfer_ownership(&args, &ctx).await,
            Command::Faucet(args) => faucet(&args, &ctx).await,
            Command::Deposit(args) => deposit(&args, &ctx).await.map(|_| ()),
            Command::ConfigureTangle(args) => configure_tangle(&args).await,
        }
    }
}

/// Deploy WETH, the variable anchor bridge and Multicall3 to every chain.
///
/// A throwaway deployer is funded by the vault, deploys everything, hands
/// the webb tokens over to the vault and returns its remaining funds.
#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Address of an existing WETH contract, verified on every chain
    #[arg(long, conflicts_with = "deploy_weth")]
    pub weth_address: Option<Address>,

    /// Whether to deploy a WETH contract on every chain
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub deploy_weth: bool,

    /// Name of the webb token
    #[arg(long, default_value = "Webb Wrapped Ether")]
    pub webb_token_name: String,

    /// Symbol of the webb token
    #[arg(long, default_value = "webbWETH")]
    pub webb_token_symbol: String,

    /// Whether the webb token may wrap the native token
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub allow_wrapping_native_token: bool,

    /// The governor of the bridge: an address, or a compressed or
    /// uncompressed public key. Defaults to the vault
    #[arg(long)]
    pub governor: Option<String>,

    /// The nonce of the ownership transfer to the governor
    #[arg(long, default_value_t = 0)]
    pub governor_nonce: u32,

    /// Whether to deploy Multicall3 on every chain
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub deploy_multicall3: bool,
}

impl Default for DeployArgs {
    fn default() -> Self {
        Self {
            weth_address: None,
            deploy_weth: true,
            webb_token_name: "Webb Wrapped Ether".to_string(),
            webb_token_symbol: "webbWETH".to_string(),
            allow_wrapping_native_token: true,
            governor: None,
            governor_nonce: 0,
            deploy_multicall3: true,
        }
    }
}

/// Transfer the ownership of a signature bridge to a new governor on every
/// chain
#[derive(Args, Debug, Clone)]
pub struct TransferOwnershipArgs {
    /// Address of the signature bridge
    #[arg(long)]
    pub contract_address: Address,

    /// The new governor: an address, or a compressed or uncompressed public key
    #[arg(long)]
    pub governor: String,

    /// The nonce of the ownership transfer
    #[arg(long, default_value_t = 0)]
    pub governor_nonce: u32,
}

/// Fund test accounts from the vault on every chain
#[derive(Args, Debug, Clone)]
pub struct FaucetArgs {
    /// The accounts to fund
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub recipients: Vec<Address>,

    /// A webb token to mint to every recipient
    #[arg(long)]
    pub erc20_address: Option<Address>,

    /// The amount of native tokens sent to every recipient, in ether
    #[arg(long, default_value = "0.1")]
    pub native_token_amount: String,

    /// The amount of the webb token minted to every recipient, in whole tokens
    #[arg(long)]
    pub erc20_amount: Option<String>,
}

/// Deposit into a VAnchor from a fresh account on the first chain
#[derive(Args, Debug, Clone)]
pub struct DepositArgs {
    /// Address of the VAnchor
    #[arg(long)]
    pub contract_address: Address,

    /// The amount to deposit, in ether
    #[arg(long, default_value = "0.01")]
    pub amount: String,

    /// The prover command line, run as
    /// `<prover> groth16 fullprove <input> <wasm> <zkey> <proof> <public>`
    #[arg(long, default_value = DEFAULT_PROVER_PROGRAM)]
    pub prover: String,
}

/// Configure the proposals, asset registry and anchor pallets of Tangle
#[derive(Args, Debug, Clone)]
pub struct ConfigureTangleArgs {
    /// WebSocket endpoint of the Tangle node
    #[arg(long, default_value = DEFAULT_TANGLE_WS_ENDPOINT)]
    pub ws_endpoint: String,

    /// Secret URI of the sudo account
    #[arg(long, env = "SUDO_SURI", hide_env_values = true)]
    pub sudo_suri: Option<String>,

    /// The resource ids to register, as hex
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub resource_ids: Vec<ResourceId>,

    /// The proposers to register, as SS58 addresses
    #[arg(long, num_args = 1.., value_delimiter = ',', value_parser = parse_account_id)]
    pub proposers: Vec<AccountId32>,

    /// Symbol of the native asset
    #[arg(long, default_value = "tTNT")]
    pub native_asset_symbol: String,

    /// Decimals of the native asset
    #[arg(long, default_value_t = 18)]
    pub native_asset_decimals: u8,

    /// Whether to register the webb asset
    #[arg(long)]
    pub register_webb_asset: bool,

    /// Name of the webb asset, also looked up when creating the VAnchor
    #[arg(long, default_value = "webbtTNT")]
    pub webb_asset_name: String,

    /// Symbol of the webb asset
    #[arg(long, default_value = "webbtTNT", requires = "register_webb_asset")]
    pub webb_asset_symbol: String,

    /// Decimals of the webb asset
    #[arg(long, default_value_t = 18, requires = "register_webb_asset")]
    pub webb_asset_decimals: u8,

    /// Whether to create a VAnchor
    #[arg(long)]
    pub create_vanchor: bool,

    /// Number of neighbor edges of the VAnchor
    #[arg(long, default_value_t = 7, requires = "create_vanchor")]
    pub max_edges: u32,

    /// Depth of the VAnchor Merkle tree
    #[arg(long, default_value_t = 30, requires = "create_vanchor")]
    pub depth: u8,
}

/// Parse an SS58 account id
fn parse_account_id(value: &str) -> Result<AccountId32, String> {
    AccountId32::from_str(value).map_err(|e| format!("invalid SS58 address {value}: {e:?}"))
}
