//! Constants used in the deployment scripts

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The number of bytes in a compressed secp256k1 public key
pub const NUM_BYTES_COMPRESSED_PUBKEY: usize = 33;

/// The number of bytes in an uncompressed secp256k1 public key, without the
/// leading `0x04` tag
pub const NUM_BYTES_UNCOMPRESSED_PUBKEY: usize = 64;

/// The host on which the local EVM chains expose their JSON-RPC ports
pub const LOCAL_RPC_HOST: &str = "127.0.0.1";

/// The amount of ether the vault sends the deployer on each chain, unless the
/// chain has its own amount
pub const DEFAULT_DEPLOYER_FUNDING: &str = "1";

/// The amount of ether the vault sends the deployer on the Tangle EVM chain
pub const TANGLE_DEPLOYER_FUNDING: &str = "2";

/// The amount of ether the deployer keeps when returning its remaining funds
/// to the vault
pub const DEPLOYER_REFUND_RESERVE: &str = "0.01";

/// The amount of ether given to the throwaway account of the deposit script
pub const DEPOSIT_ACCOUNT_FUNDING: &str = "1000";

/// The symbol an existing WETH contract must report
pub const WETH_SYMBOL: &str = "WETH";

// -------------
// | Artifacts |
// -------------

/// The default directory holding the compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "contracts";

/// The WETH9 artifact
pub const WETH9_ARTIFACT: &str = "WETH9";
/// The Multicall3 artifact
pub const MULTICALL3_ARTIFACT: &str = "Multicall3";
/// The signature bridge artifact
pub const SIGNATURE_BRIDGE_ARTIFACT: &str = "SignatureBridge";
/// The token wrapper handler artifact
pub const TOKEN_WRAPPER_HANDLER_ARTIFACT: &str = "TokenWrapperHandler";
/// The anchor handler artifact
pub const ANCHOR_HANDLER_ARTIFACT: &str = "AnchorHandler";
/// The fungible token wrapper artifact
pub const FUNGIBLE_TOKEN_WRAPPER_ARTIFACT: &str = "FungibleTokenWrapper";
/// The Poseidon hasher artifact
pub const POSEIDON_HASHER_ARTIFACT: &str = "PoseidonHasher";
/// The variable anchor verifier artifact, dispatching to the sized verifiers
pub const VANCHOR_VERIFIER_ARTIFACT: &str = "VAnchorVerifier";
/// The sized Groth16 verifier artifacts, in `VAnchorVerifier` constructor order
pub const SIZED_VERIFIER_ARTIFACTS: [&str; 4] =
    ["Verifier2_2", "Verifier2_16", "Verifier8_2", "Verifier8_16"];
/// The variable anchor (with on-chain Merkle tree) artifact
pub const VANCHOR_ARTIFACT: &str = "VAnchorTree";

// ----------
// | Bridge |
// ----------

/// The depth of the VAnchor Merkle tree
pub const VANCHOR_TREE_LEVELS: u32 = 30;

/// The edge count of a bridge with more than two chains
pub const MAX_EDGES_LARGE: u8 = 7;

/// The edge count of a bridge with at most two chains
pub const MAX_EDGES_SMALL: u8 = 1;

/// The fee percentage set on newly deployed webb tokens
pub const WEBB_TOKEN_FEE_PERCENTAGE: u16 = 0;

/// The signature of the governance-gated resource registration method
pub const ADMIN_SET_RESOURCE_SIGNATURE: &str =
    "adminSetResourceWithSignature(bytes32,bytes4,uint32,bytes32,address,bytes)";

/// The signature of the token wrapper method adding a wrappable token
pub const ADD_TOKEN_SIGNATURE: &str = "add(address,uint32)";

// ------------------
// | Relayer Config |
// ------------------

/// The default path of the relayer configuration template
pub const DEFAULT_RELAYER_CONFIG_TEMPLATE: &str = "config/orbit.toml.tmpl";

/// The default path of the rendered relayer configuration
pub const DEFAULT_RELAYER_CONFIG_OUTPUT: &str = "config/orbit.toml";

/// The default path of the deployments file
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

// ---------------
// | ZK Fixtures |
// ---------------

/// The default directory holding the circuit fixtures
pub const DEFAULT_FIXTURES_DIR: &str = "fixtures/solidity-fixtures";

/// The number of inputs of the small variable anchor circuit
pub const SMALL_CIRCUIT_INPUTS: usize = 2;

/// The number of outputs of every variable anchor circuit
pub const CIRCUIT_OUTPUTS: usize = 2;

/// The default program used to generate proofs
pub const DEFAULT_PROVER_PROGRAM: &str = "snarkjs";

/// The number of bytes in an encrypted output payload
pub const ENCRYPTED_OUTPUT_LEN: usize = 32;

// -----------
// | Tangle  |
// -----------

/// The default WebSocket endpoint of the Tangle node
pub const DEFAULT_TANGLE_WS_ENDPOINT: &str = "ws://127.0.0.1:9944";

/// The existential deposit of a newly registered webb asset
pub const WEBB_ASSET_EXISTENTIAL_DEPOSIT: u128 = 10 * 10u128.pow(13);

/// The amount of native tokens given to each proposer, in whole units
pub const PROPOSER_FUNDING_UNITS: u128 = 1000;

/// The number of decimals of the Tangle native token
pub const TANGLE_NATIVE_DECIMALS: u32 = 18;

/// The id of the native asset in the asset registry
pub const NATIVE_ASSET_ID: u32 = 0;
