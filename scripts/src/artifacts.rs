//! Loading, linking and deploying compiled contract artifacts
//!
//! Artifacts are the JSON files emitted by Hardhat (`bytecode` is a hex
//! string, `linkReferences` at the top level) or Foundry (`bytecode` is an
//! object with `object` and `linkReferences`). Library placeholders are patched
//! by offset, so the artifact's hex is never decoded before every library is
//! linked.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes},
    providers::Provider,
    rpc::types::TransactionRequest,
};
use serde::Deserialize;
use tracing::debug;

use crate::{errors::ScriptError, utils::SignerClient};

/// The positions of library placeholders, keyed by source file then library
type RawLinkReferences = BTreeMap<String, BTreeMap<String, Vec<LinkOffset>>>;

/// A single library placeholder in the deployment bytecode
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct LinkOffset {
    /// Byte offset of the placeholder
    pub start: usize,
    /// Length of the placeholder in bytes
    pub length: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object {
        object: String,
        #[serde(default, rename = "linkReferences")]
        link_references: RawLinkReferences,
    },
}

#[derive(Deserialize)]
struct RawArtifact {
    bytecode: RawBytecode,
    #[serde(default, rename = "linkReferences")]
    link_references: RawLinkReferences,
}

/// A compiled contract, possibly with unlinked library references
#[derive(Debug, Clone)]
pub struct Artifact {
    /// The name of the contract
    pub name: String,
    /// The creation bytecode as hex, without the `0x` prefix
    bytecode: String,
    /// The unlinked library placeholders, keyed by library name
    unlinked: BTreeMap<String, Vec<LinkOffset>>,
}

impl Artifact {
    /// Parse an artifact from its JSON contents
    pub fn from_json(name: &str, json: &str) -> Result<Self, ScriptError> {
        let raw: RawArtifact = serde_json::from_str(json)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{name}: {e}")))?;

        let (bytecode, mut link_references) = match raw.bytecode {
            RawBytecode::Hex(hex) => (hex, BTreeMap::new()),
            RawBytecode::Object {
                object,
                link_references,
            } => (object, link_references),
        };
        link_references.extend(raw.link_references);

        let bytecode = bytecode.trim_start_matches("0x").to_string();
        if bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{name}: artifact has no creation bytecode"
            )));
        }

        let mut unlinked: BTreeMap<String, Vec<LinkOffset>> = BTreeMap::new();
        for (library, offsets) in link_references.into_values().flatten() {
            unlinked.entry(library).or_default().extend(offsets);
        }

        Ok(Self {
            name: name.to_string(),
            bytecode,
            unlinked,
        })
    }

    /// Load the artifact for `name` from `<dir>/<name>.json`
    pub fn load(dir: &Path, name: &str) -> Result<Self, ScriptError> {
        let path = artifact_path(dir, name);
        let json = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))?;
        Self::from_json(name, &json)
    }

    /// The names of the libraries that still need to be linked
    pub fn unlinked_libraries(&self) -> Vec<String> {
        self.unlinked.keys().cloned().collect()
    }

    /// Replace every placeholder of `library` with `address`
    pub fn link(&mut self, library: &str, address: Address) -> Result<(), ScriptError> {
        let offsets = self.unlinked.remove(library).ok_or_else(|| {
            ScriptError::ArtifactParsing(format!(
                "{}: no reference to library {library}",
                self.name
            ))
        })?;

        let address_hex = hex::encode(address.as_slice());
        for LinkOffset { start, length } in offsets {
            let (from, to) = (start * 2, (start + length) * 2);
            if length * 2 != address_hex.len() || to > self.bytecode.len() {
                return Err(ScriptError::ArtifactParsing(format!(
                    "{}: malformed link reference for {library}",
                    self.name
                )));
            }
            self.bytecode.replace_range(from..to, &address_hex);
        }

        Ok(())
    }

    /// The linked creation bytecode
    pub fn bytecode(&self) -> Result<Bytes, ScriptError> {
        if let Some(library) = self.unlinked.keys().next() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{}: library {library} is not linked",
                self.name
            )));
        }

        hex::decode(&self.bytecode)
            .map(Bytes::from)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", self.name)))
    }

    /// The creation bytecode followed by the ABI-encoded constructor arguments
    pub fn deploy_code(&self, constructor_args: &[u8]) -> Result<Bytes, ScriptError> {
        let mut code = self.bytecode()?.to_vec();
        code.extend_from_slice(constructor_args);
        Ok(code.into())
    }
}

/// The path of the artifact file for the given contract
pub fn artifact_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.json"))
}

/// A contract deployed from an artifact
#[derive(Debug, Clone, Copy)]
pub struct DeployedContract {
    /// The address of the contract
    pub address: Address,
    /// The block in which the contract was created
    pub block_number: Option<u64>,
}

/// Deploys artifacts through a single signer on a single chain, deploying and
/// linking the libraries they reference along the way
pub struct ArtifactDeployer<'a> {
    /// The directory holding the artifacts
    artifacts_dir: &'a Path,
    /// The signer deploying the contracts
    client: &'a SignerClient,
    /// Libraries already deployed by this deployer
    libraries: HashMap<String, Address>,
}

impl<'a> ArtifactDeployer<'a> {
    /// Create a deployer for the given chain client
    pub fn new(artifacts_dir: &'a Path, client: &'a SignerClient) -> Self {
        Self {
            artifacts_dir,
            client,
            libraries: HashMap::new(),
        }
    }

    /// The client the deployer sends transactions with
    pub fn client(&self) -> &SignerClient {
        self.client
    }

    /// Deploy the named artifact with the given ABI-encoded constructor
    /// arguments
    pub async fn deploy(
        &mut self,
        name: &str,
        constructor_args: &[u8],
    ) -> Result<DeployedContract, ScriptError> {
        let mut artifact = Artifact::load(self.artifacts_dir, name)?;
        self.link_libraries(&mut artifact).await?;

        let code = artifact.deploy_code(constructor_args)?;
        let deployed = deploy_code(self.client, code).await?;
        debug!(
            contract = name,
            address = %deployed.address,
            chain_id = self.client.chain_id,
            "deployed contract"
        );

        Ok(deployed)
    }

    /// Deploy every library the artifact references that this deployer has
    /// not deployed yet, then link them all.
    ///
    /// Libraries may themselves only reference libraries that were already
    /// deployed.
    async fn link_libraries(&mut self, artifact: &mut Artifact) -> Result<(), ScriptError> {
        for library in artifact.unlinked_libraries() {
            let address = match self.libraries.get(&library) {
                Some(address) => *address,
                None => {
                    let mut library_artifact = Artifact::load(self.artifacts_dir, &library)?;
                    for nested in library_artifact.unlinked_libraries() {
                        let nested_address = self.libraries.get(&nested).ok_or_else(|| {
                            ScriptError::ArtifactParsing(format!(
                                "{library}: nested library {nested} is not deployed"
                            ))
                        })?;
                        library_artifact.link(&nested, *nested_address)?;
                    }

                    let code = library_artifact.deploy_code(&[])?;
                    let deployed = deploy_code(self.client, code).await?;
                    debug!(library, address = %deployed.address, "deployed library");
                    self.libraries.insert(library.clone(), deployed.address);
                    deployed.address
                }
            };

            artifact.link(&library, address)?;
        }

        Ok(())
    }
}

/// Send a contract creation transaction and wait for its receipt
pub async fn deploy_code(
    client: &SignerClient,
    code: Bytes,
) -> Result<DeployedContract, ScriptError> {
    let tx = TransactionRequest::default().with_deploy_code(code);
    let receipt = client
        .provider
        .send_transaction(tx)
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

    if !receipt.status() {
        return Err(ScriptError::ContractDeployment(format!(
            "creation transaction {} reverted",
            receipt.transaction_hash
        )));
    }

    let address = receipt.contract_address.ok_or_else(|| {
        ScriptError::ContractDeployment("receipt has no contract address".to_string())
    })?;

    Ok(DeployedContract {
        address,
        block_number: receipt.block_number,
    })
}
