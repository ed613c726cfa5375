//! Environment-backed configuration of the chains and wallets the scripts use
//!
//! Every value can be given as a flag or through the environment (including a
//! `.env` file). Missing values only become an error when a command needs them.

use std::str::FromStr;

use alloy::{
    primitives::{utils::parse_ether, U256},
    signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner},
    transports::http::reqwest::Url,
};
use clap::Args;

use crate::{
    chain_id::TypedChainId,
    constants::{DEFAULT_DEPLOYER_FUNDING, LOCAL_RPC_HOST, TANGLE_DEPLOYER_FUNDING},
    errors::ScriptError,
};

/// The JSON-RPC endpoints and ids of the bridged EVM chains
#[derive(Args, Debug, Clone, Default)]
pub struct ChainEndpoints {
    /// Local JSON-RPC port of the Athena chain
    #[arg(long, env = "ATHENA_CHAIN_PORT", global = true)]
    pub athena_chain_port: Option<u16>,

    /// Local JSON-RPC port of the Hermes chain
    #[arg(long, env = "HERMES_CHAIN_PORT", global = true)]
    pub hermes_chain_port: Option<u16>,

    /// Local JSON-RPC port of the Demeter chain
    #[arg(long, env = "DEMETER_CHAIN_PORT", global = true)]
    pub demeter_chain_port: Option<u16>,

    /// Chain id of the Athena chain
    #[arg(long, env = "ATHENA_CHAIN_ID", global = true)]
    pub athena_chain_id: Option<u32>,

    /// Chain id of the Hermes chain
    #[arg(long, env = "HERMES_CHAIN_ID", global = true)]
    pub hermes_chain_id: Option<u32>,

    /// Chain id of the Demeter chain
    #[arg(long, env = "DEMETER_CHAIN_ID", global = true)]
    pub demeter_chain_id: Option<u32>,

    /// Chain id of the Tangle EVM chain
    #[arg(long, env = "TANGLE_CHAIN_ID", global = true)]
    pub tangle_chain_id: Option<u32>,

    /// JSON-RPC endpoint of the Tangle EVM chain
    #[arg(long, env = "TANGLE_HTTP_URL", global = true)]
    pub tangle_http_url: Option<String>,

    /// Whether to include the Tangle EVM chain in the set of chains
    #[arg(long, global = true)]
    pub include_tangle_evm: bool,
}

impl ChainEndpoints {
    /// The JSON-RPC URLs of every chain the commands operate on: the three
    /// local chains, followed by the Tangle EVM chain if it is included and
    /// configured
    pub fn rpc_urls(&self) -> Result<Vec<Url>, ScriptError> {
        let mut urls = vec![
            local_rpc_url(require(self.athena_chain_port, "ATHENA_CHAIN_PORT")?)?,
            local_rpc_url(require(self.hermes_chain_port, "HERMES_CHAIN_PORT")?)?,
            local_rpc_url(require(self.demeter_chain_port, "DEMETER_CHAIN_PORT")?)?,
        ];

        if self.include_tangle_evm {
            if let Some(tangle_url) = self.tangle_http_url.as_deref().filter(|u| !u.is_empty()) {
                urls.push(
                    Url::parse(tangle_url)
                        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?,
                );
            }
        }

        Ok(urls)
    }

    /// The typed id of the Athena chain
    pub fn athena_typed_chain_id(&self) -> Result<TypedChainId, ScriptError> {
        require(self.athena_chain_id, "ATHENA_CHAIN_ID").map(TypedChainId::evm)
    }

    /// The typed id of the Hermes chain
    pub fn hermes_typed_chain_id(&self) -> Result<TypedChainId, ScriptError> {
        require(self.hermes_chain_id, "HERMES_CHAIN_ID").map(TypedChainId::evm)
    }

    /// The amount of ether the deployer is funded with on the given chain
    pub fn funding_amount(&self, chain_id: u64) -> Result<U256, ScriptError> {
        let amount = if self.tangle_chain_id.map(u64::from) == Some(chain_id) {
            TANGLE_DEPLOYER_FUNDING
        } else {
            DEFAULT_DEPLOYER_FUNDING
        };

        parse_ether(amount).map_err(|e| ScriptError::Serde(e.to_string()))
    }
}

/// The wallets used by the scripts
#[derive(Args, Debug, Clone, Default)]
pub struct Wallets {
    /// Mnemonic of the vault wallet, which funds every other account
    #[arg(long, env = "MNEMONIC", hide_env_values = true, global = true)]
    pub mnemonic: Option<String>,

    /// Private key of the deployer. A random deployer is used if unset
    #[arg(long, env = "DEPLOYER_PRIVATE_KEY", hide_env_values = true, global = true)]
    pub deployer_private_key: Option<String>,
}

impl Wallets {
    /// The vault signer: the first account derived from the mnemonic
    pub fn vault_signer(&self) -> Result<PrivateKeySigner, ScriptError> {
        let phrase = non_empty(self.mnemonic.as_deref())
            .ok_or_else(|| ScriptError::MissingEnv("MNEMONIC".to_string()))?;

        MnemonicBuilder::<English>::default()
            .phrase(phrase)
            .index(0)
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?
            .build()
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))
    }

    /// The deployer signer, random if no private key is configured
    pub fn deployer_signer(&self) -> Result<PrivateKeySigner, ScriptError> {
        match non_empty(self.deployer_private_key.as_deref()) {
            Some(key) => PrivateKeySigner::from_str(key)
                .map_err(|e| ScriptError::ClientInitialization(e.to_string())),
            None => Ok(PrivateKeySigner::random()),
        }
    }
}

/// The JSON-RPC URL of a chain listening on a local port
pub fn local_rpc_url(port: u16) -> Result<Url, ScriptError> {
    Url::parse(&format!("http://{LOCAL_RPC_HOST}:{port}"))
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))
}

/// Unwrap an environment value, or fail naming the variable
pub fn require<T>(value: Option<T>, name: &str) -> Result<T, ScriptError> {
    value.ok_or_else(|| ScriptError::MissingEnv(name.to_string()))
}

/// Treat empty values like unset ones
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::utils::parse_ether;

    use super::*;

    /// The standard test mnemonic shared by Hardhat and Anvil
    const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";

    fn endpoints() -> ChainEndpoints {
        ChainEndpoints {
            athena_chain_port: Some(5001),
            hermes_chain_port: Some(5002),
            demeter_chain_port: Some(5003),
            athena_chain_id: Some(5001),
            hermes_chain_id: Some(5002),
            demeter_chain_id: Some(5003),
            tangle_chain_id: Some(5006),
            tangle_http_url: Some("http://127.0.0.1:9933".to_string()),
            include_tangle_evm: false,
        }
    }

    #[test]
    fn test_rpc_urls() {
        let urls = endpoints().rpc_urls().unwrap();
        let urls: Vec<_> = urls.iter().map(Url::as_str).collect();
        assert_eq!(
            urls,
            vec![
                "http://127.0.0.1:5001/",
                "http://127.0.0.1:5002/",
                "http://127.0.0.1:5003/"
            ]
        );
    }

    #[test]
    fn test_rpc_urls_with_tangle() {
        let mut endpoints = endpoints();
        endpoints.include_tangle_evm = true;
        assert_eq!(endpoints.rpc_urls().unwrap().len(), 4);

        // The flag has no effect without a URL
        endpoints.tangle_http_url = None;
        assert_eq!(endpoints.rpc_urls().unwrap().len(), 3);
    }

    #[test]
    fn test_missing_port() {
        let mut endpoints = endpoints();
        endpoints.hermes_chain_port = None;
        assert!(matches!(
            endpoints.rpc_urls(),
            Err(ScriptError::MissingEnv(name)) if name == "HERMES_CHAIN_PORT"
        ));
    }

    #[test]
    fn test_funding_amount() {
        let endpoints = endpoints();
        assert_eq!(endpoints.funding_amount(5001).unwrap(), parse_ether("1").unwrap());
        assert_eq!(endpoints.funding_amount(5006).unwrap(), parse_ether("2").unwrap());
    }

    #[test]
    fn test_vault_signer() {
        let wallets = Wallets {
            mnemonic: Some(TEST_MNEMONIC.to_string()),
            deployer_private_key: None,
        };
        assert_eq!(
            wallets.vault_signer().unwrap().address().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );

        assert!(matches!(
            Wallets::default().vault_signer(),
            Err(ScriptError::MissingEnv(_))
        ));
    }

    #[test]
    fn test_deployer_signer() {
        let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let wallets = Wallets {
            mnemonic: None,
            deployer_private_key: Some(key.to_string()),
        };
        assert_eq!(
            wallets.deployer_signer().unwrap().address().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );

        // An empty key yields a fresh random deployer each time
        let wallets = Wallets {
            mnemonic: None,
            deployer_private_key: Some(String::new()),
        };
        assert_ne!(
            wallets.deployer_signer().unwrap().address(),
            wallets.deployer_signer().unwrap().address()
        );
    }
}
