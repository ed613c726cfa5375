//! The full bridge deployment

use std::collections::BTreeMap;

use alloy::{
    primitives::{utils::parse_ether, Address},
    signers::local::PrivateKeySigner,
};
use colored::Colorize;
use futures::future::try_join_all;
use tracing::{info, warn};

use crate::{
    artifacts::ArtifactDeployer,
    bridge::{deploy_variable_anchor_bridge, BridgeInput, GovernorConfig, VBridge, WebbTokenConfig},
    chain_id::TypedChainId,
    cli::DeployArgs,
    commands::ScriptContext,
    constants::DEPLOYER_REFUND_RESERVE,
    env::require,
    errors::ScriptError,
    governor::extract_governor_address_or_default,
    relayer_config::{write_relayer_config, RelayerConfigSubstitutions},
    solidity::IFungibleTokenWrapper,
    types::{ChainDeployment, Deployment},
    utils::{
        chain_ids, connect_providers, send_funds, send_tx, setup_clients, write_deployments,
        SignerClient,
    },
    weth::{deploy_multicall3, deploy_weth9, verify_weth},
};

/// Deploy the bridge and its helper contracts to every chain.
///
/// The deployer is funded by the vault beforehand and refunds the vault
/// afterwards, whether or not the deployment succeeded.
pub async fn deploy_with_args(
    args: &DeployArgs,
    ctx: &ScriptContext,
) -> Result<Deployment, ScriptError> {
    let vault = ctx.wallets.vault_signer()?;
    let deployer = ctx.wallets.deployer_signer()?;
    println!("{} {}", "Vault:".bold(), vault.address().to_string().blue());
    println!("{} {}", "Deployer:".bold(), deployer.address().to_string().blue());

    let rpc_urls = ctx.rpc_urls()?;
    connect_providers(&rpc_urls).await?;
    let vaults = setup_clients(&rpc_urls, &vault).await?;
    let deployers = setup_clients(&rpc_urls, &deployer).await?;

    fund_deployer(ctx, &vaults, deployer.address()).await?;
    let result = deploy_contracts(args, ctx, &vault, &deployers).await;
    let refund = refund_vault(&deployers, vault.address()).await;

    let deployment = result?;
    refund?;
    Ok(deployment)
}

/// Send the deployer its funding on every chain in parallel
async fn fund_deployer(
    ctx: &ScriptContext,
    vaults: &[SignerClient],
    deployer: Address,
) -> Result<(), ScriptError> {
    println!("{}", "Funding the deployer".bold());
    try_join_all(vaults.iter().map(|vault| async move {
        let amount = ctx.endpoints.funding_amount(vault.chain_id)?;
        send_funds(vault, deployer, amount).await
    }))
    .await?;

    Ok(())
}

/// Return the deployer's remaining funds to the vault on every chain in
/// parallel, keeping a small reserve for gas
async fn refund_vault(deployers: &[SignerClient], vault: Address) -> Result<(), ScriptError> {
    println!("{}", "Refunding the vault".bold());
    let reserve =
        parse_ether(DEPLOYER_REFUND_RESERVE).map_err(|e| ScriptError::Serde(e.to_string()))?;

    try_join_all(deployers.iter().map(|deployer| async move {
        let balance = deployer.balance_of(deployer.address()).await?;
        if balance > reserve {
            send_funds(deployer, vault, balance - reserve).await?;
        } else {
            warn!(chain_id = deployer.chain_id, "deployer balance too low to refund");
        }

        Ok::<_, ScriptError>(())
    }))
    .await?;

    Ok(())
}

/// The deployment proper, run by the funded deployer
async fn deploy_contracts(
    args: &DeployArgs,
    ctx: &ScriptContext,
    vault: &PrivateKeySigner,
    deployers: &[SignerClient],
) -> Result<Deployment, ScriptError> {
    let providers: Vec<_> = deployers.iter().map(|d| d.provider.clone()).collect();
    let typed_chain_ids = chain_ids(&providers)
        .await?
        .into_iter()
        .map(|chain_id| {
            u32::try_from(chain_id)
                .map(TypedChainId::evm)
                .map_err(|e| ScriptError::ClientInitialization(format!("chain id {chain_id}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let clients: BTreeMap<TypedChainId, SignerClient> =
        typed_chain_ids.iter().copied().zip(deployers.iter().cloned()).collect();

    let vault_address = vault.address();
    let governor = extract_governor_address_or_default(args.governor.as_deref(), || vault_address);
    info!(%governor, nonce = args.governor_nonce, "resolved bridge governor");

    // --- Wrapped tokens ---
    let mut tokens: BTreeMap<TypedChainId, Vec<Address>> =
        typed_chain_ids.iter().map(|chain| (*chain, Vec::new())).collect();
    if args.allow_wrapping_native_token {
        tokens.values_mut().for_each(|list| list.push(Address::ZERO));
    }

    let weth_address = match args.weth_address {
        Some(weth) => {
            for (chain, client) in &clients {
                verify_weth(client, weth).await?;
                tokens.entry(*chain).or_default().push(weth);
            }
            Some(weth)
        }
        None if args.deploy_weth => {
            let mut last = None;
            for (chain, client) in &clients {
                let mut deployer = ArtifactDeployer::new(&ctx.paths.artifacts_dir, client);
                let weth = deploy_weth9(&mut deployer).await?;
                println!(
                    "{} {} {}",
                    "WETH deployed at".green(),
                    weth.to_string().blue(),
                    format!("on chain {}", client.chain_id).dimmed()
                );
                tokens.entry(*chain).or_default().push(weth);
                last = Some(weth);
            }
            last
        }
        None => None,
    };

    // --- Bridge ---
    let webb_token = WebbTokenConfig {
        name: args.webb_token_name.clone(),
        symbol: args.webb_token_symbol.clone(),
    };
    let input = BridgeInput {
        chains: typed_chain_ids.clone(),
        tokens,
        webb_tokens: typed_chain_ids.iter().map(|chain| (*chain, webb_token.clone())).collect(),
    };
    let governors = typed_chain_ids
        .iter()
        .map(|chain| {
            (
                *chain,
                GovernorConfig {
                    address: governor,
                    nonce: args.governor_nonce,
                },
            )
        })
        .collect();
    let vbridge =
        deploy_variable_anchor_bridge(&input, &clients, &governors, &ctx.paths.artifacts_dir)
            .await?;

    for (chain, webb_token) in &vbridge.webb_tokens {
        if let Some(client) = clients.get(chain) {
            hand_over_webb_token(client, *webb_token, vault_address).await?;
        }
    }

    // --- Report ---
    let metadata = webb_token_metadata(&vbridge, &clients).await?;
    let mut deployment = summarize(&vbridge, &clients, &metadata)?;
    deployment.weth_address = weth_address;

    write_relayer_config(
        &ctx.paths.relayer_config_template,
        &ctx.paths.relayer_config_output,
        &RelayerConfigSubstitutions {
            athena_chain_id: require(ctx.endpoints.athena_chain_id, "ATHENA_CHAIN_ID")?,
            hermes_chain_id: require(ctx.endpoints.hermes_chain_id, "HERMES_CHAIN_ID")?,
            demeter_chain_id: require(ctx.endpoints.demeter_chain_id, "DEMETER_CHAIN_ID")?,
            tangle_chain_id: ctx.endpoints.tangle_chain_id,
            bridge_address: deployment.bridge_address,
            vanchor_address: deployment.anchor_address,
        },
    )?;
    println!(
        "{} {}",
        "Relayer config written to".green(),
        ctx.paths.relayer_config_output.display()
    );

    if args.deploy_multicall3 {
        for (chain, client) in &clients {
            let mut deployer = ArtifactDeployer::new(&ctx.paths.artifacts_dir, client);
            let multicall3 = deploy_multicall3(&mut deployer).await?;
            println!(
                "{} {} {}",
                "Multicall3 deployed at".green(),
                multicall3.address.to_string().blue(),
                format!(
                    "on chain {} at block {}",
                    client.chain_id,
                    multicall3.block_number.unwrap_or_default()
                )
                .dimmed()
            );

            deployment.multicall3_address = Some(multicall3.address);
            if let Some(entry) = deployment.chains.get_mut(&chain.calculate()) {
                entry.multicall3_address = Some(multicall3.address);
            }
        }
    }

    write_deployments(&ctx.paths.deployments_path, &deployment)?;
    Ok(deployment)
}

/// Make the vault the admin and sole minter and pauser of the webb token
async fn hand_over_webb_token(
    client: &SignerClient,
    webb_token: Address,
    vault: Address,
) -> Result<(), ScriptError> {
    let token = IFungibleTokenWrapper::new(webb_token, client.provider.clone());
    let call_err = |e: alloy::contract::Error| ScriptError::ContractInteraction(e.to_string());

    let admin_role = token.DEFAULT_ADMIN_ROLE().call().await.map_err(call_err)?;
    let minter_role = token.MINTER_ROLE().call().await.map_err(call_err)?;
    let pauser_role = token.PAUSER_ROLE().call().await.map_err(call_err)?;

    for role in [admin_role, minter_role, pauser_role] {
        send_tx(token.grantRole(role, vault)).await?;
    }
    for role in [minter_role, pauser_role] {
        send_tx(token.revokeRole(role, client.address())).await?;
    }

    info!(%webb_token, chain_id = client.chain_id, "webb token handed over to the vault");
    Ok(())
}

/// The name and symbol each deployed webb token reports on chain
async fn webb_token_metadata(
    vbridge: &VBridge,
    clients: &BTreeMap<TypedChainId, SignerClient>,
) -> Result<BTreeMap<TypedChainId, WebbTokenConfig>, ScriptError> {
    let call_err = |e: alloy::contract::Error| ScriptError::ContractInteraction(e.to_string());

    let mut metadata = BTreeMap::new();
    for (chain, address) in &vbridge.webb_tokens {
        let Some(client) = clients.get(chain) else {
            continue;
        };
        let token = IFungibleTokenWrapper::new(*address, client.provider.clone());
        let name = token.name().call().await.map_err(call_err)?;
        let symbol = token.symbol().call().await.map_err(call_err)?;
        metadata.insert(*chain, WebbTokenConfig { name, symbol });
    }

    Ok(metadata)
}

/// Print the deployed contracts of every chain and collect them into the
/// deployment summary
fn summarize(
    vbridge: &VBridge,
    clients: &BTreeMap<TypedChainId, SignerClient>,
    metadata: &BTreeMap<TypedChainId, WebbTokenConfig>,
) -> Result<Deployment, ScriptError> {
    let mut chains = BTreeMap::new();
    let mut last = None;

    for (chain, client) in clients {
        let missing = |contract: &str| {
            ScriptError::ContractDeployment(format!("no {contract} deployed on chain {chain}"))
        };
        let bridge = *vbridge.sides.get(chain).ok_or_else(|| missing("bridge"))?;
        let anchor = *vbridge.anchors.get(chain).ok_or_else(|| missing("anchor"))?;
        let token = *vbridge.webb_tokens.get(chain).ok_or_else(|| missing("webb token"))?;
        let webb_token = metadata.get(chain).ok_or_else(|| missing("webb token metadata"))?;

        println!("{}", format!("Chain {}", client.chain_id).bold());
        println!("  {} {}", "Bridge:".green(), bridge.to_string().blue());
        println!("  {} {}", "VAnchor:".green(), anchor.to_string().blue());
        println!(
            "  {} {}",
            format!("{} ({}):", webb_token.name, webb_token.symbol).green(),
            token.to_string().blue()
        );

        chains.insert(
            chain.calculate(),
            ChainDeployment {
                chain_id: client.chain_id,
                bridge_address: Some(bridge),
                anchor_address: Some(anchor),
                webb_token_address: Some(token),
                multicall3_address: None,
            },
        );
        last = Some((bridge, anchor, token));
    }

    let (bridge_address, anchor_address, webb_token_address) =
        last.ok_or_else(|| ScriptError::ContractDeployment("no chains to deploy to".to_string()))?;

    Ok(Deployment {
        bridge_address,
        anchor_address,
        webb_token_address,
        weth_address: None,
        multicall3_address: None,
        chains,
    })
}

#[cfg(test)]
mod tests {
    use alloy::providers::{DynProvider, ProviderBuilder};

    use super::*;

    fn webb_weth() -> WebbTokenConfig {
        WebbTokenConfig {
            name: "webbWETH".to_string(),
            symbol: "webbWETH".to_string(),
        }
    }

    fn client(chain_id: u64) -> SignerClient {
        let provider = ProviderBuilder::new().connect_http("http://127.0.0.1:1".parse().unwrap());
        SignerClient {
            provider: DynProvider::new(provider),
            signer: PrivateKeySigner::random(),
            chain_id,
        }
    }

    #[test]
    fn test_summary_keeps_last_chain() {
        let chains = [TypedChainId::evm(5001), TypedChainId::evm(5002)];
        let clients: BTreeMap<_, _> = chains.iter().map(|c| (*c, client(c.chain_id.into()))).collect();

        let mut vbridge = VBridge::default();
        for (i, chain) in chains.iter().enumerate() {
            let byte = i as u8 + 1;
            vbridge.sides.insert(*chain, Address::repeat_byte(byte));
            vbridge.anchors.insert(*chain, Address::repeat_byte(byte + 0x10));
            vbridge.webb_tokens.insert(*chain, Address::repeat_byte(byte + 0x20));
        }

        let metadata = chains.iter().map(|chain| (*chain, webb_weth())).collect();
        let deployment = summarize(&vbridge, &clients, &metadata).unwrap();
        assert_eq!(deployment.bridge_address, Address::repeat_byte(2));
        assert_eq!(deployment.anchor_address, Address::repeat_byte(0x12));
        assert_eq!(deployment.webb_token_address, Address::repeat_byte(0x22));
        assert_eq!(deployment.chains.len(), 2);
        assert_eq!(
            deployment.chains[&TypedChainId::evm(5001).calculate()].chain_id,
            5001
        );
    }

    #[test]
    fn test_summary_requires_every_contract() {
        let chain = TypedChainId::evm(5001);
        let clients = BTreeMap::from([(chain, client(5001))]);

        let mut vbridge = VBridge::default();
        vbridge.sides.insert(chain, Address::repeat_byte(1));
        vbridge.webb_tokens.insert(chain, Address::repeat_byte(2));

        let metadata = BTreeMap::from([(chain, webb_weth())]);
        assert!(matches!(
            summarize(&vbridge, &clients, &metadata),
            Err(ScriptError::ContractDeployment(_))
        ));
    }

    #[test]
    fn test_summary_requires_token_metadata() {
        let chain = TypedChainId::evm(5001);
        let clients = BTreeMap::from([(chain, client(5001))]);

        let mut vbridge = VBridge::default();
        vbridge.sides.insert(chain, Address::repeat_byte(1));
        vbridge.anchors.insert(chain, Address::repeat_byte(2));
        vbridge.webb_tokens.insert(chain, Address::repeat_byte(3));

        assert!(summarize(&vbridge, &clients, &BTreeMap::from([(chain, webb_weth())])).is_ok());
        assert!(matches!(
            summarize(&vbridge, &clients, &BTreeMap::new()),
            Err(ScriptError::ContractDeployment(_))
        ));
    }
}
