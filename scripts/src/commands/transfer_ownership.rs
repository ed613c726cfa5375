//! Handing a deployed signature bridge over to a new governor

use colored::Colorize;

use crate::{
    cli::TransferOwnershipArgs,
    commands::ScriptContext,
    errors::ScriptError,
    governor::parse_governor,
    solidity::ISignatureBridge,
    utils::{connect_providers, send_tx, setup_clients},
};

/// Transfer the bridge's ownership on every chain where the governor differs
pub async fn transfer_ownership(
    args: &TransferOwnershipArgs,
    ctx: &ScriptContext,
) -> Result<(), ScriptError> {
    let governor = parse_governor(&args.governor)?;
    let rpc_urls = ctx.rpc_urls()?;
    connect_providers(&rpc_urls).await?;

    let vault = ctx.wallets.vault_signer()?;
    let clients = setup_clients(&rpc_urls, &vault).await?;

    for client in &clients {
        let bridge = ISignatureBridge::new(args.contract_address, client.provider.clone());
        let current = bridge
            .governor()
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        if current == governor {
            println!(
                "{}",
                format!("Governor already set to {governor} on chain {}", client.chain_id)
                    .yellow()
            );
            continue;
        }

        send_tx(bridge.transferOwnership(governor, args.governor_nonce)).await?;
        println!(
            "{} {}",
            format!("Ownership transferred to {governor}").green(),
            format!("on chain {}", client.chain_id).dimmed()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Address;

    use crate::{
        cli::ScriptPaths,
        env::{ChainEndpoints, Wallets},
    };

    use super::*;

    fn unreachable_ctx() -> ScriptContext {
        let mut ctx =
            ScriptContext::new(ChainEndpoints::default(), Wallets::default(), ScriptPaths::default());
        ctx.remote_rpc_urls = Some(vec!["http://127.0.0.1:1".parse().unwrap()]);
        ctx
    }

    #[tokio::test]
    async fn test_connections_checked_first() {
        let args = TransferOwnershipArgs {
            contract_address: Address::repeat_byte(1),
            governor: Address::repeat_byte(2).to_string(),
            governor_nonce: 1,
        };

        // No vault mnemonic is set, so only the connection check can fail here
        assert!(matches!(
            transfer_ownership(&args, &unreachable_ctx()).await,
            Err(ScriptError::ClientInitialization(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_governor() {
        let args = TransferOwnershipArgs {
            contract_address: Address::repeat_byte(1),
            governor: "0x1234".to_string(),
            governor_nonce: 1,
        };

        assert!(matches!(
            transfer_ownership(&args, &unreachable_ctx()).await,
            Err(ScriptError::InvalidAddress(_))
        ));
    }
}
