//! Funding of test accounts

use alloy::primitives::{utils::parse_ether, Address, U256};
use colored::Colorize;
use itertools::iproduct;

use crate::{
    cli::FaucetArgs,
    commands::ScriptContext,
    errors::ScriptError,
    solidity::IFungibleTokenWrapper,
    utils::{connect_providers, send_funds, send_tx, setup_clients, SignerClient},
};

/// Send native tokens, and optionally mint webb tokens, to every recipient on
/// every chain
pub async fn faucet(args: &FaucetArgs, ctx: &ScriptContext) -> Result<(), ScriptError> {
    let native_amount =
        parse_ether(&args.native_token_amount).map_err(|e| ScriptError::Serde(e.to_string()))?;
    let rpc_urls = ctx.rpc_urls()?;
    connect_providers(&rpc_urls).await?;

    let vault = ctx.wallets.vault_signer()?;
    let clients = setup_clients(&rpc_urls, &vault).await?;

    for (client, recipient) in transfer_order(&clients, &args.recipients) {
        send_funds(client, *recipient, native_amount).await?;
    }

    if let (Some(erc20), Some(amount)) = (args.erc20_address, &args.erc20_amount) {
        // Webb tokens have 18 decimals, like ether
        let amount = parse_ether(amount).map_err(|e| ScriptError::Serde(e.to_string()))?;
        for (client, recipient) in transfer_order(&clients, &args.recipients) {
            mint(client, erc20, *recipient, amount).await?;
        }
    }

    Ok(())
}

/// Every (chain, recipient) pair, chain-major
fn transfer_order<'a, C, R>(chains: &'a [C], recipients: &'a [R]) -> Vec<(&'a C, &'a R)> {
    iproduct!(chains.iter(), recipients.iter()).collect()
}

/// Mint `amount` of the webb token to `recipient`
async fn mint(
    client: &SignerClient,
    token: Address,
    recipient: Address,
    amount: U256,
) -> Result<(), ScriptError> {
    let token = IFungibleTokenWrapper::new(token, client.provider.clone());
    let receipt = send_tx(token.mint(recipient, amount)).await?;

    println!(
        "{} {} {}",
        "Minted tokens to".green(),
        recipient.to_string().blue(),
        format!(
            "chain id {} | tx hash {}",
            client.chain_id, receipt.transaction_hash
        )
        .dimmed()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        cli::ScriptPaths,
        env::{ChainEndpoints, Wallets},
    };

    use super::*;

    #[tokio::test]
    async fn test_connections_checked_first() {
        let mut ctx =
            ScriptContext::new(ChainEndpoints::default(), Wallets::default(), ScriptPaths::default());
        ctx.remote_rpc_urls = Some(vec!["http://127.0.0.1:1".parse().unwrap()]);
        let args = FaucetArgs {
            recipients: vec![Address::repeat_byte(1)],
            erc20_address: None,
            native_token_amount: "0.1".to_string(),
            erc20_amount: None,
        };

        // No vault mnemonic is set, so only the connection check can fail here
        assert!(matches!(
            faucet(&args, &ctx).await,
            Err(ScriptError::ClientInitialization(_))
        ));
    }

    #[test]
    fn test_transfer_order_is_chain_major() {
        let chains = [5001u64, 5002];
        let recipients = ['a', 'b', 'c'];

        let order: Vec<_> = transfer_order(&chains, &recipients)
            .into_iter()
            .map(|(chain, recipient)| (*chain, *recipient))
            .collect();
        assert_eq!(
            order,
            vec![
                (5001, 'a'),
                (5001, 'b'),
                (5001, 'c'),
                (5002, 'a'),
                (5002, 'b'),
                (5002, 'c'),
            ]
        );
    }

    #[test]
    fn test_no_recipients() {
        assert!(transfer_order(&[5001u64], &[] as &[Address]).is_empty());
    }
}
