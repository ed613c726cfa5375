//! Deployment of the webbWETH token

use eyre::{ensure, eyre, Result};
use orbit_scripts::{
    cli::DeployArgs,
    solidity::IERC20,
    utils::{chain_ids, connect_providers},
};

use crate::{constants::TEST_WEBB_TOKEN, integration_test, test_inventory::TestArgs};

/// Deploys the bridge and checks the webb token's name and symbol on every
/// chain
async fn test_webb_weth(test_args: TestArgs) -> Result<()> {
    let deployment = test_args
        .deploy(DeployArgs {
            webb_token_name: TEST_WEBB_TOKEN.to_string(),
            webb_token_symbol: TEST_WEBB_TOKEN.to_string(),
            ..Default::default()
        })
        .await?;

    let providers = connect_providers(&test_args.ctx.rpc_urls()?).await?;
    let chain_ids = chain_ids(&providers).await?;
    for (provider, chain_id) in providers.iter().zip(chain_ids) {
        let token_address = deployment
            .chains
            .values()
            .find(|chain| chain.chain_id == chain_id)
            .and_then(|chain| chain.webb_token_address)
            .ok_or_else(|| eyre!("no webb token on chain {chain_id}"))?;
        let token = IERC20::new(token_address, provider.clone());

        let name = token.name().call().await?;
        let symbol = token.symbol().call().await?;
        ensure!(name == TEST_WEBB_TOKEN, "unexpected name {name} on chain {chain_id}");
        ensure!(symbol == TEST_WEBB_TOKEN, "unexpected symbol {symbol} on chain {chain_id}");
    }

    Ok(())
}
integration_test!(test_webb_weth);
