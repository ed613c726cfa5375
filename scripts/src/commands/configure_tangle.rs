//! Configuration of the Tangle pallets

use std::str::FromStr;

use colored::Colorize;
use subxt::utils::AccountId32;
use subxt_signer::{sr25519::Keypair, SecretUri};

use crate::{
    cli::ConfigureTangleArgs,
    errors::ScriptError,
    tangle::{plan_calls, TangleClient, TangleConfig, VAnchorConfig, WebbAssetConfig},
};

/// Bring the Tangle chain to the configuration described by the arguments,
/// in a single sudo batch
pub async fn configure_tangle(args: &ConfigureTangleArgs) -> Result<(), ScriptError> {
    let sudo = sudo_keypair(args.sudo_suri.as_deref())?;
    let config = tangle_config(args, AccountId32::from(sudo.public_key().0));

    let client = TangleClient::connect(&args.ws_endpoint).await?;
    println!("{} {}", "Connected to".green(), args.ws_endpoint.blue());

    let calls = plan_calls(&client, &config).await?;
    client.submit_as_sudo(&calls, &sudo).await?;

    println!("{}", "Tangle configured".green().bold());
    Ok(())
}

/// The sr25519 keypair of the sudo secret URI
fn sudo_keypair(suri: Option<&str>) -> Result<Keypair, ScriptError> {
    let suri = suri
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ScriptError::MissingEnv("SUDO_SURI".to_string()))?;
    let uri = SecretUri::from_str(suri)
        .map_err(|e| ScriptError::ClientInitialization(format!("invalid SUDO_SURI: {e}")))?;

    Keypair::from_uri(&uri)
        .map_err(|e| ScriptError::ClientInitialization(format!("invalid SUDO_SURI: {e}")))
}

/// The configuration requested by the arguments
fn tangle_config(args: &ConfigureTangleArgs, sudo: AccountId32) -> TangleConfig {
    TangleConfig {
        resource_ids: args.resource_ids.clone(),
        proposers: args.proposers.clone(),
        native_asset_symbol: args.native_asset_symbol.clone(),
        native_asset_decimals: args.native_asset_decimals,
        webb_asset: args.register_webb_asset.then(|| WebbAssetConfig {
            name: args.webb_asset_name.clone(),
            symbol: args.webb_asset_symbol.clone(),
            decimals: args.webb_asset_decimals,
        }),
        vanchor: args.create_vanchor.then(|| VAnchorConfig {
            max_edges: args.max_edges,
            depth: args.depth,
            asset_name: args.webb_asset_name.clone(),
        }),
        sudo,
    }
}
