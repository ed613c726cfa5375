//! Defines types and utilities for managing the inventory of integration tests

use std::{future::Future, pin::Pin};

use alloy::transports::http::reqwest::Url;
use eyre::{ensure, Result};
use orbit_scripts::{
    cli::DeployArgs,
    commands::{deploy_with_args, ScriptContext},
    types::Deployment,
    utils::read_deployment,
};
use tracing::info;

use crate::{cli::Cli, constants::CHAIN_NAMES};

/// The arguments provided to each integration test
#[derive(Clone)]
pub struct TestArgs {
    /// The context the scripts run in
    pub ctx: ScriptContext,
}

impl TestArgs {
    /// Build the test context, pointing at the local ports under CI and at
    /// the public testnet endpoints otherwise
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut ctx = ScriptContext::new(
            cli.endpoints.clone(),
            cli.wallets.clone(),
            cli.paths.clone(),
        );

        if cli.ci.is_none() {
            let urls = CHAIN_NAMES
                .iter()
                .map(|name| Url::parse(&format!("https://{name}-testnet.{}", cli.domain)))
                .collect::<Result<Vec<_>, _>>()?;
            ctx.remote_rpc_urls = Some(urls);
        }

        Ok(Self { ctx })
    }

    /// Run a full deployment, writing its outputs to a temporary directory,
    /// and check the deployments file it wrote
    pub async fn deploy(&self, args: DeployArgs) -> Result<Deployment> {
        let outputs = tempfile::tempdir()?;
        let mut ctx = self.ctx.clone();
        ctx.paths.deployments_path = outputs.path().join("deployments.json");
        ctx.paths.relayer_config_output = outputs.path().join("orbit.toml");

        let deployment = deploy_with_args(&args, &ctx).await?;
        let written = read_deployment(&ctx.paths.deployments_path)?;
        ensure!(written == deployment, "deployments file does not match the deployment");
        info!(
            bridge = %deployment.bridge_address,
            chains = deployment.chains.len(),
            "deployment verified"
        );

        Ok(deployment)
    }
}

/// The signature of an integration test
type TestFn = fn(TestArgs) -> Pin<Box<dyn Future<Output = Result<()>>>>;

/// A struct representing an integration test
pub struct IntegrationTest {
    /// The name of the test
    pub name: &'static str,
    /// The test function
    pub test_fn: TestFn,
}

// Collect the integration tests into an iterable
inventory::collect!(IntegrationTest);

/// Macro to register an integration test
#[macro_export]
macro_rules! integration_test {
    ($test_fn:ident) => {
        inventory::submit!($crate::test_inventory::IntegrationTest {
            name: stringify!($test_fn),
            test_fn: move |args| std::boxed::Box::pin($test_fn(args)),
        });
    };
}
