//! Smoke tests of the deployment scripts. These assume that the chains are
//! already running and that the vault is funded on each of them.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

use clap::Parser;
use cli::Cli;
use colored::Colorize;
use eyre::{eyre, Result};
use test_inventory::{IntegrationTest, TestArgs};

mod cli;
mod constants;
mod test_inventory;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    tracing_subscriber::fmt().pretty().init();

    let test_args = TestArgs::from_cli(&cli)?;
    let tests: Vec<&IntegrationTest> = inventory::iter::<IntegrationTest>
        .into_iter()
        .filter(|test| cli.test.as_deref().map_or(true, |name| test.name == name))
        .collect();
    if tests.is_empty() {
        return Err(eyre!("no test named {}", cli.test.unwrap_or_default()));
    }

    let mut failures = 0;
    for test in tests {
        println!("{} {}", "Running".bold(), test.name);
        match (test.test_fn)(test_args.clone()).await {
            Ok(()) => println!("{} {}", test.name, "PASSED".green().bold()),
            Err(e) => {
                println!("{} {}: {e:?}", test.name, "FAILED".red().bold());
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(eyre!("{failures} integration test(s) failed"));
    }
    Ok(())
}
