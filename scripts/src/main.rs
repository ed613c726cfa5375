use clap::Parser;
use orbit_scripts::{cli::Cli, commands::ScriptContext, errors::ScriptError};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    dotenvy::dotenv().ok();
    let Cli {
        endpoints,
        wallets,
        paths,
        command,
    } = Cli::parse();

    tracing_subscriber::fmt().pretty().init();

    command
        .run(ScriptContext::new(endpoints, wallets, paths))
        .await
}
