//! Scripts for deploying, configuring and smoke-testing the Orbit bridge.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod bridge;
pub mod chain_id;
pub mod cli;
pub mod commands;
pub mod constants;
pub mod env;
pub mod errors;
pub mod governor;
pub mod note;
pub mod proposals;
pub mod prover;
pub mod relayer_config;
#[allow(missing_docs, clippy::missing_docs_in_private_items)]
pub mod solidity;
pub mod tangle;
pub mod types;
pub mod utils;
pub mod weth;
