//! Definitions of errors that can occur during the execution of the deployment scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the deployment scripts
#[derive(Debug)]
pub enum ScriptError {
    /// A required environment variable is not set
    MissingEnv(String),
    /// An address (or governor public key) could not be parsed
    InvalidAddress(String),
    /// Error initializing an RPC client or a signer
    ClientInitialization(String),
    /// Error reading a file
    ReadFile(String),
    /// Error writing a file
    WriteFile(String),
    /// Error parsing or linking a compiled contract artifact
    ArtifactParsing(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// An on-chain value did not match what the script expected
    Verification(String),
    /// Error talking to the Substrate node
    Substrate(String),
    /// Error producing a zero-knowledge proof
    Proving(String),
    /// Error de/serializing data
    Serde(String),
    /// A resource id was not 32 bytes of hex
    InvalidResourceId(String),
    /// The chain type is not known, or not supported by the operation
    UnsupportedChainType(u16),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::MissingEnv(s) => write!(f, "{} not set", s),
            ScriptError::InvalidAddress(s) => write!(f, "invalid address: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::ReadFile(s) => write!(f, "error reading file: {}", s),
            ScriptError::WriteFile(s) => write!(f, "error writing file: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::Verification(s) => write!(f, "verification failed: {}", s),
            ScriptError::Substrate(s) => write!(f, "substrate error: {}", s),
            ScriptError::Proving(s) => write!(f, "error generating proof: {}", s),
            ScriptError::Serde(s) => write!(f, "error de/serializing: {}", s),
            ScriptError::InvalidResourceId(s) => write!(f, "invalid resource id: {}", s),
            ScriptError::UnsupportedChainType(t) => write!(f, "unsupported chain type: {:#06x}", t),
        }
    }
}

impl Error for ScriptError {}
