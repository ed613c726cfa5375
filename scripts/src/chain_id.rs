//! Typed chain identifiers and bridge resource ids
//!
//! A typed chain id packs a 2-byte chain type and a 4-byte chain id into a
//! single 48-bit value. Resource ids identify a bridged contract on a typed
//! chain and are laid out as a 26-byte target system followed by the 6-byte
//! typed chain id.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use alloy::primitives::{Address, FixedBytes};

use crate::{constants::NUM_BYTES_ADDRESS, errors::ScriptError};

/// The number of bytes in an encoded typed chain id
pub const TYPED_CHAIN_ID_LEN: usize = 6;
/// The number of bytes in a resource id
pub const RESOURCE_ID_LEN: usize = 32;
/// The number of bytes in the target system part of a resource id
pub const TARGET_SYSTEM_LEN: usize = RESOURCE_ID_LEN - TYPED_CHAIN_ID_LEN;

/// The kind of chain a typed chain id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum ChainType {
    /// An EVM chain
    Evm = 0x0100,
    /// A Substrate chain
    Substrate = 0x0200,
    /// A Substrate development chain
    SubstrateDevelopment = 0x0250,
    /// The Polkadot relay chain
    PolkadotRelayChain = 0x0301,
    /// The Kusama relay chain
    KusamaRelayChain = 0x0302,
    /// The Rococo relay chain
    RococoRelayChain = 0x0303,
    /// A Cosmos chain
    Cosmos = 0x0400,
    /// A Solana chain
    Solana = 0x0500,
    /// An Ink! chain
    Ink = 0x0600,
}

impl TryFrom<u16> for ChainType {
    type Error = ScriptError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Ok(match value {
            0x0100 => ChainType::Evm,
            0x0200 => ChainType::Substrate,
            0x0250 => ChainType::SubstrateDevelopment,
            0x0301 => ChainType::PolkadotRelayChain,
            0x0302 => ChainType::KusamaRelayChain,
            0x0303 => ChainType::RococoRelayChain,
            0x0400 => ChainType::Cosmos,
            0x0500 => ChainType::Solana,
            0x0600 => ChainType::Ink,
            other => return Err(ScriptError::UnsupportedChainType(other)),
        })
    }
}

/// A chain id qualified by the type of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypedChainId {
    /// The type of the chain
    pub chain_type: ChainType,
    /// The chain id within its type
    pub chain_id: u32,
}

impl TypedChainId {
    /// A typed chain id for an EVM chain
    pub fn evm(chain_id: u32) -> Self {
        Self {
            chain_type: ChainType::Evm,
            chain_id,
        }
    }

    /// Pack the chain type and chain id into a single integer
    pub fn calculate(&self) -> u64 {
        ((self.chain_type as u64) << 32) | self.chain_id as u64
    }

    /// Unpack an integer produced by [`TypedChainId::calculate`]
    pub fn parse(typed_chain_id: u64) -> Result<Self, ScriptError> {
        let chain_type = ChainType::try_from((typed_chain_id >> 32) as u16)?;
        Ok(Self {
            chain_type,
            chain_id: typed_chain_id as u32,
        })
    }

    /// The big-endian `chain_type ‖ chain_id` encoding
    pub fn to_bytes(&self) -> [u8; TYPED_CHAIN_ID_LEN] {
        let mut bytes = [0u8; TYPED_CHAIN_ID_LEN];
        bytes[..2].copy_from_slice(&(self.chain_type as u16).to_be_bytes());
        bytes[2..].copy_from_slice(&self.chain_id.to_be_bytes());
        bytes
    }

    /// Decode the big-endian `chain_type ‖ chain_id` encoding
    pub fn from_bytes(bytes: [u8; TYPED_CHAIN_ID_LEN]) -> Result<Self, ScriptError> {
        let chain_type = ChainType::try_from(u16::from_be_bytes([bytes[0], bytes[1]]))?;
        let chain_id = u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
        Ok(Self {
            chain_type,
            chain_id,
        })
    }
}

impl Display for TypedChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.calculate())
    }
}

/// A 32-byte identifier of a bridged contract on a typed chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId([u8; RESOURCE_ID_LEN]);

impl ResourceId {
    /// Build a resource id from a target system and a typed chain id
    pub fn new(target_system: [u8; TARGET_SYSTEM_LEN], typed_chain_id: TypedChainId) -> Self {
        let mut bytes = [0u8; RESOURCE_ID_LEN];
        bytes[..TARGET_SYSTEM_LEN].copy_from_slice(&target_system);
        bytes[TARGET_SYSTEM_LEN..].copy_from_slice(&typed_chain_id.to_bytes());
        Self(bytes)
    }

    /// The resource id of an EVM contract: the address is right-aligned in the
    /// target system
    pub fn from_evm_address(address: Address, typed_chain_id: TypedChainId) -> Self {
        let mut target_system = [0u8; TARGET_SYSTEM_LEN];
        target_system[TARGET_SYSTEM_LEN - NUM_BYTES_ADDRESS..]
            .copy_from_slice(address.as_slice());
        Self::new(target_system, typed_chain_id)
    }

    /// Parse a resource id from its raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScriptError> {
        let bytes: [u8; RESOURCE_ID_LEN] = bytes.try_into().map_err(|_| {
            ScriptError::InvalidResourceId(format!(
                "expected {RESOURCE_ID_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        // Reject unknown chain types up front
        let id = Self(bytes);
        id.typed_chain_id()?;
        Ok(id)
    }

    /// The target system part of the resource id
    pub fn target_system(&self) -> [u8; TARGET_SYSTEM_LEN] {
        let mut target = [0u8; TARGET_SYSTEM_LEN];
        target.copy_from_slice(&self.0[..TARGET_SYSTEM_LEN]);
        target
    }

    /// The typed chain id part of the resource id
    pub fn typed_chain_id(&self) -> Result<TypedChainId, ScriptError> {
        let mut bytes = [0u8; TYPED_CHAIN_ID_LEN];
        bytes.copy_from_slice(&self.0[TARGET_SYSTEM_LEN..]);
        TypedChainId::from_bytes(bytes)
    }

    /// The raw bytes of the resource id
    pub fn as_bytes(&self) -> &[u8; RESOURCE_ID_LEN] {
        &self.0
    }

    /// The resource id as a `bytes32`
    pub fn to_fixed_bytes(&self) -> FixedBytes<RESOURCE_ID_LEN> {
        FixedBytes::from(self.0)
    }
}

impl FromStr for ResourceId {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| ScriptError::InvalidResourceId(format!("{s}: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_typed_chain_id() {
        let typed = TypedChainId::evm(5001);
        assert_eq!(typed.calculate(), 0x0100_0000_1389);
        assert_eq!(TypedChainId::parse(typed.calculate()).unwrap(), typed);
    }

    #[test]
    fn test_parse_unknown_chain_type() {
        let raw = (0x0700u64 << 32) | 1;
        assert!(matches!(
            TypedChainId::parse(raw),
            Err(ScriptError::UnsupportedChainType(0x0700))
        ));
    }

    #[test]
    fn test_evm_resource_id_layout() {
        let address = Address::repeat_byte(0xab);
        let typed = TypedChainId::evm(1);
        let resource_id = ResourceId::from_evm_address(address, typed);

        let bytes = resource_id.as_bytes();
        assert_eq!(&bytes[..6], &[0u8; 6]);
        assert_eq!(&bytes[6..26], address.as_slice());
        assert_eq!(&bytes[26..], &[0x01, 0x00, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(resource_id.typed_chain_id().unwrap(), typed);
    }

    #[test]
    fn test_resource_id_from_hex() {
        let hex_id = "0x000000000000d30c8839c1145609e564b986f667b273ddcb8496010000001389";
        let resource_id = ResourceId::from_str(hex_id).unwrap();
        assert_eq!(resource_id.to_string(), hex_id);
        assert_eq!(
            resource_id.typed_chain_id().unwrap(),
            TypedChainId::evm(5001)
        );
    }

    #[test]
    fn test_substrate_resource_id() {
        let typed = TypedChainId {
            chain_type: ChainType::Substrate,
            chain_id: 1081,
        };
        let resource_id = ResourceId::new([7u8; TARGET_SYSTEM_LEN], typed);
        let parsed = ResourceId::from_str(&resource_id.to_string()).unwrap();
        assert_eq!(parsed.typed_chain_id().unwrap(), typed);
        assert_eq!(parsed.target_system(), [7u8; TARGET_SYSTEM_LEN]);
    }

    #[test]
    fn test_resource_id_wrong_length() {
        assert!(matches!(
            ResourceId::from_str("0x0102"),
            Err(ScriptError::InvalidResourceId(_))
        ));
    }
}
