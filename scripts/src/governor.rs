//! Resolution of the signature bridge governor
//!
//! A governor may be given as an Ethereum address, or as the public key of
//! the DKG in compressed (33 bytes) or uncompressed (64 bytes, no `0x04` tag)
//! form. Public keys are turned into the address the key controls.

use std::str::FromStr;

use alloy::primitives::{keccak256, Address};
use k256::{elliptic_curve::sec1::ToEncodedPoint, PublicKey};
use tracing::warn;

use crate::{
    constants::{NUM_BYTES_COMPRESSED_PUBKEY, NUM_BYTES_UNCOMPRESSED_PUBKEY},
    errors::ScriptError,
};

/// The ways a governor can be specified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovernorIdentity {
    /// An Ethereum address
    Address(Address),
    /// A SEC1 compressed secp256k1 public key
    CompressedKey([u8; NUM_BYTES_COMPRESSED_PUBKEY]),
    /// An uncompressed secp256k1 public key without the `0x04` tag
    UncompressedKey([u8; NUM_BYTES_UNCOMPRESSED_PUBKEY]),
}

impl GovernorIdentity {
    /// The Ethereum address controlled by this identity
    pub fn address(&self) -> Result<Address, ScriptError> {
        match self {
            GovernorIdentity::Address(address) => Ok(*address),
            GovernorIdentity::CompressedKey(key) => {
                let uncompressed = uncompress_public_key(key)?;
                Ok(address_from_uncompressed_public_key(&uncompressed))
            }
            GovernorIdentity::UncompressedKey(key) => Ok(address_from_uncompressed_public_key(key)),
        }
    }
}

impl FromStr for GovernorIdentity {
    type Err = ScriptError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Ok(address) = Address::from_str(value) {
            return Ok(GovernorIdentity::Address(address));
        }

        let invalid = || ScriptError::InvalidAddress(format!("unknown governor format: {value}"));
        let hex_str = value.strip_prefix("0x").ok_or_else(invalid)?;
        let bytes = hex::decode(hex_str).map_err(|_| invalid())?;

        match bytes.len() {
            NUM_BYTES_COMPRESSED_PUBKEY => Ok(GovernorIdentity::CompressedKey(
                bytes.try_into().map_err(|_| invalid())?,
            )),
            NUM_BYTES_UNCOMPRESSED_PUBKEY => Ok(GovernorIdentity::UncompressedKey(
                bytes.try_into().map_err(|_| invalid())?,
            )),
            _ => Err(invalid()),
        }
    }
}

/// Parse a governor, failing if it is neither an address nor a valid public key
pub fn parse_governor(value: &str) -> Result<Address, ScriptError> {
    GovernorIdentity::from_str(value)?.address()
}

/// Computes the governor address from the given value, or returns the default
/// governor address if the value is missing or cannot be interpreted
pub fn extract_governor_address_or_default(
    value: Option<&str>,
    default: impl FnOnce() -> Address,
) -> Address {
    match value.map(parse_governor) {
        Some(Ok(address)) => address,
        _ => {
            warn!(
                governor = value.unwrap_or_default(),
                "invalid/unknown governor address provided, using default governor address"
            );
            default()
        }
    }
}

/// Decompress a SEC1 compressed public key, returning the 64 coordinate bytes
fn uncompress_public_key(
    compressed: &[u8; NUM_BYTES_COMPRESSED_PUBKEY],
) -> Result<[u8; NUM_BYTES_UNCOMPRESSED_PUBKEY], ScriptError> {
    let key = PublicKey::from_sec1_bytes(compressed)
        .map_err(|e| ScriptError::InvalidAddress(format!("invalid compressed key: {e}")))?;
    let point = key.to_encoded_point(false /* compress */);

    // Drop the `0x04` tag
    let mut uncompressed = [0u8; NUM_BYTES_UNCOMPRESSED_PUBKEY];
    uncompressed.copy_from_slice(&point.as_bytes()[1..]);
    Ok(uncompressed)
}

/// The address is the last 20 bytes of the Keccak hash of the public key
fn address_from_uncompressed_public_key(key: &[u8; NUM_BYTES_UNCOMPRESSED_PUBKEY]) -> Address {
    let hash = keccak256(key);
    Address::from_slice(&hash[12..])
}

#[cfg(test)]
mod tests {
    use alloy::signers::local::PrivateKeySigner;

    use super::*;

    /// A random signer along with its compressed and uncompressed public keys
    fn signer_with_keys() -> (PrivateKeySigner, String, String) {
        let signer = PrivateKeySigner::random();
        let verifying_key = signer.credential().verifying_key();
        let compressed = verifying_key.to_encoded_point(true);
        let uncompressed = verifying_key.to_encoded_point(false);

        (
            signer,
            format!("0x{}", hex::encode(compressed.as_bytes())),
            format!("0x{}", hex::encode(&uncompressed.as_bytes()[1..])),
        )
    }

    #[test]
    fn test_address_is_returned_as_is() {
        let address = Address::repeat_byte(0x42);
        let resolved =
            extract_governor_address_or_default(Some(&address.to_string()), || Address::ZERO);
        assert_eq!(resolved, address);
    }

    #[test]
    fn test_compressed_key() {
        let (signer, compressed, _) = signer_with_keys();
        assert_eq!(compressed.len(), 2 + 2 * NUM_BYTES_COMPRESSED_PUBKEY);

        let resolved = extract_governor_address_or_default(Some(&compressed), || Address::ZERO);
        assert_eq!(resolved, signer.address());
    }

    #[test]
    fn test_uncompressed_key() {
        let (signer, _, uncompressed) = signer_with_keys();
        assert_eq!(uncompressed.len(), 2 + 2 * NUM_BYTES_UNCOMPRESSED_PUBKEY);

        let resolved = parse_governor(&uncompressed).unwrap();
        assert_eq!(resolved, signer.address());
    }

    #[test]
    fn test_known_dkg_key() {
        // Both encodings of the same key must resolve to the same address
        let compressed = "0x0277c66266b89414906b425c1d1089a448f506299444de64ea86c385ac2b78ff6e";
        let GovernorIdentity::CompressedKey(key) = GovernorIdentity::from_str(compressed).unwrap()
        else {
            panic!("expected a compressed key");
        };
        let uncompressed = uncompress_public_key(&key).unwrap();
        let uncompressed_hex = format!("0x{}", hex::encode(uncompressed));

        assert_eq!(
            parse_governor(compressed).unwrap(),
            parse_governor(&uncompressed_hex).unwrap()
        );
    }

    #[test]
    fn test_invalid_value_falls_back_to_default() {
        let default = Address::repeat_byte(0x01);
        assert_eq!(
            extract_governor_address_or_default(Some("0x1234"), || default),
            default
        );
        assert_eq!(
            extract_governor_address_or_default(Some("not a governor"), || default),
            default
        );
        assert_eq!(extract_governor_address_or_default(None, || default), default);
    }

    #[test]
    fn test_key_off_curve_is_rejected() {
        // A compressed key whose x coordinate is not on the curve
        let bad_key = format!("0x02{}", "ff".repeat(32));
        assert!(parse_governor(&bad_key).is_err());
    }
}
