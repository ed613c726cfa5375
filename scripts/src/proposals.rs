//! Construction and signing of signature bridge governance proposals
//!
//! A proposal is a packed byte string headed by the resource id it targets,
//! the 4-byte selector of the function it invokes and a big-endian `u32`
//! nonce. The governor signs the Keccak hash of the packed data with a raw
//! ECDSA signature.

use alloy::{
    primitives::{keccak256, Address, Bytes, FixedBytes},
    signers::{local::PrivateKeySigner, SignerSync},
};

use crate::{
    chain_id::ResourceId,
    constants::{ADD_TOKEN_SIGNATURE, ADMIN_SET_RESOURCE_SIGNATURE},
    errors::ScriptError,
};

/// The 4-byte selector of the given function signature
pub fn function_signature(signature: &str) -> FixedBytes<4> {
    FixedBytes::from_slice(&keccak256(signature.as_bytes())[..4])
}

/// The signed data of an `adminSetResourceWithSignature` call:
/// `bridgeResourceId ‖ functionSig ‖ nonce ‖ newResourceId ‖ handler`
pub fn set_resource_proposal_data(
    bridge_resource_id: &ResourceId,
    nonce: u32,
    new_resource_id: &ResourceId,
    handler: Address,
) -> Vec<u8> {
    let mut data = Vec::with_capacity(32 + 4 + 4 + 32 + 20);
    data.extend_from_slice(bridge_resource_id.as_bytes());
    data.extend_from_slice(function_signature(ADMIN_SET_RESOURCE_SIGNATURE).as_slice());
    data.extend_from_slice(&nonce.to_be_bytes());
    data.extend_from_slice(new_resource_id.as_bytes());
    data.extend_from_slice(handler.as_slice());
    data
}

/// The data of a proposal executed through `executeProposalWithSignature`:
/// `resourceId ‖ functionSig ‖ nonce ‖ body`
pub fn execute_proposal_data(
    resource_id: &ResourceId,
    function: &str,
    nonce: u32,
    body: &[u8],
) -> Vec<u8> {
    let mut data = Vec::with_capacity(32 + 4 + 4 + body.len());
    data.extend_from_slice(resource_id.as_bytes());
    data.extend_from_slice(function_signature(function).as_slice());
    data.extend_from_slice(&nonce.to_be_bytes());
    data.extend_from_slice(body);
    data
}

/// A proposal adding `token` to the token wrapper identified by
/// `token_resource_id`
pub fn add_token_proposal_data(
    token_resource_id: &ResourceId,
    nonce: u32,
    token: Address,
) -> Vec<u8> {
    execute_proposal_data(token_resource_id, ADD_TOKEN_SIGNATURE, nonce, token.as_slice())
}

/// Sign the Keccak hash of the proposal data, returning the 65-byte
/// `r ‖ s ‖ v` signature with `v ∈ {27, 28}`
pub fn sign_proposal(signer: &PrivateKeySigner, data: &[u8]) -> Result<Bytes, ScriptError> {
    let signature = signer
        .sign_hash_sync(&keccak256(data))
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;
    Ok(Bytes::from(signature.as_bytes().to_vec()))
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Signature;

    use crate::chain_id::TypedChainId;

    use super::*;

    #[test]
    fn test_function_signature() {
        // The well-known selector of `transfer(address,uint256)`
        assert_eq!(
            function_signature("transfer(address,uint256)"),
            FixedBytes::from([0xa9, 0x05, 0x9c, 0xbb])
        );
    }

    #[test]
    fn test_set_resource_layout() {
        let typed = TypedChainId::evm(5001);
        let bridge = ResourceId::from_evm_address(Address::repeat_byte(1), typed);
        let token = ResourceId::from_evm_address(Address::repeat_byte(2), typed);
        let handler = Address::repeat_byte(3);

        let data = set_resource_proposal_data(&bridge, 7, &token, handler);
        assert_eq!(data.len(), 92);
        assert_eq!(&data[..32], bridge.as_bytes());
        assert_eq!(
            &data[32..36],
            function_signature(ADMIN_SET_RESOURCE_SIGNATURE).as_slice()
        );
        assert_eq!(&data[36..40], &[0, 0, 0, 7]);
        assert_eq!(&data[40..72], token.as_bytes());
        assert_eq!(&data[72..], handler.as_slice());
    }

    #[test]
    fn test_add_token_layout() {
        let resource = ResourceId::from_evm_address(Address::repeat_byte(2), TypedChainId::evm(1));
        let token = Address::repeat_byte(9);

        let data = add_token_proposal_data(&resource, 1, token);
        assert_eq!(data.len(), 60);
        assert_eq!(&data[32..36], function_signature(ADD_TOKEN_SIGNATURE).as_slice());
        assert_eq!(&data[36..40], &[0, 0, 0, 1]);
        assert_eq!(&data[40..], token.as_slice());
    }

    #[test]
    fn test_signature_recovers_governor() {
        let governor = PrivateKeySigner::random();
        let data = b"proposal".to_vec();

        let sig = sign_proposal(&governor, &data).unwrap();
        assert_eq!(sig.len(), 65);
        assert!(sig[64] == 27 || sig[64] == 28);

        let recovered = Signature::from_raw(&sig)
            .unwrap()
            .recover_address_from_prehash(&keccak256(&data))
            .unwrap();
        assert_eq!(recovered, governor.address());
    }
}
