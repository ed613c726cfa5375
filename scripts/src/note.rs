//! Notes (UTXOs) of the variable anchor and the witness of a transaction
//! spending and creating them
//!
//! All values live in the BN254 scalar field and are hashed with the circom
//! flavour of Poseidon, matching the vanchor circuits.

use alloy::{
    primitives::{keccak256, I256, U256},
    sol_types::SolValue,
};
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use light_poseidon::{Poseidon, PoseidonHasher};
use num_bigint::BigUint;
use rand::{thread_rng, RngCore};
use serde_json::{json, Value};

use crate::{errors::ScriptError, solidity::ExtData};

// -------------------
// | Field Utilities |
// -------------------

/// Hash the inputs with the circom-compatible Poseidon instance of their arity
pub fn poseidon(inputs: &[Fr]) -> Result<Fr, ScriptError> {
    let mut hasher = Poseidon::<Fr>::new_circom(inputs.len())
        .map_err(|e| ScriptError::Proving(e.to_string()))?;
    hasher
        .hash(inputs)
        .map_err(|e| ScriptError::Proving(e.to_string()))
}

/// Reduce an unsigned integer into the field
pub fn field_from_u256(value: U256) -> Fr {
    Fr::from_be_bytes_mod_order(&value.to_be_bytes::<32>())
}

/// Map a signed integer into the field, negative values wrapping around the
/// modulus
pub fn field_from_i256(value: I256) -> Fr {
    let magnitude = field_from_u256(value.unsigned_abs());
    if value.is_negative() {
        -magnitude
    } else {
        magnitude
    }
}

/// The canonical integer representation of a field element
pub fn field_to_u256(value: Fr) -> U256 {
    U256::from_be_slice(&value.into_bigint().to_bytes_be())
}

/// The decimal representation used for circuit inputs
pub fn field_to_decimal(value: Fr) -> String {
    BigUint::from(value.into_bigint()).to_string()
}

/// A uniformly random field element
pub fn random_field() -> Fr {
    let mut bytes = [0u8; 32];
    thread_rng().fill_bytes(&mut bytes);
    Fr::from_be_bytes_mod_order(&bytes)
}

// ---------
// | Notes |
// ---------

/// The keypair owning a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keypair {
    /// The private key
    pub private_key: Fr,
    /// `H(private_key)`
    pub public_key: Fr,
}

impl Keypair {
    /// Derive the keypair of a private key
    pub fn from_private_key(private_key: Fr) -> Result<Self, ScriptError> {
        Ok(Self {
            private_key,
            public_key: poseidon(&[private_key])?,
        })
    }

    /// A fresh random keypair
    pub fn random() -> Result<Self, ScriptError> {
        Self::from_private_key(random_field())
    }
}

/// An unspent note of the variable anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utxo {
    /// The typed chain id the note can be spent on
    pub chain_id: u64,
    /// The amount held by the note
    pub amount: U256,
    /// The blinding factor hiding the note contents
    pub blinding: Fr,
    /// The owner of the note
    pub keypair: Keypair,
    /// The leaf index of the note in the anchor's tree, once inserted
    pub index: u64,
}

impl Utxo {
    /// A note of `amount` on `chain_id`, with a random blinding
    pub fn new(chain_id: u64, amount: U256, keypair: Keypair) -> Self {
        Self {
            chain_id,
            amount,
            blinding: random_field(),
            keypair,
            index: 0,
        }
    }

    /// A zero-value note under a fresh keypair, padding a transaction's inputs
    /// or outputs
    pub fn zero(chain_id: u64) -> Result<Self, ScriptError> {
        Ok(Self::new(chain_id, U256::ZERO, Keypair::random()?))
    }

    /// `H(chainId, amount, pubkey, blinding)`
    pub fn commitment(&self) -> Result<Fr, ScriptError> {
        poseidon(&[
            Fr::from(self.chain_id),
            field_from_u256(self.amount),
            self.keypair.public_key,
            self.blinding,
        ])
    }

    /// `H(commitment, pathIndex, H(privkey, commitment, pathIndex))`
    pub fn nullifier(&self) -> Result<Fr, ScriptError> {
        let commitment = self.commitment()?;
        let path_index = Fr::from(self.index);
        let signature = poseidon(&[self.keypair.private_key, commitment, path_index])?;
        poseidon(&[commitment, path_index, signature])
    }
}

// ----------------
// | Transactions |
// ----------------

/// The net amount entering the anchor: `Σ outputs − Σ inputs`
pub fn ext_amount(inputs: &[Utxo], outputs: &[Utxo]) -> Result<I256, ScriptError> {
    let sum = |notes: &[Utxo]| -> Result<I256, ScriptError> {
        notes.iter().try_fold(I256::ZERO, |acc, note| {
            let amount = I256::try_from(note.amount)
                .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;
            acc.checked_add(amount).ok_or_else(|| {
                ScriptError::CalldataConstruction("note amounts overflow".to_string())
            })
        })
    };

    Ok(sum(outputs)? - sum(inputs)?)
}

/// `(extAmount − fee) mod p`
pub fn public_amount(ext_amount: I256, fee: U256) -> Fr {
    field_from_i256(ext_amount) - field_from_u256(fee)
}

/// `keccak256(abi.encode(extData)) mod p`
pub fn ext_data_hash(ext_data: &ExtData) -> Fr {
    let hash = keccak256(ext_data.abi_encode());
    Fr::from_be_bytes_mod_order(hash.as_slice())
}

/// The public values of a transaction, as checked on-chain
#[derive(Debug, Clone)]
pub struct PublicSignals {
    /// The anchor's own root followed by its neighbors' roots
    pub roots: Vec<U256>,
    /// The typed chain id of the anchor being transacted with
    pub chain_id: u64,
    /// `(extAmount − fee) mod p`
    pub public_amount: Fr,
    /// The hash of the external data
    pub ext_data_hash: Fr,
}

/// Assemble the vanchor circuit inputs for spending `inputs` into `outputs`.
///
/// Inputs are proven against empty Merkle paths of the given depth, so only
/// zero-value inputs verify.
pub fn vanchor_witness(
    public: &PublicSignals,
    inputs: &[Utxo],
    outputs: &[Utxo],
    levels: usize,
) -> Result<Value, ScriptError> {
    let decimals = |values: &[Fr]| values.iter().copied().map(field_to_decimal).collect::<Vec<_>>();
    let nullifiers = inputs.iter().map(Utxo::nullifier).collect::<Result<Vec<_>, _>>()?;
    let commitments = outputs.iter().map(Utxo::commitment).collect::<Result<Vec<_>, _>>()?;
    let zero_path = vec!["0".to_string(); levels];

    Ok(json!({
        "roots": public.roots.iter().map(U256::to_string).collect::<Vec<_>>(),
        "chainID": public.chain_id.to_string(),
        "inputNullifier": decimals(&nullifiers),
        "outputCommitment": decimals(&commitments),
        "publicAmount": field_to_decimal(public.public_amount),
        "extDataHash": field_to_decimal(public.ext_data_hash),

        "inAmount": inputs.iter().map(|u| u.amount.to_string()).collect::<Vec<_>>(),
        "inPrivateKey": inputs.iter().map(|u| field_to_decimal(u.keypair.private_key)).collect::<Vec<_>>(),
        "inBlinding": inputs.iter().map(|u| field_to_decimal(u.blinding)).collect::<Vec<_>>(),
        "inPathIndices": inputs.iter().map(|u| u.index.to_string()).collect::<Vec<_>>(),
        "inPathElements": inputs.iter().map(|_| zero_path.clone()).collect::<Vec<_>>(),

        "outChainID": outputs.iter().map(|u| u.chain_id.to_string()).collect::<Vec<_>>(),
        "outAmount": outputs.iter().map(|u| u.amount.to_string()).collect::<Vec<_>>(),
        "outPubkey": outputs.iter().map(|u| field_to_decimal(u.keypair.public_key)).collect::<Vec<_>>(),
        "outBlinding": outputs.iter().map(|u| field_to_decimal(u.blinding)).collect::<Vec<_>>(),
    }))
}
