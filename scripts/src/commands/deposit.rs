//! A single deposit into a VAnchor, exercising the prover and the anchor end
//! to end

use alloy::{
    primitives::{utils::parse_ether, Address, Bytes, TxHash, U256},
    signers::local::PrivateKeySigner,
};
use colored::Colorize;
use rand::{thread_rng, RngCore};
use tracing::info;

use crate::{
    cli::DepositArgs,
    commands::ScriptContext,
    constants::{
        CIRCUIT_OUTPUTS, DEPOSIT_ACCOUNT_FUNDING, ENCRYPTED_OUTPUT_LEN, SMALL_CIRCUIT_INPUTS,
        VANCHOR_TREE_LEVELS,
    },
    errors::ScriptError,
    note::{
        ext_amount, ext_data_hash, field_to_u256, public_amount, vanchor_witness, Keypair,
        PublicSignals, Utxo,
    },
    prover::{CircuitFixture, CommandProver, Prover},
    solidity::{CommonExtData, Encryptions, ExtData, IVAnchor, PublicInputs},
    utils::{send_funds, send_tx, setup_client},
};

/// Deposit `amount` of the native token from the first chain into a note on
/// the second, returning the transaction hash
pub async fn deposit(args: &DepositArgs, ctx: &ScriptContext) -> Result<TxHash, ScriptError> {
    let prover = CommandProver::from_command_line(&args.prover)?;
    let amount = parse_ether(&args.amount).map_err(|e| ScriptError::Serde(e.to_string()))?;
    let origin = ctx.endpoints.athena_typed_chain_id()?.calculate();
    let target = ctx.endpoints.hermes_typed_chain_id()?.calculate();

    let rpc_urls = ctx.rpc_urls()?;
    let rpc_url = rpc_urls
        .first()
        .ok_or_else(|| ScriptError::MissingEnv("ATHENA_CHAIN_PORT".to_string()))?;

    // A fresh account funded by the vault sends the deposit
    let vault = setup_client(rpc_url, &ctx.wallets.vault_signer()?).await?;
    let account = PrivateKeySigner::random();
    let funding =
        parse_ether(DEPOSIT_ACCOUNT_FUNDING).map_err(|e| ScriptError::Serde(e.to_string()))?;
    send_funds(&vault, account.address(), funding).await?;
    let client = setup_client(rpc_url, &account).await?;

    let anchor = IVAnchor::new(args.contract_address, client.provider.clone());
    let call_err = |e: alloy::contract::Error| ScriptError::ContractInteraction(e.to_string());
    let max_edges = anchor.maxEdges().call().await.map_err(call_err)?;
    let mut roots = vec![anchor.getLastRoot().call().await.map_err(call_err)?];
    roots.extend(anchor.getLatestNeighborRoots().call().await.map_err(call_err)?);

    let inputs = [Utxo::zero(origin)?, Utxo::zero(origin)?];
    let outputs = [Utxo::new(target, amount, Keypair::random()?), Utxo::zero(origin)?];
    let ext_data = ExtData {
        recipient: Address::ZERO,
        extAmount: ext_amount(&inputs, &outputs)?,
        relayer: Address::ZERO,
        fee: U256::ZERO,
        refund: U256::ZERO,
        token: Address::ZERO,
        encryptedOutput1: random_encryption(),
        encryptedOutput2: random_encryption(),
    };
    let public = PublicSignals {
        roots,
        chain_id: origin,
        public_amount: public_amount(ext_data.extAmount, ext_data.fee),
        ext_data_hash: ext_data_hash(&ext_data),
    };

    let circuit = CircuitFixture::vanchor(
        &ctx.paths.fixtures_dir,
        SMALL_CIRCUIT_INPUTS,
        usize::from(max_edges) + 1,
    );
    let witness = vanchor_witness(&public, &inputs, &outputs, VANCHOR_TREE_LEVELS as usize)?;
    println!("{}", "Generating the deposit proof".bold());
    let proof = prover.prove(&circuit, &witness)?.to_solidity_bytes()?;

    let public_inputs = public_inputs(&public, &inputs, &outputs)?;
    let common = CommonExtData {
        recipient: ext_data.recipient,
        extAmount: ext_data.extAmount,
        relayer: ext_data.relayer,
        fee: ext_data.fee,
        refund: ext_data.refund,
        token: ext_data.token,
    };
    let encryptions = Encryptions {
        encryptedOutput1: ext_data.encryptedOutput1,
        encryptedOutput2: ext_data.encryptedOutput2,
    };

    let receipt = send_tx(
        anchor
            .transact(proof, Bytes::new(), common, public_inputs, encryptions)
            .value(amount),
    )
    .await?;

    info!(origin, target, %amount, "deposited into the anchor");
    println!(
        "{} {}",
        "Deposit sent:".green().bold(),
        receipt.transaction_hash.to_string().blue()
    );
    Ok(receipt.transaction_hash)
}

/// The public inputs checked by the anchor, with the roots packed as
/// consecutive 32-byte words
fn public_inputs(
    public: &PublicSignals,
    inputs: &[Utxo],
    outputs: &[Utxo; CIRCUIT_OUTPUTS],
) -> Result<PublicInputs, ScriptError> {
    let roots: Vec<u8> = public
        .roots
        .iter()
        .flat_map(|root| root.to_be_bytes::<32>())
        .collect();
    let input_nullifiers = inputs
        .iter()
        .map(|input| input.nullifier().map(field_to_u256))
        .collect::<Result<Vec<_>, _>>()?;
    let [first, second] = outputs;

    Ok(PublicInputs {
        roots: roots.into(),
        extensionRoots: Bytes::new(),
        inputNullifiers: input_nullifiers,
        outputCommitments: [
            field_to_u256(first.commitment()?),
            field_to_u256(second.commitment()?),
        ],
        publicAmount: field_to_u256(public.public_amount),
        extDataHash: field_to_u256(public.ext_data_hash),
    })
}

/// An opaque random payload in place of an encrypted output
fn random_encryption() -> Bytes {
    let mut bytes = vec![0u8; ENCRYPTED_OUTPUT_LEN];
    thread_rng().fill_bytes(&mut bytes);
    bytes.into()
}

#[cfg(test)]
mod tests {
    use ark_bn254::Fr;

    use super::*;

    #[test]
    fn test_public_inputs_layout() {
        let inputs = [Utxo::zero(1).unwrap(), Utxo::zero(1).unwrap()];
        let outputs = [
            Utxo::new(2, U256::from(5u64), Keypair::random().unwrap()),
            Utxo::zero(1).unwrap(),
        ];
        let public = PublicSignals {
            roots: vec![U256::from(1u64), U256::from(2u64)],
            chain_id: 1,
            public_amount: Fr::from(5u64),
            ext_data_hash: Fr::from(9u64),
        };

        let public_inputs = public_inputs(&public, &inputs, &outputs).unwrap();
        assert_eq!(public_inputs.roots.len(), 64);
        assert_eq!(public_inputs.roots[31], 1);
        assert_eq!(public_inputs.roots[63], 2);
        assert!(public_inputs.extensionRoots.is_empty());
        assert_eq!(public_inputs.inputNullifiers.len(), 2);
        assert_eq!(
            public_inputs.outputCommitments[0],
            field_to_u256(outputs[0].commitment().unwrap())
        );
        assert_eq!(public_inputs.publicAmount, U256::from(5u64));
        assert_eq!(public_inputs.extDataHash, U256::from(9u64));
    }

    #[test]
    fn test_random_encryption() {
        let a = random_encryption();
        assert_eq!(a.len(), ENCRYPTED_OUTPUT_LEN);
        assert_ne!(a, random_encryption());
    }
}
