//! Groth16 proving of vanchor transactions through an external prover

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use alloy::primitives::{Bytes, U256};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    constants::DEFAULT_PROVER_PROGRAM, errors::ScriptError, utils::command_output_or,
};

/// The compiled circuit and proving key of a vanchor circuit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitFixture {
    /// The witness generator
    pub wasm: PathBuf,
    /// The Groth16 proving key
    pub zkey: PathBuf,
}

impl CircuitFixture {
    /// The fixture of the vanchor circuit with `inputs` inputs over `anchors`
    /// anchors, laid out as `vanchor_<inputs>/<anchors>/`
    pub fn vanchor(fixtures_dir: &Path, inputs: usize, anchors: usize) -> Self {
        let dir = fixtures_dir
            .join(format!("vanchor_{inputs}"))
            .join(anchors.to_string());

        Self {
            wasm: dir.join(format!("poseidon_vanchor_{inputs}_{anchors}.wasm")),
            zkey: dir.join("circuit_final.zkey"),
        }
    }
}

/// A Groth16 proof as emitted by snarkjs, with decimal coordinates
#[derive(Debug, Clone, Deserialize)]
pub struct Groth16Proof {
    /// The `A` point, in projective coordinates
    pub pi_a: Vec<String>,
    /// The `B` point, in projective coordinates over the quadratic extension
    pub pi_b: Vec<Vec<String>>,
    /// The `C` point, in projective coordinates
    pub pi_c: Vec<String>,
}

impl Groth16Proof {
    /// The proof as expected by the Solidity verifiers: `a ‖ b ‖ c`, with the
    /// coordinates of each component of `b` swapped
    pub fn to_solidity_bytes(&self) -> Result<Bytes, ScriptError> {
        let b0 = component(&self.pi_b, 0)?;
        let b1 = component(&self.pi_b, 1)?;
        let elements = [
            coordinate(&self.pi_a, 0)?,
            coordinate(&self.pi_a, 1)?,
            coordinate(b0, 1)?,
            coordinate(b0, 0)?,
            coordinate(b1, 1)?,
            coordinate(b1, 0)?,
            coordinate(&self.pi_c, 0)?,
            coordinate(&self.pi_c, 1)?,
        ];

        let mut bytes = Vec::with_capacity(elements.len() * 32);
        for element in elements {
            let value = U256::from_str_radix(element, 10)
                .map_err(|e| ScriptError::Proving(format!("{element}: {e}")))?;
            bytes.extend_from_slice(&value.to_be_bytes::<32>());
        }

        Ok(bytes.into())
    }
}

/// The `i`th coordinate of a point
fn coordinate(point: &[String], i: usize) -> Result<&str, ScriptError> {
    point
        .get(i)
        .map(String::as_str)
        .ok_or_else(|| ScriptError::Proving("truncated proof".to_string()))
}

/// The `i`th component of a point over the quadratic extension
fn component(point: &[Vec<String>], i: usize) -> Result<&[String], ScriptError> {
    point
        .get(i)
        .map(Vec::as_slice)
        .ok_or_else(|| ScriptError::Proving("truncated proof".to_string()))
}

/// Produces Groth16 proofs of circuit inputs
pub trait Prover {
    /// Prove the circuit on the given inputs
    fn prove(&self, circuit: &CircuitFixture, inputs: &Value) -> Result<Groth16Proof, ScriptError>;
}

/// A prover shelling out to a snarkjs-compatible program:
/// `<program> [args..] groth16 fullprove <input> <wasm> <zkey> <proof> <public>`
#[derive(Debug, Clone)]
pub struct CommandProver {
    /// The prover program
    program: String,
    /// Arguments placed before the `groth16` subcommand, e.g. `snarkjs` when
    /// running through `npx`
    leading_args: Vec<String>,
}

impl CommandProver {
    /// A prover running the given program
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// A prover from a whitespace-separated command line, e.g. `npx snarkjs`
    pub fn from_command_line(command_line: &str) -> Result<Self, ScriptError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| ScriptError::Proving("empty prover command".to_string()))?;

        Ok(Self {
            program,
            leading_args: parts.collect(),
        })
    }
}

impl Default for CommandProver {
    fn default() -> Self {
        Self::new(DEFAULT_PROVER_PROGRAM)
    }
}

impl Prover for CommandProver {
    fn prove(&self, circuit: &CircuitFixture, inputs: &Value) -> Result<Groth16Proof, ScriptError> {
        for path in [&circuit.wasm, &circuit.zkey] {
            if !path.exists() {
                return Err(ScriptError::Proving(format!(
                    "missing circuit fixture {}",
                    path.display()
                )));
            }
        }

        let workdir = tempfile::tempdir().map_err(|e| ScriptError::WriteFile(e.to_string()))?;
        let input_path = workdir.path().join("input.json");
        let proof_path = workdir.path().join("proof.json");
        let public_path = workdir.path().join("public.json");

        let input_json =
            serde_json::to_string(inputs).map_err(|e| ScriptError::Serde(e.to_string()))?;
        fs::write(&input_path, input_json).map_err(|e| ScriptError::WriteFile(e.to_string()))?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(["groth16", "fullprove"])
            .arg(&input_path)
            .arg(&circuit.wasm)
            .arg(&circuit.zkey)
            .arg(&proof_path)
            .arg(&public_path);

        debug!(program = self.program, wasm = %circuit.wasm.display(), "generating proof");
        command_output_or(cmd, "failed to generate proof")?;

        let proof_json =
            fs::read_to_string(&proof_path).map_err(|e| ScriptError::ReadFile(e.to_string()))?;
        serde_json::from_str(&proof_json).map_err(|e| ScriptError::Serde(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proof() -> Groth16Proof {
        serde_json::from_str(
            r#"{
                "pi_a": ["1", "2", "1"],
                "pi_b": [["3", "4"], ["5", "6"], ["1", "0"]],
                "pi_c": ["7", "8", "1"],
                "protocol": "groth16",
                "curve": "bn128"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_fixture_layout() {
        let fixture = CircuitFixture::vanchor(Path::new("fixtures"), 2, 8);
        assert_eq!(
            fixture.wasm,
            Path::new("fixtures/vanchor_2/8/poseidon_vanchor_2_8.wasm")
        );
        assert_eq!(fixture.zkey, Path::new("fixtures/vanchor_2/8/circuit_final.zkey"));
    }

    #[test]
    fn test_solidity_encoding() {
        let bytes = proof().to_solidity_bytes().unwrap();
        assert_eq!(bytes.len(), 256);

        let words: Vec<U256> = bytes
            .chunks(32)
            .map(U256::from_be_slice)
            .collect();
        let expected: Vec<U256> = [1u64, 2, 4, 3, 6, 5, 7, 8].map(U256::from).to_vec();
        assert_eq!(words, expected);
    }

    #[test]
    fn test_truncated_proof() {
        let mut proof = proof();
        proof.pi_b.truncate(1);
        assert!(matches!(
            proof.to_solidity_bytes(),
            Err(ScriptError::Proving(_))
        ));
    }

    #[test]
    fn test_prover_command_line() {
        let prover = CommandProver::from_command_line("npx  snarkjs").unwrap();
        assert_eq!(prover.program, "npx");
        assert_eq!(prover.leading_args, vec!["snarkjs".to_string()]);

        assert!(CommandProver::from_command_line("  ").is_err());
    }

    #[test]
    fn test_missing_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = CircuitFixture::vanchor(dir.path(), 2, 2);
        assert!(matches!(
            CommandProver::default().prove(&fixture, &Value::Null),
            Err(ScriptError::Proving(_))
        ));
    }

    #[test]
    fn test_command_prover_reads_proof() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = CircuitFixture::vanchor(dir.path(), 2, 2);
        fs::create_dir_all(fixture.wasm.parent().unwrap()).unwrap();
        fs::write(&fixture.wasm, b"").unwrap();
        fs::write(&fixture.zkey, b"").unwrap();

        // A fake prover copying a canned proof to the proof path, its 6th argument
        let canned = dir.path().join("canned.json");
        fs::write(
            &canned,
            r#"{ "pi_a": ["1", "2", "1"], "pi_b": [["3", "4"], ["5", "6"]], "pi_c": ["7", "8", "1"] }"#,
        )
        .unwrap();
        let script = dir.path().join("prover.sh");
        fs::write(&script, format!("#!/bin/sh\ncp {} \"$6\"\n", canned.display())).unwrap();

        let prover = CommandProver::from_command_line(&format!("sh {}", script.display())).unwrap();
        let proof = prover
            .prove(&fixture, &serde_json::json!({ "chainID": "1" }))
            .unwrap();
        assert_eq!(proof.pi_c[1], "8");
        assert_eq!(proof.to_solidity_bytes().unwrap().len(), 256);
    }
}
