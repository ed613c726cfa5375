//! Rendering of the relayer configuration from its template

use std::{fs, path::Path};

use alloy::primitives::Address;

use crate::errors::ScriptError;

/// The values substituted into the relayer configuration template
#[derive(Debug, Clone)]
pub struct RelayerConfigSubstitutions {
    /// The chain id of the Athena chain
    pub athena_chain_id: u32,
    /// The chain id of the Hermes chain
    pub hermes_chain_id: u32,
    /// The chain id of the Demeter chain
    pub demeter_chain_id: u32,
    /// The chain id of the Tangle EVM chain, if configured
    pub tangle_chain_id: Option<u32>,
    /// The signature bridge address
    pub bridge_address: Address,
    /// The VAnchor address
    pub vanchor_address: Address,
}

impl RelayerConfigSubstitutions {
    /// The placeholders and their replacements
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("ATHENA_CHAIN_ID", self.athena_chain_id.to_string()),
            ("HERMES_CHAIN_ID", self.hermes_chain_id.to_string()),
            ("DEMETER_CHAIN_ID", self.demeter_chain_id.to_string()),
            ("BRIDGE_ADDRESS", self.bridge_address.to_string()),
            ("VANCHOR_ADDRESS", self.vanchor_address.to_string()),
        ];
        if let Some(tangle_chain_id) = self.tangle_chain_id {
            pairs.push(("TANGLE_CHAIN_ID", tangle_chain_id.to_string()));
        }

        pairs
    }
}

/// Replace every occurrence of every placeholder in the template
pub fn render_relayer_config(template: &str, substitutions: &RelayerConfigSubstitutions) -> String {
    substitutions
        .pairs()
        .into_iter()
        .fold(template.to_string(), |config, (placeholder, value)| {
            config.replace(placeholder, &value)
        })
}

/// Render the template at `template_path` into `output_path`
pub fn write_relayer_config(
    template_path: &Path,
    output_path: &Path,
    substitutions: &RelayerConfigSubstitutions,
) -> Result<(), ScriptError> {
    let template = fs::read_to_string(template_path)
        .map_err(|e| ScriptError::ReadFile(format!("{}: {e}", template_path.display())))?;
    let config = render_relayer_config(&template, substitutions);

    fs::write(output_path, config)
        .map_err(|e| ScriptError::WriteFile(format!("{}: {e}", output_path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn substitutions() -> RelayerConfigSubstitutions {
        RelayerConfigSubstitutions {
            athena_chain_id: 5001,
            hermes_chain_id: 5002,
            demeter_chain_id: 5003,
            tangle_chain_id: None,
            bridge_address: Address::repeat_byte(0x11),
            vanchor_address: Address::repeat_byte(0x22),
        }
    }

    #[test]
    fn test_render_replaces_every_occurrence() {
        let template = "[evm.athena]\nchain-id = ATHENA_CHAIN_ID\n\
                        [[evm.athena.contracts]]\naddress = \"VANCHOR_ADDRESS\"\n\
                        linked-anchors = [{ chain-id = HERMES_CHAIN_ID, address = \"VANCHOR_ADDRESS\" }]\n\
                        bridge = \"BRIDGE_ADDRESS\"\ndemeter = DEMETER_CHAIN_ID\n";

        let config = render_relayer_config(template, &substitutions());
        let vanchor = Address::repeat_byte(0x22).to_string();
        assert_eq!(config.matches(&vanchor).count(), 2);
        assert!(config.contains("chain-id = 5001"));
        assert!(config.contains("chain-id = 5002"));
        assert!(config.contains("demeter = 5003"));
        assert!(config.contains(&Address::repeat_byte(0x11).to_string()));
        assert!(!config.contains("_ADDRESS"));
    }

    #[test]
    fn test_tangle_chain_id_only_when_set() {
        let template = "tangle = TANGLE_CHAIN_ID";
        assert_eq!(render_relayer_config(template, &substitutions()), template);

        let mut substitutions = substitutions();
        substitutions.tangle_chain_id = Some(5006);
        assert_eq!(render_relayer_config(template, &substitutions), "tangle = 5006");
    }

    #[test]
    fn test_write_relayer_config() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("orbit.toml.tmpl");
        let output_path = dir.path().join("orbit.toml");
        fs::write(&template_path, "id = ATHENA_CHAIN_ID").unwrap();

        write_relayer_config(&template_path, &output_path, &substitutions()).unwrap();
        assert_eq!(fs::read_to_string(output_path).unwrap(), "id = 5001");

        let missing = dir.path().join("missing.tmpl");
        assert!(matches!(
            write_relayer_config(&missing, &dir.path().join("out.toml"), &substitutions()),
            Err(ScriptError::ReadFile(_))
        ));
    }
}
