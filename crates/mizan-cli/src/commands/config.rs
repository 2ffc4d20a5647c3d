//! Configuration commands

use mizan_compliance::ComplianceConfig;

use crate::{output::OutputFormat, ConfigCommands};

pub fn handle(action: ConfigCommands, config: &ComplianceConfig, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        ConfigCommands::Show => {
            // No tabular view; table falls back to YAML.
            let text = match format {
                OutputFormat::Json => serde_json::to_string_pretty(config)?,
                OutputFormat::Yaml | OutputFormat::Table => serde_yaml::to_string(config)?,
            };
            println!("{text}");
        }
        ConfigCommands::Defaults => {
            println!("{}", serde_json::to_string_pretty(&ComplianceConfig::default())?);
        }
    }
    Ok(())
}
