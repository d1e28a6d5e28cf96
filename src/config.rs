//! Configuration for av-deck
//!
//! Loads the YAML layout file: MIDI port selection plus the control
//! spec table the deck is built from. Specs are validated by serde at
//! load time; the control model itself never parses serialized specs.

use crate::spec::ControlSpec;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::fs;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub midi: MidiConfig,
    pub controls: HashMap<String, ControlSpec>,
}

/// MIDI port configuration
///
/// An empty input port pattern means "run without hardware" (signals
/// can still be injected through the REPL or the bus).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MidiConfig {
    #[serde(default)]
    pub input_port: String,
}

impl AppConfig {
    /// Load configuration from file
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layout() {
        let yaml = r#"
midi:
  input_port: "nanoKONTROL"
controls:
  vol:
    type: fader
    name: volume
    x: 0
    y: 0
    min: 0.0
    max: 100.0
  kick:
    type: pad
    name: kick
    x: 1
    y: 0
  presets:
    type: preset-button
    name: presets
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.midi.input_port, "nanoKONTROL");
        assert_eq!(config.controls.len(), 3);
        assert!(matches!(config.controls["vol"], ControlSpec::Fader(_)));
        assert!(matches!(
            config.controls["presets"],
            ControlSpec::PresetButton(_)
        ));
    }

    #[tokio::test]
    async fn test_load_save_round_trip() {
        let yaml = r#"
midi:
  input_port: "MPK mini"
controls:
  vol:
    type: fader
    name: volume
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.yaml");
        let path = path.to_str().unwrap();

        config.save(path).await.unwrap();
        let reloaded = AppConfig::load(path).await.unwrap();
        assert_eq!(reloaded.midi.input_port, "MPK mini");
        assert_eq!(reloaded.controls.len(), 1);
    }

    #[test]
    fn test_midi_section_optional() {
        let yaml = r#"
controls:
  l:
    type: label
    name: hello
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.midi.input_port.is_empty());
    }
}
