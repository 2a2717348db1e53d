use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Well-known location of the configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Failures reading or writing the configuration store.
///
/// Recovered by [`AlgorithmConfig::load_or_default`]; never reaches the optimization caller.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("config is malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Nelder-Mead coefficients and trace output selection for one run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmConfig {
    pub reflection_coeff: f64,
    pub contraction_coeff: f64,
    pub expansion_coeff: f64,
    /// Offset of each axis-perturbed vertex of the start simplex
    pub scale: f64,
    /// Convergence tolerance on the spread of function values
    pub eps: f64,
    pub max_steps: u32,
    /// `"txt"` or `"html"`; validated when the trace sink is opened
    #[serde(default = "default_output_variant")]
    pub output_variant: String,
}

fn default_output_variant() -> String {
    "txt".to_string()
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            reflection_coeff: 1.0,
            contraction_coeff: 0.5,
            expansion_coeff: 2.0,
            scale: 1.0,
            eps: 0.001,
            max_steps: 500,
            output_variant: default_output_variant(),
        }
    }
}

impl AlgorithmConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Persist as JSON indented by four spaces
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        fs::write(path, buf)?;
        Ok(())
    }

    /// Load `path`, or fall back to the defaults and (re)write them when the file
    /// is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Using default configuration, could not load {}: {}",
                    path.display(),
                    e
                );
                let config = Self::default();
                if let Err(e) = config.save(path) {
                    log::warn!(
                        "Could not write default configuration to {}: {}",
                        path.display(),
                        e
                    );
                }
                config
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("simplex-config-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_yields_defaults_and_persists_them() {
        let dir = scratch("missing");
        let path = dir.join("config.json");
        fs::remove_file(&path).ok();

        let config = AlgorithmConfig::load_or_default(&path);
        assert_eq!(config, AlgorithmConfig::default());
        assert_eq!(config.reflection_coeff, 1.0);
        assert_eq!(config.contraction_coeff, 0.5);
        assert_eq!(config.expansion_coeff, 2.0);
        assert_eq!(config.scale, 1.0);
        assert_eq!(config.eps, 0.001);
        assert_eq!(config.max_steps, 500);
        assert_eq!(config.output_variant, "txt");

        let reloaded = AlgorithmConfig::load(&path).unwrap();
        assert_eq!(reloaded, config);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn corrupt_file_is_replaced_with_defaults() {
        let dir = scratch("corrupt");
        let path = dir.join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(AlgorithmConfig::load_or_default(&path), AlgorithmConfig::default());
        assert_eq!(AlgorithmConfig::load(&path).unwrap(), AlgorithmConfig::default());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn saved_file_uses_camel_case_and_four_space_indent() {
        let dir = scratch("format");
        let path = dir.join("config.json");
        AlgorithmConfig::default().save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n    \"reflectionCoeff\": 1.0"));
        assert!(text.contains("\"maxSteps\": 500"));
        assert!(text.contains("\"outputVariant\": \"txt\""));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn existing_file_is_honoured() {
        let dir = scratch("existing");
        let path = dir.join("config.json");
        fs::write(
            &path,
            r#"{"reflectionCoeff": 1.5, "contractionCoeff": 0.25, "expansionCoeff": 3.0,
                "scale": 0.5, "eps": 1e-6, "maxSteps": 42, "outputVariant": "html"}"#,
        )
        .unwrap();

        let config = AlgorithmConfig::load_or_default(&path);
        assert_eq!(config.reflection_coeff, 1.5);
        assert_eq!(config.max_steps, 42);
        assert_eq!(config.output_variant, "html");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn output_variant_defaults_when_absent() {
        let config: AlgorithmConfig = serde_json::from_str(
            r#"{"reflectionCoeff": 1.0, "contractionCoeff": 0.5, "expansionCoeff": 2.0,
                "scale": 1.0, "eps": 0.001, "maxSteps": 500}"#,
        )
        .unwrap();
        assert_eq!(config, AlgorithmConfig::default());
    }

    #[test]
    fn unknown_variant_is_kept_for_the_sink_to_reject() {
        let config: AlgorithmConfig = serde_json::from_str(
            r#"{"reflectionCoeff": 1.0, "contractionCoeff": 0.5, "expansionCoeff": 2.0,
                "scale": 1.0, "eps": 0.001, "maxSteps": 500, "outputVariant": "pdf"}"#,
        )
        .unwrap();
        assert_eq!(config.output_variant, "pdf");
    }
}
