//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::CompilerConfig;
use std::path::Path;

/// Loads and validates an `xsdc.toml` configuration from a project directory.
///
/// A missing file is not an error: all options have defaults.
pub fn load_config(project_dir: &Path) -> Result<CompilerConfig, ConfigError> {
    let config_path = project_dir.join("xsdc.toml");
    if !config_path.exists() {
        return Ok(CompilerConfig::default());
    }
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<CompilerConfig, ConfigError> {
    let config: CompilerConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates configuration values are consistent.
fn validate_config(config: &CompilerConfig) -> Result<(), ConfigError> {
    if config.store.base_package.is_empty() {
        return Err(ConfigError::ValidationError(
            "store.base_package must not be empty".to_string(),
        ));
    }
    if let Some(base) = &config.download.base_uri {
        if base.is_empty() {
            return Err(ConfigError::ValidationError(
                "download.base_uri must not be empty when set".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config = load_config_from_str("").unwrap();
        assert!(config.schema.mdef_namespaces.is_empty());
        assert_eq!(config.store.base_package, "schema");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[schema]
mdef_namespaces = ["http://legacy.example/ns"]
partial_types = true
line_numbers = true

[download]
disabled_schemes = ["http", "https"]
base_uri = "file:///project/schemas/"

[store]
base_package = "generated/schema"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(config.schema.mdef_allows("http://legacy.example/ns"));
        assert!(config.schema.partial_types);
        assert!(config.download.is_scheme_disabled("https"));
        assert_eq!(config.store.base_package, "generated/schema");
    }

    #[test]
    fn reject_empty_base_package() {
        let toml = r#"
[store]
base_package = ""
"#;
        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    fn reject_bad_toml() {
        assert!(load_config_from_str("[schema").is_err());
    }
}
