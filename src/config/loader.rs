//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{CloneConfig, KeySource};
use crate::config::validation::{validate_config, ValidationError};

/// Errors raised while loading or overriding configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub fee_limit: Option<u64>,
    pub call_value: Option<u64>,
    pub key_source: Option<KeySource>,
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<CloneConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: CloneConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Merge command-line overrides and validate the result again.
pub fn apply_overrides(mut config: CloneConfig, overrides: &Overrides) -> Result<CloneConfig, ConfigError> {
    if let Some(fee_limit) = overrides.fee_limit {
        config.defaults.fee_limit = fee_limit;
    }
    if let Some(call_value) = overrides.call_value {
        config.defaults.call_value = call_value;
    }
    if let Some(source) = overrides.key_source {
        config.key.source = source;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DEFAULT_FEE_LIMIT;
    use std::io::Write;

    #[test]
    fn test_load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [output]
            artifact_dir = "/tmp/clones"

            [defaults]
            fee_limit = 5000000
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.output.artifact_dir, "/tmp/clones");
        assert_eq!(config.defaults.fee_limit, 5_000_000);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[defaults]\nfee_limit = 0").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("defaults.fee_limit"));
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let overrides = Overrides {
            fee_limit: Some(10_000_000),
            call_value: Some(1),
            key_source: Some(KeySource::Prompt),
        };
        let config = apply_overrides(CloneConfig::default(), &overrides).unwrap();
        assert_eq!(config.defaults.fee_limit, 10_000_000);
        assert_eq!(config.defaults.call_value, 1);
        assert_eq!(config.key.source, KeySource::Prompt);

        let untouched = apply_overrides(CloneConfig::default(), &Overrides::default()).unwrap();
        assert_eq!(untouched.defaults.fee_limit, DEFAULT_FEE_LIMIT);
        assert_eq!(untouched.key.source, KeySource::Env);
    }

    #[test]
    fn test_zero_fee_limit_override_is_rejected() {
        let overrides = Overrides {
            fee_limit: Some(0),
            ..Overrides::default()
        };
        let err = apply_overrides(CloneConfig::default(), &overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("defaults.fee_limit: must be greater than 0"));
    }
}
