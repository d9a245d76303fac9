//! Configuration loading for the CLI
//!
//! Reads an optional YAML file and applies command-line / environment overrides on top.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tokengate_core::JwtConfig;

/// Values that take precedence over the config file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub secret: Option<String>,
    pub access_token_expiration: Option<u64>,
    pub refresh_token_expiration: Option<u64>,
}

/// Load configuration from `path` (or defaults if none) and apply overrides
pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<JwtConfig> {
    let mut config = match path {
        Some(path) => {
            let yaml = fs::read_to_string(path)
                .context(format!("Failed to read config file: {:?}", path))?;
            serde_yaml::from_str::<JwtConfig>(&yaml)
                .context(format!("Failed to parse config file: {:?}", path))?
        }
        None => JwtConfig::default(),
    };

    if let Some(secret) = &overrides.secret {
        config.secret = Some(secret.clone());
    }
    if let Some(seconds) = overrides.access_token_expiration {
        config.access_token_expiration = seconds;
    }
    if let Some(seconds) = overrides.refresh_token_expiration {
        config.refresh_token_expiration = seconds;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SECRET: &str = "VerySecretKey12345678901234567890";

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let config = load(None, &Overrides::default()).unwrap();
        assert!(config.secret.is_none());
        assert_eq!(config.access_token_expiration, 600);
    }

    #[test]
    fn test_file_values() {
        let file = write_config(&format!(
            "secret: {}\naccess-token-expiration: 60\ntoken-prefix: \"Token \"\n",
            SECRET
        ));

        let config = load(Some(file.path()), &Overrides::default()).unwrap();
        assert_eq!(config.secret.as_deref(), Some(SECRET));
        assert_eq!(config.access_token_expiration, 60);
        assert_eq!(config.refresh_token_expiration, 2_592_000);
        assert_eq!(config.token_prefix, "Token ");
    }

    #[test]
    fn test_overrides_win_over_file() {
        let file = write_config("secret: from-file-but-long-enough-to-be-valid\nrefresh-token-expiration: 100\n");
        let overrides = Overrides {
            secret: Some(SECRET.to_string()),
            access_token_expiration: None,
            refresh_token_expiration: Some(200),
        };

        let config = load(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.secret.as_deref(), Some(SECRET));
        assert_eq!(config.refresh_token_expiration, 200);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = load(Some(Path::new("/nonexistent/tokengate.yaml")), &Overrides::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let file = write_config("access-token-expiration: soon\n");
        let err = load(Some(file.path()), &Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
