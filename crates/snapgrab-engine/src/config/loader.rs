use super::schema::ScrapeConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./snapgrab.yaml
    /// 2. ~/.snapgrab/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<ScrapeConfig, ConfigError> {
        let local_config = PathBuf::from("./snapgrab.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".snapgrab").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(ScrapeConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<ScrapeConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<ScrapeConfig, ConfigError> {
        // An empty document deserializes to unit, not to a mapping.
        if content.trim().is_empty() {
            return Ok(ScrapeConfig::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = ConfigLoader::parse("").unwrap();
        assert_eq!(config.fallback.min_width, 300);
        assert_eq!(config.output_dir, PathBuf::from("images"));
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let yaml = "output_dir: out\nfallback:\n  min_width: 500\n  min_height: 500\n";
        let config = ConfigLoader::parse(yaml).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.fallback.min_width, 500);
        assert_eq!(config.fallback.decoy_keywords[0], "thumbnail");
        assert_eq!(config.download.max_retries, 0);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = ConfigLoader::parse("fallback: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[tokio::test]
    async fn load_from_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapgrab.yaml");
        tokio::fs::write(&path, "wait_timeout_ms: 1500\n").await.unwrap();

        let config = ConfigLoader::load_from(&path).await.unwrap();
        assert_eq!(config.wait_timeout_ms, 1500);
    }
}
