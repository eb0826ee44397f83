//! TOML parsing with file path context.

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::SlimError;

/// Read and deserialize a TOML file.
///
/// Read failures carry the file path; syntax and schema failures are
/// reported as [`SlimError::ConfigParseError`] with the parser message.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&content).map_err(|e| {
        SlimError::ConfigParseError {
            file: path.display().to_string(),
            reason: e.message().to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Debug, serde::Deserialize)]
    struct TestConfig {
        name: String,
    }

    #[test]
    fn test_parse_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("test.toml");
        std::fs::write(&path, "name = \"shop\"\n").unwrap();

        let config: TestConfig = parse_config(&path).unwrap();
        assert_eq!(config.name, "shop");
    }

    #[test]
    fn test_parse_config_invalid_toml() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bad.toml");
        std::fs::write(&path, "name = [unclosed").unwrap();

        let err = parse_config::<TestConfig>(&path).unwrap_err();
        let slim = err.downcast_ref::<SlimError>().unwrap();
        assert!(matches!(slim, SlimError::ConfigParseError { .. }));
    }

    #[test]
    fn test_parse_config_missing_file() {
        let err = parse_config::<TestConfig>(Path::new("/nonexistent/slimload.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
