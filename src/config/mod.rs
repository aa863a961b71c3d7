//! Configuration Loading
//!
//! Both configuration sources (the target registry and the credential
//! store) are read once at startup and never reloaded. Files are JSON by
//! default; a `.yaml`/`.yml` extension switches to YAML.

mod credentials;
mod registry;

pub use credentials::Credentials;
pub use registry::{Settings, Target, TargetRegistry};

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from the file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Json,
        }
    }

    fn parse<T: DeserializeOwned>(self, path: &Path, raw: &str) -> Result<T> {
        let parsed = match self {
            ConfigFormat::Json => serde_json::from_str(raw).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(raw).map_err(|e| e.to_string()),
        };

        parsed.map_err(|reason| Error::ConfigParse {
            path: path.to_path_buf(),
            reason,
        })
    }
}

/// Read and deserialize a configuration file
pub(crate) fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    ConfigFormat::from_path(path).parse(path, &raw)
}


#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("url.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("url.yaml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("url.YML")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("url")), ConfigFormat::Json);
    }

    #[test]
    fn test_read_missing_file() {
        let path = PathBuf::from("/nonexistent/http-status-exporter/url.json");
        let result: Result<serde_json::Value> = read_file(&path);
        assert_matches!(result, Err(Error::ConfigRead { .. }));
    }

    #[test]
    fn test_read_malformed_file() {
        let path = test_support::write_temp("json", "{ not json");
        let result: Result<serde_json::Value> = read_file(&path);
        assert_matches!(result, Err(Error::ConfigParse { .. }));
        let _ = std::fs::remove_file(path);
    }
}
