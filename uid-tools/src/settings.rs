//! Configuration files
//!
//! Both tools take an optional `--config <file.json>`. Any field left out
//! of the file keeps its default, and command-line flags override the
//! file.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors loading a configuration file
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// File is not valid JSON for this tool
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Load `T` from `path`, or its defaults when no path is given
pub fn load<T>(path: Option<&Path>) -> Result<T, SettingsError>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(T::default());
    };

    let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uid_scan::ScanConfig;
    use uid_sim::{CollisionPolicy, ResponderConfig};

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("uid-tools-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_no_path_gives_defaults() {
        let config: ScanConfig = load(None).unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn test_partial_scan_config() {
        let path = temp_file("scan.json", r#"{ "timeout_ms": 75 }"#);
        let config: ScanConfig = load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.timeout_ms, 75);
        assert!(config.verify_exact);
    }

    #[test]
    fn test_responder_config() {
        let path = temp_file(
            "resp.json",
            r#"{ "collision_policy": "mixture", "rng_seed": 9, "empty_collision_prefixes": ["CB", "ZZ"] }"#,
        );
        let config: ResponderConfig = load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.collision_policy, CollisionPolicy::Mixture);
        assert_eq!(config.rng_seed, Some(9));
        assert_eq!(config.empty_collision_prefixes.len(), 2);
        assert_eq!(config.collision_max_len, 19);
    }

    #[test]
    fn test_missing_file() {
        let err = load::<ScanConfig>(Some(Path::new("/nonexistent/uid-tools.json"))).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let path = temp_file("bad.json", "{ timeout_ms: }");
        let err = load::<ScanConfig>(Some(&path)).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, SettingsError::Parse { .. }));
    }
}
