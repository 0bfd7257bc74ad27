//! Configuration file discovery for the CLI.
//!
//! Search order:
//! 1. `--config <path>` (must exist)
//! 2. `$SR_TRAIN_CONFIG`
//! 3. Platform config directory (`directories::ProjectDirs`)
//! 4. `./sr-train.toml`

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use relatedness_core::TrainerConfig;
use std::path::{Path, PathBuf};

/// Configuration file name
const CONFIG_FILENAME: &str = "sr-train.toml";

/// Environment variable naming a configuration file
const CONFIG_ENV: &str = "SR_TRAIN_CONFIG";

/// Returns the platform config directory's file path, if one can be determined.
///
/// - macOS: `~/Library/Application Support/org.relatedness.sr-train/sr-train.toml`
/// - Linux: `~/.config/sr-train/sr-train.toml`
/// - Windows: `%APPDATA%\relatedness\sr-train\config\sr-train.toml`
fn platform_config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "relatedness", "sr-train")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Candidate paths in search order, excluding an explicit `--config`.
fn candidates(env_value: Option<String>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        paths.push(PathBuf::from(value));
    }
    paths.extend(platform_config_path());
    paths.push(PathBuf::from(CONFIG_FILENAME));
    paths
}

/// Finds the configuration file to use.
pub fn find_config(custom: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = custom {
        if !path.is_file() {
            return Err(anyhow!("Configuration file not found: {}", path.display()));
        }
        return Ok(path.clone());
    }

    let searched = candidates(std::env::var(CONFIG_ENV).ok());
    searched
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or_else(|| {
            anyhow!(
                "No configuration file found. Pass --config or set ${}.\n\
                 Searched locations:\n{}",
                CONFIG_ENV,
                searched
                    .iter()
                    .map(|p| format!("  - {}", p.display()))
                    .collect::<Vec<_>>()
                    .join("\n")
            )
        })
}

/// Reads and parses the configuration file.
pub fn load_config(path: &Path) -> Result<TrainerConfig> {
    TrainerConfig::load(path)
        .with_context(|| format!("Failed to load configuration: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_path_must_exist() {
        let missing = PathBuf::from("/definitely/not/here/sr-train.toml");
        assert!(find_config(Some(&missing)).is_err());
    }

    #[test]
    fn test_custom_path_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "").unwrap();
        assert_eq!(find_config(Some(&path)).unwrap(), path);
    }

    #[test]
    fn test_env_value_is_searched_first() {
        let paths = candidates(Some("/etc/sr.toml".to_string()));
        assert_eq!(paths[0], PathBuf::from("/etc/sr.toml"));
        assert_eq!(paths.last(), Some(&PathBuf::from(CONFIG_FILENAME)));

        // Empty variable is ignored
        let paths = candidates(Some(String::new()));
        assert_ne!(paths[0], PathBuf::from(""));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[dataset\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to load configuration"));
    }
}
