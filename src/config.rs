//! Runtime configuration from `HEMOCAST_*` environment variables.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

use crate::adapters::artifacts::{ArtifactPaths, IntegrityPolicy, MODEL_FILE, SCALER_FILE};
use crate::adapters::sanitize::DEFAULT_SANITIZE_MAX_BYTES;

pub const MODEL_PATH_ENV: &str = "HEMOCAST_MODEL_PATH";
pub const SCALER_PATH_ENV: &str = "HEMOCAST_SCALER_PATH";
pub const INTEGRITY_ENV: &str = "HEMOCAST_ARTIFACT_INTEGRITY";
pub const PUBKEY_FILE_ENV: &str = "HEMOCAST_ARTIFACT_PUBKEY_B64_FILE";
pub const LOG_MODE_ENV: &str = "HEMOCAST_LOG_MODE";
pub const LOG_FILE_ENV: &str = "HEMOCAST_LOG_FILE";
pub const SANITIZE_MAX_BYTES_ENV: &str = "HEMOCAST_SANITIZE_MAX_BYTES";

/// Where log output goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdout is a terminal, stdout otherwise
    #[default]
    Auto,
    File,
    Stdout,
}

impl LogMode {
    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::Auto => interactive,
            Self::File => true,
            Self::Stdout => false,
        }
    }
}

impl FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "file" => Ok(Self::File),
            "stdout" => Ok(Self::Stdout),
            other => Err(format!("unknown log mode '{other}'")),
        }
    }
}

impl fmt::Display for LogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::File => "file",
            Self::Stdout => "stdout",
        })
    }
}

/// Application configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub integrity: IntegrityPolicy,
    /// Base64 Ed25519 public key used to verify `artifacts.sig`
    pub pubkey_file: Option<PathBuf>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    pub sanitize_max_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: Path::new("models").join(MODEL_FILE),
            scaler_path: Path::new("models").join(SCALER_FILE),
            integrity: IntegrityPolicy::Auto,
            pubkey_file: None,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from("hemocast.log"),
            sanitize_max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error naming the variable that holds an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`; unset or blank variables keep defaults.
    ///
    /// # Errors
    /// Returns an error naming the variable that holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = get(MODEL_PATH_ENV) {
            config.model_path = PathBuf::from(path);
        }
        if let Some(path) = get(SCALER_PATH_ENV) {
            config.scaler_path = PathBuf::from(path);
        }
        if let Some(policy) = get(INTEGRITY_ENV) {
            config.integrity = policy
                .parse()
                .map_err(|e: String| anyhow!(e))
                .with_context(|| format!("invalid {INTEGRITY_ENV}"))?;
        }
        config.pubkey_file = get(PUBKEY_FILE_ENV).map(PathBuf::from);
        if let Some(mode) = get(LOG_MODE_ENV) {
            config.log_mode = mode
                .parse()
                .map_err(|e: String| anyhow!(e))
                .with_context(|| format!("invalid {LOG_MODE_ENV}"))?;
        }
        if let Some(path) = get(LOG_FILE_ENV) {
            config.log_file = PathBuf::from(path);
        }
        if let Some(bytes) = get(SANITIZE_MAX_BYTES_ENV) {
            config.sanitize_max_bytes = bytes
                .parse::<usize>()
                .ok()
                .filter(|&v| v > 0)
                .ok_or_else(|| anyhow!("invalid {SANITIZE_MAX_BYTES_ENV}: '{bytes}'"))?;
        }

        Ok(config)
    }

    #[must_use]
    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            model: self.model_path.clone(),
            scaler: self.scaler_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.model_path, PathBuf::from("models/xgboost_model.json"));
        assert_eq!(config.scaler_path, PathBuf::from("models/scaler.json"));
        assert_eq!(config.sanitize_max_bytes, 16 * 1024);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (MODEL_PATH_ENV, "/srv/hgb/model.json"),
            (INTEGRITY_ENV, "required"),
            (PUBKEY_FILE_ENV, "/run/secrets/hemocast_pub"),
            (LOG_MODE_ENV, "stdout"),
            (SANITIZE_MAX_BYTES_ENV, "4096"),
        ]))
        .expect("config");

        assert_eq!(config.model_path, PathBuf::from("/srv/hgb/model.json"));
        assert_eq!(config.scaler_path, PathBuf::from("models/scaler.json"));
        assert_eq!(config.integrity, IntegrityPolicy::Required);
        assert_eq!(
            config.pubkey_file,
            Some(PathBuf::from("/run/secrets/hemocast_pub"))
        );
        assert_eq!(config.log_mode, LogMode::Stdout);
        assert_eq!(config.sanitize_max_bytes, 4096);
        assert_eq!(config.artifact_paths().model, config.model_path);
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = AppConfig::from_lookup(lookup(&[(LOG_MODE_ENV, "  ")])).expect("config");
        assert_eq!(config.log_mode, LogMode::Auto);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let err = AppConfig::from_lookup(lookup(&[(INTEGRITY_ENV, "maybe")])).expect_err("must fail");
        assert!(format!("{err:#}").contains(INTEGRITY_ENV));

        let err = AppConfig::from_lookup(lookup(&[(SANITIZE_MAX_BYTES_ENV, "0")])).expect_err("must fail");
        assert!(err.to_string().contains(SANITIZE_MAX_BYTES_ENV));
    }

    #[test]
    fn test_log_mode_resolution() {
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert!(LogMode::File.use_file(false));
        assert!(!LogMode::Stdout.use_file(true));
    }
}
