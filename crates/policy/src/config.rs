use crate::retention::RetentionPolicy;
use chestward_persist::{LOCK_FILE_NAME, LOG_FILE_NAME, LockQuota};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "chestward.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Server settings for auditing and locking.
///
/// Every field has a default, so partial files load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GuardConfig {
    /// Access records older than this many days are swept. Zero keeps everything.
    pub log_retention_days: u32,
    pub enable_locking: bool,
    /// Negative means unlimited.
    pub max_locks_per_player: i32,
    /// Access log file, relative to the data directory.
    pub log_file: String,
    /// Lock table file, relative to the data directory.
    pub lock_file: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            log_retention_days: 30,
            enable_locking: true,
            max_locks_per_player: -1,
            log_file: LOG_FILE_NAME.to_string(),
            lock_file: LOCK_FILE_NAME.to_string(),
        }
    }
}

impl GuardConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        serde_json::to_writer_pretty(std::fs::File::create(path)?, self)?;
        Ok(())
    }

    /// Load `chestward.json` from `dir`, writing defaults if it does not exist.
    ///
    /// A file that exists but cannot be parsed is left alone and defaults are
    /// used for this run.
    pub fn load_or_create(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        if path.exists() {
            return match Self::load(&path) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "config loaded");
                    config
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "failed to load config, using defaults");
                    Self::default()
                }
            };
        }

        tracing::info!(path = %path.display(), "config file not found, creating with defaults");
        let config = Self::default();
        if let Err(e) = config.save(&path) {
            tracing::error!(path = %path.display(), error = %e, "failed to save default config");
        }
        config
    }

    pub fn lock_quota(&self) -> LockQuota {
        LockQuota::from_limit(self.max_locks_per_player)
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy::new(self.log_retention_days)
    }

    pub fn log_path(&self, data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join(&self.log_file)
    }

    pub fn lock_path(&self, data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join(&self.lock_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GuardConfig::default();
        assert_eq!(config.log_retention_days, 30);
        assert!(config.enable_locking);
        assert_eq!(config.lock_quota(), LockQuota::Unlimited);
        assert_eq!(config.log_path("/srv"), Path::new("/srv/chest_logs.dat"));
        assert_eq!(config.lock_path("/srv"), Path::new("/srv/chest_locks.dat"));
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("config");
        let config = GuardConfig::load_or_create(&dir);
        assert_eq!(config, GuardConfig::default());
        assert!(dir.join(CONFIG_FILE_NAME).exists());
        assert_eq!(GuardConfig::load(dir.join(CONFIG_FILE_NAME)).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"{ "maxLocksPerPlayer": 2, "enableLocking": false }"#,
        )
        .unwrap();

        let config = GuardConfig::load_or_create(tmp.path());
        assert_eq!(config.lock_quota(), LockQuota::Max(2));
        assert!(!config.enable_locking);
        assert_eq!(config.log_retention_days, 30);
    }

    #[test]
    fn malformed_file_falls_back_without_overwriting() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        let config = GuardConfig::load_or_create(tmp.path());
        assert_eq!(config, GuardConfig::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
