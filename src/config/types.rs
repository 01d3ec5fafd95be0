//! Settings for the loader, the behavior bus and logging.
//!
//! Every field has a default, so an empty or partial settings file is valid.

use super::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::{InitError, InitResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default identifier-space size for the behavior bus.
pub const DEFAULT_BUS_CAPACITY: u64 = 1 << 20;

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub loader: LoaderSettings,

    #[serde(default)]
    pub bus: BusSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where the configuration tree starts and how it is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderSettings {
    /// Root directory every folder is resolved against.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Folder of the init file, relative to `root`.
    #[serde(default)]
    pub init_path: String,

    /// Init file name; `.yml` is appended when missing.
    #[serde(default = "default_init_file")]
    pub init_file: String,

    /// Fail on `extend` chains that lead back into themselves.
    #[serde(default = "default_true")]
    pub detect_cycles: bool,

    /// Parsed-file cache size; 0 disables the cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            root: default_root(),
            init_path: String::new(),
            init_file: default_init_file(),
            detect_cycles: default_true(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_init_file() -> String {
    "init".to_string()
}

fn default_true() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

/// Behavior bus limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusSettings {
    /// Number of listener identifiers the bus may ever hand out.
    #[serde(default = "default_bus_capacity")]
    pub capacity: u64,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            capacity: default_bus_capacity(),
        }
    }
}

fn default_bus_capacity() -> u64 {
    DEFAULT_BUS_CAPACITY
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output: off, stdout, stderr, or a file path
    #[serde(default = "default_log_output")]
    pub output: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: default_log_output(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_output() -> String {
    "stderr".to_string()
}

impl Settings {
    /// Load settings from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> InitResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| InitError::file_not_found(path, e))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| {
            InitError::invalid_settings(format!(
                "{}: {}",
                crate::paths::to_forward_slashes(path),
                e
            ))
        })
    }

    /// Load from the first settings file found, or fall back to defaults.
    ///
    /// Search order: `$INITTREE_SETTINGS`, `./inittree.yaml`,
    /// `~/.inittree/settings.yaml`. Environment overrides are applied last.
    pub fn load_or_default() -> InitResult<Self> {
        let mut settings = match Self::discover() {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    fn discover() -> Option<PathBuf> {
        if let Ok(explicit) = std::env::var("INITTREE_SETTINGS") {
            return Some(PathBuf::from(explicit));
        }

        let local = PathBuf::from("inittree.yaml");
        if local.is_file() {
            return Some(local);
        }

        dirs::home_dir()
            .map(|home| home.join(".inittree").join("settings.yaml"))
            .filter(|p| p.is_file())
    }

    /// Apply `INITTREE_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var("INITTREE_ROOT") {
            self.loader.root = PathBuf::from(root);
        }

        if let Ok(init_path) = std::env::var("INITTREE_INIT_PATH") {
            self.loader.init_path = init_path;
        }

        if let Ok(init_file) = std::env::var("INITTREE_INIT_FILE") {
            self.loader.init_file = init_file;
        }

        if let Ok(capacity) = std::env::var("INITTREE_BUS_CAPACITY") {
            match capacity.parse() {
                Ok(capacity) => self.bus.capacity = capacity,
                Err(_) => warn!(value = %capacity, "ignoring invalid INITTREE_BUS_CAPACITY"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.loader.root, PathBuf::from("."));
        assert_eq!(settings.loader.init_file, "init");
        assert!(settings.loader.init_path.is_empty());
        assert!(settings.loader.detect_cycles);
        assert_eq!(settings.loader.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert_eq!(settings.bus.capacity, DEFAULT_BUS_CAPACITY);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.logging.output, "stderr");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("inittree.yaml");
        std::fs::write(
            &file,
            r#"
loader:
  init_file: boot
  detect_cycles: false
bus:
  capacity: 8
"#,
        )
        .unwrap();

        let settings = Settings::load(&file).unwrap();
        assert_eq!(settings.loader.init_file, "boot");
        assert!(!settings.loader.detect_cycles);
        assert_eq!(settings.loader.root, PathBuf::from("."));
        assert_eq!(settings.bus.capacity, 8);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_empty_file_is_default() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("inittree.yaml");
        std::fs::write(&file, "").unwrap();
        assert_eq!(Settings::load(&file).unwrap(), Settings::default());
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("inittree.yaml");
        std::fs::write(&file, "bus:\n  capacity: lots\n").unwrap();
        let err = Settings::load(&file).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidSettings);
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load("/definitely/not/here.yaml").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::FileNotFound);
    }
}
