use serde::{Deserialize, Serialize};
use std::{
    env,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    errors::{Result, TrackerError},
    utils::tmp_path,
};

/// Environment variable naming the directory tracker files live in.
pub const HOME_ENV: &str = "SPOILTRACKER_HOME";
pub const CONFIG_FILE_NAME: &str = "spoiltracker.json";
pub const DEFAULT_DAYS: i64 = 3;

/// File locations and defaults for a tracker run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub shelf_life_file: PathBuf,
    pub history_file: PathBuf,
    pub expiry_report_file: PathBuf,
    pub default_days: i64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            shelf_life_file: PathBuf::from("shelflife.csv"),
            history_file: PathBuf::from("history.csv"),
            expiry_report_file: PathBuf::from("expiryreport.csv"),
            default_days: DEFAULT_DAYS,
        }
    }
}

impl TrackerConfig {
    /// Makes every relative path absolute against `base`.
    pub fn resolved_in(mut self, base: &Path) -> Self {
        for path in [
            &mut self.shelf_life_file,
            &mut self.history_file,
            &mut self.expiry_report_file,
        ] {
            *path = resolve_against(base, path);
        }
        self
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Loads and saves `spoiltracker.json`.
pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    /// Uses `$SPOILTRACKER_HOME`, or the current directory when unset.
    pub fn new() -> Result<Self> {
        let base = match env::var_os(HOME_ENV) {
            Some(custom) => PathBuf::from(custom),
            None => env::current_dir()?,
        };
        Ok(Self::with_base_dir(base))
    }

    pub fn with_base_dir(base: PathBuf) -> Self {
        let path = base.join(CONFIG_FILE_NAME);
        Self { base, path }
    }

    /// Points at an explicit config file; relative data paths resolve next to it.
    pub fn with_config_file(path: PathBuf) -> Self {
        let base = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self { base, path }
    }

    /// Reads the config file when present, otherwise the defaults, with paths
    /// resolved against the base directory.
    pub fn load(&self) -> Result<TrackerConfig> {
        let config = if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            serde_json::from_str(&data).map_err(|err| {
                TrackerError::Config(format!("{}: {}", self.path.display(), err))
            })?
        } else {
            TrackerConfig::default()
        };
        Ok(config.resolved_in(&self.base))
    }

    /// Writes `config` to the config file through a temp file and rename.
    pub fn save(&self, config: &TrackerConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Resolves a command-line path the same way config file paths are resolved.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        resolve_against(&self.base, path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    let mut file = File::create(path).map_err(|err| TrackerError::from_io(err, path))?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults_resolved_in_base() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf());
        let config = manager.load().unwrap();
        assert_eq!(config.history_file, dir.path().join("history.csv"));
        assert_eq!(config.default_days, DEFAULT_DAYS);
    }

    #[test]
    fn save_then_load_keeps_overrides() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf());
        let config = TrackerConfig {
            expiry_report_file: PathBuf::from("reports/soon.csv"),
            default_days: 7,
            ..TrackerConfig::default()
        };
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.expiry_report_file, dir.path().join("reports/soon.csv"));
        assert_eq!(loaded.default_days, 7);
        assert!(!tmp_path(manager.path()).exists());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{ "default_days": 5 }"#).unwrap();
        let config = ConfigManager::with_base_dir(dir.path().to_path_buf())
            .load()
            .unwrap();
        assert_eq!(config.default_days, 5);
        assert_eq!(config.shelf_life_file, dir.path().join("shelflife.csv"));
    }

    #[test]
    fn flag_paths_resolve_against_base_dir() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf());
        assert_eq!(
            manager.resolve_path(Path::new("custom/history.csv")),
            dir.path().join("custom/history.csv")
        );
        let absolute = dir.path().join("elsewhere.csv");
        assert_eq!(manager.resolve_path(&absolute), absolute);
    }

    #[test]
    fn explicit_config_file_resolves_next_to_itself() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_config_file(dir.path().join("tracker.json"));
        assert_eq!(
            manager.resolve_path(Path::new("shelflife.csv")),
            dir.path().join("shelflife.csv")
        );
    }

    #[test]
    fn unparsable_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "not json").unwrap();
        let err = ConfigManager::with_base_dir(dir.path().to_path_buf())
            .load()
            .unwrap_err();
        assert!(matches!(err, TrackerError::Config(_)));
    }
}
