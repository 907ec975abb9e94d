use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Program speaking the line protocol on stdin/stdout.
    pub command: String,
    pub args: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command: "invoice-backend".to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub status_timeout_ms: u64,
    /// Wait before re-listing history after a normal generation. The backend
    /// gives no commit signal, so a slow backend can still lose this race.
    pub history_refresh_delay_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            status_timeout_ms: 3000,
            history_refresh_delay_ms: 500,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct PathsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_cache: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct DeskConfig {
    pub backend: BackendConfig,
    pub ui: UiConfig,
    pub paths: PathsConfig,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "invoice-desk", "app")
}

pub fn default_config_path() -> PathBuf {
    match project_dirs() {
        Some(dirs) => dirs.config_dir().join("settings.toml"),
        None => PathBuf::from("settings.toml"),
    }
}

pub fn expand_home_dir(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

impl DeskConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        let write = |p: &Path| -> std::io::Result<()> {
            if let Some(parent) = p.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(p, &content)
        };
        write(path).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.ui.status_timeout_ms)
    }

    pub fn history_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.ui.history_refresh_delay_ms)
    }

    /// Where downloaded invoices land.
    pub fn downloads_dir(&self) -> PathBuf {
        if let Some(dir) = &self.paths.downloads {
            return PathBuf::from(expand_home_dir(dir));
        }
        UserDirs::new()
            .and_then(|u| u.download_dir().map(Path::to_path_buf))
            .or_else(|| BaseDirs::new().map(|b| b.home_dir().to_path_buf()))
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Scratch directory for decoded preview documents.
    pub fn preview_cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.paths.preview_cache {
            return PathBuf::from(expand_home_dir(dir));
        }
        match project_dirs() {
            Some(dirs) => dirs.cache_dir().join("previews"),
            None => std::env::temp_dir().join("invoice-desk-previews"),
        }
    }
}
