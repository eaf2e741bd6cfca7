use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:1234/api";
pub const DEFAULT_NAMESPACE: &str = "internflow";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub backend: BackendConfig,
  #[serde(default)]
  pub storage: StorageConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
  /// Base URL including the `/api` prefix
  #[serde(default = "default_backend_url")]
  pub url: String,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      url: default_backend_url(),
    }
  }
}

fn default_backend_url() -> String {
  DEFAULT_BACKEND_URL.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
  /// Prefix for every stored key
  #[serde(default = "default_namespace")]
  pub namespace: String,
  /// SQLite file (defaults to the platform data dir)
  pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      namespace: default_namespace(),
      path: None,
    }
  }
}

fn default_namespace() -> String {
  DEFAULT_NAMESPACE.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// Filter used when RUST_LOG is unset
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Write daily-rolling log files here instead of stderr
  pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      dir: None,
    }
  }
}

fn default_log_level() -> String {
  "warn".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./zynk.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/zynk/config.yaml
  ///
  /// Without any file the defaults apply.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("zynk.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("zynk").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file is a valid "all defaults" config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Backend token from the environment, if any.
  ///
  /// Checks ZYNK_TOKEN.
  pub fn get_api_token() -> Option<String> {
    std::env::var("ZYNK_TOKEN")
      .ok()
      .filter(|t| !t.trim().is_empty())
  }
}
