use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::selection::{PersistPolicy, DEFAULT_EXCLUDED_FIELDS, DEFAULT_STORAGE_KEY};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:4000/graphql";

/// Environment variable that overrides `remote.endpoint`
pub const ENDPOINT_ENV: &str = "JOBDESK_ENDPOINT";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub remote: RemoteConfig,
  pub selection: SelectionConfig,
  pub logging: LoggingConfig,
  /// Custom title for header (defaults to the endpoint host)
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
  /// GraphQL endpoint of the vacancy backend
  pub endpoint: String,
  pub timeout_secs: u64,
}

impl Default for RemoteConfig {
  fn default() -> Self {
    Self {
      endpoint: DEFAULT_ENDPOINT.to_string(),
      timeout_secs: 10,
    }
  }
}

impl RemoteConfig {
  pub fn endpoint_url(&self) -> Result<Url> {
    let url = Url::parse(&self.endpoint)
      .map_err(|e| eyre!("Invalid endpoint URL '{}': {}", self.endpoint, e))?;
    match url.scheme() {
      "http" | "https" => Ok(url),
      other => Err(eyre!(
        "Unsupported endpoint scheme '{}' in {}",
        other,
        self.endpoint
      )),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
  pub storage_key: String,
  /// Vacancy fields (wire names) never written to session storage
  pub exclude_fields: Vec<String>,
  /// Overrides the per-login runtime directory
  pub session_dir: Option<PathBuf>,
}

impl Default for SelectionConfig {
  fn default() -> Self {
    Self {
      storage_key: DEFAULT_STORAGE_KEY.to_string(),
      exclude_fields: DEFAULT_EXCLUDED_FIELDS.iter().map(|s| s.to_string()).collect(),
      session_dir: None,
    }
  }
}

impl SelectionConfig {
  pub fn policy(&self) -> Result<PersistPolicy> {
    PersistPolicy::new(self.storage_key.clone(), self.exclude_fields.iter().cloned())
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Default filter when RUST_LOG is unset
  pub level: String,
  /// Log file directory (default: $XDG_DATA_HOME/jobdesk/logs)
  pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      directory: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./jobdesk.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/jobdesk/config.yaml
  ///
  /// Without a file every setting takes its default. `JOBDESK_ENDPOINT`
  /// overrides the endpoint either way.
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

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
      if !endpoint.trim().is_empty() {
        config.remote.endpoint = endpoint.trim().to_string();
      }
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("jobdesk.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("jobdesk").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }

  /// Header title: configured title, else the endpoint host
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    self
      .remote
      .endpoint_url()
      .ok()
      .and_then(|url| url.host_str().map(String::from))
      .unwrap_or_else(|| "jobdesk".to_string())
  }
}
