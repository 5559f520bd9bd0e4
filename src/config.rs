use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Custom title for the header (defaults to the backend host if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub table: TableConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the donation backend, e.g. http://localhost:3001/
  pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
  /// Rows per page when a table first opens
  #[serde(default = "default_page_size")]
  pub page_size: u64,
}

impl Default for TableConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
    }
  }
}

fn default_page_size() -> u64 {
  20
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./d9s.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/d9s/config.yaml
  /// 4. ~/.config/d9s/config.yaml
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
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/d9s/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("d9s.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("d9s").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the backend API token from environment variables, if set.
  ///
  /// Checks D9S_API_TOKEN. The stock backend is unauthenticated, so a
  /// missing token is not an error.
  pub fn api_token() -> Option<String> {
    std::env::var("D9S_API_TOKEN").ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_minimal_config() {
    let yaml = "api:\n  base_url: http://localhost:3001\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.api.base_url, "http://localhost:3001");
    assert_eq!(config.table.page_size, 20);
    assert!(config.title.is_none());
  }

  #[test]
  fn test_parse_full_config() {
    let yaml = "api:\n  base_url: https://donations.example.org/api\ntitle: Donations\ntable:\n  page_size: 50\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.table.page_size, 50);
    assert_eq!(config.title.as_deref(), Some("Donations"));
  }
}
