//! Project and user configuration.
//!
//! Project config lives in `relstat.toml` in the working directory; user config
//! in `<config dir>/relstat/config.toml`. Both files are optional and both
//! parse with per-field defaults so a partial file never fails.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectConfig {
    /// Data root override; the CLI `--root` flag wins over this.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Base URL of the metadata catalog API.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Fallback catalog base URL used when neither the CLI flag nor the
    /// project config provides one.
    #[serde(default)]
    pub base_url: Option<String>,
}

const fn default_max_attempts() -> u32 {
    5
}

const fn default_timeout_secs() -> u64 {
    30
}

/// Load `relstat.toml` from `dir`, defaulting when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(dir: &Path) -> Result<ProjectConfig> {
    let path = dir.join("relstat.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the user config, defaulting when absent or when the platform has no
/// config directory.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("relstat/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the catalog base URL: CLI flag, then project config, then user
/// config.
#[must_use]
pub fn resolve_base_url(
    cli_flag: Option<&str>,
    project: &ProjectConfig,
    user: &UserConfig,
) -> Option<String> {
    cli_flag
        .map(str::to_string)
        .or_else(|| project.fetch.base_url.clone())
        .or_else(|| user.base_url.clone())
}

#[cfg(test)]
mod tests {
    use super::{
        FetchConfig, ProjectConfig, UserConfig, load_project_config, resolve_base_url,
    };
    use std::path::PathBuf;

    #[test]
    fn missing_project_config_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_project_config(dir.path()).expect("defaults");
        assert!(config.root.is_none());
        assert_eq!(config.fetch.max_attempts, 5);
        assert_eq!(config.fetch.timeout_secs, 30);
    }

    #[test]
    fn partial_project_config_parses() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("relstat.toml"),
            "root = \"/data/meta\"\n\n[fetch]\nbase_url = \"https://catalog.example/api\"\n",
        )
        .expect("write config");

        let config = load_project_config(dir.path()).expect("parses");
        assert_eq!(config.root, Some(PathBuf::from("/data/meta")));
        assert_eq!(
            config.fetch.base_url.as_deref(),
            Some("https://catalog.example/api")
        );
        // Unspecified fields keep their defaults.
        assert_eq!(config.fetch.max_attempts, 5);
    }

    #[test]
    fn malformed_project_config_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("relstat.toml"), "root = [broken").expect("write config");
        assert!(load_project_config(dir.path()).is_err());
    }

    #[test]
    fn base_url_precedence() {
        let project = ProjectConfig {
            root: None,
            fetch: FetchConfig {
                base_url: Some("https://project.example".to_string()),
                ..FetchConfig::default()
            },
        };
        let user = UserConfig {
            base_url: Some("https://user.example".to_string()),
        };

        assert_eq!(
            resolve_base_url(Some("https://flag.example"), &project, &user).as_deref(),
            Some("https://flag.example")
        );
        assert_eq!(
            resolve_base_url(None, &project, &user).as_deref(),
            Some("https://project.example")
        );
        assert_eq!(
            resolve_base_url(None, &ProjectConfig::default(), &user).as_deref(),
            Some("https://user.example")
        );
        assert!(
            resolve_base_url(None, &ProjectConfig::default(), &UserConfig::default()).is_none()
        );
    }
}
