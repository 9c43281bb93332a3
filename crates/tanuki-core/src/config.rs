//! Persisted connection settings.
//!
//! The configuration file is a small TOML document holding the GitLab
//! server and the personal access token:
//!
//! ```toml
//! server = "https://gitlab.example.com"
//! token = "glpat-..."
//! ```
//!
//! ## File Location
//!
//! - Linux: `~/.config/tanuki/config.toml`
//! - macOS: `~/Library/Application Support/dev.tanuki.tanuki/config.toml`
//! - Windows: `%APPDATA%\tanuki\tanuki\config\config.toml`
//!
//! A directory given with `TANUKI_CONFIG_DIR` (or `--config-dir`) replaces
//! the platform directory.
//!
//! ## Precedence
//!
//! Command-line flags and environment variables win over the file, which
//! wins over the built-in defaults. See [`Config::resolve`].

use std::fs;
use std::path::{Path, PathBuf};

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::gitlab::DEFAULT_SERVER;
use crate::{Error, Result};

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "TANUKI_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";

/// Server and credential used to reach GitLab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the GitLab instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    /// Personal access token sent as `PRIVATE-TOKEN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Config {
    /// Load configuration from `path`, or defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Failed to parse config: {e}")))
    }

    /// Write configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created, the configuration
    /// cannot be serialized, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::Config("Invalid config path".into()))?;

        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

        write_private(path, content.as_bytes())
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;

        Ok(())
    }

    /// Path of the configuration file inside `dir`, or inside the platform
    /// configuration directory when `dir` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform configuration directory cannot be
    /// determined.
    pub fn path_in(dir: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = dir {
            return Ok(dir.join(CONFIG_FILE));
        }
        let project_dirs = directories::ProjectDirs::from("dev", "tanuki", "tanuki")
            .ok_or_else(|| Error::Config("Failed to determine project directories".into()))?;
        Ok(project_dirs.config_dir().join(CONFIG_FILE))
    }

    /// Merge explicit overrides on top of this file configuration.
    #[must_use]
    pub fn resolve(&self, server: Option<&str>, token: Option<&str>) -> Settings {
        let server = non_blank(server)
            .or_else(|| non_blank(self.server.as_deref()))
            .unwrap_or(DEFAULT_SERVER)
            .to_string();
        let token = non_blank(token)
            .or_else(|| non_blank(self.token.as_deref()))
            .map(str::to_string);
        Settings { server, token }
    }
}

/// Empty or whitespace-only values count as unset.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// The file holds a token, so on unix only the owner may read it.
#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; tighten a pre-existing file too.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(content)
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    fs::write(path, content)
}

/// Effective settings after applying overrides and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Base URL of the GitLab instance.
    pub server: String,
    /// Personal access token, if any.
    pub token: Option<String>,
}

impl Settings {
    /// Token encoded for display, so it is not shown in clear text.
    #[must_use]
    pub fn obfuscated_token(&self) -> String {
        STANDARD.encode(self.token.as_deref().unwrap_or_default())
    }

    /// Settings as a file configuration, ready to be saved.
    #[must_use]
    pub fn to_config(&self) -> Config {
        Config {
            server: Some(self.server.clone()),
            token: self.token.clone(),
        }
    }
}
