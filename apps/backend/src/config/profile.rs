//! Profile configuration: which database to talk to and through which backend.
//!
//! Profiles live in `config.json` inside the configuration directory
//! (`$AIIDA_PATH`, falling back to `$HOME/.aiida`). The file maps profile
//! names to connection settings and maps process names (`verdi`, `daemon`)
//! to their default profile.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use db_infra::db::{DbEngine, DbSettings};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::backends::BackendKind;
use crate::error::BackendError;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_PROCESS: &str = "verdi";
const CONFIG_DIR_ENV: &str = "AIIDA_PATH";
const DEFAULT_CONFIG_DIR: &str = ".aiida";

/// Older profiles predate the backend choice and always used django.
fn default_backend() -> String {
    BackendKind::Django.as_str().to_string()
}

/// Ports appear both as `"5432"` and as `5432` in existing files.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(rename = "AIIDADB_BACKEND", default = "default_backend")]
    pub backend: String,
    #[serde(rename = "AIIDADB_ENGINE")]
    pub engine: String,
    #[serde(rename = "AIIDADB_HOST", default)]
    pub host: String,
    #[serde(rename = "AIIDADB_PORT", default, deserialize_with = "string_or_number")]
    pub port: String,
    #[serde(rename = "AIIDADB_NAME")]
    pub name: String,
    #[serde(rename = "AIIDADB_USER", default)]
    pub user: String,
    #[serde(rename = "AIIDADB_PASS", default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_user_email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub default_profiles: BTreeMap<String, String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
}

/// A profile selected for one environment load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub config: ProfileConfig,
}

impl Profile {
    /// The configured backend, or a configuration error for unknown names.
    pub fn backend_kind(&self) -> Result<BackendKind, BackendError> {
        self.config.backend.parse()
    }

    pub fn db_settings(&self) -> Result<DbSettings, BackendError> {
        let engine: DbEngine = self.config.engine.parse()?;
        Ok(DbSettings {
            engine,
            host: self.config.host.clone(),
            port: self.config.port.clone(),
            name: self.config.name.clone(),
            user: self.config.user.clone(),
            password: self.config.password.clone(),
        })
    }

    pub fn default_user_email(&self) -> Option<&str> {
        self.config
            .default_user_email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
    }
}

impl Config {
    pub fn from_json(raw: &str) -> Result<Self, BackendError> {
        serde_json::from_str(raw)
            .map_err(|e| BackendError::config(format!("Invalid configuration file: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, BackendError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            BackendError::config(format!(
                "Unable to read configuration file {}: {e}",
                path.display()
            ))
        })?;
        debug!(path = %path.display(), "configuration loaded");
        Self::from_json(&raw)
    }

    /// Load `config.json` from the configuration directory.
    pub fn from_env() -> Result<Self, BackendError> {
        Self::load(&config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Pick the profile to use.
    ///
    /// An explicit name wins. Otherwise the default profile for `process`
    /// (`verdi` when not given) is used, and failing that the single
    /// configured profile.
    pub fn resolve(
        &self,
        process: Option<&str>,
        profile: Option<&str>,
    ) -> Result<Profile, BackendError> {
        let process = process.unwrap_or(DEFAULT_PROCESS);

        let name = match profile {
            Some(name) => name.to_string(),
            None => match self.default_profiles.get(process) {
                Some(name) => name.clone(),
                None if self.profiles.len() == 1 => {
                    self.profiles.keys().next().cloned().unwrap_or_default()
                }
                None => {
                    return Err(BackendError::config(format!(
                        "No profile specified and no default profile configured for process '{process}'"
                    )));
                }
            },
        };

        let config = self.profiles.get(&name).cloned().ok_or_else(|| {
            BackendError::config(format!("Profile '{name}' is not configured"))
        })?;
        Ok(Profile { name, config })
    }
}

/// Directory holding `config.json`.
pub fn config_dir() -> Result<PathBuf, BackendError> {
    if let Ok(dir) = env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let home = env::var("HOME").map_err(|_| {
        BackendError::config(format!(
            "Neither '{CONFIG_DIR_ENV}' nor 'HOME' is set; cannot locate configuration"
        ))
    })?;
    Ok(PathBuf::from(home).join(DEFAULT_CONFIG_DIR))
}
