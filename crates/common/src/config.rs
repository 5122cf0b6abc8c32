//! Test run configuration
//!
//! The configuration is a flat JSON object of string values (environment
//! URLs, credentials, currency codes). It is re-read on every call; nothing
//! is cached.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable that overrides the configuration path
pub const CONFIG_PATH_ENV: &str = "CEDAR_QA_CONFIG";

/// Default configuration path, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "Configuration/Configuration.json";

/// Well-known configuration keys
pub mod keys {
    pub const BASE_URL: &str = "base_Url";
    pub const ADMIN_APP_URL: &str = "AdminApp_url";
    pub const CLIENT_APP_URL: &str = "ClientApp_url";
    pub const CALENDAR_APP_URL: &str = "calendarApp_url";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const CLIENT_USERNAME: &str = "clientUsername";
    pub const CLIENT_PASSWORD: &str = "clientPassword";
    pub const CURRENCY_TO_SEND: &str = "currencyToSend";
    pub const YOU_ARE_PAYING: &str = "youArePaying";
}

/// Loaded configuration values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    values: BTreeMap<String, String>,
}

/// Resolve the configuration path from the environment or the default
pub fn default_config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Read the configuration from the default path
pub fn read_configuration() -> Result<Configuration> {
    Configuration::load(&default_config_path())
}

impl Configuration {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config = Self::from_json(&content).map_err(|e| match e {
            Error::Json(e) => Error::ConfigLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
            other => other,
        })?;
        tracing::debug!("Loaded {} configuration value(s) from {}", config.values.len(), path.display());
        Ok(config)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a configuration from key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Look up any key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Look up a key that must be present
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| Error::MissingConfigKey(key.to_string()))
    }

    pub fn base_url(&self) -> Result<&str> {
        self.require(keys::BASE_URL)
    }

    pub fn admin_app_url(&self) -> Result<&str> {
        self.require(keys::ADMIN_APP_URL)
    }

    pub fn client_app_url(&self) -> Result<&str> {
        self.require(keys::CLIENT_APP_URL)
    }

    pub fn calendar_app_url(&self) -> Result<&str> {
        self.require(keys::CALENDAR_APP_URL)
    }

    pub fn username(&self) -> Result<&str> {
        self.require(keys::USERNAME)
    }

    pub fn password(&self) -> Result<&str> {
        self.require(keys::PASSWORD)
    }

    pub fn client_username(&self) -> Result<&str> {
        self.require(keys::CLIENT_USERNAME)
    }

    pub fn client_password(&self) -> Result<&str> {
        self.require(keys::CLIENT_PASSWORD)
    }

    pub fn currency_to_send(&self) -> Result<&str> {
        self.require(keys::CURRENCY_TO_SEND)
    }

    pub fn you_are_paying(&self) -> Result<&str> {
        self.require(keys::YOU_ARE_PAYING)
    }

    /// Iterate over all keys and values in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Substitute `${key}` placeholders with configuration values.
    ///
    /// Placeholders naming an unknown key are left untouched.
    pub fn interpolate(&self, text: &str) -> String {
        self.interpolate_with(text, |_| None)
    }

    /// Like [`Configuration::interpolate`], consulting `extra` for keys the
    /// configuration does not define.
    pub fn interpolate_with<F>(&self, text: &str, mut extra: F) -> String
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let key = &after[..end];
                    match self.get(key).map(str::to_string).or_else(|| extra(key)) {
                        Some(value) => out.push_str(&value),
                        None => {
                            out.push_str("${");
                            out.push_str(key);
                            out.push('}');
                        }
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}
