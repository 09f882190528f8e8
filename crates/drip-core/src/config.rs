//! Configuration types for the drip content editor.
//!
//! Controls where the course backend lives, how the editor API is bound,
//! and which lesson membership policy the chain store enforces.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DripError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "drip.json";

/// Default base URL of the course backend.
fn default_backend_url() -> String {
    "http://localhost:8080/api".to_string()
}

/// Default timeout for backend requests in seconds.
const fn default_request_timeout() -> u32 {
    30
}

/// Default address for the editor API.
fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

/// Default port for the editor API.
const fn default_port() -> u16 {
    3000
}

/// Default prefix for titles synthesized for lessons missing from the inventory.
fn default_placeholder_title_prefix() -> String {
    "Lesson".to_string()
}

/// Main configuration for the drip editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the course backend (section, lesson, and drip services).
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Bearer token sent with every backend request, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Timeout for a single backend request in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u32,

    /// Address the editor API binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port the editor API listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether a lesson may appear in more than one chain.
    #[serde(default)]
    pub membership: MembershipPolicy,

    /// Prefix used when a loaded lesson has no inventory entry (`"Lesson 42"`).
    #[serde(default = "default_placeholder_title_prefix")]
    pub placeholder_title_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            api_token: None,
            request_timeout_secs: default_request_timeout(),
            bind_address: default_bind_address(),
            port: default_port(),
            membership: MembershipPolicy::default(),
            placeholder_title_prefix: default_placeholder_title_prefix(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `drip.json` in the current directory and falls back to
    /// defaults when it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            DripError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `drip.json` in a specific directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `DripError::ConfigParseError` if the file cannot be read or
    /// parsed, and `DripError::ConfigValidationError` if the values are invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(DripError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| DripError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// - `backendUrl` must be an `http://` or `https://` URL
    /// - `requestTimeoutSecs` must be greater than 0
    /// - `bindAddress` must not be empty
    /// - `placeholderTitlePrefix` must not be empty
    ///
    /// # Errors
    ///
    /// Returns `DripError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        let url = self.backend_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DripError::config_validation(
                format!("backendUrl must be an http(s) URL, got '{}'", self.backend_url),
                "Set backendUrl to something like 'https://example.com/api' in your drip.json",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(DripError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Set requestTimeoutSecs to at least 1 second in your drip.json",
            ));
        }

        if self.bind_address.trim().is_empty() {
            return Err(DripError::config_validation(
                "bindAddress must not be empty",
                "Set bindAddress to '127.0.0.1' or '0.0.0.0' in your drip.json",
            ));
        }

        if self.placeholder_title_prefix.trim().is_empty() {
            return Err(DripError::config_validation(
                "placeholderTitlePrefix must not be empty",
                "Remove placeholderTitlePrefix from your drip.json to use the default",
            ));
        }

        Ok(())
    }

    /// Returns the backend URL without a trailing slash.
    #[must_use]
    pub fn backend_base(&self) -> &str {
        self.backend_url.trim().trim_end_matches('/')
    }
}

/// Whether the chain store lets a lesson appear in more than one chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MembershipPolicy {
    /// Duplicates are only rejected within the destination chain (default).
    #[default]
    PerChain,
    /// A lesson belongs to at most one chain; inserting it elsewhere moves it.
    Exclusive,
}

impl MembershipPolicy {
    /// Parses a string into a `MembershipPolicy`, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "per_chain" | "per-chain" => Some(Self::PerChain),
            "exclusive" => Some(Self::Exclusive),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for MembershipPolicy {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid membership policy '{s}': expected one of 'per_chain', 'exclusive'"
            ))
        })
    }
}

impl Serialize for MembershipPolicy {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            Self::PerChain => "per_chain",
            Self::Exclusive => "exclusive",
        };
        serializer.serialize_str(s)
    }
}
