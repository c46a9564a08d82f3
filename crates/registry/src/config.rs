//! Registry configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! ## Storage
//! - `STORE_DATA_FILE` - Snapshot file used by the CLI (default: store-data.json)
//! - `STORE_ALLOCATION_ATTEMPTS` - Code allocation attempts per insert, 1-10 (default: 3)
//!
//! ## Behavior
//! - `STORE_AUTO_GENERATE_CODES` - Generate segments and codes (default: true)
//! - `STORE_ALLOW_MANUAL_OVERRIDE` - Keep caller-supplied codes (default: false)
//! - `STORE_ENFORCE_UNIQUE_CODES` - Reject duplicate codes (default: true)
//! - `STORE_HIERARCHY_VALIDATION` - Enforce parent types (default: true)
//!
//! ## Naming (per level: WAREHOUSE, ZONE, RACK, SHELF, BIN)
//! - `STORE_<LEVEL>_PATTERN` - Numeric, Alphabetic or Roman Numerals
//! - `STORE_<LEVEL>_PREFIX` - Segment prefix (may be empty)
//!
//! ## Logging
//! - `LOG_FORMAT` - `json` for JSON log lines, text otherwise

use std::path::PathBuf;

use thiserror::Error;

use tech_store_core::{NamingLevel, NamingPattern};

use crate::models::{BehaviorFlags, NamingConfig, StoreSettings};

const DEFAULT_DATA_FILE: &str = "store-data.json";
const DEFAULT_ALLOCATION_ATTEMPTS: u8 = 3;
const MAX_ALLOCATION_ATTEMPTS: u8 = 10;
const MAX_PREFIX_LENGTH: usize = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Registry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Snapshot file read and written by the CLI
    pub data_file: PathBuf,
    /// Naming used when bootstrapping a fresh store
    pub naming: NamingConfig,
    /// Behavior flags used when bootstrapping a fresh store
    pub behavior: BehaviorFlags,
    /// Allocation attempts before giving up on a contended parent scope
    pub allocation_attempts: u8,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            naming: NamingConfig::default(),
            behavior: BehaviorFlags::default(),
            allocation_attempts: DEFAULT_ALLOCATION_ATTEMPTS,
            log_json: false,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let data_file = env
            .get("STORE_DATA_FILE")
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_FILE), PathBuf::from);

        let behavior = BehaviorFlags {
            auto_generate_enabled: env.bool_or("STORE_AUTO_GENERATE_CODES", true)?,
            allow_manual_override: env.bool_or("STORE_ALLOW_MANUAL_OVERRIDE", false)?,
            enforce_unique_codes: env.bool_or("STORE_ENFORCE_UNIQUE_CODES", true)?,
            enable_hierarchy_validation: env.bool_or("STORE_HIERARCHY_VALIDATION", true)?,
        };

        let mut naming = NamingConfig::default();
        for level in NamingLevel::ALL {
            let pattern_key = format!("STORE_{}_PATTERN", level.env_key());
            if let Some(raw) = env.get(&pattern_key) {
                naming.level_mut(level).pattern = raw
                    .parse::<NamingPattern>()
                    .map_err(|e| ConfigError::InvalidEnvVar(pattern_key, e))?;
            }

            let prefix_key = format!("STORE_{}_PREFIX", level.env_key());
            if let Some(raw) = env.raw(&prefix_key) {
                naming.level_mut(level).prefix = parse_prefix(&prefix_key, &raw)?;
            }
        }

        let allocation_attempts = match env.get("STORE_ALLOCATION_ATTEMPTS") {
            None => DEFAULT_ALLOCATION_ATTEMPTS,
            Some(raw) => parse_attempts(&raw)?,
        };

        let log_json = env
            .get("LOG_FORMAT")
            .is_some_and(|format| format.eq_ignore_ascii_case("json"));

        Ok(Self {
            data_file,
            naming,
            behavior,
            allocation_attempts,
            log_json,
        })
    }

    /// The settings singleton for a fresh store.
    #[must_use]
    pub fn initial_settings(&self) -> StoreSettings {
        StoreSettings {
            naming: self.naming.clone(),
            behavior: self.behavior,
            stats: crate::models::SystemStats::default(),
        }
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Value as set, including empty strings.
    fn raw(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    /// Trimmed value; unset and blank are treated alike.
    fn get(&self, key: &str) -> Option<String> {
        self.raw(key)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn bool_or(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        self.get(key).map_or(Ok(default), |raw| parse_bool(key, &raw))
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got {raw}"),
        )),
    }
}

fn parse_prefix(key: &str, raw: &str) -> Result<String, ConfigError> {
    let prefix = raw.trim();
    if prefix.chars().count() > MAX_PREFIX_LENGTH {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("prefix must be at most {MAX_PREFIX_LENGTH} characters"),
        ));
    }
    if prefix.contains(tech_store_core::CODE_SEPARATOR) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "prefix cannot contain the code separator".to_string(),
        ));
    }
    Ok(prefix.to_owned())
}

fn parse_attempts(raw: &str) -> Result<u8, ConfigError> {
    let key = "STORE_ALLOCATION_ATTEMPTS";
    let attempts = raw
        .parse::<u8>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(1..=MAX_ALLOCATION_ATTEMPTS).contains(&attempts) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 1 and {MAX_ALLOCATION_ATTEMPTS}"),
        ));
    }
    Ok(attempts)
}
