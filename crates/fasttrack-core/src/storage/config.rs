//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default fast length
//! - Log API endpoint and session token
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, Result};

/// Overrides `api.token` when set.
pub const TOKEN_ENV: &str = "FASTTRACK_API_TOKEN";

/// Fasting preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastingConfig {
    #[serde(default = "default_limit_hours")]
    pub default_limit_hours: u32,
}

/// Log API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token; empty means signed out.
    #[serde(default)]
    pub token: String,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fasting: FastingConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

fn default_limit_hours() -> u32 {
    16
}
fn default_base_url() -> String {
    "http://localhost:8000/api".into()
}

impl Default for FastingConfig {
    fn default() -> Self {
        Self {
            default_limit_hours: default_limit_hours(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent) = parent {
            for part in parent.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }

        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;
        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                let n = value
                    .parse::<u64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                serde_json::Value::Number(n.into())
            }
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                return Err(unknown());
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// Location of `config.toml`.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json)?;
        updated.validate()?;
        *self = updated;
        self.save()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fasting.default_limit_hours == 0 {
            return Err(ConfigError::InvalidValue {
                key: "fasting.default_limit_hours".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Default target fast in seconds.
    pub fn default_limit_secs(&self) -> u64 {
        u64::from(self.fasting.default_limit_hours) * 3600
    }

    /// Session token, preferring the environment.
    pub fn api_token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| Some(self.api.token.clone()).filter(|t| !t.is_empty()))
    }

    /// Copy safe to print: a stored token is masked.
    pub fn redacted(&self) -> Self {
        let mut shown = self.clone();
        if !shown.api.token.is_empty() {
            shown.api.token = "<redacted>".into();
        }
        shown
    }

    /// Forget the stored session token.
    pub fn sign_out(&mut self) -> Result<()> {
        self.api.token.clear();
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.fasting.default_limit_hours, 16);
        assert_eq!(parsed.api.base_url, "http://localhost:8000/api");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[api]\ntoken = \"abc\"\n").unwrap();
        assert_eq!(parsed.api.token, "abc");
        assert_eq!(parsed.api.base_url, "http://localhost:8000/api");
        assert_eq!(parsed.default_limit_secs(), 57_600);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("fasting.default_limit_hours").as_deref(), Some("16"));
        assert_eq!(
            cfg.get("api.base_url").as_deref(),
            Some("http://localhost:8000/api")
        );
        assert!(cfg.get("api.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "fasting.default_limit_hours", "18").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "fasting.default_limit_hours").unwrap(),
            &serde_json::Value::Number(18.into())
        );
    }

    #[test]
    fn set_json_value_by_path_updates_nested_string() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "api.base_url", "https://coach.example").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "api.base_url").unwrap(),
            &serde_json::Value::String("https://coach.example".to_string())
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "api.nonexistent_key", "value");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
        let result = Config::set_json_value_by_path(&mut json, "api", "value");
        assert!(result.is_err());
    }

    #[test]
    fn set_json_value_by_path_rejects_invalid_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result =
            Config::set_json_value_by_path(&mut json, "fasting.default_limit_hours", "sixteen");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn redacted_masks_only_a_set_token() {
        let mut cfg = Config::default();
        assert_eq!(cfg.redacted().api.token, "");

        cfg.api.token = "secret".into();
        let shown = cfg.redacted();
        assert_eq!(shown.api.token, "<redacted>");
        assert_eq!(shown.api.base_url, cfg.api.base_url);
        assert_eq!(cfg.api.token, "secret");
    }

    #[test]
    fn zero_limit_fails_validation() {
        let mut cfg = Config::default();
        cfg.fasting.default_limit_hours = 0;
        assert!(cfg.validate().is_err());
    }
}
