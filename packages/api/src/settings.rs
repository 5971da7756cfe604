//! # Settings: where the gateway points and how confirmations are treated
//!
//! Layered with the `config` crate, later sources winning:
//!
//! 1. code defaults,
//! 2. an optional `directory.toml` in the working directory,
//! 3. environment variables prefixed `DIRECTORY_`, nested keys separated by `__`
//!    (after `.env` has been loaded through `dotenvy`).
//!
//! ```toml
//! [gateway]
//! base_url = "https://jsonplaceholder.typicode.com"
//! timeout_secs = 10        # omit for no client-side timeout
//!
//! [sync]
//! policy = "fire_and_forget"   # or "revert_on_failure"
//! ```
//!
//! `DIRECTORY_GATEWAY__BASE_URL=http://localhost:3000` overrides the base URL.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Remote endpoint settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GatewaySettings {
    pub base_url: String,
    /// Client-side request timeout. `None` leaves requests unbounded.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: None,
        }
    }
}

/// What happens to an optimistic change when its confirmation fails.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmPolicy {
    /// Log the failure and keep the local change.
    #[default]
    FireAndForget,
    /// Log the failure and restore the record as it was before the change.
    RevertOnFailure,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SyncSettings {
    #[serde(default)]
    pub policy: ConfirmPolicy,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub sync: SyncSettings,
}

impl Settings {
    /// The well-known settings filename.
    pub fn filename() -> &'static str {
        "directory.toml"
    }

    /// Load defaults, `directory.toml` and `DIRECTORY_*` environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        defaults()?
            .add_source(
                File::with_name(Self::filename())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("DIRECTORY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Parse settings from a TOML string on top of the defaults.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        defaults()?
            .add_source(File::from_str(s, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("gateway.base_url", DEFAULT_BASE_URL)?
        .set_default("sync.policy", "fire_and_forget")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::set_var;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.gateway.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.gateway.timeout_secs, None);
        assert_eq!(settings.sync.policy, ConfirmPolicy::FireAndForget);
    }

    #[test]
    fn test_from_toml() {
        let settings = Settings::from_toml(
            r#"
            [gateway]
            base_url = "http://localhost:3000"
            timeout_secs = 10

            [sync]
            policy = "revert_on_failure"
            "#,
        )
        .unwrap();
        assert_eq!(settings.gateway.base_url, "http://localhost:3000");
        assert_eq!(settings.gateway.timeout_secs, Some(10));
        assert_eq!(settings.sync.policy, ConfirmPolicy::RevertOnFailure);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        assert!(Settings::from_toml("[sync]\npolicy = \"retry\"").is_err());
    }

    #[test]
    fn test_environment_overrides() {
        set_var("DIRECTORY_GATEWAY__BASE_URL", "http://localhost:4000");
        let settings = Settings::new().unwrap();
        assert_eq!(settings.gateway.base_url, "http://localhost:4000");
    }
}
