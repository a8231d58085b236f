use std::path::Path;

use anyhow::{Context, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use org_directory::auth::ApiKeyGuard;
use org_directory::config::OrgDirectoryConfig;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Prefix of environment variables merged over the YAML file.
/// Nested keys are separated by `__`, e.g. `ORGDIR_DIRECTORY__PHONE_REGION`.
pub const ENV_PREFIX: &str = "ORGDIR_";

/// Effective configuration of the `orgdir` binary.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Key every query must present. Required unless `auth.disabled` is set.
    #[serde(default)]
    pub api_key: Option<SecretString>,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub directory: OrgDirectoryConfig,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Runs queries without checking any key.
    #[serde(default)]
    pub disabled: bool,
}

impl AuthConfig {
    /// Guard for the configured key, `None` when checks are disabled.
    ///
    /// # Errors
    /// Fails when checks are enabled and no `api_key` is configured.
    pub fn guard(self, api_key: Option<SecretString>) -> anyhow::Result<Option<ApiKeyGuard>> {
        if self.disabled {
            return Ok(None);
        }
        api_key
            .map(ApiKeyGuard::new)
            .map(Some)
            .context("api_key is not configured (set it, or opt out with `auth.disabled: true`)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `org_directory=debug,sea_orm=warn`.
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl AppConfig {
    /// Layered load: defaults, then the YAML file, then `ORGDIR_*`
    /// environment variables, then command-line overrides.
    ///
    /// # Errors
    /// Fails when the file does not exist or a layer does not fit the schema.
    pub fn load(path: Option<&Path>, verbose: u8) -> anyhow::Result<Self> {
        // A storage section given without `kind` means the database store.
        let mut figment =
            Figment::new().merge(Serialized::default("directory.storage.kind", "database"));

        if let Some(path) = path {
            if !path.is_file() {
                bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        if let Some(level) = verbosity_level(verbose) {
            figment = figment.merge(Serialized::default("logging.level", level));
        }

        figment
            .extract()
            .context("failed to load configuration")
    }

    /// Configuration as printed by `--print-config`, with the key hidden.
    #[must_use]
    pub fn redacted(&self) -> serde_json::Value {
        serde_json::json!({
            "api_key": self.api_key.as_ref().map(|_| "[REDACTED]"),
            "auth": self.auth,
            "logging": self.logging,
            "directory": self.directory,
        })
    }
}

fn verbosity_level(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

fn default_level() -> String {
    "warn".to_owned()
}
