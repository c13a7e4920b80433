// Engine configuration

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Prefix of the environment variables read by [`EngineConfig::from_env`].
pub const ENV_PREFIX: &str = "SIEVE";

/// Engine-wide settings.
///
/// Loadable from TOML:
///
/// ```
/// use sieve_core::EngineConfig;
///
/// let config = EngineConfig::from_toml_str(r#"
///     lookup_timeout_ms = 250
///     log_collaborator_errors = false
/// "#).unwrap();
/// assert_eq!(config.lookup_timeout().as_millis(), 250);
/// assert_eq!(config.execute_timeout_ms, 30_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Time a blocking lookup may take when the call has no deadline
    pub lookup_timeout_ms: u64,
    /// Whole-call limit of the async entrypoint
    pub execute_timeout_ms: u64,
    /// Emit a `warn` event for each collaborator error
    pub log_collaborator_errors: bool,
    /// Emit a `trace` event per field and match
    pub trace_fields: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: 5_000,
            execute_timeout_ms: 30_000,
            log_collaborator_errors: true,
            trace_fields: false,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_execute_timeout(mut self, timeout: Duration) -> Self {
        self.execute_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_collaborator_logging(mut self, enabled: bool) -> Self {
        self.log_collaborator_errors = enabled;
        self
    }

    pub fn with_field_tracing(mut self, enabled: bool) -> Self {
        self.trace_fields = enabled;
        self
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn execute_timeout(&self) -> Duration {
        Duration::from_millis(self.execute_timeout_ms)
    }

    /// Defaults overridden by `SIEVE_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_vars(env::vars())
    }

    /// Defaults overridden by `SIEVE_*` entries of `vars`.
    ///
    /// Unknown `SIEVE_*` keys are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        let prefix = format!("{}_", ENV_PREFIX);

        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(&prefix) else {
                continue;
            };
            let value = value.as_ref().trim();
            match name.to_lowercase().as_str() {
                "lookup_timeout_ms" => config.lookup_timeout_ms = parse_number(name, value)?,
                "execute_timeout_ms" => config.execute_timeout_ms = parse_number(name, value)?,
                "log_collaborator_errors" => {
                    config.log_collaborator_errors = parse_flag(name, value)?
                }
                "trace_fields" => config.trace_fields = parse_flag(name, value)?,
                _ => {}
            }
        }

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content)
            .map_err(|e| ConfigError::InvalidEngineConfig(format!("TOML parse error: {}", e)))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidEngineConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}

fn parse_number(name: &str, value: &str) -> ConfigResult<u64> {
    value.parse().map_err(|_| {
        ConfigError::InvalidEngineConfig(format!("{}_{} must be an integer", ENV_PREFIX, name))
    })
}

fn parse_flag(name: &str, value: &str) -> ConfigResult<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEngineConfig(format!(
            "{}_{} must be a boolean",
            ENV_PREFIX, name
        ))),
    }
}
