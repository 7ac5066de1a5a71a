//! Resolver and parameter store configuration
//!
//! Both configs deserialize with serde so hosts can embed them in their own
//! config files, and both can be read from the environment.

use std::env;
use std::ffi::OsString;
use std::time::Duration;

use serde::Deserialize;

use crate::parameters::EmptyValues;

/// Default path when the caller passes none
pub const ENV_PARAMETERS_PATH: &str = "SSM_PARAMETERS_PATH";
/// Older name for the default path, read when `SSM_PARAMETERS_PATH` is unset
pub const ENV_SECRETS_PATH: &str = "SSM_SECRETS_PATH";
/// Cache TTL in seconds, 0 keeps entries forever
pub const ENV_CACHE_TTL_SECS: &str = "SSM_CACHE_TTL_SECS";
/// `1`/`true` makes strict lookups treat empty values as missing
pub const ENV_REJECT_EMPTY_VALUES: &str = "SSM_REJECT_EMPTY_VALUES";

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not valid unicode: {value:?}")]
    NotUnicode { name: &'static str, value: OsString },

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Settings for a [`ResolverCache`](crate::ResolverCache)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Path used when a call does not name one
    pub default_path: Option<String>,
    /// How long a fetched path stays fresh, None or zero keeps it forever
    #[serde(rename = "ttl_secs", deserialize_with = "deserialize_ttl_secs")]
    pub ttl: Option<Duration>,
    /// Strict lookup policy for empty values
    pub empty_values: EmptyValues,
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_path(mut self, path: impl Into<String>) -> Self {
        self.default_path = Some(path.into());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_empty_values(mut self, empty_values: EmptyValues) -> Self {
        self.empty_values = empty_values;
        self
    }

    /// TTL with zero folded into "never expires"
    pub fn effective_ttl(&self) -> Option<Duration> {
        self.ttl.filter(|ttl| !ttl.is_zero())
    }

    /// Read the configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let default_path = match env_string(ENV_PARAMETERS_PATH)? {
            Some(path) => Some(path),
            None => env_string(ENV_SECRETS_PATH)?,
        };

        let ttl = env_string(ENV_CACHE_TTL_SECS)?
            .map(|value| parse_secs(ENV_CACHE_TTL_SECS, &value))
            .transpose()?;

        let empty_values = match env_string(ENV_REJECT_EMPTY_VALUES)? {
            Some(value) if parse_flag(ENV_REJECT_EMPTY_VALUES, &value)? => EmptyValues::Reject,
            _ => EmptyValues::Allow,
        };

        Ok(Self {
            default_path,
            ttl,
            empty_values,
        })
    }
}

/// Overrides for the SSM client
///
/// Unset fields fall back to the ambient AWS configuration chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SsmConfig {
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// Retries after the first failed attempt, for retryable errors only
    pub max_retries: u32,
}

impl Default for SsmConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            max_retries: 3,
        }
    }
}

impl SsmConfig {
    /// Read the overrides from `SSM_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self {
            region: env_string("SSM_REGION")?,
            endpoint_url: env_string("SSM_ENDPOINT_URL")?,
            access_key_id: env_string("SSM_ACCESS_KEY_ID")?,
            secret_access_key: env_string("SSM_SECRET_ACCESS_KEY")?,
            session_token: env_string("SSM_SESSION_TOKEN")?,
            ..Self::default()
        };
        if let Some(value) = env_string("SSM_MAX_RETRIES")? {
            config.max_retries = value.parse().map_err(|_| ConfigError::Invalid {
                name: "SSM_MAX_RETRIES",
                value,
            })?;
        }
        Ok(config)
    }

    /// Static credentials, if both halves of the key pair are set
    pub fn static_credentials(&self) -> Option<(&str, &str, Option<&str>)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => {
                Some((id.as_str(), secret.as_str(), self.session_token.as_deref()))
            }
            _ => None,
        }
    }
}

/// Read a non-empty environment variable as unicode
fn env_string(name: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var_os(name) {
        None => Ok(None),
        Some(value) if value.is_empty() => Ok(None),
        Some(value) => value
            .into_string()
            .map(Some)
            .map_err(|value| ConfigError::NotUnicode { name, value }),
    }
}

fn parse_secs(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::Invalid {
            name,
            value: value.to_string(),
        })
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
    }
}

fn deserialize_ttl_secs<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs: Option<u64> = Option::deserialize(deserializer)?;
    Ok(secs.map(Duration::from_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_resolver_config() {
        let json = r#"{
            "default_path": "/service/prod",
            "ttl_secs": 300,
            "empty_values": "reject"
        }"#;
        let config: ResolverConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.default_path.as_deref(), Some("/service/prod"));
        assert_eq!(config.ttl, Some(Duration::from_secs(300)));
        assert_eq!(config.empty_values, EmptyValues::Reject);
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: ResolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.default_path, None);
        assert_eq!(config.effective_ttl(), None);
        assert_eq!(config.empty_values, EmptyValues::Allow);

        let ssm: SsmConfig = serde_json::from_str(r#"{"region": "eu-west-1"}"#).unwrap();
        assert_eq!(ssm.region.as_deref(), Some("eu-west-1"));
        assert_eq!(ssm.max_retries, 3);
        assert!(ssm.static_credentials().is_none());
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let config = ResolverConfig::new().with_ttl(Duration::ZERO);
        assert_eq!(config.effective_ttl(), None);

        let config = ResolverConfig::new().with_ttl(Duration::from_millis(10));
        assert_eq!(config.effective_ttl(), Some(Duration::from_millis(10)));
    }

    #[test]
    fn test_static_credentials() {
        let config = SsmConfig {
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
            ..SsmConfig::default()
        };
        assert_eq!(
            config.static_credentials(),
            Some(("AKIDEXAMPLE", "secret", None))
        );
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_secs("TTL", " 60 ").unwrap(), Duration::from_secs(60));
        assert!(parse_secs("TTL", "soon").is_err());
        assert!(parse_flag("FLAG", "TRUE").unwrap());
        assert!(!parse_flag("FLAG", "0").unwrap());
        assert!(parse_flag("FLAG", "maybe").is_err());
    }
}
