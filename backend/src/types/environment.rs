//! Environment configuration for different deployment stages

use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::Level;

use crate::sumsub::{Credentials, SUMSUB_BASE_URL};

/// Application environment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development | Self::Staging)
    }

    /// Whether logs are emitted as JSON (Datadog)
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development => Level::DEBUG,
            })
    }
}

/// Fatal configuration problems detected at startup
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

pub const DEFAULT_LEVEL_NAME: &str = "basic-kyc-level";
pub const DEFAULT_FIXED_COUNTRY: &str = "VNM";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PORT: u16 = 8080;

/// Sumsub integration settings, resolved once at startup and never mutated
#[derive(Clone, PartialEq, Eq)]
pub struct SumsubConfig {
    pub app_token: String,
    pub secret_key: String,
    /// Default verification level for new applicants and access tokens
    pub level_name: String,
    /// Public URL the provider delivers callbacks to
    pub webhook_endpoint: String,
    /// Dedicated callback secret; the secret key is used when unset
    pub webhook_secret: Option<String>,
    pub base_url: String,
    /// Country stamped on every created applicant
    pub fixed_country: String,
    /// Directory raw provider responses are dumped into, if any
    pub response_dump_dir: Option<String>,
    pub request_timeout: Duration,
    pub port: u16,
}

impl fmt::Debug for SumsubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SumsubConfig")
            .field("app_token", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("level_name", &self.level_name)
            .field("webhook_endpoint", &self.webhook_endpoint)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("base_url", &self.base_url)
            .field("fixed_country", &self.fixed_country)
            .field("response_dump_dir", &self.response_dump_dir)
            .field("request_timeout", &self.request_timeout)
            .field("port", &self.port)
            .finish()
    }
}

impl SumsubConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// does not parse
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing(name));
        let parsed = |name: &'static str, default| -> Result<u64, ConfigError> {
            optional(name).map_or(Ok(default), |value| {
                value
                    .parse()
                    .map_err(|_| ConfigError::Invalid { name, value })
            })
        };

        let port = parsed("PORT", u64::from(DEFAULT_PORT))?;
        let port = u16::try_from(port).map_err(|_| ConfigError::Invalid {
            name: "PORT",
            value: port.to_string(),
        })?;

        Ok(Self {
            app_token: required("SUMSUB_APP_TOKEN")?,
            secret_key: required("SUMSUB_SECRET_KEY")?,
            webhook_endpoint: required("SUMSUB_WEBHOOK_ENDPOINT")?,
            level_name: optional("SUMSUB_LEVEL_NAME")
                .unwrap_or_else(|| DEFAULT_LEVEL_NAME.to_string()),
            webhook_secret: optional("SUMSUB_WEBHOOK_SECRET"),
            base_url: optional("SUMSUB_BASE_URL").unwrap_or_else(|| SUMSUB_BASE_URL.to_string()),
            fixed_country: optional("KYC_FIXED_COUNTRY")
                .unwrap_or_else(|| DEFAULT_FIXED_COUNTRY.to_string()),
            response_dump_dir: optional("SUMSUB_RESPONSE_DUMP_DIR"),
            request_timeout: Duration::from_secs(parsed(
                "SUMSUB_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            port,
        })
    }

    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            app_token: self.app_token.clone(),
            secret_key: self.secret_key.clone(),
            level_name: self.level_name.clone(),
        }
    }

    /// Secret used to verify callback digests
    #[must_use]
    pub fn webhook_secret(&self) -> &str {
        self.webhook_secret.as_deref().unwrap_or(&self.secret_key)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SUMSUB_APP_TOKEN", "app-token"),
        ("SUMSUB_SECRET_KEY", "secret-key"),
        ("SUMSUB_WEBHOOK_ENDPOINT", "https://kyc.example.com/verify"),
    ];

    #[test]
    #[serial]
    fn test_environment_from_env() {
        // Test development (default)
        env::remove_var("APP_ENV");
        assert_eq!(Environment::from_env(), Environment::Development);

        env::set_var("APP_ENV", "development");
        assert_eq!(Environment::from_env(), Environment::Development);

        env::set_var("APP_ENV", " Staging ");
        assert_eq!(Environment::from_env(), Environment::Staging);

        env::set_var("APP_ENV", "production");
        assert_eq!(Environment::from_env(), Environment::Production);

        env::remove_var("APP_ENV");
    }

    #[test]
    #[serial]
    #[should_panic(expected = "Invalid environment: invalid")]
    fn test_invalid_environment() {
        env::set_var("APP_ENV", "invalid");
        let _ = Environment::from_env();
    }

    #[test]
    fn test_docs_and_log_format_per_environment() {
        assert!(Environment::Development.show_api_docs());
        assert!(Environment::Staging.show_api_docs());
        assert!(!Environment::Production.show_api_docs());

        assert!(Environment::Production.json_logs());
        assert!(!Environment::Development.json_logs());
    }

    #[test]
    fn test_defaults() {
        let config = SumsubConfig::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.app_token, "app-token");
        assert_eq!(config.secret_key, "secret-key");
        assert_eq!(config.webhook_endpoint, "https://kyc.example.com/verify");
        assert_eq!(config.level_name, DEFAULT_LEVEL_NAME);
        assert_eq!(config.base_url, SUMSUB_BASE_URL);
        assert_eq!(config.fixed_country, "VNM");
        assert_eq!(config.response_dump_dir, None);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("SUMSUB_LEVEL_NAME", "advanced-level"),
            ("SUMSUB_BASE_URL", "http://localhost:9000"),
            ("KYC_FIXED_COUNTRY", "DEU"),
            ("SUMSUB_RESPONSE_DUMP_DIR", "/tmp/dumps"),
            ("SUMSUB_REQUEST_TIMEOUT_SECS", "5"),
            ("PORT", "3000"),
        ]);

        let config = SumsubConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.level_name, "advanced-level");
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.fixed_country, "DEU");
        assert_eq!(config.response_dump_dir.as_deref(), Some("/tmp/dumps"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_missing_required_values() {
        for (missing, _) in REQUIRED {
            let vars: Vec<_> = REQUIRED.iter().copied().filter(|(k, _)| *k != missing).collect();
            assert_eq!(
                SumsubConfig::from_lookup(lookup(&vars)),
                Err(ConfigError::Missing(missing))
            );
        }
    }

    #[test]
    fn test_empty_required_value_is_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[1] = ("SUMSUB_SECRET_KEY", "  ");
        assert_eq!(
            SumsubConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Missing("SUMSUB_SECRET_KEY"))
        );
    }

    #[test]
    fn test_invalid_numbers() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "70000"));
        assert!(matches!(
            SumsubConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("SUMSUB_REQUEST_TIMEOUT_SECS", "soon"));
        assert!(matches!(
            SumsubConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid {
                name: "SUMSUB_REQUEST_TIMEOUT_SECS",
                ..
            })
        ));
    }

    #[test]
    fn test_webhook_secret_falls_back_to_secret_key() {
        let config = SumsubConfig::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.webhook_secret(), "secret-key");

        let mut vars = REQUIRED.to_vec();
        vars.push(("SUMSUB_WEBHOOK_SECRET", "callback-secret"));
        let config = SumsubConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.webhook_secret(), "callback-secret");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SUMSUB_WEBHOOK_SECRET", "callback-secret"));
        let config = SumsubConfig::from_lookup(lookup(&vars)).unwrap();

        let debug = format!("{config:?}");
        assert!(!debug.contains("app-token"));
        assert!(!debug.contains("secret-key"));
        assert!(!debug.contains("callback-secret"));
        assert!(debug.contains("basic-kyc-level"));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        for (k, v) in REQUIRED {
            env::set_var(k, v);
        }
        env::set_var("KYC_FIXED_COUNTRY", "FRA");

        let config = SumsubConfig::from_env().unwrap();
        assert_eq!(config.fixed_country, "FRA");
        assert_eq!(config.credentials().level_name, DEFAULT_LEVEL_NAME);

        for (k, _) in REQUIRED {
            env::remove_var(k);
        }
        env::remove_var("KYC_FIXED_COUNTRY");
    }
}
