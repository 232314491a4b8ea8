//! Configuration management for modelgate
//!
//! Parses TOML configuration files, layers environment overrides on top and
//! provides typed access to settings.

use crate::error::{AppError, AppResult};
use crate::models::PinnedModels;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Public gateway endpoint root
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
/// Value shipped in `.env` templates; never a real key
pub const PLACEHOLDER_API_KEY: &str = "your_openrouter_key";
/// Upper bound for any configured timeout
pub const MAX_TIMEOUT_SECONDS: u64 = 600;

pub const ENV_BASE_URL: &str = "OPENROUTER_BASE_URL";
pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_REFERER: &str = "APP_URL";
pub const ENV_APP_NAME: &str = "APP_NAME";
pub const ENV_REASONING_MODEL: &str = "OPENROUTER_REASONING_MODEL";
pub const ENV_DEFAULT_MODEL: &str = "OPENROUTER_DEFAULT_MODEL";

/// Root configuration structure
///
/// Every section is optional; `Config::default()` targets the public gateway
/// with no credential.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Pinned model overrides, one per mode
    #[serde(default)]
    pub models: PinnedModels,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// API credential for the gateway
///
/// `Debug` never prints the secret.
///
/// Surrounding whitespace is stripped on construction.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        let secret: String = secret.into();
        Self(secret.trim().to_string())
    }

    /// The raw secret, for building the Authorization header
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Blank keys and the template placeholder count as missing
    pub fn is_usable(&self) -> bool {
        !self.0.is_empty() && self.0 != PLACEHOLDER_API_KEY
    }
}

impl From<String> for Credential {
    fn from(secret: String) -> Self {
        Self::new(secret)
    }
}

impl From<Credential> for String {
    fn from(credential: Credential) -> Self {
        credential.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Gateway connection settings
///
/// Fields are private; they are populated by deserialization and environment
/// overrides, then checked by `Config::validate()`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default, skip_serializing)]
    api_key: Option<Credential>,
    /// Sent upstream as `HTTP-Referer`
    #[serde(default = "default_referer")]
    referer: String,
    /// Sent upstream as `X-Title`
    #[serde(default = "default_app_name")]
    app_name: String,
}

impl GatewayConfig {
    /// Gateway endpoint root, without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// The configured credential, only if it is usable
    pub fn api_key(&self) -> Option<&Credential> {
        self.api_key.as_ref().filter(|key| key.is_usable())
    }

    pub fn referer(&self) -> &str {
        &self.referer
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            referer: default_referer(),
            app_name: default_app_name(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_referer() -> String {
    "http://localhost".to_string()
}

fn default_app_name() -> String {
    "modelgate".to_string()
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Per-operation timeouts in seconds
///
/// Validated at deserialization time: each value must be in
/// `(0, MAX_TIMEOUT_SECONDS]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutsConfig {
    /// Timeout for `GET /models`
    catalog: u64,
    /// Timeout for `POST /chat/completions`
    completion: u64,
}

const DEFAULT_CATALOG_TIMEOUT: u64 = 30;
const DEFAULT_COMPLETION_TIMEOUT: u64 = 60;

impl TimeoutsConfig {
    /// Create a new TimeoutsConfig with validated timeout values
    ///
    /// # Errors
    ///
    /// Returns an error if any timeout is zero or exceeds `MAX_TIMEOUT_SECONDS`.
    pub fn new(catalog: u64, completion: u64) -> AppResult<Self> {
        Self::check(catalog, completion).map_err(AppError::Config)?;
        Ok(Self {
            catalog,
            completion,
        })
    }

    fn check(catalog: u64, completion: u64) -> Result<(), String> {
        for (name, timeout) in [("catalog", catalog), ("completion", completion)] {
            if timeout == 0 {
                return Err(format!(
                    "timeouts.{} must be greater than 0, got {}",
                    name, timeout
                ));
            }
            if timeout > MAX_TIMEOUT_SECONDS {
                return Err(format!(
                    "timeouts.{} cannot exceed {} seconds, got {}",
                    name, MAX_TIMEOUT_SECONDS, timeout
                ));
            }
        }
        Ok(())
    }

    pub fn catalog_seconds(&self) -> u64 {
        self.catalog
    }

    pub fn completion_seconds(&self) -> u64 {
        self.completion
    }

    pub fn catalog(&self) -> Duration {
        Duration::from_secs(self.catalog)
    }

    pub fn completion(&self) -> Duration {
        Duration::from_secs(self.completion)
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            catalog: DEFAULT_CATALOG_TIMEOUT,
            completion: DEFAULT_COMPLETION_TIMEOUT,
        }
    }
}

/// Custom Deserialize implementation for TimeoutsConfig
///
/// Routes through the validated `new()` constructor so an out-of-range
/// timeout never exists as a value.
impl<'de> Deserialize<'de> for TimeoutsConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, MapAccess, Visitor};

        #[derive(Deserialize)]
        #[serde(field_identifier, rename_all = "lowercase")]
        enum Field {
            Catalog,
            Completion,
        }

        struct TimeoutsConfigVisitor;

        impl<'de> Visitor<'de> for TimeoutsConfigVisitor {
            type Value = TimeoutsConfig;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a struct with optional timeout fields (catalog, completion)")
            }

            fn visit_map<V>(self, mut map: V) -> Result<TimeoutsConfig, V::Error>
            where
                V: MapAccess<'de>,
            {
                let mut catalog = None;
                let mut completion = None;

                while let Some(key) = map.next_key()? {
                    match key {
                        Field::Catalog => {
                            if catalog.is_some() {
                                return Err(de::Error::duplicate_field("catalog"));
                            }
                            catalog = Some(map.next_value()?);
                        }
                        Field::Completion => {
                            if completion.is_some() {
                                return Err(de::Error::duplicate_field("completion"));
                            }
                            completion = Some(map.next_value()?);
                        }
                    }
                }

                let catalog = catalog.unwrap_or(DEFAULT_CATALOG_TIMEOUT);
                let completion = completion.unwrap_or(DEFAULT_COMPLETION_TIMEOUT);
                TimeoutsConfig::check(catalog, completion).map_err(|reason| {
                    de::Error::custom(format!("Invalid timeout configuration: {}", reason))
                })?;
                Ok(TimeoutsConfig {
                    catalog,
                    completion,
                })
            }
        }

        deserializer.deserialize_struct(
            "TimeoutsConfig",
            &["catalog", "completion"],
            TimeoutsConfigVisitor,
        )
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            })?;

        let config: Self = toml::from_str(&content).map_err(|source| {
            AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            }
        })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults, then apply
    /// environment overrides and validate the result
    pub fn load<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let mut config = if path.as_ref().exists() {
            Self::from_file(path.as_ref())?
        } else {
            tracing::debug!(
                path = %path.as_ref().display(),
                "Config file not found, using defaults"
            );
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    ///
    /// Blank values are ignored so an empty `OPENROUTER_DEFAULT_MODEL=` does
    /// not clear a value set in the file.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = get(ENV_BASE_URL) {
            self.gateway.base_url = base_url;
        }
        if let Some(api_key) = get(ENV_API_KEY) {
            self.gateway.api_key = Some(Credential::new(api_key));
        }
        if let Some(referer) = get(ENV_REFERER) {
            self.gateway.referer = referer;
        }
        if let Some(app_name) = get(ENV_APP_NAME) {
            self.gateway.app_name = app_name;
        }
        if let Some(model) = get(ENV_REASONING_MODEL) {
            self.models.reasoning = Some(model);
        }
        if let Some(model) = get(ENV_DEFAULT_MODEL) {
            self.models.default = Some(model);
        }
    }

    /// Replace the credential
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.gateway.api_key = Some(Credential::new(api_key));
        self
    }

    /// Replace the gateway endpoint root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.gateway.base_url = base_url.into();
        self
    }

    /// Replace the timeouts
    pub fn with_timeouts(mut self, timeouts: TimeoutsConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Validate configuration after parsing
    ///
    /// The credential is not required here. A missing one fails each gateway
    /// call with a configuration error.
    pub fn validate(&self) -> AppResult<()> {
        let base_url = self.gateway.base_url();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "gateway.base_url '{}' must start with 'http://' or 'https://'",
                base_url
            )));
        }

        for (field, value) in [
            ("gateway.referer", &self.gateway.referer),
            ("gateway.app_name", &self.gateway.app_name),
        ] {
            if HeaderValue::from_str(value).is_err() {
                return Err(AppError::Config(format!(
                    "{} '{}' is not a valid HTTP header value",
                    field, value
                )));
            }
        }

        if let Some(key) = self.gateway.api_key()
            && HeaderValue::from_str(&format!("Bearer {}", key.expose())).is_err()
        {
            return Err(AppError::Config(
                "gateway.api_key contains characters not allowed in an HTTP header".to_string(),
            ));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    /// Parse and validate configuration from a TOML string
    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(toml_str).map_err(|source| {
            AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            }
        })?;
        config.validate()?;
        Ok(config)
    }
}
