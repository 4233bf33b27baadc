//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::settings::{BuildSettings, DEFAULT_STATE_TIMEOUT};

/// Default zone used when none is configured.
pub const DEFAULT_ZONE: &str = "us-central1-a";

/// Default base URL of the Compute Engine v1 REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://compute.googleapis.com/compute/v1";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// Compute Engine configuration derived from environment variables,
/// configuration files, and CLI flags.
#[derive(Clone, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "GCE",
    discovery(
        app_name = "gcebake",
        env_var = "GCEBAKE_CONFIG_PATH",
        config_file_name = "gcebake.toml",
        dotfile_name = ".gcebake.toml",
        project_file_name = "gcebake.toml"
    )
)]
pub struct GceConfig {
    /// Project that owns the build instance. This value is required.
    pub project_id: String,
    /// Zone the build instance is placed in. Defaults to `us-central1-a`.
    #[ortho_config(default = DEFAULT_ZONE.to_owned())]
    pub zone: String,
    /// Publish the private address instead of the NAT address, for builds
    /// that run inside the same VPC as the instance.
    #[ortho_config(default = false)]
    pub use_internal_ip: bool,
    /// Seconds to wait for the instance to reach `RUNNING`. Defaults to five
    /// minutes.
    #[ortho_config(default = DEFAULT_STATE_TIMEOUT.as_secs())]
    pub state_timeout_secs: u64,
    /// OAuth access token presented to the Compute Engine API, for example the
    /// output of `gcloud auth print-access-token`.
    pub access_token: Option<String>,
    /// Base URL of the Compute Engine REST API.
    #[ortho_config(default = DEFAULT_API_BASE_URL.to_owned())]
    pub api_base_url: String,
    /// Seconds between instance status polls.
    #[ortho_config(default = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,
}

impl std::fmt::Debug for GceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GceConfig")
            .field("project_id", &self.project_id)
            .field("zone", &self.zone)
            .field("use_internal_ip", &self.use_internal_ip)
            .field("state_timeout_secs", &self.state_timeout_secs)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .finish()
    }
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn guidance(&self) -> String {
        format!(
            "{}: set {} or add {} to [gce] in gcebake.toml",
            self.description, self.env_var, self.toml_key
        )
    }
}

impl GceConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}",
                metadata.guidance()
            )));
        }
        Ok(())
    }

    fn require_positive(value: u64, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::InvalidValue(format!(
                "{} must be greater than zero",
                metadata.guidance()
            )));
        }
        Ok(())
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("gcebake")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Returns the configured state timeout.
    #[must_use]
    pub const fn state_timeout(&self) -> Duration {
        Duration::from_secs(self.state_timeout_secs)
    }

    /// Returns the configured status poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Builds the per-run [`BuildSettings`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn as_settings(&self) -> Result<BuildSettings, ConfigError> {
        self.validate()?;
        BuildSettings::builder()
            .zone(&self.zone)
            .use_internal_ip(self.use_internal_ip)
            .state_timeout(self.state_timeout())
            .build()
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty and
    /// [`ConfigError::InvalidValue`] when a duration is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.project_id,
            &FieldMetadata::new("Compute Engine project ID", "GCE_PROJECT_ID", "project_id"),
        )?;
        Self::require_field(
            &self.zone,
            &FieldMetadata::new("zone", "GCE_ZONE", "zone"),
        )?;
        Self::require_field(
            &self.api_base_url,
            &FieldMetadata::new("API base URL", "GCE_API_BASE_URL", "api_base_url"),
        )?;
        Self::require_positive(
            self.state_timeout_secs,
            &FieldMetadata::new(
                "state timeout",
                "GCE_STATE_TIMEOUT_SECS",
                "state_timeout_secs",
            ),
        )?;
        Self::require_positive(
            self.poll_interval_secs,
            &FieldMetadata::new(
                "poll interval",
                "GCE_POLL_INTERVAL_SECS",
                "poll_interval_secs",
            ),
        )?;
        Ok(())
    }

    /// Returns the trimmed access token, if one is configured and non-blank.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a configuration value is present but unusable.
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
