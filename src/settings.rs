//! Per-run build settings consumed by pipeline steps.

use std::time::Duration;

use thiserror::Error;

/// Default upper bound on how long a step waits for an instance state change.
pub const DEFAULT_STATE_TIMEOUT: Duration = Duration::from_secs(300);

/// Immutable settings shared by every step of a single build.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuildSettings {
    /// Zone the instance lives in (for example `us-central1-a`).
    pub zone: String,
    /// Publish the instance's private address instead of its NAT address.
    pub use_internal_ip: bool,
    /// Maximum time to wait for the instance to reach a requested state.
    pub state_timeout: Duration,
}

impl BuildSettings {
    /// Starts a builder for [`BuildSettings`].
    #[must_use]
    pub const fn builder() -> BuildSettingsBuilder {
        BuildSettingsBuilder::new()
    }

    /// Validates the settings, naming the first offending field.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Validation`] when the zone is blank or the
    /// state timeout is zero.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.zone.trim().is_empty() {
            return Err(SettingsError::Validation(String::from("zone")));
        }
        if self.state_timeout.is_zero() {
            return Err(SettingsError::Validation(String::from("state_timeout")));
        }
        Ok(())
    }
}

/// Builder for [`BuildSettings`] that trims and validates on construction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuildSettingsBuilder {
    zone: String,
    use_internal_ip: bool,
    state_timeout: Duration,
}

impl Default for BuildSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildSettingsBuilder {
    /// Creates a builder with the default state timeout and NAT addressing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            zone: String::new(),
            use_internal_ip: false,
            state_timeout: DEFAULT_STATE_TIMEOUT,
        }
    }

    /// Sets the zone.
    #[must_use]
    pub fn zone(mut self, value: impl Into<String>) -> Self {
        self.zone = value.into();
        self
    }

    /// Selects internal rather than NAT addressing.
    #[must_use]
    pub const fn use_internal_ip(mut self, value: bool) -> Self {
        self.use_internal_ip = value;
        self
    }

    /// Sets the state timeout.
    #[must_use]
    pub const fn state_timeout(mut self, value: Duration) -> Self {
        self.state_timeout = value;
        self
    }

    /// Builds and validates the [`BuildSettings`].
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Validation`] when a field is blank or zero.
    pub fn build(self) -> Result<BuildSettings, SettingsError> {
        let settings = BuildSettings {
            zone: self.zone.trim().to_owned(),
            use_internal_ip: self.use_internal_ip,
            state_timeout: self.state_timeout,
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Errors raised while assembling build settings.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SettingsError {
    /// Raised when a field is missing, blank, or zero.
    #[error("missing or empty field: {0}")]
    Validation(String),
}
