//! Error types for the Compute Engine driver.

use thiserror::Error;

use crate::config::ConfigError;
use crate::driver::AddressKind;

/// Errors raised by the Compute Engine driver.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ComputeError {
    /// Raised when the driver configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when the HTTP request could not be sent or read.
    #[error("request to compute API failed: {message}")]
    Http {
        /// Transport error message.
        message: String,
    },
    /// Raised when the API responds with a non-success status.
    #[error("compute API returned status {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },
    /// Raised when the instance does not exist in the zone.
    #[error("instance {instance} not found in zone {zone}")]
    NotFound {
        /// Instance name used for the lookup.
        instance: String,
        /// Zone used for the lookup.
        zone: String,
    },
    /// Raised when the instance exposes no address of the requested kind.
    #[error("instance {instance} has no {kind} ip address")]
    MissingAddress {
        /// Address kind that was requested.
        kind: AddressKind,
        /// Instance name.
        instance: String,
    },
    /// Raised when the instance settles in a state it will not leave on its
    /// own while another state is awaited.
    #[error("instance {instance} entered state {state} while waiting for {target}")]
    UnexpectedState {
        /// Instance name.
        instance: String,
        /// State reported by the provider.
        state: String,
        /// State being waited for.
        target: String,
    },
    /// Raised when a wait is abandoned through its cancellation token.
    #[error("wait for instance {instance} was cancelled")]
    Cancelled {
        /// Instance name.
        instance: String,
    },
    /// Raised when a response body cannot be decoded.
    #[error("failed to decode compute API response: {message}")]
    Decode {
        /// Decoder error message.
        message: String,
    },
}

impl From<ConfigError> for ComputeError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<reqwest::Error> for ComputeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http {
            message: value.to_string(),
        }
    }
}
