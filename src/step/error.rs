//! Failures recorded by steps when they halt a build.

use std::time::Duration;

use thiserror::Error;

use crate::driver::AddressKind;

/// Errors a step records in the build state before halting.
#[derive(Debug, Error)]
pub enum StepError<DriverError>
where
    DriverError: std::error::Error + 'static,
{
    /// Raised when no earlier step recorded the instance name.
    #[error("instance name missing from build state")]
    MissingInstanceName,
    /// Raised when the driver cannot resolve the requested address.
    #[error("error retrieving instance {kind} ip address for {instance}")]
    AddressLookup {
        /// Address kind that was requested.
        kind: AddressKind,
        /// Instance name.
        instance: String,
        /// Provider-specific error.
        #[source]
        source: DriverError,
    },
    /// Raised when the driver reports that the readiness wait failed.
    #[error("error waiting for instance {instance} to become running")]
    ReadinessWait {
        /// Instance name.
        instance: String,
        /// Provider-specific error.
        #[source]
        source: DriverError,
    },
    /// Raised when the state timeout elapses before the instance is running.
    #[error(
        "timed out after {timeout_ms}ms waiting for instance {instance} to become running",
        timeout_ms = .timeout.as_millis()
    )]
    ReadinessTimeout {
        /// Instance name.
        instance: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },
    /// Raised when the build was cancelled before the instance was running.
    #[error("cancelled while waiting for instance {instance} to become running")]
    Cancelled {
        /// Instance name.
        instance: String,
    },
}

impl<DriverError> StepError<DriverError>
where
    DriverError: std::error::Error + 'static,
{
    /// Returns `true` when the state timeout elapsed.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::ReadinessTimeout { .. })
    }

    /// Returns `true` when an external cancellation preempted the step.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
