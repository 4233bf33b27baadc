//! Driver abstraction over the Compute Engine control plane.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

/// Lifecycle state an instance reports once it has booted.
pub const RUNNING_STATE: &str = "RUNNING";

/// Lifecycle state an instance reports once it has stopped.
pub const TERMINATED_STATE: &str = "TERMINATED";

/// Which of an instance's addresses a step should publish.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddressKind {
    /// Provider-assigned external address.
    Nat,
    /// Private address inside the instance's VPC network.
    Internal,
}

impl AddressKind {
    /// Selects the address kind from the `use_internal_ip` setting.
    #[must_use]
    pub const fn from_use_internal_ip(use_internal_ip: bool) -> Self {
        if use_internal_ip {
            Self::Internal
        } else {
            Self::Nat
        }
    }

    /// Returns a short lowercase label for log and error output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nat => "nat",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Future returned by driver operations.
pub type DriverFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Capabilities a build step needs from the cloud provider.
///
/// Implementations must be safe to reuse sequentially by every step of a
/// build; none of the operations mutate the driver.
pub trait Driver: Send + Sync {
    /// Provider specific error type returned by the driver.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Resolves the external (NAT) address of an instance.
    fn get_nat_ip<'a>(
        &'a self,
        zone: &'a str,
        instance: &'a str,
    ) -> DriverFuture<'a, String, Self::Error>;

    /// Resolves the internal (private) address of an instance.
    fn get_internal_ip<'a>(
        &'a self,
        zone: &'a str,
        instance: &'a str,
    ) -> DriverFuture<'a, String, Self::Error>;

    /// Resolves once the instance reports `state`.
    ///
    /// The returned future may never complete on its own; callers bound it
    /// with their own deadline. Implementations should stop any background
    /// work once `cancel` fires.
    fn wait_for_instance_state<'a>(
        &'a self,
        state: &'a str,
        zone: &'a str,
        instance: &'a str,
        cancel: CancellationToken,
    ) -> DriverFuture<'a, (), Self::Error>;
}
