//! Compute Engine implementation of the build driver.

mod error;
mod types;
mod wait;

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::GceConfig;
use crate::driver::{AddressKind, Driver, DriverFuture};

pub use error::ComputeError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

/// Driver that talks to the Compute Engine v1 REST API.
#[derive(Clone)]
pub struct ComputeDriver {
    project_id: String,
    access_token: String,
    api_base_url: String,
    poll_interval: Duration,
}

impl fmt::Debug for ComputeDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputeDriver")
            .field("project_id", &self.project_id)
            .field("api_base_url", &self.api_base_url)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl ComputeDriver {
    /// Constructs a driver from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::Config`] when the configuration fails
    /// validation or carries no access token.
    pub fn new(config: &GceConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        let access_token = config.access_token().ok_or_else(|| {
            ComputeError::Config(String::from(
                "missing access token: set GCE_ACCESS_TOKEN or add access_token to [gce] in gcebake.toml",
            ))
        })?;
        Ok(Self {
            project_id: config.project_id.trim().to_owned(),
            access_token: access_token.to_owned(),
            api_base_url: config.api_base_url.trim().to_owned(),
            poll_interval: config.poll_interval(),
        })
    }

    /// Overrides the status poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn lookup_address(
        &self,
        kind: AddressKind,
        zone: &str,
        instance: &str,
    ) -> Result<String, ComputeError> {
        let resource = self.fetch_instance(zone, instance).await?;
        let address = resource
            .address(kind)
            .ok_or_else(|| ComputeError::MissingAddress {
                kind,
                instance: instance.to_owned(),
            })?;
        debug!(instance, zone, %kind, address, "resolved instance address");
        Ok(address.to_owned())
    }
}

impl Driver for ComputeDriver {
    type Error = ComputeError;

    fn get_nat_ip<'a>(
        &'a self,
        zone: &'a str,
        instance: &'a str,
    ) -> DriverFuture<'a, String, Self::Error> {
        Box::pin(self.lookup_address(AddressKind::Nat, zone, instance))
    }

    fn get_internal_ip<'a>(
        &'a self,
        zone: &'a str,
        instance: &'a str,
    ) -> DriverFuture<'a, String, Self::Error> {
        Box::pin(self.lookup_address(AddressKind::Internal, zone, instance))
    }

    fn wait_for_instance_state<'a>(
        &'a self,
        state: &'a str,
        zone: &'a str,
        instance: &'a str,
        cancel: CancellationToken,
    ) -> DriverFuture<'a, (), Self::Error> {
        Box::pin(async move {
            wait::poll_until_state(state, instance, self.poll_interval, &cancel, || async {
                self.fetch_instance(zone, instance)
                    .await
                    .map(|resource| resource.status)
            })
            .await
        })
    }
}
