//! Instance lookup and state polling for the Compute Engine driver.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::driver::TERMINATED_STATE;

use super::types::{ApiErrorEnvelope, InstanceResource};
use super::{ComputeDriver, ComputeError, HTTP_CLIENT};

impl ComputeDriver {
    pub(in crate::compute) fn instance_url(&self, zone: &str, instance: &str) -> String {
        format!(
            "{}/projects/{}/zones/{}/instances/{}",
            self.api_base_url.trim_end_matches('/'),
            self.project_id,
            zone,
            instance
        )
    }

    pub(in crate::compute) async fn fetch_instance(
        &self,
        zone: &str,
        instance: &str,
    ) -> Result<InstanceResource, ComputeError> {
        let response = HTTP_CLIENT
            .get(self.instance_url(zone, instance))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            return serde_json::from_slice(&body).map_err(|err| ComputeError::Decode {
                message: err.to_string(),
            });
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ComputeError::NotFound {
                instance: instance.to_owned(),
                zone: zone.to_owned(),
            });
        }

        let message = serde_json::from_slice::<ApiErrorEnvelope>(&body).map_or_else(
            |_| String::from_utf8_lossy(&body).into_owned(),
            |envelope| envelope.error.message,
        );
        Err(ComputeError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Polls `fetch_status` until it reports `target`.
///
/// A `TERMINATED` instance never starts on its own, so it ends the wait with
/// [`ComputeError::UnexpectedState`] unless it is the target. Lookup errors
/// end the wait immediately.
pub(in crate::compute) async fn poll_until_state<F, Fut>(
    target: &str,
    instance: &str,
    poll_interval: Duration,
    cancel: &CancellationToken,
    mut fetch_status: F,
) -> Result<(), ComputeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, ComputeError>>,
{
    let cancelled = || ComputeError::Cancelled {
        instance: instance.to_owned(),
    };

    loop {
        let status = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(cancelled()),
            fetched = fetch_status() => fetched?,
        };

        if status == target {
            return Ok(());
        }
        if status == TERMINATED_STATE {
            return Err(ComputeError::UnexpectedState {
                instance: instance.to_owned(),
                state: status,
                target: target.to_owned(),
            });
        }

        debug!(instance, status = %status, target, "instance not yet in target state");

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(cancelled()),
            () = sleep(poll_interval) => {}
        }
    }
}
