//! Resolves the address of a freshly created instance and waits for it to run.
//!
//! The address is looked up first, and the lookup is abandoned if the build
//! is cancelled meanwhile. The wait for `RUNNING` is then raced against the
//! configured state timeout and the build's cancellation token. The address is
//! published as `instance_ip` only when the instance was confirmed running in
//! time. Any address resolved before a failed or timed-out wait is discarded.

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::driver::{AddressKind, Driver, RUNNING_STATE};
use crate::state::BuildState;

use super::{Step, StepAction, StepError, StepFuture};

const STEP_NAME: &str = "instance-info";

/// Step that publishes `instance_ip` once the instance is running.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct InstanceInfoStep {
    debug: bool,
}

impl InstanceInfoStep {
    /// Creates the step.
    #[must_use]
    pub const fn new() -> Self {
        Self { debug: false }
    }

    /// Reports the resolved address at `info` level instead of `debug`.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Runs the step, recording either `instance_ip` or `error` in `state`.
    pub async fn execute<D: Driver>(
        &self,
        state: &mut BuildState<D>,
        cancel: &CancellationToken,
    ) -> StepAction {
        match resolve(state, cancel).await {
            Ok(address) => {
                let instance = state.instance_name.as_deref().unwrap_or_default();
                if self.debug {
                    info!(instance, address = %address, "instance is running");
                } else {
                    debug!(instance, address = %address, "instance is running");
                }
                state.instance_ip = Some(address);
                StepAction::Continue
            }
            Err(err) => {
                error!(
                    step = STEP_NAME,
                    error = &err as &(dyn std::error::Error + 'static),
                    "halting build"
                );
                state.error = Some(err);
                StepAction::Halt
            }
        }
    }
}

async fn resolve<D: Driver>(
    state: &BuildState<D>,
    cancel: &CancellationToken,
) -> Result<String, StepError<D::Error>> {
    let Some(instance) = state.instance_name.as_deref() else {
        return Err(StepError::MissingInstanceName);
    };
    let cancelled = || StepError::Cancelled {
        instance: instance.to_owned(),
    };
    if cancel.is_cancelled() {
        return Err(cancelled());
    }

    let settings = &state.settings;
    let driver = state.driver.as_ref();
    let kind = AddressKind::from_use_internal_ip(settings.use_internal_ip);

    let address = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(cancelled()),
        looked_up = lookup_address(driver, kind, &settings.zone, instance) => {
            looked_up.map_err(|source| StepError::AddressLookup {
                kind,
                instance: instance.to_owned(),
                source,
            })?
        }
    };

    // A cancel that raced the lookup must not start the wait.
    if cancel.is_cancelled() {
        return Err(cancelled());
    }

    info!(instance, zone = %settings.zone, "waiting for instance to become running");
    await_running(driver, &settings.zone, instance, settings.state_timeout, cancel).await?;
    Ok(address)
}

async fn lookup_address<D: Driver>(
    driver: &D,
    kind: AddressKind,
    zone: &str,
    instance: &str,
) -> Result<String, D::Error> {
    match kind {
        AddressKind::Nat => driver.get_nat_ip(zone, instance).await,
        AddressKind::Internal => driver.get_internal_ip(zone, instance).await,
    }
}

/// Races the driver's readiness wait against `timeout` and `cancel`.
///
/// The losing wait is dropped, and its token is cancelled on return so any
/// work the driver spawned for it stops as well.
async fn await_running<D: Driver>(
    driver: &D,
    zone: &str,
    instance: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<(), StepError<D::Error>> {
    let wait_token = cancel.child_token();
    let _stop_wait = wait_token.clone().drop_guard();
    let wait = driver.wait_for_instance_state(RUNNING_STATE, zone, instance, wait_token);

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(StepError::Cancelled {
            instance: instance.to_owned(),
        }),
        outcome = wait => outcome.map_err(|source| StepError::ReadinessWait {
            instance: instance.to_owned(),
            source,
        }),
        () = sleep(timeout) => Err(StepError::ReadinessTimeout {
            instance: instance.to_owned(),
            timeout,
        }),
    }
}

impl<D: Driver> Step<D> for InstanceInfoStep {
    fn name(&self) -> &'static str {
        STEP_NAME
    }

    fn run<'a>(
        &'a self,
        state: &'a mut BuildState<D>,
        cancel: &'a CancellationToken,
    ) -> StepFuture<'a> {
        Box::pin(self.execute(state, cancel))
    }

    // The instance and its address belong to other steps; nothing to release.
    fn cleanup(&self, state: &BuildState<D>) {
        debug!(
            step = STEP_NAME,
            instance = state.instance_name.as_deref().unwrap_or_default(),
            "cleanup"
        );
    }
}
