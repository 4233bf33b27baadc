//! BDD step definitions for the instance info step.

use std::time::Duration;

use gcebake::test_support::{DriverCall, Readiness};
use gcebake::{InstanceInfoStep, SettingsError, Step, StepAction, StepError};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use super::test_helpers::{InstanceContext, StepOutcome};
use crate::test_constants::TEST_ZONE;

#[derive(Debug, thiserror::Error)]
pub enum StepFailure {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a created instance named \"{name}\"")]
fn created_instance(mut instance_context: InstanceContext, name: String) -> InstanceContext {
    instance_context.instance_name = Some(name.trim().to_owned());
    instance_context
}

#[given("the NAT address is \"{address}\"")]
fn nat_address(instance_context: InstanceContext, address: String) -> InstanceContext {
    instance_context.driver.set_nat_ip(address);
    instance_context
}

#[given("the internal address is \"{address}\"")]
fn internal_address(instance_context: InstanceContext, address: String) -> InstanceContext {
    instance_context.driver.set_internal_ip(address);
    instance_context
}

#[given("internal addressing is enabled")]
fn internal_addressing(mut instance_context: InstanceContext) -> InstanceContext {
    instance_context.use_internal_ip = true;
    instance_context
}

#[given("the NAT lookup fails")]
fn nat_lookup_fails(instance_context: InstanceContext) -> InstanceContext {
    instance_context.driver.fail_nat_ip("error");
    instance_context
}

#[given("the readiness wait fails")]
fn readiness_fails(instance_context: InstanceContext) -> InstanceContext {
    instance_context
        .driver
        .set_readiness(Readiness::Fail(String::from("error")));
    instance_context
}

#[given("the state timeout is \"{millis}\" milliseconds")]
fn state_timeout(mut instance_context: InstanceContext, millis: u64) -> InstanceContext {
    instance_context.state_timeout = Duration::from_millis(millis);
    instance_context
}

#[given("the instance becomes running after \"{millis}\" milliseconds")]
fn running_after(instance_context: InstanceContext, millis: u64) -> InstanceContext {
    instance_context
        .driver
        .set_readiness(Readiness::ReadyAfter(Duration::from_millis(millis)));
    instance_context
}

#[when("the instance info step runs")]
fn run_step(instance_context: InstanceContext) -> Result<InstanceContext, StepFailure> {
    let runtime = Runtime::new().map_err(|err| StepFailure::Assertion(err.to_string()))?;
    let mut state = instance_context.build_state()?;
    let step = InstanceInfoStep::new();

    let action = runtime.block_on(async {
        let action = step.run(&mut state, &CancellationToken::new()).await;
        step.cleanup(&state);
        action
    });

    let outcome = StepOutcome {
        action,
        instance_ip: state.instance_ip.clone(),
        error: state.error.as_ref().map(ToString::to_string),
        timed_out: state.error.as_ref().is_some_and(StepError::is_timeout),
    };

    Ok(InstanceContext {
        outcome: Some(outcome),
        ..instance_context
    })
}

fn outcome(instance_context: &InstanceContext) -> Result<&StepOutcome, StepFailure> {
    instance_context
        .outcome
        .as_ref()
        .ok_or_else(|| StepFailure::Assertion(String::from("missing outcome")))
}

fn expect(condition: bool, message: impl FnOnce() -> String) -> Result<(), StepFailure> {
    if condition {
        Ok(())
    } else {
        Err(StepFailure::Assertion(message()))
    }
}

#[then("the step continues")]
fn step_continues(instance_context: &InstanceContext) -> Result<(), StepFailure> {
    let result = outcome(instance_context)?;
    expect(result.action == StepAction::Continue, || {
        format!("expected continue, got {result:?}")
    })
}

#[then("the step halts")]
fn step_halts(instance_context: &InstanceContext) -> Result<(), StepFailure> {
    let result = outcome(instance_context)?;
    expect(result.action == StepAction::Halt, || {
        format!("expected halt, got {result:?}")
    })
}

#[then("the published address is \"{address}\"")]
fn published_address(instance_context: &InstanceContext, address: String) -> Result<(), StepFailure> {
    let result = outcome(instance_context)?;
    expect(result.instance_ip.as_deref() == Some(address.as_str()), || {
        format!("expected address {address}, got {:?}", result.instance_ip)
    })
}

#[then("no address is published")]
fn no_address(instance_context: &InstanceContext) -> Result<(), StepFailure> {
    let result = outcome(instance_context)?;
    expect(result.instance_ip.is_none(), || {
        format!("expected no address, got {:?}", result.instance_ip)
    })
}

#[then("an error is recorded")]
fn error_recorded(instance_context: &InstanceContext) -> Result<(), StepFailure> {
    let result = outcome(instance_context)?;
    expect(result.error.is_some(), || String::from("expected an error"))
}

#[then("the recorded error is a timeout")]
fn error_is_timeout(instance_context: &InstanceContext) -> Result<(), StepFailure> {
    let result = outcome(instance_context)?;
    expect(result.timed_out, || {
        format!("expected timeout, got {:?}", result.error)
    })
}

#[then("the readiness wait was not attempted")]
fn wait_not_attempted(instance_context: &InstanceContext) -> Result<(), StepFailure> {
    let calls = instance_context.driver.calls();
    expect(
        !calls
            .iter()
            .any(|call| matches!(call, DriverCall::WaitForState { .. })),
        || format!("unexpected readiness wait: {calls:?}"),
    )
}

#[then("the NAT address was not requested")]
fn nat_not_requested(instance_context: &InstanceContext) -> Result<(), StepFailure> {
    let calls = instance_context.driver.calls();
    expect(
        !calls
            .iter()
            .any(|call| matches!(call, DriverCall::NatIp { .. })),
        || format!("unexpected NAT lookup: {calls:?}"),
    )
}

#[then("the driver waited for \"{state}\" on instance \"{instance}\"")]
fn driver_waited(
    instance_context: &InstanceContext,
    state: String,
    instance: String,
) -> Result<(), StepFailure> {
    let expected = DriverCall::WaitForState {
        state,
        zone: String::from(TEST_ZONE),
        instance,
    };
    let calls = instance_context.driver.calls();
    expect(calls.contains(&expected), || {
        format!("expected {expected:?} in {calls:?}")
    })
}
