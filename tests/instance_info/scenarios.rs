//! BDD scenarios for the instance info step.

use rstest_bdd_macros::scenario;

use super::test_helpers::{InstanceContext, instance_context};

#[scenario(
    path = "tests/features/instance_info.feature",
    name = "Publish the NAT address once the instance is running"
)]
fn scenario_publish_nat_address(instance_context: InstanceContext) {
    let _ = instance_context;
}

#[scenario(
    path = "tests/features/instance_info.feature",
    name = "Publish the internal address when internal addressing is enabled"
)]
fn scenario_publish_internal_address(instance_context: InstanceContext) {
    let _ = instance_context;
}

#[scenario(
    path = "tests/features/instance_info.feature",
    name = "Halt when the NAT lookup fails"
)]
fn scenario_nat_lookup_failure(instance_context: InstanceContext) {
    let _ = instance_context;
}

#[scenario(
    path = "tests/features/instance_info.feature",
    name = "Halt when the readiness wait fails"
)]
fn scenario_readiness_failure(instance_context: InstanceContext) {
    let _ = instance_context;
}

#[scenario(
    path = "tests/features/instance_info.feature",
    name = "Halt when the instance is not running before the timeout"
)]
fn scenario_readiness_timeout(instance_context: InstanceContext) {
    let _ = instance_context;
}
