//! Shared fixtures for instance info BDD scenarios.

use std::sync::Arc;
use std::time::Duration;

use gcebake::test_support::ScriptedDriver;
use gcebake::{BuildSettings, BuildState, SettingsError, StepAction};
use rstest::fixture;

use crate::test_constants::TEST_ZONE;

#[derive(Clone, Debug)]
pub struct InstanceContext {
    pub driver: ScriptedDriver,
    pub instance_name: Option<String>,
    pub use_internal_ip: bool,
    pub state_timeout: Duration,
    pub outcome: Option<StepOutcome>,
}

/// Snapshot of the build state once the step has returned.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepOutcome {
    pub action: StepAction,
    pub instance_ip: Option<String>,
    pub error: Option<String>,
    pub timed_out: bool,
}

#[fixture]
pub fn instance_context() -> InstanceContext {
    InstanceContext {
        driver: ScriptedDriver::new(),
        instance_name: None,
        use_internal_ip: false,
        state_timeout: Duration::from_secs(5),
        outcome: None,
    }
}

impl InstanceContext {
    pub fn build_state(&self) -> Result<BuildState<ScriptedDriver>, SettingsError> {
        let settings = BuildSettings::builder()
            .zone(TEST_ZONE)
            .use_internal_ip(self.use_internal_ip)
            .state_timeout(self.state_timeout)
            .build()?;
        let mut state = BuildState::new(settings, Arc::new(self.driver.clone()));
        state.instance_name.clone_from(&self.instance_name);
        Ok(state)
    }
}
