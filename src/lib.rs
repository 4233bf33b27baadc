//! Core library for the gcebake image build steps.
//!
//! The crate exposes a driver abstraction over the Compute Engine control
//! plane, a typed build state shared between pipeline steps, and the step
//! that waits for a freshly created instance to run before publishing the
//! address later steps connect to.

pub mod compute;
pub mod config;
pub mod driver;
pub mod settings;
pub mod state;
pub mod step;
pub mod test_support;

pub use compute::{ComputeDriver, ComputeError};
pub use config::{ConfigError, GceConfig};
pub use driver::{AddressKind, Driver, DriverFuture, RUNNING_STATE};
pub use settings::{BuildSettings, BuildSettingsBuilder, SettingsError};
pub use state::BuildState;
pub use step::{InstanceInfoStep, Step, StepAction, StepError, StepFuture};
