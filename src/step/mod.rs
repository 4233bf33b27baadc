//! Pipeline step abstraction.
//!
//! A pipeline engine runs steps in order against one [`BuildState`]. Each
//! step either lets the build continue or halts it after recording an error,
//! and every step's cleanup hook runs regardless of the outcome.

mod error;
mod instance_info;

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::driver::Driver;
use crate::state::BuildState;

pub use error::StepError;
pub use instance_info::InstanceInfoStep;

/// Control signal a step returns to the pipeline engine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepAction {
    /// Proceed to the next step.
    Continue,
    /// Stop the build; the step has recorded an error in the state.
    Halt,
}

/// Future returned by [`Step::run`].
pub type StepFuture<'a> = Pin<Box<dyn Future<Output = StepAction> + Send + 'a>>;

/// One unit of work in a sequential build pipeline.
pub trait Step<D: Driver> {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Runs the step against the shared state.
    ///
    /// `cancel` fires when the operator aborts the build.
    fn run<'a>(
        &'a self,
        state: &'a mut BuildState<D>,
        cancel: &'a CancellationToken,
    ) -> StepFuture<'a>;

    /// Releases anything the step acquired. Called once the build ends,
    /// whatever the outcome, and must not fail.
    fn cleanup(&self, state: &BuildState<D>);
}
