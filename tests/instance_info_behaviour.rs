//! Behavioural scenarios for the instance info step.

#[path = "common/test_constants.rs"]
mod test_constants;

mod instance_info;
