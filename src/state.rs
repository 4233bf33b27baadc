//! Typed execution state shared by the steps of one build.
//!
//! Well-known entries are plain fields so steps never perform untyped
//! lookups. Steps that need to hand extra values to later steps can still do
//! so through named annotations.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::driver::Driver;
use crate::settings::BuildSettings;
use crate::step::StepError;

/// State carried through a build and handed to each step in turn.
///
/// Steps run one at a time and receive `&mut BuildState`, so there is never
/// more than one writer.
#[derive(Debug)]
pub struct BuildState<D: Driver> {
    /// Settings for this build.
    pub settings: BuildSettings,
    /// Provider driver shared by every step.
    pub driver: Arc<D>,
    /// Name of the instance created by an earlier step.
    pub instance_name: Option<String>,
    /// Address later steps connect to; set only once the instance is running.
    pub instance_ip: Option<String>,
    /// Failure recorded by the step that halted the build.
    pub error: Option<StepError<D::Error>>,
    annotations: BTreeMap<String, Value>,
}

impl<D: Driver> BuildState<D> {
    /// Creates an empty state for a new build.
    #[must_use]
    pub const fn new(settings: BuildSettings, driver: Arc<D>) -> Self {
        Self {
            settings,
            driver,
            instance_name: None,
            instance_ip: None,
            error: None,
            annotations: BTreeMap::new(),
        }
    }

    /// Records the instance name, as the instance creation step would.
    #[must_use]
    pub fn with_instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = Some(name.into());
        self
    }

    /// Returns `true` once a step has recorded an error.
    #[must_use]
    pub const fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Stores a named value for later steps, returning any value it replaced.
    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.annotations.insert(key.into(), value.into())
    }

    /// Looks up a named value stored by an earlier step.
    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&Value> {
        self.annotations.get(key)
    }

    /// Iterates annotations in key order.
    pub fn annotations(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.annotations
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }
}
