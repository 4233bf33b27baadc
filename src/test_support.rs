//! Test support utilities shared across unit and integration tests.

use std::collections::BTreeSet;
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, Mutex, MutexGuard as StdMutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::driver::{AddressKind, Driver, DriverFuture};

/// Records a single call made through [`ScriptedDriver`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DriverCall {
    /// `get_nat_ip(zone, instance)`.
    NatIp {
        /// Zone passed by the caller.
        zone: String,
        /// Instance passed by the caller.
        instance: String,
    },
    /// `get_internal_ip(zone, instance)`.
    InternalIp {
        /// Zone passed by the caller.
        zone: String,
        /// Instance passed by the caller.
        instance: String,
    },
    /// `wait_for_instance_state(state, zone, instance, _)`.
    WaitForState {
        /// State awaited by the caller.
        state: String,
        /// Zone passed by the caller.
        zone: String,
        /// Instance passed by the caller.
        instance: String,
    },
}

/// Scripted outcome of the readiness wait.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Readiness {
    /// The instance is running immediately.
    Ready,
    /// The wait fails immediately with the given message.
    Fail(String),
    /// The instance becomes running after a delay.
    ReadyAfter(Duration),
    /// The wait fails with the given message after a delay.
    FailAfter(Duration, String),
    /// The wait only ends when its token is cancelled.
    Never,
}

/// Errors produced by [`ScriptedDriver`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScriptedDriverError {
    /// Scripted failure.
    #[error("scripted failure: {0}")]
    Scripted(String),
    /// No address was scripted for the requested kind.
    #[error("no {0} address scripted")]
    Unscripted(AddressKind),
    /// The readiness wait observed its cancellation token.
    #[error("wait cancelled")]
    Cancelled,
}

#[derive(Debug)]
struct Script {
    nat_ip: Result<String, ScriptedDriverError>,
    internal_ip: Result<String, ScriptedDriverError>,
    readiness: Readiness,
    lookup_delay: Duration,
    calls: Vec<DriverCall>,
    wait_tokens: Vec<CancellationToken>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            nat_ip: Err(ScriptedDriverError::Unscripted(AddressKind::Nat)),
            internal_ip: Err(ScriptedDriverError::Unscripted(AddressKind::Internal)),
            readiness: Readiness::Ready,
            lookup_delay: Duration::ZERO,
            calls: Vec::new(),
            wait_tokens: Vec::new(),
        }
    }
}

/// Driver double that returns scripted addresses and readiness outcomes and
/// records every call it receives.
///
/// Clones share the same script, so a test can keep a handle for assertions
/// after moving one into the build state.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDriver {
    script: Arc<Mutex<Script>>,
}

impl ScriptedDriver {
    /// Creates a driver with no addresses and an immediately ready instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> StdMutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Scripts the NAT address.
    pub fn set_nat_ip(&self, address: impl Into<String>) {
        self.script().nat_ip = Ok(address.into());
    }

    /// Scripts a NAT lookup failure.
    pub fn fail_nat_ip(&self, message: impl Into<String>) {
        self.script().nat_ip = Err(ScriptedDriverError::Scripted(message.into()));
    }

    /// Scripts the internal address.
    pub fn set_internal_ip(&self, address: impl Into<String>) {
        self.script().internal_ip = Ok(address.into());
    }

    /// Scripts an internal lookup failure.
    pub fn fail_internal_ip(&self, message: impl Into<String>) {
        self.script().internal_ip = Err(ScriptedDriverError::Scripted(message.into()));
    }

    /// Scripts the readiness wait.
    pub fn set_readiness(&self, readiness: Readiness) {
        self.script().readiness = readiness;
    }

    /// Delays every address lookup, so a test can act while one is in flight.
    pub fn delay_lookups(&self, delay: Duration) {
        self.script().lookup_delay = delay;
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<DriverCall> {
        self.script().calls.clone()
    }

    /// Returns the tokens handed to each readiness wait.
    #[must_use]
    pub fn wait_tokens(&self) -> Vec<CancellationToken> {
        self.script().wait_tokens.clone()
    }

    fn record(&self, call: DriverCall) {
        self.script().calls.push(call);
    }
}

impl Driver for ScriptedDriver {
    type Error = ScriptedDriverError;

    fn get_nat_ip<'a>(
        &'a self,
        zone: &'a str,
        instance: &'a str,
    ) -> DriverFuture<'a, String, Self::Error> {
        self.record(DriverCall::NatIp {
            zone: zone.to_owned(),
            instance: instance.to_owned(),
        });
        let (result, delay) = {
            let script = self.script();
            (script.nat_ip.clone(), script.lookup_delay)
        };
        Box::pin(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            result
        })
    }

    fn get_internal_ip<'a>(
        &'a self,
        zone: &'a str,
        instance: &'a str,
    ) -> DriverFuture<'a, String, Self::Error> {
        self.record(DriverCall::InternalIp {
            zone: zone.to_owned(),
            instance: instance.to_owned(),
        });
        let (result, delay) = {
            let script = self.script();
            (script.internal_ip.clone(), script.lookup_delay)
        };
        Box::pin(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            result
        })
    }

    fn wait_for_instance_state<'a>(
        &'a self,
        state: &'a str,
        zone: &'a str,
        instance: &'a str,
        cancel: CancellationToken,
    ) -> DriverFuture<'a, (), Self::Error> {
        self.record(DriverCall::WaitForState {
            state: state.to_owned(),
            zone: zone.to_owned(),
            instance: instance.to_owned(),
        });
        let readiness = {
            let mut script = self.script();
            script.wait_tokens.push(cancel.clone());
            script.readiness.clone()
        };

        Box::pin(async move {
            let (delay, outcome) = match readiness {
                Readiness::Ready => return Ok(()),
                Readiness::Fail(message) => return Err(ScriptedDriverError::Scripted(message)),
                Readiness::ReadyAfter(delay) => (delay, Ok(())),
                Readiness::FailAfter(delay, message) => {
                    (delay, Err(ScriptedDriverError::Scripted(message)))
                }
                Readiness::Never => {
                    cancel.cancelled().await;
                    return Err(ScriptedDriverError::Cancelled);
                }
            };
            tokio::select! {
                () = cancel.cancelled() => Err(ScriptedDriverError::Cancelled),
                () = sleep(delay) => outcome,
            }
        })
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
