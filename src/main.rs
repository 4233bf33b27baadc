//! Binary entry point for the gcebake CLI.

use std::env;
use std::error::Error as StdError;
use std::io::{self, Write};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use gcebake::test_support::{Readiness, ScriptedDriver};
use gcebake::{
    BuildSettings, BuildState, ComputeDriver, ComputeError, ConfigError, Driver, GceConfig,
    InstanceInfoStep, SettingsError, Step, StepAction,
};

mod cli;

use cli::{Cli, InstanceInfoCommand};

const LOG_ENV: &str = "GCEBAKE_LOG";
const DEFAULT_LOG_FILTER: &str = "info";
const FAKE_STATE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error")]
    Config(#[from] ConfigError),
    #[error("settings error")]
    Settings(#[from] SettingsError),
    #[error("driver error")]
    Driver(#[from] ComputeError),
    #[error("instance-info failed")]
    Step(#[source] Box<dyn StdError + Send + Sync>),
    #[error("instance-info halted without recording an error")]
    SilentHalt,
    #[error("failed to write instance address")]
    Output(#[from] io::Error),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| String::from(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli {
        Cli::InstanceInfo(command) => instance_info(command, io::stdout()).await,
    }
}

async fn instance_info(args: InstanceInfoCommand, out: impl Write) -> Result<(), CliError> {
    let cancel = CancellationToken::new();
    tokio::spawn({
        let token = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        }
    });

    if let Some(driver) = fake_driver_from_env() {
        let settings = BuildSettings::builder()
            .zone(args.zone.as_deref().unwrap_or("fake-zone"))
            .use_internal_ip(args.internal_ip)
            .state_timeout(
                args.state_timeout
                    .map_or(FAKE_STATE_TIMEOUT, Duration::from_secs),
            )
            .build()?;
        return run_step(driver, settings, &args, &cancel, out).await;
    }

    let mut config = GceConfig::load_without_cli_args()?;
    apply_overrides(&mut config, &args);
    let settings = config.as_settings()?;
    let driver = ComputeDriver::new(&config)?;
    run_step(driver, settings, &args, &cancel, out).await
}

fn apply_overrides(config: &mut GceConfig, args: &InstanceInfoCommand) {
    if let Some(zone) = &args.zone {
        config.zone.clone_from(zone);
    }
    if args.internal_ip {
        config.use_internal_ip = true;
    }
    if let Some(secs) = args.state_timeout {
        config.state_timeout_secs = secs;
    }
}

async fn run_step<D: Driver>(
    driver: D,
    settings: BuildSettings,
    args: &InstanceInfoCommand,
    cancel: &CancellationToken,
    mut out: impl Write,
) -> Result<(), CliError> {
    let mut state =
        BuildState::new(settings, Arc::new(driver)).with_instance_name(args.instance.trim());
    let step = InstanceInfoStep::new().with_debug(args.debug);

    let action = step.run(&mut state, cancel).await;
    step.cleanup(&state);

    match (action, state.instance_ip.take(), state.error.take()) {
        (StepAction::Continue, Some(address), _) => {
            writeln!(out, "{address}")?;
            Ok(())
        }
        (_, _, Some(err)) => Err(CliError::Step(Box::new(err))),
        _ => Err(CliError::SilentHalt),
    }
}

/// Builds a scripted driver when `GCEBAKE_FAKE_DRIVER` names a known mode, so
/// the binary can be exercised without cloud credentials.
fn fake_driver_from_env() -> Option<ScriptedDriver> {
    let mode = env::var("GCEBAKE_FAKE_DRIVER").ok()?;
    let driver = ScriptedDriver::new();
    driver.set_nat_ip("203.0.113.7");
    driver.set_internal_ip("10.128.0.7");
    match mode.as_str() {
        "ready" => {}
        "nat-error" => driver.fail_nat_ip("simulated lookup failure"),
        "wait-error" => driver.set_readiness(Readiness::Fail(String::from(
            "instance entered TERMINATED",
        ))),
        "never" => driver.set_readiness(Readiness::Never),
        _ => return None,
    }
    Some(driver)
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{}", render_error(err)).ok();
}

/// Joins an error and its sources into one line, outermost first.
fn render_error(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut cause = err.source();
    while let Some(source) = cause {
        rendered.push_str(": ");
        rendered.push_str(&source.to_string());
        cause = source.source();
    }
    rendered
}
