//! Command-line interface definitions for the `gcebake` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `gcebake` binary.
#[derive(Debug, Parser)]
#[command(
    name = "gcebake",
    about = "Run Compute Engine image build steps against an existing instance",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Wait for an instance to run and print the address to connect to.
    #[command(
        name = "instance-info",
        about = "Wait for an instance to run and print the address to connect to"
    )]
    InstanceInfo(InstanceInfoCommand),
}

/// Arguments for the `gcebake instance-info` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct InstanceInfoCommand {
    /// Name of the instance created by an earlier build step.
    #[arg(required = true, value_name = "INSTANCE")]
    pub(crate) instance: String,
    /// Override the configured zone for this run.
    #[arg(long, value_name = "ZONE")]
    pub(crate) zone: Option<String>,
    /// Print the internal address instead of the NAT address.
    #[arg(long)]
    pub(crate) internal_ip: bool,
    /// Override the configured state timeout, in seconds.
    #[arg(long, value_name = "SECS")]
    pub(crate) state_timeout: Option<u64>,
    /// Log the resolved address at info level.
    #[arg(long)]
    pub(crate) debug: bool,
}
