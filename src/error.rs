//! Build failures and the exit status each one maps to.

use std::path::PathBuf;
use thiserror::Error;

/// Exit status for invalid configuration or templates
pub const EXIT_INVALID_INPUT: u8 = 1;

/// Exit status when existing machines block cloning
pub const EXIT_CONFLICT: u8 = 2;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Topology(#[from] cloudgen::Error),

    #[error(
        "there is at least one VM which exists. Remove it manually, or use --remove \
         for wiping out all existing machines before cloning.\nConflicting VMs:\n{}",
        conflict_list(machines)
    )]
    Conflict { machines: Vec<String> },

    #[error(transparent)]
    Inventory(#[from] vboxkit::Error),

    #[error("cloning `{host}` failed{}", code.map(|c| format!(" with exit status {c}")).unwrap_or_else(|| " (killed by signal)".to_string()))]
    CloneFailed { host: String, code: Option<i32> },

    #[error("host `{host}` has no public IP (second entry of `ips`) for remote installation")]
    MissingPublicIp { host: String },

    #[error("failed to run {}: {source}", script.display())]
    Spawn {
        script: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Process exit status for this failure.
    ///
    /// Bad input exits with 1, inventory conflicts with 2, and failures
    /// of external commands propagate their own status.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Topology(e) if e.is_input_error() => EXIT_INVALID_INPUT,
            Self::MissingPublicIp { .. } => EXIT_INVALID_INPUT,
            Self::Conflict { .. } => EXIT_CONFLICT,
            Self::CloneFailed { code: Some(code), .. } => propagated(*code),
            Self::Inventory(e) => e.exit_code().map_or(1, propagated),
            _ => 1,
        }
    }
}

fn conflict_list(machines: &[String]) -> String {
    machines
        .iter()
        .map(|m| format!("- {m}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate a failed child's status to the range a process can exit
/// with, never turning it into success.
fn propagated(code: i32) -> u8 {
    match u8::try_from(code & 0xff) {
        Ok(0) | Err(_) => 1,
        Ok(code) => code,
    }
}
