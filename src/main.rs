mod cli;
mod clone;
mod config;
mod dispatch;
mod error;
mod pipeline;
mod runner;
#[cfg(test)]
mod test_support;
mod ui;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cloudgen::{RawTopology, Topology};
use vboxkit::{Backend, Reconciliation};
use vboxkit::backend::vboxmanage::VBoxManageBackend;

use cli::Cli;
use config::BuildOptions;
use dispatch::Dispatch;
use error::BuildError;
use pipeline::{Build, BuildReport};
use runner::ShellRunner;

/// Log level for the given `-v`/`-q` counts. Verbosity wins.
fn log_level(verbose: u8, quiet: u8) -> log::LevelFilter {
    match (verbose, quiet) {
        (0, 0) => log::LevelFilter::Warn,
        (0, 1) => log::LevelFilter::Error,
        (0, _) => log::LevelFilter::Off,
        (1, _) => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(log_level(cli.verbose, cli.quiet))
        .format_timestamp(None)
        .init();

    let show = cli.quiet == 0;
    match run(&cli, show) {
        Ok(dispatch) => {
            if let Some(dispatch) = dispatch {
                // Worker results are reported but never change the exit status.
                report_installs(dispatch, show);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            if cli.quiet < 2 {
                ui::error(&format!("{e:#}"));
            }
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(e: &anyhow::Error) -> u8 {
    e.downcast_ref::<BuildError>()
        .map_or(error::EXIT_INVALID_INPUT, BuildError::exit_code)
}

fn load(cli: &Cli, options: &BuildOptions) -> Result<Topology, BuildError> {
    let raw = RawTopology::read(&cli.cloudconf)?;
    Ok(Topology::load(raw, &options.modules_root)?)
}

/// The VirtualBox inventory, only when cloning was requested.
fn inventory(options: &BuildOptions) -> Result<Option<VBoxManageBackend>, BuildError> {
    if !options.clone {
        return Ok(None);
    }
    Ok(Some(VBoxManageBackend::new()?))
}

fn run(cli: &Cli, show: bool) -> Result<Option<Dispatch>> {
    let options = BuildOptions::from_cli(cli);
    let topology = load(cli, &options)
        .with_context(|| format!("Invalid cloud configuration {}", cli.cloudconf.display()))?;
    log::debug!("Loaded {} hosts from {}", topology.hosts.len(), cli.cloudconf.display());

    let backend = inventory(&options)?;
    let report = Build {
        topology: &topology,
        options: &options,
        backend: backend.as_ref().map(|b| b as &dyn Backend),
        runner: Arc::new(ShellRunner),
    }
    .run()?;

    if show {
        summarize(&report);
    }
    Ok(report.dispatch)
}

fn summarize(report: &BuildReport) {
    ui::header("Generated scripts");
    for files in &report.generated {
        ui::kv(&files.hostname, &files.install_script.display().to_string());
        ui::dim(&files.cleanup_script.display().to_string());
    }
    if let Some(Reconciliation::Removed(removed)) = &report.reconciliation {
        ui::info(&format!("Removed existing machines: {}", removed.join(", ")));
    }
    if report.reconciliation.is_some() {
        ui::success(&format!("Cloned {} machines", report.generated.len()));
    } else {
        ui::info("Cloning skipped");
    }

    if let Some(dispatch) = report.dispatch.as_ref().filter(|d| !d.is_empty()) {
        ui::info(&format!(
            "Installation started on {} hosts: {}",
            dispatch.len(),
            dispatch.hostnames().join(", ")
        ));
    }
}

fn report_installs(dispatch: Dispatch, show: bool) {
    for outcome in dispatch.wait() {
        if !show {
            continue;
        }
        let line = ui::install_line(&outcome);
        if outcome.succeeded() {
            ui::success(&line);
        } else {
            ui::warn(&line);
        }
    }
}
