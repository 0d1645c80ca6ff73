//! The build pipeline: generate, reconcile, clone, dispatch.

use std::sync::Arc;

use cloudgen::{GeneratedFiles, Topology};
use vboxkit::{Backend, Reconciliation};

use crate::clone::clone_all;
use crate::config::BuildOptions;
use crate::dispatch::{Dispatch, dispatch_all};
use crate::error::BuildError;
use crate::runner::ScriptRunner;

/// One build of a validated topology
pub struct Build<'a> {
    pub topology: &'a Topology,
    pub options: &'a BuildOptions,
    /// Inventory to reconcile against. Cloning runs only when present.
    pub backend: Option<&'a dyn Backend>,
    pub runner: Arc<dyn ScriptRunner>,
}

/// What a successful build did
pub struct BuildReport {
    pub generated: Vec<GeneratedFiles>,
    /// Present when cloning was requested
    pub reconciliation: Option<Reconciliation>,
    /// Running installation workers, when auto-install was requested
    pub dispatch: Option<Dispatch>,
}

impl Build<'_> {
    /// Run every stage the options ask for, stopping at the first failure.
    ///
    /// Scripts are always generated. Reconciliation and cloning run when
    /// an inventory backend is given; installation workers start last and
    /// are not waited for.
    pub fn run(&self) -> Result<BuildReport, BuildError> {
        log::info!("Generating scripts into {}", self.options.output_dir.display());
        let generated = cloudgen::generate_all(self.topology, &self.options.generate_options())?;

        let reconciliation = if let Some(backend) = self.backend {
            let reconciliation = self.reconcile(backend)?;
            clone_all(
                self.runner.as_ref(),
                &self.options.clone_script(),
                self.topology,
                self.options.ssh_key.as_deref(),
            )?;
            Some(reconciliation)
        } else {
            None
        };

        let dispatch = if self.options.auto_install {
            Some(dispatch_all(
                Arc::clone(&self.runner),
                &self.options.install_script(),
                self.topology,
            )?)
        } else {
            None
        };

        Ok(BuildReport {
            generated,
            reconciliation,
            dispatch,
        })
    }

    fn reconcile(&self, backend: &dyn Backend) -> Result<Reconciliation, BuildError> {
        let hosts = self.topology.hostnames();
        let reconciliation = vboxkit::reconcile(backend, &hosts, self.options.remove_existing)?;
        match reconciliation {
            Reconciliation::Blocked(machines) => Err(BuildError::Conflict { machines }),
            Reconciliation::Removed(ref removed) => {
                for name in removed {
                    log::info!("Removed existing VM `{name}'");
                }
                Ok(reconciliation)
            }
            Reconciliation::Clear => Ok(reconciliation),
        }
    }
}
