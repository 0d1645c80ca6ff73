//! Fire-and-forget installation workers, one thread per host.
//!
//! [`dispatch_all`] returns as soon as every worker is started. Each
//! worker reports its outcome on a completion channel, which
//! [`Dispatch::wait`] drains. Worker failures are logged and never turn
//! into a build error.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use cloudgen::{Host, Topology};

use crate::error::BuildError;
use crate::runner::{ScriptRunner, ScriptStatus};

/// How one installation worker ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub hostname: String,
    /// Script status, or the error that kept it from running
    pub result: Result<ScriptStatus, String>,
}

impl InstallOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(&self.result, Ok(status) if status.success())
    }
}

/// Handle on the started workers
pub struct Dispatch {
    workers: Vec<(String, JoinHandle<()>)>,
    completions: Receiver<InstallOutcome>,
}

impl Dispatch {
    /// Number of workers started.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn hostnames(&self) -> Vec<&str> {
        self.workers.iter().map(|(h, _)| h.as_str()).collect()
    }

    /// Block until every worker has finished and return their outcomes in
    /// completion order.
    pub fn wait(self) -> Vec<InstallOutcome> {
        let outcomes: Vec<_> = self.completions.iter().collect();
        for (hostname, handle) in self.workers {
            if handle.join().is_err() {
                log::error!("Installation worker for host {hostname} panicked");
            }
        }
        outcomes
    }
}

/// Environment for one invocation of the install script.
pub fn install_env(host: &Host, public_ip: &str, topology: &Topology) -> Vec<(&'static str, String)> {
    vec![
        ("HOSTNAME", host.hostname.clone()),
        ("IP_ADDRESS", public_ip.to_string()),
        ("VMUSER", topology.settings.base_user.clone()),
    ]
}

fn spawn_worker(
    runner: Arc<dyn ScriptRunner>,
    script: PathBuf,
    hostname: String,
    env: Vec<(&'static str, String)>,
    done: Sender<InstallOutcome>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("install-{hostname}"))
        .spawn(move || {
            log::info!("OpenStack installation on host {hostname} has started (see {hostname}.log)");
            let result = runner.run(&script, &env).map_err(|e| e.to_string());
            match &result {
                Ok(status) if status.success() => {
                    log::info!("OpenStack installation on host {hostname} has finished");
                }
                Ok(status) => log::error!(
                    "OpenStack installation on host {hostname} failed with status {:?}",
                    status.code()
                ),
                Err(e) => log::error!("OpenStack installation on host {hostname} could not start: {e}"),
            }
            // The caller may have dropped the dispatch handle already.
            let _ = done.send(InstallOutcome { hostname, result });
        })
}

/// Start one installation worker per host and return immediately.
///
/// Every host must have a public IP; this is checked before any worker
/// starts.
pub fn dispatch_all(
    runner: Arc<dyn ScriptRunner>,
    script: &Path,
    topology: &Topology,
) -> Result<Dispatch, BuildError> {
    let mut jobs = Vec::with_capacity(topology.hosts.len());
    for host in topology.hosts.values() {
        let public_ip = host.public_ip().ok_or_else(|| BuildError::MissingPublicIp {
            host: host.hostname.clone(),
        })?;
        jobs.push((host.hostname.clone(), install_env(host, public_ip, topology)));
    }

    let (done, completions) = mpsc::channel();
    let mut workers = Vec::with_capacity(jobs.len());
    for (hostname, env) in jobs {
        let handle = spawn_worker(
            Arc::clone(&runner),
            script.to_path_buf(),
            hostname.clone(),
            env,
            done.clone(),
        )
        .map_err(|source| BuildError::Spawn {
            script: script.to_path_buf(),
            source,
        })?;
        workers.push((hostname, handle));
    }

    Ok(Dispatch {
        workers,
        completions,
    })
}
