//! Per-host install and cleanup script generation.
//!
//! For every host the declared modules are expanded from their `in_`
//! templates (install, declared order) and `out_` templates (cleanup,
//! reversed order). Each expanded module is written into
//! `<host>_modules/`, and the scripts invoke them from the remote root.
//!
//! Generation is two-phase: [`generate_all`] renders every host in memory
//! before touching the file system, so a missing template leaves no
//! scripts behind.

use crate::error::{Error, Result};
use crate::outdir::FreshDir;
use crate::remap::{Remapper, RepoAccess};
use crate::topology::{Host, RoleIndex, Topology};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// First line of every generated script
pub const SHEBANG: &str = "#!/bin/bash";

/// Where the generated files land on the provisioned host
pub const DEFAULT_REMOTE_ROOT: &str = "/root";

/// Options controlling script generation
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Local directory receiving scripts and module directories
    pub output_dir: PathBuf,
    /// Absolute prefix used in invocation lines
    pub remote_root: String,
    /// Leave `/etc/hosts` entries out of install scripts
    pub skip_hosts: bool,
    pub repository: RepoAccess,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            remote_root: DEFAULT_REMOTE_ROOT.to_string(),
            skip_hosts: false,
            repository: RepoAccess::default(),
        }
    }
}

/// Install or cleanup side of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Install,
    Cleanup,
}

impl Phase {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Install => "in_",
            Self::Cleanup => "out_",
        }
    }
}

/// A shell script: optional `/etc/hosts` block followed by one
/// invocation per module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedScript {
    hosts_entries: Option<Vec<String>>,
    invocations: Vec<String>,
}

impl GeneratedScript {
    pub fn invocations(&self) -> &[String] {
        &self.invocations
    }

    pub fn hosts_entries(&self) -> &[String] {
        self.hosts_entries.as_deref().unwrap_or_default()
    }

    /// Script text. Always ends with a newline.
    pub fn render(&self) -> String {
        let mut lines = vec![SHEBANG.to_string(), String::new()];
        if let Some(entries) = &self.hosts_entries {
            lines.extend(entries.iter().cloned());
            lines.push(String::new());
        }
        lines.extend(self.invocations.iter().cloned());
        lines.push(String::new());
        lines.join("\n")
    }
}

/// A template after placeholder substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedModule {
    /// `in_<module>` or `out_<module>`
    pub file_name: String,
    pub contents: String,
}

/// Everything generated for one host, not yet written
#[derive(Debug, Clone)]
pub struct HostArtifacts {
    pub hostname: String,
    pub install: GeneratedScript,
    pub cleanup: GeneratedScript,
    pub modules: Vec<ExpandedModule>,
}

/// Paths written for one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub hostname: String,
    pub install_script: PathBuf,
    pub cleanup_script: PathBuf,
    pub modules_dir: PathBuf,
}

pub fn modules_dir_name(hostname: &str) -> String {
    format!("{hostname}_modules")
}

fn invocation(opts: &GenerateOptions, hostname: &str, file_name: &str) -> String {
    format!(
        "bash {}/{}/{}",
        opts.remote_root.trim_end_matches('/'),
        modules_dir_name(hostname),
        file_name
    )
}

fn expand_template(path: &Path, host: &Host, module: &str, remapper: &Remapper) -> Result<String> {
    let template = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::TemplateNotFound {
            host: host.hostname.clone(),
            module: module.to_string(),
            path: path.to_path_buf(),
        },
        _ => Error::Io(e),
    })?;

    let mut contents = String::with_capacity(template.len());
    for line in template.lines() {
        contents.push_str(&remapper.remap(line, host)?);
        contents.push('\n');
    }
    Ok(contents)
}

fn expand_phase<'m>(
    phase: Phase,
    modules: impl Iterator<Item = &'m String>,
    host: &Host,
    topology: &Topology,
    remapper: &Remapper,
    opts: &GenerateOptions,
    expanded: &mut Vec<ExpandedModule>,
) -> Result<Vec<String>> {
    let mut invocations = Vec::new();
    for module in modules {
        let file_name = format!("{}{module}", phase.prefix());
        let template = topology.module_dir.join(&file_name);
        let contents = expand_template(&template, host, module, remapper)?;
        invocations.push(invocation(opts, &host.hostname, &file_name));
        expanded.push(ExpandedModule {
            file_name,
            contents,
        });
    }
    Ok(invocations)
}

/// Render both scripts and every expanded module for `host` in memory.
pub fn render(
    host: &Host,
    topology: &Topology,
    remapper: &Remapper,
    opts: &GenerateOptions,
) -> Result<HostArtifacts> {
    let mut modules = Vec::with_capacity(host.modules.len() * 2);

    let install_invocations = expand_phase(
        Phase::Install,
        host.modules.iter(),
        host,
        topology,
        remapper,
        opts,
        &mut modules,
    )?;
    let cleanup_invocations = expand_phase(
        Phase::Cleanup,
        host.modules.iter().rev(),
        host,
        topology,
        remapper,
        opts,
        &mut modules,
    )?;

    let hosts_entries = (!opts.skip_hosts).then(|| {
        topology
            .hosts
            .values()
            .filter(|other| other.hostname != host.hostname)
            .map(|other| format!("echo {} {} >> /etc/hosts", other.private_ip(), other.hostname))
            .collect()
    });

    Ok(HostArtifacts {
        hostname: host.hostname.clone(),
        install: GeneratedScript {
            hosts_entries,
            invocations: install_invocations,
        },
        cleanup: GeneratedScript {
            hosts_entries: None,
            invocations: cleanup_invocations,
        },
        modules,
    })
}

/// Write rendered artifacts: recreate `<host>_modules/`, fill it, then
/// write `<host>.sh` and `<host>_cleanup.sh`.
pub fn write(artifacts: &HostArtifacts, opts: &GenerateOptions) -> Result<GeneratedFiles> {
    let hostname = &artifacts.hostname;
    let modules_dir = FreshDir::prepare(opts.output_dir.join(modules_dir_name(hostname)))?;
    for module in &artifacts.modules {
        modules_dir.write(&module.file_name, &module.contents)?;
    }

    let install_script = opts.output_dir.join(format!("{hostname}.sh"));
    fs::write(&install_script, artifacts.install.render())?;
    let cleanup_script = opts.output_dir.join(format!("{hostname}_cleanup.sh"));
    fs::write(&cleanup_script, artifacts.cleanup.render())?;

    log::info!("Generated {} and {}", install_script.display(), cleanup_script.display());

    Ok(GeneratedFiles {
        hostname: hostname.clone(),
        install_script,
        cleanup_script,
        modules_dir: modules_dir.path().to_path_buf(),
    })
}

/// Render and write the scripts of a single host.
pub fn generate(
    host: &Host,
    topology: &Topology,
    remapper: &Remapper,
    opts: &GenerateOptions,
) -> Result<GeneratedFiles> {
    write(&render(host, topology, remapper, opts)?, opts)
}

/// Generate scripts for every host of the topology.
///
/// All hosts are rendered before anything is written; the first failure
/// aborts the whole build.
pub fn generate_all(topology: &Topology, opts: &GenerateOptions) -> Result<Vec<GeneratedFiles>> {
    if opts.skip_hosts {
        log::warn!(
            "You have to add appropriate entries to your /etc/hosts, \
             otherwise your cloud may not work properly"
        );
    }

    let roles = RoleIndex::new(topology);
    let remapper = Remapper::new(topology, &roles, opts.repository);

    let rendered = topology
        .hosts
        .values()
        .map(|host| render(host, topology, &remapper, opts))
        .collect::<Result<Vec<_>>>()?;

    fs::create_dir_all(&opts.output_dir)?;
    rendered.iter().map(|a| write(a, opts)).collect()
}
