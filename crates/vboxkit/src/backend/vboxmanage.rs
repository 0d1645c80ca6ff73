//! Real VirtualBox backend using `VBoxManage` commands.

use crate::backend::{Backend, Listing};
use crate::error::{Error, Result};
use regex::Regex;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::LazyLock;

/// Matches `"name" {uuid}` lines of `VBoxManage list`.
static MACHINE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"(?P<name>.+)"\s.*"#).expect("valid machine regex"));

/// Extract machine names from `VBoxManage list vms|runningvms` output.
pub fn parse_machine_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| MACHINE_LINE.captures(line))
        .map(|caps| caps["name"].to_string())
        .collect()
}

/// Backend that executes real `VBoxManage` commands.
pub struct VBoxManageBackend {
    program: String,
    /// Directory holding per-machine configuration (`~/.config/VirtualBox`)
    config_root: PathBuf,
}

impl VBoxManageBackend {
    /// Create a backend using `VBoxManage` from `PATH`.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().ok_or(Error::NoHomeDirectory)?;
        Ok(Self::with_paths(
            "VBoxManage",
            home.join(".config").join("VirtualBox"),
        ))
    }

    /// Create a backend with an explicit executable and config root.
    pub fn with_paths(program: impl Into<String>, config_root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            config_root: config_root.into(),
        }
    }

    fn command_line(&self, args: &[&str]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        let command = self.command_line(args);
        log::debug!("Executing: `{command}'");
        Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| Error::Spawn { command, source })
    }

    /// Run a command and check for success.
    fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Err(Error::CommandFailed {
                command: self.command_line(args),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Backend for VBoxManageBackend {
    fn list_machines(&self, listing: Listing) -> Result<Vec<String>> {
        let what = match listing {
            Listing::All => "vms",
            Listing::Running => "runningvms",
        };
        let stdout = self.run_checked(&["list", what])?;
        Ok(parse_machine_list(&stdout))
    }

    fn poweroff(&self, name: &str) -> Result<()> {
        log::info!("Power off vm `{name}'");
        self.run_checked(&["controlvm", name, "poweroff"])?;
        Ok(())
    }

    fn unregister(&self, name: &str) -> Result<()> {
        log::info!("Removing vm `{name}'");
        self.run_checked(&["unregistervm", name])?;
        Ok(())
    }

    fn delete_config(&self, name: &str) -> Result<()> {
        let dir = self.config_root.join(name);
        log::debug!("Removing {}", dir.display());
        match fs::remove_dir_all(&dir) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(Error::Io(e)),
            _ => Ok(()),
        }
    }
}
