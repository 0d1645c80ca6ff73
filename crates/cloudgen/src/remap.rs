//! Placeholder substitution for template lines.
//!
//! Substitution order is fixed: trailing whitespace is stripped, then the
//! controller token, the IPv4 token and the repository token are replaced,
//! and finally every key of the flat config table. Later steps see the
//! text produced by earlier ones. Config keys are applied longest first so
//! that a key contained in another key never clobbers it.

use crate::error::{Error, Result};
use crate::topology::{Host, RoleIndex, Topology};

/// Replaced with the hostname of the first controller
pub const CONTROLLER_TOKEN: &str = "CONTROLLER_HOSTNAME";

/// Replaced with the host's management IP
pub const IPV4_TOKEN: &str = "AAA.BBB.CCC.DDD";

/// Replaced with the repository URL for the current connection mode
pub const REPOSITORY_TOKEN: &str = "FPGA-NOVA-REPO";

/// All fixed tokens, in substitution order
pub const FIXED_TOKENS: [&str; 3] = [CONTROLLER_TOKEN, IPV4_TOKEN, REPOSITORY_TOKEN];

const REPOSITORY_SSH: &str = "git@github.com:intelsdi-x/fpga-nova.git";
const REPOSITORY_HTTPS: &str = "https://github.com/intelsdi-x/fpga-nova.git";

/// How the provisioned hosts reach the external repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepoAccess {
    /// An SSH key was supplied
    Ssh,
    #[default]
    Https,
}

impl RepoAccess {
    pub fn from_ssh_key(ssh_key: Option<&str>) -> Self {
        if ssh_key.is_some() { Self::Ssh } else { Self::Https }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Self::Ssh => REPOSITORY_SSH,
            Self::Https => REPOSITORY_HTTPS,
        }
    }
}

/// Substitutes placeholders in template lines for one topology.
///
/// Built once per build and shared by every host.
#[derive(Debug, Clone)]
pub struct Remapper<'a> {
    controller: Option<&'a str>,
    repository: &'static str,
    substitutions: Vec<(&'a str, &'a str)>,
}

impl<'a> Remapper<'a> {
    pub fn new(topology: &'a Topology, roles: &'a RoleIndex, access: RepoAccess) -> Self {
        let mut substitutions: Vec<(&str, &str)> = topology
            .config
            .iter()
            .filter(|(key, _)| !key.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        substitutions.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        Self {
            controller: roles.first_controller(),
            repository: access.url(),
            substitutions,
        }
    }

    /// Substitute every placeholder in `line` for `host`.
    ///
    /// Lines without tokens come back with only trailing whitespace removed.
    /// Referencing the controller token in a topology without a controller
    /// is an error.
    pub fn remap(&self, line: &str, host: &Host) -> Result<String> {
        let mut line = line.trim_end().to_string();

        if line.contains(CONTROLLER_TOKEN) {
            let controller = self.controller.ok_or_else(|| Error::MissingController {
                host: host.hostname.clone(),
            })?;
            line = line.replace(CONTROLLER_TOKEN, controller);
        }
        if line.contains(IPV4_TOKEN) {
            line = line.replace(IPV4_TOKEN, host.private_ip());
        }
        if line.contains(REPOSITORY_TOKEN) {
            line = line.replace(REPOSITORY_TOKEN, self.repository);
        }

        for (key, value) in &self.substitutions {
            if line.contains(key) {
                line = line.replace(key, value);
            }
        }

        Ok(line)
    }
}
