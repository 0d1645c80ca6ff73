//! Validated topology model and role index.

use crate::document::RawTopology;
use crate::error::{Error, Result};
use crate::remap::FIXED_TOKENS;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Role a host plays in the cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Controller,
    Compute,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Controller => "controller",
            Self::Compute => "compute",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "controller" => Ok(Self::Controller),
            "compute" => Ok(Self::Compute),
            other => Err(other.to_string()),
        }
    }
}

/// A declared machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub hostname: String,
    pub role: Role,
    /// Index 0 is the management IP, index 1 the public one.
    pub ips: Vec<String>,
    /// Install order. Cleanup runs them reversed.
    pub modules: Vec<String>,
    management: Ipv4Addr,
}

impl Host {
    /// Build a host, checking that its name is usable as a single path
    /// component and that its first IP is an IPv4 address.
    pub fn new(
        hostname: impl Into<String>,
        role: Role,
        ips: Vec<String>,
        modules: Vec<String>,
    ) -> Result<Self> {
        let hostname = hostname.into();
        if let Some(reason) = hostname_problem(&hostname) {
            return Err(Error::InvalidHost {
                host: hostname,
                reason: reason.to_string(),
            });
        }
        let first = ips.first().ok_or_else(|| Error::InvalidHost {
            host: hostname.clone(),
            reason: "no IP addresses declared".to_string(),
        })?;
        let management = first.parse::<Ipv4Addr>().map_err(|_| Error::InvalidHost {
            host: hostname.clone(),
            reason: format!("first IP `{first}` is not an IPv4 address"),
        })?;
        Ok(Self {
            hostname,
            role,
            ips,
            modules,
            management,
        })
    }

    /// Management IP, used for `/etc/hosts` entries and the IPv4 placeholder.
    pub fn private_ip(&self) -> &str {
        &self.ips[0]
    }

    /// Public IP used to reach the host for remote installation.
    pub fn public_ip(&self) -> Option<&str> {
        self.ips.get(1).map(String::as_str)
    }

    /// Last octet of the management IP.
    pub fn last_octet(&self) -> u8 {
        self.management.octets()[3]
    }
}

/// Why `name` cannot be used as a hostname, if it cannot. A hostname must
/// stay a single path component and a single shell word.
fn hostname_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("hostname is empty")
    } else if name == "." || name == ".." {
        Some("hostname must not be `.` or `..`")
    } else if name.contains(['/', '\\']) {
        Some("hostname must not contain a path separator")
    } else if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        Some("hostname must not contain whitespace")
    } else {
        None
    }
}

/// Global build settings, all required
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub openstack_version: String,
    pub base_vm: String,
    pub base_user: String,
    pub base_distribution: String,
    pub base_hostname: String,
}

/// A validated topology
#[derive(Debug, Clone)]
pub struct Topology {
    pub settings: Settings,
    /// Flat placeholder table, values already stringified
    pub config: BTreeMap<String, String>,
    /// Hosts in document order
    pub hosts: IndexMap<String, Host>,
    /// Directory holding `in_*`/`out_*` templates for this image/version
    pub module_dir: PathBuf,
}

fn required(value: Option<String>, name: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::MissingSetting(name)),
    }
}

impl Topology {
    /// Validate a raw document against the module tree rooted at
    /// `modules_root`.
    ///
    /// Fails when a required setting is empty, when
    /// `<modules_root>/<base_vm>/<openstack_version>` is not a directory,
    /// or when a host entry is malformed.
    pub fn load(raw: RawTopology, modules_root: &Path) -> Result<Self> {
        let settings = Settings {
            openstack_version: required(raw.openstack_version, "openstack_version")?,
            base_vm: required(raw.base_vm, "base_vm")?,
            base_user: required(raw.base_user, "base_user")?,
            base_distribution: required(raw.base_distribution, "base_distribution")?,
            base_hostname: required(raw.base_hostname, "base_hostname")?,
        };

        let module_dir = modules_root
            .join(&settings.base_vm)
            .join(&settings.openstack_version);
        if !module_dir.is_dir() {
            return Err(Error::UnsupportedRelease {
                base_vm: settings.base_vm,
                version: settings.openstack_version,
                path: module_dir,
            });
        }

        let mut hosts = IndexMap::with_capacity(raw.nodes.len());
        for (hostname, node) in raw.nodes {
            let role = node.role.parse::<Role>().map_err(|role| Error::UnknownRole {
                host: hostname.clone(),
                role,
            })?;
            let host = Host::new(hostname.clone(), role, node.ips, node.modules)?;
            hosts.insert(hostname, host);
        }

        let config = raw
            .config
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect();

        let topology = Self {
            settings,
            config,
            hosts,
            module_dir,
        };

        for (short, long) in topology.overlapping_keys() {
            log::warn!(
                "Config key `{short}` is contained in `{long}`; longer keys are substituted first"
            );
        }

        Ok(topology)
    }

    /// Pairs `(contained, container)` where a config key occurs inside
    /// another config key or inside one of the fixed placeholder tokens.
    pub fn overlapping_keys(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for short in self.config.keys() {
            let containers = self
                .config
                .keys()
                .map(String::as_str)
                .chain(FIXED_TOKENS.iter().copied());
            for long in containers {
                if short.as_str() != long && !short.is_empty() && long.contains(short.as_str()) {
                    pairs.push((short.clone(), long.to_string()));
                }
            }
        }
        pairs
    }

    /// Hostnames in document order.
    pub fn hostnames(&self) -> Vec<&str> {
        self.hosts.keys().map(String::as_str).collect()
    }
}

/// Hostnames grouped by role, in topology order
#[derive(Debug, Clone, Default)]
pub struct RoleIndex {
    by_role: BTreeMap<Role, Vec<String>>,
}

impl RoleIndex {
    pub fn new(topology: &Topology) -> Self {
        let mut by_role: BTreeMap<Role, Vec<String>> = BTreeMap::new();
        for host in topology.hosts.values() {
            by_role
                .entry(host.role)
                .or_default()
                .push(host.hostname.clone());
        }
        Self { by_role }
    }

    pub fn hosts(&self, role: Role) -> &[String] {
        self.by_role
            .get(&role)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// First controller in topology order, if any.
    pub fn first_controller(&self) -> Option<&str> {
        self.hosts(Role::Controller).first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ConfigValue, RawHost};
    use tempfile::TempDir;

    fn raw() -> RawTopology {
        let mut nodes = IndexMap::new();
        nodes.insert(
            "cpu1".to_string(),
            RawHost {
                role: "compute".to_string(),
                ips: vec!["10.0.0.11".to_string()],
                modules: vec!["base".to_string()],
            },
        );
        nodes.insert(
            "ctl".to_string(),
            RawHost {
                role: "controller".to_string(),
                ips: vec!["10.0.0.10".to_string(), "172.16.0.10".to_string()],
                modules: vec!["base".to_string()],
            },
        );
        RawTopology {
            config: BTreeMap::from([("X".to_string(), ConfigValue::Integer(5))]),
            nodes,
            openstack_version: Some("mitaka".to_string()),
            base_vm: Some("ubuntu".to_string()),
            base_user: Some("ubuntu".to_string()),
            base_distribution: Some("ubuntu".to_string()),
            base_hostname: Some("ubuntu".to_string()),
        }
    }

    fn modules_root() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("ubuntu").join("mitaka")).unwrap();
        dir
    }

    #[test]
    fn test_load_valid() {
        let root = modules_root();
        let topology = Topology::load(raw(), root.path()).unwrap();
        assert_eq!(topology.hostnames(), vec!["cpu1", "ctl"]);
        assert_eq!(topology.config["X"], "5");
        assert_eq!(topology.module_dir, root.path().join("ubuntu").join("mitaka"));
    }

    #[test]
    fn test_load_missing_setting() {
        let root = modules_root();
        let mut raw = raw();
        raw.base_user = Some(String::new());
        let err = Topology::load(raw, root.path()).unwrap_err();
        assert!(matches!(err, Error::MissingSetting("base_user")));

        let mut raw = self::raw();
        raw.base_distribution = None;
        let err = Topology::load(raw, root.path()).unwrap_err();
        assert!(matches!(err, Error::MissingSetting("base_distribution")));
    }

    #[test]
    fn test_load_unsupported_release() {
        let root = modules_root();
        let mut raw = raw();
        raw.openstack_version = Some("newton".to_string());
        let err = Topology::load(raw, root.path()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedRelease { .. }));
    }

    #[test]
    fn test_load_unknown_role() {
        let root = modules_root();
        let mut raw = raw();
        raw.nodes["cpu1"].role = "storage".to_string();
        let err = Topology::load(raw, root.path()).unwrap_err();
        assert!(matches!(err, Error::UnknownRole { ref role, .. } if role == "storage"));
    }

    #[test]
    fn test_load_rejects_host_without_ipv4() {
        let root = modules_root();
        let mut raw = raw();
        raw.nodes["cpu1"].ips = vec!["fe80::1".to_string()];
        let err = Topology::load(raw, root.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidHost { ref host, .. } if host == "cpu1"));

        let mut raw = self::raw();
        raw.nodes["cpu1"].ips.clear();
        assert!(Topology::load(raw, root.path()).is_err());
    }

    #[test]
    fn test_load_rejects_unsafe_hostnames() {
        let root = modules_root();
        for name in ["../victim", "/abs/path", "a/b", "..", ".", "", "two words", "tab\there"] {
            let mut raw = raw();
            raw.nodes.insert(
                name.to_string(),
                RawHost {
                    role: "compute".to_string(),
                    ips: vec!["10.0.0.20".to_string()],
                    modules: vec!["base".to_string()],
                },
            );
            let err = Topology::load(raw, root.path()).unwrap_err();
            assert!(
                matches!(err, Error::InvalidHost { ref host, .. } if host == name),
                "{name:?} was accepted"
            );
            assert!(err.is_input_error());
        }
    }

    #[test]
    fn test_hostname_problem() {
        assert_eq!(hostname_problem("ctl-1.lab"), None);
        assert_eq!(hostname_problem("..hidden"), None);
        assert!(hostname_problem("..").is_some());
        assert!(hostname_problem("a\\b").is_some());
    }

    #[test]
    fn test_host_addresses() {
        let host = Host::new(
            "ctl",
            Role::Controller,
            vec!["192.168.1.42".to_string(), "10.1.1.1".to_string()],
            vec![],
        )
        .unwrap();
        assert_eq!(host.private_ip(), "192.168.1.42");
        assert_eq!(host.public_ip(), Some("10.1.1.1"));
        assert_eq!(host.last_octet(), 42);
    }

    #[test]
    fn test_role_index_follows_topology_order() {
        let root = modules_root();
        let mut raw = raw();
        raw.nodes.insert(
            "ctl2".to_string(),
            RawHost {
                role: "controller".to_string(),
                ips: vec!["10.0.0.12".to_string()],
                modules: vec![],
            },
        );
        let topology = Topology::load(raw, root.path()).unwrap();
        let roles = RoleIndex::new(&topology);
        assert_eq!(roles.hosts(Role::Controller), ["ctl", "ctl2"]);
        assert_eq!(roles.hosts(Role::Compute), ["cpu1"]);
        assert_eq!(roles.first_controller(), Some("ctl"));
    }

    #[test]
    fn test_role_index_without_controller() {
        let root = modules_root();
        let mut raw = raw();
        raw.nodes.shift_remove("ctl");
        let topology = Topology::load(raw, root.path()).unwrap();
        assert_eq!(RoleIndex::new(&topology).first_controller(), None);
    }

    #[test]
    fn test_overlapping_keys() {
        let root = modules_root();
        let mut raw = raw();
        raw.config = BTreeMap::from([
            ("PASS".to_string(), ConfigValue::String("a".to_string())),
            ("DB_PASS".to_string(), ConfigValue::String("b".to_string())),
            ("REPO".to_string(), ConfigValue::String("c".to_string())),
            ("MTU".to_string(), ConfigValue::Integer(1450)),
        ]);
        let topology = Topology::load(raw, root.path()).unwrap();
        let pairs = topology.overlapping_keys();
        assert!(pairs.contains(&("PASS".to_string(), "DB_PASS".to_string())));
        assert!(pairs.contains(&("REPO".to_string(), "FPGA-NOVA-REPO".to_string())));
        assert!(!pairs.iter().any(|(short, _)| short == "MTU"));
    }
}
