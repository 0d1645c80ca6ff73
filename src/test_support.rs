//! Topology fixtures for tests that never touch templates.

use std::collections::BTreeMap;
use std::path::PathBuf;

use cloudgen::{Host, Settings, Topology};

/// Hosts are `(name, role, space-separated ips)`.
pub fn topology(hosts: &[(&str, &str, &str)]) -> Topology {
    let hosts = hosts
        .iter()
        .map(|(name, role, ips)| {
            let host = Host::new(
                *name,
                role.parse().unwrap(),
                ips.split_whitespace().map(str::to_string).collect(),
                Vec::new(),
            )
            .unwrap();
            (name.to_string(), host)
        });

    Topology {
        settings: Settings {
            openstack_version: "mitaka".to_string(),
            base_vm: "ubuntu-base".to_string(),
            base_user: "stack".to_string(),
            base_distribution: "ubuntu".to_string(),
            base_hostname: "base".to_string(),
        },
        config: BTreeMap::new(),
        hosts: hosts.collect(),
        module_dir: PathBuf::from("ubuntu-base/mitaka"),
    }
}
