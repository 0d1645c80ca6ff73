//! Sequential cloning of the base machine, one clone per host.
//!
//! Hosts are cloned strictly one at a time: the clone script drives
//! VirtualBox, which is not known to tolerate concurrent clones.

use std::path::Path;

use cloudgen::{Host, Topology};

use crate::error::BuildError;
use crate::runner::ScriptRunner;

/// Environment for one invocation of the clone script.
pub fn clone_env(host: &Host, topology: &Topology, ssh_key: Option<&str>) -> Vec<(&'static str, String)> {
    let settings = &topology.settings;
    let mut env = vec![
        ("VMNAME", settings.base_vm.clone()),
        ("VMUSER", settings.base_user.clone()),
        ("BASE_HOSTNAME", settings.base_hostname.clone()),
        ("NAME", host.hostname.clone()),
        ("LAST_OCTET", host.last_octet().to_string()),
        ("DISTRO", settings.base_distribution.clone()),
    ];
    if let Some(key) = ssh_key {
        env.push(("SSH_KEY", key.to_string()));
    }
    env
}

/// Clone every host in topology order.
///
/// The first failing clone stops the build; its exit status becomes the
/// build's exit status.
pub fn clone_all(
    runner: &dyn ScriptRunner,
    script: &Path,
    topology: &Topology,
    ssh_key: Option<&str>,
) -> Result<(), BuildError> {
    for host in topology.hosts.values() {
        log::info!("Cloning `{}'", host.hostname);
        let env = clone_env(host, topology, ssh_key);
        let status = runner.run(script, &env).map_err(|source| BuildError::Spawn {
            script: script.to_path_buf(),
            source,
        })?;
        if !status.success() {
            return Err(BuildError::CloneFailed {
                host: host.hostname.clone(),
                code: status.code(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::RecordingRunner;
    use crate::test_support::topology;

    #[test]
    fn test_clone_env() {
        let topology = topology(&[("ctl", "controller", "192.168.0.17 10.0.0.17")]);
        let env = clone_env(&topology.hosts["ctl"], &topology, None);
        assert_eq!(
            env,
            vec![
                ("VMNAME", "ubuntu-base".to_string()),
                ("VMUSER", "stack".to_string()),
                ("BASE_HOSTNAME", "base".to_string()),
                ("NAME", "ctl".to_string()),
                ("LAST_OCTET", "17".to_string()),
                ("DISTRO", "ubuntu".to_string()),
            ]
        );

        let with_key = clone_env(&topology.hosts["ctl"], &topology, Some("/keys/id_rsa"));
        assert_eq!(with_key.last(), Some(&("SSH_KEY", "/keys/id_rsa".to_string())));
    }

    #[test]
    fn test_clone_all_in_order() {
        let topology = topology(&[
            ("ctl", "controller", "10.0.0.1"),
            ("cpu1", "compute", "10.0.0.2"),
            ("cpu2", "compute", "10.0.0.3"),
        ]);
        let runner = RecordingRunner::new();
        clone_all(&runner, Path::new("./create_vm_clone.sh"), &topology, None).unwrap();

        let names: Vec<_> = runner
            .invocations()
            .iter()
            .map(|i| i.env["NAME"].clone())
            .collect();
        assert_eq!(names, vec!["ctl", "cpu1", "cpu2"]);
        assert!(
            runner
                .invocations()
                .iter()
                .all(|i| i.script == Path::new("./create_vm_clone.sh"))
        );
    }

    #[test]
    fn test_clone_failure_stops_remaining_hosts() {
        let topology = topology(&[
            ("ctl", "controller", "10.0.0.1"),
            ("cpu1", "compute", "10.0.0.2"),
            ("cpu2", "compute", "10.0.0.3"),
        ]);
        let runner = RecordingRunner::new().exit_when("NAME", "cpu1", 9);
        let err = clone_all(&runner, Path::new("clone.sh"), &topology, None).unwrap_err();

        assert!(matches!(err, BuildError::CloneFailed { ref host, code: Some(9) } if host == "cpu1"));
        assert_eq!(err.exit_code(), 9);
        assert_eq!(runner.invocations().len(), 2);
    }
}
