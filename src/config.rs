use std::path::{Path, PathBuf};

use cloudgen::{GenerateOptions, RepoAccess};

use crate::cli::Cli;

/// Script run once per host to clone the base machine
pub const CLONE_SCRIPT: &str = "create_vm_clone.sh";

/// Script run once per host to boot it and trigger the installation
pub const INSTALL_SCRIPT: &str = "boot_vm_and_install.sh";

/// Everything the build needs besides the topology itself
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub clone: bool,
    pub remove_existing: bool,
    pub auto_install: bool,
    pub skip_hosts: bool,
    /// Tilde-expanded SSH key path
    pub ssh_key: Option<String>,
    pub modules_root: PathBuf,
    pub output_dir: PathBuf,
    pub scripts_dir: PathBuf,
    pub remote_root: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            clone: true,
            remove_existing: false,
            auto_install: false,
            skip_hosts: false,
            ssh_key: None,
            modules_root: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            scripts_dir: PathBuf::from("."),
            remote_root: cloudgen::generator::DEFAULT_REMOTE_ROOT.to_string(),
        }
    }
}

impl BuildOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            clone: !cli.dont_clone,
            remove_existing: cli.remove,
            auto_install: cli.auto_install,
            skip_hosts: cli.skip_hosts,
            ssh_key: cli
                .ssh_key
                .as_deref()
                .map(|key| shellexpand::tilde(key).into_owned()),
            modules_root: cli.modules_root.clone(),
            output_dir: cli.output_dir.clone(),
            scripts_dir: cli.scripts_dir.clone(),
            remote_root: cli.remote_root.clone(),
        }
    }

    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            output_dir: self.output_dir.clone(),
            remote_root: self.remote_root.clone(),
            skip_hosts: self.skip_hosts,
            repository: RepoAccess::from_ssh_key(self.ssh_key.as_deref()),
        }
    }

    pub fn clone_script(&self) -> PathBuf {
        script_path(&self.scripts_dir, CLONE_SCRIPT)
    }

    pub fn install_script(&self) -> PathBuf {
        script_path(&self.scripts_dir, INSTALL_SCRIPT)
    }
}

/// `dir/name`, keeping a `./` prefix for relative directories so the
/// script is never looked up on `PATH`.
fn script_path(dir: &Path, name: &str) -> PathBuf {
    if dir.as_os_str().is_empty() {
        Path::new(".").join(name)
    } else {
        dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_cli() {
        let cli = Cli::try_parse_from([
            "cloudbuild",
            "--dont-clone",
            "--ssh-key",
            "/keys/id_rsa",
            "--scripts-dir",
            "/opt/cloud",
            "cloud.yaml",
        ])
        .unwrap();
        let opts = BuildOptions::from_cli(&cli);
        assert!(!opts.clone);
        assert_eq!(opts.ssh_key.as_deref(), Some("/keys/id_rsa"));
        assert_eq!(opts.clone_script(), PathBuf::from("/opt/cloud/create_vm_clone.sh"));
        assert_eq!(opts.generate_options().repository, RepoAccess::Ssh);
    }

    #[test]
    fn test_ssh_key_is_tilde_expanded() {
        let cli = Cli::try_parse_from(["cloudbuild", "-k", "~/id_rsa", "cloud.yaml"]).unwrap();
        let opts = BuildOptions::from_cli(&cli);
        let expected = shellexpand::tilde("~/id_rsa");
        assert_eq!(opts.ssh_key.as_deref(), Some(expected.as_ref()));
    }

    #[test]
    fn test_default_scripts_are_relative() {
        let opts = BuildOptions::default();
        assert_eq!(opts.install_script(), PathBuf::from("./boot_vm_and_install.sh"));
        assert_eq!(opts.generate_options().repository, RepoAccess::Https);
        assert_eq!(script_path(Path::new(""), "x.sh"), PathBuf::from("./x.sh"));
    }
}
