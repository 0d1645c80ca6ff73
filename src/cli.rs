use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cloudbuild")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Build OpenStack install scripts and clone VirtualBox machines for a cloud topology", long_about = None)]
#[command(after_help = "Exit status:\n  0  success\n  1  invalid configuration, templates or options\n  2  machines with the same names already exist (use --remove)\n  N  status of the failed clone script or VBoxManage command")]
pub struct Cli {
    /// Do not clone machines, just generate install scripts
    #[arg(short = 'd', long)]
    pub dont_clone: bool,

    /// Skip appending hosts to /etc/hosts
    #[arg(short, long)]
    pub skip_hosts: bool,

    /// Dispose existing machines with the same names before cloning
    #[arg(short, long)]
    pub remove: bool,

    /// Automatically start machines and run the OpenStack installation
    #[arg(short, long)]
    pub auto_install: bool,

    /// Private SSH key used to clone git repositories
    #[arg(short = 'k', long, value_name = "PATH")]
    pub ssh_key: Option<String>,

    /// Be verbose. Repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Be quiet. Repeat to silence errors too
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,

    /// Directory holding <base_vm>/<openstack_version>/ module templates
    #[arg(long, value_name = "DIR", default_value = ".", env = "CLOUDBUILD_MODULES_ROOT")]
    pub modules_root: PathBuf,

    /// Directory receiving generated scripts
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Directory holding create_vm_clone.sh and boot_vm_and_install.sh
    #[arg(long, value_name = "DIR", default_value = ".", env = "CLOUDBUILD_SCRIPTS_DIR")]
    pub scripts_dir: PathBuf,

    /// Absolute path on the provisioned hosts where generated files are copied
    #[arg(long, value_name = "DIR", default_value = cloudgen::generator::DEFAULT_REMOTE_ROOT)]
    pub remote_root: String,

    /// YAML (or JSON/TOML) file with the cloud configuration
    #[arg(value_name = "CLOUDCONF")]
    pub cloudconf: PathBuf,
}
