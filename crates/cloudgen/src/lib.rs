//! # cloudgen
//!
//! Compiles a declarative cloud topology into per-host provisioning scripts.
//!
//! This crate provides functionality for:
//! - Parsing topology documents (YAML, JSON or TOML)
//! - Validating global settings, roles and host addresses
//! - Substituting placeholders in module templates per host
//! - Writing install and cleanup scripts plus expanded modules
//!
//! ## Example
//!
//! ```no_run
//! use cloudgen::{GenerateOptions, RawTopology, Topology, generate_all};
//! use std::path::Path;
//!
//! let raw = RawTopology::read(Path::new("cloud.yaml")).expect("unreadable topology");
//! let topology = Topology::load(raw, Path::new(".")).expect("invalid topology");
//!
//! for files in generate_all(&topology, &GenerateOptions::default()).expect("generation failed") {
//!     println!("{}: {}", files.hostname, files.install_script.display());
//! }
//! ```
//!
//! ## Module templates
//!
//! Templates live in `<modules_root>/<base_vm>/<openstack_version>/` as
//! `in_<module>` (install) and `out_<module>` (cleanup) files. Install
//! scripts run modules in declared order, cleanup scripts in reverse.

#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod generator;
pub mod outdir;
pub mod remap;
pub mod topology;

pub use document::{ConfigValue, DocumentFormat, RawHost, RawTopology};
pub use error::{Error, Result};
pub use generator::{
    GenerateOptions, GeneratedFiles, GeneratedScript, HostArtifacts, generate, generate_all,
};
pub use outdir::FreshDir;
pub use remap::{Remapper, RepoAccess};
pub use topology::{Host, Role, RoleIndex, Settings, Topology};
