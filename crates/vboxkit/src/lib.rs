//! # vboxkit
//!
//! VirtualBox inventory access for provisioning tools.
//!
//! This crate provides functionality for:
//! - Listing registered and running machines via `VBoxManage`
//! - Powering off, unregistering and deleting machines
//! - Reconciling a declared host set with the existing inventory
//!
//! ## Example
//!
//! ```no_run
//! use vboxkit::backend::vboxmanage::VBoxManageBackend;
//! use vboxkit::{Reconciliation, reconcile};
//!
//! let backend = VBoxManageBackend::new().expect("no home directory");
//! match reconcile(&backend, &["controller", "compute1"], false).expect("VBoxManage failed") {
//!     Reconciliation::Blocked(names) => eprintln!("already exist: {names:?}"),
//!     _ => println!("ready to clone"),
//! }
//! ```
//!
//! Tests use [`backend::MockBackend`], which records every call.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod reconcile;

pub use backend::{Backend, Listing};
pub use error::{Error, Result};
pub use reconcile::{Reconciliation, reconcile};
