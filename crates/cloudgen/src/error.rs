//! Error types for topology loading and script generation.
//!
//! Errors fall into two families: problems with the input (bad or
//! incomplete topology, missing templates) and I/O failures while
//! writing the generated files. [`Error::is_input_error`] separates them.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a topology or generating scripts.
#[derive(Debug, Error)]
pub enum Error {
    /// A required global setting is empty or absent
    #[error("cloud config does not define `{0}`; fill in the config and re-run")]
    MissingSetting(&'static str),

    /// No module directory exists for the image/version pair
    #[error("building OpenStack '{version}' on '{base_vm}' is not supported ({} does not exist)", path.display())]
    UnsupportedRelease {
        /// Base VM image name
        base_vm: String,
        /// OpenStack release name
        version: String,
        /// Module directory that was looked up
        path: PathBuf,
    },

    /// Host entry has an unknown role
    #[error("host `{host}` has unknown role `{role}` (expected controller or compute)")]
    UnknownRole {
        /// Hostname of the offending entry
        host: String,
        /// Role as written in the document
        role: String,
    },

    /// Host entry is structurally invalid
    #[error("host `{host}` is invalid: {reason}")]
    InvalidHost {
        /// Hostname of the offending entry
        host: String,
        /// What is wrong with it
        reason: String,
    },

    /// The topology document could not be parsed
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// Document path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// A declared module has no template file
    #[error("template for module `{module}` of host `{host}` not found: {}", path.display())]
    TemplateNotFound {
        /// Host being generated
        host: String,
        /// Module name as declared
        module: String,
        /// Template path that was looked up
        path: PathBuf,
    },

    /// A template references the controller hostname but no controller exists
    #[error("template for host `{host}` references CONTROLLER_HOSTNAME but the topology has no controller")]
    MissingController {
        /// Host being generated
        host: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error is caused by the topology or its templates rather
    /// than by the environment.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Result type for topology and generation operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors() {
        assert!(Error::MissingSetting("base_vm").is_input_error());
        assert!(
            Error::MissingController {
                host: "a".to_string()
            }
            .is_input_error()
        );
        let io = Error::Io(std::io::Error::other("disk full"));
        assert!(!io.is_input_error());
    }

    #[test]
    fn test_unsupported_release_message() {
        let err = Error::UnsupportedRelease {
            base_vm: "ubuntu".to_string(),
            version: "mitaka".to_string(),
            path: PathBuf::from("/x/ubuntu/mitaka"),
        };
        let msg = err.to_string();
        assert!(msg.contains("'mitaka'"));
        assert!(msg.contains("/x/ubuntu/mitaka"));
    }
}
