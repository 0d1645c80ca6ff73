//! Error types for VirtualBox operations.

use thiserror::Error;

/// Errors that can occur while talking to the virtualization tool.
#[derive(Debug, Error)]
pub enum Error {
    /// The tool could not be started at all
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        /// Command line that was attempted
        command: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and exited unsuccessfully
    #[error("`{command}` failed{}: {stderr}", code.map(|c| format!(" with exit status {c}")).unwrap_or_default())]
    CommandFailed {
        /// Command line that failed
        command: String,
        /// Exit status, `None` when killed by a signal
        code: Option<i32>,
        /// Standard error output of the failed command
        stderr: String,
    },

    /// Home directory could not be determined
    #[error("could not determine home directory")]
    NoHomeDirectory,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Exit status reported by the external tool, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { code, .. } => *code,
            _ => None,
        }
    }
}

/// Result type for VirtualBox operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_message() {
        let err = Error::CommandFailed {
            command: "VBoxManage unregistervm ctl".to_string(),
            code: Some(1),
            stderr: "VBOX_E_OBJECT_NOT_FOUND".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "`VBoxManage unregistervm ctl` failed with exit status 1: VBOX_E_OBJECT_NOT_FOUND"
        );
        assert_eq!(err.exit_code(), Some(1));
    }

    #[test]
    fn test_signal_has_no_exit_code() {
        let err = Error::CommandFailed {
            command: "VBoxManage list vms".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert_eq!(err.exit_code(), None);
        assert!(!err.to_string().contains("exit status"));
        assert_eq!(Error::NoHomeDirectory.exit_code(), None);
    }
}
