//! Execution of the external helper scripts.

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Exit status of a helper script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptStatus {
    code: Option<i32>,
}

impl ScriptStatus {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Status of a script killed by a signal.
    pub fn killed() -> Self {
        Self { code: None }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }
}

impl From<ExitStatus> for ScriptStatus {
    fn from(status: ExitStatus) -> Self {
        status.code().map_or_else(Self::killed, Self::from_code)
    }
}

/// Runs a helper script with extra environment variables.
///
/// The variables are added to the inherited environment.
pub trait ScriptRunner: Send + Sync {
    fn run(&self, script: &Path, env: &[(&str, String)]) -> io::Result<ScriptStatus>;
}

/// Runs scripts as child processes with inherited stdio
pub struct ShellRunner;

impl ScriptRunner for ShellRunner {
    fn run(&self, script: &Path, env: &[(&str, String)]) -> io::Result<ScriptStatus> {
        log::debug!(
            "Executing: {} {}",
            env.iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(" "),
            script.display()
        );
        Command::new(script)
            .envs(env.iter().map(|(k, v)| (*k, v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map(ScriptStatus::from)
    }
}

#[cfg(test)]
pub mod testing {
    use super::{ScriptRunner, ScriptStatus};
    use std::collections::HashMap;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// A recorded script invocation
    #[derive(Debug, Clone)]
    pub struct Invocation {
        pub script: PathBuf,
        pub env: HashMap<String, String>,
    }

    /// Records invocations instead of running anything.
    #[derive(Default)]
    pub struct RecordingRunner {
        invocations: Mutex<Vec<Invocation>>,
        exit_codes: HashMap<(String, String), i32>,
        delay: Duration,
        pub finished: AtomicUsize,
    }

    impl RecordingRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Exit with `code` when `key` is set to `value`.
        pub fn exit_when(mut self, key: &str, value: &str, code: i32) -> Self {
            self.exit_codes
                .insert((key.to_string(), value.to_string()), code);
            self
        }

        /// Sleep for `delay` inside every invocation.
        pub fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn invocations(&self) -> Vec<Invocation> {
            self.invocations.lock().unwrap().clone()
        }
    }

    impl ScriptRunner for RecordingRunner {
        fn run(&self, script: &Path, env: &[(&str, String)]) -> io::Result<ScriptStatus> {
            let env: HashMap<String, String> = env
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect();
            self.invocations.lock().unwrap().push(Invocation {
                script: script.to_path_buf(),
                env: env.clone(),
            });
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            let code = env
                .iter()
                .find_map(|(k, v)| self.exit_codes.get(&(k.clone(), v.clone())))
                .copied()
                .unwrap_or(0);
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(ScriptStatus::from_code(code))
        }
    }
}
