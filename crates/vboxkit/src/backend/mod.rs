//! Backend abstraction for the virtualization tool.
//!
//! The [`Backend`] trait defines the primitives the reconciler needs,
//! allowing for different implementations (real `VBoxManage` CLI, mock
//! for testing).

pub mod vboxmanage;

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Which machines to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listing {
    /// Every registered machine
    All,
    /// Only machines that are currently running
    Running,
}

/// Backend trait for virtual machine inventory operations.
pub trait Backend: Send + Sync {
    /// Names of the machines in the given listing.
    fn list_machines(&self, listing: Listing) -> Result<Vec<String>>;

    /// Power off a running machine, returning once it is off.
    fn poweroff(&self, name: &str) -> Result<()>;

    /// Unregister a machine from the tool.
    fn unregister(&self, name: &str) -> Result<()>;

    /// Delete the machine's local configuration directory.
    fn delete_config(&self, name: &str) -> Result<()>;
}

/// A call recorded by [`MockBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `list_machines`
    List(Listing),
    /// `poweroff`
    PowerOff(String),
    /// `unregister`
    Unregister(String),
    /// `delete_config`
    DeleteConfig(String),
}

impl Call {
    /// Whether the call changes the inventory.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::List(_))
    }
}

#[derive(Debug, Default)]
struct MockState {
    machines: Vec<String>,
    running: HashSet<String>,
    failing_lists: HashSet<Listing>,
    failing_unregister: HashSet<String>,
    calls: Vec<Call>,
}

/// In-memory backend for testing without VirtualBox.
///
/// Every call is recorded and mutations are applied to the in-memory
/// inventory.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stopped machine.
    pub fn add_machine(&self, name: impl Into<String>) {
        self.state.lock().unwrap().machines.push(name.into());
    }

    /// Register a running machine.
    pub fn add_running(&self, name: impl Into<String>) {
        let name = name.into();
        let mut state = self.state.lock().unwrap();
        state.machines.push(name.clone());
        state.running.insert(name);
    }

    /// Make a listing fail with a non-zero status.
    pub fn fail_listing(&self, listing: Listing) {
        self.state.lock().unwrap().failing_lists.insert(listing);
    }

    /// Make unregistering `name` fail.
    pub fn fail_unregister(&self, name: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .failing_unregister
            .insert(name.into());
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls that changed the inventory, in order.
    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    /// Machines still registered.
    pub fn machines(&self) -> Vec<String> {
        self.state.lock().unwrap().machines.clone()
    }
}

impl Backend for MockBackend {
    fn list_machines(&self, listing: Listing) -> Result<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List(listing));
        if state.failing_lists.contains(&listing) {
            return Err(Error::CommandFailed {
                command: format!("list {listing:?}"),
                code: Some(1),
                stderr: "mock failure".to_string(),
            });
        }
        Ok(match listing {
            Listing::All => state.machines.clone(),
            Listing::Running => state
                .machines
                .iter()
                .filter(|m| state.running.contains(*m))
                .cloned()
                .collect(),
        })
    }

    fn poweroff(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::PowerOff(name.to_string()));
        state.running.remove(name);
        Ok(())
    }

    fn unregister(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Unregister(name.to_string()));
        if state.failing_unregister.contains(name) {
            return Err(Error::CommandFailed {
                command: format!("unregistervm {name}"),
                code: Some(2),
                stderr: "mock failure".to_string(),
            });
        }
        state.machines.retain(|m| m != name);
        Ok(())
    }

    fn delete_config(&self, name: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(Call::DeleteConfig(name.to_string()));
        Ok(())
    }
}
