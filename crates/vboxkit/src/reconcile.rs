//! Reconciliation of declared hosts against the existing inventory.
//!
//! Machines whose name matches a declared host are conflicts. Without
//! removal permission they block the build; with it, each one is powered
//! off (if running) and then unregistered and its configuration deleted.
//!
//! Reconciliation is not transactional: an error from the tool stops the
//! remaining removals and leaves earlier ones in place.

use crate::backend::{Backend, Listing};
use crate::error::Result;
use std::collections::HashSet;

/// Outcome of a reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// No declared host exists yet
    Clear,
    /// Conflicting machines were removed, in removal order
    Removed(Vec<String>),
    /// Conflicting machines exist and removal was not allowed (sorted)
    Blocked(Vec<String>),
}

/// Existing machines of `listing` whose names are declared hosts.
///
/// A failing listing counts as empty.
fn existing(backend: &dyn Backend, listing: Listing, hosts: &HashSet<&str>) -> Vec<String> {
    match backend.list_machines(listing) {
        Ok(machines) => machines
            .into_iter()
            .filter(|m| hosts.contains(m.as_str()))
            .collect(),
        Err(e) => {
            log::warn!("Could not list {listing:?} machines, assuming none: {e}");
            Vec::new()
        }
    }
}

/// Reconcile the declared `hosts` with the tool's inventory.
pub fn reconcile(backend: &dyn Backend, hosts: &[&str], allow_removal: bool) -> Result<Reconciliation> {
    let declared: HashSet<&str> = hosts.iter().copied().collect();
    let conflicts = existing(backend, Listing::All, &declared);

    if conflicts.is_empty() {
        return Ok(Reconciliation::Clear);
    }

    if !allow_removal {
        let mut sorted = conflicts;
        sorted.sort();
        return Ok(Reconciliation::Blocked(sorted));
    }

    let running: HashSet<String> = existing(backend, Listing::Running, &declared)
        .into_iter()
        .collect();

    for machine in &conflicts {
        if running.contains(machine) {
            backend.poweroff(machine)?;
        }
        backend.unregister(machine)?;
        backend.delete_config(machine)?;
    }

    Ok(Reconciliation::Removed(conflicts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Call, MockBackend};

    #[test]
    fn test_clear_when_nothing_matches() {
        let mock = MockBackend::new();
        mock.add_machine("unrelated");
        let result = reconcile(&mock, &["a", "b"], false).unwrap();
        assert_eq!(result, Reconciliation::Clear);
    }

    #[test]
    fn test_conflicts_without_removal_block_and_do_not_mutate() {
        let mock = MockBackend::new();
        mock.add_running("b");
        mock.add_machine("a");
        mock.add_machine("other");

        let result = reconcile(&mock, &["a", "b"], false).unwrap();
        assert_eq!(
            result,
            Reconciliation::Blocked(vec!["a".to_string(), "b".to_string()])
        );
        assert!(mock.mutating_calls().is_empty());
        assert_eq!(mock.machines().len(), 3);
    }

    #[test]
    fn test_removal_powers_off_running_first() {
        let mock = MockBackend::new();
        mock.add_running("a");
        mock.add_machine("b");
        mock.add_machine("other");

        let result = reconcile(&mock, &["a", "b"], true).unwrap();
        assert_eq!(
            result,
            Reconciliation::Removed(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(
            mock.mutating_calls(),
            vec![
                Call::PowerOff("a".to_string()),
                Call::Unregister("a".to_string()),
                Call::DeleteConfig("a".to_string()),
                Call::Unregister("b".to_string()),
                Call::DeleteConfig("b".to_string()),
            ]
        );
        assert_eq!(mock.machines(), vec!["other"]);
    }

    #[test]
    fn test_each_conflict_removed_exactly_once() {
        let mock = MockBackend::new();
        for name in ["a", "b", "c"] {
            mock.add_running(name);
        }

        reconcile(&mock, &["a", "b", "c"], true).unwrap();
        let calls = mock.mutating_calls();
        for name in ["a", "b", "c"] {
            let unregisters = calls
                .iter()
                .filter(|c| **c == Call::Unregister(name.to_string()))
                .count();
            assert_eq!(unregisters, 1);
        }
    }

    #[test]
    fn test_failing_list_counts_as_empty() {
        let mock = MockBackend::new();
        mock.add_machine("a");
        mock.fail_listing(Listing::All);

        assert_eq!(reconcile(&mock, &["a"], false).unwrap(), Reconciliation::Clear);
    }

    #[test]
    fn test_tool_error_aborts_remaining_removals() {
        let mock = MockBackend::new();
        mock.add_machine("a");
        mock.add_machine("b");
        mock.add_machine("c");
        mock.fail_unregister("b");

        let err = reconcile(&mock, &["a", "b", "c"], true).unwrap_err();
        assert_eq!(err.exit_code(), Some(2));
        assert_eq!(mock.machines(), vec!["b", "c"]);
        assert!(!mock.calls().contains(&Call::Unregister("c".to_string())));
    }
}
