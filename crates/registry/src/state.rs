//! Persistent reference-count table of network usage.
//!
//! Maps each logical network to the set of components currently using it.
//! The file on disk is the single source of truth; every successful
//! mutation is persisted before it is reported back to the caller.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{RegistryError, Result};
use crate::persist::atomic_write;

/// Action applied by [`UsageState::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
    /// Insert the component into the network's participant set.
    Add,
    /// Remove the component from the network's participant set.
    Remove,
}

/// On-disk shape of the state file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedState {
    network_usage: BTreeMap<String, BTreeSet<String>>,
}

/// Reference-counted usage state, persisted to a JSON file.
#[derive(Debug)]
pub struct UsageState {
    path: PathBuf,
    current: PersistedState,
}

impl UsageState {
    /// Loads the state from `path`.
    ///
    /// A missing file is not an error: the state starts empty and is
    /// persisted immediately so the file exists from then on.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let current = match std::fs::read(&path) {
            Ok(data) => serde_json::from_slice(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "state file not found, creating empty state");
                PersistedState::default()
            }
            Err(e) => return Err(e.into()),
        };
        let state = Self { path, current };
        state.save()?;
        Ok(state)
    }

    /// Persists the full state to disk.
    fn save(&self) -> Result<()> {
        let data = serde_json::to_vec(&self.current)?;
        atomic_write(&self.path, &data)?;
        Ok(())
    }

    /// Adds or removes a participant and persists the result.
    ///
    /// Set semantics: adding a component twice or removing a non-member is
    /// a no-op, not an error. A never-seen network is created on `Add`.
    pub fn update(&mut self, network: &str, component: &str, action: UpdateAction) -> Result<()> {
        match action {
            UpdateAction::Add => {
                self.current
                    .network_usage
                    .entry(network.to_string())
                    .or_default()
                    .insert(component.to_string());
            }
            UpdateAction::Remove => {
                if let Some(components) = self.current.network_usage.get_mut(network) {
                    components.remove(component);
                }
            }
        }
        self.save()
    }

    /// Number of distinct components registered for `network`.
    pub fn usage(&self, network: &str) -> Result<usize> {
        self.current
            .network_usage
            .get(network)
            .map(BTreeSet::len)
            .ok_or_else(|| RegistryError::NetworkNotFound(network.to_string()))
    }

    /// True when the network has no participants left.
    pub fn can_delete(&self, network: &str) -> Result<bool> {
        Ok(self.usage(network)? == 0)
    }

    /// Removes the network's record and persists.
    ///
    /// Deletion is an explicit action: a network with zero participants is
    /// only eligible, never removed implicitly.
    pub fn delete(&mut self, network: &str) -> Result<()> {
        let usage = self.usage(network)?;
        if usage > 0 {
            return Err(RegistryError::NetworkInUse(network.to_string()));
        }
        self.current.network_usage.remove(network);
        self.save()
    }

    /// Networks currently known to the state, in stable order.
    pub fn networks(&self) -> impl Iterator<Item = &str> {
        self.current.network_usage.keys().map(String::as_str)
    }

    #[cfg(test)]
    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_state() -> (tempfile::TempDir, UsageState) {
        let dir = tempfile::tempdir().unwrap();
        let state = UsageState::load(dir.path().join("state.json")).unwrap();
        (dir, state)
    }

    #[test]
    fn test_missing_file_creates_empty_state() {
        let (_dir, state) = temp_state();
        assert!(state.path().exists());
        assert!(matches!(
            state.usage("foo"),
            Err(RegistryError::NetworkNotFound(_))
        ));
    }

    #[test]
    fn test_update_and_usage() {
        let (_dir, mut state) = temp_state();
        state.update("foo", "comp1", UpdateAction::Add).unwrap();
        state.update("foo", "comp2", UpdateAction::Add).unwrap();
        assert_eq!(state.usage("foo").unwrap(), 2);

        // duplicate registration is a no-op
        state.update("foo", "comp1", UpdateAction::Add).unwrap();
        assert_eq!(state.usage("foo").unwrap(), 2);

        state.update("foo", "comp1", UpdateAction::Remove).unwrap();
        assert_eq!(state.usage("foo").unwrap(), 1);

        // removing a non-member is a no-op
        state.update("foo", "ghost", UpdateAction::Remove).unwrap();
        assert_eq!(state.usage("foo").unwrap(), 1);
    }

    #[test]
    fn test_delete_lifecycle() {
        let (_dir, mut state) = temp_state();
        state.update("foo", "comp1", UpdateAction::Add).unwrap();

        assert!(!state.can_delete("foo").unwrap());
        assert!(matches!(
            state.delete("foo"),
            Err(RegistryError::NetworkInUse(_))
        ));

        state.update("foo", "comp1", UpdateAction::Remove).unwrap();
        assert!(state.can_delete("foo").unwrap());
        state.delete("foo").unwrap();

        assert!(matches!(
            state.usage("foo"),
            Err(RegistryError::NetworkNotFound(_))
        ));
        assert!(matches!(
            state.can_delete("foo"),
            Err(RegistryError::NetworkNotFound(_))
        ));
    }

    #[test]
    fn test_state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        {
            let mut state = UsageState::load(&path).unwrap();
            state.update("foo", "comp1", UpdateAction::Add).unwrap();
            state.update("bar", "comp2", UpdateAction::Add).unwrap();
            state.update("bar", "comp3", UpdateAction::Add).unwrap();
        }
        let state = UsageState::load(&path).unwrap();
        assert_eq!(state.usage("foo").unwrap(), 1);
        assert_eq!(state.usage("bar").unwrap(), 2);
        assert_eq!(state.networks().collect::<Vec<_>>(), vec!["bar", "foo"]);
    }
}
