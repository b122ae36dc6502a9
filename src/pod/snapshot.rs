use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use super::{PodPhase, PodState};

/// A shareable, point-in-time view of a single pod.
///
/// Every accessor takes the read lock on its own. Two consecutive accessor calls may
/// therefore observe different states if an [`update`](PodSnapshot::update) runs in
/// between; use [`state`](PodSnapshot::state) when several fields must agree.
#[derive(Debug, Default)]
pub struct PodSnapshot {
    state: RwLock<PodState>,
}

impl PodSnapshot {
    /// Wraps an observed pod state.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pod_status_logger::pod::{PodPhase, PodSnapshot, PodState};
    /// let snapshot = PodSnapshot::new(PodState::new("b", "", PodPhase::Pending));
    /// assert!(!snapshot.is_scheduled());
    /// assert_eq!(snapshot.phase(), PodPhase::Pending);
    /// ```
    pub fn new(state: PodState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Replaces all fields at once under the write lock.
    pub fn update(&self, state: PodState) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *guard = state;
    }

    /// Returns `true` if the pod has been assigned to a node.
    pub fn is_scheduled(&self) -> bool {
        !self.read().node_name.is_empty()
    }

    /// Returns the node the pod is scheduled on, or an empty string.
    pub fn node_name(&self) -> String {
        self.read().node_name.clone()
    }

    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    pub fn phase(&self) -> PodPhase {
        self.read().phase
    }

    /// Returns a copy of all fields taken under a single read lock.
    pub fn state(&self) -> PodState {
        self.read().clone()
    }

    // A panicking writer cannot leave a torn state behind since `update` is a single
    // assignment, so a poisoned lock is still safe to read.
    fn read(&self) -> RwLockReadGuard<'_, PodState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<PodState> for PodSnapshot {
    fn from(state: PodState) -> Self {
        Self::new(state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_accessors() {
        let snapshot = PodSnapshot::new(PodState::new("a", "n1", PodPhase::Running));
        assert_eq!(snapshot.name(), "a");
        assert_eq!(snapshot.node_name(), "n1");
        assert_eq!(snapshot.phase(), PodPhase::Running);
        assert!(snapshot.is_scheduled());
    }

    #[test]
    fn test_unscheduled_pod() {
        let snapshot = PodSnapshot::new(PodState::new("b", "", PodPhase::Pending));
        assert!(!snapshot.is_scheduled());
        assert_eq!(snapshot.node_name(), "");
    }

    #[test]
    fn test_update_replaces_every_field() {
        let snapshot = PodSnapshot::new(PodState::new("a", "n1", PodPhase::Running));
        snapshot.update(PodState::new("a-2", "", PodPhase::Failed));
        assert_eq!(snapshot.state(), PodState::new("a-2", "", PodPhase::Failed));
        assert!(!snapshot.is_scheduled());
    }

    #[test]
    fn test_concurrent_update_and_read() {
        let states = [
            PodState::new("alpha", "node-alpha", PodPhase::Running),
            PodState::new("beta", "", PodPhase::Pending),
        ];
        let snapshot = Arc::new(PodSnapshot::new(states[0].clone()));

        let writers: Vec<_> = (0..4)
            .map(|i| {
                let snapshot = Arc::clone(&snapshot);
                let states = states.clone();
                thread::spawn(move || {
                    for n in 0..1_000 {
                        snapshot.update(states[(i + n) % 2].clone());
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let snapshot = Arc::clone(&snapshot);
                let states = states.clone();
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        let state = snapshot.state();
                        assert!(states.contains(&state), "torn read: {state:?}");

                        let name = snapshot.name();
                        assert!(name == "alpha" || name == "beta");
                        let node = snapshot.node_name();
                        assert!(node == "node-alpha" || node.is_empty());
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }
    }
}
