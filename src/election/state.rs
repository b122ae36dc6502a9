use std::fmt;

/// Leadership state of this replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeaderState {
    /// Not competing for the lease.
    #[default]
    Follower,
    /// Retrying acquisition until the lease is obtained.
    Acquiring,
    /// Holding the lease and renewing it.
    Leader,
}

impl fmt::Display for LeaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaderState::Follower => f.write_str("follower"),
            LeaderState::Acquiring => f.write_str("acquiring"),
            LeaderState::Leader => f.write_str("leader"),
        }
    }
}

/// Leadership change produced by a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    StartedLeading,
    StoppedLeading,
}

/// Tracks the leadership state and the last observed leader identity.
#[derive(Debug, Default)]
pub struct LeaderStateMachine {
    state: LeaderState,
    observed_leader: Option<String>,
}

impl LeaderStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LeaderState {
        self.state
    }

    pub fn is_leader(&self) -> bool {
        self.state == LeaderState::Leader
    }

    pub fn observed_leader(&self) -> Option<&str> {
        self.observed_leader.as_deref()
    }

    /// Moves a follower into the acquiring state. Any other state is left unchanged.
    pub fn begin_acquire(&mut self) {
        if self.state == LeaderState::Follower {
            self.state = LeaderState::Acquiring;
        }
    }

    /// Applies the result of an acquire or renew attempt.
    ///
    /// A renewal failure passed here means leadership is lost; the caller decides when
    /// a failed renewal is final.
    pub fn observe(&mut self, acquired: bool) -> Option<Transition> {
        match (self.state, acquired) {
            (LeaderState::Acquiring, true) => {
                self.state = LeaderState::Leader;
                Some(Transition::StartedLeading)
            }
            (LeaderState::Leader, false) => {
                self.state = LeaderState::Follower;
                Some(Transition::StoppedLeading)
            }
            _ => None,
        }
    }

    /// Returns to the follower state, e.g. on shutdown.
    pub fn stop(&mut self) -> Option<Transition> {
        let was_leader = self.is_leader();
        self.state = LeaderState::Follower;
        was_leader.then_some(Transition::StoppedLeading)
    }

    /// Records the current lease holder and returns `true` if it differs from the
    /// previously observed one.
    pub fn observe_leader(&mut self, identity: &str) -> bool {
        if self.observed_leader.as_deref() == Some(identity) {
            return false;
        }
        self.observed_leader = Some(identity.to_owned());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_follower() {
        let machine = LeaderStateMachine::new();
        assert_eq!(machine.state(), LeaderState::Follower);
        assert!(machine.observed_leader().is_none());
    }

    #[test]
    fn test_follower_ignores_observations() {
        let mut machine = LeaderStateMachine::new();
        assert_eq!(machine.observe(true), None);
        assert_eq!(machine.state(), LeaderState::Follower);
    }

    #[test]
    fn test_acquire_then_lose() {
        let mut machine = LeaderStateMachine::new();
        machine.begin_acquire();
        assert_eq!(machine.state(), LeaderState::Acquiring);

        assert_eq!(machine.observe(false), None);
        assert_eq!(machine.state(), LeaderState::Acquiring);

        assert_eq!(machine.observe(true), Some(Transition::StartedLeading));
        assert!(machine.is_leader());

        // Renewals do not start leading again.
        assert_eq!(machine.observe(true), None);
        assert!(machine.is_leader());

        assert_eq!(machine.observe(false), Some(Transition::StoppedLeading));
        assert_eq!(machine.state(), LeaderState::Follower);
    }

    #[test]
    fn test_begin_acquire_keeps_leader() {
        let mut machine = LeaderStateMachine::new();
        machine.begin_acquire();
        machine.observe(true);
        machine.begin_acquire();
        assert!(machine.is_leader());
    }

    #[test]
    fn test_stop() {
        let mut machine = LeaderStateMachine::new();
        machine.begin_acquire();
        assert_eq!(machine.stop(), None);

        machine.begin_acquire();
        machine.observe(true);
        assert_eq!(machine.stop(), Some(Transition::StoppedLeading));
        assert_eq!(machine.state(), LeaderState::Follower);
    }

    #[test]
    fn test_observe_leader_reports_changes_only() {
        let mut machine = LeaderStateMachine::new();
        assert!(machine.observe_leader("pod-a"));
        assert!(!machine.observe_leader("pod-a"));
        assert!(machine.observe_leader("pod-b"));
        assert_eq!(machine.observed_leader(), Some("pod-b"));
    }
}
