//! Per-server lifecycle state machine (spec.md §4.5).

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerState {
    Spawned,
    Handshaking,
    Ready,
    Draining,
    Terminated,
}

impl ServerState {
    /// Whether `to` is a legal transition from `self`.
    pub fn can_transition_to(self, to: ServerState) -> bool {
        use ServerState::*;
        matches!(
            (self, to),
            (Spawned, Handshaking)
                | (Handshaking, Ready)
                | (Spawned, Terminated)
                | (Handshaking, Terminated)
                | (Ready, Terminated)
                | (Ready, Draining)
                | (Draining, Terminated)
                // auto-restart re-enters Spawned from Terminated.
                | (Terminated, Spawned)
        )
    }
}

/// Backoff schedule for auto-restart: 100ms, 500ms, 2s, 10s, then disable.
pub const RESTART_BACKOFF_MS: &[u64] = &[100, 500, 2_000, 10_000];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawned_to_ready_is_illegal_without_handshake() {
        assert!(!ServerState::Spawned.can_transition_to(ServerState::Ready));
    }

    #[test]
    fn full_happy_path_is_legal() {
        assert!(ServerState::Spawned.can_transition_to(ServerState::Handshaking));
        assert!(ServerState::Handshaking.can_transition_to(ServerState::Ready));
        assert!(ServerState::Ready.can_transition_to(ServerState::Draining));
        assert!(ServerState::Draining.can_transition_to(ServerState::Terminated));
    }

    #[test]
    fn terminated_can_restart_into_spawned() {
        assert!(ServerState::Terminated.can_transition_to(ServerState::Spawned));
    }
}
