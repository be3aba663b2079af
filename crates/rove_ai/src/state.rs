//! NPC state machine
//!
//! States are a plain enum and transitions an explicit function, so the
//! compiler checks exhaustiveness and there are no stringly-typed handler
//! keys. Entry side effects (clearing targets and waypoints) live on
//! [`Npc::apply_event`](crate::npc::Npc::apply_event).

use serde::{Deserialize, Serialize};

/// Behavior state of an NPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NpcState {
    Idle,
    Patrol,
    Follow,
    Interact,
}

impl NpcState {
    /// Name used in the persisted save blob
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Patrol => "patrol",
            Self::Follow => "follow",
            Self::Interact => "interact",
        }
    }

    /// Parse a persisted state name
    pub fn from_str(name: &str) -> Option<Self> {
        match name {
            "idle" => Some(Self::Idle),
            "patrol" => Some(Self::Patrol),
            "follow" => Some(Self::Follow),
            "interact" => Some(Self::Interact),
            _ => None,
        }
    }
}

/// Events that drive state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorEvent {
    /// The observer entered notice range
    ObserverEntered,
    /// The follow distance limit was exceeded
    ObserverLeft,
    /// The followed target no longer resolves
    TargetLost,
    /// A patrol route (or wander target) was assigned
    PatrolAssigned,
    /// Behavior selection rolled idle
    IdleChosen,
    /// An explicit interaction request arrived
    InteractionStarted,
    /// The interaction completed
    InteractionFinished,
}

/// The transition table.
///
/// Unlisted pairs keep the current state; interaction requests win from
/// any state.
pub fn transition(state: NpcState, event: BehaviorEvent) -> NpcState {
    use BehaviorEvent::*;
    use NpcState::*;

    match (state, event) {
        (_, InteractionStarted) => Interact,
        (Interact, InteractionFinished) => Idle,
        (Interact, _) => Interact,

        (Idle | Patrol, ObserverEntered) => Follow,
        (Follow, ObserverLeft | TargetLost) => Idle,
        (Idle | Patrol, PatrolAssigned) => Patrol,
        (Idle | Patrol | Follow, IdleChosen) => Idle,

        (state, _) => state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BehaviorEvent::*;
    use NpcState::*;

    #[test]
    fn test_observer_transitions() {
        assert_eq!(transition(Idle, ObserverEntered), Follow);
        assert_eq!(transition(Patrol, ObserverEntered), Follow);
        assert_eq!(transition(Follow, ObserverEntered), Follow);
        assert_eq!(transition(Follow, ObserverLeft), Idle);
        assert_eq!(transition(Follow, TargetLost), Idle);
    }

    #[test]
    fn test_interaction_wins_from_any_state() {
        for state in [Idle, Patrol, Follow, Interact] {
            assert_eq!(transition(state, InteractionStarted), Interact);
        }
        assert_eq!(transition(Interact, InteractionFinished), Idle);
        // Nothing else moves an interacting NPC
        assert_eq!(transition(Interact, ObserverEntered), Interact);
        assert_eq!(transition(Interact, PatrolAssigned), Interact);
    }

    #[test]
    fn test_behavior_rolls() {
        assert_eq!(transition(Idle, PatrolAssigned), Patrol);
        assert_eq!(transition(Patrol, PatrolAssigned), Patrol);
        assert_eq!(transition(Patrol, IdleChosen), Idle);
        // A follower ignores route assignment
        assert_eq!(transition(Follow, PatrolAssigned), Follow);
    }

    #[test]
    fn test_state_names_round_trip() {
        for state in [Idle, Patrol, Follow, Interact] {
            assert_eq!(NpcState::from_str(state.as_str()), Some(state));
        }
        assert_eq!(NpcState::from_str("asleep"), None);
    }
}
