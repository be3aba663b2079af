//! NPC entity
//!
//! A plain data/behavior struct; the rendering collaborator wraps it. The
//! pool owns every `Npc` for its whole existence - other code addresses it
//! through pool handles only.

use glam::Vec2;

use rove_core::depth::DepthSortable;
use rove_nav::planner::PathTicket;
use rove_pool::{Handle, Recyclable};

use crate::state::{transition, BehaviorEvent, NpcState};

/// What a following NPC is tracking.
///
/// Entity targets are pool handles resolved on every use, never owning
/// references - a released target simply stops resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BehaviorTarget {
    /// The single observer viewpoint
    Observer,
    /// Another pooled entity
    Entity(Handle<Npc>),
}

/// Per-spawn NPC configuration
#[derive(Clone, Debug)]
pub struct NpcConfig {
    /// Pool-unique identifier, assigned by the controller
    pub id: u64,
    /// Display name; defaults to `"NPC {id}"`
    pub name: Option<String>,
    /// Movement speed in world units per second
    pub speed: Option<f32>,
    /// Interaction range in world units
    pub interaction_range: Option<f32>,
    /// Whether this NPC issues path requests
    pub use_pathfinding: bool,
    /// Initial patrol route
    pub patrol_points: Vec<Vec2>,
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            id: 0,
            name: None,
            speed: None,
            interaction_range: None,
            use_pathfinding: true,
            patrol_points: Vec::new(),
        }
    }
}

impl NpcConfig {
    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the movement speed
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Disable path requests for this NPC
    pub fn without_pathfinding(mut self) -> Self {
        self.use_pathfinding = false;
        self
    }
}

/// A pooled non-player character
pub struct Npc {
    pub id: u64,
    pub name: String,
    pub state: NpcState,
    pub position: Vec2,
    pub velocity: Vec2,
    pub speed: f32,
    pub interaction_range: f32,
    pub target: Option<BehaviorTarget>,
    pub patrol_points: Vec<Vec2>,
    pub patrol_index: usize,
    pub waypoints: Vec<Vec2>,
    pub waypoint_index: usize,
    pub use_pathfinding: bool,
    /// Timestamp of the last path request (ms)
    pub last_replan_ms: u64,
    /// In-flight path request, if any
    pub pending_path: Option<PathTicket>,
    pub moving: bool,
    /// Whether the rendering collaborator should draw this NPC; stripped
    /// on release
    pub visible: bool,
    pub depth_from_y: bool,
    pub depth_offset: f32,
    pub draw_order: f32,
}

impl Npc {
    /// Construct an inert, pool-owned NPC
    pub fn new() -> Self {
        Self {
            id: 0,
            name: String::new(),
            state: NpcState::Idle,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            speed: 50.0,
            interaction_range: 32.0,
            target: None,
            patrol_points: Vec::new(),
            patrol_index: 0,
            waypoints: Vec::new(),
            waypoint_index: 0,
            use_pathfinding: true,
            last_replan_ms: 0,
            pending_path: None,
            moving: false,
            visible: false,
            depth_from_y: true,
            depth_offset: 0.0,
            draw_order: 0.0,
        }
    }

    /// Run the transition table for an event and apply entry side effects
    pub fn apply_event(&mut self, event: BehaviorEvent) {
        let next = transition(self.state, event);
        if next != self.state {
            self.enter_state(next);
        }
    }

    fn enter_state(&mut self, next: NpcState) {
        match next {
            NpcState::Idle => {
                // Idle implies no residual goals of any kind
                self.target = None;
                self.patrol_points.clear();
                self.patrol_index = 0;
                self.clear_waypoints();
                self.stop();
            }
            NpcState::Follow => {
                self.clear_waypoints();
            }
            NpcState::Interact => {
                self.stop();
            }
            NpcState::Patrol => {}
        }
        self.state = next;
    }

    /// Install a patrol route and enter patrol
    pub fn assign_patrol(&mut self, points: Vec<Vec2>) {
        self.patrol_points = points;
        self.patrol_index = 0;
        self.clear_waypoints();
        self.apply_event(BehaviorEvent::PatrolAssigned);
    }

    /// Drop the current waypoint list and any in-flight request
    pub fn clear_waypoints(&mut self) {
        self.waypoints.clear();
        self.waypoint_index = 0;
        self.pending_path = None;
    }

    /// Steer in a straight line toward a point at full speed
    pub fn steer_toward(&mut self, goal: Vec2) {
        let delta = goal - self.position;
        if delta.length_squared() > f32::EPSILON {
            self.velocity = delta.normalize() * self.speed;
            self.moving = true;
        } else {
            self.stop();
        }
    }

    /// Zero the velocity
    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
        self.moving = false;
    }

    /// Advance along the waypoint list if one is present.
    ///
    /// Returns whether waypoints are still steering this NPC; `false`
    /// means the caller should fall back to direct steering.
    pub fn follow_waypoints(&mut self, arrival_threshold: f32) -> bool {
        if self.waypoints.is_empty() {
            return false;
        }
        if self.waypoint_index >= self.waypoints.len() {
            self.clear_waypoints();
            return false;
        }

        let waypoint = self.waypoints[self.waypoint_index];
        if self.position.distance(waypoint) < arrival_threshold {
            self.waypoint_index += 1;
            if self.waypoint_index >= self.waypoints.len() {
                self.clear_waypoints();
                return false;
            }
        } else {
            self.steer_toward(waypoint);
        }
        true
    }

    /// Whether a point is within this NPC's interaction range
    pub fn can_interact(&self, from: Vec2) -> bool {
        self.position.distance(from) < self.interaction_range
    }

    /// Apply a persisted state fragment.
    ///
    /// A saved `follow` has no target to restore and comes back idle.
    pub fn restore_saved(&mut self, state: NpcState, position: Vec2) {
        self.position = position;
        match state {
            NpcState::Follow => self.enter_state(NpcState::Idle),
            other => self.enter_state(other),
        }
    }

    fn clear_transient(&mut self) {
        self.state = NpcState::Idle;
        self.target = None;
        self.patrol_points.clear();
        self.patrol_index = 0;
        self.clear_waypoints();
        self.stop();
        self.last_replan_ms = 0;
    }
}

impl Default for Npc {
    fn default() -> Self {
        Self::new()
    }
}

impl Recyclable for Npc {
    type Config = NpcConfig;

    fn activate(&mut self, position: Vec2, config: NpcConfig) {
        self.clear_transient();
        self.visible = true;
        self.id = config.id;
        self.name = config
            .name
            .unwrap_or_else(|| format!("NPC {}", config.id));
        self.position = position;
        self.speed = config.speed.unwrap_or(50.0);
        self.interaction_range = config.interaction_range.unwrap_or(32.0);
        self.use_pathfinding = config.use_pathfinding;
        self.patrol_points = config.patrol_points;
        self.depth_from_y = true;
        self.depth_offset = 0.0;
        self.draw_order = position.y;
    }

    fn deactivate(&mut self) {
        self.visible = false;
        self.clear_transient();
    }
}

impl DepthSortable for Npc {
    fn depth_y(&self) -> Option<f32> {
        Some(self.position.y)
    }

    fn depth_from_y(&self) -> bool {
        self.depth_from_y
    }

    fn depth_offset(&self) -> f32 {
        self.depth_offset
    }

    fn set_draw_order(&mut self, order: f32) {
        self.draw_order = order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_npc() -> Npc {
        let mut npc = Npc::new();
        npc.activate(Vec2::new(100.0, 100.0), NpcConfig::default());
        npc
    }

    #[test]
    fn test_entering_idle_clears_goals() {
        let mut npc = active_npc();
        npc.target = Some(BehaviorTarget::Observer);
        npc.apply_event(BehaviorEvent::ObserverEntered);
        assert_eq!(npc.state, NpcState::Follow);

        npc.waypoints = vec![Vec2::new(1.0, 1.0)];
        npc.apply_event(BehaviorEvent::TargetLost);

        assert_eq!(npc.state, NpcState::Idle);
        assert!(npc.target.is_none());
        assert!(npc.waypoints.is_empty());
        assert!(npc.patrol_points.is_empty());
    }

    #[test]
    fn test_entering_follow_clears_residual_waypoints() {
        let mut npc = active_npc();
        npc.assign_patrol(vec![Vec2::new(200.0, 100.0)]);
        npc.waypoints = vec![Vec2::new(150.0, 100.0)];

        npc.target = Some(BehaviorTarget::Observer);
        npc.apply_event(BehaviorEvent::ObserverEntered);

        assert_eq!(npc.state, NpcState::Follow);
        assert!(npc.waypoints.is_empty());
    }

    #[test]
    fn test_waypoint_advance_and_exhaustion() {
        let mut npc = active_npc();
        npc.waypoints = vec![Vec2::new(105.0, 100.0), Vec2::new(200.0, 100.0)];

        // First waypoint is inside the threshold: advance to the second
        assert!(npc.follow_waypoints(10.0));
        assert_eq!(npc.waypoint_index, 1);

        // Second is far: steer toward it
        assert!(npc.follow_waypoints(10.0));
        assert!(npc.velocity.x > 0.0);

        // Arriving at the last waypoint exhausts the list
        npc.position = Vec2::new(195.0, 100.0);
        assert!(!npc.follow_waypoints(10.0));
        assert!(npc.waypoints.is_empty());
    }

    #[test]
    fn test_steer_toward_uses_full_speed() {
        let mut npc = active_npc();
        npc.speed = 60.0;
        npc.steer_toward(Vec2::new(100.0, 200.0));

        assert!((npc.velocity.length() - 60.0).abs() < 0.001);
        assert!(npc.velocity.y > 0.0);
        assert_eq!(npc.velocity.x, 0.0);
    }

    #[test]
    fn test_recycle_clears_previous_life() {
        let mut npc = active_npc();
        npc.target = Some(BehaviorTarget::Observer);
        npc.apply_event(BehaviorEvent::ObserverEntered);
        npc.waypoints = vec![Vec2::ZERO];

        npc.deactivate();
        assert!(!npc.visible);

        npc.activate(Vec2::new(5.0, 5.0), NpcConfig::default().with_name("Fresh"));

        assert_eq!(npc.state, NpcState::Idle);
        assert!(npc.target.is_none());
        assert!(npc.waypoints.is_empty());
        assert!(npc.visible);
        assert_eq!(npc.name, "Fresh");
        assert_eq!(npc.position, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_restore_saved_follow_comes_back_idle() {
        let mut npc = active_npc();
        npc.restore_saved(NpcState::Follow, Vec2::new(9.0, 9.0));

        assert_eq!(npc.state, NpcState::Idle);
        assert_eq!(npc.position, Vec2::new(9.0, 9.0));

        npc.restore_saved(NpcState::Patrol, Vec2::new(1.0, 2.0));
        assert_eq!(npc.state, NpcState::Patrol);
    }
}
