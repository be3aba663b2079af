//! Behavior controller
//!
//! Owns the NPC pool and drives every active NPC once per frame: behavior
//! timers, patrol/follow steering, throttled path requests and movement
//! integration. Collision response is the physics collaborator's job; the
//! controller only produces velocities and integrates positions.

use std::collections::HashMap;

use glam::Vec2;

use rove_core::config::WorldConfig;
use rove_core::events::{EventSender, WorldEvent};
use rove_nav::planner::PathPlanner;
use rove_pool::{EntityPool, Handle};

use crate::npc::{BehaviorTarget, Npc, NpcConfig};
use crate::state::{BehaviorEvent, NpcState};

/// Persistable snapshot of one NPC
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NpcRecord {
    pub id: u64,
    pub state: NpcState,
    pub position: Vec2,
}

/// Radius of generated patrol rings, in world units
const PATROL_RING_RADIUS: f32 = 80.0;
/// Points per generated patrol ring
const PATROL_RING_POINTS: usize = 3;
/// Wander target distance range, in world units
const WANDER_DISTANCE: (f32, f32) = (50.0, 150.0);
/// NPC speed range rolled at spawn, world units per second
const SPAWN_SPEED: (f32, f32) = (40.0, 60.0);

/// Small xorshift generator for behavior rolls; seeded so runs reproduce
struct BehaviorRng {
    state: u64,
}

impl BehaviorRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.next_f32() * (hi - lo)
    }

    fn range_u64(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next_u64() % (hi - lo).max(1)
    }

    fn pick(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

/// Frame-constant parameters handed to the per-NPC tick
struct TickParams {
    now_ms: u64,
    arrival_threshold: f32,
    replan_interval_ms: u64,
    pathfinding_enabled: bool,
}

enum FollowOutcome {
    Kept,
    Dropped,
}

/// Drives all NPC behavior against the streamed world
pub struct BehaviorController {
    pool: EntityPool<Npc>,
    /// Behavior re-roll deadlines by NPC id (ms)
    timers: HashMap<u64, u64>,
    rng: BehaviorRng,
    next_id: u64,
    events: EventSender<WorldEvent>,
    arrival_threshold: f32,
    replan_interval_ms: u64,
    default_interaction_range: f32,
    pathfinding_enabled: bool,
    idle_timer_ms: (u64, u64),
    wander_timer_ms: (u64, u64),
}

impl BehaviorController {
    /// Create a controller with a pre-warmed pool
    pub fn new(config: &WorldConfig, events: EventSender<WorldEvent>) -> Self {
        Self {
            pool: EntityPool::new(Npc::new, config.npc_pool_size),
            timers: HashMap::new(),
            rng: BehaviorRng::new(config.behavior_seed),
            next_id: 1,
            events,
            arrival_threshold: config.arrival_threshold,
            replan_interval_ms: config.path_replan_interval_ms,
            default_interaction_range: config.interaction_range,
            pathfinding_enabled: config.pathfinding_enabled,
            idle_timer_ms: config.idle_timer_ms,
            wander_timer_ms: config.wander_timer_ms,
        }
    }

    /// Spawn an NPC at a position, rolling an initial behavior
    pub fn spawn(&mut self, position: Vec2, config: NpcConfig, now_ms: u64) -> Handle<Npc> {
        let id = self.next_id;
        self.next_id += 1;

        let mut config = config;
        config.id = id;
        if config.speed.is_none() {
            config.speed = Some(self.rng.range_f32(SPAWN_SPEED.0, SPAWN_SPEED.1));
        }
        config
            .interaction_range
            .get_or_insert(self.default_interaction_range);
        let has_route = !config.patrol_points.is_empty();

        let handle = self.pool.acquire(position, config);
        if has_route {
            if let Some(npc) = self.pool.get_mut(handle) {
                npc.apply_event(BehaviorEvent::PatrolAssigned);
            }
        } else {
            self.roll_behavior(handle, now_ms);
        }

        self.events.send(WorldEvent::NpcSpawned { id });
        log::debug!("spawned npc {id} at {position} ({} active)", self.pool.active_len());
        handle
    }

    /// Scatter NPCs uniformly over a square area (one streamed chunk)
    pub fn spawn_area(
        &mut self,
        origin: Vec2,
        size: f32,
        count: usize,
        name_prefix: &str,
        now_ms: u64,
    ) -> Vec<Handle<Npc>> {
        (0..count)
            .map(|i| {
                let position = origin
                    + Vec2::new(
                        self.rng.next_f32() * size,
                        self.rng.next_f32() * size,
                    );
                let config = NpcConfig::default().with_name(format!("{name_prefix}_{i}"));
                self.spawn(position, config, now_ms)
            })
            .collect()
    }

    /// Populate one streamed chunk with a rolled number of villagers (1-3)
    pub fn spawn_chunk_population(
        &mut self,
        origin: Vec2,
        size: f32,
        label: &str,
        now_ms: u64,
    ) -> Vec<Handle<Npc>> {
        let count = 1 + self.rng.pick(3) as usize;
        self.spawn_area(origin, size, count, label, now_ms)
    }

    /// Release an NPC back to the pool; no-op for stale handles
    pub fn despawn(&mut self, handle: Handle<Npc>) -> bool {
        if let Some(npc) = self.pool.get(handle) {
            self.timers.remove(&npc.id);
        }
        self.pool.release(handle)
    }

    /// Release every NPC
    pub fn despawn_all(&mut self) {
        self.timers.clear();
        self.pool.release_all();
    }

    /// Roll a fresh behavior: idle with a timer, a patrol ring, or a
    /// single wander target
    pub fn roll_behavior(&mut self, handle: Handle<Npc>, now_ms: u64) {
        let roll = self.rng.pick(3);
        let Some(npc) = self.pool.get_mut(handle) else {
            return;
        };
        let id = npc.id;

        match roll {
            0 => {
                npc.apply_event(BehaviorEvent::IdleChosen);
                let (lo, hi) = self.idle_timer_ms;
                let delay = self.rng.range_u64(lo, hi);
                self.timers.insert(id, now_ms + delay);
            }
            1 => {
                let points =
                    patrol_ring(npc.position, PATROL_RING_POINTS, PATROL_RING_RADIUS);
                npc.assign_patrol(points);
                self.timers.remove(&id);
            }
            _ => {
                let angle = self.rng.next_f32() * std::f32::consts::TAU;
                let distance = self.rng.range_f32(WANDER_DISTANCE.0, WANDER_DISTANCE.1);
                let target = npc.position + Vec2::from_angle(angle) * distance;
                npc.assign_patrol(vec![target]);
                let (lo, hi) = self.wander_timer_ms;
                let delay = self.rng.range_u64(lo, hi);
                self.timers.insert(id, now_ms + delay);
            }
        }
    }

    /// Advance every active NPC by one frame.
    ///
    /// `observer` is the current viewpoint position, if one exists; it is
    /// what `BehaviorTarget::Observer` resolves to.
    pub fn update(
        &mut self,
        now_ms: u64,
        dt: f32,
        planner: &mut PathPlanner,
        observer: Option<Vec2>,
    ) {
        let handles = self.pool.active_handles();

        // Expired behavior timers re-roll idle and wandering NPCs
        for &handle in &handles {
            let Some(npc) = self.pool.get(handle) else {
                continue;
            };
            let due = self.timers.get(&npc.id).is_some_and(|&at| now_ms >= at);
            if due && matches!(npc.state, NpcState::Idle | NpcState::Patrol) {
                let id = npc.id;
                self.timers.remove(&id);
                self.roll_behavior(handle, now_ms);
            }
        }

        // Resolve follow targets before borrowing entities mutably
        let mut target_positions: HashMap<u64, Option<Vec2>> = HashMap::new();
        for (_, npc) in self.pool.iter_active() {
            if npc.state != NpcState::Follow {
                continue;
            }
            let position = match npc.target {
                Some(BehaviorTarget::Observer) => observer,
                Some(BehaviorTarget::Entity(target)) => {
                    self.pool.get(target).map(|t| t.position)
                }
                None => None,
            };
            target_positions.insert(npc.id, position);
        }

        let params = TickParams {
            now_ms,
            arrival_threshold: self.arrival_threshold,
            replan_interval_ms: self.replan_interval_ms,
            pathfinding_enabled: self.pathfinding_enabled,
        };

        let mut dropped_follow = Vec::new();
        for &handle in &handles {
            let Some(npc) = self.pool.get_mut(handle) else {
                continue;
            };

            match npc.state {
                NpcState::Idle | NpcState::Interact => npc.stop(),
                NpcState::Patrol => tick_patrol(npc, planner, &params),
                NpcState::Follow => {
                    let target = target_positions.get(&npc.id).copied().flatten();
                    if let FollowOutcome::Dropped = tick_follow(npc, target, planner, &params)
                    {
                        dropped_follow.push(handle);
                    }
                }
            }

            npc.position += npc.velocity * dt;
        }

        // NPCs that gave up following go back to a rolled behavior
        for handle in dropped_follow {
            self.roll_behavior(handle, now_ms);
        }
    }

    /// Range scan: NPCs notice an observer inside their own interaction
    /// range and start following
    pub fn check_interactions(&mut self, observer: Vec2) {
        for handle in self.pool.active_handles() {
            let Some(npc) = self.pool.get_mut(handle) else {
                continue;
            };
            let in_range = npc.position.distance(observer) < npc.interaction_range;
            if in_range && matches!(npc.state, NpcState::Idle | NpcState::Patrol) {
                npc.target = Some(BehaviorTarget::Observer);
                npc.apply_event(BehaviorEvent::ObserverEntered);
            }
        }
    }

    /// Explicit interaction request; returns whether the NPC accepted
    pub fn interact(&mut self, handle: Handle<Npc>, from: Vec2) -> bool {
        let Some(npc) = self.pool.get_mut(handle) else {
            return false;
        };
        if !npc.can_interact(from) {
            return false;
        }
        npc.apply_event(BehaviorEvent::InteractionStarted);
        true
    }

    /// Complete an interaction, reverting the NPC to idle
    pub fn finish_interaction(&mut self, handle: Handle<Npc>, now_ms: u64) {
        let Some(npc) = self.pool.get_mut(handle) else {
            return;
        };
        npc.apply_event(BehaviorEvent::InteractionFinished);
        let id = npc.id;
        let (lo, hi) = self.idle_timer_ms;
        let delay = self.rng.range_u64(lo, hi);
        self.timers.insert(id, now_ms + delay);
    }

    /// Snapshot every active NPC for persistence
    pub fn records(&self) -> Vec<NpcRecord> {
        self.pool
            .iter_active()
            .map(|(_, npc)| NpcRecord {
                id: npc.id,
                state: npc.state,
                position: npc.position,
            })
            .collect()
    }

    /// Apply persisted records to currently active NPCs, matched by id
    pub fn restore(&mut self, records: &[NpcRecord]) {
        let by_id: HashMap<u64, &NpcRecord> = records.iter().map(|r| (r.id, r)).collect();
        for (_, npc) in self.pool.iter_active_mut() {
            if let Some(record) = by_id.get(&npc.id) {
                npc.restore_saved(record.state, record.position);
            }
        }
    }

    /// The underlying pool
    pub fn pool(&self) -> &EntityPool<Npc> {
        &self.pool
    }

    /// The underlying pool, mutably (depth sorting, embedding queries)
    pub fn pool_mut(&mut self) -> &mut EntityPool<Npc> {
        &mut self.pool
    }

    /// Number of active NPCs
    pub fn active_len(&self) -> usize {
        self.pool.active_len()
    }
}

/// Ring of evenly spaced patrol points around a center
fn patrol_ring(center: Vec2, count: usize, radius: f32) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let angle = std::f32::consts::TAU / count as f32 * i as f32;
            center + Vec2::from_angle(angle) * radius
        })
        .collect()
}

fn tick_patrol(npc: &mut Npc, planner: &mut PathPlanner, params: &TickParams) {
    if npc.patrol_points.is_empty() {
        npc.apply_event(BehaviorEvent::IdleChosen);
        return;
    }

    let goal = npc.patrol_points[npc.patrol_index];
    if npc.position.distance(goal) < params.arrival_threshold {
        npc.patrol_index = (npc.patrol_index + 1) % npc.patrol_points.len();
        npc.clear_waypoints();
    } else {
        drive_toward(npc, goal, planner, params);
    }
}

fn tick_follow(
    npc: &mut Npc,
    target: Option<Vec2>,
    planner: &mut PathPlanner,
    params: &TickParams,
) -> FollowOutcome {
    let Some(target) = target else {
        npc.apply_event(BehaviorEvent::TargetLost);
        return FollowOutcome::Dropped;
    };

    let distance = npc.position.distance(target);
    if distance > npc.interaction_range * 2.0 {
        npc.apply_event(BehaviorEvent::ObserverLeft);
        return FollowOutcome::Dropped;
    }

    if distance > npc.interaction_range {
        drive_toward(npc, target, planner, params);
    } else {
        npc.stop();
        npc.clear_waypoints();
    }
    FollowOutcome::Kept
}

/// Move an NPC toward a goal: throttled path requests when the planner is
/// ready, waypoint following while a path is present, straight-line
/// steering otherwise.
fn drive_toward(npc: &mut Npc, goal: Vec2, planner: &mut PathPlanner, params: &TickParams) {
    if npc.use_pathfinding && params.pathfinding_enabled && planner.is_ready() {
        let elapsed = params.now_ms.saturating_sub(npc.last_replan_ms);
        if npc.pending_path.is_none() && elapsed >= params.replan_interval_ms {
            npc.last_replan_ms = params.now_ms;
            npc.pending_path = Some(planner.request_path(npc.position, goal));
        }
    }

    if let Some(ticket) = &npc.pending_path {
        if let Some(result) = ticket.poll() {
            npc.pending_path = None;
            match result {
                Some(waypoints) if !waypoints.is_empty() => {
                    npc.waypoints = waypoints;
                    npc.waypoint_index = 0;
                }
                _ => {
                    npc.waypoints.clear();
                    npc.waypoint_index = 0;
                }
            }
        }
    }

    if !npc.follow_waypoints(params.arrival_threshold) {
        npc.steer_toward(goal);
    }
}
