//! World orchestrator
//!
//! One `tick` per frame, in a fixed order: entity updates complete before
//! depth sorting, and chunk load/unload side effects are followed by a
//! collision rebuild before the next physics step. Chunk refreshes are
//! throttled and awaited sequentially - never two in flight.

use std::sync::Arc;

use glam::Vec2;

use rove_ai::controller::{BehaviorController, NpcRecord};
use rove_ai::npc::{Npc, NpcConfig};
use rove_ai::state::NpcState;
use rove_core::config::WorldConfig;
use rove_core::depth::{DepthSortable, DepthSorter};
use rove_core::events::{EventChannel, WorldEvent};
use rove_gamestate::{NpcSaveState, SaveData, SaveManager};
use rove_nav::grid::WalkGrid;
use rove_nav::planner::PathPlanner;
use rove_pool::Handle;
use rove_world::chunk::{ChunkCoord, TileLayer, TILE_EMPTY};
use rove_world::source::ChunkSource;
use rove_world::store::ChunkStore;

/// Default observer spawn position when no save data exists
const DEFAULT_SPAWN: Vec2 = Vec2::new(160.0, 160.0);

/// The single player-equivalent viewpoint.
///
/// Input and movement belong to the embedding; the core reads the position
/// for windowing and interaction checks and keeps the depth key current.
#[derive(Debug, Clone)]
pub struct Observer {
    pub position: Vec2,
    pub depth_from_y: bool,
    pub depth_offset: f32,
    pub draw_order: f32,
}

impl Observer {
    fn at(position: Vec2) -> Self {
        Self {
            position,
            depth_from_y: true,
            depth_offset: 0.0,
            draw_order: position.y,
        }
    }
}

impl DepthSortable for Observer {
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

/// A running world session
pub struct World {
    config: WorldConfig,
    events: EventChannel<WorldEvent>,
    store: ChunkStore,
    planner: PathPlanner,
    controller: BehaviorController,
    saves: SaveManager,
    observer: Observer,
    time_of_day: f32,
    last_refresh_ms: Option<u64>,
    collision_dirty: bool,
    outbox: Vec<WorldEvent>,
}

impl World {
    /// Create a world session over a save slot
    pub fn new(config: WorldConfig, saves: SaveManager) -> Self {
        let events = EventChannel::new();
        let store = ChunkStore::new(&config, events.sender());
        let planner = PathPlanner::new(config.tile_size as f32, config.path_iterations_per_pump);
        let controller = BehaviorController::new(&config, events.sender());

        Self {
            config,
            events,
            store,
            planner,
            controller,
            saves,
            observer: Observer::at(DEFAULT_SPAWN),
            time_of_day: 12.0,
            last_refresh_ms: None,
            collision_dirty: false,
            outbox: Vec::new(),
        }
    }

    /// Attach an external chunk source, tried before generation
    pub fn with_chunk_source(mut self, source: Arc<dyn ChunkSource>) -> Self {
        self.store.set_source(source);
        self
    }

    /// Bring the session up: apply any save data, load the initial window,
    /// populate it and build collision state.
    pub async fn start(&mut self, now_ms: u64) {
        self.time_of_day = self.config.start_hour;
        let pending = self.saves.load();
        if let Some(data) = &pending {
            self.observer.position = Vec2::new(data.player_x, data.player_y);
            self.time_of_day = data.time_of_day;
        }

        self.last_refresh_ms = Some(now_ms);
        self.store
            .refresh(self.observer.position, self.config.load_radius)
            .await;
        self.process_events(now_ms);

        // NPC states are matched against the freshly populated world
        if let Some(data) = pending {
            self.apply_save(data);
        }
    }

    /// Advance the world by one frame
    pub async fn tick(&mut self, now_ms: u64, dt: f32) {
        // Behavior and movement first
        self.controller
            .update(now_ms, dt, &mut self.planner, Some(self.observer.position));
        self.controller.check_interactions(self.observer.position);

        // Draw order after every position update for this frame
        self.apply_depth();

        // Throttled window refresh, awaited sequentially
        let refresh_due = self.last_refresh_ms.map_or(true, |at| {
            now_ms.saturating_sub(at) >= self.config.chunk_refresh_interval_ms
        });
        if refresh_due {
            self.last_refresh_ms = Some(now_ms);
            self.store
                .refresh(self.observer.position, self.config.load_radius)
                .await;
        }

        // Streaming side effects: collision rebuild, chunk population
        self.process_events(now_ms);

        // Advance queued path searches under this frame's budget
        self.planner.pump();
    }

    fn process_events(&mut self, now_ms: u64) {
        let drained = self.events.drain();
        for event in &drained {
            match *event {
                WorldEvent::ChunkLoaded { chunk_x, chunk_y } => {
                    self.collision_dirty = true;
                    let origin = self.config.chunk_to_world(chunk_x, chunk_y);
                    self.controller.spawn_chunk_population(
                        origin,
                        self.config.chunk_size_px(),
                        &format!("Villager {chunk_x}_{chunk_y}"),
                        now_ms,
                    );
                }
                WorldEvent::ChunkUnloaded { .. } => {
                    self.collision_dirty = true;
                }
                WorldEvent::NpcSpawned { .. } => {}
            }
        }

        if self.collision_dirty {
            self.rebuild_collision();
        }

        self.outbox.extend(drained);
        // Population spawns above emitted their own events; surface them
        // in the same frame
        self.outbox.extend(self.events.drain());
    }

    fn rebuild_collision(&mut self) {
        self.collision_dirty = false;
        let Some(grid) = self.store.collision_grid() else {
            return;
        };
        let walk = WalkGrid::new(grid.origin_x, grid.origin_y, grid.rows);
        self.planner.configure(walk, vec![TILE_EMPTY]);
        log::debug!(
            "collision rebuilt over {} active chunks",
            self.store.len()
        );
    }

    fn apply_depth(&mut self) {
        let observer = &mut self.observer as &mut dyn DepthSortable;
        let npcs = self
            .controller
            .pool_mut()
            .iter_active_mut()
            .map(|(_, npc)| npc as &mut dyn DepthSortable);
        DepthSorter::apply(std::iter::once(observer).chain(npcs));
    }

    /// Events surfaced since the last call, in emission order
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Every active chunk's collidable layer, for physics pairing
    pub fn collision_layers(&self) -> Vec<(ChunkCoord, &TileLayer)> {
        self.store.collision_layers()
    }

    /// Spawn an NPC through the pool
    pub fn spawn_npc(&mut self, position: Vec2, config: NpcConfig, now_ms: u64) -> Handle<Npc> {
        self.controller.spawn(position, config, now_ms)
    }

    /// Persist the session to the save slot
    pub fn save_game(&self) -> bool {
        let mut data = SaveData::new(
            self.observer.position.x,
            self.observer.position.y,
            self.time_of_day,
        );
        for record in self.controller.records() {
            data.npc_states.insert(
                record.id.to_string(),
                NpcSaveState {
                    state: record.state.as_str().to_string(),
                    x: record.position.x,
                    y: record.position.y,
                },
            );
        }

        match self.saves.save(&data) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("save failed: {e}");
                false
            }
        }
    }

    /// Restore the session from the save slot; `false` when no save data
    pub fn load_game(&mut self) -> bool {
        let Some(data) = self.saves.load() else {
            log::info!("no save data");
            return false;
        };
        self.apply_save(data);
        true
    }

    fn apply_save(&mut self, data: SaveData) {
        self.observer.position = Vec2::new(data.player_x, data.player_y);
        self.time_of_day = data.time_of_day;

        let records: Vec<NpcRecord> = data
            .npc_states
            .iter()
            .filter_map(|(id, s)| {
                Some(NpcRecord {
                    id: id.parse().ok()?,
                    state: NpcState::from_str(&s.state)?,
                    position: Vec2::new(s.x, s.y),
                })
            })
            .collect();
        self.controller.restore(&records);
    }

    /// The immutable session configuration
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The chunk store
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// The behavior controller
    pub fn controller(&self) -> &BehaviorController {
        &self.controller
    }

    /// The behavior controller, mutably
    pub fn controller_mut(&mut self) -> &mut BehaviorController {
        &mut self.controller
    }

    /// The path planner
    pub fn planner(&self) -> &PathPlanner {
        &self.planner
    }

    /// The observer viewpoint
    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    /// Move the observer (input is the embedding's job)
    pub fn set_observer_position(&mut self, position: Vec2) {
        self.observer.position = position;
    }

    /// Current hour of day
    pub fn time_of_day(&self) -> f32 {
        self.time_of_day
    }

    /// Set the hour of day
    pub fn set_time_of_day(&mut self, hour: f32) {
        self.time_of_day = hour;
    }
}
