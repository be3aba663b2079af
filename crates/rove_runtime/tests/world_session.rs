//! End-to-end world session tests: streaming, behavior, depth and saves
//! driven through the orchestrator's frame loop.

use std::collections::HashSet;

use glam::Vec2;

use rove_ai::npc::NpcConfig;
use rove_core::config::WorldConfig;
use rove_core::events::WorldEvent;
use rove_gamestate::{MemoryStore, SaveManager};
use rove_runtime::world::World;
use rove_world::chunk::ChunkCoord;
use rove_world::store::ChunkStore;

fn new_world(config: WorldConfig) -> World {
    let _ = env_logger::builder().is_test(true).try_init();
    let saves = SaveManager::new(MemoryStore::new(), config.save_key.clone());
    World::new(config, saves)
}

#[tokio::test]
async fn test_start_streams_window_and_populates() {
    let config = WorldConfig::default();
    let mut world = new_world(config);
    world.start(0).await;

    // Observer starts in chunk (0, 0); radius 2 resident window is the
    // 13-chunk disc
    let expected: HashSet<ChunkCoord> =
        ChunkStore::window(ChunkCoord::new(0, 0), 2).into_iter().collect();
    let actual: HashSet<ChunkCoord> =
        world.store().active_coords().into_iter().collect();
    assert_eq!(actual, expected);

    // Every loaded chunk spawned 1-3 villagers
    let npcs = world.controller().active_len();
    assert!((13..=39).contains(&npcs), "{npcs} NPCs for 13 chunks");

    // Load and spawn events surfaced to the embedding
    let events = world.drain_events();
    let loads = events
        .iter()
        .filter(|e| matches!(e, WorldEvent::ChunkLoaded { .. }))
        .count();
    let spawns = events
        .iter()
        .filter(|e| matches!(e, WorldEvent::NpcSpawned { .. }))
        .count();
    assert_eq!(loads, 13);
    assert_eq!(spawns, npcs);

    // Collision state was built, so the planner can serve requests
    assert!(world.planner().is_ready());
    assert_eq!(world.collision_layers().len(), 13);
}

#[tokio::test]
async fn test_observer_move_applies_window_delta() {
    let config = WorldConfig::default();
    let chunk_px = config.chunk_size_px();
    let mut world = new_world(config);
    world.start(0).await;
    world.drain_events();

    // Step into chunk (1, 0) and tick past the refresh throttle
    world.set_observer_position(Vec2::new(1.5 * chunk_px, 160.0));
    world.tick(200, 0.016).await;

    let expected: HashSet<ChunkCoord> =
        ChunkStore::window(ChunkCoord::new(1, 0), 2).into_iter().collect();
    let actual: HashSet<ChunkCoord> =
        world.store().active_coords().into_iter().collect();
    assert_eq!(actual, expected);

    let events = world.drain_events();
    assert!(events.contains(&WorldEvent::ChunkUnloaded {
        chunk_x: -2,
        chunk_y: 0
    }));
    assert!(events.contains(&WorldEvent::ChunkLoaded {
        chunk_x: 3,
        chunk_y: 0
    }));
    // Overlapping chunks stayed untouched
    assert!(!events.contains(&WorldEvent::ChunkUnloaded {
        chunk_x: 1,
        chunk_y: 0
    }));
}

#[tokio::test]
async fn test_refresh_is_throttled() {
    let config = WorldConfig::default();
    let chunk_px = config.chunk_size_px();
    let mut world = new_world(config);
    world.start(0).await;
    world.drain_events();

    // Move a whole chunk but tick inside the 100ms throttle window:
    // nothing streams yet
    world.set_observer_position(Vec2::new(1.5 * chunk_px, 160.0));
    world.tick(50, 0.016).await;
    assert!(world
        .drain_events()
        .iter()
        .all(|e| matches!(e, WorldEvent::NpcSpawned { .. })));
    assert!(world.store().is_active(ChunkCoord::new(-2, 0)));

    // Past the throttle the delta applies
    world.tick(150, 0.016).await;
    assert!(!world.store().is_active(ChunkCoord::new(-2, 0)));
}

#[tokio::test]
async fn test_depth_follows_y_after_tick() {
    let config = WorldConfig::default();
    let mut world = new_world(config);
    world.start(0).await;

    world.tick(100, 0.05).await;
    world.tick(200, 0.05).await;

    let observer = world.observer();
    assert_eq!(observer.draw_order, observer.position.y);

    for (_, npc) in world.controller().pool().iter_active() {
        assert_eq!(
            npc.draw_order,
            npc.position.y + npc.depth_offset,
            "npc {} depth out of sync",
            npc.id
        );
    }
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let config = WorldConfig::default();
    let mut world = new_world(config);
    world.start(0).await;

    let handle = world.spawn_npc(
        Vec2::new(300.0, 300.0),
        NpcConfig::default().with_name("Archivist"),
        0,
    );
    let saved_id = world.controller().pool().get(handle).unwrap().id;

    world.set_observer_position(Vec2::new(420.0, 360.0));
    world.set_time_of_day(20.5);
    assert!(world.save_game());

    // Drift the session, then restore
    world.set_observer_position(Vec2::new(0.0, 0.0));
    world.set_time_of_day(6.0);
    world
        .controller_mut()
        .pool_mut()
        .get_mut(handle)
        .unwrap()
        .position = Vec2::new(9_999.0, 0.0);

    assert!(world.load_game());
    assert_eq!(world.observer().position, Vec2::new(420.0, 360.0));
    assert_eq!(world.time_of_day(), 20.5);

    let npc = world.controller().pool().get(handle).unwrap();
    assert_eq!(npc.id, saved_id);
    assert_eq!(npc.position, Vec2::new(300.0, 300.0));
}

#[tokio::test]
async fn test_load_without_save_reports_absence() {
    let config = WorldConfig::default();
    let mut world = new_world(config);
    world.start(0).await;

    assert!(!world.load_game());
}

#[tokio::test]
async fn test_pool_recycles_despawned_npcs() {
    let config = WorldConfig::default();
    let mut world = new_world(config);
    world.start(0).await;

    let constructed_before = world.controller().pool().constructed();
    let active_before = world.controller().active_len();

    let handle = world.spawn_npc(Vec2::new(100.0, 100.0), NpcConfig::default(), 0);
    world.controller_mut().despawn(handle);

    // The slot went back to the free list; re-spawning reuses it
    let replacement = world.spawn_npc(Vec2::new(50.0, 50.0), NpcConfig::default(), 0);
    assert_eq!(handle.index(), replacement.index());

    assert_eq!(world.controller().active_len(), active_before + 1);
    assert!(world.controller().pool().constructed() <= constructed_before + 1);

    // The stale handle no longer resolves
    assert!(world.controller().pool().get(handle).is_none());
}

#[tokio::test]
async fn test_npcs_keep_moving_without_pathfinding() {
    let config = WorldConfig::default().without_pathfinding();
    let mut world = new_world(config);
    world.start(0).await;

    // Spawn well outside the observer's notice range so patrol sticks
    let handle = world.spawn_npc(
        Vec2::new(400.0, 400.0),
        NpcConfig::default().with_speed(50.0),
        0,
    );
    world
        .controller_mut()
        .pool_mut()
        .get_mut(handle)
        .unwrap()
        .assign_patrol(vec![Vec2::new(700.0, 400.0)]);

    let before = world.controller().pool().get(handle).unwrap().position;
    for frame in 1..=20u64 {
        world.tick(frame * 16, 0.016).await;
    }
    let after = world.controller().pool().get(handle).unwrap().position;

    // Straight-line steering still drives the patrol
    assert!(after.x > before.x);
}
