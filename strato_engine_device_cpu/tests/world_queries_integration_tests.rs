//! Integration tests: world queries driven end to end on the CPU backend
//!
//! Run with: cargo test --test world_queries_integration_tests

use std::sync::{Arc, Mutex};
use strato_engine::glam::{Vec2, Vec3};
use strato_engine::strato::QueryConfig;
use strato_engine::strato::pool::ObjectPool;
use strato_engine::strato::query::{ComputeDevice, QueryKey, TerrainHeightSampler, WorldCollider, WorldQueries};
use strato_engine::strato::schedule::{ExecutionPool, FrameScheduler, Registration};
use strato_engine_device_cpu::{print_device_stats_report, CpuComputeDevice, FlatTerrain, HeightMap};

// ============================================================================
// HELPERS
// ============================================================================

fn world(device: CpuComputeDevice, config: QueryConfig) -> (Arc<Mutex<CpuComputeDevice>>, WorldQueries) {
    let device = Arc::new(Mutex::new(device));
    let shared: Arc<Mutex<dyn ComputeDevice>> = device.clone();
    let queries = WorldQueries::new(shared, config).unwrap();
    (device, queries)
}

fn sampler(x: f32, z: f32) -> Arc<Mutex<TerrainHeightSampler>> {
    Arc::new(Mutex::new(TerrainHeightSampler::new(Vec2::new(x, z))))
}

// ============================================================================
// TERRAIN HEIGHTS
// ============================================================================

#[test]
fn test_terrain_heights_arrive_one_step_later() {
    let map = HeightMap::new(Vec2::ZERO, 1.0, 2, 2, vec![0.0, 2.0, 4.0, 6.0]).unwrap();
    let (_device, mut queries) = world(CpuComputeDevice::new(map), QueryConfig::default());
    let near = sampler(0.0, 0.0);
    let far = sampler(1.0, 1.0);
    queries.add_terrain_height_sampler(near.clone());
    queries.add_terrain_height_sampler(far.clone());

    let first = queries.fixed_update();
    assert_eq!(first.terrain_heights.dispatched, 2);
    assert!(!near.lock().unwrap().is_sampled());

    let second = queries.fixed_update();
    assert_eq!(second.terrain_heights.delivered, 2);
    assert_eq!(near.lock().unwrap().height(), 0.0);
    assert_eq!(far.lock().unwrap().height(), 6.0);
}

#[test]
fn test_height_adjustment_scales_samples() {
    let config = QueryConfig { terrain_height_adjustment: 0.5, ..Default::default() };
    let (_device, mut queries) = world(CpuComputeDevice::new(FlatTerrain::new(8.0)), config);
    let probe = sampler(3.0, 3.0);
    queries.add_terrain_height_sampler(probe.clone());

    queries.fixed_update();
    queries.fixed_update();

    let probe = probe.lock().unwrap();
    assert_eq!(probe.height(), 4.0);
    assert_eq!(probe.height_above(1.0), 3.0);
}

// ============================================================================
// ERROR RECOVERY
// ============================================================================

#[test]
fn test_readback_error_is_retried_with_full_resend() {
    let mut device = CpuComputeDevice::new(FlatTerrain::new(1.0));
    device.fail_next_readback();
    let (device, mut queries) = world(device, QueryConfig::default());
    let probes = vec![sampler(0.0, 0.0), sampler(1.0, 0.0)];
    for probe in &probes {
        queries.add_terrain_height_sampler(probe.clone());
    }

    // Frame F: dispatch of 2, its read-back will fail
    queries.fixed_update();

    let late = sampler(2.0, 0.0);
    queries.add_terrain_height_sampler(late.clone());

    // Frame F+1: error observed, batch dropped, whole registry resent
    let retry = queries.fixed_update();
    assert_eq!(retry.terrain_heights.dropped, 2);
    assert_eq!(retry.terrain_heights.delivered, 0);
    assert_eq!(retry.terrain_heights.dispatched, 3);

    let stats = device.lock().unwrap().stats();
    assert_eq!(stats.readbacks_failed, 1);
    assert_eq!(stats.buffers_created, 2);
    assert_eq!(stats.buffers_destroyed, 1);

    // Frame F+2: every requester receives its sample
    let done = queries.fixed_update();
    assert_eq!(done.terrain_heights.delivered, 3);
    assert!(probes.iter().chain(std::iter::once(&late)).all(|p| p.lock().unwrap().is_sampled()));
}

#[test]
fn test_stalled_readback_times_out() {
    let config = QueryConfig { max_pending_frames: Some(2), ..Default::default() };
    let (device, mut queries) = world(CpuComputeDevice::new(FlatTerrain::new(0.0)).with_latency(10), config);
    queries.add_terrain_height_sampler(sampler(0.0, 0.0));

    queries.fixed_update();
    queries.fixed_update();
    queries.fixed_update();
    let report = queries.fixed_update();

    assert_eq!(report.terrain_heights.dropped, 1);
    assert_eq!(report.terrain_heights.dispatched, 1);

    let device = device.lock().unwrap();
    assert_eq!(device.stats().readbacks_discarded, 1);
    assert_eq!(device.pending_count(), 1);
}

// ============================================================================
// COLLISIONS
// ============================================================================

#[test]
fn test_falling_sphere_bounces_off_terrain() {
    let (_device, mut queries) = world(CpuComputeDevice::new(FlatTerrain::new(0.0)), QueryConfig::default());
    let ball = Arc::new(Mutex::new(WorldCollider::new(Vec3::new(0.0, 3.0, 0.0), Vec3::new(0.0, -2.0, 0.0), 0.5)));
    queries.add_sphere_collider(ball.clone());

    queries.fixed_update();
    let report = queries.fixed_update();

    assert_eq!(report.sphere_collisions.delivered, 1);
    let ball = ball.lock().unwrap();
    let collision = ball.last_collision().unwrap();
    assert!(collision.static_collision());
    assert!(collision.static_height < 0.0);
    assert!(ball.velocity.y > 0.0);
}

#[test]
fn test_point_collider_bounces_off_moving_body() {
    let mut device = CpuComputeDevice::new(FlatTerrain::new(0.0));
    device.add_dynamic_body(Vec3::new(3.0, 5.0, 0.0), 1.0);
    let (_device, mut queries) = world(device, QueryConfig::default());
    let probe = Arc::new(Mutex::new(WorldCollider::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(4.0, 0.0, 0.0), 0.5)));
    queries.add_point_collider(probe.clone());

    queries.fixed_update();
    let report = queries.fixed_update();

    assert_eq!(report.point_collisions.delivered, 1);
    let probe = probe.lock().unwrap();
    assert!(probe.last_collision().unwrap().dynamic_collision());
    assert!(probe.velocity.x < 0.0);
}

#[test]
fn test_colliders_without_contact_get_no_callback() {
    let (_device, mut queries) = world(CpuComputeDevice::new(FlatTerrain::new(0.0)), QueryConfig::default());
    let hovering = Arc::new(Mutex::new(WorldCollider::new(Vec3::new(0.0, 50.0, 0.0), Vec3::ZERO, 1.0)));
    queries.add_sphere_collider(hovering.clone());

    queries.fixed_update();
    let report = queries.fixed_update();

    assert_eq!(report.sphere_collisions.completed, 1);
    assert_eq!(report.sphere_collisions.delivered, 0);
    assert!(hovering.lock().unwrap().last_collision().is_none());
}

// ============================================================================
// THROTTLED AGENTS AND POOLED PROJECTILES
// ============================================================================

struct Agent {
    registration: Registration,
    visits: usize,
}

#[test]
fn test_throttled_agents_all_run_within_bound() {
    let pool = ExecutionPool::new(3);
    let (_device, queries) = world(CpuComputeDevice::new(FlatTerrain::new(0.0)), QueryConfig::default());
    let mut queries = queries.with_scheduler(FrameScheduler::new(vec![pool.clone()]));
    let mut agents: Vec<Agent> = (0..10).map(|_| Agent { registration: pool.register(), visits: 0 }).collect();

    for _ in 0..4 {
        queries.fixed_update();

        let newly_scheduled = agents
            .iter_mut()
            .filter(|agent| agent.registration.is_scheduled())
            .map(|agent| {
                agent.visits += 1;
                agent.visits
            })
            .filter(|&visits| visits == 1)
            .count();
        assert!(newly_scheduled <= 3);
    }

    assert!(agents.iter().all(|agent| agent.visits >= 1));
}

struct Projectile {
    collider: Arc<Mutex<WorldCollider>>,
    key: Option<QueryKey>,
}

#[test]
fn test_pooled_projectiles_register_while_active() {
    let (device, mut queries) = world(CpuComputeDevice::new(FlatTerrain::new(0.0)), QueryConfig::default());
    let mut projectiles = ObjectPool::from_fn(2, |_| Projectile {
        collider: Arc::new(Mutex::new(WorldCollider::new(Vec3::ZERO, Vec3::ZERO, 0.25))),
        key: None,
    });

    // Fire both projectiles
    let mut fired = Vec::new();
    while let Some((handle, projectile)) = projectiles.get_available_entity() {
        {
            let mut collider = projectile.collider.lock().unwrap();
            collider.position = Vec3::new(handle.index() as f32, 10.0, 0.0);
            collider.velocity = Vec3::new(0.0, -1.0, 0.0);
        }
        projectile.key = Some(queries.add_sphere_collider(projectile.collider.clone()));
        fired.push(handle);
    }
    assert_eq!(fired.len(), 2);
    assert_eq!(queries.sphere_collider_count(), 2);

    queries.fixed_update();

    // First projectile expires and returns to the pool
    let expired = fired[0];
    if let Some(key) = projectiles.entity_mut(expired).and_then(|p| p.key.take()) {
        assert!(queries.remove_sphere_collider(key));
    }
    assert!(projectiles.release(expired));
    assert_eq!(queries.sphere_collider_count(), 1);

    // Next batch is smaller, so buffers are reallocated
    queries.fixed_update();
    let stats = device.lock().unwrap().stats();
    assert_eq!(stats.buffers_created, 2);

    // The freed slot is handed out again
    let (reused, _) = projectiles.get_available_entity().unwrap();
    assert_eq!(reused, expired);

    print_device_stats_report(&stats);
}
