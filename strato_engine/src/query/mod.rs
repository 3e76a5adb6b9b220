//! Batched asynchronous world queries
//!
//! Terrain height samples, point collisions and sphere collisions are
//! gathered from registered requesters, dispatched to a [`ComputeDevice`]
//! once per fixed step and delivered back on a later step.

pub mod records;
pub mod collision;
pub mod device;
pub mod requester;
pub mod batch_query;
pub mod pipeline;
pub mod terrain_sampler;
pub mod world_collider;
pub mod world_queries;

#[cfg(test)]
pub mod mock_device;

pub use records::{
    TerrainHeightLocation, PointWorldTest, SphereWorldTest, WorldCollisionRecord,
    TERRAIN_HEIGHT_ELEMENT_SIZE,
};
pub use collision::{CollisionFlags, WorldCollision};
pub use device::{
    ComputeDevice, DeviceBufferKey, QueryKind, ReadbackHandle, ReadbackStatus, dispatch_size,
};
pub use requester::{TerrainHeightRequester, PointCollisionRequester, SphereCollisionRequester};
pub use batch_query::{BatchQuery, Delivery, TerrainHeightQuery, PointCollisionQuery, SphereCollisionQuery};
pub use pipeline::{PerformReport, QueryKey, QueryPipeline};
pub use terrain_sampler::TerrainHeightSampler;
pub use world_collider::WorldCollider;
pub use world_queries::{FixedUpdateReport, WorldQueries};
