/// Per-kind payloads of the batched query pipeline.
///
/// The three kinds share one state machine ([`QueryPipeline`]) and differ
/// only in the input record built from a requester and in how an output
/// record is delivered back to it.
///
/// [`QueryPipeline`]: super::QueryPipeline

use bytemuck::Pod;
use super::collision::WorldCollision;
use super::device::QueryKind;
use super::records::{TerrainHeightLocation, PointWorldTest, SphereWorldTest};
use super::requester::{TerrainHeightRequester, PointCollisionRequester, SphereCollisionRequester};

/// Outcome of delivering one output record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The requester's callback ran
    Delivered,
    /// The record was decoded but did not warrant a callback
    Skipped,
    /// The output buffer had no record at this index
    Missing,
}

/// One batched query kind
pub trait BatchQuery {
    /// Requester trait object (e.g. `dyn TerrainHeightRequester`)
    type Requester: ?Sized + Send;

    /// Fixed-stride input record
    type Input: Pod;

    const KIND: QueryKind;

    /// Build the input record from the requester's current state
    fn input(requester: &Self::Requester) -> Self::Input;

    /// Deliver output record `index` of `output` to its requester
    fn deliver(
        requester: &mut Self::Requester,
        input: &Self::Input,
        output: &[f32],
        index: usize,
    ) -> Delivery;
}

/// Terrain height sampling
pub struct TerrainHeightQuery;

impl BatchQuery for TerrainHeightQuery {
    type Requester = dyn TerrainHeightRequester;
    type Input = TerrainHeightLocation;

    const KIND: QueryKind = QueryKind::TerrainHeight;

    fn input(requester: &Self::Requester) -> Self::Input {
        TerrainHeightLocation::new(requester.requested_location())
    }

    fn deliver(
        requester: &mut Self::Requester,
        input: &Self::Input,
        output: &[f32],
        index: usize,
    ) -> Delivery {
        match output.get(index) {
            Some(&height) => {
                requester.record_sample(input.location, height);
                Delivery::Delivered
            }
            None => Delivery::Missing,
        }
    }
}

/// Point collision tests against terrain and moving bodies
pub struct PointCollisionQuery;

impl BatchQuery for PointCollisionQuery {
    type Requester = dyn PointCollisionRequester;
    type Input = PointWorldTest;

    const KIND: QueryKind = QueryKind::PointCollision;

    fn input(requester: &Self::Requester) -> Self::Input {
        PointWorldTest::new(requester.position(), requester.velocity())
    }

    fn deliver(
        requester: &mut Self::Requester,
        _input: &Self::Input,
        output: &[f32],
        index: usize,
    ) -> Delivery {
        deliver_collision(requester, output, index)
    }
}

/// Sphere collision tests against terrain and moving bodies
pub struct SphereCollisionQuery;

impl BatchQuery for SphereCollisionQuery {
    type Requester = dyn SphereCollisionRequester;
    type Input = SphereWorldTest;

    const KIND: QueryKind = QueryKind::SphereCollision;

    fn input(requester: &Self::Requester) -> Self::Input {
        SphereWorldTest::new(requester.position(), requester.velocity(), requester.radius())
    }

    fn deliver(
        requester: &mut Self::Requester,
        _input: &Self::Input,
        output: &[f32],
        index: usize,
    ) -> Delivery {
        deliver_collision(requester, output, index)
    }
}

// Judged against the requester's velocity at delivery time, not at dispatch
fn deliver_collision<R>(requester: &mut R, output: &[f32], index: usize) -> Delivery
where
    R: PointCollisionRequester + ?Sized,
{
    match WorldCollision::decode(output, index, requester.velocity()) {
        Some(collision) if collision.is_collision() => {
            requester.on_world_collision(&collision);
            Delivery::Delivered
        }
        Some(_) => Delivery::Skipped,
        None => Delivery::Missing,
    }
}
