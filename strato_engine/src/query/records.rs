/// Fixed-stride records exchanged with compute kernels.
///
/// Every record is a flat run of `f32` (`#[repr(C)]`, no padding), so a
/// batch uploads as `bytemuck::cast_slice(&records)` and results come back
/// as a flat `f32` buffer indexed by `request_index * stride`.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Terrain height probe input: a horizontal (x, z) location
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct TerrainHeightLocation {
    pub location: Vec2,
}

impl TerrainHeightLocation {
    /// Record size in f32
    pub const ELEMENT_SIZE: usize = 2;

    pub fn new(location: Vec2) -> Self {
        Self { location }
    }
}

/// Point collision probe input
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct PointWorldTest {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl PointWorldTest {
    /// Record size in f32
    pub const ELEMENT_SIZE: usize = 6;

    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self { position, velocity }
    }
}

/// Sphere collision probe input
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct SphereWorldTest {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
}

impl SphereWorldTest {
    /// Record size in f32
    pub const ELEMENT_SIZE: usize = 7;

    pub fn new(position: Vec3, velocity: Vec3, radius: f32) -> Self {
        Self { position, velocity, radius }
    }
}

/// Terrain height output size in f32 (one height per probe)
pub const TERRAIN_HEIGHT_ELEMENT_SIZE: usize = 1;

/// Raw collision output written by the point and sphere kernels.
///
/// The static half is the terrain test (negative height means
/// penetration), the dynamic half the test against moving bodies
/// (`+inf` distance means no hit).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct WorldCollisionRecord {
    pub static_position: Vec3,
    pub static_height: f32,
    pub static_normal: Vec3,
    pub dynamic_position: Vec3,
    pub dynamic_distance: f32,
    pub dynamic_normal: Vec3,
}

impl WorldCollisionRecord {
    /// Record size in f32
    pub const ELEMENT_SIZE: usize = 14;

    /// Record for a probe that touches nothing
    pub fn miss() -> Self {
        Self {
            static_position: Vec3::ZERO,
            static_height: f32::INFINITY,
            static_normal: Vec3::Y,
            dynamic_position: Vec3::ZERO,
            dynamic_distance: f32::INFINITY,
            dynamic_normal: Vec3::ZERO,
        }
    }

    /// Read record `index` out of a flat result buffer
    pub fn read(data: &[f32], index: usize) -> Option<Self> {
        let start = index.checked_mul(Self::ELEMENT_SIZE)?;
        let end = start.checked_add(Self::ELEMENT_SIZE)?;
        let floats = data.get(start..end)?;
        bytemuck::try_pod_read_unaligned(bytemuck::cast_slice(floats)).ok()
    }
}

impl Default for WorldCollisionRecord {
    fn default() -> Self {
        Self::miss()
    }
}

const _: () = assert!(std::mem::size_of::<TerrainHeightLocation>() == TerrainHeightLocation::ELEMENT_SIZE * 4);
const _: () = assert!(std::mem::size_of::<PointWorldTest>() == PointWorldTest::ELEMENT_SIZE * 4);
const _: () = assert!(std::mem::size_of::<SphereWorldTest>() == SphereWorldTest::ELEMENT_SIZE * 4);
const _: () = assert!(std::mem::size_of::<WorldCollisionRecord>() == WorldCollisionRecord::ELEMENT_SIZE * 4);

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
