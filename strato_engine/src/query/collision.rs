/// Decoded world collision delivered to point and sphere requesters.

use glam::Vec3;
use super::records::WorldCollisionRecord;

bitflags::bitflags! {
    /// Which halves of a collision record reported contact
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionFlags: u8 {
        /// Penetration into the terrain
        const STATIC = 1 << 0;
        /// Closing contact with a moving body
        const DYNAMIC = 1 << 1;
    }
}

/// Collision result for one probe
///
/// Decoding is pure: the same record and velocity always produce the
/// same flags and contact position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldCollision {
    pub static_position: Vec3,
    pub static_height: f32,
    pub static_normal: Vec3,
    pub dynamic_position: Vec3,
    pub dynamic_distance: f32,
    pub dynamic_normal: Vec3,
    flags: CollisionFlags,
}

impl WorldCollision {
    /// Decode from a raw record, judged against the probe's `velocity`.
    ///
    /// A probe moving away from a body it touches (`velocity · normal >= 0`)
    /// is not in dynamic collision.
    pub fn from_record(record: &WorldCollisionRecord, velocity: Vec3) -> Self {
        let mut flags = CollisionFlags::empty();
        if record.static_height < 0.0 {
            flags |= CollisionFlags::STATIC;
        }
        if record.dynamic_distance < f32::INFINITY && velocity.dot(record.dynamic_normal) < 0.0 {
            flags |= CollisionFlags::DYNAMIC;
        }

        Self {
            static_position: record.static_position,
            static_height: record.static_height,
            static_normal: record.static_normal,
            dynamic_position: record.dynamic_position,
            dynamic_distance: record.dynamic_distance,
            dynamic_normal: record.dynamic_normal,
            flags,
        }
    }

    /// Decode record `index` of a flat result buffer.
    ///
    /// Returns `None` if the buffer is too short.
    pub fn decode(data: &[f32], index: usize, velocity: Vec3) -> Option<Self> {
        WorldCollisionRecord::read(data, index).map(|record| Self::from_record(&record, velocity))
    }

    pub fn flags(&self) -> CollisionFlags {
        self.flags
    }

    pub fn static_collision(&self) -> bool {
        self.flags.contains(CollisionFlags::STATIC)
    }

    pub fn dynamic_collision(&self) -> bool {
        self.flags.contains(CollisionFlags::DYNAMIC)
    }

    /// Whether either test reported contact
    pub fn is_collision(&self) -> bool {
        !self.flags.is_empty()
    }

    /// Midpoint of both contacts, or whichever one applies.
    ///
    /// Falls back to the dynamic position when there is no contact at all.
    pub fn contact_position(&self) -> Vec3 {
        match (self.static_collision(), self.dynamic_collision()) {
            (true, true) => self.static_position.lerp(self.dynamic_position, 0.5),
            (true, false) => self.static_position,
            _ => self.dynamic_position,
        }
    }
}

#[cfg(test)]
#[path = "collision_tests.rs"]
mod tests;
