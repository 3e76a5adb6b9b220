use glam::Vec2;
use super::requester::TerrainHeightRequester;

/// Terrain height probe that remembers its latest sample.
///
/// The requested location may move every frame; the sample always belongs
/// to the location that was dispatched, which can lag behind by a few
/// frames. [`TerrainHeightSampler::is_predictive`] tells whether the lagging
/// sample is still usable.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainHeightSampler {
    requested_location: Vec2,
    sampled_location: Vec2,
    height: f32,
    sampled: bool,
}

impl TerrainHeightSampler {
    pub fn new(location: Vec2) -> Self {
        Self {
            requested_location: location,
            sampled_location: Vec2::ZERO,
            height: 0.0,
            sampled: false,
        }
    }

    /// Move the probe; picked up by the next dispatched batch
    pub fn set_requested_location(&mut self, location: Vec2) {
        self.requested_location = location;
    }

    pub fn requested_location(&self) -> Vec2 {
        self.requested_location
    }

    /// Location of the latest sample
    pub fn sampled_location(&self) -> Vec2 {
        self.sampled_location
    }

    /// Height of the latest sample
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Whether any sample arrived yet
    pub fn is_sampled(&self) -> bool {
        self.sampled
    }

    /// Sampled height relative to a world origin at `origin_y`
    pub fn height_above(&self, origin_y: f32) -> f32 {
        self.height - origin_y
    }

    /// Whether the latest sample can stand in for the requested location.
    ///
    /// True when the sample is exactly at the requested location, or when
    /// it lies within `distance_max` of it and, seen from `location`, points
    /// in nearly the same direction (`dot > accuracy_min`).
    pub fn is_predictive(&self, location: Vec2, distance_max: f32, accuracy_min: f32) -> bool {
        if !self.sampled {
            return false;
        }
        if self.sampled_location == self.requested_location {
            return true;
        }

        let distance_squared = self.sampled_location.distance_squared(self.requested_location);
        if distance_squared >= distance_max * distance_max {
            return false;
        }

        let requested_direction = (self.requested_location - location).normalize_or_zero();
        let sampled_direction = (self.sampled_location - location).normalize_or_zero();
        requested_direction.dot(sampled_direction) > accuracy_min
    }
}

impl TerrainHeightRequester for TerrainHeightSampler {
    fn requested_location(&self) -> Vec2 {
        self.requested_location
    }

    fn record_sample(&mut self, location: Vec2, height: f32) {
        self.sampled_location = location;
        self.height = height;
        self.sampled = true;
    }
}

#[cfg(test)]
#[path = "terrain_sampler_tests.rs"]
mod tests;
