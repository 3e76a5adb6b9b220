/// Terrain height sources sampled by the CPU kernels

use strato_engine::glam::Vec2;
use strato_engine::strato::{Error, Result};

/// Terrain height at a horizontal (x, z) location
pub trait HeightField: Send {
    fn height(&self, location: Vec2) -> f32;
}

impl<F> HeightField for F
where
    F: Fn(Vec2) -> f32 + Send,
{
    fn height(&self, location: Vec2) -> f32 {
        self(location)
    }
}

/// Terrain at a constant height
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlatTerrain {
    pub height: f32,
}

impl FlatTerrain {
    pub fn new(height: f32) -> Self {
        Self { height }
    }
}

impl HeightField for FlatTerrain {
    fn height(&self, _location: Vec2) -> f32 {
        self.height
    }
}

/// Regular grid of heights, bilinearly interpolated.
///
/// Sample `(ix, iz)` sits at `origin + (ix, iz) * cell_size`. Locations
/// outside the grid are clamped to its border.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMap {
    origin: Vec2,
    cell_size: f32,
    width: usize,
    depth: usize,
    heights: Vec<f32>,
}

impl HeightMap {
    /// Create a height map from row-major heights (`depth` rows of `width`)
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` if the grid is smaller than 2x2,
    /// `heights` does not hold `width * depth` values, or `cell_size` is
    /// not a positive finite number.
    pub fn new(origin: Vec2, cell_size: f32, width: usize, depth: usize, heights: Vec<f32>) -> Result<Self> {
        if width < 2 || depth < 2 {
            return Err(Error::InvalidResource(format!(
                "Height map must be at least 2x2 (got {}x{})", width, depth
            )));
        }
        if heights.len() != width * depth {
            return Err(Error::InvalidResource(format!(
                "Height map expects {} heights, got {}", width * depth, heights.len()
            )));
        }
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(Error::InvalidResource(format!(
                "Height map cell size must be > 0 (got {})", cell_size
            )));
        }

        Ok(Self { origin, cell_size, width, depth, heights })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn sample(&self, ix: usize, iz: usize) -> f32 {
        self.heights[iz * self.width + ix]
    }
}

impl HeightField for HeightMap {
    fn height(&self, location: Vec2) -> f32 {
        let grid = (location - self.origin) / self.cell_size;
        let max_x = (self.width - 1) as f32;
        let max_z = (self.depth - 1) as f32;
        let x = grid.x.clamp(0.0, max_x);
        let z = grid.y.clamp(0.0, max_z);

        // Lower corner of the cell, kept one short of the border
        let ix = (x.floor() as usize).min(self.width - 2);
        let iz = (z.floor() as usize).min(self.depth - 2);
        let tx = x - ix as f32;
        let tz = z - iz as f32;

        let near = self.sample(ix, iz) + (self.sample(ix + 1, iz) - self.sample(ix, iz)) * tx;
        let far = self.sample(ix, iz + 1) + (self.sample(ix + 1, iz + 1) - self.sample(ix, iz + 1)) * tx;
        near + (far - near) * tz
    }
}

#[cfg(test)]
#[path = "height_field_tests.rs"]
mod tests;
