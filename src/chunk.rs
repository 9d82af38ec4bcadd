//! This module defines the `Chunk` struct, a rectangular block of cells that is refreshed as a unit.
use bevy::math::UVec2;

/// A chunk covers the offset coordinates `min..max` of the grid.
#[derive(Debug, Clone)]
pub struct Chunk {
    index: (usize, usize),
    min: UVec2,
    max: UVec2,
}

impl PartialEq for Chunk {
    fn eq(&self, other: &Self) -> bool {
        self.min == other.min && self.max == other.max
    }
}

impl Eq for Chunk {}

impl Chunk {
    pub(crate) fn new(index: (usize, usize), min: UVec2, max: UVec2) -> Self {
        Chunk { index, min, max }
    }

    /// Position of the chunk in the chunk layout, `(chunk_x, chunk_z)`.
    pub fn index(&self) -> (usize, usize) {
        self.index
    }

    pub fn min(&self) -> UVec2 {
        self.min
    }

    pub fn max(&self) -> UVec2 {
        self.max
    }

    /// Offset coordinates of every cell in the chunk, row by row.
    pub fn bounds(&self) -> impl Iterator<Item = UVec2> {
        let min = self.min;
        let max = self.max;

        (min.y..max.y).flat_map(move |z| (min.x..max.x).map(move |x| UVec2::new(x, z)))
    }

    pub fn contains(&self, offset: UVec2) -> bool {
        offset.x >= self.min.x && offset.x < self.max.x && offset.y >= self.min.y && offset.y < self.max.y
    }
}
