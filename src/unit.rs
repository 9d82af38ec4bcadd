//! Units occupying cells of the grid.
use crate::CellIndex;

/// A movable unit. Its cell is marked as occupied, which makes it an obstacle
/// for every search that doesn't start on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexUnit {
    pub(crate) location: CellIndex,
    /// Facing in degrees around the vertical axis.
    pub orientation: f32,
}

impl HexUnit {
    pub(crate) fn new(location: CellIndex, orientation: f32) -> Self {
        HexUnit {
            location,
            orientation,
        }
    }

    pub fn location(&self) -> CellIndex {
        self.location
    }
}
