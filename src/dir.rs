//! The six directions of a hex cell.
use strum::{EnumCount, EnumIter};

/// Direction from a cell towards one of its six neighbors.
///
/// The discriminant doubles as the index into per-edge arrays (neighbors, roads)
/// and as the value written to save files for river directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, EnumCount)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HexDirection {
    NE = 0,
    E = 1,
    SE = 2,
    SW = 3,
    W = 4,
    NW = 5,
}

pub use self::HexDirection::*;

impl HexDirection {
    /// All directions in expansion order.
    pub const ALL: [HexDirection; 6] = [NE, E, SE, SW, W, NW];

    pub fn from_index(index: u8) -> Option<HexDirection> {
        Self::ALL.get(index as usize).copied()
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> HexDirection {
        Self::ALL[(self.index() + 3) % 6]
    }

    pub fn previous(self) -> HexDirection {
        Self::ALL[(self.index() + 5) % 6]
    }

    pub fn next(self) -> HexDirection {
        Self::ALL[(self.index() + 1) % 6]
    }

    /// Cube coordinate delta `(dx, dz)` of a step in this direction.
    pub fn vector(self) -> (i32, i32) {
        match self {
            NE => (0, 1),
            E => (1, 0),
            SE => (1, -1),
            SW => (0, -1),
            W => (-1, 0),
            NW => (-1, 1),
        }
    }
}
