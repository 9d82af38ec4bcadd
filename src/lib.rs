//! Turn-budgeted pathfinding on hexagonal maps for Bevy.
//!
//! The map is a [`grid::HexGrid`] resource of cells in cube coordinates. Each cell
//! carries terrain (elevation, water, rivers, roads, walls, features) that decides
//! what a step costs, and searches find the path reaching a target in the fewest turns.
mod cell;
mod chunk;
mod coords;
mod dir;
mod macros;
mod queue;
mod save;
mod unit;

pub mod components;
pub mod error;
pub mod grid;
pub mod metrics;
pub mod path;
pub mod pathfind;
pub mod plugin;

pub use cell::HexCell;
pub use chunk::Chunk;
pub use coords::HexCoordinates;
pub use dir::HexDirection;
pub use metrics::HexEdgeType;
pub use save::MAP_FORMAT_VERSION;
pub use unit::HexUnit;

pub mod prelude {
    pub use crate::components::{Goal, HexUnitRef, PathfindingFailed, Speed};
    pub use crate::error::{HexGridError, MapLoadError};
    pub use crate::grid::{ElevationChange, GridSettings, GridSettingsBuilder, HexGrid};
    pub use crate::path::{HexPath, PathStep};
    pub use crate::pathfind::Reachable;
    pub use crate::plugin::{HexRoutePlugin, HexRouteSet};
    pub use crate::{HexCell, HexCoordinates, HexDirection, HexEdgeType, HexUnit};
    pub use crate::{CellIndex, MovementCost, UnitId};
}

/// Dense index of a cell, `z * cell_count_x + x` in offset coordinates.
pub type CellIndex = usize;
/// Key of a unit in the grid.
pub type UnitId = usize;
pub type MovementCost = u32;

/// Row and column of a dense cell index, in the `[z, x]` order the cell array is indexed by.
#[inline(always)]
pub(crate) fn cell_dim(index: CellIndex, width: usize) -> [usize; 2] {
    [index / width, index % width]
}
