//! Error types for grid construction, unit placement and map loading.
use thiserror::Error;

use crate::{coords::HexCoordinates, CellIndex, UnitId};

#[derive(Debug, Error, PartialEq)]
pub enum HexGridError {
    #[error("unsupported map size {width}x{height}, must be a positive multiple of the {chunk_x}x{chunk_z} chunk size")]
    UnsupportedMapSize {
        width: u32,
        height: u32,
        chunk_x: u32,
        chunk_z: u32,
    },
    #[error("map size {width}x{height} exceeds the maximum cell count")]
    MapTooLarge { width: u32, height: u32 },
    #[error("no cell with index {0}")]
    InvalidCell(CellIndex),
    #[error("cell {0} is already occupied by a unit")]
    CellOccupied(HexCoordinates),
    #[error("cell {0} is not a valid destination")]
    InvalidDestination(HexCoordinates),
    #[error("path doesn't start on the cell of unit {0}")]
    PathMismatch(UnitId),
    #[error("no unit with id {0}")]
    UnknownUnit(UnitId),
}

#[derive(Debug, Error)]
pub enum MapLoadError {
    #[error("failed to read map data")]
    Io(#[from] std::io::Error),
    #[error("unknown map format {0}")]
    UnknownFormat(i32),
    #[error(transparent)]
    Grid(#[from] HexGridError),
    #[error("unit placed outside the map at {0}")]
    UnitOutOfBounds(HexCoordinates),
    #[error("invalid river direction byte {0}")]
    InvalidRiverDirection(u8),
}
