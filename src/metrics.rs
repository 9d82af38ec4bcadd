//! Geometric constants for the hex layout and edge classification.
use bevy::math::Vec3;

/// Distance from a cell center to its corners.
pub const OUTER_RADIUS: f32 = 10.0;
pub const OUTER_TO_INNER: f32 = 0.866025404;
/// Distance from a cell center to the middle of its edges.
pub const INNER_RADIUS: f32 = OUTER_RADIUS * OUTER_TO_INNER;

/// World height of one elevation level.
pub const ELEVATION_STEP: f32 = 3.0;

/// Default chunk dimensions in cells.
pub const CHUNK_SIZE_X: u32 = 5;
pub const CHUNK_SIZE_Z: u32 = 5;

/// Classification of the boundary between two adjacent cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HexEdgeType {
    Flat,
    Slope,
    Cliff,
}

pub fn edge_type(elevation1: u8, elevation2: u8) -> HexEdgeType {
    match elevation1.abs_diff(elevation2) {
        0 => HexEdgeType::Flat,
        1 => HexEdgeType::Slope,
        _ => HexEdgeType::Cliff,
    }
}

/// Center of the cell at the given offset coordinates, at elevation 0.
pub fn cell_center(offset_x: u32, offset_z: u32) -> Vec3 {
    let x = offset_x as f32 + offset_z as f32 * 0.5 - (offset_z / 2) as f32;
    Vec3::new(
        x * (INNER_RADIUS * 2.0),
        0.0,
        offset_z as f32 * (OUTER_RADIUS * 1.5),
    )
}

pub fn elevation_height(elevation: u8) -> f32 {
    elevation as f32 * ELEVATION_STEP
}
