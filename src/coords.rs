//! Cube coordinates for hex cells.
use std::fmt;
use std::io::{self, Read, Write};

use bevy::math::Vec3;

use crate::{
    dir::HexDirection,
    metrics::{INNER_RADIUS, OUTER_RADIUS},
};

/// Cube coordinate of a hex cell.
///
/// Only `x` and `z` are stored, `y` is derived so `x + y + z == 0` always holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HexCoordinates {
    x: i32,
    z: i32,
}

impl HexCoordinates {
    pub const fn new(x: i32, z: i32) -> Self {
        HexCoordinates { x, z }
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        -self.x - self.z
    }

    #[inline]
    pub fn z(&self) -> i32 {
        self.z
    }

    /// Converts offset (column, row) coordinates, where odd rows are shifted half a cell.
    pub fn from_offset(x: i32, z: i32) -> Self {
        HexCoordinates::new(x - z.div_euclid(2), z)
    }

    /// Inverse of [`HexCoordinates::from_offset`].
    pub fn to_offset(&self) -> (i32, i32) {
        (self.x + self.z.div_euclid(2), self.z)
    }

    /// Converts a position in grid space to the coordinate of the cell containing it.
    ///
    /// Each cube component is rounded independently. If the rounded components
    /// don't sum to zero, the one with the largest rounding error is rebuilt from
    /// the other two.
    pub fn from_position(position: Vec3) -> Self {
        let mut x = position.x / (INNER_RADIUS * 2.0);
        let mut y = -x;
        let offset = position.z / (OUTER_RADIUS * 3.0);
        x -= offset;
        y -= offset;

        let mut ix = x.round_ties_even() as i32;
        let iy = y.round_ties_even() as i32;
        let mut iz = (-x - y).round_ties_even() as i32;

        if ix + iy + iz != 0 {
            let dx = (x - ix as f32).abs();
            let dy = (y - iy as f32).abs();
            let dz = (-x - y - iz as f32).abs();

            if dx > dy && dx > dz {
                ix = -iy - iz;
            } else if dz > dy {
                iz = -ix - iy;
            }
        }

        HexCoordinates::new(ix, iz)
    }

    /// Number of cell steps between two coordinates.
    pub fn distance_to(&self, other: HexCoordinates) -> u32 {
        (self.x.abs_diff(other.x) + self.y().abs_diff(other.y()) + self.z.abs_diff(other.z)) / 2
    }

    /// The adjacent coordinate in the given direction.
    pub fn step(&self, direction: HexDirection) -> HexCoordinates {
        let (dx, dz) = direction.vector();
        HexCoordinates::new(self.x + dx, self.z + dz)
    }

    pub fn to_string_on_separate_lines(&self) -> String {
        format!("{}\n{}\n{}", self.x, self.y(), self.z)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.x.to_le_bytes())?;
        writer.write_all(&self.z.to_le_bytes())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        let x = i32::from_le_bytes(buf);
        reader.read_exact(&mut buf)?;
        let z = i32::from_le_bytes(buf);
        Ok(HexCoordinates::new(x, z))
    }
}

impl fmt::Display for HexCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y(), self.z)
    }
}
