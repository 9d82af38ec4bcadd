//! Binary map format.
//!
//! A map file is an `i32` version header followed by the map. Version 1 added the
//! map size, version 2 added units. All values are little endian.
use std::io::{self, Read, Write};

use bevy::log::{info, warn};

use crate::{
    cell::HexCell,
    coords::HexCoordinates,
    dir::HexDirection,
    error::MapLoadError,
    grid::{GridSettingsBuilder, HexGrid},
};

/// Version written by [`HexGrid::save`].
pub const MAP_FORMAT_VERSION: i32 = 2;

const RIVER_FLAG: u8 = 128;

impl HexGrid {
    /// Writes the map, its cells and its units.
    pub fn save<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_i32(writer, MAP_FORMAT_VERSION)?;
        write_i32(writer, self.cell_count_x() as i32)?;
        write_i32(writer, self.cell_count_z() as i32)?;

        for cell in self.cells() {
            writer.write_all(&encode_cell(cell))?;
        }

        write_i32(writer, self.units.len() as i32)?;
        for (_, unit) in self.units.iter() {
            let coordinates = self
                .cell(unit.location())
                .map(HexCell::coordinates)
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "unit outside the map"))?;
            coordinates.write_to(writer)?;
            writer.write_all(&unit.orientation.to_le_bytes())?;
        }

        Ok(())
    }

    /// Replaces this map with one read from `reader`.
    ///
    /// The map is rebuilt from scratch, so on error the current map is kept as it was.
    pub fn load<R: Read>(&mut self, reader: &mut R) -> Result<(), MapLoadError> {
        let version = read_i32(reader)?;
        if !(0..=MAP_FORMAT_VERSION).contains(&version) {
            warn!("Unknown map format {}", version);
            return Err(MapLoadError::UnknownFormat(version));
        }

        let (cell_count_x, cell_count_z) = if version >= 1 {
            (read_i32(reader)?, read_i32(reader)?)
        } else {
            (20, 15)
        };
        let (chunk_size_x, chunk_size_z) = self.chunk_size();
        let settings = GridSettingsBuilder::new(
            u32::try_from(cell_count_x).unwrap_or(0),
            u32::try_from(cell_count_z).unwrap_or(0),
        )
        .chunk_size(chunk_size_x, chunk_size_z)
        .build();
        let mut grid = HexGrid::new(&settings)?;

        let mut data = [0u8; 11];
        for cell in grid.cells.iter_mut() {
            reader.read_exact(&mut data)?;
            decode_cell(cell, &data)?;
        }

        if version >= 2 {
            let unit_count = read_i32(reader)?;
            for _ in 0..unit_count {
                let coordinates = HexCoordinates::read_from(reader)?;
                let orientation = read_f32(reader)?;
                let index = grid
                    .cell_at(coordinates)
                    .ok_or(MapLoadError::UnitOutOfBounds(coordinates))?;
                grid.add_unit(index, orientation)?;
            }
        }

        info!(
            "Loaded {}x{} map with {} units (format {})",
            grid.cell_count_x(),
            grid.cell_count_z(),
            grid.units.len(),
            version
        );

        *self = grid;
        Ok(())
    }
}

fn encode_cell(cell: &HexCell) -> [u8; 11] {
    [
        cell.terrain_type_index,
        cell.elevation,
        cell.water_level,
        cell.urban_level,
        cell.farm_level,
        cell.plant_level,
        cell.special_index,
        cell.walled as u8,
        encode_river(cell.incoming_river),
        encode_river(cell.outgoing_river),
        cell.road_flags(),
    ]
}

fn decode_cell(cell: &mut HexCell, data: &[u8; 11]) -> Result<(), MapLoadError> {
    cell.terrain_type_index = data[0];
    cell.elevation = data[1];
    cell.water_level = data[2];
    cell.urban_level = data[3];
    cell.farm_level = data[4];
    cell.plant_level = data[5];
    cell.special_index = data[6];
    cell.walled = data[7] != 0;
    cell.incoming_river = decode_river(data[8])?;
    cell.outgoing_river = decode_river(data[9])?;
    for direction in HexDirection::ALL {
        cell.roads[direction.index()] = data[10] & (1 << direction.index()) != 0;
    }
    Ok(())
}

fn encode_river(river: Option<HexDirection>) -> u8 {
    river.map_or(0, |direction| RIVER_FLAG + direction.index() as u8)
}

fn decode_river(byte: u8) -> Result<Option<HexDirection>, MapLoadError> {
    if byte < RIVER_FLAG {
        return Ok(None);
    }
    HexDirection::from_index(byte - RIVER_FLAG)
        .map(Some)
        .ok_or(MapLoadError::InvalidRiverDirection(byte))
}

fn write_i32<W: Write>(writer: &mut W, value: i32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_f32<R: Read>(reader: &mut R) -> io::Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::HexGridError, grid::GridSettingsBuilder};
    use rand::Rng;

    fn grid(x: u32, z: u32) -> HexGrid {
        HexGrid::new(&GridSettingsBuilder::new(x, z).build()).unwrap()
    }

    fn assert_same_terrain(a: &HexGrid, b: &HexGrid) {
        assert_eq!(a.cell_count(), b.cell_count());
        for (left, right) in a.cells().zip(b.cells()) {
            assert_eq!(encode_cell(left), encode_cell(right), "cell {}", left.coordinates());
            assert_eq!(left.unit(), right.unit());
        }
    }

    #[test]
    fn test_round_trip() {
        let mut rng = rand::rng();
        let mut original = grid(10, 5);
        for index in 0..original.cell_count() {
            original.set_terrain_type(index, rng.random_range(0..5));
            original.set_elevation(index, rng.random_range(0..4));
            original.set_water_level(index, rng.random_range(0..3));
            original.set_urban_level(index, rng.random_range(0..4));
            original.set_farm_level(index, rng.random_range(0..4));
            original.set_plant_level(index, rng.random_range(0..4));
            original.set_walled(index, rng.random_bool(0.2));
        }
        for index in 0..original.cell_count() {
            let direction = HexDirection::ALL[rng.random_range(0..6)];
            if rng.random_bool(0.3) {
                original.set_outgoing_river(index, direction);
            } else if rng.random_bool(0.5) {
                original.add_road(index, direction);
            } else if rng.random_bool(0.1) {
                original.set_special_index(index, rng.random_range(1..4));
            }
        }
        let first = original.add_unit(3, 45.0).unwrap();
        original.add_unit(27, 270.5).unwrap();

        let mut bytes = Vec::new();
        original.save(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 4 + 8 + 50 * 11 + 4 + 2 * 12);

        let mut loaded = grid(5, 5);
        loaded.load(&mut bytes.as_slice()).unwrap();
        assert_eq!(loaded.cell_count_x(), 10);
        assert_eq!(loaded.cell_count_z(), 5);
        assert_same_terrain(&original, &loaded);
        assert_eq!(loaded.units().count(), 2);
        assert_eq!(loaded.unit(first).unwrap().location(), 3);
        assert_eq!(loaded.unit(first).unwrap().orientation, 45.0);

        let mut again = Vec::new();
        loaded.save(&mut again).unwrap();
        assert_eq!(bytes, again);
    }

    #[test]
    fn test_cell_encoding() {
        let mut grid = grid(5, 5);
        let a = grid.cell_at_offset(1, 1).unwrap();
        grid.set_elevation(a, 1);
        grid.set_outgoing_river(a, HexDirection::E);
        grid.add_road(a, HexDirection::W);
        grid.add_road(a, HexDirection::NE);
        grid.set_walled(a, true);

        let data = encode_cell(grid.cell(a).unwrap());
        assert_eq!(data, [0, 1, 0, 0, 0, 0, 0, 1, 0, 128 + 1, 0b01_0001]);

        let east = grid.neighbor(a, HexDirection::E).unwrap();
        assert_eq!(encode_cell(grid.cell(east).unwrap())[8], 128 + 4);
    }

    #[test]
    fn test_version_zero_is_twenty_by_fifteen() {
        let mut bytes = Vec::new();
        write_i32(&mut bytes, 0).unwrap();
        bytes.extend(std::iter::repeat_n(0u8, 20 * 15 * 11));
        bytes[4 + 11 + 1] = 3;

        let mut grid = grid(5, 5);
        grid.load(&mut bytes.as_slice()).unwrap();
        assert_eq!(grid.cell_count(), 300);
        assert_eq!(grid.cell(1).unwrap().elevation(), 3);
        assert_eq!(grid.units().count(), 0);
    }

    #[test]
    fn test_version_one_has_no_units() {
        let mut bytes = Vec::new();
        write_i32(&mut bytes, 1).unwrap();
        write_i32(&mut bytes, 5).unwrap();
        write_i32(&mut bytes, 5).unwrap();
        bytes.extend(std::iter::repeat_n(0u8, 25 * 11));

        let mut grid = grid(10, 10);
        grid.add_unit(0, 0.0).unwrap();
        grid.load(&mut bytes.as_slice()).unwrap();
        assert_eq!(grid.cell_count(), 25);
        assert_eq!(grid.units().count(), 0);
    }

    #[test]
    fn test_oversized_header_is_rejected() {
        let mut grid = grid(5, 5);
        grid.set_elevation(3, 1);

        let mut bytes = Vec::new();
        for value in [2, 2_147_483_645, 2_147_483_645] {
            write_i32(&mut bytes, value).unwrap();
        }
        assert!(matches!(
            grid.load(&mut bytes.as_slice()),
            Err(MapLoadError::Grid(HexGridError::MapTooLarge { .. }))
        ));

        let mut bytes = Vec::new();
        for value in [2, 5_000, 5_000] {
            write_i32(&mut bytes, value).unwrap();
        }
        assert!(matches!(
            grid.load(&mut bytes.as_slice()),
            Err(MapLoadError::Grid(HexGridError::MapTooLarge { .. }))
        ));

        assert_eq!(grid.cell_count(), 25);
        assert_eq!(grid.cell(3).unwrap().elevation(), 1);
    }

    #[test]
    fn test_load_errors_keep_map() {
        let mut grid = grid(5, 5);
        grid.set_elevation(0, 2);

        let mut bytes = Vec::new();
        write_i32(&mut bytes, 3).unwrap();
        assert!(matches!(
            grid.load(&mut bytes.as_slice()),
            Err(MapLoadError::UnknownFormat(3))
        ));

        let mut truncated = Vec::new();
        grid.save(&mut truncated).unwrap();
        truncated.truncate(40);
        assert!(matches!(grid.load(&mut truncated.as_slice()), Err(MapLoadError::Io(_))));

        let mut bad_size = Vec::new();
        for value in [2, 7, 5] {
            write_i32(&mut bad_size, value).unwrap();
        }
        assert!(matches!(
            grid.load(&mut bad_size.as_slice()),
            Err(MapLoadError::Grid(HexGridError::UnsupportedMapSize { .. }))
        ));

        let mut bad_river = Vec::new();
        grid.save(&mut bad_river).unwrap();
        bad_river[12 + 8] = 128 + 6;
        assert!(matches!(
            grid.load(&mut bad_river.as_slice()),
            Err(MapLoadError::InvalidRiverDirection(134))
        ));

        let mut bad_unit = Vec::new();
        grid.save(&mut bad_unit).unwrap();
        let units_at = bad_unit.len() - 4;
        bad_unit.truncate(units_at);
        write_i32(&mut bad_unit, 1).unwrap();
        HexCoordinates::new(-3, 0).write_to(&mut bad_unit).unwrap();
        bad_unit.extend(0f32.to_le_bytes());
        assert!(matches!(
            grid.load(&mut bad_unit.as_slice()),
            Err(MapLoadError::UnitOutOfBounds(_))
        ));

        assert_eq!(grid.cell_count(), 25);
        assert_eq!(grid.cell(0).unwrap().elevation(), 2);
    }
}
