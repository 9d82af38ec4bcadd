//! This module contains the `HexGrid` resource which owns every cell of the map.
use bevy::{
    log::{info, warn},
    math::{UVec2, Vec3},
    prelude::Resource,
};
use ndarray::Array2;
use rustc_hash::FxHashSet;
use slab::Slab;
use smallvec::SmallVec;

use crate::{
    cell::HexCell,
    cell_dim,
    chunk::Chunk,
    coords::HexCoordinates,
    dir::HexDirection,
    error::HexGridError,
    metrics::{self, CHUNK_SIZE_X, CHUNK_SIZE_Z},
    path::HexPath,
    pathfind::{self, PathSearch, Reachable},
    unit::HexUnit,
    CellIndex, MovementCost, UnitId,
};

/// Largest number of cells a map may have.
pub const MAX_CELL_COUNT: usize = 1 << 20;

/// Holder for internal crate settings.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridSettings(pub(crate) GridInternalSettings);

/// Builder for [`GridSettings`].
///
/// Example usage:
/// ```
/// use bevy_hexroute::prelude::*;
///
/// let grid_settings = GridSettingsBuilder::new(20, 15).chunk_size(5, 5).build();
/// let grid = HexGrid::new(&grid_settings).unwrap();
/// assert_eq!(grid.cell_count(), 300);
/// ```
#[derive(Clone, Debug)]
pub struct GridSettingsBuilder {
    cell_count_x: u32,
    cell_count_z: u32,
    chunk_size_x: u32,
    chunk_size_z: u32,
}

impl Default for GridSettingsBuilder {
    fn default() -> Self {
        GridSettingsBuilder {
            cell_count_x: 20,
            cell_count_z: 15,
            chunk_size_x: CHUNK_SIZE_X,
            chunk_size_z: CHUNK_SIZE_Z,
        }
    }
}

impl GridSettingsBuilder {
    /// Initalize a map of `cell_count_x` columns and `cell_count_z` rows.
    /// Both must be multiples of the chunk size, which is checked by [`HexGrid::new`].
    pub fn new(cell_count_x: u32, cell_count_z: u32) -> Self {
        GridSettingsBuilder {
            cell_count_x,
            cell_count_z,
            ..Default::default()
        }
    }

    /// Size in cells of the chunks the map is divided into.
    pub fn chunk_size(mut self, chunk_size_x: u32, chunk_size_z: u32) -> Self {
        self.chunk_size_x = chunk_size_x;
        self.chunk_size_z = chunk_size_z;
        self
    }

    pub fn build(self) -> GridSettings {
        GridSettings(GridInternalSettings {
            cell_count_x: self.cell_count_x,
            cell_count_z: self.cell_count_z,
            chunk_size_x: self.chunk_size_x,
            chunk_size_z: self.chunk_size_z,
        })
    }
}

#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct GridInternalSettings {
    pub(crate) cell_count_x: u32,
    pub(crate) cell_count_z: u32,
    pub(crate) chunk_size_x: u32,
    pub(crate) chunk_size_z: u32,
}

impl Default for GridInternalSettings {
    fn default() -> Self {
        GridSettingsBuilder::default().build().0
    }
}

/// What changed when a cell's elevation was set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElevationChange {
    pub changed: bool,
    pub removed_outgoing_river: bool,
    pub removed_incoming_river: bool,
    /// Directions of roads removed because they became too steep.
    pub removed_roads: SmallVec<[HexDirection; 6]>,
}

impl ElevationChange {
    /// True if the new elevation invalidated rivers or roads.
    pub fn cascaded(&self) -> bool {
        self.removed_outgoing_river || self.removed_incoming_river || !self.removed_roads.is_empty()
    }
}

/// `HexGrid` is the main `Resource` of the crate.
///
/// It owns the cells, their neighbor links, the units standing on them and the
/// search context reused by every pathfinding call.
///
/// # Example
/// ```
/// use bevy_hexroute::prelude::*;
///
/// let mut grid = HexGrid::new(&GridSettingsBuilder::new(10, 10).build()).unwrap();
///
/// let from = grid.cell_at_offset(0, 0).unwrap();
/// let to = grid.cell_at_offset(9, 9).unwrap();
///
/// // A hill with a road on it.
/// let hill = grid.cell_at_offset(1, 0).unwrap();
/// grid.set_elevation(hill, 1);
/// grid.add_road(from, HexDirection::E);
///
/// let path = grid.find_path(from, to, 24).unwrap();
/// assert_eq!(path.first().unwrap().cell, from);
/// assert_eq!(path.last().unwrap().cell, to);
/// ```
#[derive(Resource, Debug)]
pub struct HexGrid {
    cell_count_x: u32,
    cell_count_z: u32,
    chunk_size_x: u32,
    chunk_size_z: u32,

    pub(crate) cells: Array2<HexCell>,
    chunks: Array2<Chunk>,
    dirty_chunks: FxHashSet<(usize, usize)>,

    pub(crate) units: Slab<HexUnit>,
    search: PathSearch,
}

impl HexGrid {
    /// Creates a new [`HexGrid`] from [`GridSettings`].
    /// Fails if the map size isn't a positive multiple of the chunk size.
    pub fn new(settings: &GridSettings) -> Result<Self, HexGridError> {
        let GridInternalSettings {
            cell_count_x,
            cell_count_z,
            chunk_size_x,
            chunk_size_z,
        } = settings.0;

        validate_size(cell_count_x, cell_count_z, chunk_size_x, chunk_size_z)?;

        let (cells, chunks) = build_map(&settings.0);

        Ok(HexGrid {
            cell_count_x,
            cell_count_z,
            chunk_size_x,
            chunk_size_z,
            dirty_chunks: all_chunks(&chunks),
            cells,
            chunks,
            units: Slab::new(),
            search: PathSearch::new(),
        })
    }

    /// Rebuilds the map with a new size. Terrain and units are discarded.
    /// On error the current map is left untouched.
    pub fn resize(&mut self, cell_count_x: u32, cell_count_z: u32) -> Result<(), HexGridError> {
        if let Err(err) = validate_size(cell_count_x, cell_count_z, self.chunk_size_x, self.chunk_size_z) {
            warn!("{}", err);
            return Err(err);
        }

        self.cell_count_x = cell_count_x;
        self.cell_count_z = cell_count_z;
        let (cells, chunks) = build_map(&GridInternalSettings {
            cell_count_x,
            cell_count_z,
            chunk_size_x: self.chunk_size_x,
            chunk_size_z: self.chunk_size_z,
        });
        self.dirty_chunks = all_chunks(&chunks);
        self.cells = cells;
        self.chunks = chunks;
        self.units.clear();

        Ok(())
    }

    pub fn cell_count_x(&self) -> u32 {
        self.cell_count_x
    }

    pub fn cell_count_z(&self) -> u32 {
        self.cell_count_z
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn chunk_size(&self) -> (u32, u32) {
        (self.chunk_size_x, self.chunk_size_z)
    }

    pub fn cell(&self, index: CellIndex) -> Option<&HexCell> {
        self.cells.get(cell_dim(index, self.cells.ncols()))
    }

    fn cell_mut(&mut self, index: CellIndex) -> Option<&mut HexCell> {
        let dim = cell_dim(index, self.cells.ncols());
        self.cells.get_mut(dim)
    }

    /// All cells in index order, row by row.
    pub fn cells(&self) -> impl Iterator<Item = &HexCell> {
        self.cells.iter()
    }

    pub fn neighbor(&self, index: CellIndex, direction: HexDirection) -> Option<CellIndex> {
        self.cell(index).and_then(|cell| cell.neighbor(direction))
    }

    /// Index of the cell at `coordinates`, or `None` outside the map.
    pub fn cell_at(&self, coordinates: HexCoordinates) -> Option<CellIndex> {
        let z = coordinates.z();
        if z < 0 || z >= self.cell_count_z as i32 {
            return None;
        }
        let x = coordinates.x() + z / 2;
        if x < 0 || x >= self.cell_count_x as i32 {
            return None;
        }
        Some(x as usize + z as usize * self.cell_count_x as usize)
    }

    pub fn cell_at_offset(&self, x: u32, z: u32) -> Option<CellIndex> {
        (x < self.cell_count_x && z < self.cell_count_z)
            .then(|| x as usize + z as usize * self.cell_count_x as usize)
    }

    /// Index of the cell containing the grid space `position`.
    pub fn cell_at_position(&self, position: Vec3) -> Option<CellIndex> {
        self.cell_at(HexCoordinates::from_position(position))
    }

    // ------------------------------------------------------------------------
    // Chunks
    // ------------------------------------------------------------------------

    pub fn chunk(&self, chunk_x: usize, chunk_z: usize) -> Option<&Chunk> {
        self.chunks.get([chunk_z, chunk_x])
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// Chunk index `(chunk_x, chunk_z)` of the chunk containing `index`.
    pub fn chunk_of(&self, index: CellIndex) -> Option<(usize, usize)> {
        let width = self.cell_count_x as usize;
        (index < self.cells.len()).then(|| {
            let [z, x] = cell_dim(index, width);
            (x / self.chunk_size_x as usize, z / self.chunk_size_z as usize)
        })
    }

    pub fn is_chunk_dirty(&self, chunk_x: usize, chunk_z: usize) -> bool {
        self.dirty_chunks.contains(&(chunk_x, chunk_z))
    }

    /// Chunks changed since the last call to [`HexGrid::take_dirty_chunks`].
    pub fn dirty_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks
            .iter()
            .filter(|chunk| self.dirty_chunks.contains(&chunk.index()))
    }

    /// Returns the changed chunks, sorted, and marks every chunk clean.
    pub fn take_dirty_chunks(&mut self) -> Vec<(usize, usize)> {
        let mut dirty: Vec<_> = self.dirty_chunks.drain().collect();
        dirty.sort_unstable_by_key(|&(x, z)| (z, x));
        dirty
    }

    fn refresh_self_only(&mut self, index: CellIndex) {
        if let Some(chunk) = self.chunk_of(index) {
            self.dirty_chunks.insert(chunk);
        }
    }

    /// Marks the chunk of `index` and the chunks of its neighbors dirty.
    fn refresh(&mut self, index: CellIndex) {
        self.refresh_self_only(index);
        for direction in HexDirection::ALL {
            if let Some(neighbor) = self.neighbor(index, direction) {
                self.refresh_self_only(neighbor);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Terrain
    // ------------------------------------------------------------------------

    /// Sets the elevation of a cell and removes rivers and roads it invalidates:
    /// an outgoing river that would now flow uphill, an incoming river that would
    /// now arrive from below, and roads across edges steeper than one level.
    pub fn set_elevation(&mut self, index: CellIndex, elevation: u8) -> ElevationChange {
        let mut change = ElevationChange::default();
        let Some(cell) = self.cell_mut(index) else {
            return change;
        };
        if cell.elevation == elevation {
            return change;
        }
        cell.elevation = elevation;
        change.changed = true;

        let cell = cell.clone();

        if let Some(downstream) = cell.outgoing_river.and_then(|dir| cell.neighbor(dir)) {
            if self.cell(downstream).is_some_and(|n| elevation < n.elevation) {
                change.removed_outgoing_river = self.remove_outgoing_river(index);
            }
        }

        if let Some(upstream) = cell.incoming_river.and_then(|dir| cell.neighbor(dir)) {
            if self.cell(upstream).is_some_and(|n| elevation > n.elevation) {
                change.removed_incoming_river = self.remove_incoming_river(index);
            }
        }

        for direction in HexDirection::ALL {
            if !cell.has_road_through_edge(direction) {
                continue;
            }
            let too_steep = cell
                .neighbor(direction)
                .and_then(|n| self.cell(n))
                .is_some_and(|n| n.elevation.abs_diff(elevation) > 1);
            if too_steep {
                self.set_road(index, direction, false);
                change.removed_roads.push(direction);
            }
        }

        self.refresh(index);
        change
    }

    pub fn set_water_level(&mut self, index: CellIndex, water_level: u8) -> bool {
        match self.cell_mut(index) {
            Some(cell) if cell.water_level != water_level => cell.water_level = water_level,
            _ => return false,
        }
        self.refresh(index);
        true
    }

    pub fn set_terrain_type(&mut self, index: CellIndex, terrain_type_index: u8) -> bool {
        match self.cell_mut(index) {
            Some(cell) if cell.terrain_type_index != terrain_type_index => {
                cell.terrain_type_index = terrain_type_index
            }
            _ => return false,
        }
        self.refresh(index);
        true
    }

    pub fn set_walled(&mut self, index: CellIndex, walled: bool) -> bool {
        match self.cell_mut(index) {
            Some(cell) if cell.walled != walled => cell.walled = walled,
            _ => return false,
        }
        self.refresh(index);
        true
    }

    pub fn set_urban_level(&mut self, index: CellIndex, level: u8) -> bool {
        self.set_feature_level(index, level, |cell| &mut cell.urban_level)
    }

    pub fn set_farm_level(&mut self, index: CellIndex, level: u8) -> bool {
        self.set_feature_level(index, level, |cell| &mut cell.farm_level)
    }

    pub fn set_plant_level(&mut self, index: CellIndex, level: u8) -> bool {
        self.set_feature_level(index, level, |cell| &mut cell.plant_level)
    }

    fn set_feature_level<F>(&mut self, index: CellIndex, level: u8, field: F) -> bool
    where
        F: FnOnce(&mut HexCell) -> &mut u8,
    {
        match self.cell_mut(index).map(field) {
            Some(current) if *current != level => *current = level,
            _ => return false,
        }
        self.refresh_self_only(index);
        true
    }

    /// Sets the special feature of a cell. Cells with a river can't hold one and
    /// roads are cleared from cells that get one.
    pub fn set_special_index(&mut self, index: CellIndex, special_index: u8) -> bool {
        match self.cell_mut(index) {
            Some(cell) if cell.special_index != special_index && !cell.has_river() => {
                cell.special_index = special_index
            }
            _ => return false,
        }
        self.remove_roads(index);
        self.refresh_self_only(index);
        true
    }

    // ------------------------------------------------------------------------
    // Rivers
    // ------------------------------------------------------------------------

    /// Starts a river flowing out of `index` towards `direction`.
    ///
    /// The neighbor must exist and not be higher than this cell. Any river already
    /// leaving this cell, a river coming in from the same edge and the river
    /// entering the neighbor are removed, as well as the road on that edge.
    pub fn set_outgoing_river(&mut self, index: CellIndex, direction: HexDirection) -> bool {
        let Some(cell) = self.cell(index) else {
            return false;
        };
        if cell.outgoing_river == Some(direction) {
            return false;
        }
        let elevation = cell.elevation;
        let Some(neighbor) = cell.neighbor(direction) else {
            return false;
        };
        if self.cell(neighbor).is_none_or(|n| elevation < n.elevation) {
            return false;
        }

        self.remove_outgoing_river(index);
        if self.cell(index).is_some_and(|c| c.incoming_river == Some(direction)) {
            self.remove_incoming_river(index);
        }
        if let Some(cell) = self.cell_mut(index) {
            cell.outgoing_river = Some(direction);
            cell.special_index = 0;
        }

        self.remove_incoming_river(neighbor);
        if let Some(neighbor_cell) = self.cell_mut(neighbor) {
            neighbor_cell.incoming_river = Some(direction.opposite());
            neighbor_cell.special_index = 0;
        }

        self.set_road(index, direction, false);
        true
    }

    pub fn remove_outgoing_river(&mut self, index: CellIndex) -> bool {
        let Some(cell) = self.cell_mut(index) else {
            return false;
        };
        let Some(direction) = cell.outgoing_river.take() else {
            return false;
        };
        let neighbor = cell.neighbor(direction);
        self.refresh_self_only(index);

        if let Some(neighbor) = neighbor {
            if let Some(neighbor_cell) = self.cell_mut(neighbor) {
                neighbor_cell.incoming_river = None;
            }
            self.refresh_self_only(neighbor);
        }
        true
    }

    pub fn remove_incoming_river(&mut self, index: CellIndex) -> bool {
        let Some(cell) = self.cell_mut(index) else {
            return false;
        };
        let Some(direction) = cell.incoming_river.take() else {
            return false;
        };
        let neighbor = cell.neighbor(direction);
        self.refresh_self_only(index);

        if let Some(neighbor) = neighbor {
            if let Some(neighbor_cell) = self.cell_mut(neighbor) {
                neighbor_cell.outgoing_river = None;
            }
            self.refresh_self_only(neighbor);
        }
        true
    }

    /// Removes both rivers of a cell. Returns true if there was any.
    pub fn remove_river(&mut self, index: CellIndex) -> bool {
        let outgoing = self.remove_outgoing_river(index);
        let incoming = self.remove_incoming_river(index);
        outgoing || incoming
    }

    // ------------------------------------------------------------------------
    // Roads
    // ------------------------------------------------------------------------

    /// Adds a road across the edge in `direction`, if the edge has no river,
    /// neither cell is special and the elevation difference is at most one.
    pub fn add_road(&mut self, index: CellIndex, direction: HexDirection) -> bool {
        let Some(cell) = self.cell(index) else {
            return false;
        };
        let Some(neighbor) = cell.neighbor(direction).and_then(|n| self.cell(n)) else {
            return false;
        };

        let allowed = !cell.has_road_through_edge(direction)
            && !cell.has_river_through_edge(direction)
            && !cell.is_special()
            && !neighbor.is_special()
            && cell.elevation_difference(neighbor) <= 1;

        if allowed {
            self.set_road(index, direction, true);
        }
        allowed
    }

    /// Removes every road of a cell. Returns how many were removed.
    pub fn remove_roads(&mut self, index: CellIndex) -> usize {
        let Some(cell) = self.cell(index) else {
            return 0;
        };
        let roads: SmallVec<[HexDirection; 6]> = HexDirection::ALL
            .into_iter()
            .filter(|&direction| cell.has_road_through_edge(direction))
            .collect();

        for &direction in &roads {
            self.set_road(index, direction, false);
        }
        roads.len()
    }

    /// Sets the road flag on both sides of an edge.
    fn set_road(&mut self, index: CellIndex, direction: HexDirection, state: bool) {
        let Some(cell) = self.cell_mut(index) else {
            return;
        };
        cell.roads[direction.index()] = state;
        let neighbor = cell.neighbor(direction);
        self.refresh_self_only(index);

        if let Some(neighbor) = neighbor {
            if let Some(neighbor_cell) = self.cell_mut(neighbor) {
                neighbor_cell.roads[direction.opposite().index()] = state;
            }
            self.refresh_self_only(neighbor);
        }
    }

    // ------------------------------------------------------------------------
    // Units
    // ------------------------------------------------------------------------

    pub fn unit(&self, id: UnitId) -> Option<&HexUnit> {
        self.units.get(id)
    }

    pub fn units(&self) -> impl Iterator<Item = (UnitId, &HexUnit)> {
        self.units.iter()
    }

    /// World position of a unit, the position of the cell it stands on.
    pub fn unit_position(&self, id: UnitId) -> Option<Vec3> {
        self.unit(id)
            .and_then(|unit| self.cell(unit.location))
            .map(HexCell::position)
    }

    /// A unit may end its move on a cell that is dry and free.
    pub fn is_valid_destination(&self, index: CellIndex) -> bool {
        self.cell(index)
            .is_some_and(|cell| !cell.is_underwater() && cell.unit.is_none())
    }

    /// Places a new unit on a free cell.
    pub fn add_unit(&mut self, index: CellIndex, orientation: f32) -> Result<UnitId, HexGridError> {
        let cell = self.cell(index).ok_or(HexGridError::InvalidCell(index))?;
        if cell.unit.is_some() {
            return Err(HexGridError::CellOccupied(cell.coordinates));
        }

        let id = self.units.insert(HexUnit::new(index, orientation));
        if let Some(cell) = self.cell_mut(index) {
            cell.unit = Some(id);
        }
        Ok(id)
    }

    pub fn remove_unit(&mut self, id: UnitId) -> Result<HexUnit, HexGridError> {
        let unit = self.units.try_remove(id).ok_or(HexGridError::UnknownUnit(id))?;
        if let Some(cell) = self.cell_mut(unit.location) {
            cell.unit = None;
        }
        Ok(unit)
    }

    pub fn clear_units(&mut self) {
        for unit in self.units.drain() {
            let dim = cell_dim(unit.location, self.cells.ncols());
            if let Some(cell) = self.cells.get_mut(dim) {
                cell.unit = None;
            }
        }
    }

    /// Moves a unit to the last cell of `path` and turns it to face along the final step.
    pub fn travel(&mut self, id: UnitId, path: &HexPath) -> Result<(), HexGridError> {
        let location = self.unit(id).ok_or(HexGridError::UnknownUnit(id))?.location;
        let (Some(start), Some(destination)) = (path.first(), path.last()) else {
            return Ok(());
        };
        if start.cell != location {
            return Err(HexGridError::PathMismatch(id));
        }
        let destination = destination.cell;
        if destination == location {
            return Ok(());
        }
        if !self.is_valid_destination(destination) {
            let coordinates = self
                .cell(destination)
                .map(HexCell::coordinates)
                .ok_or(HexGridError::InvalidCell(destination))?;
            return Err(HexGridError::InvalidDestination(coordinates));
        }

        let facing = path.steps().len().checked_sub(2).and_then(|i| {
            let from = self.cell(path.steps()[i].cell)?.position();
            let to = self.cell(destination)?.position();
            Some((to.x - from.x).atan2(to.z - from.z).to_degrees().rem_euclid(360.0))
        });

        if let Some(cell) = self.cell_mut(location) {
            cell.unit = None;
        }
        if let Some(cell) = self.cell_mut(destination) {
            cell.unit = Some(id);
        }
        if let Some(unit) = self.units.get_mut(id) {
            unit.location = destination;
            if let Some(facing) = facing {
                unit.orientation = facing;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Pathfinding
    // ------------------------------------------------------------------------

    /// Cost of stepping from `index` to its neighbor in `direction`, `None` if blocked.
    pub fn move_cost(&self, index: CellIndex, direction: HexDirection) -> Option<MovementCost> {
        let cell = self.cell(index)?;
        let neighbor = self.cell(cell.neighbor(direction)?)?;
        pathfind::move_cost(cell, neighbor, direction)
    }

    /// Finds the path from `from` to `to` reaching the target in the fewest turns,
    /// spending at most `speed` movement per turn.
    ///
    /// Returns `None` if no path exists. Cells occupied by units other than the
    /// one on `from` block the way.
    pub fn find_path(&mut self, from: CellIndex, to: CellIndex, speed: MovementCost) -> Option<HexPath> {
        if speed == 0 {
            warn!("Ignoring path request with zero speed");
            return None;
        }
        if self.cell(from).is_none() || self.cell(to).is_none() {
            warn!("Path request from {} to {} is out of bounds", from, to);
            return None;
        }

        self.search.find_path(&mut self.cells, from, to, speed)
    }

    /// [`HexGrid::find_path`] between cube coordinates.
    pub fn find_path_between(
        &mut self,
        from: HexCoordinates,
        to: HexCoordinates,
        speed: MovementCost,
    ) -> Option<HexPath> {
        let from = self.cell_at(from)?;
        let to = self.cell_at(to)?;
        self.find_path(from, to, speed)
    }

    /// Every cell that can be reached from `from` in fewer than `max_turns` turns,
    /// with the movement spent to get there. The start cell is always included.
    pub fn movement_range(&mut self, from: CellIndex, speed: MovementCost, max_turns: u32) -> Vec<Reachable> {
        if speed == 0 || self.cell(from).is_none() {
            warn!("Ignoring movement range request from {} with speed {}", from, speed);
            return Vec::new();
        }

        self.search.movement_range(&mut self.cells, from, speed, max_turns)
    }

    /// Phase counter of the search context, advanced by every search.
    pub fn search_phase(&self) -> u32 {
        self.search.phase()
    }
}

fn validate_size(
    cell_count_x: u32,
    cell_count_z: u32,
    chunk_size_x: u32,
    chunk_size_z: u32,
) -> Result<(), HexGridError> {
    let too_large = (cell_count_x as usize)
        .checked_mul(cell_count_z as usize)
        .is_none_or(|count| count > MAX_CELL_COUNT);
    if too_large {
        return Err(HexGridError::MapTooLarge {
            width: cell_count_x,
            height: cell_count_z,
        });
    }

    let supported = cell_count_x > 0
        && cell_count_z > 0
        && chunk_size_x > 0
        && chunk_size_z > 0
        && cell_count_x % chunk_size_x == 0
        && cell_count_z % chunk_size_z == 0;

    if supported {
        Ok(())
    } else {
        Err(HexGridError::UnsupportedMapSize {
            width: cell_count_x,
            height: cell_count_z,
            chunk_x: chunk_size_x,
            chunk_z: chunk_size_z,
        })
    }
}

/// Links `index` to `other` in `direction` and `other` back to `index`.
pub(crate) fn set_neighbor(
    cells: &mut Array2<HexCell>,
    index: CellIndex,
    direction: HexDirection,
    other: CellIndex,
) {
    let width = cells.ncols();
    cells[cell_dim(index, width)].neighbors[direction.index()] = Some(other);
    cells[cell_dim(other, width)].neighbors[direction.opposite().index()] = Some(index);
}

/// Creates the cells with their neighbor links and the chunks covering them.
fn build_map(settings: &GridInternalSettings) -> (Array2<HexCell>, Array2<Chunk>) {
    let count_x = settings.cell_count_x as usize;
    let count_z = settings.cell_count_z as usize;

    let mut cells = Array2::from_shape_fn((count_z, count_x), |(z, x)| {
        HexCell::new(
            HexCoordinates::from_offset(x as i32, z as i32),
            z * count_x + x,
            metrics::cell_center(x as u32, z as u32),
        )
    });

    for z in 0..count_z {
        for x in 0..count_x {
            let i = z * count_x + x;
            if x > 0 {
                set_neighbor(&mut cells, i, HexDirection::W, i - 1);
            }
            if z > 0 {
                if z & 1 == 0 {
                    set_neighbor(&mut cells, i, HexDirection::SE, i - count_x);
                    if x > 0 {
                        set_neighbor(&mut cells, i, HexDirection::SW, i - count_x - 1);
                    }
                } else {
                    set_neighbor(&mut cells, i, HexDirection::SW, i - count_x);
                    if x < count_x - 1 {
                        set_neighbor(&mut cells, i, HexDirection::SE, i - count_x + 1);
                    }
                }
            }
        }
    }

    let (size_x, size_z) = (settings.chunk_size_x, settings.chunk_size_z);
    let chunk_count_x = (settings.cell_count_x / size_x) as usize;
    let chunk_count_z = (settings.cell_count_z / size_z) as usize;
    let chunks = Array2::from_shape_fn((chunk_count_z, chunk_count_x), |(z, x)| {
        let min = UVec2::new(x as u32 * size_x, z as u32 * size_z);
        Chunk::new((x, z), min, min + UVec2::new(size_x, size_z))
    });

    info!(
        "Created {}x{} hex grid with {}x{} chunks",
        count_x, count_z, chunk_count_x, chunk_count_z
    );

    (cells, chunks)
}

fn all_chunks(chunks: &Array2<Chunk>) -> FxHashSet<(usize, usize)> {
    chunks.iter().map(Chunk::index).collect()
}
