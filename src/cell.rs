//! `HexCell` holds the terrain, topology and transient search state of one map cell.
use bevy::math::Vec3;

use crate::{
    coords::HexCoordinates,
    dir::HexDirection,
    metrics::{self, HexEdgeType},
    CellIndex, UnitId,
};

/// Per-search bookkeeping written by the pathfinder.
///
/// The fields are only meaningful while `phase` matches the generation of the
/// search that wrote them.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SearchData {
    pub(crate) distance: u32,
    pub(crate) heuristic: u32,
    pub(crate) phase: u32,
    pub(crate) path_from: Option<CellIndex>,
    pub(crate) next_with_same_priority: Option<CellIndex>,
}

/// A cell of the [`crate::grid::HexGrid`].
///
/// Mutations that must stay consistent with a neighbor (rivers, roads, elevation)
/// are made through the grid, which owns every cell.
#[derive(Clone, Debug)]
pub struct HexCell {
    pub(crate) coordinates: HexCoordinates,
    pub(crate) index: CellIndex,
    pub(crate) center: Vec3,

    pub(crate) elevation: u8,
    pub(crate) water_level: u8,
    pub(crate) terrain_type_index: u8,
    pub(crate) urban_level: u8,
    pub(crate) farm_level: u8,
    pub(crate) plant_level: u8,
    pub(crate) special_index: u8,
    pub(crate) walled: bool,

    pub(crate) incoming_river: Option<HexDirection>,
    pub(crate) outgoing_river: Option<HexDirection>,
    pub(crate) roads: [bool; 6],

    pub(crate) neighbors: [Option<CellIndex>; 6],
    pub(crate) unit: Option<UnitId>,

    pub(crate) search: SearchData,
}

impl HexCell {
    pub(crate) fn new(coordinates: HexCoordinates, index: CellIndex, center: Vec3) -> Self {
        HexCell {
            coordinates,
            index,
            center,
            elevation: 0,
            water_level: 0,
            terrain_type_index: 0,
            urban_level: 0,
            farm_level: 0,
            plant_level: 0,
            special_index: 0,
            walled: false,
            incoming_river: None,
            outgoing_river: None,
            roads: [false; 6],
            neighbors: [None; 6],
            unit: None,
            search: SearchData::default(),
        }
    }

    pub fn coordinates(&self) -> HexCoordinates {
        self.coordinates
    }

    pub fn index(&self) -> CellIndex {
        self.index
    }

    /// World position of the cell center, raised by its elevation.
    pub fn position(&self) -> Vec3 {
        self.center + Vec3::Y * metrics::elevation_height(self.elevation)
    }

    pub fn neighbor(&self, direction: HexDirection) -> Option<CellIndex> {
        self.neighbors[direction.index()]
    }

    pub fn elevation(&self) -> u8 {
        self.elevation
    }

    pub fn water_level(&self) -> u8 {
        self.water_level
    }

    pub fn is_underwater(&self) -> bool {
        self.water_level > self.elevation
    }

    pub fn terrain_type_index(&self) -> u8 {
        self.terrain_type_index
    }

    pub fn urban_level(&self) -> u8 {
        self.urban_level
    }

    pub fn farm_level(&self) -> u8 {
        self.farm_level
    }

    pub fn plant_level(&self) -> u8 {
        self.plant_level
    }

    /// Combined decoration level, added to the cost of entering the cell.
    pub fn development_level(&self) -> u32 {
        self.urban_level as u32 + self.farm_level as u32 + self.plant_level as u32
    }

    pub fn special_index(&self) -> u8 {
        self.special_index
    }

    pub fn is_special(&self) -> bool {
        self.special_index > 0
    }

    pub fn walled(&self) -> bool {
        self.walled
    }

    pub fn incoming_river(&self) -> Option<HexDirection> {
        self.incoming_river
    }

    pub fn outgoing_river(&self) -> Option<HexDirection> {
        self.outgoing_river
    }

    pub fn has_river(&self) -> bool {
        self.incoming_river.is_some() || self.outgoing_river.is_some()
    }

    /// True if a river starts or ends in this cell.
    pub fn has_river_begin_or_end(&self) -> bool {
        self.incoming_river.is_some() != self.outgoing_river.is_some()
    }

    pub fn river_begin_or_end_direction(&self) -> Option<HexDirection> {
        if !self.has_river_begin_or_end() {
            return None;
        }
        self.incoming_river.or(self.outgoing_river)
    }

    pub fn has_river_through_edge(&self, direction: HexDirection) -> bool {
        self.incoming_river == Some(direction) || self.outgoing_river == Some(direction)
    }

    pub fn has_road_through_edge(&self, direction: HexDirection) -> bool {
        self.roads[direction.index()]
    }

    pub fn has_roads(&self) -> bool {
        self.roads.iter().any(|&road| road)
    }

    /// Road flags packed as a bitmask, bit `d` set for a road in direction `d`.
    pub fn road_flags(&self) -> u8 {
        self.roads
            .iter()
            .enumerate()
            .fold(0, |flags, (i, &road)| if road { flags | (1 << i) } else { flags })
    }

    pub fn edge_type_to(&self, other: &HexCell) -> HexEdgeType {
        metrics::edge_type(self.elevation, other.elevation)
    }

    pub fn elevation_difference(&self, other: &HexCell) -> u8 {
        self.elevation.abs_diff(other.elevation)
    }

    /// The unit standing on this cell, if any.
    pub fn unit(&self) -> Option<UnitId> {
        self.unit
    }

    #[inline]
    pub(crate) fn search_priority(&self) -> u32 {
        self.search.distance + self.search.heuristic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dir::*;

    fn cell() -> HexCell {
        HexCell::new(HexCoordinates::new(0, 0), 0, Vec3::ZERO)
    }

    #[test]
    fn test_underwater() {
        let mut cell = cell();
        assert!(!cell.is_underwater());
        cell.water_level = 1;
        assert!(cell.is_underwater());
        cell.elevation = 1;
        assert!(!cell.is_underwater());
    }

    #[test]
    fn test_river_queries() {
        let mut cell = cell();
        assert!(!cell.has_river());
        assert_eq!(cell.river_begin_or_end_direction(), None);

        cell.outgoing_river = Some(E);
        assert!(cell.has_river());
        assert!(cell.has_river_begin_or_end());
        assert_eq!(cell.river_begin_or_end_direction(), Some(E));
        assert!(cell.has_river_through_edge(E));
        assert!(!cell.has_river_through_edge(W));

        cell.incoming_river = Some(W);
        assert!(!cell.has_river_begin_or_end());
        assert!(cell.has_river_through_edge(W));
    }

    #[test]
    fn test_road_flags() {
        let mut cell = cell();
        assert_eq!(cell.road_flags(), 0);
        cell.roads[NE.index()] = true;
        cell.roads[NW.index()] = true;
        assert_eq!(cell.road_flags(), 0b100001);
        assert!(cell.has_roads());
    }

    #[test]
    fn test_position_follows_elevation() {
        let mut cell = cell();
        cell.elevation = 2;
        assert_eq!(cell.position().y, 2.0 * metrics::ELEVATION_STEP);
        assert_eq!(cell.development_level(), 0);
        cell.urban_level = 1;
        cell.plant_level = 2;
        assert_eq!(cell.development_level(), 3);
    }
}
