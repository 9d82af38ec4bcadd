//! Turn-budgeted search over the cells of a [`crate::grid::HexGrid`].
//!
//! The search is an A* over the bucket queue, keyed by distance plus hex distance
//! to the target. Movement is spent in turns of `speed` points: a step that would
//! cross into the next turn forfeits whatever was left of the current one.
use bevy::log;
use ndarray::Array2;

use crate::{
    cell::HexCell,
    cell_dim,
    dir::HexDirection,
    macros::timed,
    metrics::HexEdgeType,
    path::{HexPath, PathStep},
    queue::HexCellPriorityQueue,
    CellIndex, MovementCost,
};

/// Cost of following a road across an edge.
pub const ROAD_COST: MovementCost = 1;
/// Cost of crossing a flat edge without a road.
pub const FLAT_COST: MovementCost = 5;
/// Cost of crossing a slope edge without a road.
pub const SLOPE_COST: MovementCost = 10;
/// Extra cost of entering a cell with a river.
pub const RIVER_PENALTY: MovementCost = 15;

/// Cost of moving from `current` into its neighbor `neighbor` through `direction`,
/// or `None` if the move isn't allowed.
pub fn move_cost(current: &HexCell, neighbor: &HexCell, direction: HexDirection) -> Option<MovementCost> {
    if neighbor.is_underwater() || neighbor.unit().is_some() {
        return None;
    }

    let edge_type = current.edge_type_to(neighbor);
    if edge_type == HexEdgeType::Cliff {
        return None;
    }

    if current.has_road_through_edge(direction) {
        return Some(ROAD_COST);
    }

    // Walls only open up where a road passes through them.
    if current.walled() != neighbor.walled() {
        return None;
    }

    let mut cost = if edge_type == HexEdgeType::Flat {
        FLAT_COST
    } else {
        SLOPE_COST
    };
    cost += neighbor.development_level();
    if neighbor.has_river() {
        cost += RIVER_PENALTY;
    }
    Some(cost)
}

/// Zero-based turn in which a cell at `distance` is reached. The source (distance 0) is turn 0.
#[inline]
pub fn turn_of(distance: MovementCost, speed: MovementCost) -> u32 {
    distance.saturating_sub(1) / speed
}

/// A cell reached by [`crate::grid::HexGrid::movement_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reachable {
    pub cell: CellIndex,
    pub distance: MovementCost,
    pub turn: u32,
}

/// Search context shared by every search on a grid.
///
/// Cells remember the phase in which their search data was written. Each search
/// claims two phases, `phase` for cells on the frontier and `phase + 1` for cells
/// that have been expanded, so data left by earlier searches is recognized as
/// stale without touching every cell.
#[derive(Debug, Clone)]
pub(crate) struct PathSearch {
    phase: u32,
    frontier: HexCellPriorityQueue,
}

impl PathSearch {
    pub(crate) fn new() -> Self {
        PathSearch {
            phase: 0,
            frontier: HexCellPriorityQueue::new(),
        }
    }

    /// Current search phase. Bumped by every search.
    pub(crate) fn phase(&self) -> u32 {
        self.phase
    }

    fn begin(&mut self, cells: &mut Array2<HexCell>) -> u32 {
        if self.phase >= u32::MAX - 2 {
            for cell in cells.iter_mut() {
                cell.search.phase = 0;
            }
            self.phase = 0;
        }
        self.phase += 2;
        self.frontier.clear();
        self.phase
    }

    /// Finds the path from `from` to `to` that arrives in the fewest turns.
    pub(crate) fn find_path(
        &mut self,
        cells: &mut Array2<HexCell>,
        from: CellIndex,
        to: CellIndex,
        speed: MovementCost,
    ) -> Option<HexPath> {
        let found = timed!("Turn-budgeted search", {
            self.search(cells, from, Some(to), speed, |_| false)
        });

        if found.is_none() {
            log::debug!("No path from cell {} to cell {}", from, to);
            return None;
        }

        let width = cells.ncols();
        let mut steps = Vec::new();
        let mut current = Some(to);
        while let Some(index) = current {
            let cell = &cells[cell_dim(index, width)];
            steps.push(PathStep {
                cell: index,
                coordinates: cell.coordinates(),
                distance: cell.search.distance,
            });
            current = cell.search.path_from;
        }
        steps.reverse();

        Some(HexPath::new(steps, speed))
    }

    /// Every cell reachable from `from` within `max_turns` turns, in the order it was settled.
    pub(crate) fn movement_range(
        &mut self,
        cells: &mut Array2<HexCell>,
        from: CellIndex,
        speed: MovementCost,
        max_turns: u32,
    ) -> Vec<Reachable> {
        let mut reached = Vec::new();
        self.search(cells, from, None, speed, |settled| {
            if settled.turn >= max_turns && settled.cell != from {
                return true;
            }
            reached.push(settled);
            false
        });
        reached
    }

    /// Runs the search loop. `settle` sees every expanded cell and may stop the
    /// search by returning `true`. Returns the target once it is expanded.
    fn search<F>(
        &mut self,
        cells: &mut Array2<HexCell>,
        from: CellIndex,
        target: Option<CellIndex>,
        speed: MovementCost,
        mut settle: F,
    ) -> Option<CellIndex>
    where
        F: FnMut(Reachable) -> bool,
    {
        debug_assert!(speed > 0, "speed must be positive");

        let phase = self.begin(cells);
        let width = cells.ncols();
        let target_coordinates = target.map(|index| cells[cell_dim(index, width)].coordinates());

        {
            let source = &mut cells[cell_dim(from, width)];
            let heuristic = target_coordinates
                .map_or(0, |coordinates| source.coordinates().distance_to(coordinates));
            source.search.phase = phase;
            source.search.distance = 0;
            source.search.path_from = None;
            source.search.heuristic = heuristic;
        }
        self.frontier.enqueue(cells, from);

        let mut expanded = 0usize;
        while let Some(current) = self.frontier.dequeue(cells) {
            let current_dim = cell_dim(current, width);
            cells[current_dim].search.phase += 1;
            expanded += 1;

            let current_distance = cells[current_dim].search.distance;
            let current_turn = turn_of(current_distance, speed);

            if settle(Reachable {
                cell: current,
                distance: current_distance,
                turn: current_turn,
            }) {
                break;
            }

            if Some(current) == target {
                log::debug!(
                    "Reached cell {} after expanding {} cells, {} left in the frontier",
                    current,
                    expanded,
                    self.frontier.len()
                );
                return Some(current);
            }

            for direction in HexDirection::ALL {
                let Some(neighbor) = cells[current_dim].neighbor(direction) else {
                    continue;
                };
                let neighbor_dim = cell_dim(neighbor, width);
                if cells[neighbor_dim].search.phase > phase {
                    continue;
                }

                let Some(cost) = move_cost(&cells[current_dim], &cells[neighbor_dim], direction) else {
                    continue;
                };

                let mut distance = current_distance + cost;
                let turn = turn_of(distance, speed);
                if turn > current_turn {
                    distance = turn * speed + cost;
                }

                let neighbor_cell = &mut cells[neighbor_dim];
                if neighbor_cell.search.phase < phase {
                    let heuristic = target_coordinates
                        .map_or(0, |coordinates| neighbor_cell.coordinates().distance_to(coordinates));
                    neighbor_cell.search.phase = phase;
                    neighbor_cell.search.distance = distance;
                    neighbor_cell.search.path_from = Some(current);
                    neighbor_cell.search.heuristic = heuristic;
                    self.frontier.enqueue(cells, neighbor);
                } else if distance < neighbor_cell.search.distance {
                    let old_priority = neighbor_cell.search_priority() as usize;
                    neighbor_cell.search.distance = distance;
                    neighbor_cell.search.path_from = Some(current);
                    self.frontier.change(cells, neighbor, old_priority);
                }
            }
        }

        if self.frontier.is_empty() {
            log::debug!("Search from cell {} exhausted after expanding {} cells", from, expanded);
        } else {
            log::debug!("Search from cell {} stopped after expanding {} cells", from, expanded);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::HexCoordinates;
    use bevy::math::Vec3;

    fn cell() -> HexCell {
        HexCell::new(HexCoordinates::new(0, 0), 0, Vec3::ZERO)
    }

    #[test]
    fn test_move_cost_by_edge_type() {
        let current = cell();
        let mut neighbor = cell();
        assert_eq!(move_cost(&current, &neighbor, HexDirection::E), Some(FLAT_COST));

        neighbor.elevation = 1;
        assert_eq!(move_cost(&current, &neighbor, HexDirection::E), Some(SLOPE_COST));

        neighbor.elevation = 2;
        assert_eq!(move_cost(&current, &neighbor, HexDirection::E), None);
    }

    #[test]
    fn test_move_cost_road_beats_terrain() {
        let mut current = cell();
        let mut neighbor = cell();
        neighbor.elevation = 1;
        neighbor.farm_level = 3;
        current.roads[HexDirection::E.index()] = true;
        assert_eq!(move_cost(&current, &neighbor, HexDirection::E), Some(ROAD_COST));
        assert_eq!(move_cost(&current, &neighbor, HexDirection::W), Some(SLOPE_COST + 3));
    }

    #[test]
    fn test_move_cost_walls_and_rivers() {
        let mut current = cell();
        let mut neighbor = cell();
        current.walled = true;
        assert_eq!(move_cost(&current, &neighbor, HexDirection::E), None);

        neighbor.walled = true;
        assert_eq!(move_cost(&current, &neighbor, HexDirection::E), Some(FLAT_COST));

        neighbor.incoming_river = Some(HexDirection::W);
        assert_eq!(
            move_cost(&current, &neighbor, HexDirection::E),
            Some(FLAT_COST + RIVER_PENALTY)
        );

        current.roads[HexDirection::E.index()] = true;
        neighbor.walled = false;
        assert_eq!(move_cost(&current, &neighbor, HexDirection::E), Some(ROAD_COST));
    }

    #[test]
    fn test_move_cost_blocked_cells() {
        let current = cell();
        let mut neighbor = cell();
        neighbor.water_level = 1;
        assert_eq!(move_cost(&current, &neighbor, HexDirection::E), None);

        neighbor.water_level = 0;
        neighbor.unit = Some(0);
        assert_eq!(move_cost(&current, &neighbor, HexDirection::E), None);
    }

    #[test]
    fn test_phase_wraps_before_overflow() {
        use crate::grid::{GridSettingsBuilder, HexGrid};

        let mut grid = HexGrid::new(&GridSettingsBuilder::new(5, 5).build()).unwrap();
        let expected = grid.find_path(0, 24, 24).unwrap();

        let mut search = PathSearch::new();
        search.phase = u32::MAX - 4;
        let high = search.find_path(&mut grid.cells, 0, 24, 24).unwrap();
        assert_eq!(search.phase(), u32::MAX - 2);
        assert_eq!(high, expected);
        assert!(grid.cells.iter().any(|cell| cell.search.phase == u32::MAX - 1));

        // Stale phases near the limit would read as finalized without the reset.
        let wrapped = search.find_path(&mut grid.cells, 0, 24, 24).unwrap();
        assert_eq!(search.phase(), 2);
        assert_eq!(wrapped, expected);
        assert!(grid.cells.iter().all(|cell| cell.search.phase <= 3));

        let back = search.find_path(&mut grid.cells, 24, 0, 24).unwrap();
        assert_eq!(back.distance(), 34);
    }

    #[test]
    fn test_turn_of() {
        assert_eq!(turn_of(0, 24), 0);
        assert_eq!(turn_of(1, 24), 0);
        assert_eq!(turn_of(24, 24), 0);
        assert_eq!(turn_of(25, 24), 1);
        assert_eq!(turn_of(48, 24), 1);
    }
}
