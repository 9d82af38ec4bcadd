//! This module defines the `HexPath` component, the result of a turn-budgeted search.
use bevy::prelude::Component;

use crate::{coords::HexCoordinates, CellIndex, MovementCost};

/// One cell along a [`HexPath`] with the movement cost accumulated to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathStep {
    pub cell: CellIndex,
    pub coordinates: HexCoordinates,
    pub distance: MovementCost,
}

/// Ordered cells from the search source to its target, both inclusive.
///
/// Distances include the movement forfeited at turn boundaries, so
/// `(distance - 1) / speed` is the turn in which a step is reached.
///
/// If using [`crate::plugin::HexRoutePlugin`] this is inserted as a component on the
/// unit entity once it has been routed to its goal.
#[derive(Debug, Clone, Component)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HexPath {
    steps: Vec<PathStep>,
    speed: MovementCost,
}

impl HexPath {
    pub(crate) fn new(steps: Vec<PathStep>, speed: MovementCost) -> Self {
        HexPath { steps, speed }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Cell indices along the path.
    pub fn cells(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.steps.iter().map(|step| step.cell)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathStep> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn first(&self) -> Option<&PathStep> {
        self.steps.first()
    }

    pub fn last(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    /// Movement budget per turn used for the search.
    pub fn speed(&self) -> MovementCost {
        self.speed
    }

    /// Total movement cost to the target, turn boundary forfeits included.
    pub fn distance(&self) -> MovementCost {
        self.steps.last().map_or(0, |step| step.distance)
    }

    /// Number of turns needed to reach the target.
    pub fn turns(&self) -> u32 {
        match self.distance() {
            0 => 0,
            distance => (distance - 1) / self.speed + 1,
        }
    }

    /// Zero-based turn index of every step after the source, the label shown per cell.
    pub fn turn_labels(&self) -> impl Iterator<Item = (CellIndex, u32)> + '_ {
        let speed = self.speed;
        self.steps
            .iter()
            .skip(1)
            .map(move |step| (step.cell, step.distance.saturating_sub(1) / speed))
    }

    pub fn contains(&self, cell: CellIndex) -> bool {
        self.steps.iter().any(|step| step.cell == cell)
    }
}

impl PartialEq for HexPath {
    fn eq(&self, other: &Self) -> bool {
        self.steps == other.steps
    }
}

impl Eq for HexPath {}

impl IntoIterator for HexPath {
    type Item = PathStep;
    type IntoIter = std::vec::IntoIter<PathStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

impl<'a> IntoIterator for &'a HexPath {
    type Item = &'a PathStep;
    type IntoIter = std::slice::Iter<'a, PathStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(distances: &[u32], speed: u32) -> HexPath {
        let steps = distances
            .iter()
            .enumerate()
            .map(|(i, &distance)| PathStep {
                cell: i,
                coordinates: HexCoordinates::from_offset(i as i32, 0),
                distance,
            })
            .collect();
        HexPath::new(steps, speed)
    }

    #[test]
    fn test_single_cell_path_takes_no_turns() {
        let path = path(&[0], 24);
        assert_eq!(path.len(), 1);
        assert_eq!(path.distance(), 0);
        assert_eq!(path.turns(), 0);
        assert_eq!(path.turn_labels().count(), 0);
    }

    #[test]
    fn test_turns_and_labels() {
        let path = path(&[0, 5, 10, 15, 20, 29, 34], 24);
        assert_eq!(path.distance(), 34);
        assert_eq!(path.turns(), 2);

        let labels: Vec<u32> = path.turn_labels().map(|(_, turn)| turn).collect();
        assert_eq!(labels, vec![0, 0, 0, 0, 1, 1]);
        assert!(path.contains(3));
        assert!(!path.contains(7));
    }

    #[test]
    fn test_exact_turn_budget() {
        let exact = path(&[0, 12, 24], 24);
        assert_eq!(exact.turns(), 1);
        let over = path(&[0, 12, 24, 25], 24);
        assert_eq!(over.turns(), 2);
    }
}
