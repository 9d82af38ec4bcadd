//! Components driving units through [`crate::plugin::HexRoutePlugin`].
use bevy::prelude::*;

use crate::{coords::HexCoordinates, MovementCost, UnitId};

/// Links an entity to its unit in the [`crate::grid::HexGrid`].
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexUnitRef(pub UnitId);

/// Movement points the unit can spend each turn.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Speed(pub MovementCost);

impl Default for Speed {
    fn default() -> Self {
        Speed(24)
    }
}

/// Cell the unit should travel to. Removed once the unit got there.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Goal(pub HexCoordinates);

/// Inserted when no path to the [`Goal`] could be found.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PathfindingFailed;
