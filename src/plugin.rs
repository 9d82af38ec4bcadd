use bevy::{log, prelude::*};

use crate::{
    components::{Goal, HexUnitRef, PathfindingFailed, Speed},
    grid::HexGrid,
};

/// Routes units with a [`Goal`] through the [`HexGrid`] resource.
///
/// The grid must be inserted by the app, the plugin doesn't create one.
#[derive(Default)]
pub struct HexRoutePlugin;

impl Plugin for HexRoutePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, pathfind_units.in_set(HexRouteSet));
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct HexRouteSet;

/// Finds a path for every changed [`Goal`] and moves the unit along it.
///
/// On success the unit travels to its goal, the [`crate::path::HexPath`] is inserted
/// and the goal removed. Otherwise the entity is marked with [`PathfindingFailed`].
pub fn pathfind_units(
    grid: Option<ResMut<HexGrid>>,
    mut commands: Commands,
    query: Query<(Entity, &HexUnitRef, Option<&Speed>, &Goal), Changed<Goal>>,
) {
    let Some(mut grid) = grid else {
        return;
    };

    for (entity, unit, speed, goal) in query.iter() {
        let speed = speed.copied().unwrap_or_default();

        let Some(from) = grid.unit(unit.0).map(|unit| unit.location()) else {
            log::warn!("Entity {:?} refers to unknown unit {}", entity, unit.0);
            commands.entity(entity).insert(PathfindingFailed);
            continue;
        };

        let Some(to) = grid.cell_at(goal.0) else {
            log::warn!("Goal {} of entity {:?} is outside the map", goal.0, entity);
            commands.entity(entity).insert(PathfindingFailed);
            continue;
        };

        if from == to {
            commands.entity(entity).remove::<(Goal, PathfindingFailed)>();
            continue;
        }

        if !grid.is_valid_destination(to) {
            log::debug!("Goal {} of entity {:?} is not a valid destination", goal.0, entity);
            commands.entity(entity).insert(PathfindingFailed);
            continue;
        }

        log::debug!("Pathfinding for entity: {:?}", entity);

        let Some(path) = grid.find_path(from, to, speed.0) else {
            commands.entity(entity).insert(PathfindingFailed);
            continue;
        };

        if let Err(err) = grid.travel(unit.0, &path) {
            log::error!("Unit {} can't travel to {}: {}", unit.0, goal.0, err);
            commands.entity(entity).insert(PathfindingFailed);
            continue;
        }

        commands
            .entity(entity)
            .insert(path)
            .remove::<(Goal, PathfindingFailed)>();
    }
}
