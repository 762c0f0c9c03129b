mod components;
mod error;
mod restore;
mod solver;

pub use components::split_components;
pub use error::LayoutError;
pub use restore::{normalize_origin, restore_collapsed};
pub use solver::segments_overlap;

use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::LayoutConfig;
use crate::ir::{Exit, RoomGraph};
use solver::LayoutSolver;

/// A room with final non-negative grid coordinates and its restored exits.
#[derive(Debug, Clone)]
pub struct PlacedRoom {
    pub vnum: u32,
    pub name: String,
    pub dummy: bool,
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub exits: Vec<Exit>,
    pub component: usize,
}

#[derive(Debug, Clone)]
pub struct ComponentFailure {
    pub rooms: Vec<u32>,
    pub reason: String,
}

/// Solved map handed to the renderer.
#[derive(Debug, Clone)]
pub struct MapLayout {
    pub rooms: BTreeMap<u32, PlacedRoom>,
    /// Solved components, post-restore, indexed like `PlacedRoom::component`.
    pub components: Vec<Vec<u32>>,
    /// Undirected connections of the restored graph, for drawing.
    pub connections: Vec<Exit>,
    /// The deduplicated exit list the crossing checks ran against
    /// (collapsed graph, solved components only).
    pub checked_exits: Vec<Exit>,
    pub failures: Vec<ComponentFailure>,
}

/// Runs the whole pipeline: hallway collapse, component split, one solve per
/// component, restore, normalize. A component whose solve fails is logged and
/// skipped; everything else still comes back placed.
pub fn compute_layout(input: &RoomGraph, config: &LayoutConfig) -> MapLayout {
    let mut graph = input.clone();
    if config.collapse_hallways {
        let removed = graph.collapse_hallways();
        if removed > 0 {
            info!("collapsed {removed} hallway rooms");
        }
    }

    let dedup = graph.dedup_exits();
    let mut checked_exits = Vec::new();
    let mut failures = Vec::new();
    for (idx, component) in split_components(&graph).iter().enumerate() {
        let members: BTreeSet<u32> = component.iter().copied().collect();
        let exits: Vec<Exit> = dedup
            .iter()
            .filter(|e| members.contains(&e.from))
            .copied()
            .collect();
        match LayoutSolver::new(component, &exits, config.max_solve_rounds).run() {
            Ok(coords) => {
                for (vnum, c) in coords {
                    if let Some(room) = graph.rooms.get_mut(&vnum) {
                        room.coords = Some(c);
                    }
                }
                checked_exits.extend(exits);
            }
            Err(err) => {
                warn!("skipping component {idx} ({} rooms): {err}", component.len());
                failures.push(ComponentFailure {
                    rooms: component.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    restore_collapsed(&mut graph);
    let groups: Vec<Vec<u32>> = split_components(&graph)
        .into_iter()
        .filter(|group| {
            group
                .iter()
                .all(|v| graph.rooms.get(v).is_some_and(|r| r.coords.is_some()))
        })
        .collect();
    normalize_origin(&mut graph, &groups);

    let mut rooms = BTreeMap::new();
    for (idx, group) in groups.iter().enumerate() {
        for &vnum in group {
            let Some(room) = graph.rooms.get(&vnum) else {
                continue;
            };
            let Some(c) = room.coords else { continue };
            rooms.insert(
                vnum,
                PlacedRoom {
                    vnum,
                    name: room.name.clone(),
                    dummy: room.dummy,
                    x: c.x,
                    y: c.y,
                    z: c.z,
                    exits: room.exits.clone(),
                    component: idx,
                },
            );
        }
    }
    let connections: Vec<Exit> = graph
        .dedup_exits()
        .into_iter()
        .filter(|e| rooms.contains_key(&e.from) && rooms.contains_key(&e.to))
        .collect();

    MapLayout {
        rooms,
        components: groups,
        connections,
        checked_exits,
        failures,
    }
}
