use std::collections::HashMap;

use crate::ir::{Fixup, Room, RoomGraph};

/// Puts collapsed rooms back into the graph, deriving each one's coordinates
/// from its fixup owner and rewiring the neighbors' redirected exits.
///
/// Collapsed rooms are popped in reverse collapse order, so an owner is
/// always restored (or was never collapsed) before its dependents; each pop
/// unwinds exactly one redirection. Rooms whose owner never got coordinates
/// (failed component) are left collapsed and surface nowhere in the output.
pub fn restore_collapsed(graph: &mut RoomGraph) {
    let mut anchors: HashMap<u32, Fixup> = HashMap::new();
    let mut owners: HashMap<u32, u32> = HashMap::new();
    for room in graph.rooms.values().chain(graph.collapsed.iter()) {
        for fixup in &room.fixups {
            anchors.insert(fixup.room, *fixup);
            owners.insert(fixup.room, room.vnum);
        }
    }

    let mut leftover = Vec::new();
    while let Some(mut room) = graph.collapsed.pop() {
        let base = owners
            .get(&room.vnum)
            .and_then(|owner| graph.rooms.get(owner))
            .and_then(|owner| owner.coords);
        match (base, anchors.get(&room.vnum)) {
            (Some(base), Some(fixup)) => {
                room.coords = Some(base.step(fixup.direction, fixup.distance));
                reattach_exits(graph, &room);
                graph.rooms.insert(room.vnum, room);
            }
            _ => leftover.push(room),
        }
    }
    leftover.reverse();
    graph.collapsed = leftover;
}

/// Points the neighbors' pass-through exits back at the restored room. Each
/// neighbor has at most one exit in the matching direction, rewired during
/// collapse; its target and distance revert to the restored room's own
/// reciprocal exit.
fn reattach_exits(graph: &mut RoomGraph, room: &Room) {
    for exit in &room.exits {
        if exit.is_loop {
            continue;
        }
        if let Some(neighbor) = graph.rooms.get_mut(&exit.to) {
            if let Some(ret) = neighbor
                .exits
                .iter_mut()
                .find(|ret| ret.direction == exit.direction.invert() && ret.to != room.vnum)
            {
                ret.to = room.vnum;
                ret.distance = exit.distance;
            }
        }
    }
}

/// Translates each listed group of rooms so its minimum coordinate on every
/// axis is zero. Rooms without coordinates are ignored.
pub fn normalize_origin(graph: &mut RoomGraph, groups: &[Vec<u32>]) {
    for group in groups {
        let placed: Vec<_> = group
            .iter()
            .filter_map(|vnum| graph.rooms.get(vnum).and_then(|r| r.coords))
            .collect();
        let Some(first) = placed.first() else {
            continue;
        };
        let mut min = *first;
        for c in &placed {
            min.x = min.x.min(c.x);
            min.y = min.y.min(c.y);
            min.z = min.z.min(c.z);
        }
        for vnum in group {
            if let Some(room) = graph.rooms.get_mut(vnum) {
                if let Some(c) = room.coords.as_mut() {
                    c.x -= min.x;
                    c.y -= min.y;
                    c.z -= min.z;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Coords, Direction, MazePolicy, RoomGraph, RoomRecord};

    fn record(vnum: u32, exits: &[(u8, u32)]) -> RoomRecord {
        RoomRecord {
            vnum,
            name: format!("room {vnum}"),
            description: None,
            exits: exits.to_vec(),
        }
    }

    fn place(graph: &mut RoomGraph, vnum: u32, x: i64, y: i64, z: i64) {
        graph.rooms.get_mut(&vnum).unwrap().coords = Some(Coords { x, y, z });
    }

    #[test]
    fn collapsed_room_restores_one_unit_from_anchor() {
        // 1 -n- 2 -n- 3: collapse removes 2, solver places 1 and 3
        let records = [
            record(1, &[(0, 2)]),
            record(2, &[(0, 3), (2, 1)]),
            record(3, &[(2, 2)]),
        ];
        let mut graph = RoomGraph::from_records(&records, MazePolicy::DuplicateTarget);
        assert_eq!(graph.collapse_hallways(), 1);
        place(&mut graph, 1, 0, 0, 0);
        place(&mut graph, 3, 0, 2, 0);

        restore_collapsed(&mut graph);
        assert!(graph.collapsed.is_empty());
        let restored = graph.rooms.get(&2).unwrap();
        assert_eq!(restored.coords, Some(Coords { x: 0, y: 1, z: 0 }));
        // neighbors point at 2 again with unit distances
        let e = graph.rooms.get(&1).unwrap().exits[0];
        assert_eq!((e.to, e.distance), (2, 1));
        let e = graph.rooms.get(&3).unwrap().exits[0];
        assert_eq!((e.to, e.distance), (2, 1));
    }

    #[test]
    fn chained_collapse_restores_transitively() {
        let records = [
            record(1, &[(0, 2)]),
            record(2, &[(0, 3), (2, 1)]),
            record(3, &[(0, 4), (2, 2)]),
            record(4, &[(2, 3)]),
        ];
        let mut graph = RoomGraph::from_records(&records, MazePolicy::DuplicateTarget);
        assert_eq!(graph.collapse_hallways(), 2);
        place(&mut graph, 1, 0, 0, 0);
        place(&mut graph, 4, 0, 3, 0);

        restore_collapsed(&mut graph);
        assert_eq!(graph.rooms.len(), 4);
        assert_eq!(
            graph.rooms.get(&2).unwrap().coords,
            Some(Coords { x: 0, y: 1, z: 0 })
        );
        assert_eq!(
            graph.rooms.get(&3).unwrap().coords,
            Some(Coords { x: 0, y: 2, z: 0 })
        );
        // full chain of unit exits is back
        for (from, to) in [(1, 2), (2, 3), (3, 4)] {
            let room = graph.rooms.get(&from).unwrap();
            assert!(
                room.exits.iter().any(|e| e.to == to && e.distance == 1),
                "missing exit {from} -> {to}"
            );
        }
    }

    #[test]
    fn unsolved_owner_leaves_room_collapsed() {
        let records = [
            record(1, &[(0, 2)]),
            record(2, &[(0, 3), (2, 1)]),
            record(3, &[(2, 2)]),
        ];
        let mut graph = RoomGraph::from_records(&records, MazePolicy::DuplicateTarget);
        graph.collapse_hallways();
        // no coordinates assigned: component failed
        restore_collapsed(&mut graph);
        assert_eq!(graph.collapsed.len(), 1);
        assert!(!graph.rooms.contains_key(&2));
    }

    #[test]
    fn normalize_shifts_min_to_zero_per_group() {
        let records = [record(1, &[]), record(2, &[]), record(9, &[])];
        let mut graph = RoomGraph::from_records(&records, MazePolicy::DuplicateTarget);
        place(&mut graph, 1, -2, 5, 1);
        place(&mut graph, 2, 0, 7, 1);
        place(&mut graph, 9, 4, -4, -4);

        normalize_origin(&mut graph, &[vec![1, 2], vec![9]]);
        assert_eq!(
            graph.rooms.get(&1).unwrap().coords,
            Some(Coords { x: 0, y: 0, z: 0 })
        );
        assert_eq!(
            graph.rooms.get(&2).unwrap().coords,
            Some(Coords { x: 2, y: 2, z: 0 })
        );
        assert_eq!(
            graph.rooms.get(&9).unwrap().coords,
            Some(Coords { x: 0, y: 0, z: 0 })
        );
    }
}
