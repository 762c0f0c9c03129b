use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The six canonical exit directions, in ROM door order (D0..D5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    pub fn from_door(door: u8) -> Option<Self> {
        match door {
            0 => Some(Self::North),
            1 => Some(Self::East),
            2 => Some(Self::South),
            3 => Some(Self::West),
            4 => Some(Self::Up),
            5 => Some(Self::Down),
            _ => None,
        }
    }

    pub fn invert(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// Unit grid offset: north is +y, east is +x, up is +z.
    pub fn offset(self) -> (i64, i64, i64) {
        match self {
            Self::North => (0, 1, 0),
            Self::South => (0, -1, 0),
            Self::East => (1, 0, 0),
            Self::West => (-1, 0, 0),
            Self::Up => (0, 0, 1),
            Self::Down => (0, 0, -1),
        }
    }
}

/// Integer grid position assigned by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coords {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Coords {
    pub fn step(self, direction: Direction, distance: u32) -> Self {
        let (dx, dy, dz) = direction.offset();
        Coords {
            x: self.x + dx * distance as i64,
            y: self.y + dy * distance as i64,
            z: self.z + dz * distance as i64,
        }
    }
}

/// A directed, distance-weighted connection between two rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exit {
    pub from: u32,
    pub to: u32,
    pub direction: Direction,
    /// Grid length; 1 on input, summed when hallways collapse.
    pub distance: u32,
    pub one_way: bool,
    pub is_loop: bool,
}

impl Exit {
    /// Two exits describe the same undirected connection when they join the
    /// same unordered room pair with opposite directions.
    pub fn same_connection(&self, other: &Exit) -> bool {
        self.from == other.to && self.to == other.from && self.direction == other.direction.invert()
    }
}

/// Offset bookkeeping for a collapsed room: `room` sits `distance` grid units
/// in `direction` from the room holding this record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixup {
    pub room: u32,
    pub direction: Direction,
    pub distance: u32,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub vnum: u32,
    pub name: String,
    pub description: Option<String>,
    pub exits: Vec<Exit>,
    pub fixups: Vec<Fixup>,
    /// Placeholder synthesized for a connection leaving the input room set.
    pub dummy: bool,
    pub coords: Option<Coords>,
}

impl Room {
    fn placeholder(vnum: u32) -> Self {
        Room {
            vnum,
            name: "(out of area)".to_string(),
            description: None,
            exits: Vec::new(),
            fixups: Vec::new(),
            dummy: true,
            coords: None,
        }
    }
}

/// What the area parser must supply per room: vnum, name, description and
/// door records as `(direction 0..5, target vnum)` in parse order.
#[derive(Debug, Clone)]
pub struct RoomRecord {
    pub vnum: u32,
    pub name: String,
    pub description: Option<String>,
    pub exits: Vec<(u8, u32)>,
}

/// Policy deciding when a room's exits form a non-embeddable "maze" knot.
/// The duplicate-target heuristic is a proxy, kept swappable on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MazePolicy {
    /// More than one exit from a room to the same target marks them one-way.
    DuplicateTarget,
    Never,
}

#[derive(Debug, Clone, Default)]
pub struct RoomGraph {
    pub rooms: BTreeMap<u32, Room>,
    /// Rooms removed by hallway collapsing, in collapse order. Restoration
    /// pops from the back so redirected exits unwind in reverse.
    pub collapsed: Vec<Room>,
}

impl RoomGraph {
    /// Builds the graph from parser records. Targets outside the record set
    /// become dummy placeholder rooms, then one-way/maze/loop flags are
    /// derived for every exit.
    pub fn from_records(records: &[RoomRecord], policy: MazePolicy) -> Self {
        let mut graph = RoomGraph::default();
        for rec in records {
            graph.rooms.insert(
                rec.vnum,
                Room {
                    vnum: rec.vnum,
                    name: rec.name.clone(),
                    description: rec.description.clone(),
                    exits: Vec::new(),
                    fixups: Vec::new(),
                    dummy: false,
                    coords: None,
                },
            );
        }
        for rec in records {
            let exits: Vec<Exit> = rec
                .exits
                .iter()
                .filter_map(|&(door, to)| {
                    Direction::from_door(door).map(|direction| Exit {
                        from: rec.vnum,
                        to,
                        direction,
                        distance: 1,
                        one_way: false,
                        is_loop: to == rec.vnum,
                    })
                })
                .collect();
            for exit in &exits {
                graph
                    .rooms
                    .entry(exit.to)
                    .or_insert_with(|| Room::placeholder(exit.to));
            }
            if let Some(room) = graph.rooms.get_mut(&rec.vnum) {
                room.exits = exits;
            }
        }
        graph.derive_exit_flags(policy);
        graph
    }

    /// Recomputes `one_way` for every exit: set when the target room has no
    /// matching return exit, or when the maze policy flags the source.
    pub fn derive_exit_flags(&mut self, policy: MazePolicy) {
        let snapshot = self.rooms.clone();
        for room in self.rooms.values_mut() {
            for i in 0..room.exits.len() {
                let exit = room.exits[i];
                if exit.is_loop {
                    continue;
                }
                let reciprocal = snapshot.get(&exit.to).is_some_and(|target| {
                    target
                        .exits
                        .iter()
                        .any(|ret| ret.to == exit.from && ret.direction == exit.direction.invert())
                });
                let maze = match policy {
                    MazePolicy::DuplicateTarget => {
                        room.exits.iter().filter(|e| e.to == exit.to).count() > 1
                    }
                    MazePolicy::Never => false,
                };
                room.exits[i].one_way = !reciprocal || maze;
            }
        }
    }

    fn return_exit(&self, owner: u32, to: u32, direction: Direction) -> Option<Exit> {
        self.rooms.get(&owner).and_then(|room| {
            room.exits
                .iter()
                .find(|e| e.to == to && e.direction == direction)
                .copied()
        })
    }

    fn redirect(&mut self, owner: u32, old_to: u32, new_to: u32, direction: Direction, add: u32) {
        if let Some(room) = self.rooms.get_mut(&owner) {
            if let Some(exit) = room
                .exits
                .iter_mut()
                .find(|e| e.to == old_to && e.direction == direction)
            {
                exit.to = new_to;
                exit.distance += add;
            }
        }
    }

    /// One collapsing pass over a snapshot of the current room set.
    ///
    /// A room folds away when it has exactly two real, reciprocal, opposite,
    /// two-way exits to distinct non-dummy neighbors. Each neighbor's return
    /// exit is rewired to the far neighbor with summed distance and a fixup
    /// is appended to the first exit's target. Eligibility is checked against
    /// the live graph, so straight chains usually fold within the pass.
    pub fn collapse_hallways(&mut self) -> usize {
        let snapshot: Vec<u32> = self.rooms.keys().copied().collect();
        let mut removed = 0;
        for vnum in snapshot {
            let Some(room) = self.rooms.get(&vnum) else {
                continue;
            };
            if room.dummy || room.exits.len() != 2 {
                continue;
            }
            let e0 = room.exits[0];
            let e1 = room.exits[1];
            if e0.one_way || e1.one_way || e0.is_loop || e1.is_loop {
                continue;
            }
            if e0.direction != e1.direction.invert() || e0.to == e1.to {
                continue;
            }
            if [e0, e1]
                .iter()
                .any(|e| self.rooms.get(&e.to).map_or(true, |n| n.dummy))
            {
                continue;
            }
            let Some(ra) = self.return_exit(e0.to, vnum, e0.direction.invert()) else {
                continue;
            };
            let Some(rb) = self.return_exit(e1.to, vnum, e1.direction.invert()) else {
                continue;
            };

            self.redirect(e0.to, vnum, e1.to, ra.direction, e1.distance);
            self.redirect(e1.to, vnum, e0.to, rb.direction, e0.distance);
            let Some(collapsed) = self.rooms.remove(&vnum) else {
                continue;
            };
            if let Some(survivor) = self.rooms.get_mut(&e0.to) {
                survivor.fixups.push(Fixup {
                    room: vnum,
                    direction: ra.direction,
                    distance: ra.distance,
                });
            }
            self.collapsed.push(collapsed);
            removed += 1;
        }
        removed
    }

    /// Deduplicated undirected exit list: one entry per two-way connection,
    /// every one-way and loop exit as-is, plus a synthesized self-loop for
    /// any room no exit touches (anchors its solver variables).
    pub fn dedup_exits(&self) -> Vec<Exit> {
        let mut exits = Vec::new();
        let mut touched: BTreeSet<u32> = BTreeSet::new();
        for room in self.rooms.values() {
            for e in &room.exits {
                if !self.rooms.contains_key(&e.to) {
                    continue;
                }
                if e.is_loop || e.one_way || e.from < e.to {
                    exits.push(*e);
                    touched.insert(e.from);
                    touched.insert(e.to);
                }
            }
        }
        for room in self.rooms.values() {
            if !touched.contains(&room.vnum) {
                exits.push(Exit {
                    from: room.vnum,
                    to: room.vnum,
                    direction: Direction::North,
                    distance: 1,
                    one_way: false,
                    is_loop: true,
                });
            }
        }
        exits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(vnum: u32, exits: &[(u8, u32)]) -> RoomRecord {
        RoomRecord {
            vnum,
            name: format!("room {vnum}"),
            description: None,
            exits: exits.to_vec(),
        }
    }

    #[test]
    fn invert_is_involutive() {
        for d in Direction::ALL {
            assert_eq!(d.invert().invert(), d);
        }
        assert_eq!(Direction::North.invert(), Direction::South);
        assert_eq!(Direction::East.invert(), Direction::West);
        assert_eq!(Direction::Up.invert(), Direction::Down);
    }

    #[test]
    fn dangling_target_becomes_dummy() {
        let graph = RoomGraph::from_records(&[record(1, &[(0, 99)])], MazePolicy::DuplicateTarget);
        let dummy = graph.rooms.get(&99).unwrap();
        assert!(dummy.dummy);
        // no return exit, so the edge into the dummy is one-way
        assert!(graph.rooms.get(&1).unwrap().exits[0].one_way);
    }

    #[test]
    fn reciprocal_exits_are_two_way() {
        let graph = RoomGraph::from_records(
            &[record(1, &[(0, 2)]), record(2, &[(2, 1)])],
            MazePolicy::DuplicateTarget,
        );
        assert!(!graph.rooms.get(&1).unwrap().exits[0].one_way);
        assert!(!graph.rooms.get(&2).unwrap().exits[0].one_way);
    }

    #[test]
    fn wrong_return_direction_is_one_way() {
        // 2 answers 1's north exit with another north exit, not south
        let graph = RoomGraph::from_records(
            &[record(1, &[(0, 2)]), record(2, &[(0, 1)])],
            MazePolicy::DuplicateTarget,
        );
        assert!(graph.rooms.get(&1).unwrap().exits[0].one_way);
    }

    #[test]
    fn maze_policy_flags_duplicate_targets() {
        let records = [record(1, &[(0, 2), (1, 2)]), record(2, &[(2, 1), (3, 1)])];
        let graph = RoomGraph::from_records(&records, MazePolicy::DuplicateTarget);
        assert!(graph.rooms.get(&1).unwrap().exits.iter().all(|e| e.one_way));
        let graph = RoomGraph::from_records(&records, MazePolicy::Never);
        assert!(graph.rooms.get(&1).unwrap().exits.iter().all(|e| !e.one_way));
    }

    #[test]
    fn loop_exit_is_flagged() {
        let graph = RoomGraph::from_records(&[record(1, &[(4, 1)])], MazePolicy::DuplicateTarget);
        assert!(graph.rooms.get(&1).unwrap().exits[0].is_loop);
    }

    #[test]
    fn straight_hallway_collapses() {
        // 1 -north- 2 -north- 3, all reciprocal
        let graph_records = [
            record(1, &[(0, 2)]),
            record(2, &[(0, 3), (2, 1)]),
            record(3, &[(2, 2)]),
        ];
        let mut graph = RoomGraph::from_records(&graph_records, MazePolicy::DuplicateTarget);
        assert_eq!(graph.collapse_hallways(), 1);
        assert!(!graph.rooms.contains_key(&2));
        let e = graph.rooms.get(&1).unwrap().exits[0];
        assert_eq!((e.to, e.distance), (3, 2));
        let e = graph.rooms.get(&3).unwrap().exits[0];
        assert_eq!((e.to, e.distance), (1, 2));
        // fixup lands on the first exit's target (room 3) and points back at 2
        let fixup = graph.rooms.get(&3).unwrap().fixups[0];
        assert_eq!(fixup.room, 2);
        assert_eq!(fixup.direction, Direction::South);
        assert_eq!(fixup.distance, 1);
    }

    #[test]
    fn turn_room_is_not_collapsed() {
        // degree-2 room with north + east exits must stay
        let records = [
            record(1, &[(0, 2)]),
            record(2, &[(2, 1), (1, 3)]),
            record(3, &[(3, 2)]),
        ];
        let mut graph = RoomGraph::from_records(&records, MazePolicy::DuplicateTarget);
        assert_eq!(graph.collapse_hallways(), 0);
        assert!(graph.rooms.contains_key(&2));
    }

    #[test]
    fn one_way_hallway_is_not_collapsed() {
        let records = [
            record(1, &[(0, 2)]),
            record(2, &[(0, 3), (2, 1)]),
            record(3, &[]),
        ];
        let mut graph = RoomGraph::from_records(&records, MazePolicy::DuplicateTarget);
        assert_eq!(graph.collapse_hallways(), 0);
    }

    #[test]
    fn chain_of_two_collapsible_rooms_folds_in_one_pass() {
        // 1 -n- 2 -n- 3 -n- 4: live eligibility checks let both middles fold
        let records = [
            record(1, &[(0, 2)]),
            record(2, &[(0, 3), (2, 1)]),
            record(3, &[(0, 4), (2, 2)]),
            record(4, &[(2, 3)]),
        ];
        let mut graph = RoomGraph::from_records(&records, MazePolicy::DuplicateTarget);
        assert_eq!(graph.collapse_hallways(), 2);
        assert_eq!(graph.rooms.len(), 2);
        let e = graph.rooms.get(&1).unwrap().exits[0];
        assert_eq!((e.to, e.distance), (4, 3));
    }

    #[test]
    fn dedup_keeps_one_entry_per_connection() {
        let records = [
            record(1, &[(0, 2)]),
            record(2, &[(2, 1), (1, 3)]),
            record(3, &[(3, 2)]),
        ];
        let graph = RoomGraph::from_records(&records, MazePolicy::DuplicateTarget);
        let exits = graph.dedup_exits();
        assert_eq!(exits.len(), 2);
        assert!(exits.iter().all(|e| e.from < e.to));
    }

    #[test]
    fn isolated_room_gets_anchor_loop() {
        let graph = RoomGraph::from_records(&[record(7, &[])], MazePolicy::DuplicateTarget);
        let exits = graph.dedup_exits();
        assert_eq!(exits.len(), 1);
        assert!(exits[0].is_loop);
        assert_eq!(exits[0].from, 7);
    }
}
