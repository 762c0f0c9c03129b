use good_lp::{
    constraint, variable, Constraint, Expression, ProblemVariables, Solution, SolverModel,
    Variable,
};
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::error::LayoutError;
use crate::ir::{Coords, Direction, Exit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
}

const AXES: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

impl Axis {
    fn of(direction: Direction) -> Axis {
        match direction {
            Direction::East | Direction::West => Axis::X,
            Direction::North | Direction::South => Axis::Y,
            Direction::Up | Direction::Down => Axis::Z,
        }
    }

    fn var(self, pos: (Variable, Variable, Variable)) -> Variable {
        match self {
            Axis::X => pos.0,
            Axis::Y => pos.1,
            Axis::Z => pos.2,
        }
    }

    fn val(self, coords: Coords) -> i64 {
        match self {
            Axis::X => coords.x,
            Axis::Y => coords.y,
            Axis::Z => coords.z,
        }
    }
}

/// Increasing along its axis: north, east and up; the rest point downward.
fn points_positive(direction: Direction) -> bool {
    matches!(
        direction,
        Direction::North | Direction::East | Direction::Up
    )
}

/// Lazy-constraint loop states. Each relaxed solve is checked for exit pairs
/// that still overlap; violating pairs get their disjunctive constraints and
/// the model is solved again until a round finds nothing new.
enum SolveState {
    Relaxed,
    CheckingOverlaps(BTreeMap<u32, Coords>),
    Augmented(usize),
    Converged(BTreeMap<u32, Coords>),
    Failed(LayoutError),
}

/// Embeds one connected component on the integer grid.
///
/// Hard constraints pin every normal two-way exit to its direction; one-way
/// and maze exits only contribute soft deviation terms, so contradictory
/// one-way data cannot make the model infeasible. Non-overlap constraints are
/// added lazily, pair by pair, as solves reveal violations.
pub(crate) struct LayoutSolver<'a> {
    rooms: &'a [u32],
    exits: &'a [Exit],
    /// Non-incident, non-loop exit pairs eligible for crossing constraints.
    candidates: Vec<(usize, usize)>,
    active: BTreeSet<(usize, usize)>,
    /// Sum of all exit distances; bounds every coordinate.
    bound: f64,
    /// One more than the coordinate span, so a switched-off relation's
    /// constraint can never bite.
    big_m: f64,
    max_rounds: usize,
}

impl<'a> LayoutSolver<'a> {
    pub fn new(rooms: &'a [u32], exits: &'a [Exit], max_rounds: usize) -> Self {
        let total: u64 = exits.iter().map(|e| e.distance as u64).sum();
        let total = total.max(1);
        let mut candidates = Vec::new();
        for i in 0..exits.len() {
            if exits[i].is_loop {
                continue;
            }
            for j in i + 1..exits.len() {
                if exits[j].is_loop {
                    continue;
                }
                let (a, b) = (&exits[i], &exits[j]);
                let incident = a.from == b.from
                    || a.from == b.to
                    || a.to == b.from
                    || a.to == b.to;
                if !incident {
                    candidates.push((i, j));
                }
            }
        }
        LayoutSolver {
            rooms,
            exits,
            candidates,
            active: BTreeSet::new(),
            bound: total as f64,
            big_m: (total + 1) as f64,
            max_rounds,
        }
    }

    pub fn run(mut self) -> Result<BTreeMap<u32, Coords>, LayoutError> {
        let mut state = SolveState::Relaxed;
        let mut rounds = 0usize;
        loop {
            state = match state {
                SolveState::Relaxed => {
                    rounds += 1;
                    if rounds > self.max_rounds {
                        SolveState::Failed(LayoutError::RoundLimit(self.max_rounds))
                    } else {
                        match self.solve_relaxed() {
                            Ok(coords) => SolveState::CheckingOverlaps(coords),
                            Err(err) => SolveState::Failed(err),
                        }
                    }
                }
                SolveState::CheckingOverlaps(coords) => {
                    let violating = self.overlapping_pairs(&coords);
                    if violating.is_empty() {
                        SolveState::Converged(coords)
                    } else {
                        let added = violating.len();
                        self.active.extend(violating);
                        SolveState::Augmented(added)
                    }
                }
                SolveState::Augmented(added) => {
                    debug!(
                        "round {rounds}: {added} overlapping exit pairs, {} constrained total",
                        self.active.len()
                    );
                    SolveState::Relaxed
                }
                SolveState::Converged(coords) => return Ok(coords),
                SolveState::Failed(err) => return Err(err),
            };
        }
    }

    /// Builds and solves the model with crossing constraints only for the
    /// pairs activated so far.
    fn solve_relaxed(&self) -> Result<BTreeMap<u32, Coords>, LayoutError> {
        let mut vars = ProblemVariables::new();
        let mut objective = Expression::default();
        let mut constraints: Vec<Constraint> = Vec::new();

        let mut pos: HashMap<u32, (Variable, Variable, Variable)> = HashMap::new();
        for &vnum in self.rooms {
            let x = vars.add(variable().integer().min(0).max(self.bound));
            let y = vars.add(variable().integer().min(0).max(self.bound));
            let z = vars.add(variable().integer().min(0).max(self.bound));
            pos.insert(vnum, (x, y, z));
        }

        for exit in self.exits {
            if exit.is_loop {
                continue;
            }
            let src = pos[&exit.from];
            let dst = pos[&exit.to];
            let aligned = Axis::of(exit.direction);

            if exit.one_way {
                // Soft placement: deviation from the ideal unit offset on
                // each axis, minimized but never required to be zero.
                let (ox, oy, oz) = exit.direction.offset();
                for (axis, ideal) in AXES.into_iter().zip([ox, oy, oz]) {
                    let s = axis.var(src);
                    let t = axis.var(dst);
                    let ideal = ideal as f64;
                    let dev = vars.add(variable().min(0));
                    objective += dev;
                    constraints.push(constraint!(t - s - ideal <= dev));
                    constraints.push(constraint!(s - t + ideal <= dev));
                }
                continue;
            }

            let length = vars.add(
                variable()
                    .integer()
                    .min(exit.distance as f64)
                    .max(self.bound),
            );
            objective += length;
            for axis in AXES {
                let s = axis.var(src);
                let t = axis.var(dst);
                if axis != aligned {
                    constraints.push(constraint!(s == t));
                } else if points_positive(exit.direction) {
                    constraints.push(constraint!(s + exit.distance as f64 <= t));
                    constraints.push(constraint!(t <= s + length));
                } else {
                    constraints.push(constraint!(t + exit.distance as f64 <= s));
                    constraints.push(constraint!(s <= t + length));
                }
            }
        }

        let m = self.big_m;
        for &(i, j) in &self.active {
            let (a, b) = (&self.exits[i], &self.exits[j]);
            // One of six axis-separation relations must hold: segment a
            // strictly displaced from segment b in some direction, endpoint
            // against endpoint, by at least one grid unit.
            let mut chosen = Expression::default();
            for direction in Direction::ALL {
                let relation = vars.add(variable().binary());
                chosen += relation;
                let axis = Axis::of(direction);
                for pa in [a.from, a.to] {
                    for pb in [b.from, b.to] {
                        let va = axis.var(pos[&pa]);
                        let vb = axis.var(pos[&pb]);
                        if points_positive(direction) {
                            constraints.push(constraint!(va - vb - m * relation >= 1.0 - m));
                        } else {
                            constraints.push(constraint!(vb - va - m * relation >= 1.0 - m));
                        }
                    }
                }
            }
            constraints.push(constraint!(chosen >= 1));
        }

        let mut model = vars.minimise(objective).using(good_lp::default_solver);
        for c in constraints {
            model.add_constraint(c);
        }
        let solution = model
            .solve()
            .map_err(|err| LayoutError::SolveFailed(err.to_string()))?;

        let mut coords = BTreeMap::new();
        for (&vnum, &(x, y, z)) in &pos {
            coords.insert(
                vnum,
                Coords {
                    x: solution.value(x).round() as i64,
                    y: solution.value(y).round() as i64,
                    z: solution.value(z).round() as i64,
                },
            );
        }
        Ok(coords)
    }

    /// Candidate pairs whose axis-aligned bounding boxes overlap on all
    /// three axes under the given placement.
    fn overlapping_pairs(&self, coords: &BTreeMap<u32, Coords>) -> Vec<(usize, usize)> {
        self.candidates
            .iter()
            .filter(|pair| !self.active.contains(pair))
            .filter(|&&(i, j)| segments_overlap(&self.exits[i], &self.exits[j], coords))
            .copied()
            .collect()
    }
}

/// Axis-aligned bounding boxes of the two exit segments intersect on all
/// three axes at once. This is the practical "would draw on top of each
/// other" proxy the lazy loop checks, not exact segment intersection.
pub fn segments_overlap(a: &Exit, b: &Exit, coords: &BTreeMap<u32, Coords>) -> bool {
    let (Some(&a0), Some(&a1), Some(&b0), Some(&b1)) = (
        coords.get(&a.from),
        coords.get(&a.to),
        coords.get(&b.from),
        coords.get(&b.to),
    ) else {
        return false;
    };
    AXES.into_iter().all(|axis| {
        let (amin, amax) = ordered(axis.val(a0), axis.val(a1));
        let (bmin, bmax) = ordered(axis.val(b0), axis.val(b1));
        amin <= bmax && bmin <= amax
    })
}

fn ordered(a: i64, b: i64) -> (i64, i64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
