use std::{cmp::Ordering, collections::BinaryHeap};

use log::{debug, trace};
use pathfinding::directed::bfs::bfs_reach;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::{
    heuristic::Heuristic,
    map::{Coord, Direction, LevelMap, Tile},
    rules::perform_moves,
    state::GameState,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SolverConfig {
    pub heuristic: Heuristic,
    /// Give up after expanding this many states.
    pub max_expansions: Option<usize>,
    /// Reject levels whose collectibles or exit cannot be reached even with
    /// every door, gate and pit assumed passable.
    pub precheck: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            heuristic: Heuristic::default(),
            max_expansions: None,
            precheck: true,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Solved(Vec<Direction>),
    /// Every reachable state was tried.
    Unsolvable,
    /// The expansion budget ran out first; the level may still be solvable.
    BudgetExhausted,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SearchStats {
    pub expanded: usize,
    pub generated: usize,
    /// Frontier entries skipped because their state was reached more cheaply later.
    pub stale: usize,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchReport {
    pub outcome: Outcome,
    pub stats: SearchStats,
}

impl SearchReport {
    pub fn into_solution(self) -> Option<Vec<Direction>> {
        match self.outcome {
            Outcome::Solved(path) => Some(path),
            Outcome::Unsolvable | Outcome::BudgetExhausted => None,
        }
    }
}

// frontier entry, ordered so that BinaryHeap pops the smallest (f, g, seq)
struct Entry {
    f: u32,
    g: u32,
    seq: u64,
    state: GameState,
}

impl Entry {
    fn key(&self) -> (u32, u32, u64) {
        (self.f, self.g, self.seq)
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest sequence of moves that collects everything and ends on `exit`,
/// or `None` if the level cannot be finished.
pub fn solve(map: &LevelMap, initial: &GameState, exit: Coord) -> Option<Vec<Direction>> {
    Solver::default().search(map, initial, exit).into_solution()
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Solver {
        Solver { config }
    }

    /// A* from `initial`. Each move costs one; states are told apart by
    /// their full contents.
    pub fn search(&self, map: &LevelMap, initial: &GameState, exit: Coord) -> SearchReport {
        let mut stats = SearchStats::default();
        let report = |outcome: Outcome, stats: SearchStats| SearchReport { outcome, stats };

        if self.config.precheck && !may_be_solvable(map, initial, exit) {
            debug!("collectibles or exit out of reach, not searching");
            return report(Outcome::Unsolvable, stats);
        }

        let heuristic = self.config.heuristic;
        debug!(
            "searching from {} to {} with {:?}, {} collectibles",
            initial.player(),
            exit,
            heuristic,
            initial.remaining_collectibles().len()
        );

        let mut frontier = BinaryHeap::new();
        let mut best_g: FxHashMap<GameState, u32> = FxHashMap::default();
        let mut came_from: FxHashMap<GameState, (GameState, Direction)> = FxHashMap::default();
        let mut seq: u64 = 0;

        best_g.insert(initial.clone(), 0);
        frontier.push(Entry {
            f: heuristic.estimate(initial, map, exit),
            g: 0,
            seq,
            state: initial.clone(),
        });

        let mut buffer = SmallVec::<[(Direction, GameState); 4]>::new();
        while let Some(Entry { g, state, .. }) = frontier.pop() {
            if best_g.get(&state).map_or(false, |&best| g > best) {
                stats.stale += 1;
                continue;
            }

            if state.is_goal(exit) {
                let path = backtrack_path(&came_from, &state);
                debug!("solved in {} moves, {:?}", path.len(), stats);
                return report(Outcome::Solved(path), stats);
            }

            if let Some(limit) = self.config.max_expansions {
                if stats.expanded >= limit {
                    debug!("budget of {} expansions used up, {:?}", limit, stats);
                    return report(Outcome::BudgetExhausted, stats);
                }
            }

            stats.expanded += 1;
            trace!("expanding {} at g={}", state.player(), g);

            buffer.clear();
            perform_moves(&state, map, &mut buffer);
            stats.generated += buffer.len();

            let next_g = g + 1;
            for (dir, next) in buffer.drain(..) {
                if best_g.get(&next).map_or(false, |&best| best <= next_g) {
                    continue;
                }

                best_g.insert(next.clone(), next_g);
                came_from.insert(next.clone(), (state.clone(), dir));
                seq += 1;
                frontier.push(Entry {
                    f: next_g + heuristic.estimate(&next, map, exit),
                    g: next_g,
                    seq,
                    state: next,
                });
            }
        }

        debug!("no solution, {:?}", stats);
        report(Outcome::Unsolvable, stats)
    }
}

fn backtrack_path(
    came_from: &FxHashMap<GameState, (GameState, Direction)>,
    goal: &GameState,
) -> Vec<Direction> {
    let mut actions = Vec::new();
    let mut current = goal;
    // the initial state is the only one without a predecessor
    while let Some((prev, dir)) = came_from.get(current) {
        actions.push(*dir);
        current = prev;
    }
    actions.reverse();
    actions
}

/// Flood fill over everything that could ever be walked on. Anything outside
/// the filled region can never be reached, whatever happens to blocks, doors
/// and gates.
pub fn may_be_solvable(map: &LevelMap, state: &GameState, exit: Coord) -> bool {
    let reachable: FxHashSet<Coord> = bfs_reach(state.player(), move |&c| {
        Direction::ALL
            .into_iter()
            .filter_map(move |d| map.step(c, d))
            .filter(move |&n| !matches!(map[n], Tile::Wall | Tile::Void))
    })
    .collect();

    reachable.contains(&exit)
        && state
            .remaining_collectibles()
            .iter()
            .all(|c| reachable.contains(&c))
}

#[cfg(test)]
mod test {
    use pathfinding::directed::bfs::bfs;

    use super::*;
    use crate::{
        level::{parse_levels, Level, LevelFormat},
        rules::successors,
        state::CoordSet,
    };

    fn level(rows: &str) -> Level {
        parse_levels(rows, LevelFormat::Glyph).unwrap().remove(0)
    }

    fn run(l: &Level, heuristic: Heuristic) -> SearchReport {
        let config = SolverConfig {
            heuristic,
            ..SolverConfig::default()
        };
        Solver::new(config).search(&l.map, &l.initial, l.exit)
    }

    // replays `path` and checks every move is legal and the last state wins
    fn check_path(l: &Level, path: &[Direction]) {
        let mut current = l.initial.clone();
        for &m in path {
            current = successors(&current, &l.map)
                .into_iter()
                .find(|(d, _)| *d == m)
                .map(|(_, s)| s)
                .unwrap_or_else(|| panic!("{} not legal from {}", m, current.player()));
        }
        assert!(current.is_goal(l.exit));
    }

    fn shortest_by_bfs(l: &Level) -> Option<usize> {
        bfs(
            &l.initial,
            |s| successors(s, &l.map).into_iter().map(|(_, n)| n),
            |s| s.is_goal(l.exit),
        )
        .map(|states| states.len() - 1)
    }

    const LEVELS: &[&str] = &[
        "@.*\n...\n..E",
        "@.*\n.#.\n*.E",
        "@o.O.E\n......",
        "@.#E\nk.D.\n*.#.",
        ".o_.\n@G##\n#E..",
        "@^.*\n.^..\n*..E",
        ".....\n.o.*.\n@.#..\n..O#E",
        "*.o..\n.#.#.\n@...E\n.k.D*",
    ];

    #[test]
    fn three_by_three() {
        let l = level("@.*\n...\n..E");
        let path = solve(&l.map, &l.initial, l.exit).unwrap();
        assert_eq!(path.len(), 4);
        check_path(&l, &path);
    }

    #[test]
    fn open_path_is_manhattan() {
        let l = level("@....\n.....\n.....\n....E");
        let path = solve(&l.map, &l.initial, l.exit).unwrap();
        assert_eq!(path.len(), 7);
        check_path(&l, &path);
    }

    #[test]
    fn already_on_goal() {
        let l = level("@E");
        let start = GameState::new(l.exit, CoordSet::new(), CoordSet::new(), CoordSet::new());
        assert_eq!(solve(&l.map, &start, l.exit), Some(vec![]));
    }

    #[test]
    fn walled_off_collectible() {
        let l = level("@...\n.###\n.#*#\n.###\n...E");
        assert_eq!(solve(&l.map, &l.initial, l.exit), None);

        let report = run(&l, Heuristic::default());
        assert_eq!(report.outcome, Outcome::Unsolvable);
        assert_eq!(report.stats.expanded, 0);

        // the full search agrees with the precheck
        let config = SolverConfig {
            precheck: false,
            ..SolverConfig::default()
        };
        let report = Solver::new(config).search(&l.map, &l.initial, l.exit);
        assert_eq!(report.outcome, Outcome::Unsolvable);
        assert!(report.stats.expanded > 0);
    }

    #[test]
    fn precheck_sees_through_doors_and_pits() {
        let l = level("@D*\nOG.\n.~E");
        assert!(may_be_solvable(&l.map, &l.initial, l.exit));

        let sealed = level("@#*\n#~.\n..E");
        assert!(!may_be_solvable(&sealed.map, &sealed.initial, sealed.exit));
    }

    #[test]
    fn matches_breadth_first_search() {
        for rows in LEVELS {
            let l = level(rows);
            let expected = shortest_by_bfs(&l);
            assert!(expected.is_some(), "{}", rows);

            for heuristic in [Heuristic::MinimumSpanningTree, Heuristic::Zero] {
                let path = run(&l, heuristic).into_solution();
                assert_eq!(path.as_ref().map(Vec::len), expected, "{} {:?}", rows, heuristic);
                check_path(&l, &path.unwrap());
            }

            let h0 = Heuristic::MinimumSpanningTree.estimate(&l.initial, &l.map, l.exit);
            assert!(h0 as usize <= expected.unwrap(), "{}", rows);
        }
    }

    #[test]
    fn greedy_finds_a_valid_path() {
        for rows in LEVELS {
            let l = level(rows);
            let path = run(&l, Heuristic::Greedy).into_solution().unwrap();
            assert!(path.len() >= shortest_by_bfs(&l).unwrap());
            check_path(&l, &path);
        }
    }

    #[test]
    fn key_and_door() {
        let l = level("@.#E\nk.D.\n*.#.");
        let path = solve(&l.map, &l.initial, l.exit).unwrap();
        assert_eq!(path.len(), 7);
    }

    #[test]
    fn pit_and_door_on_the_way() {
        let l = level("##########\n#@..o.O.k#\n#.*..#####\n#....D..E#\n##########");
        let path = solve(&l.map, &l.initial, l.exit).unwrap();
        check_path(&l, &path);

        let mut current = l.initial.clone();
        for &m in &path {
            current = successors(&current, &l.map)
                .into_iter()
                .find(|(d, _)| *d == m)
                .map(|(_, s)| s)
                .unwrap();
        }
        assert!(current.filled_pits().contains(Coord::new(1, 6)));
        assert!(current.opened_doors().contains(Coord::new(3, 5)));
    }

    #[test]
    fn pit_must_be_filled() {
        let l = level("@oO.E");
        let path = solve(&l.map, &l.initial, l.exit).unwrap();
        assert_eq!(path, vec![Direction::East; 4]);
    }

    #[test]
    fn lost_block_is_gone_for_good() {
        // once its only block is gone the pit can never be crossed
        let l = level("@oO.E\n.~...");
        assert!(solve(&l.map, &l.initial, l.exit).is_some());

        let without_block = GameState::new(
            l.initial.player(),
            l.initial.remaining_collectibles().clone(),
            CoordSet::new(),
            l.initial.remaining_keys().clone(),
        );
        assert_eq!(solve(&l.map, &without_block, l.exit), None);
    }

    #[test]
    fn budget_is_not_unsolvable() {
        let l = level(LEVELS[6]);
        let config = SolverConfig {
            max_expansions: Some(2),
            ..SolverConfig::default()
        };
        let report = Solver::new(config).search(&l.map, &l.initial, l.exit);
        assert_eq!(report.outcome, Outcome::BudgetExhausted);
        assert_eq!(report.stats.expanded, 2);
        assert_eq!(report.into_solution(), None);
    }

    #[test]
    fn monotonic_along_every_edge() {
        for rows in LEVELS {
            let l = level(rows);
            let reachable: Vec<GameState> = bfs_reach(l.initial.clone(), |s| {
                successors(s, &l.map).into_iter().map(|(_, n)| n)
            })
            .collect();

            for s in &reachable {
                for (_, n) in successors(s, &l.map) {
                    assert!(s.filled_pits().is_subset(n.filled_pits()));
                    assert!(s.triggered_traps().is_subset(n.triggered_traps()));
                    assert!(s.opened_doors().is_subset(n.opened_doors()));
                    assert!(s.activated_mechanisms().is_subset(n.activated_mechanisms()));
                    assert!(n.remaining_collectibles().is_subset(s.remaining_collectibles()));
                    assert!(n.remaining_keys().is_subset(s.remaining_keys()));
                    assert!(!s.triggered_traps().contains(n.player()));
                }
            }
        }
    }
}
