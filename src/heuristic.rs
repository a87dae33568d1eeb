//! Estimates of the moves still needed to finish a level.

use crate::{
    map::{Coord, LevelMap, Tile},
    state::GameState,
};

/// Which estimate guides the search.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Heuristic {
    /// Minimum spanning tree over the player, the remaining collectibles and
    /// the exit. Admissible, so solutions are optimal.
    #[default]
    MinimumSpanningTree,
    /// Nearest collectible plus a few fixed penalties for keys and doors.
    /// Quick, but it can overestimate, so solutions may be longer than
    /// necessary.
    Greedy,
    /// Always zero: plain uniform-cost search.
    Zero,
}

// penalties for the greedy estimate, not lower bounds
const FETCH_KEY_PENALTY: u32 = 10;
const NO_KEY_LEFT_PENALTY: u32 = 100;

impl Heuristic {
    pub fn estimate(self, state: &GameState, map: &LevelMap, exit: Coord) -> u32 {
        match self {
            Heuristic::MinimumSpanningTree => mst_cost(state, exit),
            Heuristic::Greedy => greedy_cost(state, map, exit),
            Heuristic::Zero => 0,
        }
    }
}

fn nearest(from: Coord, to: impl Iterator<Item = Coord>) -> Option<u32> {
    to.map(|c| from.manhattan(c)).min()
}

/// Weight of the minimum spanning tree over {player} ∪ collectibles ∪ {exit}
/// under Manhattan distance.
///
/// Any walk that picks up every collectible and then ends on the exit spans
/// all of these points, so it cannot be shorter than the tree. Walls and
/// mechanics are ignored, which only makes the bound looser.
pub fn mst_cost(state: &GameState, exit: Coord) -> u32 {
    if state.collectibles.is_empty() {
        return state.player.manhattan(exit);
    }

    // Prim's algorithm grown from the player, O(n^2) over a handful of points
    let mut points: Vec<Coord> = state.collectibles.iter().collect();
    points.push(exit);

    let mut dist: Vec<u32> = points.iter().map(|&p| state.player.manhattan(p)).collect();
    let mut total = 0;

    while !points.is_empty() {
        let (ix, d) = dist
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|&(_, d)| d)
            .expect("points is not empty");
        total += d;

        let joined = points.swap_remove(ix);
        dist.swap_remove(ix);
        for (p, d) in points.iter().zip(dist.iter_mut()) {
            *d = (*d).min(joined.manhattan(*p));
        }
    }

    total
}

/// The quick estimate: heads for the nearest collectible while any remain,
/// then for keys and locked doors, then for the exit. The penalty constants
/// make it inadmissible.
pub fn greedy_cost(state: &GameState, map: &LevelMap, exit: Coord) -> u32 {
    let player = state.player;

    if !state.collectibles.is_empty() {
        let to_collectible = nearest(player, state.collectibles.iter()).unwrap_or(0);
        let collectible_to_exit = nearest(exit, state.collectibles.iter()).unwrap_or(0);
        return to_collectible + collectible_to_exit;
    }

    let mut locked = map
        .find(Tile::Door)
        .filter(|&d| !state.opened_doors.contains(d))
        .peekable();
    if locked.peek().is_some() {
        if state.held_key {
            let doors: Vec<Coord> = locked.collect();
            let to_door = nearest(player, doors.iter().copied()).unwrap_or(0);
            let door_to_exit = nearest(exit, doors.iter().copied()).unwrap_or(0);
            return to_door + door_to_exit;
        }

        return match nearest(player, state.keys.iter()) {
            Some(to_key) => to_key + FETCH_KEY_PENALTY,
            None => NO_KEY_LEFT_PENALTY,
        };
    }

    player.manhattan(exit)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::level::{parse_levels, Level, LevelFormat};

    fn level(rows: &str) -> Level {
        parse_levels(rows, LevelFormat::Glyph).unwrap().remove(0)
    }

    #[test]
    fn no_collectibles_is_manhattan() {
        let l = level("@...\n....\n...E");
        assert_eq!(mst_cost(&l.initial, l.exit), 5);
        assert_eq!(Heuristic::Greedy.estimate(&l.initial, &l.map, l.exit), 5);
        assert_eq!(Heuristic::Zero.estimate(&l.initial, &l.map, l.exit), 0);
    }

    #[test]
    fn spanning_tree_over_collectibles() {
        // player (0,0), collectibles (0,2) and (2,0), exit (2,2): tree needs 3 edges of 2
        let l = level("@.*\n...\n*.E");
        assert_eq!(mst_cost(&l.initial, l.exit), 6);
    }

    #[test]
    fn matches_kruskal() {
        let l = level("@...*..\n.*.....\n....*..\n*.....E\n...*...");
        let mut points = vec![l.initial.player()];
        points.extend(l.initial.remaining_collectibles().iter());
        points.push(l.exit);

        let mut edges = Vec::new();
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                edges.push((*a, *b, a.manhattan(*b)));
            }
        }
        let expected: u32 = pathfinding::undirected::kruskal::kruskal(&edges)
            .map(|e| e.2)
            .sum();

        assert_eq!(mst_cost(&l.initial, l.exit), expected);
    }

    #[test]
    fn greedy_penalties_for_keys_and_doors() {
        let l = level("@.k\n.D.\n.E.");
        // locked door, key two steps away
        assert_eq!(greedy_cost(&l.initial, &l.map, l.exit), 2 + FETCH_KEY_PENALTY);

        let holding = GameState {
            held_key: true,
            keys: Default::default(),
            ..l.initial.clone()
        };
        // door at (1,1): 2 from the player, 1 from the exit
        assert_eq!(greedy_cost(&holding, &l.map, l.exit), 3);

        let stuck = GameState {
            keys: Default::default(),
            ..l.initial.clone()
        };
        assert_eq!(greedy_cost(&stuck, &l.map, l.exit), NO_KEY_LEFT_PENALTY);
    }

    #[test]
    fn greedy_overestimates() {
        // the door is off to the side and irrelevant, still costs a penalty
        let l = level("@E.D\n...k");
        let h = greedy_cost(&l.initial, &l.map, l.exit);
        assert!(h > 1);
        assert_eq!(mst_cost(&l.initial, l.exit), 1);
    }
}
