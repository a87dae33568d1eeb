use smallvec::{Array, SmallVec};

use crate::{
    map::{Coord, Direction, LevelMap, Tile},
    state::GameState,
};

/// The successors of one state; there are never more than four.
pub type Successors = SmallVec<[(Direction, GameState); 4]>;

/// Every state reachable from `state` with a single move, labelled with the
/// move that reaches it.
pub fn successors(state: &GameState, map: &LevelMap) -> Successors {
    let mut out = Successors::new();
    perform_moves(state, map, &mut out);
    out
}

pub fn perform_moves<const N: usize>(
    state: &GameState,
    map: &LevelMap,
    out: &mut SmallVec<[(Direction, GameState); N]>,
) where
    [(Direction, GameState); N]: Array<Item = (Direction, GameState)>,
{
    // recomputed per call, the gates depend only on where the blocks are now
    let gates_open = state.gates_open(map);

    for dir in Direction::ALL {
        if let Some(next) = try_move(state, map, dir, gates_open) {
            out.push((dir, next));
        }
    }
}

fn try_move(
    state: &GameState,
    map: &LevelMap,
    dir: Direction,
    gates_open: bool,
) -> Option<GameState> {
    let dest = map.step(state.player, dir)?;

    // the player must be able to stand on `dest` whether or not a block is
    // being pushed off it first
    if !player_can_enter(state, map, dest, gates_open) {
        return None;
    }

    let mut next = state.clone();
    if state.blocks.contains(dest) {
        let beyond = map.step(dest, dir)?;
        if !block_can_enter(state, map, beyond, gates_open) {
            return None;
        }

        next.blocks.remove(dest);
        match map[beyond] {
            Tile::Pit if !state.filled_pits.contains(beyond) => {
                next.filled_pits.insert(beyond);
            }
            // the block is lost and the void stays a void
            Tile::Void => {}
            Tile::Trap => {
                next.triggered_traps.insert(beyond);
                next.blocks.insert(beyond);
            }
            _ => {
                next.blocks.insert(beyond);
            }
        }
    }

    enter(&mut next, map, dest);
    Some(next)
}

fn player_can_enter(state: &GameState, map: &LevelMap, c: Coord, gates_open: bool) -> bool {
    match map[c] {
        Tile::Wall | Tile::Void => false,
        Tile::Gate => gates_open,
        Tile::Door => state.held_key || state.opened_doors.contains(c),
        Tile::Pit => state.filled_pits.contains(c),
        Tile::Trap => !state.triggered_traps.contains(c),
        Tile::Exit => state.collectibles.is_empty(),
        _ => true,
    }
}

fn block_can_enter(state: &GameState, map: &LevelMap, c: Coord, gates_open: bool) -> bool {
    if state.blocks.contains(c) {
        return false;
    }

    match map[c] {
        // doors never take a block, key or no key
        Tile::Wall | Tile::Door => false,
        Tile::Gate => gates_open,
        _ => true,
    }
}

// tile-entry effects for the player arriving on `c`
fn enter(next: &mut GameState, map: &LevelMap, c: Coord) {
    next.player = c;
    next.collectibles.remove(c);

    match map[c] {
        Tile::KeyItem if !next.held_key => {
            if next.keys.remove(c) {
                next.held_key = true;
            }
        }
        Tile::Door if next.held_key && !next.opened_doors.contains(c) => {
            next.opened_doors.insert(c);
            next.held_key = false;
        }
        Tile::Trap => {
            next.triggered_traps.insert(c);
        }
        Tile::Button | Tile::Lever => {
            next.activated.insert(c);
        }
        _ => {}
    }
}
