use smallvec::SmallVec;

use crate::map::{Coord, LevelMap, Tile};

/// A small sorted set of coordinates.
///
/// Kept sorted and deduplicated so that two sets with the same members are
/// equal and hash the same no matter in which order they were built.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct CoordSet(SmallVec<[Coord; 8]>);

impl CoordSet {
    pub fn new() -> CoordSet {
        CoordSet::default()
    }

    pub fn contains(&self, c: Coord) -> bool {
        self.0.binary_search(&c).is_ok()
    }

    /// Returns `true` if `c` was not present.
    pub fn insert(&mut self, c: Coord) -> bool {
        match self.0.binary_search(&c) {
            Ok(_) => false,
            Err(ix) => {
                self.0.insert(ix, c);
                true
            }
        }
    }

    /// Returns `true` if `c` was present.
    pub fn remove(&mut self, c: Coord) -> bool {
        match self.0.binary_search(&c) {
            Ok(ix) => {
                self.0.remove(ix);
                true
            }
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        self.0.iter().copied()
    }

    pub fn is_subset(&self, other: &CoordSet) -> bool {
        self.iter().all(|c| other.contains(c))
    }
}

impl FromIterator<Coord> for CoordSet {
    fn from_iter<T: IntoIterator<Item = Coord>>(iter: T) -> Self {
        let mut items: SmallVec<[Coord; 8]> = iter.into_iter().collect();
        items.sort_unstable();
        items.dedup();
        CoordSet(items)
    }
}

/// Everything about a level that can change while playing it.
///
/// A `GameState` is a plain value: transitions build a new one and never
/// touch the old. Equality and hashing cover every field, which is what the
/// search uses to recognise positions it has already reached.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct GameState {
    pub(crate) player: Coord,
    pub(crate) collectibles: CoordSet,
    pub(crate) blocks: CoordSet,
    pub(crate) filled_pits: CoordSet,
    pub(crate) triggered_traps: CoordSet,
    pub(crate) keys: CoordSet,
    pub(crate) held_key: bool,
    pub(crate) opened_doors: CoordSet,
    pub(crate) activated: CoordSet,
}

impl GameState {
    /// The starting state: collectibles, keys and blocks where the map had
    /// them, nothing filled or opened and no key in hand. Callers with a text
    /// level usually get this from [`crate::Level`] instead.
    pub fn new(
        player: Coord,
        collectibles: CoordSet,
        blocks: CoordSet,
        keys: CoordSet,
    ) -> GameState {
        GameState {
            player,
            collectibles,
            blocks,
            filled_pits: CoordSet::new(),
            triggered_traps: CoordSet::new(),
            keys,
            held_key: false,
            opened_doors: CoordSet::new(),
            activated: CoordSet::new(),
        }
    }

    pub fn player(&self) -> Coord {
        self.player
    }

    pub fn remaining_collectibles(&self) -> &CoordSet {
        &self.collectibles
    }

    pub fn blocks(&self) -> &CoordSet {
        &self.blocks
    }

    pub fn filled_pits(&self) -> &CoordSet {
        &self.filled_pits
    }

    pub fn triggered_traps(&self) -> &CoordSet {
        &self.triggered_traps
    }

    /// Key items still lying on the map.
    pub fn remaining_keys(&self) -> &CoordSet {
        &self.keys
    }

    pub fn held_key(&self) -> bool {
        self.held_key
    }

    pub fn opened_doors(&self) -> &CoordSet {
        &self.opened_doors
    }

    /// Buttons and levers the player has stepped on.
    pub fn activated_mechanisms(&self) -> &CoordSet {
        &self.activated
    }

    /// Gates are open while any block rests on a button. Derived from the
    /// block positions every time, never stored.
    pub fn gates_open(&self, map: &LevelMap) -> bool {
        self.blocks.iter().any(|c| map[c] == Tile::Button)
    }

    pub fn is_goal(&self, exit: Coord) -> bool {
        self.collectibles.is_empty() && self.player == exit
    }
}
