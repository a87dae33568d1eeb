use std::{
    fmt::{Display, Write},
    ops::Index,
};

use itertools::iproduct;

/// A cell position, `row` grows southwards.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Coord {
        Coord { row, col }
    }

    /// Saturates at `u32::MAX` on grids too large to measure in `u32`.
    pub fn manhattan(self, other: Coord) -> u32 {
        let d = self.row.abs_diff(other.row).saturating_add(self.col.abs_diff(other.col));
        u32::try_from(d).unwrap_or(u32::MAX)
    }
}

impl Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    North,
    South,
    West,
    East,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    pub const fn delta(self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
            Direction::East => (0, 1),
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::West => "west",
            Direction::East => "east",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Tile {
    Floor,
    Wall,
    Collectible,
    KeyItem,
    PlayerStart,
    Door,
    MovableBlock,
    Trap,
    Exit,
    Pit,
    Void,
    Gate,
    Button,
    Lever,
}

impl Tile {
    /// Numeric codes used by level files, in declaration order.
    pub fn from_code(code: u8) -> Option<Tile> {
        Some(match code {
            0 => Tile::Floor,
            1 => Tile::Wall,
            2 => Tile::Collectible,
            3 => Tile::KeyItem,
            4 => Tile::PlayerStart,
            5 => Tile::Door,
            6 => Tile::MovableBlock,
            7 => Tile::Trap,
            8 => Tile::Exit,
            9 => Tile::Pit,
            10 => Tile::Void,
            11 => Tile::Gate,
            12 => Tile::Button,
            13 => Tile::Lever,
            _ => return None,
        })
    }

    pub fn from_glyph(c: char) -> Option<Tile> {
        Some(match c {
            '.' | ' ' => Tile::Floor,
            '#' => Tile::Wall,
            '*' => Tile::Collectible,
            'k' => Tile::KeyItem,
            '@' => Tile::PlayerStart,
            'D' => Tile::Door,
            'o' => Tile::MovableBlock,
            '^' => Tile::Trap,
            'E' => Tile::Exit,
            'O' => Tile::Pit,
            '~' => Tile::Void,
            'G' => Tile::Gate,
            '_' => Tile::Button,
            '/' => Tile::Lever,
            _ => return None,
        })
    }

    pub fn glyph(self) -> char {
        match self {
            Tile::Floor => '.',
            Tile::Wall => '#',
            Tile::Collectible => '*',
            Tile::KeyItem => 'k',
            Tile::PlayerStart => '@',
            Tile::Door => 'D',
            Tile::MovableBlock => 'o',
            Tile::Trap => '^',
            Tile::Exit => 'E',
            Tile::Pit => 'O',
            Tile::Void => '~',
            Tile::Gate => 'G',
            Tile::Button => '_',
            Tile::Lever => '/',
        }
    }
}

/// The static tile grid. Never changes during a search; everything that can
/// change lives in [`crate::GameState`].
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct LevelMap {
    len_i: usize,
    len_j: usize,
    tiles: Vec<Tile>,
}

impl LevelMap {
    /// Builds a map from rectangular rows. Row lengths are checked by the
    /// level loader; here a short row would only misalign the grid.
    pub fn new(from: Vec<Vec<Tile>>) -> LevelMap {
        let len_i = from.len();
        let len_j = from.first().map_or(0, Vec::len);
        let tiles = from.into_iter().flatten().collect();

        let mut result = LevelMap {
            len_i,
            len_j,
            tiles,
        };
        normalize(&mut result);
        result
    }

    pub fn rows(&self) -> usize {
        self.len_i
    }

    pub fn cols(&self) -> usize {
        self.len_j
    }

    /// The neighbouring cell in `dir`, or `None` when it falls off the grid.
    pub fn step(&self, from: Coord, dir: Direction) -> Option<Coord> {
        let (di, dj) = dir.delta();
        let row = from.row.checked_add_signed(di)?;
        let col = from.col.checked_add_signed(dj)?;
        (row < self.len_i && col < self.len_j).then_some(Coord { row, col })
    }

    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        iproduct!(0..self.len_i, 0..self.len_j).map(|(row, col)| Coord { row, col })
    }

    /// All cells holding `tile`, in row-major order.
    pub fn find(&self, tile: Tile) -> impl Iterator<Item = Coord> + '_ {
        self.coords().filter(move |&c| self[c] == tile)
    }
}

// player starts and blocks are dynamic: once their positions have been
// taken into the initial state, the cells underneath are plain floor
fn normalize(m: &mut LevelMap) {
    for t in &mut m.tiles {
        if matches!(*t, Tile::PlayerStart | Tile::MovableBlock) {
            *t = Tile::Floor;
        }
    }
}

impl Index<Coord> for LevelMap {
    type Output = Tile;
    fn index(&self, index: Coord) -> &Self::Output {
        &self.tiles[index.row * self.len_j + index.col]
    }
}

impl Display for LevelMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for line in self.tiles.chunks(self.len_j.max(1)) {
            if !first {
                f.write_char('\n')?;
            } else {
                first = false;
            }

            for t in line {
                f.write_char(t.glyph())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn grid(rows: usize, cols: usize) -> LevelMap {
        LevelMap::new(vec![vec![Tile::Floor; cols]; rows])
    }

    #[test]
    fn step_stays_in_bounds() {
        let m = grid(2, 3);
        assert_eq!((m.rows(), m.cols()), (2, 3));
        let corner = Coord::new(0, 0);
        assert_eq!(m.step(corner, Direction::North), None);
        assert_eq!(m.step(corner, Direction::West), None);
        assert_eq!(m.step(corner, Direction::East), Some(Coord::new(0, 1)));
        assert_eq!(m.step(corner, Direction::South), Some(Coord::new(1, 0)));
        assert_eq!(m.step(Coord::new(1, 2), Direction::South), None);
        assert_eq!(m.step(Coord::new(1, 2), Direction::East), None);
    }

    #[test]
    fn normalize_clears_dynamic_tiles() {
        let m = LevelMap::new(vec![vec![Tile::PlayerStart, Tile::MovableBlock, Tile::Exit]]);
        assert_eq!(m[Coord::new(0, 0)], Tile::Floor);
        assert_eq!(m[Coord::new(0, 1)], Tile::Floor);
        assert_eq!(m[Coord::new(0, 2)], Tile::Exit);
        assert_eq!(m.to_string(), "..E");
    }

    #[test]
    fn codes_and_glyphs_agree() {
        for code in 0..14 {
            let tile = Tile::from_code(code).unwrap();
            assert_eq!(Tile::from_glyph(tile.glyph()), Some(tile));
        }
        assert_eq!(Tile::from_code(14), None);
        assert_eq!(Tile::from_glyph('?'), None);
    }

    #[test]
    fn manhattan_is_symmetric() {
        let a = Coord::new(4, 1);
        let b = Coord::new(1, 3);
        assert_eq!(a.manhattan(b), 5);
        assert_eq!(b.manhattan(a), 5);
        assert_eq!(a.manhattan(a), 0);

        let far = Coord::new(usize::MAX, usize::MAX);
        assert_eq!(Coord::new(0, 0).manhattan(far), u32::MAX);
    }
}
