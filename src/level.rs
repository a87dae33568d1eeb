//! Reading levels from text.
//!
//! Two layouts are understood. The numeric one has one whitespace-separated
//! tile code per cell:
//!
//! ```text
//! 1 1 1 1 1
//! 1 4 0 2 1
//! 1 0 6 8 1
//! 1 1 1 1 1
//! ```
//!
//! The glyph one has one character per cell (see [`Tile::from_glyph`]):
//!
//! ```text
//! #####
//! #@.*#
//! #.oE#
//! #####
//! ```
//!
//! A file may hold several levels separated by blank lines (in glyph files the
//! line must be truly empty, spaces are floor). In numeric files,
//! lines that are not purely numbers (titles such as `Level 3`) are skipped.

use thiserror::Error;

use crate::{
    map::{Coord, Direction, LevelMap, Tile},
    search::{SearchReport, Solver, SolverConfig},
    state::{CoordSet, GameState},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("level has no rows")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown tile {token:?} at {at}")]
    UnknownTile { at: Coord, token: String },
    #[error("level has no player start")]
    MissingPlayer,
    #[error("second player start at {second}, first at {first}")]
    DuplicatePlayer { first: Coord, second: Coord },
    #[error("level has no exit")]
    MissingExit,
    #[error("second exit at {second}, first at {first}")]
    DuplicateExit { first: Coord, second: Coord },
    #[error("level {index} requested but only {count} found")]
    NoSuchLevel { index: usize, count: usize },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LevelFormat {
    Numeric,
    Glyph,
}

impl LevelFormat {
    /// Numeric if some non-blank line has nothing but digits and whitespace.
    pub fn detect(text: &str) -> LevelFormat {
        if text.lines().any(|line| !line.trim().is_empty() && is_numeric_row(line)) {
            LevelFormat::Numeric
        } else {
            LevelFormat::Glyph
        }
    }
}

/// A loaded level: the static map plus where play starts and ends.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Level {
    pub map: LevelMap,
    pub initial: GameState,
    pub exit: Coord,
}

impl Level {
    /// Checks the grid and splits it into the static map and the initial
    /// state.
    pub fn from_tiles(rows: Vec<Vec<Tile>>) -> Result<Level, LevelError> {
        let expected = rows.first().ok_or(LevelError::Empty)?.len();
        if expected == 0 {
            return Err(LevelError::Empty);
        }
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(LevelError::RaggedRow {
                row,
                expected,
                found: r.len(),
            });
        }

        let mut player = None;
        let mut exit = None;
        let mut collectibles = CoordSet::new();
        let mut blocks = CoordSet::new();
        let mut keys = CoordSet::new();

        for (i, r) in rows.iter().enumerate() {
            for (j, tile) in r.iter().enumerate() {
                let at = Coord::new(i, j);
                match tile {
                    Tile::PlayerStart => {
                        if let Some(first) = player.replace(at) {
                            return Err(LevelError::DuplicatePlayer { first, second: at });
                        }
                    }
                    Tile::Exit => {
                        if let Some(first) = exit.replace(at) {
                            return Err(LevelError::DuplicateExit { first, second: at });
                        }
                    }
                    Tile::Collectible => {
                        collectibles.insert(at);
                    }
                    Tile::MovableBlock => {
                        blocks.insert(at);
                    }
                    Tile::KeyItem => {
                        keys.insert(at);
                    }
                    _ => {}
                }
            }
        }

        let player = player.ok_or(LevelError::MissingPlayer)?;
        let exit = exit.ok_or(LevelError::MissingExit)?;

        Ok(Level {
            map: LevelMap::new(rows),
            initial: GameState::new(player, collectibles, blocks, keys),
            exit,
        })
    }

    pub fn solve(&self) -> Option<Vec<Direction>> {
        crate::search::solve(&self.map, &self.initial, self.exit)
    }

    pub fn search(&self, config: SolverConfig) -> SearchReport {
        Solver::new(config).search(&self.map, &self.initial, self.exit)
    }
}

fn is_numeric_row(line: &str) -> bool {
    line.chars().all(|c| c.is_ascii_digit() || c.is_whitespace())
}

#[auto_enums::auto_enum(Iterator)]
fn tokens<'a>(line: &'a str, format: LevelFormat) -> impl Iterator<Item = &'a str> + 'a {
    match format {
        LevelFormat::Numeric => line.split_whitespace(),
        LevelFormat::Glyph => line
            .char_indices()
            .map(move |(ix, c)| &line[ix..ix + c.len_utf8()]),
    }
}

fn parse_tile(token: &str, format: LevelFormat) -> Option<Tile> {
    match format {
        LevelFormat::Numeric => token.parse().ok().and_then(Tile::from_code),
        LevelFormat::Glyph => token.chars().next().and_then(Tile::from_glyph),
    }
}

fn parse_rows(lines: &[&str], format: LevelFormat) -> Result<Vec<Vec<Tile>>, LevelError> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            tokens(line, format)
                .enumerate()
                .map(|(j, token)| {
                    parse_tile(token, format).ok_or_else(|| LevelError::UnknownTile {
                        at: Coord::new(i, j),
                        token: token.to_string(),
                    })
                })
                .collect()
        })
        .collect()
}

/// All levels in `text`, in file order.
pub fn parse_levels(text: &str, format: LevelFormat) -> Result<Vec<Level>, LevelError> {
    let mut levels = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        // a glyph row of spaces is a row of floor, only an empty line separates
        let separator = match format {
            LevelFormat::Numeric => line.trim().is_empty(),
            LevelFormat::Glyph => line.is_empty(),
        };
        if separator {
            if !current.is_empty() {
                levels.push(Level::from_tiles(parse_rows(&current, format)?)?);
                current.clear();
            }
            continue;
        }

        match format {
            LevelFormat::Numeric if !is_numeric_row(line) => continue,
            LevelFormat::Numeric => current.push(line.trim()),
            LevelFormat::Glyph => current.push(line),
        }
    }

    if !current.is_empty() {
        levels.push(Level::from_tiles(parse_rows(&current, format)?)?);
    }

    Ok(levels)
}

/// The level at `index`, counting from zero.
pub fn parse_nth_level(text: &str, format: LevelFormat, index: usize) -> Result<Level, LevelError> {
    let mut levels = parse_levels(text, format)?;
    let count = levels.len();
    if index >= count {
        return Err(LevelError::NoSuchLevel { index, count });
    }
    Ok(levels.swap_remove(index))
}

/// The first level in `text`, format detected.
pub fn parse_level(text: &str) -> Result<Level, LevelError> {
    parse_nth_level(text, LevelFormat::detect(text), 0)
}
