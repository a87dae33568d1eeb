//! Solver for grid puzzle levels with boulders, keys, doors, pits and traps.
//!
//! A level is a static [`LevelMap`] plus a [`GameState`] holding everything
//! that changes during play. [`rules::successors`] encodes the game
//! mechanics, [`Heuristic`] estimates the remaining moves, and [`Solver`]
//! runs A* to find the shortest sequence of [`Direction`]s that picks up
//! every collectible and ends on the exit.

pub mod heuristic;
pub mod level;
pub mod map;
pub mod rules;
pub mod search;
pub mod state;

pub use heuristic::Heuristic;
pub use level::{parse_level, parse_levels, parse_nth_level, Level, LevelError, LevelFormat};
pub use map::{Coord, Direction, LevelMap, Tile};
pub use search::{solve, Outcome, SearchReport, SearchStats, Solver, SolverConfig};
pub use state::{CoordSet, GameState};
