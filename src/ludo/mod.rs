//! Ludo: board geometry, movement rules and table state.

pub mod board;
pub mod game;
pub mod rules;

pub use board::{Color, Coord};
pub use game::{LudoError, LudoEvent, LudoFinish, LudoGame, LudoPlayer};
