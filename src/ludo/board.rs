//! Fixed 15×15 Ludo board geometry.
//!
//! Cells are `(row, col)` with `(0, 0)` top-left. The 52 shared track cells are
//! listed clockwise starting at red's entry cell; each color enters the track
//! at its own offset and leaves it into a private 5-cell home stretch.

use serde::{Deserialize, Serialize};

pub type Coord = (u8, u8);

/// Relative path position of a piece still in its base.
pub const BASE: u8 = 0;
/// Last relative position on the shared track.
pub const LAST_TRACK_POSITION: u8 = 51;
/// Relative position of a piece that reached the center.
pub const FINISHED: u8 = 57;
pub const TRACK_LEN: usize = 52;
pub const PIECES_PER_PLAYER: usize = 4;
pub const HOME_CENTER: Coord = (7, 7);

pub const TRACK: [Coord; TRACK_LEN] = [
    (6, 1), (6, 2), (6, 3), (6, 4), (6, 5),
    (5, 6), (4, 6), (3, 6), (2, 6), (1, 6), (0, 6),
    (0, 7), (0, 8),
    (1, 8), (2, 8), (3, 8), (4, 8), (5, 8),
    (6, 9), (6, 10), (6, 11), (6, 12), (6, 13), (6, 14),
    (7, 14), (8, 14),
    (8, 13), (8, 12), (8, 11), (8, 10), (8, 9),
    (9, 8), (10, 8), (11, 8), (12, 8), (13, 8), (14, 8),
    (14, 7), (14, 6),
    (13, 6), (12, 6), (11, 6), (10, 6), (9, 6),
    (8, 5), (8, 4), (8, 3), (8, 2), (8, 1), (8, 0),
    (7, 0), (6, 0),
];

/// Track indices where pieces cannot be captured, besides the start cells.
pub const STAR_CELLS: [usize; 4] = [8, 21, 34, 47];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Green, Color::Yellow, Color::Blue];

    /// Seat colors for a table of `players` (2..=4); two players sit opposite.
    pub fn seating(players: usize) -> &'static [Color] {
        match players {
            2 => &[Color::Red, Color::Yellow],
            3 => &[Color::Red, Color::Green, Color::Yellow],
            _ => &Self::ALL,
        }
    }

    pub const fn start_index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Green => 13,
            Color::Yellow => 26,
            Color::Blue => 39,
        }
    }

    pub const fn home_stretch(self) -> [Coord; 5] {
        match self {
            Color::Red => [(7, 1), (7, 2), (7, 3), (7, 4), (7, 5)],
            Color::Green => [(1, 7), (2, 7), (3, 7), (4, 7), (5, 7)],
            Color::Yellow => [(7, 13), (7, 12), (7, 11), (7, 10), (7, 9)],
            Color::Blue => [(13, 7), (12, 7), (11, 7), (10, 7), (9, 7)],
        }
    }

    pub const fn base_cells(self) -> [Coord; PIECES_PER_PLAYER] {
        match self {
            Color::Red => [(1, 1), (1, 4), (4, 1), (4, 4)],
            Color::Green => [(1, 10), (1, 13), (4, 10), (4, 13)],
            Color::Yellow => [(10, 10), (10, 13), (13, 10), (13, 13)],
            Color::Blue => [(10, 1), (10, 4), (13, 1), (13, 4)],
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Red => write!(f, "red"),
            Color::Green => write!(f, "green"),
            Color::Yellow => write!(f, "yellow"),
            Color::Blue => write!(f, "blue"),
        }
    }
}

/// Shared-track index for a relative position, `None` off the shared track.
pub fn track_index(color: Color, position: u8) -> Option<usize> {
    if (1..=LAST_TRACK_POSITION).contains(&position) {
        Some((color.start_index() + position as usize - 1) % TRACK_LEN)
    } else {
        None
    }
}

pub fn is_safe(track_index: usize) -> bool {
    Color::ALL.iter().any(|c| c.start_index() == track_index) || STAR_CELLS.contains(&track_index)
}

/// Board coordinate of `color`'s piece number `piece` at relative `position`.
pub fn cell_of(color: Color, piece: usize, position: u8) -> Coord {
    match position {
        BASE => color.base_cells()[piece % PIECES_PER_PLAYER],
        p if p <= LAST_TRACK_POSITION => TRACK[track_index(color, p).unwrap_or(0)],
        p if p < FINISHED => color.home_stretch()[(p - LAST_TRACK_POSITION - 1) as usize],
        _ => HOME_CENTER,
    }
}
