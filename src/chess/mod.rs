//! Chess: rules through shakmaty, plus the stored-session board.

pub mod board;
pub mod engine;

use serde::{Deserialize, Serialize};

pub use board::{ChessBoard, ChessFinish, MoveRecord};
pub use engine::{ChessPosition, LegalMove, Outcome, Played};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ChessError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
    #[error("invalid UCI move: {0}")]
    InvalidUciMove(String),
    #[error("illegal move: {0}")]
    IllegalMove(String),
    #[error("not your turn")]
    NotYourTurn,
    #[error("player is not in this game")]
    NotInGame,
    #[error("game is already over")]
    GameOver,
    #[error("no draw to claim: {0} halfmoves since the last capture or pawn move")]
    NoDrawToClaim(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl From<shakmaty::Color> for Color {
    fn from(c: shakmaty::Color) -> Self {
        match c {
            shakmaty::Color::White => Self::White,
            shakmaty::Color::Black => Self::Black,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::White => write!(f, "white"),
            Self::Black => write!(f, "black"),
        }
    }
}
