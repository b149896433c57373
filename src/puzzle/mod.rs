//! Single-player deduction puzzles and the store for their runs.

pub mod akinator;
pub mod fourpics;
pub mod store;

pub use akinator::{AkinatorGame, AkinatorView, Answer, Attribute};
pub use fourpics::{FourPicsGame, FourPicsView, Hint};
pub use store::PuzzleStore;

use crate::wallet::WalletError;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("puzzle run not found")]
    NotFound,
    #[error("puzzle run belongs to another player")]
    NotOwner,
    #[error("wrong puzzle kind for this run")]
    WrongKind,
    #[error("no question is pending")]
    NotAsking,
    #[error("no guess is pending")]
    NotGuessing,
    #[error("unknown level {0}")]
    UnknownLevel(usize),
    #[error("level already solved")]
    AlreadySolved,
    #[error("hint {0:?} already used on this level")]
    HintUsed(Hint),
    #[error("every letter is already revealed")]
    NothingToReveal,
    #[error(transparent)]
    Wallet(#[from] WalletError),
}
