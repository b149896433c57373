//! Game sessions: lifecycle, store with change broadcast, presence.

pub mod model;
pub mod presence;
pub mod store;
pub mod sweeper;

pub use model::{EndReason, GameBoard, GameKind, GameOutcome, GameSession, SessionStatus};
pub use presence::{PresencePolicy, PresenceState, PresenceTracker};
pub use store::SessionStore;

use crate::chess::ChessError;
use crate::ludo::LudoError;
use crate::wallet::WalletError;
use crate::words::WordsError;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,
    #[error("session is full")]
    Full,
    #[error("already seated in this session")]
    AlreadyJoined,
    #[error("player is not seated in this session")]
    NotSeated,
    #[error("session is {0}")]
    InvalidStatus(SessionStatus),
    #[error("only the creator can do that")]
    NotCreator,
    #[error("stale version {given}, session is at {current}")]
    StaleVersion { given: u64, current: u64 },
    #[error("invalid capacity {0}")]
    InvalidCapacity(usize),
    #[error("not enough players")]
    NotEnoughPlayers,
    #[error("not available for {0} sessions")]
    WrongKind(GameKind),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error(transparent)]
    Chess(#[from] ChessError),
    #[error(transparent)]
    Ludo(#[from] LudoError),
    #[error(transparent)]
    Words(#[from] WordsError),
}
