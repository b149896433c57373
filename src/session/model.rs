//! Session entity: lifecycle status, seats, stakes and the game board.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::SessionError;
use crate::chess::{ChessBoard, ChessFinish};
use crate::ludo::{LudoFinish, LudoGame};
use crate::util::id::PlayerId;
use crate::wallet::{SettlementOutcome, SettlementReceipt, Stake};
use crate::words::{WordSearch, WordsFinish};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Waiting,
    Active,
    Completed,
    Cancelled,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Chess,
    Ludo,
    WordSearch,
}

impl GameKind {
    /// Seats allowed at creation, and the default.
    pub fn capacity(self, requested: Option<usize>) -> Result<usize, SessionError> {
        let (range, default) = match self {
            Self::Chess | Self::WordSearch => (2..=2, 2),
            Self::Ludo => (2..=4, 4),
        };
        let capacity = requested.unwrap_or(default);
        if range.contains(&capacity) {
            Ok(capacity)
        } else {
            Err(SessionError::InvalidCapacity(capacity))
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Chess => "chess",
            Self::Ludo => "ludo",
            Self::WordSearch => "word_search",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    Resignation,
    Forfeit,
    WordGoal,
    AllWordsFound,
    AllPiecesHome,
    LastPlayerStanding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameOutcome {
    Winner { player: PlayerId, reason: EndReason },
    Draw { reason: EndReason },
    Cancelled,
}

impl GameOutcome {
    pub fn settlement(self) -> SettlementOutcome {
        match self {
            Self::Winner { player, .. } => SettlementOutcome::Winner { player },
            Self::Draw { .. } => SettlementOutcome::Draw,
            Self::Cancelled => SettlementOutcome::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "state", rename_all = "snake_case")]
pub enum GameBoard {
    Chess(ChessBoard),
    Ludo(LudoGame),
    WordSearch(WordSearch),
}

impl GameBoard {
    /// Deals a fresh board for the seated players, in seat order.
    pub fn new(kind: GameKind, players: &[PlayerId], seed: u64) -> Result<Self, SessionError> {
        Ok(match (kind, players) {
            (GameKind::Chess, [white, black]) => Self::Chess(ChessBoard::new(*white, *black)),
            (GameKind::Chess, _) => return Err(SessionError::NotEnoughPlayers),
            (GameKind::Ludo, _) => Self::Ludo(LudoGame::new(players)?),
            (GameKind::WordSearch, _) => {
                Self::WordSearch(WordSearch::generate(players.to_vec(), seed))
            }
        })
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        use GameOutcome::{Draw, Winner};
        let won = |player, reason| Winner { player, reason };
        match self {
            Self::Chess(board) => board.finish().map(|f| match f {
                ChessFinish::Checkmate { winner } => won(winner, EndReason::Checkmate),
                ChessFinish::Resignation { winner } => won(winner, EndReason::Resignation),
                ChessFinish::Forfeit { winner } => won(winner, EndReason::Forfeit),
                ChessFinish::Stalemate => Draw { reason: EndReason::Stalemate },
                ChessFinish::InsufficientMaterial => {
                    Draw { reason: EndReason::InsufficientMaterial }
                }
                ChessFinish::FiftyMoveRule => Draw { reason: EndReason::FiftyMoveRule },
            }),
            Self::Ludo(game) => game.winner().map(|(player, f)| {
                let reason = match f {
                    LudoFinish::AllPiecesHome => EndReason::AllPiecesHome,
                    LudoFinish::LastPlayerStanding => EndReason::LastPlayerStanding,
                };
                won(player, reason)
            }),
            Self::WordSearch(ws) => ws.finish().map(|f| match f {
                WordsFinish::WordGoal { winner } => won(winner, EndReason::WordGoal),
                WordsFinish::AllFound { winner } => won(winner, EndReason::AllWordsFound),
                WordsFinish::AllFoundDraw => Draw { reason: EndReason::AllWordsFound },
                WordsFinish::Forfeit { winner } => won(winner, EndReason::Forfeit),
            }),
        }
    }

    /// Removes an absent player. Two-seat games hand the win to the opponent.
    pub fn forfeit(&mut self, player: PlayerId) -> Result<(), SessionError> {
        match self {
            Self::Chess(board) => board.forfeit(player)?,
            Self::Ludo(game) => {
                game.forfeit(player)?;
            }
            Self::WordSearch(ws) => ws.forfeit(player)?,
        }
        Ok(())
    }

    /// Players still taking part.
    pub fn active_players(&self) -> Vec<PlayerId> {
        match self {
            Self::Chess(board) => vec![board.white, board.black],
            Self::Ludo(game) => {
                game.players().iter().filter(|p| !p.forfeited).map(|p| p.player).collect()
            }
            Self::WordSearch(ws) => ws.players.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub id: String,
    pub kind: GameKind,
    pub status: SessionStatus,
    pub players: Vec<PlayerId>,
    pub capacity: usize,
    pub creator: PlayerId,
    pub entry_fee: u64,
    pub prize_pool: u64,
    /// Bumped on every mutation. Writers pass the version they last saw.
    pub version: u64,
    pub board: Option<GameBoard>,
    pub outcome: Option<GameOutcome>,
    pub settlement: Option<SettlementReceipt>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip)]
    pub(crate) seed: u64,
}

impl GameSession {
    pub fn is_seated(&self, player: PlayerId) -> bool {
        self.players.contains(&player)
    }

    pub fn stakes(&self) -> Vec<Stake> {
        self.players.iter().map(|p| Stake { player: *p, entry_fee: self.entry_fee }).collect()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, SessionStatus::Completed | SessionStatus::Cancelled)
    }

    pub(crate) fn ensure_status(&self, expected: SessionStatus) -> Result<(), SessionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidStatus(self.status))
        }
    }

    /// The live board, checked to be the requested kind.
    pub(crate) fn board_mut(&mut self, kind: GameKind) -> Result<&mut GameBoard, SessionError> {
        self.ensure_status(SessionStatus::Active)?;
        if self.kind != kind {
            return Err(SessionError::WrongKind(self.kind));
        }
        self.board.as_mut().ok_or(SessionError::InvalidStatus(self.status))
    }

    pub(crate) fn chess_mut(&mut self) -> Result<&mut ChessBoard, SessionError> {
        let kind = self.kind;
        match self.board_mut(GameKind::Chess)? {
            GameBoard::Chess(board) => Ok(board),
            _ => Err(SessionError::WrongKind(kind)),
        }
    }

    pub(crate) fn ludo_mut(&mut self) -> Result<&mut LudoGame, SessionError> {
        let kind = self.kind;
        match self.board_mut(GameKind::Ludo)? {
            GameBoard::Ludo(game) => Ok(game),
            _ => Err(SessionError::WrongKind(kind)),
        }
    }

    pub(crate) fn words_mut(&mut self) -> Result<&mut WordSearch, SessionError> {
        let kind = self.kind;
        match self.board_mut(GameKind::WordSearch)? {
            GameBoard::WordSearch(ws) => Ok(ws),
            _ => Err(SessionError::WrongKind(kind)),
        }
    }
}
