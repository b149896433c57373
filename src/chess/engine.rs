//! Chess rules over shakmaty, shaped for the stored-FEN session flow.
//!
//! A position is rebuilt from the session's FEN for each request, asked to
//! play one move for one color, and handed back as FEN.

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position};

use super::{ChessError, Color};

/// Halfmoves without a capture or pawn move after which a draw may be claimed.
pub const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// How a position ended, by the rules alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The given color delivered mate.
    Checkmate(Color),
    Stalemate,
    InsufficientMaterial,
}

/// A legal move as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalMove {
    pub uci: String,
    pub san: String,
    pub is_capture: bool,
}

/// One accepted move and the position it left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Played {
    /// SAN with check or mate suffix.
    pub san: String,
    pub fen_after: String,
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Clone, Default)]
pub struct ChessPosition {
    position: Chess,
}

impl ChessPosition {
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let setup = Fen::from_ascii(fen.as_bytes())
            .map_err(|e| ChessError::InvalidFen(e.to_string()))?;
        let position = setup
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| ChessError::InvalidFen(e.to_string()))?;
        Ok(Self { position })
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    pub fn side_to_move(&self) -> Color {
        self.position.turn().into()
    }

    pub fn in_check(&self) -> bool {
        self.position.is_check()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        let pos = &self.position;
        match (pos.is_checkmate(), pos.is_stalemate(), pos.is_insufficient_material()) {
            (true, _, _) => Some(Outcome::Checkmate((!pos.turn()).into())),
            (_, true, _) => Some(Outcome::Stalemate),
            (_, _, true) => Some(Outcome::InsufficientMaterial),
            _ => None,
        }
    }

    pub fn legal_moves(&self) -> Vec<LegalMove> {
        self.position
            .legal_moves()
            .iter()
            .map(|m| LegalMove {
                uci: UciMove::from_move(m, CastlingMode::Standard).to_string(),
                san: San::from_move(&self.position, m).to_string(),
                is_capture: m.is_capture(),
            })
            .collect()
    }

    /// Plays `uci` for `mover`. Fails if the game already ended, if it is the
    /// other side's turn, or if the move is not legal here.
    pub fn play(&mut self, mover: Color, uci: &str) -> Result<Played, ChessError> {
        if self.outcome().is_some() {
            return Err(ChessError::GameOver);
        }
        if self.side_to_move() != mover {
            return Err(ChessError::NotYourTurn);
        }
        let notation: UciMove = uci
            .parse()
            .map_err(|_| ChessError::InvalidUciMove(uci.to_string()))?;
        let m = notation
            .to_move(&self.position)
            .map_err(|_| ChessError::IllegalMove(uci.to_string()))?;
        let san = SanPlus::from_move_and_play_unchecked(&mut self.position, &m);
        Ok(Played { san: san.to_string(), fen_after: self.fen(), outcome: self.outcome() })
    }

    pub fn halfmoves(&self) -> u32 {
        self.position.halfmoves()
    }

    pub fn fifty_move_claimable(&self) -> bool {
        self.halfmoves() >= FIFTY_MOVE_HALFMOVES
    }
}
