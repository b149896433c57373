//! The stored side of a chess session: FEN, move history, seat colors.
//!
//! Nothing here keeps a live position between requests. Every move rebuilds the
//! position from the stored FEN, validates against it, and writes the new FEN
//! back, the way a client reconciles against the session row.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::engine::{ChessPosition, LegalMove, Outcome};
use super::{ChessError, Color};
use crate::util::id::PlayerId;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub ply: u16,
    pub color: Color,
    pub san: String,
    pub uci: String,
    pub fen_after: String,
    pub played_at: i64,
}

/// Terminal state of a chess board and who it favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChessFinish {
    Checkmate { winner: PlayerId },
    Resignation { winner: PlayerId },
    Forfeit { winner: PlayerId },
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChessBoard {
    pub white: PlayerId,
    pub black: PlayerId,
    pub fen: String,
    pub moves: Vec<MoveRecord>,
    resigned: Option<Color>,
    forfeited: Option<Color>,
    #[serde(default)]
    draw_claimed: bool,
}

impl ChessBoard {
    pub fn new(white: PlayerId, black: PlayerId) -> Self {
        Self {
            white,
            black,
            fen: STARTING_FEN.to_string(),
            moves: Vec::new(),
            resigned: None,
            forfeited: None,
            draw_claimed: false,
        }
    }

    pub fn player_color(&self, player: PlayerId) -> Option<Color> {
        if player == self.white {
            Some(Color::White)
        } else if player == self.black {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub const fn player_for(&self, color: Color) -> PlayerId {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    pub fn position(&self) -> Result<ChessPosition, ChessError> {
        ChessPosition::from_fen(&self.fen)
    }

    pub fn turn(&self) -> Result<Color, ChessError> {
        Ok(self.position()?.side_to_move())
    }

    pub fn legal_moves(&self) -> Result<Vec<LegalMove>, ChessError> {
        if self.finish().is_some() {
            return Ok(Vec::new());
        }
        Ok(self.position()?.legal_moves())
    }

    /// Plays `uci` for `player` against the stored FEN.
    pub fn submit_move(&mut self, player: PlayerId, uci: &str) -> Result<MoveRecord, ChessError> {
        if self.finish().is_some() {
            return Err(ChessError::GameOver);
        }
        let color = self.player_color(player).ok_or(ChessError::NotInGame)?;
        let played = self.position()?.play(color, uci)?;

        let record = MoveRecord {
            ply: self.moves.len() as u16 + 1,
            color,
            san: played.san,
            uci: uci.to_string(),
            fen_after: played.fen_after.clone(),
            played_at: OffsetDateTime::now_utc().unix_timestamp(),
        };
        self.fen = played.fen_after;
        self.moves.push(record.clone());
        Ok(record)
    }

    pub fn resign(&mut self, player: PlayerId) -> Result<(), ChessError> {
        if self.finish().is_some() {
            return Err(ChessError::GameOver);
        }
        self.resigned = Some(self.player_color(player).ok_or(ChessError::NotInGame)?);
        Ok(())
    }

    /// Either seated player may claim a draw once fifty moves pass without a
    /// capture or pawn move.
    pub fn claim_draw(&mut self, player: PlayerId) -> Result<(), ChessError> {
        if self.finish().is_some() {
            return Err(ChessError::GameOver);
        }
        self.player_color(player).ok_or(ChessError::NotInGame)?;
        let position = self.position()?;
        if !position.fifty_move_claimable() {
            return Err(ChessError::NoDrawToClaim(position.halfmoves()));
        }
        self.draw_claimed = true;
        Ok(())
    }

    pub fn forfeit(&mut self, player: PlayerId) -> Result<(), ChessError> {
        if self.finish().is_some() {
            return Err(ChessError::GameOver);
        }
        self.forfeited = Some(self.player_color(player).ok_or(ChessError::NotInGame)?);
        Ok(())
    }

    pub fn finish(&self) -> Option<ChessFinish> {
        if let Some(color) = self.resigned {
            return Some(ChessFinish::Resignation { winner: self.player_for(color.opposite()) });
        }
        if let Some(color) = self.forfeited {
            return Some(ChessFinish::Forfeit { winner: self.player_for(color.opposite()) });
        }
        if self.draw_claimed {
            return Some(ChessFinish::FiftyMoveRule);
        }
        match self.position().ok()?.outcome()? {
            Outcome::Checkmate(color) => {
                Some(ChessFinish::Checkmate { winner: self.player_for(color) })
            }
            Outcome::Stalemate => Some(ChessFinish::Stalemate),
            Outcome::InsufficientMaterial => Some(ChessFinish::InsufficientMaterial),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> (ChessBoard, PlayerId, PlayerId) {
        let (w, b) = (PlayerId::new(), PlayerId::new());
        (ChessBoard::new(w, b), w, b)
    }

    #[test]
    fn test_moves_alternate_and_are_recorded() {
        let (mut board, w, b) = board();
        let rec = board.submit_move(w, "e2e4").unwrap();
        assert_eq!(rec.ply, 1);
        assert_eq!(rec.san, "e4");
        assert_eq!(board.turn().unwrap(), Color::Black);
        assert_eq!(board.submit_move(w, "d2d4").unwrap_err(), ChessError::NotYourTurn);
        board.submit_move(b, "e7e5").unwrap();
        assert_eq!(board.moves.len(), 2);
        assert_eq!(board.fen, board.moves[1].fen_after);
    }

    #[test]
    fn test_stranger_cannot_move() {
        let (mut board, _, _) = board();
        assert_eq!(board.submit_move(PlayerId::new(), "e2e4").unwrap_err(), ChessError::NotInGame);
    }

    #[test]
    fn test_checkmate_winner_is_the_mating_player() {
        let (mut board, w, b) = board();
        board.submit_move(w, "f2f3").unwrap();
        board.submit_move(b, "e7e5").unwrap();
        board.submit_move(w, "g2g4").unwrap();
        board.submit_move(b, "d8h4").unwrap();
        assert_eq!(board.finish(), Some(ChessFinish::Checkmate { winner: b }));
        assert!(board.legal_moves().unwrap().is_empty());
        assert_eq!(board.submit_move(w, "e2e4").unwrap_err(), ChessError::GameOver);
    }

    #[test]
    fn test_resign_and_forfeit() {
        let (mut board, w, b) = board();
        board.resign(w).unwrap();
        assert_eq!(board.finish(), Some(ChessFinish::Resignation { winner: b }));
        assert_eq!(board.forfeit(b).unwrap_err(), ChessError::GameOver);

        let (mut board, w, b) = self::board();
        board.forfeit(b).unwrap();
        assert_eq!(board.finish(), Some(ChessFinish::Forfeit { winner: w }));
    }

    #[test]
    fn test_fifty_move_draw_claim() {
        let (mut board, w, b) = board();
        assert_eq!(board.claim_draw(w).unwrap_err(), ChessError::NoDrawToClaim(0));
        board.fen = "8/8/4k3/8/8/3QK3/8/8 b - - 99 80".to_string();
        assert_eq!(board.claim_draw(b).unwrap_err(), ChessError::NoDrawToClaim(99));
        board.submit_move(b, "e6e7").unwrap();
        assert_eq!(board.claim_draw(PlayerId::new()).unwrap_err(), ChessError::NotInGame);
        board.claim_draw(b).unwrap();
        assert_eq!(board.finish(), Some(ChessFinish::FiftyMoveRule));
        assert_eq!(board.submit_move(w, "d3d4").unwrap_err(), ChessError::GameOver);
    }

    #[test]
    fn test_stalemate_from_stored_fen() {
        let (mut board, _, _) = board();
        board.fen = "8/8/8/8/8/6q1/5k2/7K w - - 0 1".to_string();
        assert_eq!(board.finish(), Some(ChessFinish::Stalemate));
    }
}
