//! Turn state of one Ludo table.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::board::{self, Color, Coord, BASE, FINISHED, LAST_TRACK_POSITION, PIECES_PER_PLAYER};
use super::rules::{self, DICE_FACES, MAX_CONSECUTIVE_SIXES};
use crate::util::id::PlayerId;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum LudoError {
    #[error("ludo needs 2 to 4 players, got {0}")]
    PlayerCount(usize),
    #[error("not your turn")]
    NotYourTurn,
    #[error("player is not at this table")]
    NotSeated,
    #[error("dice already rolled, move a piece")]
    AlreadyRolled,
    #[error("roll the dice first")]
    NoPendingRoll,
    #[error("dice value {0} out of range")]
    BadRoll(u8),
    #[error("piece {0} does not exist")]
    NoSuchPiece(usize),
    #[error("piece {piece} cannot move {roll} from position {position}")]
    IllegalMove { piece: usize, position: u8, roll: u8 },
    #[error("game is over")]
    GameOver,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LudoPlayer {
    pub player: PlayerId,
    pub color: Color,
    pub pieces: [u8; PIECES_PER_PLAYER],
    pub forfeited: bool,
}

impl LudoPlayer {
    pub fn all_home(&self) -> bool {
        self.pieces.iter().all(|p| *p == FINISHED)
    }
}

/// What the last action did, for clients to animate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LudoEvent {
    Rolled { color: Color, value: u8 },
    NoLegalMove { color: Color, value: u8 },
    TurnForfeited { color: Color },
    Moved { color: Color, piece: usize, from: u8, to: u8, captured: Vec<(Color, usize)> },
    PlayerForfeited { color: Color },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LudoFinish {
    AllPiecesHome,
    LastPlayerStanding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LudoGame {
    players: Vec<LudoPlayer>,
    turn: usize,
    pending_roll: Option<u8>,
    consecutive_sixes: u8,
    last_event: Option<LudoEvent>,
    winner: Option<(PlayerId, LudoFinish)>,
}

impl LudoGame {
    pub fn new(seats: &[PlayerId]) -> Result<Self, LudoError> {
        if !(2..=4).contains(&seats.len()) {
            return Err(LudoError::PlayerCount(seats.len()));
        }
        let players = seats
            .iter()
            .zip(Color::seating(seats.len()))
            .map(|(player, color)| LudoPlayer {
                player: *player,
                color: *color,
                pieces: [BASE; PIECES_PER_PLAYER],
                forfeited: false,
            })
            .collect();
        Ok(Self {
            players,
            turn: 0,
            pending_roll: None,
            consecutive_sixes: 0,
            last_event: None,
            winner: None,
        })
    }

    pub fn players(&self) -> &[LudoPlayer] {
        &self.players
    }

    pub fn current(&self) -> &LudoPlayer {
        &self.players[self.turn]
    }

    pub fn pending_roll(&self) -> Option<u8> {
        self.pending_roll
    }

    pub fn consecutive_sixes(&self) -> u8 {
        self.consecutive_sixes
    }

    pub fn last_event(&self) -> Option<&LudoEvent> {
        self.last_event.as_ref()
    }

    pub fn winner(&self) -> Option<(PlayerId, LudoFinish)> {
        self.winner
    }

    pub fn roll<R: Rng>(&mut self, player: PlayerId, rng: &mut R) -> Result<LudoEvent, LudoError> {
        let value = rng.gen_range(1..=DICE_FACES);
        self.apply_roll(player, value)
    }

    /// Applies a dice value for the player to move.
    ///
    /// The third six in a row forfeits the turn and clears the roll. A roll
    /// with no legal move passes the turn.
    pub fn apply_roll(&mut self, player: PlayerId, value: u8) -> Result<LudoEvent, LudoError> {
        self.ensure_turn(player)?;
        if self.pending_roll.is_some() {
            return Err(LudoError::AlreadyRolled);
        }
        if !(1..=DICE_FACES).contains(&value) {
            return Err(LudoError::BadRoll(value));
        }
        let color = self.current().color;

        if value == DICE_FACES {
            self.consecutive_sixes += 1;
            if self.consecutive_sixes >= MAX_CONSECUTIVE_SIXES {
                debug!(%color, "third six in a row, turn forfeited");
                self.advance_turn();
                return Ok(self.record(LudoEvent::TurnForfeited { color }));
            }
        }

        self.pending_roll = Some(value);
        if self.legal_moves().is_empty() {
            self.advance_turn();
            return Ok(self.record(LudoEvent::NoLegalMove { color, value }));
        }
        Ok(self.record(LudoEvent::Rolled { color, value }))
    }

    /// Pieces of the player to move that can use the pending roll.
    pub fn legal_moves(&self) -> Vec<usize> {
        let Some(roll) = self.pending_roll else { return Vec::new() };
        self.current()
            .pieces
            .iter()
            .enumerate()
            .filter(|(_, pos)| rules::can_move(**pos, roll))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn move_piece(&mut self, player: PlayerId, piece: usize) -> Result<LudoEvent, LudoError> {
        self.ensure_turn(player)?;
        let roll = self.pending_roll.ok_or(LudoError::NoPendingRoll)?;
        if piece >= PIECES_PER_PLAYER {
            return Err(LudoError::NoSuchPiece(piece));
        }
        let from = self.current().pieces[piece];
        let to = rules::target(from, roll)
            .ok_or(LudoError::IllegalMove { piece, position: from, roll })?;

        let color = self.current().color;
        self.players[self.turn].pieces[piece] = to;
        let captured = self.capture_at(color, to);
        self.pending_roll = None;

        if self.current().all_home() {
            self.winner = Some((self.current().player, LudoFinish::AllPiecesHome));
        } else if roll != DICE_FACES {
            // a capture or a piece reaching the center earns one more roll
            if captured.is_empty() && to != FINISHED {
                self.advance_turn();
            } else {
                self.consecutive_sixes = 0;
            }
        }
        Ok(self.record(LudoEvent::Moved { color, piece, from, to, captured }))
    }

    /// Removes a player from the table; the last one seated wins.
    pub fn forfeit(&mut self, player: PlayerId) -> Result<LudoEvent, LudoError> {
        if self.winner.is_some() {
            return Err(LudoError::GameOver);
        }
        let idx = self.players.iter().position(|p| p.player == player).ok_or(LudoError::NotSeated)?;
        let seat = &mut self.players[idx];
        seat.forfeited = true;
        seat.pieces = [BASE; PIECES_PER_PLAYER];
        let color = seat.color;

        let seated: Vec<PlayerId> =
            self.players.iter().filter(|p| !p.forfeited).map(|p| p.player).collect();
        if let [last] = seated[..] {
            self.winner = Some((last, LudoFinish::LastPlayerStanding));
        } else if idx == self.turn {
            self.advance_turn();
        }
        Ok(self.record(LudoEvent::PlayerForfeited { color }))
    }

    /// Board coordinates of every piece still in play, for renderers.
    pub fn cells(&self) -> Vec<(Color, usize, Coord)> {
        self.players
            .iter()
            .filter(|p| !p.forfeited)
            .flat_map(|p| {
                p.pieces
                    .iter()
                    .enumerate()
                    .map(move |(i, pos)| (p.color, i, board::cell_of(p.color, i, *pos)))
            })
            .collect()
    }

    fn ensure_turn(&self, player: PlayerId) -> Result<(), LudoError> {
        if self.winner.is_some() {
            return Err(LudoError::GameOver);
        }
        if !self.players.iter().any(|p| p.player == player) {
            return Err(LudoError::NotSeated);
        }
        if self.current().player != player {
            return Err(LudoError::NotYourTurn);
        }
        Ok(())
    }

    fn capture_at(&mut self, mover: Color, position: u8) -> Vec<(Color, usize)> {
        if position > LAST_TRACK_POSITION {
            return Vec::new();
        }
        let Some(cell) = board::track_index(mover, position) else { return Vec::new() };
        if board::is_safe(cell) {
            return Vec::new();
        }
        let mut captured = Vec::new();
        for seat in self.players.iter_mut().filter(|p| p.color != mover && !p.forfeited) {
            for (i, pos) in seat.pieces.iter_mut().enumerate() {
                if board::track_index(seat.color, *pos) == Some(cell) {
                    *pos = BASE;
                    captured.push((seat.color, i));
                }
            }
        }
        captured
    }

    fn advance_turn(&mut self) {
        self.pending_roll = None;
        self.consecutive_sixes = 0;
        let n = self.players.len();
        for step in 1..=n {
            let next = (self.turn + step) % n;
            if !self.players[next].forfeited {
                self.turn = next;
                return;
            }
        }
    }

    fn record(&mut self, event: LudoEvent) -> LudoEvent {
        self.last_event = Some(event.clone());
        event
    }
}
