//! Movement rules as pure functions over relative path positions.

use super::board::{BASE, FINISHED};

pub const DICE_FACES: u8 = 6;
/// A sixth six in a row is never rolled: the third one ends the turn.
pub const MAX_CONSECUTIVE_SIXES: u8 = 3;

/// Where a piece at `position` lands with `roll`, if the move is legal.
///
/// A piece in base leaves only on an exact six and enters at position 1.
/// Elsewhere the move must not overshoot the center.
pub fn target(position: u8, roll: u8) -> Option<u8> {
    if !(1..=DICE_FACES).contains(&roll) || position >= FINISHED {
        return None;
    }
    if position == BASE {
        return (roll == DICE_FACES).then_some(1);
    }
    let next = position + roll;
    (next <= FINISHED).then_some(next)
}

pub fn can_move(position: u8, roll: u8) -> bool {
    target(position, roll).is_some()
}
