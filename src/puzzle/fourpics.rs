//! Four pictures, one word.
//!
//! A level shows four clues and a shuffled letter bank holding the answer's
//! letters plus decoys. Hints are bought with coins; the store debits the coin
//! ledger before calling [`FourPicsGame::apply_hint`].

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::PuzzleError;

pub const BANK_SIZE: usize = 12;
/// Coins credited for solving a level by guessing.
pub const SOLVE_REWARD: u64 = 10;

pub struct Level {
    pub answer: &'static str,
    pub clues: [&'static str; 4],
}

pub const LEVELS: [Level; 12] = [
    Level { answer: "RAIN", clues: ["umbrella", "storm cloud", "puddle", "raincoat"] },
    Level { answer: "FIRE", clues: ["campfire", "fire truck", "matches", "fireplace"] },
    Level { answer: "BOOK", clues: ["library", "reading glasses", "bookshelf", "novel"] },
    Level { answer: "MUSIC", clues: ["headphones", "guitar", "sheet music", "concert"] },
    Level { answer: "SPEED", clues: ["race car", "cheetah", "speedometer", "rocket"] },
    Level { answer: "COLD", clues: ["snowman", "ice cubes", "penguin", "scarf"] },
    Level { answer: "TIME", clues: ["clock", "hourglass", "calendar", "wristwatch"] },
    Level { answer: "LIGHT", clues: ["lamp", "sunrise", "candle", "lighthouse"] },
    Level { answer: "SWEET", clues: ["candy", "cake", "honey", "ice cream"] },
    Level { answer: "GAME", clues: ["chessboard", "dice", "controller", "playing cards"] },
    Level { answer: "WATER", clues: ["ocean", "tap", "glass of water", "waterfall"] },
    Level { answer: "PLANT", clues: ["seedling", "cactus", "potted fern", "garden"] },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hint {
    RevealLetter,
    RemoveDecoys,
    Solve,
}

impl Hint {
    pub const fn cost(self) -> u64 {
        match self {
            Hint::RevealLetter => 20,
            Hint::RemoveDecoys => 30,
            Hint::Solve => 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tile {
    letter: char,
    decoy: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FourPicsView {
    pub level: usize,
    pub clues: [&'static str; 4],
    /// Answer with unrevealed positions as `_`.
    pub pattern: String,
    pub bank: Vec<char>,
    pub hints_used: Vec<Hint>,
    pub solved: bool,
}

#[derive(Debug, Clone)]
pub struct FourPicsGame {
    level: usize,
    bank: Vec<Tile>,
    revealed: Vec<bool>,
    hints_used: Vec<Hint>,
    solved: bool,
    rng: StdRng,
}

impl FourPicsGame {
    pub fn new(level: usize, seed: u64) -> Result<Self, PuzzleError> {
        let answer = LEVELS.get(level).ok_or(PuzzleError::UnknownLevel(level))?.answer;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut bank: Vec<Tile> =
            answer.chars().map(|letter| Tile { letter, decoy: false }).collect();
        while bank.len() < BANK_SIZE {
            let letter = rng.gen_range(b'A'..=b'Z') as char;
            bank.push(Tile { letter, decoy: true });
        }
        bank.shuffle(&mut rng);

        Ok(Self {
            level,
            bank,
            revealed: vec![false; answer.len()],
            hints_used: Vec::new(),
            solved: false,
            rng,
        })
    }

    pub fn answer(&self) -> &'static str {
        LEVELS[self.level].answer
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// Whether `hint` may be bought right now. Checked before any coins move.
    pub fn can_purchase(&self, hint: Hint) -> Result<(), PuzzleError> {
        if self.solved {
            return Err(PuzzleError::AlreadySolved);
        }
        if self.hints_used.contains(&hint) {
            return Err(PuzzleError::HintUsed(hint));
        }
        if hint == Hint::RevealLetter && self.revealed.iter().all(|r| *r) {
            return Err(PuzzleError::NothingToReveal);
        }
        Ok(())
    }

    pub fn apply_hint(&mut self, hint: Hint) -> Result<(), PuzzleError> {
        self.can_purchase(hint)?;
        match hint {
            Hint::RevealLetter => {
                let hidden: Vec<usize> =
                    (0..self.revealed.len()).filter(|i| !self.revealed[*i]).collect();
                if let Some(&pos) = hidden.choose(&mut self.rng) {
                    self.revealed[pos] = true;
                }
            }
            Hint::RemoveDecoys => self.bank.retain(|t| !t.decoy),
            Hint::Solve => {
                self.revealed.iter_mut().for_each(|r| *r = true);
                self.solved = true;
            }
        }
        self.hints_used.push(hint);
        Ok(())
    }

    /// Case-insensitive guess. Returns whether it solved the level.
    pub fn guess(&mut self, word: &str) -> Result<bool, PuzzleError> {
        if self.solved {
            return Err(PuzzleError::AlreadySolved);
        }
        let correct = word.trim().eq_ignore_ascii_case(self.answer());
        if correct {
            self.revealed.iter_mut().for_each(|r| *r = true);
            self.solved = true;
        }
        Ok(correct)
    }

    pub fn view(&self) -> FourPicsView {
        let pattern = self
            .answer()
            .chars()
            .zip(&self.revealed)
            .map(|(c, shown)| if *shown { c } else { '_' })
            .collect();
        FourPicsView {
            level: self.level,
            clues: LEVELS[self.level].clues,
            pattern,
            bank: self.bank.iter().map(|t| t.letter).collect(),
            hints_used: self.hints_used.clone(),
            solved: self.solved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_holds_answer_and_decoys() {
        let game = FourPicsGame::new(3, 42).unwrap();
        let view = game.view();
        assert_eq!(view.bank.len(), BANK_SIZE);
        assert_eq!(view.pattern, "_____");
        for c in "MUSIC".chars() {
            assert!(view.bank.contains(&c));
        }
        assert_eq!(game.bank.iter().filter(|t| t.decoy).count(), BANK_SIZE - 5);
    }

    #[test]
    fn test_seeded_banks_repeat() {
        let a = FourPicsGame::new(0, 9).unwrap().view().bank;
        let b = FourPicsGame::new(0, 9).unwrap().view().bank;
        assert_eq!(a, b);
        assert!(FourPicsGame::new(LEVELS.len(), 9).is_err());
    }

    #[test]
    fn test_each_hint_once() {
        let mut game = FourPicsGame::new(0, 1).unwrap();
        for hint in [Hint::RevealLetter, Hint::RemoveDecoys] {
            game.apply_hint(hint).unwrap();
            assert_eq!(game.can_purchase(hint).unwrap_err(), PuzzleError::HintUsed(hint));
            assert_eq!(game.apply_hint(hint).unwrap_err(), PuzzleError::HintUsed(hint));
        }
        let view = game.view();
        assert_eq!(view.pattern.chars().filter(|c| *c != '_').count(), 1);
        assert_eq!(view.bank.len(), 4);
    }

    #[test]
    fn test_reveal_never_repeats_a_position() {
        // position 0 is already shown, so the reveal has to pick another
        for seed in 0..20 {
            let mut game = FourPicsGame::new(7, seed).unwrap();
            game.revealed[0] = true;
            game.apply_hint(Hint::RevealLetter).unwrap();
            assert_eq!(game.revealed.iter().filter(|r| **r).count(), 2, "seed {seed}");
        }
        let mut full = FourPicsGame::new(7, 0).unwrap();
        full.revealed.iter_mut().for_each(|r| *r = true);
        assert_eq!(
            full.can_purchase(Hint::RevealLetter).unwrap_err(),
            PuzzleError::NothingToReveal
        );
    }

    #[test]
    fn test_solve_hint_reveals_everything() {
        let mut game = FourPicsGame::new(8, 5).unwrap();
        game.apply_hint(Hint::Solve).unwrap();
        assert_eq!(game.view().pattern, "SWEET");
        assert!(game.is_solved());
        assert_eq!(game.can_purchase(Hint::RevealLetter).unwrap_err(), PuzzleError::AlreadySolved);
    }

    #[test]
    fn test_guess_is_case_insensitive() {
        let mut game = FourPicsGame::new(1, 5).unwrap();
        assert!(!game.guess("flame").unwrap());
        assert!(game.guess(" fire ").unwrap());
        assert!(game.view().solved);
        assert_eq!(game.guess("fire").unwrap_err(), PuzzleError::AlreadySolved);
    }
}
