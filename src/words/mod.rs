//! Word search: seeded grid generation and the word-goal race between players.

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::util::id::PlayerId;

pub const GRID_SIZE: usize = 10;
const PLACEMENT_ATTEMPTS: usize = 200;

const THEMES: [&[&str]; 3] = [
    &["CHESS", "LUDO", "DICE", "KNIGHT", "QUEEN", "BOARD", "PAWN", "TOKEN"],
    &["TIGER", "EAGLE", "SHARK", "ZEBRA", "PANDA", "OTTER", "CAMEL", "HORSE"],
    &["MANGO", "APPLE", "LEMON", "GRAPE", "PEACH", "MELON", "GUAVA", "BERRY"],
];

const DIRECTIONS: [(i32, i32); 8] = [
    (0, 1), (1, 0), (1, 1), (-1, 1), (0, -1), (-1, 0), (-1, -1), (1, -1),
];

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum WordsError {
    #[error("cell ({0}, {1}) is outside the grid")]
    OutOfBounds(usize, usize),
    #[error("selection is not a straight line")]
    NotALine,
    #[error("no hidden word at that selection")]
    NoWord,
    #[error("{0} was already found")]
    AlreadyFound(String),
    #[error("player is not in this game")]
    NotInGame,
    #[error("game is over")]
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiddenWord {
    pub word: String,
    pub found_by: Option<PlayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WordsFinish {
    WordGoal { winner: PlayerId },
    AllFoundDraw,
    /// Everything found, most finds wins.
    AllFound { winner: PlayerId },
    Forfeit { winner: PlayerId },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordSearch {
    pub rows: Vec<String>,
    pub words: Vec<HiddenWord>,
    pub players: Vec<PlayerId>,
    forfeited: Vec<PlayerId>,
}

impl WordSearch {
    /// Builds a grid from one of the built-in themes, chosen by `seed`.
    pub fn generate(players: Vec<PlayerId>, seed: u64) -> Self {
        let theme = THEMES[(seed % THEMES.len() as u64) as usize];
        Self::with_words(players, theme, seed)
    }

    pub fn with_words(players: Vec<PlayerId>, words: &[&str], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut grid = vec![vec![None::<char>; GRID_SIZE]; GRID_SIZE];
        let mut placed = Vec::new();

        for word in words {
            let word = word.to_ascii_uppercase();
            if place(&mut grid, &word, &mut rng) {
                placed.push(HiddenWord { word, found_by: None });
            } else {
                debug!(%word, "could not place word, dropped from grid");
            }
        }

        let rows = grid
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|c| c.unwrap_or_else(|| rng.gen_range(b'A'..=b'Z') as char))
                    .collect()
            })
            .collect();
        Self { rows, words: placed, players, forfeited: Vec::new() }
    }

    /// Finds needed to win outright.
    pub fn goal(&self) -> usize {
        self.words.len() / 2 + 1
    }

    pub fn score(&self, player: PlayerId) -> usize {
        self.words.iter().filter(|w| w.found_by == Some(player)).count()
    }

    /// Claims the word spelled from `start` to `end`, in either direction.
    pub fn claim(
        &mut self,
        player: PlayerId,
        start: Cell,
        end: Cell,
    ) -> Result<&HiddenWord, WordsError> {
        if self.finish().is_some() {
            return Err(WordsError::GameOver);
        }
        if !self.players.contains(&player) {
            return Err(WordsError::NotInGame);
        }
        let spelled = self.read_line(start, end)?;
        let reversed: String = spelled.chars().rev().collect();
        let idx = self
            .words
            .iter()
            .position(|w| w.word == spelled || w.word == reversed)
            .ok_or(WordsError::NoWord)?;

        let hidden = &mut self.words[idx];
        if hidden.found_by.is_some() {
            return Err(WordsError::AlreadyFound(hidden.word.clone()));
        }
        hidden.found_by = Some(player);
        Ok(&self.words[idx])
    }

    pub fn forfeit(&mut self, player: PlayerId) -> Result<(), WordsError> {
        if self.finish().is_some() {
            return Err(WordsError::GameOver);
        }
        if !self.players.contains(&player) {
            return Err(WordsError::NotInGame);
        }
        self.forfeited.push(player);
        Ok(())
    }

    pub fn finish(&self) -> Option<WordsFinish> {
        let active: Vec<PlayerId> =
            self.players.iter().copied().filter(|p| !self.forfeited.contains(p)).collect();
        if active.len() == 1 && self.players.len() > 1 {
            return Some(WordsFinish::Forfeit { winner: active[0] });
        }
        if let Some(winner) = self.players.iter().copied().find(|p| self.score(*p) >= self.goal()) {
            return Some(WordsFinish::WordGoal { winner });
        }
        if self.words.iter().all(|w| w.found_by.is_some()) {
            let best = self.players.iter().map(|p| self.score(*p)).max().unwrap_or(0);
            let leaders: Vec<PlayerId> =
                self.players.iter().copied().filter(|p| self.score(*p) == best).collect();
            return Some(match leaders[..] {
                [winner] => WordsFinish::AllFound { winner },
                _ => WordsFinish::AllFoundDraw,
            });
        }
        None
    }

    /// Brute-force search for `word`, returning its end cells.
    #[cfg(test)]
    pub(crate) fn locate(&self, word: &str) -> Option<(Cell, Cell)> {
        let n = GRID_SIZE as i32;
        let len = word.len() as i32;
        for r in 0..n {
            for c in 0..n {
                for (dr, dc) in DIRECTIONS {
                    let (er, ec) = (r + dr * (len - 1), c + dc * (len - 1));
                    if !(0..n).contains(&er) || !(0..n).contains(&ec) {
                        continue;
                    }
                    let start = Cell { row: r as usize, col: c as usize };
                    let end = Cell { row: er as usize, col: ec as usize };
                    if self.read_line(start, end).as_deref() == Ok(word) {
                        return Some((start, end));
                    }
                }
            }
        }
        None
    }

    fn read_line(&self, start: Cell, end: Cell) -> Result<String, WordsError> {
        for c in [start, end] {
            if c.row >= self.rows.len() || c.col >= GRID_SIZE {
                return Err(WordsError::OutOfBounds(c.row, c.col));
            }
        }
        let dr = end.row as i32 - start.row as i32;
        let dc = end.col as i32 - start.col as i32;
        if dr != 0 && dc != 0 && dr.abs() != dc.abs() {
            return Err(WordsError::NotALine);
        }
        let len = dr.abs().max(dc.abs()) + 1;
        let (sr, sc) = (dr.signum(), dc.signum());
        Ok((0..len)
            .map(|i| {
                let r = (start.row as i32 + sr * i) as usize;
                let c = (start.col as i32 + sc * i) as usize;
                self.rows[r].as_bytes()[c] as char
            })
            .collect())
    }
}

fn place(grid: &mut [Vec<Option<char>>], word: &str, rng: &mut StdRng) -> bool {
    let letters: Vec<char> = word.chars().collect();
    let n = GRID_SIZE as i32;
    for _ in 0..PLACEMENT_ATTEMPTS {
        let Some(&(dr, dc)) = DIRECTIONS.choose(rng) else { return false };
        let r0 = rng.gen_range(0..n);
        let c0 = rng.gen_range(0..n);
        let cells: Vec<(usize, usize)> = (0..letters.len() as i32)
            .map(|i| (r0 + dr * i, c0 + dc * i))
            .take_while(|(r, c)| (0..n).contains(r) && (0..n).contains(c))
            .map(|(r, c)| (r as usize, c as usize))
            .collect();
        if cells.len() != letters.len() {
            continue;
        }
        let fits = cells
            .iter()
            .zip(&letters)
            .all(|((r, c), l)| grid[*r][*c].map_or(true, |existing| existing == *l));
        if fits {
            for ((r, c), l) in cells.into_iter().zip(&letters) {
                grid[r][c] = Some(*l);
            }
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate(ws: &WordSearch, word: &str) -> (Cell, Cell) {
        ws.locate(word).unwrap_or_else(|| panic!("{word} not in grid"))
    }

    fn game() -> (WordSearch, PlayerId, PlayerId) {
        let (a, b) = (PlayerId::new(), PlayerId::new());
        (WordSearch::generate(vec![a, b], 11), a, b)
    }

    #[test]
    fn test_generation_is_seeded_and_places_words() {
        let (ws, a, b) = game();
        let again = WordSearch::generate(vec![a, b], 11);
        assert_eq!(ws.rows, again.rows);
        assert_eq!(ws.rows.len(), GRID_SIZE);
        assert!(ws.rows.iter().all(|r| r.len() == GRID_SIZE));
        assert!(ws.words.len() >= 6);
        for w in &ws.words {
            locate(&ws, &w.word);
        }
    }

    #[test]
    fn test_claim_forward_and_backward() {
        let (mut ws, a, b) = game();
        let first = ws.words[0].word.clone();
        let (start, end) = locate(&ws, &first);
        assert_eq!(ws.claim(a, end, start).unwrap().found_by, Some(a));
        assert_eq!(ws.claim(b, start, end).unwrap_err(), WordsError::AlreadyFound(first));
        assert_eq!(ws.score(a), 1);
    }

    #[test]
    fn test_bad_selections() {
        let (mut ws, a, _) = game();
        let origin = Cell { row: 0, col: 0 };
        assert_eq!(ws.claim(a, origin, Cell { row: 1, col: 3 }).unwrap_err(), WordsError::NotALine);
        assert_eq!(
            ws.claim(a, origin, Cell { row: 10, col: 0 }).unwrap_err(),
            WordsError::OutOfBounds(10, 0)
        );
        assert_eq!(ws.claim(PlayerId::new(), origin, origin).unwrap_err(), WordsError::NotInGame);
    }

    #[test]
    fn test_word_goal_ends_game() {
        let (mut ws, a, b) = game();
        let words: Vec<String> = ws.words.iter().map(|w| w.word.clone()).collect();
        for word in words.iter().take(ws.goal() - 1) {
            let (s, e) = locate(&ws, word);
            ws.claim(a, s, e).unwrap();
        }
        assert!(ws.finish().is_none());
        let (s, e) = locate(&ws, &words[ws.goal() - 1]);
        ws.claim(a, s, e).unwrap();
        assert_eq!(ws.finish(), Some(WordsFinish::WordGoal { winner: a }));
        let (s, e) = locate(&ws, words.last().unwrap());
        assert_eq!(ws.claim(b, s, e).unwrap_err(), WordsError::GameOver);
    }

    #[test]
    fn test_even_split_is_a_draw() {
        let (a, b) = (PlayerId::new(), PlayerId::new());
        let mut ws = WordSearch::with_words(vec![a, b], &["CAT", "DOG"], 3);
        assert_eq!(ws.goal(), 2);
        let (s, e) = locate(&ws, "CAT");
        ws.claim(a, s, e).unwrap();
        let (s, e) = locate(&ws, "DOG");
        ws.claim(b, s, e).unwrap();
        assert_eq!(ws.finish(), Some(WordsFinish::AllFoundDraw));
    }

    #[test]
    fn test_forfeit_hands_win_to_opponent() {
        let (mut ws, a, b) = game();
        ws.forfeit(a).unwrap();
        assert_eq!(ws.finish(), Some(WordsFinish::Forfeit { winner: b }));
    }
}
