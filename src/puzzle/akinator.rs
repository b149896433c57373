//! Twenty-questions style deduction over a fixed character table.
//!
//! Each question filters the remaining candidates on one boolean attribute.
//! The next question is the unasked attribute that splits the remaining
//! candidates most evenly.

use serde::{Deserialize, Serialize};

use super::PuzzleError;

pub const QUESTION_CAP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    IsReal,
    IsMale,
    IsHuman,
    HasSuperpowers,
    IsAnimated,
    WearsMask,
    IsVillain,
    FromMovie,
    IsAthlete,
    IsMusician,
    WearsGlasses,
    CanFly,
}

impl Attribute {
    pub const ALL: [Attribute; 12] = [
        Attribute::IsReal,
        Attribute::IsMale,
        Attribute::IsHuman,
        Attribute::HasSuperpowers,
        Attribute::IsAnimated,
        Attribute::WearsMask,
        Attribute::IsVillain,
        Attribute::FromMovie,
        Attribute::IsAthlete,
        Attribute::IsMusician,
        Attribute::WearsGlasses,
        Attribute::CanFly,
    ];

    pub fn question(self) -> &'static str {
        match self {
            Attribute::IsReal => "Is your character a real person?",
            Attribute::IsMale => "Is your character male?",
            Attribute::IsHuman => "Is your character human?",
            Attribute::HasSuperpowers => "Does your character have superpowers?",
            Attribute::IsAnimated => "Is your character animated?",
            Attribute::WearsMask => "Does your character wear a mask?",
            Attribute::IsVillain => "Is your character a villain?",
            Attribute::FromMovie => "Is your character known from movies?",
            Attribute::IsAthlete => "Is your character an athlete?",
            Attribute::IsMusician => "Is your character a musician?",
            Attribute::WearsGlasses => "Does your character wear glasses?",
            Attribute::CanFly => "Can your character fly?",
        }
    }
}

pub struct Character {
    pub name: &'static str,
    traits: &'static [Attribute],
}

impl Character {
    pub fn has(&self, attribute: Attribute) -> bool {
        self.traits.contains(&attribute)
    }
}

use Attribute::*;

pub const CHARACTERS: [Character; 15] = [
    Character { name: "Albert Einstein", traits: &[IsReal, IsMale, IsHuman] },
    Character { name: "Cristiano Ronaldo", traits: &[IsReal, IsMale, IsHuman, IsAthlete] },
    Character { name: "Taylor Swift", traits: &[IsReal, IsHuman, IsMusician] },
    Character { name: "Mahatma Gandhi", traits: &[IsReal, IsMale, IsHuman, WearsGlasses] },
    Character { name: "Harry Potter", traits: &[IsMale, IsHuman, FromMovie, WearsGlasses, CanFly] },
    Character {
        name: "Spider-Man",
        traits: &[IsMale, IsHuman, HasSuperpowers, WearsMask, FromMovie],
    },
    Character { name: "Batman", traits: &[IsMale, IsHuman, WearsMask, FromMovie] },
    Character { name: "Mickey Mouse", traits: &[IsMale, IsAnimated] },
    Character { name: "Pikachu", traits: &[HasSuperpowers, IsAnimated] },
    Character { name: "Sherlock Holmes", traits: &[IsMale, IsHuman] },
    Character { name: "Elsa", traits: &[IsHuman, HasSuperpowers, IsAnimated, FromMovie] },
    Character { name: "Mario", traits: &[IsMale, IsHuman, IsAnimated] },
    Character { name: "Superman", traits: &[IsMale, HasSuperpowers, FromMovie, CanFly] },
    Character {
        name: "Darth Vader",
        traits: &[IsMale, IsHuman, HasSuperpowers, WearsMask, IsVillain, FromMovie],
    },
    Character { name: "Shrek", traits: &[IsMale, IsAnimated, FromMovie] },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
    DontKnow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Asking(Attribute),
    /// Index into `CHARACTERS`.
    Guessing(usize),
    Won(usize),
    Failed,
}

/// Client view of a run.
#[derive(Debug, Clone, Serialize)]
pub struct AkinatorView {
    pub status: &'static str,
    pub attribute: Option<Attribute>,
    pub question: Option<&'static str>,
    pub guess: Option<&'static str>,
    pub questions_asked: usize,
    pub remaining: usize,
}

#[derive(Debug, Clone)]
pub struct AkinatorGame {
    remaining: Vec<usize>,
    asked: Vec<Attribute>,
    questions_asked: usize,
    status: Status,
}

impl AkinatorGame {
    pub fn new() -> Self {
        let mut game = Self {
            remaining: (0..CHARACTERS.len()).collect(),
            asked: Vec::new(),
            questions_asked: 0,
            status: Status::Failed,
        };
        game.advance();
        game
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn candidates(&self) -> Vec<&'static str> {
        self.remaining.iter().map(|i| CHARACTERS[*i].name).collect()
    }

    /// `|true − false|` over the remaining candidates.
    pub fn imbalance(&self, attribute: Attribute) -> usize {
        let yes = self.remaining.iter().filter(|i| CHARACTERS[**i].has(attribute)).count();
        yes.abs_diff(self.remaining.len() - yes)
    }

    /// The unasked attribute with the smallest imbalance that still splits the
    /// candidates. Ties go to the earlier attribute.
    pub fn next_question(&self) -> Option<Attribute> {
        Attribute::ALL
            .iter()
            .copied()
            .filter(|a| !self.asked.contains(a))
            .filter(|a| self.imbalance(*a) < self.remaining.len())
            .min_by_key(|a| self.imbalance(*a))
    }

    pub fn answer(&mut self, answer: Answer) -> Result<Status, PuzzleError> {
        let Status::Asking(attribute) = self.status else {
            return Err(PuzzleError::NotAsking);
        };
        self.asked.push(attribute);
        self.questions_asked += 1;
        match answer {
            Answer::Yes => self.remaining.retain(|i| CHARACTERS[*i].has(attribute)),
            Answer::No => self.remaining.retain(|i| !CHARACTERS[*i].has(attribute)),
            Answer::DontKnow => {}
        }
        self.advance();
        Ok(self.status)
    }

    /// Player's verdict on the current guess. A wrong guess drops the
    /// candidate and counts against the question cap.
    pub fn confirm(&mut self, correct: bool) -> Result<Status, PuzzleError> {
        let Status::Guessing(idx) = self.status else {
            return Err(PuzzleError::NotGuessing);
        };
        if correct {
            self.status = Status::Won(idx);
        } else {
            self.remaining.retain(|i| *i != idx);
            self.questions_asked += 1;
            self.advance();
        }
        Ok(self.status)
    }

    pub fn view(&self) -> AkinatorView {
        let (status, attribute, guess) = match self.status {
            Status::Asking(a) => ("asking", Some(a), None),
            Status::Guessing(i) => ("guessing", None, Some(CHARACTERS[i].name)),
            Status::Won(i) => ("won", None, Some(CHARACTERS[i].name)),
            Status::Failed => ("failed", None, None),
        };
        AkinatorView {
            status,
            attribute,
            question: attribute.map(Attribute::question),
            guess,
            questions_asked: self.questions_asked,
            remaining: self.remaining.len(),
        }
    }

    fn advance(&mut self) {
        self.status = match self.remaining[..] {
            [] => Status::Failed,
            [only] => Status::Guessing(only),
            _ if self.questions_asked >= QUESTION_CAP => Status::Failed,
            [first, ..] => match self.next_question() {
                Some(a) => Status::Asking(a),
                None => Status::Guessing(first),
            },
        };
    }
}

impl Default for AkinatorGame {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    /// Answers every question truthfully for `name`.
    fn play_as(name: &str) -> AkinatorGame {
        let target = CHARACTERS.iter().find(|c| c.name == name).unwrap();
        let mut game = AkinatorGame::new();
        while let Status::Asking(a) = game.status() {
            let before = game.remaining.len();
            let answer = if target.has(a) { Answer::Yes } else { Answer::No };
            game.answer(answer).unwrap();
            assert!(game.remaining.len() <= before);
        }
        game
    }

    #[test]
    fn test_dataset_shape() {
        let real = CHARACTERS.iter().filter(|c| c.has(IsReal)).count();
        assert_eq!((real, CHARACTERS.len() - real), (4, 11));
        let vectors: HashSet<Vec<bool>> = CHARACTERS
            .iter()
            .map(|c| Attribute::ALL.iter().map(|a| c.has(*a)).collect())
            .collect();
        assert_eq!(vectors.len(), CHARACTERS.len(), "two characters are indistinguishable");
    }

    #[test]
    fn test_first_question_is_the_most_balanced() {
        let game = AkinatorGame::new();
        let Status::Asking(first) = game.status() else { panic!("should ask first") };
        let best = Attribute::ALL.iter().map(|a| game.imbalance(*a)).min().unwrap();
        assert_eq!(game.imbalance(first), best);
        assert!(game.imbalance(first) <= game.imbalance(IsReal));
        assert_eq!(game.imbalance(IsReal), 7);
    }

    #[test]
    fn test_every_character_is_found_within_the_cap() {
        for c in &CHARACTERS {
            let mut game = play_as(c.name);
            assert!(game.questions_asked <= QUESTION_CAP);
            let index = CHARACTERS.iter().position(|x| x.name == c.name).unwrap();
            assert_eq!(game.status(), Status::Guessing(index));
            assert_eq!(game.view().guess, Some(c.name));
            assert!(matches!(game.confirm(true).unwrap(), Status::Won(_)));
        }
    }

    #[test]
    fn test_dont_know_keeps_candidates() {
        let mut game = AkinatorGame::new();
        game.answer(Answer::DontKnow).unwrap();
        assert_eq!(game.remaining.len(), CHARACTERS.len());
        assert_eq!(game.questions_asked, 1);
    }

    #[test]
    fn test_first_question_splits_on_movies() {
        let mut game = AkinatorGame::new();
        assert_eq!(game.status(), Status::Asking(FromMovie));
        game.answer(Answer::No).unwrap();
        // Real is now a 4/4 split
        assert_eq!(game.status(), Status::Asking(IsReal));
        assert!(!game.candidates().contains(&"Shrek"));
    }

    #[test]
    fn test_rejecting_last_candidate_fails() {
        let mut game = play_as("Pikachu");
        assert_eq!(game.confirm(false).unwrap(), Status::Failed);
        assert!(game.candidates().is_empty());
        assert_eq!(game.view().status, "failed");
    }

    #[test]
    fn test_cap_is_enforced() {
        let mut game = AkinatorGame::new();
        let mut rounds = 0;
        while let Status::Asking(_) = game.status() {
            game.answer(Answer::DontKnow).unwrap();
            rounds += 1;
        }
        // every attribute gets asked once, then the best remaining guess is offered
        assert!(rounds <= QUESTION_CAP);
        assert_eq!(rounds, Attribute::ALL.len());
        assert!(matches!(game.status(), Status::Guessing(_)));

        // rejecting guesses eventually hits the cap
        while let Status::Guessing(_) = game.status() {
            game.confirm(false).unwrap();
        }
        assert_eq!(game.status(), Status::Failed);
        assert!(game.questions_asked <= QUESTION_CAP);
    }

    #[test]
    fn test_wrong_state_errors() {
        let mut game = AkinatorGame::new();
        assert_eq!(game.confirm(true).unwrap_err(), PuzzleError::NotGuessing);
        let mut done = play_as("Shrek");
        assert_eq!(done.answer(Answer::Yes).unwrap_err(), PuzzleError::NotAsking);
    }
}
