//! In-memory registry of puzzle runs, pruned by idle time.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use tracing::{debug, info};

use super::akinator::{AkinatorGame, AkinatorView, Answer};
use super::fourpics::{FourPicsGame, FourPicsView, Hint, LEVELS, SOLVE_REWARD};
use super::PuzzleError;
use crate::util::id::{new_run_id, PlayerId};
use crate::wallet::{Currency, Ledger, TxKind};

enum Game {
    Akinator(AkinatorGame),
    FourPics(FourPicsGame),
}

struct Run {
    owner: PlayerId,
    game: Game,
    touched_at: SystemTime,
}

#[derive(Clone)]
pub struct PuzzleStore {
    runs: Arc<DashMap<String, Run>>,
    ledger: Ledger,
}

impl PuzzleStore {
    pub fn new(ledger: Ledger) -> Self {
        Self { runs: Arc::new(DashMap::new()), ledger }
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn start_akinator(&self, owner: PlayerId) -> (String, AkinatorView) {
        let game = AkinatorGame::new();
        let view = game.view();
        let id = self.insert(owner, Game::Akinator(game));
        (id, view)
    }

    pub fn answer_akinator(
        &self,
        id: &str,
        player: PlayerId,
        answer: Answer,
    ) -> Result<AkinatorView, PuzzleError> {
        self.with_akinator(id, player, |game| {
            game.answer(answer)?;
            Ok(game.view())
        })
    }

    pub fn confirm_akinator(
        &self,
        id: &str,
        player: PlayerId,
        correct: bool,
    ) -> Result<AkinatorView, PuzzleError> {
        self.with_akinator(id, player, |game| {
            game.confirm(correct)?;
            Ok(game.view())
        })
    }

    /// Starts a FourPics run on `level`, or a random level when none is given.
    pub fn start_fourpics(
        &self,
        owner: PlayerId,
        level: Option<usize>,
    ) -> Result<(String, FourPicsView), PuzzleError> {
        let level = level.unwrap_or_else(|| rand::random::<usize>() % LEVELS.len());
        let game = FourPicsGame::new(level, rand::random())?;
        let view = game.view();
        let id = self.insert(owner, Game::FourPics(game));
        Ok((id, view))
    }

    /// Debits the hint's coin cost, then applies it. A failed debit leaves the
    /// level untouched.
    pub fn buy_hint(
        &self,
        id: &str,
        player: PlayerId,
        hint: Hint,
    ) -> Result<FourPicsView, PuzzleError> {
        let ledger = self.ledger.clone();
        self.with_fourpics(id, player, |game| {
            game.can_purchase(hint)?;
            let reference = Some(id.to_string());
            ledger.debit(player, Currency::Coins, hint.cost(), TxKind::HintPurchase, reference)?;
            game.apply_hint(hint)?;
            info!(run_id = id, %player, ?hint, cost = hint.cost(), "hint purchased");
            Ok(game.view())
        })
    }

    /// Returns whether the guess was right. A right guess credits the reward.
    pub fn guess(
        &self,
        id: &str,
        player: PlayerId,
        word: &str,
    ) -> Result<(bool, FourPicsView), PuzzleError> {
        let ledger = self.ledger.clone();
        self.with_fourpics(id, player, |game| {
            let correct = game.guess(word)?;
            if correct {
                let reference = Some(id.to_string());
                let kind = TxKind::PuzzleReward;
                ledger.credit(player, Currency::Coins, SOLVE_REWARD, kind, reference)?;
                info!(run_id = id, %player, "level solved");
            }
            Ok((correct, game.view()))
        })
    }

    /// Drops runs idle for longer than `max_age`. Returns how many went.
    pub fn prune_old(&self, max_age: Duration) -> usize {
        let now = SystemTime::now();
        let before = self.runs.len();
        self.runs
            .retain(|_, r| now.duration_since(r.touched_at).unwrap_or_default() < max_age);
        let pruned = before.saturating_sub(self.runs.len());
        if pruned > 0 {
            debug!(pruned, "pruned idle puzzle runs");
        }
        pruned
    }

    fn insert(&self, owner: PlayerId, game: Game) -> String {
        let id = new_run_id();
        self.runs.insert(id.clone(), Run { owner, game, touched_at: SystemTime::now() });
        id
    }

    fn with_run<T>(
        &self,
        id: &str,
        player: PlayerId,
        f: impl FnOnce(&mut Game) -> Result<T, PuzzleError>,
    ) -> Result<T, PuzzleError> {
        let mut run = self.runs.get_mut(id).ok_or(PuzzleError::NotFound)?;
        if run.owner != player {
            return Err(PuzzleError::NotOwner);
        }
        run.touched_at = SystemTime::now();
        f(&mut run.game)
    }

    fn with_akinator<T>(
        &self,
        id: &str,
        player: PlayerId,
        f: impl FnOnce(&mut AkinatorGame) -> Result<T, PuzzleError>,
    ) -> Result<T, PuzzleError> {
        self.with_run(id, player, |game| match game {
            Game::Akinator(g) => f(g),
            Game::FourPics(_) => Err(PuzzleError::WrongKind),
        })
    }

    fn with_fourpics<T>(
        &self,
        id: &str,
        player: PlayerId,
        f: impl FnOnce(&mut FourPicsGame) -> Result<T, PuzzleError>,
    ) -> Result<T, PuzzleError> {
        self.with_run(id, player, |game| match game {
            Game::FourPics(g) => f(g),
            Game::Akinator(_) => Err(PuzzleError::WrongKind),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::WalletError;

    fn store() -> (PuzzleStore, Ledger, PlayerId) {
        let ledger = Ledger::new();
        (PuzzleStore::new(ledger.clone()), ledger, PlayerId::new())
    }

    #[test]
    fn test_hint_is_paid_before_applied() {
        let (store, ledger, p) = store();
        let (id, _) = store.start_fourpics(p, Some(0)).unwrap();

        let err = store.buy_hint(&id, p, Hint::RevealLetter).unwrap_err();
        assert!(matches!(err, PuzzleError::Wallet(WalletError::InsufficientBalance { .. })));
        // nothing revealed when the debit failed, so the hint is still available
        ledger.deposit(p, Currency::Coins, 100).unwrap();
        let view = store.buy_hint(&id, p, Hint::RevealLetter).unwrap();
        assert_eq!(view.pattern.chars().filter(|c| *c != '_').count(), 1);
        assert_eq!(ledger.balance(p, Currency::Coins), 100 - Hint::RevealLetter.cost());

        // a second purchase is refused without charging
        assert_eq!(
            store.buy_hint(&id, p, Hint::RevealLetter).unwrap_err(),
            PuzzleError::HintUsed(Hint::RevealLetter)
        );
        assert_eq!(ledger.balance(p, Currency::Coins), 80);
        assert_eq!(ledger.latest(p, Currency::Coins).unwrap().kind, TxKind::HintPurchase);
    }

    #[test]
    fn test_correct_guess_credits_reward() {
        let (store, ledger, p) = store();
        let (id, _) = store.start_fourpics(p, Some(6)).unwrap();
        let (correct, _) = store.guess(&id, p, "clock").unwrap();
        assert!(!correct);
        let (correct, view) = store.guess(&id, p, "Time").unwrap();
        assert!(correct && view.solved);
        assert_eq!(ledger.balance(p, Currency::Coins), SOLVE_REWARD);
    }

    #[test]
    fn test_runs_are_private_and_typed() {
        let (store, _, p) = store();
        let (aki, _) = store.start_akinator(p);
        assert_eq!(
            store.answer_akinator(&aki, PlayerId::new(), Answer::Yes).unwrap_err(),
            PuzzleError::NotOwner
        );
        assert_eq!(store.guess(&aki, p, "rain").unwrap_err(), PuzzleError::WrongKind);
        assert_eq!(store.confirm_akinator("nope", p, true).unwrap_err(), PuzzleError::NotFound);
        let view = store.answer_akinator(&aki, p, Answer::No).unwrap();
        assert_eq!(view.questions_asked, 1);
    }

    #[test]
    fn test_akinator_through_store() {
        let (store, _, p) = store();
        let (id, view) = store.start_akinator(p);
        assert_eq!(view.status, "asking");
        let mut view = view;
        while view.status == "asking" {
            view = store.answer_akinator(&id, p, Answer::No).unwrap();
        }
        assert_eq!(view.status, "guessing");
        let done = store.confirm_akinator(&id, p, true).unwrap();
        assert_eq!(done.status, "won");
    }

    #[test]
    fn test_prune_old() {
        let (store, _, p) = store();
        store.start_akinator(p);
        store.start_fourpics(p, None).unwrap();
        assert_eq!(store.prune_old(Duration::from_secs(60)), 0);
        assert_eq!(store.len(), 2);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.prune_old(Duration::from_millis(1)), 2);
        assert!(store.is_empty());
    }
}
