//! Registry of live sessions.
//!
//! Each session sits behind its own mutex with a broadcast channel beside it.
//! Every mutation runs under that lock, bumps the version, settles the session
//! if it just ended, and publishes the new snapshot before the lock is
//! released, so subscribers see versions in order. Lock order is always
//! session, then ledger.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::model::{GameBoard, GameKind, GameOutcome, GameSession, SessionStatus};
use super::presence::{PresenceState, PresenceTracker};
use super::SessionError;
use crate::chess::{LegalMove, MoveRecord};
use crate::ludo::{Color, Coord, LudoEvent};
use crate::util::id::{new_session_id, PlayerId};
use crate::wallet::{checked_pool, Ledger, WalletError};
use crate::words::{Cell, HiddenWord};

const CHANNEL_CAPACITY: usize = 32;
/// Completed and cancelled sessions are kept this long for late readers.
pub const FINISHED_RETENTION: Duration = Duration::from_secs(3600);

struct SessionEntry {
    session: Mutex<GameSession>,
    changes: broadcast::Sender<GameSession>,
    finished_at: Mutex<Option<Instant>>,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Arc<SessionEntry>>>,
    ledger: Ledger,
    presence: PresenceTracker,
    rake_percent: u8,
}

fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

impl SessionStore {
    pub fn new(ledger: Ledger, presence: PresenceTracker, rake_percent: u8) -> Self {
        Self { sessions: Arc::new(DashMap::new()), ledger, presence, rake_percent }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Opens a waiting session with the creator in the first seat. The
    /// creator's entry fee is taken first; if that fails nothing is created.
    pub fn create(
        &self,
        creator: PlayerId,
        kind: GameKind,
        capacity: Option<usize>,
        entry_fee: u64,
    ) -> Result<GameSession, SessionError> {
        let capacity = kind.capacity(capacity)?;
        // a full table must still settle in one posting
        checked_pool(entry_fee, capacity)?;
        let id = new_session_id();
        self.ledger.collect_entry_fee(creator, entry_fee, &id)?;

        let now = now_unix();
        let session = GameSession {
            id: id.clone(),
            kind,
            status: SessionStatus::Waiting,
            players: vec![creator],
            capacity,
            creator,
            entry_fee,
            prize_pool: entry_fee,
            version: 1,
            board: None,
            outcome: None,
            settlement: None,
            created_at: now,
            updated_at: now,
            seed: rand::random(),
        };
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        let entry = SessionEntry {
            session: Mutex::new(session.clone()),
            changes,
            finished_at: Mutex::new(None),
        };
        self.sessions.insert(id.clone(), Arc::new(entry));
        info!(session_id = %id, %kind, %creator, entry_fee, capacity, "session created");
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Result<GameSession, SessionError> {
        Ok(self.entry(id)?.session.lock().clone())
    }

    /// Current snapshot plus a receiver for every later one.
    pub fn subscribe(
        &self,
        id: &str,
    ) -> Result<(GameSession, broadcast::Receiver<GameSession>), SessionError> {
        let entry = self.entry(id)?;
        let session = entry.session.lock();
        Ok((session.clone(), entry.changes.subscribe()))
    }

    /// Takes a seat and the entry fee. Filling the last seat of a fixed-size
    /// game starts it.
    pub fn join(&self, id: &str, player: PlayerId) -> Result<GameSession, SessionError> {
        let (_, session) = self.mutate(id, None, |s| {
            s.ensure_status(SessionStatus::Waiting)?;
            if s.is_seated(player) {
                return Err(SessionError::AlreadyJoined);
            }
            if s.players.len() >= s.capacity {
                return Err(SessionError::Full);
            }
            let pool = s.prize_pool.checked_add(s.entry_fee).ok_or(WalletError::PoolOverflow)?;
            self.ledger.collect_entry_fee(player, s.entry_fee, &s.id)?;
            s.players.push(player);
            s.prize_pool = pool;
            info!(session_id = %s.id, %player, seats = s.players.len(), "player joined");
            if s.players.len() == s.capacity {
                self.activate(s)?;
            }
            Ok(())
        })?;
        Ok(session)
    }

    /// Starts a ludo table early. Only the creator may, with two or more seated.
    pub fn start(&self, id: &str, player: PlayerId) -> Result<GameSession, SessionError> {
        let (_, session) = self.mutate(id, None, |s| {
            s.ensure_status(SessionStatus::Waiting)?;
            if s.kind != GameKind::Ludo {
                return Err(SessionError::WrongKind(s.kind));
            }
            if s.creator != player {
                return Err(SessionError::NotCreator);
            }
            if s.players.len() < 2 {
                return Err(SessionError::NotEnoughPlayers);
            }
            self.activate(s)
        })?;
        Ok(session)
    }

    /// Cancels a waiting session and refunds every entry fee.
    pub fn cancel(&self, id: &str, player: PlayerId) -> Result<GameSession, SessionError> {
        let (_, session) = self.mutate(id, None, |s| {
            s.ensure_status(SessionStatus::Waiting)?;
            if s.creator != player {
                return Err(SessionError::NotCreator);
            }
            s.status = SessionStatus::Cancelled;
            s.outcome = Some(GameOutcome::Cancelled);
            info!(session_id = %s.id, "session cancelled");
            Ok(())
        })?;
        Ok(session)
    }

    /// Records a heartbeat and returns every seat's presence. Finished
    /// sessions take no heartbeats.
    pub fn heartbeat(
        &self,
        id: &str,
        player: PlayerId,
    ) -> Result<Vec<(PlayerId, PresenceState)>, SessionError> {
        let entry = self.entry(id)?;
        let session = entry.session.lock();
        if !session.is_seated(player) {
            return Err(SessionError::NotSeated);
        }
        if session.is_terminal() {
            return Err(SessionError::InvalidStatus(session.status));
        }
        self.presence.heartbeat(id, player);
        let now = Instant::now();
        Ok(session
            .players
            .iter()
            .map(|p| (*p, self.presence.evaluate(id, *p, now)))
            .collect())
    }

    pub fn chess_move(
        &self,
        id: &str,
        player: PlayerId,
        uci: &str,
        expected_version: Option<u64>,
    ) -> Result<(MoveRecord, GameSession), SessionError> {
        self.mutate(id, expected_version, |s| Ok(s.chess_mut()?.submit_move(player, uci)?))
    }

    pub fn chess_resign(
        &self,
        id: &str,
        player: PlayerId,
        expected_version: Option<u64>,
    ) -> Result<GameSession, SessionError> {
        let (_, session) =
            self.mutate(id, expected_version, |s| Ok(s.chess_mut()?.resign(player)?))?;
        Ok(session)
    }

    /// Claims a fifty-move draw for either seated player.
    pub fn chess_claim_draw(
        &self,
        id: &str,
        player: PlayerId,
        expected_version: Option<u64>,
    ) -> Result<GameSession, SessionError> {
        let (_, session) =
            self.mutate(id, expected_version, |s| Ok(s.chess_mut()?.claim_draw(player)?))?;
        Ok(session)
    }

    pub fn chess_legal_moves(&self, id: &str) -> Result<Vec<LegalMove>, SessionError> {
        let session = self.get(id)?;
        match &session.board {
            Some(GameBoard::Chess(board)) => Ok(board.legal_moves()?),
            Some(_) => Err(SessionError::WrongKind(session.kind)),
            None => Err(SessionError::InvalidStatus(session.status)),
        }
    }

    /// Board coordinates of every ludo piece still in play.
    pub fn ludo_cells(&self, id: &str) -> Result<Vec<(Color, usize, Coord)>, SessionError> {
        let session = self.get(id)?;
        match &session.board {
            Some(GameBoard::Ludo(game)) => Ok(game.cells()),
            Some(_) => Err(SessionError::WrongKind(session.kind)),
            None => Err(SessionError::InvalidStatus(session.status)),
        }
    }

    pub fn ludo_roll(
        &self,
        id: &str,
        player: PlayerId,
        expected_version: Option<u64>,
    ) -> Result<(LudoEvent, GameSession), SessionError> {
        self.mutate(id, expected_version, |s| {
            Ok(s.ludo_mut()?.roll(player, &mut rand::thread_rng())?)
        })
    }

    pub fn ludo_move(
        &self,
        id: &str,
        player: PlayerId,
        piece: usize,
        expected_version: Option<u64>,
    ) -> Result<(LudoEvent, GameSession), SessionError> {
        self.mutate(id, expected_version, |s| Ok(s.ludo_mut()?.move_piece(player, piece)?))
    }

    pub fn words_claim(
        &self,
        id: &str,
        player: PlayerId,
        start: Cell,
        end: Cell,
        expected_version: Option<u64>,
    ) -> Result<(HiddenWord, GameSession), SessionError> {
        self.mutate(id, expected_version, |s| Ok(s.words_mut()?.claim(player, start, end)?.clone()))
    }

    /// Forfeits an absent player in an active session.
    pub fn forfeit(&self, id: &str, player: PlayerId) -> Result<GameSession, SessionError> {
        let (_, session) = self.mutate(id, None, |s| {
            s.ensure_status(SessionStatus::Active)?;
            if !s.is_seated(player) {
                return Err(SessionError::NotSeated);
            }
            s.board
                .as_mut()
                .ok_or(SessionError::InvalidStatus(s.status))?
                .forfeit(player)?;
            warn!(session_id = %s.id, %player, "player forfeited for absence");
            Ok(())
        })?;
        self.presence.forget(id, player);
        Ok(session)
    }

    /// Forfeits every player in an active session whose absence reached the
    /// final deadline. Returns who was forfeited.
    pub fn sweep_presence(&self, now: Instant) -> Vec<(String, PlayerId)> {
        let entries: Vec<Arc<SessionEntry>> =
            self.sessions.iter().map(|e| Arc::clone(e.value())).collect();
        let mut forfeited = Vec::new();
        for entry in entries {
            let (id, absent) = {
                let session = entry.session.lock();
                if session.status != SessionStatus::Active {
                    continue;
                }
                let Some(board) = &session.board else { continue };
                let mut absent = Vec::new();
                for player in board.active_players() {
                    match self.presence.evaluate(&session.id, player, now) {
                        PresenceState::Forfeit => absent.push(player),
                        PresenceState::Warned => {
                            debug!(session_id = %session.id, %player, "player warned")
                        }
                        PresenceState::Away | PresenceState::Online => {}
                    }
                }
                (session.id.clone(), absent)
            };
            for player in absent {
                match self.forfeit(&id, player) {
                    Ok(_) => forfeited.push((id.clone(), player)),
                    // an earlier forfeit in this sweep may have ended the game
                    Err(e) => debug!(session_id = %id, %player, error = %e, "forfeit skipped"),
                }
            }
        }
        forfeited
    }

    /// Retries settlement for finished sessions whose payout failed earlier.
    /// Returns how many settled now.
    pub fn settle_pending(&self) -> usize {
        let entries: Vec<Arc<SessionEntry>> =
            self.sessions.iter().map(|e| Arc::clone(e.value())).collect();
        let mut settled = 0;
        for entry in entries {
            let mut session = entry.session.lock();
            if !session.is_terminal() || session.settlement.is_some() {
                continue;
            }
            if self.settle(&entry, &mut session) {
                session.version += 1;
                session.updated_at = now_unix();
                let _ = entry.changes.send(session.clone());
                settled += 1;
            }
        }
        settled
    }

    /// Drops sessions that settled more than `max_age` ago, with their
    /// presence records. Unsettled sessions are kept.
    pub fn prune_finished(&self, max_age: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|id, entry| {
            let keep = entry.finished_at.lock().map_or(true, |at| at.elapsed() < max_age);
            if !keep {
                self.presence.forget_session(id);
            }
            keep
        });
        before.saturating_sub(self.sessions.len())
    }

    fn entry(&self, id: &str) -> Result<Arc<SessionEntry>, SessionError> {
        self.sessions
            .get(id)
            .map(|e| Arc::clone(e.value()))
            .ok_or(SessionError::NotFound)
    }

    /// Deals the board, marks the session active and starts presence clocks.
    fn activate(&self, s: &mut GameSession) -> Result<(), SessionError> {
        s.board = Some(GameBoard::new(s.kind, &s.players, s.seed)?);
        s.status = SessionStatus::Active;
        for player in &s.players {
            self.presence.heartbeat(&s.id, *player);
        }
        info!(session_id = %s.id, kind = %s.kind, players = s.players.len(), "session active");
        Ok(())
    }

    /// Runs `f` under the session lock, then bumps the version, completes and
    /// settles the session if the board reached an end, and publishes.
    fn mutate<T>(
        &self,
        id: &str,
        expected_version: Option<u64>,
        f: impl FnOnce(&mut GameSession) -> Result<T, SessionError>,
    ) -> Result<(T, GameSession), SessionError> {
        let entry = self.entry(id)?;
        let mut session = entry.session.lock();
        if let Some(given) = expected_version {
            if given != session.version {
                return Err(SessionError::StaleVersion { given, current: session.version });
            }
        }

        let out = f(&mut session)?;
        session.version += 1;
        session.updated_at = now_unix();

        if session.status == SessionStatus::Active {
            if let Some(outcome) = session.board.as_ref().and_then(GameBoard::outcome) {
                session.status = SessionStatus::Completed;
                session.outcome = Some(outcome);
                info!(session_id = %session.id, ?outcome, "session completed");
            }
        }
        if session.is_terminal() && session.settlement.is_none() {
            self.presence.forget_session(&session.id);
            self.settle(&entry, &mut session);
        }

        let snapshot = session.clone();
        // no receivers is fine
        let _ = entry.changes.send(snapshot.clone());
        Ok((out, snapshot))
    }

    /// Pays out a terminal session. On failure the session stays unsettled
    /// and unprunable so the sweeper can retry it.
    fn settle(&self, entry: &SessionEntry, session: &mut GameSession) -> bool {
        let Some(outcome) = session.outcome else { return false };
        let stakes = session.stakes();
        match self.ledger.settle(&session.id, outcome.settlement(), &stakes, self.rake_percent) {
            Ok(receipt) => {
                session.settlement = Some(receipt);
                *entry.finished_at.lock() = Some(Instant::now());
                true
            }
            Err(e) => {
                error!(session_id = %session.id, error = %e, "settlement failed, will retry");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::ChessError;
    use crate::session::model::EndReason;
    use crate::session::presence::PresencePolicy;
    use crate::wallet::{Currency, WalletError, MAX_POOL};
    use crate::words::WordSearch;

    fn store() -> (SessionStore, Ledger) {
        let ledger = Ledger::new();
        let presence = PresenceTracker::new(PresencePolicy::default());
        let store = SessionStore::new(ledger.clone(), presence, 10);
        (store, ledger)
    }

    fn funded(ledger: &Ledger) -> PlayerId {
        let p = PlayerId::new();
        ledger.deposit(p, Currency::Cash, 1_000).unwrap();
        p
    }

    fn with_session<T>(store: &SessionStore, id: &str, f: impl FnOnce(&mut GameSession) -> T) -> T {
        let entry = store.entry(id).unwrap();
        let mut session = entry.session.lock();
        f(&mut session)
    }

    /// A started word search whose grid hides exactly `words`.
    fn word_game(
        store: &SessionStore,
        ledger: &Ledger,
        words: &[&str],
    ) -> (String, PlayerId, PlayerId) {
        let (a, b) = (funded(ledger), funded(ledger));
        let s = store.create(a, GameKind::WordSearch, None, 100).unwrap();
        store.join(&s.id, b).unwrap();
        with_session(store, &s.id, |s| {
            let grid = WordSearch::with_words(s.players.clone(), words, 5);
            s.board = Some(GameBoard::WordSearch(grid));
        });
        (s.id, a, b)
    }

    fn claim(store: &SessionStore, id: &str, player: PlayerId, word: &str) -> GameSession {
        let (start, end) =
            with_session(store, id, |s| s.words_mut().unwrap().locate(word)).unwrap();
        let (found, session) = store.words_claim(id, player, start, end, None).unwrap();
        assert_eq!(found.word, word);
        session
    }

    fn chess_game(store: &SessionStore, ledger: &Ledger) -> (String, PlayerId, PlayerId) {
        let (w, b) = (funded(ledger), funded(ledger));
        let s = store.create(w, GameKind::Chess, None, 100).unwrap();
        store.join(&s.id, b).unwrap();
        (s.id, w, b)
    }

    #[test]
    fn test_join_fills_and_activates() {
        let (store, ledger) = store();
        let (id, w, b) = chess_game(&store, &ledger);
        let s = store.get(&id).unwrap();
        assert_eq!(s.status, SessionStatus::Active);
        assert_eq!(s.players, vec![w, b]);
        assert_eq!(s.prize_pool, 200);
        assert_eq!(s.version, 2);
        assert_eq!(ledger.balance(b, Currency::Cash), 900);
        assert_eq!(
            store.join(&id, funded(&ledger)).unwrap_err(),
            SessionError::InvalidStatus(SessionStatus::Active)
        );
    }

    #[test]
    fn test_failed_debit_rejects_join() {
        let (store, ledger) = store();
        let creator = funded(&ledger);
        let s = store.create(creator, GameKind::WordSearch, None, 100).unwrap();
        let broke = PlayerId::new();
        assert!(matches!(
            store.join(&s.id, broke).unwrap_err(),
            SessionError::Wallet(WalletError::InsufficientBalance { .. })
        ));
        let after = store.get(&s.id).unwrap();
        assert_eq!(after.players, vec![creator]);
        assert_eq!(after.version, 1);
        assert_eq!(store.join(&s.id, creator).unwrap_err(), SessionError::AlreadyJoined);
        assert!(store.create(broke, GameKind::Chess, None, 5).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_stale_version_is_rejected() {
        let (store, ledger) = store();
        let (id, w, b) = chess_game(&store, &ledger);
        let (rec, s) = store.chess_move(&id, w, "e2e4", Some(2)).unwrap();
        assert_eq!(rec.san, "e4");
        assert_eq!(s.version, 3);
        assert_eq!(
            store.chess_move(&id, b, "e7e5", Some(2)).unwrap_err(),
            SessionError::StaleVersion { given: 2, current: 3 }
        );
        assert_eq!(
            store.chess_move(&id, w, "d2d4", Some(3)).unwrap_err(),
            SessionError::Chess(ChessError::NotYourTurn)
        );
        store.chess_move(&id, b, "e7e5", Some(3)).unwrap();
    }

    #[test]
    fn test_checkmate_settles_once_for_the_mating_player() {
        let (store, ledger) = store();
        let (id, w, b) = chess_game(&store, &ledger);
        for (p, m) in [(w, "f2f3"), (b, "e7e5"), (w, "g2g4")] {
            store.chess_move(&id, p, m, None).unwrap();
        }
        let (_, s) = store.chess_move(&id, b, "d8h4", None).unwrap();
        assert_eq!(s.status, SessionStatus::Completed);
        let mated = GameOutcome::Winner { player: b, reason: EndReason::Checkmate };
        assert_eq!(s.outcome, Some(mated));
        let receipt = s.settlement.unwrap();
        assert_eq!((receipt.pool, receipt.rake), (180, 20));
        assert_eq!(ledger.balance(b, Currency::Cash), 1_080);
        assert_eq!(ledger.balance(w, Currency::Cash), 900);
        assert_eq!(ledger.profile(b).wins, 1);
        assert_eq!(ledger.profile(w).losses, 1);

        assert_eq!(
            store.chess_resign(&id, w, None).unwrap_err(),
            SessionError::InvalidStatus(SessionStatus::Completed)
        );
        assert_eq!(ledger.balance(b, Currency::Cash), 1_080);
    }

    #[test]
    fn test_resign_hands_win_to_opponent() {
        let (store, ledger) = store();
        let (id, w, b) = chess_game(&store, &ledger);
        let s = store.chess_resign(&id, b, None).unwrap();
        assert!(matches!(s.outcome, Some(GameOutcome::Winner { player, .. }) if player == w));
        assert!(store.chess_legal_moves(&id).unwrap().is_empty());
    }

    #[test]
    fn test_cancel_refunds() {
        let (store, ledger) = store();
        let (creator, other) = (funded(&ledger), funded(&ledger));
        let s = store.create(creator, GameKind::Ludo, Some(4), 50).unwrap();
        store.join(&s.id, other).unwrap();
        assert_eq!(store.cancel(&s.id, other).unwrap_err(), SessionError::NotCreator);
        let s = store.cancel(&s.id, creator).unwrap();
        assert_eq!(s.status, SessionStatus::Cancelled);
        assert!(s.settlement.is_some());
        assert_eq!(ledger.balance(creator, Currency::Cash), 1_000);
        assert_eq!(ledger.balance(other, Currency::Cash), 1_000);
        assert_eq!(ledger.profile(creator).games_played, 0);
    }

    #[test]
    fn test_ludo_start_rules() {
        let (store, ledger) = store();
        let (creator, other) = (funded(&ledger), funded(&ledger));
        let s = store.create(creator, GameKind::Ludo, Some(3), 0).unwrap();
        assert_eq!(store.start(&s.id, creator).unwrap_err(), SessionError::NotEnoughPlayers);
        store.join(&s.id, other).unwrap();
        assert_eq!(store.start(&s.id, other).unwrap_err(), SessionError::NotCreator);
        let s = store.start(&s.id, creator).unwrap();
        assert_eq!(s.status, SessionStatus::Active);
        assert!(matches!(s.board, Some(GameBoard::Ludo(_))));

        let (event, _) = store.ludo_roll(&s.id, creator, None).unwrap();
        assert!(matches!(
            event,
            LudoEvent::Rolled { .. }
                | LudoEvent::NoLegalMove { .. }
                | LudoEvent::TurnForfeited { .. }
        ));

        let chess = store.create(creator, GameKind::Chess, None, 0).unwrap();
        assert_eq!(
            store.start(&chess.id, creator).unwrap_err(),
            SessionError::WrongKind(GameKind::Chess)
        );
        assert_eq!(
            store.ludo_roll(&chess.id, creator, None).unwrap_err(),
            SessionError::InvalidStatus(SessionStatus::Waiting)
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_every_version() {
        let (store, ledger) = store();
        let (id, w, b) = chess_game(&store, &ledger);
        let (snapshot, mut rx) = store.subscribe(&id).unwrap();
        assert_eq!(snapshot.version, 2);
        store.chess_move(&id, w, "e2e4", None).unwrap();
        store.chess_move(&id, b, "e7e5", None).unwrap();
        assert_eq!(rx.recv().await.unwrap().version, 3);
        assert_eq!(rx.recv().await.unwrap().version, 4);
    }

    #[test]
    fn test_absent_player_forfeits() {
        let (store, ledger) = store();
        let (id, w, b) = chess_game(&store, &ledger);
        let later = Instant::now() + Duration::from_secs(30);
        assert!(store.sweep_presence(later).is_empty());

        // only white keeps sending heartbeats
        let much_later = Instant::now() + Duration::from_secs(200);
        store.presence.heartbeat_at(&id, w, much_later);
        let swept = store.sweep_presence(much_later);
        assert_eq!(swept, vec![(id.clone(), b)]);

        let s = store.get(&id).unwrap();
        assert_eq!(s.status, SessionStatus::Completed);
        assert!(matches!(s.outcome, Some(GameOutcome::Winner { player, .. }) if player == w));
        assert_eq!(ledger.balance(w, Currency::Cash), 1_080);
        assert!(store.sweep_presence(much_later).is_empty());
    }

    #[test]
    fn test_heartbeat_requires_seat() {
        let (store, ledger) = store();
        let (id, w, b) = chess_game(&store, &ledger);
        let states = store.heartbeat(&id, w).unwrap();
        assert_eq!(states.len(), 2);
        assert!(states.iter().any(|(p, st)| *p == b && *st == PresenceState::Online));
        assert_eq!(store.heartbeat(&id, PlayerId::new()).unwrap_err(), SessionError::NotSeated);
        assert_eq!(store.get("missing").unwrap_err(), SessionError::NotFound);
    }

    #[test]
    fn test_prune_finished() {
        let (store, ledger) = store();
        let (id, w, _) = chess_game(&store, &ledger);
        store.chess_resign(&id, w, None).unwrap();
        store.create(w, GameKind::Chess, None, 0).unwrap();
        assert_eq!(store.prune_finished(Duration::from_secs(60)), 0);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.prune_finished(Duration::from_millis(1)), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_oversized_fees_rejected_up_front() {
        let (store, ledger) = store();
        let rich = PlayerId::new();
        ledger.deposit(rich, Currency::Cash, MAX_POOL).unwrap();
        assert_eq!(
            store.create(rich, GameKind::Chess, None, MAX_POOL / 2 + 1).unwrap_err(),
            SessionError::Wallet(WalletError::PoolOverflow)
        );
        assert_eq!(
            store.create(rich, GameKind::Ludo, Some(4), MAX_POOL).unwrap_err(),
            SessionError::Wallet(WalletError::PoolOverflow)
        );
        assert_eq!(ledger.balance(rich, Currency::Cash), MAX_POOL);
        assert!(store.is_empty());
        store.create(rich, GameKind::Chess, None, MAX_POOL / 2).unwrap();
    }

    #[test]
    fn test_failed_settlement_is_retried() {
        let (store, ledger) = store();
        let (id, w, b) = chess_game(&store, &ledger);
        // stakes that cannot be summed make the payout fail
        with_session(&store, &id, |s| s.entry_fee = u64::MAX);
        let s = store.chess_resign(&id, b, None).unwrap();
        assert_eq!(s.status, SessionStatus::Completed);
        assert!(s.settlement.is_none());
        assert_eq!(ledger.balance(w, Currency::Cash), 900);
        assert_eq!(store.prune_finished(Duration::ZERO), 0);
        assert_eq!(store.settle_pending(), 0);

        with_session(&store, &id, |s| s.entry_fee = 100);
        assert_eq!(store.settle_pending(), 1);
        let s = store.get(&id).unwrap();
        assert!(s.settlement.is_some());
        assert_eq!(s.version, 4);
        assert_eq!(ledger.balance(w, Currency::Cash), 1_080);
        assert_eq!(store.settle_pending(), 0);
        assert_eq!(store.prune_finished(Duration::ZERO), 1);
    }

    #[test]
    fn test_finished_sessions_drop_presence() {
        let (store, ledger) = store();
        let (id, w, b) = chess_game(&store, &ledger);
        store.chess_resign(&id, b, None).unwrap();
        assert_eq!(
            store.heartbeat(&id, w).unwrap_err(),
            SessionError::InvalidStatus(SessionStatus::Completed)
        );

        store.presence.heartbeat(&id, w);
        assert_eq!(store.prune_finished(Duration::ZERO), 1);
        // no record left, so the player reads as never heard from
        let later = Instant::now() + Duration::from_secs(3600);
        assert_eq!(store.presence.evaluate(&id, w, later), PresenceState::Online);
    }

    #[test]
    fn test_fifty_move_claim_refunds_both() {
        let (store, ledger) = store();
        let (id, w, b) = chess_game(&store, &ledger);
        assert_eq!(
            store.chess_claim_draw(&id, w, Some(2)).unwrap_err(),
            SessionError::Chess(ChessError::NoDrawToClaim(0))
        );
        with_session(&store, &id, |s| {
            s.chess_mut().unwrap().fen = "8/8/4k3/8/8/3QK3/8/8 w - - 100 80".to_string();
        });
        let s = store.chess_claim_draw(&id, b, Some(2)).unwrap();
        assert_eq!(s.status, SessionStatus::Completed);
        assert_eq!(s.outcome, Some(GameOutcome::Draw { reason: EndReason::FiftyMoveRule }));
        assert_eq!(ledger.balance(w, Currency::Cash), 1_000);
        assert_eq!(ledger.balance(b, Currency::Cash), 1_000);
        assert_eq!(ledger.profile(w).draws, 1);
    }

    #[test]
    fn test_stalemate_move_refunds_both() {
        let (store, ledger) = store();
        let (id, w, b) = chess_game(&store, &ledger);
        with_session(&store, &id, |s| {
            s.chess_mut().unwrap().fen = "7k/8/6K1/8/8/8/8/5Q2 w - - 0 1".to_string();
        });
        let (rec, s) = store.chess_move(&id, w, "f1f7", None).unwrap();
        assert_eq!(rec.san, "Qf7");
        assert_eq!(s.outcome, Some(GameOutcome::Draw { reason: EndReason::Stalemate }));
        assert_eq!(s.settlement.unwrap().rake, 0);
        assert_eq!(ledger.balance(w, Currency::Cash), 1_000);
        assert_eq!(ledger.balance(b, Currency::Cash), 1_000);
        assert_eq!(ledger.profile(b).draws, 1);
    }

    #[test]
    fn test_word_goal_pays_the_finder() {
        let (store, ledger) = store();
        let (id, a, b) = word_game(&store, &ledger, &["CAT", "DOG", "SUN"]);
        let s = claim(&store, &id, a, "CAT");
        assert_eq!(s.status, SessionStatus::Active);
        let (start, end) =
            with_session(&store, &id, |s| s.words_mut().unwrap().locate("CAT")).unwrap();
        assert!(matches!(
            store.words_claim(&id, b, start, end, None).unwrap_err(),
            SessionError::Words(_)
        ));

        let s = claim(&store, &id, a, "DOG");
        assert_eq!(s.outcome, Some(GameOutcome::Winner { player: a, reason: EndReason::WordGoal }));
        assert_eq!(ledger.balance(a, Currency::Cash), 1_080);
        assert_eq!(ledger.balance(b, Currency::Cash), 900);
    }

    #[test]
    fn test_split_words_draw_refunds() {
        let (store, ledger) = store();
        let (id, a, b) = word_game(&store, &ledger, &["CAT", "DOG"]);
        claim(&store, &id, a, "CAT");
        let s = claim(&store, &id, b, "DOG");
        assert_eq!(s.outcome, Some(GameOutcome::Draw { reason: EndReason::AllWordsFound }));
        assert_eq!(ledger.balance(a, Currency::Cash), 1_000);
        assert_eq!(ledger.balance(b, Currency::Cash), 1_000);
    }

    #[test]
    fn test_ludo_move_after_roll() {
        let (store, ledger) = store();
        let (creator, other) = (funded(&ledger), funded(&ledger));
        let s = store.create(creator, GameKind::Ludo, Some(2), 0).unwrap();
        store.join(&s.id, other).unwrap();
        assert!(matches!(
            store.ludo_move(&s.id, creator, 0, None).unwrap_err(),
            SessionError::Ludo(_)
        ));

        with_session(&store, &s.id, |s| s.ludo_mut().unwrap().apply_roll(creator, 6).unwrap());
        let (event, after) = store.ludo_move(&s.id, creator, 0, Some(2)).unwrap();
        assert!(matches!(event, LudoEvent::Moved { color: Color::Red, from: 0, to: 1, .. }));
        assert_eq!(after.version, 3);

        let cells = store.ludo_cells(&s.id).unwrap();
        assert_eq!(cells.len(), 8);
        assert!(cells.contains(&(Color::Red, 0, crate::ludo::board::cell_of(Color::Red, 0, 1))));

        let chess = store.create(creator, GameKind::Chess, None, 0).unwrap();
        assert_eq!(
            store.ludo_cells(&chess.id).unwrap_err(),
            SessionError::InvalidStatus(SessionStatus::Waiting)
        );
    }
}
