//! Balances, the append-only transaction log and player profiles.
//!
//! All wallet state lives behind one mutex. Every balance change goes through
//! [`Books::post`], which appends a transaction carrying the running balance,
//! so the latest row for a (player, currency) always equals the balance.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::settlement::SettlementReceipt;
use crate::util::id::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Cash,
    Coins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Deposit,
    Withdrawal,
    EntryFee,
    Prize,
    Refund,
    HintPurchase,
    PuzzleReward,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub player: PlayerId,
    pub currency: Currency,
    pub kind: TxKind,
    /// Signed: debits are negative.
    pub amount: i64,
    pub balance_after: u64,
    pub reference: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub total_winnings: u64,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum WalletError {
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("insufficient balance: {available} available, {requested} requested")]
    InsufficientBalance { available: u64, requested: u64 },
    #[error("player {0} has no stake in this session")]
    NotAStakeholder(PlayerId),
    #[error("pooled entry fees would exceed the largest postable amount")]
    PoolOverflow,
    #[error("balance would exceed the largest representable amount")]
    BalanceOverflow,
}

/// A balance change not yet applied.
#[derive(Debug, Clone)]
pub(crate) struct Posting {
    pub player: PlayerId,
    pub currency: Currency,
    pub kind: TxKind,
    pub amount: i64,
    pub reference: Option<String>,
}

#[derive(Default)]
pub(crate) struct Books {
    balances: HashMap<(PlayerId, Currency), u64>,
    log: Vec<Transaction>,
    pub(crate) profiles: HashMap<PlayerId, Profile>,
    pub(crate) settlements: HashMap<String, SettlementReceipt>,
}

impl Books {
    fn balance(&self, player: PlayerId, currency: Currency) -> u64 {
        self.balances.get(&(player, currency)).copied().unwrap_or(0)
    }

    /// Checks that every posting can be applied in order without a balance
    /// going negative. Nothing is mutated.
    pub(crate) fn check(&self, postings: &[Posting]) -> Result<(), WalletError> {
        let mut projected: HashMap<(PlayerId, Currency), i128> = HashMap::new();
        for p in postings {
            let key = (p.player, p.currency);
            let current = *projected
                .entry(key)
                .or_insert_with(|| i128::from(self.balance(p.player, p.currency)));
            let next = current + i128::from(p.amount);
            if next > i128::from(u64::MAX) {
                return Err(WalletError::BalanceOverflow);
            }
            if next < 0 {
                return Err(WalletError::InsufficientBalance {
                    available: current as u64,
                    requested: p.amount.unsigned_abs(),
                });
            }
            projected.insert(key, next);
        }
        Ok(())
    }

    /// Applies postings that already passed [`Books::check`].
    pub(crate) fn apply(&mut self, postings: Vec<Posting>) -> Vec<Transaction> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        postings
            .into_iter()
            .map(|p| {
                let balance = self.balances.entry((p.player, p.currency)).or_insert(0);
                *balance = balance.saturating_add_signed(p.amount);
                let tx = Transaction {
                    id: Uuid::new_v4(),
                    player: p.player,
                    currency: p.currency,
                    kind: p.kind,
                    amount: p.amount,
                    balance_after: *balance,
                    reference: p.reference,
                    created_at: now,
                };
                self.log.push(tx.clone());
                tx
            })
            .collect()
    }

    fn post(&mut self, posting: Posting) -> Result<Transaction, WalletError> {
        if posting.amount == 0 {
            return Err(WalletError::InvalidAmount);
        }
        let batch = vec![posting];
        self.check(&batch)?;
        let mut applied = self.apply(batch);
        applied.pop().ok_or(WalletError::InvalidAmount)
    }
}

/// Shared handle to the wallet books.
#[derive(Clone, Default)]
pub struct Ledger {
    pub(crate) books: Arc<Mutex<Books>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deposit(
        &self,
        player: PlayerId,
        currency: Currency,
        amount: u64,
    ) -> Result<Transaction, WalletError> {
        let tx = self.credit(player, currency, amount, TxKind::Deposit, None)?;
        info!(%player, ?currency, amount, "deposit");
        Ok(tx)
    }

    pub fn withdraw(
        &self,
        player: PlayerId,
        currency: Currency,
        amount: u64,
    ) -> Result<Transaction, WalletError> {
        let tx = self.debit(player, currency, amount, TxKind::Withdrawal, None)?;
        info!(%player, ?currency, amount, "withdrawal");
        Ok(tx)
    }

    pub fn credit(
        &self,
        player: PlayerId,
        currency: Currency,
        amount: u64,
        kind: TxKind,
        reference: Option<String>,
    ) -> Result<Transaction, WalletError> {
        let amount = i64::try_from(amount).map_err(|_| WalletError::InvalidAmount)?;
        self.books.lock().post(Posting { player, currency, kind, amount, reference })
    }

    pub fn debit(
        &self,
        player: PlayerId,
        currency: Currency,
        amount: u64,
        kind: TxKind,
        reference: Option<String>,
    ) -> Result<Transaction, WalletError> {
        let amount = i64::try_from(amount).map_err(|_| WalletError::InvalidAmount)?;
        self.books.lock().post(Posting { player, currency, kind, amount: -amount, reference })
    }

    /// Takes a session entry fee in cash. A zero fee posts nothing.
    pub fn collect_entry_fee(
        &self,
        player: PlayerId,
        amount: u64,
        session_id: &str,
    ) -> Result<Option<Transaction>, WalletError> {
        if amount == 0 {
            return Ok(None);
        }
        let reference = Some(session_id.to_string());
        let tx = self.debit(player, Currency::Cash, amount, TxKind::EntryFee, reference)?;
        info!(%player, session_id, amount, "entry fee collected");
        Ok(Some(tx))
    }

    pub fn balance(&self, player: PlayerId, currency: Currency) -> u64 {
        self.books.lock().balance(player, currency)
    }

    /// Newest first, optionally filtered to one currency.
    pub fn transactions(&self, player: PlayerId, currency: Option<Currency>) -> Vec<Transaction> {
        let books = self.books.lock();
        books
            .log
            .iter()
            .rev()
            .filter(|tx| tx.player == player && currency.map_or(true, |c| tx.currency == c))
            .cloned()
            .collect()
    }

    pub fn latest(&self, player: PlayerId, currency: Currency) -> Option<Transaction> {
        let books = self.books.lock();
        books
            .log
            .iter()
            .rev()
            .find(|tx| tx.player == player && tx.currency == currency)
            .cloned()
    }

    pub fn profile(&self, player: PlayerId) -> Profile {
        self.books.lock().profiles.get(&player).cloned().unwrap_or_default()
    }
}
