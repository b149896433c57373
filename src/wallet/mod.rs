//! Wallet ledger and settlement.

pub mod ledger;
pub mod settlement;

pub use ledger::{Currency, Ledger, Profile, Transaction, TxKind, WalletError};
pub use settlement::{
    checked_pool, prize_pool, Payout, SettlementOutcome, SettlementReceipt, Stake, MAX_POOL,
};
