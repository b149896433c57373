//! Post-game settlement: profile statistics, payouts and ledger rows in one
//! critical section, recorded once per session.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info};

use super::ledger::{Currency, Ledger, Posting, TxKind, WalletError};
use crate::util::id::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SettlementOutcome {
    Winner { player: PlayerId },
    Draw,
    Cancelled,
}

/// What one seat paid to enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    pub player: PlayerId,
    pub entry_fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub player: PlayerId,
    pub amount: u64,
    pub kind: TxKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub session_id: String,
    pub outcome: SettlementOutcome,
    pub pool: u64,
    pub rake: u64,
    pub payouts: Vec<Payout>,
    pub settled_at: i64,
}

/// Largest pool a settlement can pay out in one posting.
pub const MAX_POOL: u64 = i64::MAX as u64;

/// Pool collected once `seats` players have paid `entry_fee` each.
pub fn checked_pool(entry_fee: u64, seats: usize) -> Result<u64, WalletError> {
    u64::try_from(seats)
        .ok()
        .and_then(|n| entry_fee.checked_mul(n))
        .filter(|pool| *pool <= MAX_POOL)
        .ok_or(WalletError::PoolOverflow)
}

/// Splits the pooled entry fees into (prize, rake). Rake is rounded down.
pub fn prize_pool(total: u64, rake_percent: u8) -> (u64, u64) {
    let rake = total.saturating_mul(u64::from(rake_percent.min(100))) / 100;
    (total - rake, rake)
}

impl Ledger {
    /// Settles a finished or cancelled session.
    ///
    /// Repeated calls for the same `session_id` return the first receipt and
    /// change nothing. Either every posting and profile update lands or none
    /// does.
    pub fn settle(
        &self,
        session_id: &str,
        outcome: SettlementOutcome,
        stakes: &[Stake],
        rake_percent: u8,
    ) -> Result<SettlementReceipt, WalletError> {
        let mut books = self.books.lock();
        if let Some(receipt) = books.settlements.get(session_id) {
            debug!(session_id, "already settled");
            return Ok(receipt.clone());
        }

        let total = stakes
            .iter()
            .try_fold(0u64, |acc, s| acc.checked_add(s.entry_fee))
            .filter(|total| *total <= MAX_POOL)
            .ok_or(WalletError::PoolOverflow)?;
        let (pool, rake, payouts) = match outcome {
            SettlementOutcome::Winner { player } => {
                if !stakes.iter().any(|s| s.player == player) {
                    return Err(WalletError::NotAStakeholder(player));
                }
                let (pool, rake) = prize_pool(total, rake_percent);
                (pool, rake, vec![Payout { player, amount: pool, kind: TxKind::Prize }])
            }
            SettlementOutcome::Draw | SettlementOutcome::Cancelled => {
                let refunds = stakes
                    .iter()
                    .map(|s| Payout { player: s.player, amount: s.entry_fee, kind: TxKind::Refund })
                    .collect();
                (total, 0, refunds)
            }
        };

        let postings = payouts
            .iter()
            .filter(|p| p.amount > 0)
            .map(|p| {
                Ok(Posting {
                    player: p.player,
                    currency: Currency::Cash,
                    kind: p.kind,
                    amount: i64::try_from(p.amount).map_err(|_| WalletError::InvalidAmount)?,
                    reference: Some(session_id.to_string()),
                })
            })
            .collect::<Result<Vec<_>, WalletError>>()?;
        books.check(&postings)?;
        books.apply(postings);

        if outcome != SettlementOutcome::Cancelled {
            for stake in stakes {
                let profile = books.profiles.entry(stake.player).or_default();
                profile.games_played += 1;
                match outcome {
                    SettlementOutcome::Winner { player } if player == stake.player => {
                        profile.wins += 1;
                        profile.total_winnings += pool;
                    }
                    SettlementOutcome::Winner { .. } => profile.losses += 1,
                    _ => profile.draws += 1,
                }
            }
        }

        let receipt = SettlementReceipt {
            session_id: session_id.to_string(),
            outcome,
            pool,
            rake,
            payouts,
            settled_at: OffsetDateTime::now_utc().unix_timestamp(),
        };
        books.settlements.insert(session_id.to_string(), receipt.clone());
        info!(session_id, ?outcome, pool, rake, "session settled");
        Ok(receipt)
    }
}
