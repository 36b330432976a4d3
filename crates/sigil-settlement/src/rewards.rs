//! Reward arithmetic
//!
//! A settled day's pool splits proportionally by check-in weight:
//!
//! ```text
//! earned(day) = floor(weight * pool / total_weight)
//! paid(day)   = sum of payout records with status in {sent, pending}
//! pending(day) = max(0, earned - paid)
//! ```
//!
//! Everything is integer lamports in u128 intermediates. Rounding dust
//! (at most total_weight - 1 lamports per day) stays in the incentive
//! wallet undistributed.

use sigil_core::{EpochDay, Result, WalletId};
use sigil_ledger::{LedgerStore, PayoutStatus};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Lamports a single check-in earns from a settled day's pool.
///
/// `weight <= total_weight` holds for any consistently settled day, which
/// bounds the result by `pool_lamports`. An unsettled day (total 0) earns
/// nothing.
pub fn day_earned(weight: u32, total_weight: u64, pool_lamports: u64) -> u64 {
    if total_weight == 0 {
        return 0;
    }
    (weight as u128 * pool_lamports as u128 / total_weight as u128) as u64
}

/// One settled day's slice of a wallet's rewards
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayPending {
    pub day: EpochDay,
    pub weight: u32,
    pub total_weight: u64,
    pub incentive_lamports: u64,
    pub earned_lamports: u64,
    pub paid_lamports: u64,
    pub pending_lamports: u64,
}

/// A wallet's full reward position
#[derive(Clone, Debug, Default)]
pub struct PendingRewards {
    pub total_pending_lamports: u64,
    pub days_checked_in: u64,
    pub bonus_days: u64,
    /// Every settled day the wallet checked into, pending or not,
    /// ordered by day ascending
    pub days: Vec<DayPending>,
}

/// Computes reward positions from ledger state.
///
/// Pure reads: calling this never writes, so the result is also the
/// recompute step a payout starts from.
pub struct RewardCalculator {
    store: Arc<dyn LedgerStore>,
}

impl RewardCalculator {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Current pending rewards for a wallet across all settled days
    pub async fn pending_rewards(&self, wallet: &WalletId) -> Result<PendingRewards> {
        let check_ins = self.store.list_wallet_check_ins(wallet).await?;
        let days_checked_in = check_ins.len() as u64;
        let bonus_days = check_ins.iter().filter(|c| c.is_bonus()).count() as u64;

        if check_ins.is_empty() {
            return Ok(PendingRewards::default());
        }

        let days: Vec<EpochDay> = check_ins.iter().map(|c| c.day).collect();
        let claims = self.store.list_settled_claims(&days).await?;

        let paid_records = self
            .store
            .list_payout_records(wallet, &[PayoutStatus::Sent, PayoutStatus::Pending])
            .await?;
        let mut paid_by_day: BTreeMap<EpochDay, u64> = BTreeMap::new();
        for record in paid_records {
            let paid = paid_by_day.entry(record.day).or_default();
            *paid = paid.saturating_add(record.amount_lamports);
        }

        let weight_by_day: BTreeMap<EpochDay, u32> =
            check_ins.iter().map(|c| (c.day, c.weight)).collect();

        let mut day_breakdown = Vec::with_capacity(claims.len());
        let mut total_pending: u64 = 0;

        for claim in claims {
            let Some(&weight) = weight_by_day.get(&claim.day) else {
                continue;
            };
            let earned = day_earned(weight, claim.total_weight, claim.incentive_lamports);
            let paid = paid_by_day.get(&claim.day).copied().unwrap_or(0);
            let pending = earned.saturating_sub(paid);

            day_breakdown.push(DayPending {
                day: claim.day,
                weight,
                total_weight: claim.total_weight,
                incentive_lamports: claim.incentive_lamports,
                earned_lamports: earned,
                paid_lamports: paid,
                pending_lamports: pending,
            });
            total_pending = total_pending.saturating_add(pending);
        }

        day_breakdown.sort_by_key(|d| d.day);

        Ok(PendingRewards {
            total_pending_lamports: total_pending,
            days_checked_in,
            bonus_days,
            days: day_breakdown,
        })
    }
}
