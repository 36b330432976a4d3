//! The ledger store contract
//!
//! Backends carry the protocol's correctness-critical guarantees, so the
//! trait spells them out per method. Read them as the transaction boundaries
//! a SQL backend must reproduce; the in-memory engine gets them from a
//! single lock.

use crate::model::{
    CheckIn, DayClaim, NewCheckIn, NewDayClaim, NewPayoutRecord, PayoutRecord, PayoutStatus,
};
use async_trait::async_trait;
use sigil_core::{EpochDay, Result, WalletId};

/// Storage contract for the three ledger tables
///
/// Every failure to reach or mutate the backing store surfaces as
/// [`SigilError::Storage`](sigil_core::SigilError::Storage); callers treat
/// uncertainty as failure.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // === check_ins ===

    /// Insert a check-in, enforcing (day, wallet) uniqueness atomically.
    ///
    /// A duplicate returns
    /// [`SigilError::AlreadyCheckedIn`](sigil_core::SigilError::AlreadyCheckedIn).
    /// The uniqueness check and the insert are one operation; a
    /// check-then-insert implementation is incorrect under concurrency.
    async fn insert_check_in(&self, check_in: NewCheckIn) -> Result<CheckIn>;

    /// Number of check-ins recorded for a day
    async fn count_check_ins(&self, day: EpochDay) -> Result<u64>;

    async fn get_check_in(&self, day: EpochDay, wallet: &WalletId) -> Result<Option<CheckIn>>;

    /// All check-ins for a day, ordered by wallet
    async fn list_day_check_ins(&self, day: EpochDay) -> Result<Vec<CheckIn>>;

    /// All of a wallet's check-ins across days, ordered by day ascending
    async fn list_wallet_check_ins(&self, wallet: &WalletId) -> Result<Vec<CheckIn>>;

    // === day_claims ===

    /// Insert or replace the claim for a day.
    ///
    /// On replace, `total_weight` of the existing row is preserved. Intake
    /// must never be able to reopen or re-settle a day.
    async fn upsert_day_claim(&self, claim: NewDayClaim) -> Result<DayClaim>;

    async fn get_day_claim(&self, day: EpochDay) -> Result<Option<DayClaim>>;

    /// Claims for the given days that have settled (`total_weight > 0`)
    async fn list_settled_claims(&self, days: &[EpochDay]) -> Result<Vec<DayClaim>>;

    /// Claims with `from <= day <= to`, ordered by day ascending
    async fn list_claims_in_range(&self, from: EpochDay, to: EpochDay) -> Result<Vec<DayClaim>>;

    /// The claim with the largest incentive pool ever recorded
    async fn top_incentive_claim(&self) -> Result<Option<DayClaim>>;

    /// One-time settlement freeze: write `total_weight` iff the stored value
    /// is still 0.
    ///
    /// Returns `true` when this call performed the write, `false` when the
    /// day was already settled or has no claim. The compare and the write
    /// are one atomic operation; this is what makes settlement idempotent
    /// under concurrent triggers.
    async fn settle_total_weight(&self, day: EpochDay, total_weight: u64) -> Result<bool>;

    // === payout_records ===

    /// A wallet's payout records in any of the given statuses
    async fn list_payout_records(
        &self,
        wallet: &WalletId,
        statuses: &[PayoutStatus],
    ) -> Result<Vec<PayoutRecord>>;

    /// Append a batch of payout records, all or nothing.
    ///
    /// A claim that paid several days writes one record per day; a partial
    /// batch would understate `paid` and allow double payment, so partial
    /// writes are forbidden.
    async fn insert_payout_records(&self, records: Vec<NewPayoutRecord>) -> Result<()>;
}
