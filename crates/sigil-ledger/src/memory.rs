//! In-memory ledger engine
//!
//! One `RwLock` over all three tables. That is deliberate: the conditional
//! writes and the batch append each need a single critical section, and at
//! this service's write rates lock contention is not a concern. Postgres
//! replaces this in production behind the same trait.

use crate::model::{
    CheckIn, DayClaim, NewCheckIn, NewDayClaim, NewPayoutRecord, PayoutRecord, PayoutStatus,
};
use crate::store::LedgerStore;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use sigil_core::{EpochDay, Result, SigilError, WalletId};
use std::collections::BTreeMap;

#[derive(Default)]
struct Inner {
    /// day -> wallet -> check-in
    check_ins: BTreeMap<EpochDay, BTreeMap<WalletId, CheckIn>>,
    day_claims: BTreeMap<EpochDay, DayClaim>,
    /// Append-only, insertion order preserved
    payouts: Vec<PayoutRecord>,
}

/// In-memory [`LedgerStore`] implementation
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<Inner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn insert_check_in(&self, check_in: NewCheckIn) -> Result<CheckIn> {
        let mut inner = self.inner.write();
        let day_map = inner.check_ins.entry(check_in.day).or_default();
        if day_map.contains_key(&check_in.wallet) {
            return Err(SigilError::AlreadyCheckedIn {
                day: check_in.day,
                wallet: check_in.wallet,
            });
        }

        let row = CheckIn {
            day: check_in.day,
            wallet: check_in.wallet.clone(),
            weight: check_in.weight,
            checked_in_at: Utc::now(),
        };
        day_map.insert(check_in.wallet, row.clone());
        Ok(row)
    }

    async fn count_check_ins(&self, day: EpochDay) -> Result<u64> {
        let inner = self.inner.read();
        Ok(inner.check_ins.get(&day).map_or(0, |m| m.len() as u64))
    }

    async fn get_check_in(&self, day: EpochDay, wallet: &WalletId) -> Result<Option<CheckIn>> {
        let inner = self.inner.read();
        Ok(inner
            .check_ins
            .get(&day)
            .and_then(|m| m.get(wallet))
            .cloned())
    }

    async fn list_day_check_ins(&self, day: EpochDay) -> Result<Vec<CheckIn>> {
        let inner = self.inner.read();
        Ok(inner
            .check_ins
            .get(&day)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_wallet_check_ins(&self, wallet: &WalletId) -> Result<Vec<CheckIn>> {
        let inner = self.inner.read();
        Ok(inner
            .check_ins
            .values()
            .filter_map(|m| m.get(wallet))
            .cloned()
            .collect())
    }

    async fn upsert_day_claim(&self, claim: NewDayClaim) -> Result<DayClaim> {
        let mut inner = self.inner.write();
        let total_weight = inner
            .day_claims
            .get(&claim.day)
            .map_or(0, |existing| existing.total_weight);

        let row = DayClaim {
            day: claim.day,
            claimer: claim.claimer,
            incentive_lamports: claim.incentive_lamports,
            total_weight,
            claimed_at: Utc::now(),
        };
        inner.day_claims.insert(claim.day, row.clone());
        Ok(row)
    }

    async fn get_day_claim(&self, day: EpochDay) -> Result<Option<DayClaim>> {
        let inner = self.inner.read();
        Ok(inner.day_claims.get(&day).cloned())
    }

    async fn list_settled_claims(&self, days: &[EpochDay]) -> Result<Vec<DayClaim>> {
        let inner = self.inner.read();
        Ok(days
            .iter()
            .filter_map(|day| inner.day_claims.get(day))
            .filter(|claim| claim.is_settled())
            .cloned()
            .collect())
    }

    async fn list_claims_in_range(&self, from: EpochDay, to: EpochDay) -> Result<Vec<DayClaim>> {
        let inner = self.inner.read();
        Ok(inner
            .day_claims
            .range(from..=to)
            .map(|(_, claim)| claim.clone())
            .collect())
    }

    async fn top_incentive_claim(&self) -> Result<Option<DayClaim>> {
        let inner = self.inner.read();
        Ok(inner
            .day_claims
            .values()
            .max_by_key(|claim| (claim.incentive_lamports, claim.day))
            .cloned())
    }

    async fn settle_total_weight(&self, day: EpochDay, total_weight: u64) -> Result<bool> {
        let mut inner = self.inner.write();
        match inner.day_claims.get_mut(&day) {
            Some(claim) if claim.total_weight == 0 => {
                claim.total_weight = total_weight;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_payout_records(
        &self,
        wallet: &WalletId,
        statuses: &[PayoutStatus],
    ) -> Result<Vec<PayoutRecord>> {
        let inner = self.inner.read();
        Ok(inner
            .payouts
            .iter()
            .filter(|record| &record.wallet == wallet && statuses.contains(&record.status))
            .cloned()
            .collect())
    }

    async fn insert_payout_records(&self, records: Vec<NewPayoutRecord>) -> Result<()> {
        let mut inner = self.inner.write();
        let now = Utc::now();
        inner.payouts.extend(records.into_iter().map(|record| PayoutRecord {
            day: record.day,
            wallet: record.wallet,
            amount_lamports: record.amount_lamports,
            tx_signature: record.tx_signature,
            status: record.status,
            created_at: now,
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_core::TxSignature;

    fn wallet(name: &str) -> WalletId {
        WalletId::new(name)
    }

    fn new_check_in(day: u64, name: &str, weight: u32) -> NewCheckIn {
        NewCheckIn {
            day: EpochDay::new(day),
            wallet: wallet(name),
            weight,
        }
    }

    #[tokio::test]
    async fn test_duplicate_check_in_rejected() {
        let store = MemoryLedger::new();
        store.insert_check_in(new_check_in(100, "alice", 2)).await.unwrap();

        let err = store
            .insert_check_in(new_check_in(100, "alice", 2))
            .await
            .unwrap_err();
        assert!(matches!(err, SigilError::AlreadyCheckedIn { .. }));

        // same wallet, different day is fine
        store.insert_check_in(new_check_in(101, "alice", 2)).await.unwrap();
        assert_eq!(store.count_check_ins(EpochDay::new(100)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_wallet_check_ins_ordered_by_day() {
        let store = MemoryLedger::new();
        store.insert_check_in(new_check_in(103, "alice", 1)).await.unwrap();
        store.insert_check_in(new_check_in(101, "alice", 2)).await.unwrap();
        store.insert_check_in(new_check_in(102, "bob", 2)).await.unwrap();

        let rows = store.list_wallet_check_ins(&wallet("alice")).await.unwrap();
        let days: Vec<u64> = rows.iter().map(|c| c.day.index()).collect();
        assert_eq!(days, vec![101, 103]);
    }

    #[tokio::test]
    async fn test_upsert_preserves_total_weight() {
        let store = MemoryLedger::new();
        store
            .upsert_day_claim(NewDayClaim {
                day: EpochDay::new(100),
                claimer: wallet("first"),
                incentive_lamports: 1_000_000_000,
            })
            .await
            .unwrap();

        assert!(store.settle_total_weight(EpochDay::new(100), 42).await.unwrap());

        // re-claim overwrites claimer and pool but not the freeze
        let row = store
            .upsert_day_claim(NewDayClaim {
                day: EpochDay::new(100),
                claimer: wallet("second"),
                incentive_lamports: 2_000_000_000,
            })
            .await
            .unwrap();
        assert_eq!(row.claimer, wallet("second"));
        assert_eq!(row.incentive_lamports, 2_000_000_000);
        assert_eq!(row.total_weight, 42);
    }

    #[tokio::test]
    async fn test_settle_is_one_time() {
        let store = MemoryLedger::new();
        store
            .upsert_day_claim(NewDayClaim {
                day: EpochDay::new(100),
                claimer: wallet("claimer"),
                incentive_lamports: 1_000_000_000,
            })
            .await
            .unwrap();

        assert!(store.settle_total_weight(EpochDay::new(100), 10).await.unwrap());
        assert!(!store.settle_total_weight(EpochDay::new(100), 99).await.unwrap());

        let claim = store.get_day_claim(EpochDay::new(100)).await.unwrap().unwrap();
        assert_eq!(claim.total_weight, 10);
    }

    #[tokio::test]
    async fn test_settle_without_claim_is_noop() {
        let store = MemoryLedger::new();
        assert!(!store.settle_total_weight(EpochDay::new(100), 10).await.unwrap());
    }

    #[tokio::test]
    async fn test_settled_claim_filter() {
        let store = MemoryLedger::new();
        for day in [100, 101] {
            store
                .upsert_day_claim(NewDayClaim {
                    day: EpochDay::new(day),
                    claimer: wallet("claimer"),
                    incentive_lamports: 1_000_000_000,
                })
                .await
                .unwrap();
        }
        store.settle_total_weight(EpochDay::new(100), 7).await.unwrap();

        let days = [EpochDay::new(100), EpochDay::new(101), EpochDay::new(102)];
        let settled = store.list_settled_claims(&days).await.unwrap();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].day, EpochDay::new(100));
    }

    #[tokio::test]
    async fn test_top_incentive_claim() {
        let store = MemoryLedger::new();
        assert!(store.top_incentive_claim().await.unwrap().is_none());

        for (day, pool) in [(100u64, 500_000_000u64), (101, 900_000_000), (102, 300_000_000)] {
            store
                .upsert_day_claim(NewDayClaim {
                    day: EpochDay::new(day),
                    claimer: wallet("claimer"),
                    incentive_lamports: pool,
                })
                .await
                .unwrap();
        }

        let top = store.top_incentive_claim().await.unwrap().unwrap();
        assert_eq!(top.day, EpochDay::new(101));
    }

    #[tokio::test]
    async fn test_payout_status_filter() {
        let store = MemoryLedger::new();
        let records = vec![
            NewPayoutRecord {
                day: EpochDay::new(100),
                wallet: wallet("alice"),
                amount_lamports: 10,
                tx_signature: TxSignature::new("sig1"),
                status: PayoutStatus::Sent,
            },
            NewPayoutRecord {
                day: EpochDay::new(101),
                wallet: wallet("alice"),
                amount_lamports: 20,
                tx_signature: TxSignature::new("sig2"),
                status: PayoutStatus::Failed,
            },
            NewPayoutRecord {
                day: EpochDay::new(100),
                wallet: wallet("bob"),
                amount_lamports: 30,
                tx_signature: TxSignature::new("sig3"),
                status: PayoutStatus::Sent,
            },
        ];
        store.insert_payout_records(records).await.unwrap();

        let paid = store
            .list_payout_records(&wallet("alice"), &[PayoutStatus::Sent, PayoutStatus::Pending])
            .await
            .unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].amount_lamports, 10);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_one_winner() {
        use std::sync::Arc;

        let store = Arc::new(MemoryLedger::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert_check_in(new_check_in(100, "alice", 2)).await
            }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(store.count_check_ins(EpochDay::new(100)).await.unwrap(), 1);
    }
}
