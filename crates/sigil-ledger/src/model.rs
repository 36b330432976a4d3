//! Row types for the three ledger tables

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sigil_core::{EpochDay, TxSignature, WalletId};
use std::fmt;

/// One wallet's check-in on one day
///
/// Weight is assigned at insert time from the wallet's position in the day
/// and never changes afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIn {
    pub day: EpochDay,
    pub wallet: WalletId,
    pub weight: u32,
    pub checked_in_at: DateTime<Utc>,
}

impl CheckIn {
    /// Whether this check-in landed in the bonus tier
    pub fn is_bonus(&self) -> bool {
        self.weight == sigil_core::constants::BONUS_WEIGHT
    }
}

/// Input for a new check-in row; the store stamps the timestamp
#[derive(Clone, Debug)]
pub struct NewCheckIn {
    pub day: EpochDay,
    pub wallet: WalletId,
    pub weight: u32,
}

/// One claimed day and its incentive pool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayClaim {
    pub day: EpochDay,
    pub claimer: WalletId,
    pub incentive_lamports: u64,
    /// 0 until the day settles; frozen at first settlement, never rewritten
    pub total_weight: u64,
    pub claimed_at: DateTime<Utc>,
}

impl DayClaim {
    pub fn is_settled(&self) -> bool {
        self.total_weight > 0
    }
}

/// Input for a day-claim upsert
///
/// Deliberately has no `total_weight` field: intake can never touch the
/// settlement freeze, not even when re-claiming an already-claimed day.
#[derive(Clone, Debug)]
pub struct NewDayClaim {
    pub day: EpochDay,
    pub claimer: WalletId,
    pub incentive_lamports: u64,
}

/// Lifecycle state of a payout record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    /// Journaled before transfer confirmation (reserved for backends that
    /// pre-write; the executor itself writes records post-confirmation)
    Pending,
    /// Transfer confirmed on chain
    Sent,
    /// Transfer failed terminally
    Failed,
}

impl PayoutStatus {
    /// Whether a record in this state counts toward the paid total.
    ///
    /// Pending counts: an in-flight payout must block a second claim for
    /// the same amount. Failed never counts.
    pub fn counts_as_paid(self) -> bool {
        matches!(self, Self::Pending | Self::Sent)
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// One payout toward one (day, wallet) pair
///
/// Records are append-only. A correction is a new row, never an update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRecord {
    pub day: EpochDay,
    pub wallet: WalletId,
    pub amount_lamports: u64,
    pub tx_signature: TxSignature,
    pub status: PayoutStatus,
    pub created_at: DateTime<Utc>,
}

/// Input for a new payout record
#[derive(Clone, Debug)]
pub struct NewPayoutRecord {
    pub day: EpochDay,
    pub wallet: WalletId,
    pub amount_lamports: u64,
    pub tx_signature: TxSignature,
    pub status: PayoutStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paid_filter() {
        assert!(PayoutStatus::Sent.counts_as_paid());
        assert!(PayoutStatus::Pending.counts_as_paid());
        assert!(!PayoutStatus::Failed.counts_as_paid());
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&PayoutStatus::Sent).unwrap(),
            "\"sent\""
        );
        let status: PayoutStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, PayoutStatus::Pending);
    }

    #[test]
    fn test_settled_flag() {
        let claim = DayClaim {
            day: EpochDay::new(100),
            claimer: WalletId::new("claimer"),
            incentive_lamports: 1_000_000_000,
            total_weight: 0,
            claimed_at: Utc::now(),
        };
        assert!(!claim.is_settled());

        let settled = DayClaim {
            total_weight: 10,
            ..claim
        };
        assert!(settled.is_settled());
    }
}
