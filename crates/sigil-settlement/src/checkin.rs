//! Daily check-in registration
//!
//! A check-in is the protocol's only eligibility event: no check-in on a
//! day, no share of that day's pool. Authorization is a signed message
//! binding the request to the current day, plus a holder check on chain.
//!
//! Position determines weight (the first `DAILY_BONUS_THRESHOLD` check-ins
//! weigh double), but position itself is advisory: the count and the insert
//! are separate reads, so two concurrent check-ins can observe the same
//! position. Uniqueness of (day, wallet) is the store's guarantee, never
//! a read here.

use sigil_core::constants::{BONUS_WEIGHT, DAILY_BONUS_THRESHOLD, STANDARD_WEIGHT};
use sigil_core::{check_in_message, EpochDay, Result, SigilError, WalletId};
use sigil_chain::{verify_wallet_signature, ChainClient};
use sigil_ledger::{LedgerStore, NewCheckIn};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a successful check-in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckInReceipt {
    pub day: EpochDay,
    /// Best-effort position in the day's check-in order, starting at 1
    pub position: u64,
    pub weight: u32,
    pub bonus: bool,
}

/// A wallet's check-in state for one day
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckInStatus {
    pub checked_in: bool,
    pub weight: Option<u32>,
    pub total_checked_in: u64,
}

/// Authorizes and records daily check-ins
pub struct CheckInRegistrar {
    store: Arc<dyn LedgerStore>,
    chain: Arc<dyn ChainClient>,
}

impl CheckInRegistrar {
    pub fn new(store: Arc<dyn LedgerStore>, chain: Arc<dyn ChainClient>) -> Self {
        Self { store, chain }
    }

    /// Check a wallet in for the current day.
    ///
    /// `message` must be exactly today's check-in text and `signature` the
    /// wallet's base58 ed25519 signature over it.
    pub async fn check_in(
        &self,
        wallet: &WalletId,
        message: &str,
        signature: &str,
    ) -> Result<CheckInReceipt> {
        self.check_in_on(wallet, message, signature, EpochDay::today())
            .await
    }

    async fn check_in_on(
        &self,
        wallet: &WalletId,
        message: &str,
        signature: &str,
        today: EpochDay,
    ) -> Result<CheckInReceipt> {
        if message != check_in_message(today) {
            debug!(wallet = %wallet.short(), "stale or malformed check-in message");
            return Err(SigilError::InvalidAuth(
                "Invalid or expired check-in message".into(),
            ));
        }
        if !verify_wallet_signature(wallet, message, signature) {
            return Err(SigilError::InvalidSignature);
        }
        if !self.chain.holds_eligibility_token(wallet).await? {
            return Err(SigilError::InvalidEligibility);
        }

        let position = self.store.count_check_ins(today).await? + 1;
        let weight = if position <= DAILY_BONUS_THRESHOLD {
            BONUS_WEIGHT
        } else {
            STANDARD_WEIGHT
        };

        let row = self
            .store
            .insert_check_in(NewCheckIn {
                day: today,
                wallet: wallet.clone(),
                weight,
            })
            .await?;

        info!(
            wallet = %wallet.short(),
            day = %today,
            position,
            weight = row.weight,
            "check-in recorded"
        );
        Ok(CheckInReceipt {
            day: today,
            position,
            weight: row.weight,
            bonus: row.is_bonus(),
        })
    }

    /// Read a wallet's check-in state for a day
    pub async fn status(&self, wallet: &WalletId, day: EpochDay) -> Result<CheckInStatus> {
        let check_in = self.store.get_check_in(day, wallet).await?;
        let total_checked_in = self.store.count_check_ins(day).await?;
        Ok(CheckInStatus {
            checked_in: check_in.is_some(),
            weight: check_in.map(|c| c.weight),
            total_checked_in,
        })
    }
}
