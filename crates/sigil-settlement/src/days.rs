//! Billboard claim intake and day settlement
//!
//! A day's lifecycle has two writes here. Intake records who paid for the
//! day's billboard and how large the incentive pool is; it can run many
//! times (a later, larger payment replaces the claimer) without ever
//! touching settlement state. Settlement freezes the day's `total_weight`
//! exactly once, turning the pool into fixed per-wallet entitlements.
//!
//! Settlement races are expected: the cron trigger retries, and operators
//! can invoke it by hand. Every duplicate or premature trigger resolves to
//! a [`SettleOutcome`] variant rather than an error.

use sigil_core::constants::MIN_INCENTIVE_LAMPORTS;
use sigil_chain::{poll_confirmation, ChainClient, ConfirmPolicy};
use sigil_core::{format_sol, EpochDay, Result, SigilError, TxSignature};
use sigil_ledger::{DayClaim, LedgerStore, NewDayClaim};
use std::sync::Arc;
use tracing::{debug, info};

/// How a settlement attempt resolved.
///
/// Only [`SettleOutcome::Settled`] performed a write; the other variants
/// report why the day was left alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettleOutcome {
    Settled {
        day: EpochDay,
        total_weight: u64,
        incentive_lamports: u64,
    },
    /// Nobody bought the day's billboard, so there is no pool to divide
    NoClaim { day: EpochDay },
    AlreadySettled { day: EpochDay },
    /// A pool exists but nobody checked in; the day stays open forever
    NoCheckIns { day: EpochDay },
}

impl SettleOutcome {
    pub fn settled(&self) -> bool {
        matches!(self, Self::Settled { .. })
    }

    pub fn day(&self) -> EpochDay {
        match self {
            Self::Settled { day, .. }
            | Self::NoClaim { day }
            | Self::AlreadySettled { day }
            | Self::NoCheckIns { day } => *day,
        }
    }
}

/// Records billboard claims and settles closed days
pub struct DayRegistry {
    store: Arc<dyn LedgerStore>,
    chain: Arc<dyn ChainClient>,
    confirm: ConfirmPolicy,
}

impl DayRegistry {
    pub fn new(store: Arc<dyn LedgerStore>, chain: Arc<dyn ChainClient>) -> Self {
        Self {
            store,
            chain,
            confirm: ConfirmPolicy::default(),
        }
    }

    /// Override the confirmation polling budget
    pub fn with_policy(mut self, confirm: ConfirmPolicy) -> Self {
        self.confirm = confirm;
        self
    }

    /// Record a billboard claim backed by an on-chain payment.
    ///
    /// The payment is polled to confirmation first; a transaction that
    /// landed with an error is rejected outright. The claimer wallet is
    /// read from the confirmed transaction itself, never from the request.
    pub async fn register_claim(
        &self,
        payment: &TxSignature,
        day: EpochDay,
        incentive_lamports: u64,
    ) -> Result<DayClaim> {
        if incentive_lamports < MIN_INCENTIVE_LAMPORTS {
            return Err(SigilError::InvalidInput(format!(
                "Incentive below the {} SOL minimum",
                format_sol(MIN_INCENTIVE_LAMPORTS)
            )));
        }
        poll_confirmation(self.chain.as_ref(), payment, self.confirm).await?;
        let claimer = self
            .chain
            .transaction_payer(payment)
            .await?
            .ok_or_else(|| SigilError::InvalidInput("Transaction not found".into()))?;

        let claim = self
            .store
            .upsert_day_claim(NewDayClaim {
                day,
                claimer: claimer.clone(),
                incentive_lamports,
            })
            .await?;
        info!(
            day = %day,
            claimer = %claimer.short(),
            incentive_lamports,
            tx = %payment.short(),
            "billboard claim recorded"
        );
        Ok(claim)
    }

    /// Settle the most recent closed day
    pub async fn settle_yesterday(&self) -> Result<SettleOutcome> {
        self.settle_day(EpochDay::today().prev()).await
    }

    /// Freeze `total_weight` for a closed day.
    ///
    /// The current day is still accepting check-ins, so settling it would
    /// hand out shares of a moving denominator; that is refused as an
    /// error rather than an outcome.
    pub async fn settle_day(&self, day: EpochDay) -> Result<SettleOutcome> {
        if day >= EpochDay::today() {
            return Err(SigilError::InvalidInput(format!("Day {day} is still open")));
        }

        let claim = match self.store.get_day_claim(day).await? {
            Some(claim) => claim,
            None => {
                debug!(day = %day, "no billboard claim, nothing to settle");
                return Ok(SettleOutcome::NoClaim { day });
            }
        };
        if claim.is_settled() {
            return Ok(SettleOutcome::AlreadySettled { day });
        }

        let total_weight: u64 = self
            .store
            .list_day_check_ins(day)
            .await?
            .iter()
            .map(|c| u64::from(c.weight))
            .sum();
        if total_weight == 0 {
            debug!(day = %day, "no check-ins, day left unsettled");
            return Ok(SettleOutcome::NoCheckIns { day });
        }

        // Lost race: another trigger froze the day between our read and the
        // conditional write.
        if !self.store.settle_total_weight(day, total_weight).await? {
            return Ok(SettleOutcome::AlreadySettled { day });
        }

        info!(
            day = %day,
            total_weight,
            incentive_lamports = claim.incentive_lamports,
            "day settled"
        );
        Ok(SettleOutcome::Settled {
            day,
            total_weight,
            incentive_lamports: claim.incentive_lamports,
        })
    }
}
