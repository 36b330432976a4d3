//! Reward payout execution
//!
//! A claim pays a wallet's entire pending balance in one aggregate
//! transfer, then journals one payout record per covered day. The ordering
//! is deliberate: records are written only after the transfer confirms, so
//! the ledger never claims money moved that did not.
//!
//! The inverse gap exists instead: a confirmed transfer whose record batch
//! fails to write would double-pay on the next claim. The batch write
//! retries, and if it still fails the error log carries the transaction
//! signature so the records can be reconstructed by hand.
//!
//! Concurrency control is a per-wallet async mutex. Two simultaneous
//! claims for one wallet serialize; the loser recomputes against the
//! winner's freshly written records and finds nothing pending.

use crate::rewards::RewardCalculator;
use dashmap::DashMap;
use sigil_chain::{poll_confirmation, verify_wallet_signature, ChainClient, ConfirmPolicy};
use sigil_core::{claim_message, EpochDay, Result, SigilError, TxSignature, WalletId};
use sigil_ledger::{LedgerStore, NewPayoutRecord, PayoutStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Attempts at journaling the payout batch after a confirmed transfer
const LEDGER_WRITE_ATTEMPTS: u32 = 3;
const LEDGER_WRITE_BACKOFF: Duration = Duration::from_millis(250);

/// Result of a successful claim
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimOutcome {
    pub total_lamports: u64,
    pub tx_signature: TxSignature,
    /// Number of day records the payout covered
    pub days_settled: usize,
}

/// Executes reward claims end to end
pub struct PayoutExecutor {
    store: Arc<dyn LedgerStore>,
    chain: Arc<dyn ChainClient>,
    calculator: RewardCalculator,
    confirm: ConfirmPolicy,
    claim_gates: DashMap<WalletId, Arc<Mutex<()>>>,
}

impl PayoutExecutor {
    pub fn new(store: Arc<dyn LedgerStore>, chain: Arc<dyn ChainClient>) -> Self {
        Self {
            calculator: RewardCalculator::new(Arc::clone(&store)),
            store,
            chain,
            confirm: ConfirmPolicy::default(),
            claim_gates: DashMap::new(),
        }
    }

    /// Override the confirmation polling budget
    pub fn with_policy(mut self, confirm: ConfirmPolicy) -> Self {
        self.confirm = confirm;
        self
    }

    /// Pay out everything a wallet is owed.
    ///
    /// `message` must be exactly today's claim text and `signature` the
    /// wallet's base58 ed25519 signature over it.
    pub async fn claim(
        &self,
        wallet: &WalletId,
        message: &str,
        signature: &str,
    ) -> Result<ClaimOutcome> {
        self.claim_on(wallet, message, signature, EpochDay::today())
            .await
    }

    async fn claim_on(
        &self,
        wallet: &WalletId,
        message: &str,
        signature: &str,
        today: EpochDay,
    ) -> Result<ClaimOutcome> {
        if message != claim_message(today) {
            return Err(SigilError::InvalidAuth(
                "Invalid or expired claim message".into(),
            ));
        }
        if !verify_wallet_signature(wallet, message, signature) {
            return Err(SigilError::InvalidSignature);
        }

        // Clone the gate out so the map shard unlocks before any await
        let gate = self
            .claim_gates
            .entry(wallet.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _held = gate.lock().await;

        let rewards = self.calculator.pending_rewards(wallet).await?;
        if rewards.total_pending_lamports == 0 {
            return Err(SigilError::NothingPending);
        }

        let tx_signature = self
            .chain
            .transfer(wallet, rewards.total_pending_lamports)
            .await?;
        if let Err(err) = poll_confirmation(self.chain.as_ref(), &tx_signature, self.confirm).await
        {
            error!(
                wallet = %wallet.short(),
                tx = %tx_signature,
                %err,
                "payout sent but not confirmed; reconcile from the transaction signature"
            );
            return Err(err);
        }

        let records: Vec<NewPayoutRecord> = rewards
            .days
            .iter()
            .filter(|d| d.pending_lamports > 0)
            .map(|d| NewPayoutRecord {
                day: d.day,
                wallet: wallet.clone(),
                amount_lamports: d.pending_lamports,
                tx_signature: tx_signature.clone(),
                status: PayoutStatus::Sent,
            })
            .collect();
        let days_settled = records.len();
        self.journal_payout(records, wallet, &tx_signature).await?;

        info!(
            wallet = %wallet.short(),
            total_lamports = rewards.total_pending_lamports,
            days_settled,
            tx = %tx_signature.short(),
            "rewards paid out"
        );
        Ok(ClaimOutcome {
            total_lamports: rewards.total_pending_lamports,
            tx_signature,
            days_settled,
        })
    }

    /// Append the payout batch, retrying transient store failures.
    ///
    /// By this point the transfer has confirmed; giving up here leaves the
    /// ledger owing money it already paid, so the final failure is logged
    /// loudly with everything needed to repair it.
    async fn journal_payout(
        &self,
        records: Vec<NewPayoutRecord>,
        wallet: &WalletId,
        tx_signature: &TxSignature,
    ) -> Result<()> {
        let mut last_err = None;
        for attempt in 1..=LEDGER_WRITE_ATTEMPTS {
            match self.store.insert_payout_records(records.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(
                        wallet = %wallet.short(),
                        attempt,
                        %err,
                        "payout record write failed"
                    );
                    last_err = Some(err);
                }
            }
            if attempt < LEDGER_WRITE_ATTEMPTS {
                tokio::time::sleep(LEDGER_WRITE_BACKOFF).await;
            }
        }
        error!(
            wallet = %wallet.short(),
            tx = %tx_signature,
            "payout confirmed but not recorded; reconcile from the transaction signature"
        );
        Err(last_err.unwrap_or_else(|| SigilError::Storage("payout record write failed".into())))
    }
}
