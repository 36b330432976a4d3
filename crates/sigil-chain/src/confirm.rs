//! Bounded confirmation polling
//!
//! The RPC providers this service targets do not offer signature
//! subscriptions, so confirmation is a polling loop with a hard attempt
//! budget. Nothing in the settlement pipeline waits unboundedly on the
//! chain.

use crate::client::{ChainClient, TxStatus};
use sigil_core::constants::{CONFIRMATION_INTERVAL_MS, CONFIRMATION_MAX_ATTEMPTS};
use sigil_core::{Result, SigilError, TxSignature};
use std::time::Duration;
use tracing::debug;

/// Polling budget for one confirmation wait
#[derive(Clone, Copy, Debug)]
pub struct ConfirmPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ConfirmPolicy {
    fn default() -> Self {
        Self {
            max_attempts: CONFIRMATION_MAX_ATTEMPTS,
            interval: Duration::from_millis(CONFIRMATION_INTERVAL_MS),
        }
    }
}

/// Poll until the transaction confirms, fails, or the budget runs out.
///
/// A failed transaction returns [`SigilError::TransferFailed`]; an
/// exhausted budget returns [`SigilError::ConfirmationTimeout`]. RPC errors
/// propagate immediately; an unreachable chain gives no grounds to keep
/// waiting.
pub async fn poll_confirmation(
    client: &dyn ChainClient,
    signature: &TxSignature,
    policy: ConfirmPolicy,
) -> Result<()> {
    for attempt in 1..=policy.max_attempts {
        match client.transaction_status(signature).await? {
            TxStatus::Confirmed => {
                debug!(tx = %signature.short(), attempt, "transaction confirmed");
                return Ok(());
            }
            TxStatus::Failed(reason) => {
                return Err(SigilError::TransferFailed(reason));
            }
            TxStatus::Pending => {}
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    Err(SigilError::ConfirmationTimeout {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sigil_core::WalletId;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted status sequence; repeats the last entry once exhausted
    struct ScriptedChain {
        script: Vec<TxStatus>,
        calls: AtomicU32,
    }

    impl ScriptedChain {
        fn new(script: Vec<TxStatus>) -> Self {
            Self {
                script,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ChainClient for ScriptedChain {
        async fn transfer(&self, _to: &WalletId, _lamports: u64) -> Result<TxSignature> {
            unreachable!("not exercised")
        }

        async fn transaction_status(&self, _signature: &TxSignature) -> Result<TxStatus> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            Ok(self
                .script
                .get(call)
                .or_else(|| self.script.last())
                .cloned()
                .unwrap_or(TxStatus::Pending))
        }

        async fn transaction_payer(&self, _signature: &TxSignature) -> Result<Option<WalletId>> {
            Ok(None)
        }

        async fn holds_eligibility_token(&self, _wallet: &WalletId) -> Result<bool> {
            Ok(false)
        }
    }

    fn fast_policy(max_attempts: u32) -> ConfirmPolicy {
        ConfirmPolicy {
            max_attempts,
            interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_confirms_after_pending() {
        let chain = ScriptedChain::new(vec![
            TxStatus::Pending,
            TxStatus::Pending,
            TxStatus::Confirmed,
        ]);
        let sig = TxSignature::new("sig");

        poll_confirmation(&chain, &sig, fast_policy(5)).await.unwrap();
        assert_eq!(chain.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failure_is_terminal() {
        let chain = ScriptedChain::new(vec![
            TxStatus::Pending,
            TxStatus::Failed("InstructionError".into()),
        ]);
        let sig = TxSignature::new("sig");

        let err = poll_confirmation(&chain, &sig, fast_policy(5)).await.unwrap_err();
        assert!(matches!(err, SigilError::TransferFailed(_)));
        assert_eq!(chain.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_times_out() {
        let chain = ScriptedChain::new(vec![TxStatus::Pending]);
        let sig = TxSignature::new("sig");

        let err = poll_confirmation(&chain, &sig, fast_policy(4)).await.unwrap_err();
        assert!(matches!(err, SigilError::ConfirmationTimeout { attempts: 4 }));
        assert_eq!(chain.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_default_policy_matches_protocol() {
        let policy = ConfirmPolicy::default();
        assert_eq!(policy.max_attempts, 30);
        assert_eq!(policy.interval, Duration::from_millis(2000));
    }
}
