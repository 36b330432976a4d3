//! The chain access contract

use async_trait::async_trait;
use sigil_core::{Result, TxSignature, WalletId};

/// Observed state of a submitted transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// Not yet confirmed (or not yet visible to the RPC node)
    Pending,
    /// Confirmed or finalized without error
    Confirmed,
    /// Landed with an error; carries the chain's error description
    Failed(String),
}

/// Chain operations the settlement core depends on.
///
/// Kept to the few calls the protocol actually makes so tests can substitute
/// a scripted implementation. Network failures surface as
/// [`SigilError::Chain`](sigil_core::SigilError::Chain); a caller that cannot
/// reach the chain treats the answer as unknown, never as "no".
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Submit a native transfer from the disburser wallet. Returns the
    /// transaction signature immediately; confirmation is the caller's
    /// problem (see [`poll_confirmation`](crate::confirm::poll_confirmation)).
    async fn transfer(&self, to: &WalletId, lamports: u64) -> Result<TxSignature>;

    /// Current status of a submitted transaction
    async fn transaction_status(&self, signature: &TxSignature) -> Result<TxStatus>;

    /// Fee payer of a transaction, or `None` if the chain does not know the
    /// signature
    async fn transaction_payer(&self, signature: &TxSignature) -> Result<Option<WalletId>>;

    /// Whether the wallet holds a qualifying token: an SPL token account
    /// with amount 1 and 0 decimals
    async fn holds_eligibility_token(&self, wallet: &WalletId) -> Result<bool>;
}
