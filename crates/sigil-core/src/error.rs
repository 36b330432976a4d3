//! Error taxonomy for Sigil operations

use crate::day::EpochDay;
use crate::types::WalletId;
use thiserror::Error;

/// Result type alias for Sigil operations
pub type Result<T> = std::result::Result<T, SigilError>;

/// Errors that can occur across the Sigil settlement pipeline
#[derive(Error, Debug, Clone)]
pub enum SigilError {
    // === Authorization ===
    /// Signed message is stale or malformed; carries the public reason
    #[error("{0}")]
    InvalidAuth(String),

    /// Ed25519 signature did not verify against the wallet's key
    #[error("Invalid signature")]
    InvalidSignature,

    /// Wallet does not hold a qualifying token
    #[error("Must hold a Sigil NFT to check in")]
    InvalidEligibility,

    // === Check-in ===
    /// Wallet already holds a check-in for this day
    #[error("Wallet {wallet} already checked in on day {day}")]
    AlreadyCheckedIn { day: EpochDay, wallet: WalletId },

    // === Payout ===
    /// Claim attempted with zero pending rewards
    #[error("No pending rewards")]
    NothingPending,

    /// Transfer was rejected or failed on chain
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Transfer confirmation not observed within the polling budget
    #[error("Transaction confirmation timeout after {attempts} attempts")]
    ConfirmationTimeout { attempts: u32 },

    // === Infrastructure ===
    /// Ledger store unavailable or inconsistent
    #[error("Storage error: {0}")]
    Storage(String),

    /// Chain RPC unavailable or returned malformed data
    #[error("Chain error: {0}")]
    Chain(String),

    /// Malformed request input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SigilError {
    /// Stable numeric code for API responses
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidAuth(_) => 1001,
            Self::InvalidSignature => 1002,
            Self::InvalidEligibility => 1003,
            Self::AlreadyCheckedIn { .. } => 1004,
            Self::NothingPending => 1005,
            Self::TransferFailed(_) => 1006,
            Self::ConfirmationTimeout { .. } => 1007,
            Self::Storage(_) => 1008,
            Self::Chain(_) => 1009,
            Self::InvalidInput(_) => 1010,
        }
    }

    /// Expected outcome of normal operation, caused by the caller's state
    /// or request. Logged at debug, never paged on.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAuth(_)
                | Self::InvalidSignature
                | Self::InvalidEligibility
                | Self::AlreadyCheckedIn { .. }
                | Self::NothingPending
                | Self::InvalidInput(_)
        )
    }

    /// Transient infrastructure condition worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConfirmationTimeout { .. } | Self::Storage(_) | Self::Chain(_)
        )
    }
}
