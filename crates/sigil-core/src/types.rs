//! Identifier and amount types shared across the Sigil crates
//!
//! Wallets and transaction signatures stay in their base58 string form end
//! to end. Decoding to raw bytes happens only where a signature is actually
//! verified, in the chain crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// WalletId - base58-encoded ed25519 public key of a holder wallet
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(String);

impl WalletId {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading eight characters, for log lines and broadcast text
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Debug for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletId({})", self.short())
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WalletId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// TxSignature - base58-encoded signature of a submitted transaction
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxSignature(String);

impl TxSignature {
    pub fn new(signature: impl Into<String>) -> Self {
        Self(signature.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Debug for TxSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxSignature({})", self.short())
    }
}

impl fmt::Display for TxSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Protocol constants
pub mod constants {
    /// Seconds per epoch day
    pub const SECONDS_PER_DAY: u64 = 86_400;

    /// Lamports per SOL
    pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

    /// Check-in positions at or below this threshold earn bonus weight
    pub const DAILY_BONUS_THRESHOLD: u64 = 1000;

    /// Weight for a bonus-tier check-in
    pub const BONUS_WEIGHT: u32 = 2;

    /// Weight for a standard check-in
    pub const STANDARD_WEIGHT: u32 = 1;

    /// Minimum incentive pool accepted for a day claim (0.1 SOL)
    pub const MIN_INCENTIVE_LAMPORTS: u64 = 100_000_000;

    /// Confirmation polling attempts before giving up
    pub const CONFIRMATION_MAX_ATTEMPTS: u32 = 30;

    /// Delay between confirmation polls
    pub const CONFIRMATION_INTERVAL_MS: u64 = 2_000;

    /// Days ahead of today shown on the public calendar
    pub const CALENDAR_WINDOW_DAYS: u64 = 30;

    /// An incentive pool must reach this to count as a record (0.5 SOL)
    pub const RECORD_INCENTIVE_FLOOR: u64 = 500_000_000;

    /// Check-in count that qualifies a day as high-activity
    pub const HIGH_CHECKIN_THRESHOLD: u64 = 50;
}

/// Format lamports as SOL with two decimals, rounding half up.
///
/// Integer arithmetic throughout; this is the formatter the notifier and
/// calendar use for human-facing amounts.
pub fn format_sol(lamports: u64) -> String {
    let cents = (lamports as u128 + 5_000_000) / 10_000_000;
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Lamports as fractional SOL for JSON responses.
///
/// The one floating-point conversion in the codebase. Presentation only;
/// nothing downstream of this feeds back into accounting.
pub fn sol_display(lamports: u64) -> f64 {
    lamports as f64 / constants::LAMPORTS_PER_SOL as f64
}
