//! # Sigil Settlement
//!
//! The settlement core: everything between an authorized request and a
//! ledger row.
//!
//! | Component | Responsibility |
//! |-----------|----------------|
//! | [`CheckInRegistrar`] | authorize and record daily check-ins, assign weight |
//! | [`DayRegistry`] | day-claim intake and the one-time settlement freeze |
//! | [`RewardCalculator`] | pure earned/paid/pending arithmetic per wallet |
//! | [`PayoutExecutor`] | aggregate transfer, confirmation, atomic ledger append |
//!
//! Components reach storage through [`LedgerStore`](sigil_ledger::LedgerStore)
//! and the chain through [`ChainClient`](sigil_chain::ChainClient) only;
//! tests substitute both.

pub mod checkin;
pub mod days;
pub mod payout;
pub mod rewards;

pub use checkin::{CheckInRegistrar, CheckInReceipt, CheckInStatus};
pub use days::{DayRegistry, SettleOutcome};
pub use payout::{ClaimOutcome, PayoutExecutor};
pub use rewards::{day_earned, DayPending, PendingRewards, RewardCalculator};
