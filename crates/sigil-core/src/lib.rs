//! # Sigil Core
//!
//! Core types for the Sigil daily check-in and reward settlement protocol.
//!
//! This crate provides the building blocks shared by every other Sigil crate:
//! - `EpochDay` - The integer day clock all protocol state is keyed by
//! - `WalletId` / `TxSignature` - Base58 chain identifiers
//! - `SigilError` - The error taxonomy with stable API codes
//! - Authorization message builders for check-in and reward claims
//!
//! ## Day lifecycle
//!
//! ```text
//!   day D (open)            day D+1 onwards
//!   ┌──────────────────┐    ┌────────────────────────────────────┐
//!   │ claim pool       │    │ settle: total_weight frozen (once) │
//!   │ check-ins accrue │ ─► │ holders claim earned - paid        │
//!   └──────────────────┘    └────────────────────────────────────┘
//! ```
//!
//! All accounting is integer lamports. Floating point appears only at the
//! presentation boundary (`sol_display`).

pub mod day;
pub mod error;
pub mod message;
pub mod types;

pub use day::*;
pub use error::*;
pub use message::*;
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::day::EpochDay;
    pub use crate::error::{Result, SigilError};
    pub use crate::message::{check_in_message, claim_message};
    pub use crate::types::{constants, WalletId, TxSignature};
}
