//! # Sigil Ledger
//!
//! The settlement ledger: every row the protocol ever writes lives in one of
//! three tables.
//!
//! ## Tables
//!
//! - `check_ins` - one row per (day, wallet), unique by construction
//! - `day_claims` - one row per claimed day; `total_weight` is 0 until the
//!   day settles and is written exactly once
//! - `payout_records` - append-only; the sum of a wallet's rows is the sole
//!   double-payment guard
//!
//! The [`LedgerStore`] trait is the contract every backend must satisfy,
//! atomicity guarantees included. [`MemoryLedger`] is the in-memory engine
//! (Postgres replaces it in production); the guarantees a SQL backend must
//! supply transactionally fall out of its single lock for free.

pub mod memory;
pub mod model;
pub mod store;

pub use memory::MemoryLedger;
pub use model::*;
pub use store::LedgerStore;
