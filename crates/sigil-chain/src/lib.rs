//! # Sigil Chain
//!
//! Everything that touches the chain or its cryptography:
//! - `ChainClient` - the trait the settlement core sees
//! - signed-message verification for check-in and claim authorization
//! - the disburser keypair and native transfer construction
//! - bounded confirmation polling
//! - `RpcChainClient` - the JSON-RPC implementation
//!
//! The settlement crates depend only on the [`ChainClient`] trait. Wire
//! encoding, RPC shapes and base58 handling stay behind it.

pub mod client;
pub mod confirm;
pub mod keypair;
pub mod rpc;
pub mod signature;
pub mod tx;

pub use client::{ChainClient, TxStatus};
pub use confirm::{poll_confirmation, ConfirmPolicy};
pub use keypair::DisburserKey;
pub use rpc::RpcChainClient;
pub use signature::verify_wallet_signature;
