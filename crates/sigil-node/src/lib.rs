//! # Sigil Node
//!
//! Long-running service for the Sigil daily check-in protocol: HTTP API,
//! settlement cron surface, day-flip notifications and Prometheus metrics.

pub mod api;
pub mod config;
pub mod metrics;
pub mod node;
pub mod notify;

pub use api::{ApiServer, AppContext};
pub use config::NodeConfig;
pub use node::{NodeState, SigilNode};
pub use notify::{Broadcaster, DayNotifier, LogBroadcaster};
