//! Guild Points - per-community activity points ledger for chat bots
//! A persistent (guild, user) -> points record with ranked queries and
//! cleanup of stale or departed users. Chat-platform connectivity stays
//! outside this crate; dispatchers drive it one event at a time.

// Ledger core
pub mod error;
pub mod ledger;
pub mod store;

// Consumers of the ledger
pub mod activity;
pub mod commands;

pub mod config;
pub mod utils;

pub use activity::ActivityTracker;
pub use commands::{parse_command, CommandHandler, Roster};
pub use config::BotConfig;
pub use error::LedgerError;
pub use ledger::{entry_key, PointsEntry, PointsLedger};
pub use store::PointsStore;
