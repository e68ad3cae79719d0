//! Match hosting for powerturn.
//!
//! Each table (one match) runs as an isolated Tokio task (actor model)
//! that owns the match context, serializes every request through one
//! queue, and drives a host tick for deadlines and timers.
//!
//! # Key types
//!
//! - [`GameLogic`] — the trait the card engine implements
//! - [`TableManager`] — creates/destroys tables, routes connections
//! - [`TableHandle`] — send commands to a running table actor
//! - [`TableState`] — lifecycle state machine
//! - [`TableConfig`] — tick rate and queue size

mod config;
mod error;
mod logic;
mod manager;
mod table;

pub use config::{TableConfig, TableState};
pub use error::TableError;
pub use logic::{GameLogic, Outbox};
pub use manager::TableManager;
pub use table::{TableHandle, TableInfo, ViewerSender};
