//! groupsplit: shared expense ledger
//!
//! Tracks expenses shared by the members of a session and derives, on demand,
//! each member's net balance plus a small set of transfers settling them all.
//!
//! Layers, lowest first:
//! - [`domain`]: entities, weighted allocation, balance sheet, settlement planner
//! - [`application`]: [`LedgerService`](application::services::LedgerService)
//! - [`infrastructure`]: record store boundary, in-memory store, session files
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
