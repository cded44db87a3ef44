//! Domain layer: entities and ledger computation
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).
//! Everything here is a pure function of its inputs.

pub mod allocation;
pub mod balance;
pub mod entities;
pub mod error;
pub mod settlement;

pub use allocation::{allocate, Contribution};
pub use balance::{BalanceSheet, MemberBalance};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use settlement::{ensure_zero_sum, plan_settlement, plan_transfers, SettlementPlan, Transfer};
