//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services read through the `RecordStore` boundary trait
//! but are themselves concrete structs, not traits.

mod ledger;

pub use ledger::LedgerService;
