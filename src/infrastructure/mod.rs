//! Infrastructure layer: record store, session input and DI container
//!
//! This layer implements the record store boundary and wires up services.

pub mod di;
pub mod error;
pub mod session_file;
pub mod store;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use store::SessionStore;
pub use traits::RecordStore;
