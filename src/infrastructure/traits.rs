//! Record store boundary
//!
//! The ledger only reads through this trait, so it can be driven by the
//! in-memory [`SessionStore`](crate::infrastructure::store::SessionStore)
//! or by any other backing store.

use crate::domain::{DomainResult, Expense, Member, MemberId};

/// Read access to the members and expenses of one session.
pub trait RecordStore {
    /// Every member ever created, soft-deleted ones included, in id order.
    fn list_members(&self) -> Vec<Member>;

    /// Members that are not soft-deleted, in id order.
    fn list_active_members(&self) -> Vec<Member>;

    /// Expenses that are not soft-deleted, in id order.
    fn list_active_expenses(&self) -> Vec<Expense>;

    /// Look up a member by id, active or not.
    ///
    /// Fails with [`DomainError::UnknownMember`](crate::domain::DomainError::UnknownMember)
    /// if the id was never created.
    fn resolve_member(&self, id: MemberId) -> DomainResult<Member>;
}
