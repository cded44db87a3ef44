//! Ledger service
//!
//! Recomputes balances and settlement transfers from the record store.
//! Nothing is cached: every call starts from a fresh balance sheet.

use tracing::{debug, instrument, trace, warn};

use crate::application::ApplicationResult;
use crate::domain::{allocate, plan_transfers, BalanceSheet, MemberId, SettlementPlan};
use crate::infrastructure::traits::RecordStore;

/// Balance aggregation and settlement over a borrowed record store.
///
/// The store is borrowed immutably for the lifetime of the service, so
/// mutations cannot interleave with a recomputation.
pub struct LedgerService<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    tolerance: f64,
}

impl<'a, S: RecordStore + ?Sized> LedgerService<'a, S> {
    /// Create a ledger. `tolerance` is the relative epsilon for zero checks
    /// (typically 1e-9), scaled by the size of the amounts involved.
    pub fn new(store: &'a S, tolerance: f64) -> Self {
        Self { store, tolerance }
    }

    /// Net balance and paid total for every member ever created.
    ///
    /// Active expenses are applied in id order; soft-deleted ones are skipped
    /// entirely. Participant weights are resolved from the current member
    /// records, including soft-deleted members.
    ///
    /// # Errors
    /// * `InvalidWeight` / `UnknownMember` from allocating any expense
    /// * `UnbalancedLedger` if the resulting balances do not sum to zero
    #[instrument(level = "debug", skip(self))]
    pub fn compute_balances(&self) -> ApplicationResult<BalanceSheet> {
        let members = self.store.list_members();
        let mut sheet = BalanceSheet::with_members(members.iter().map(|m| m.id));

        let mut expenses = self.store.list_active_expenses();
        expenses.sort_by_key(|e| e.id);

        for expense in &expenses {
            let shares = allocate(expense, |id| {
                self.store.resolve_member(id).map(|m| m.weight)
            })?;
            trace!("compute_balances: {} -> {:?}", expense.id, shares);
            sheet.apply_expense(expense, &shares);
        }

        sheet.ensure_balanced(self.tolerance)?;
        debug!(
            "compute_balances: {} members, {} active expenses",
            sheet.len(),
            expenses.len()
        );
        Ok(sheet)
    }

    /// Transfers that settle every active member's balance.
    ///
    /// Soft-deleted members keep their balance in [`compute_balances`](Self::compute_balances)
    /// but are never proposed as payer or payee. Whatever they still hold
    /// cannot be netted among active members; the active counterparts of that
    /// amount come back in [`SettlementPlan::unsettled`].
    #[instrument(level = "debug", skip(self))]
    pub fn compute_settlement(&self) -> ApplicationResult<SettlementPlan> {
        let sheet = self.compute_balances()?;

        let balances: Vec<(MemberId, f64)> = self
            .store
            .list_active_members()
            .iter()
            .filter_map(|m| sheet.get(m.id).map(|b| (m.id, b.balance)))
            .collect();

        let plan = plan_transfers(&balances, self.tolerance);
        if !plan.unsettled.is_empty() {
            warn!(
                "compute_settlement: balances held by inactive members leave {:?} unsettled",
                plan.unsettled
            );
        }
        debug!("compute_settlement: {} transfers", plan.transfers.len());
        Ok(plan)
    }
}
