//! Debt netting: turn signed balances into pairwise transfers.
//!
//! Greedy largest-pair settlement. Debtors and creditors live in two max-heaps
//! ordered by outstanding magnitude (lower member id first on ties). Each round
//! pairs the two heads, moves `min(debt, credit)` and drops whichever side
//! reached zero, so every round retires at least one party and `n` non-zero
//! members settle in at most `n - 1` transfers.

use std::cmp::Ordering;
use std::collections::binary_heap::PeekMut;
use std::collections::BinaryHeap;
use std::fmt;

use crate::domain::entities::MemberId;
use crate::domain::error::{DomainError, DomainResult};

/// Proposed payment: `from` pays `to` the given amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transfer {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: f64,
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {:.2}", self.from, self.to, self.amount)
    }
}

/// Outcome of netting a set of balances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettlementPlan {
    /// Transfers in emission order
    pub transfers: Vec<Transfer>,
    /// Signed balances left once one side ran out (empty for zero-sum input)
    pub unsettled: Vec<(MemberId, f64)>,
}

/// A debtor or creditor with the outstanding magnitude (always positive).
#[derive(Debug, Clone, Copy)]
struct Party {
    id: MemberId,
    outstanding: f64,
}

impl Ord for Party {
    fn cmp(&self, other: &Self) -> Ordering {
        self.outstanding
            .total_cmp(&other.outstanding)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Party {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Party {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Party {}

/// Zero threshold for amounts of the given total magnitude.
///
/// `tolerance` is relative: float error grows with the size of the amounts
/// summed, so the threshold is `tolerance * magnitude` with an absolute floor
/// of `tolerance` for ledgers smaller than one unit.
pub fn scaled_tolerance(tolerance: f64, magnitude: f64) -> f64 {
    tolerance * magnitude.max(1.0)
}

/// Fail with `UnbalancedLedger` unless `residual` is within `bound` of zero.
pub(crate) fn check_residual(residual: f64, bound: f64) -> DomainResult<()> {
    if residual.is_nan() || residual.abs() > bound {
        return Err(DomainError::UnbalancedLedger { residual });
    }
    Ok(())
}

/// Fail with `UnbalancedLedger` unless `balances` sum to zero within
/// `tolerance` scaled by their total absolute size.
pub fn ensure_zero_sum(
    balances: impl IntoIterator<Item = f64>,
    tolerance: f64,
) -> DomainResult<()> {
    let (residual, magnitude) = balances
        .into_iter()
        .fold((0.0, 0.0), |(sum, size), b| (sum + b, size + b.abs()));
    check_residual(residual, scaled_tolerance(tolerance, magnitude))
}

/// Settle a zero-sum balance vector.
///
/// # Errors
/// [`DomainError::UnbalancedLedger`] if the balances do not sum to zero
/// within the scaled tolerance. Never corrected silently.
pub fn plan_settlement(
    balances: &[(MemberId, f64)],
    tolerance: f64,
) -> DomainResult<Vec<Transfer>> {
    ensure_zero_sum(balances.iter().map(|(_, b)| *b), tolerance)?;
    Ok(plan_transfers(balances, tolerance).transfers)
}

/// Net as much of `balances` as possible without checking the zero-sum invariant.
///
/// Balances within the scaled tolerance of zero are treated as settled.
/// Whatever cannot be netted once one side runs out is returned in
/// [`SettlementPlan::unsettled`].
pub fn plan_transfers(balances: &[(MemberId, f64)], tolerance: f64) -> SettlementPlan {
    let magnitude: f64 = balances.iter().map(|(_, b)| b.abs()).sum();
    let dust = scaled_tolerance(tolerance, magnitude);

    let mut debtors = BinaryHeap::new();
    let mut creditors = BinaryHeap::new();
    for &(id, balance) in balances {
        if balance < -dust {
            debtors.push(Party { id, outstanding: -balance });
        } else if balance > dust {
            creditors.push(Party { id, outstanding: balance });
        }
    }

    let mut transfers = Vec::with_capacity(debtors.len() + creditors.len());
    while let (Some(mut debtor), Some(mut creditor)) = (debtors.peek_mut(), creditors.peek_mut()) {
        let amount = debtor.outstanding.min(creditor.outstanding);
        transfers.push(Transfer {
            from: debtor.id,
            to: creditor.id,
            amount,
        });

        debtor.outstanding -= amount;
        creditor.outstanding -= amount;
        if debtor.outstanding <= dust {
            PeekMut::pop(debtor);
        }
        if creditor.outstanding <= dust {
            PeekMut::pop(creditor);
        }
    }

    let mut unsettled: Vec<(MemberId, f64)> = debtors
        .into_iter()
        .map(|p| (p.id, -p.outstanding))
        .chain(creditors.into_iter().map(|p| (p.id, p.outstanding)))
        .collect();
    unsettled.sort_by_key(|(id, _)| *id);

    SettlementPlan {
        transfers,
        unsettled,
    }
}
