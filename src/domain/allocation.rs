//! Weighted proportional allocation of a single expense.

use crate::domain::entities::{Expense, MemberId};
use crate::domain::error::{DomainError, DomainResult};

/// One participant's share of an expense.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub member: MemberId,
    pub amount: f64,
}

/// Split `expense.value` across its participants in proportion to their weights.
///
/// `weight_of` resolves a participant's current weight. It must succeed for
/// soft-deleted members too, historical expenses still reference them.
///
/// Shares are `value * w_i / Σw`. The participant with the largest weight
/// (lowest id on ties) absorbs the floating-point remainder so the shares add
/// up to `value`; a zero-weight participant always gets exactly 0.
///
/// # Errors
/// * [`DomainError::UnknownMember`] if `weight_of` cannot resolve a participant
/// * [`DomainError::InvalidWeight`] if a weight is negative or not finite,
///   or if the weights sum to zero
pub fn allocate<F>(expense: &Expense, mut weight_of: F) -> DomainResult<Vec<Contribution>>
where
    F: FnMut(MemberId) -> DomainResult<f64>,
{
    let mut weights = Vec::with_capacity(expense.participants.len());
    for &member in &expense.participants {
        let weight = weight_of(member)?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(DomainError::InvalidWeight {
                expense: expense.id,
                reason: format!("member {member} has weight {weight}"),
            });
        }
        weights.push((member, weight));
    }

    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Err(DomainError::InvalidWeight {
            expense: expense.id,
            reason: "participant weights sum to zero".to_string(),
        });
    }

    let mut shares: Vec<Contribution> = weights
        .iter()
        .map(|&(member, weight)| Contribution {
            member,
            amount: expense.value * (weight / total),
        })
        .collect();

    let heaviest = weights
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(idx, _)| idx);
    if let Some(idx) = heaviest {
        let others: f64 = shares
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, c)| c.amount)
            .sum();
        shares[idx].amount = expense.value - others;
    }

    Ok(shares)
}
