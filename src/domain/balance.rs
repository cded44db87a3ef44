//! Per-member balance aggregation.

use std::collections::BTreeMap;

use crate::domain::allocation::Contribution;
use crate::domain::entities::{Expense, MemberId};
use crate::domain::error::DomainResult;
use crate::domain::settlement::{check_residual, scaled_tolerance};

/// Derived totals for one member.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemberBalance {
    /// Net signed amount: positive is owed by the group, negative owes the group
    pub balance: f64,
    /// Total the member fronted as payer
    pub paid: f64,
}

/// Fresh result of one ledger recomputation, keyed by member id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceSheet {
    entries: BTreeMap<MemberId, MemberBalance>,
}

impl BalanceSheet {
    /// Zeroed sheet covering the given members.
    pub fn with_members(members: impl IntoIterator<Item = MemberId>) -> Self {
        Self {
            entries: members
                .into_iter()
                .map(|id| (id, MemberBalance::default()))
                .collect(),
        }
    }

    /// Credit the payer with the full value and debit every participant their share.
    pub fn apply_expense(&mut self, expense: &Expense, contributions: &[Contribution]) {
        let payer = self.entries.entry(expense.payer).or_default();
        payer.paid += expense.value;
        payer.balance += expense.value;

        for share in contributions {
            self.entries.entry(share.member).or_default().balance -= share.amount;
        }
    }

    pub fn get(&self, member: MemberId) -> Option<&MemberBalance> {
        self.entries.get(&member)
    }

    /// Entries in member id order.
    pub fn iter(&self) -> impl Iterator<Item = (MemberId, &MemberBalance)> {
        self.entries.iter().map(|(id, b)| (*id, b))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all balances; zero for a consistent ledger.
    pub fn total(&self) -> f64 {
        self.entries.values().map(|b| b.balance).sum()
    }

    /// Total value of all applied expenses.
    pub fn turnover(&self) -> f64 {
        self.entries.values().map(|b| b.paid).sum()
    }

    /// Fail with `UnbalancedLedger` unless the balances sum to zero.
    ///
    /// `tolerance` is relative to the amounts that went into the sheet: the
    /// larger of the turnover and the summed absolute balances.
    pub fn ensure_balanced(&self, tolerance: f64) -> DomainResult<()> {
        let spread: f64 = self.entries.values().map(|b| b.balance.abs()).sum();
        check_residual(
            self.total(),
            scaled_tolerance(tolerance, self.turnover().max(spread)),
        )
    }

    /// Members whose balance is strictly greater than `threshold`.
    pub fn above(&self, threshold: f64) -> Vec<MemberId> {
        self.iter()
            .filter(|(_, b)| b.balance > threshold)
            .map(|(id, _)| id)
            .collect()
    }

    /// Members whose balance is strictly smaller than `threshold`.
    pub fn below(&self, threshold: f64) -> Vec<MemberId> {
        self.iter()
            .filter(|(_, b)| b.balance < threshold)
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ExpenseId;

    fn expense(value: f64, payer: u32) -> Expense {
        Expense {
            id: ExpenseId(1),
            name: "taxi".to_string(),
            value,
            payer: MemberId(payer),
            participants: [MemberId(1), MemberId(2)].into_iter().collect(),
            description: None,
            active: true,
            version: 1,
        }
    }

    #[test]
    fn given_payer_participates_when_applying_then_net_is_value_minus_share() {
        let mut sheet = BalanceSheet::with_members([MemberId(1), MemberId(2), MemberId(3)]);
        let shares = [
            Contribution { member: MemberId(1), amount: 30.0 },
            Contribution { member: MemberId(2), amount: 30.0 },
        ];

        sheet.apply_expense(&expense(60.0, 1), &shares);

        assert_eq!(sheet.get(MemberId(1)), Some(&MemberBalance { balance: 30.0, paid: 60.0 }));
        assert_eq!(sheet.get(MemberId(2)), Some(&MemberBalance { balance: -30.0, paid: 0.0 }));
        assert_eq!(sheet.get(MemberId(3)), Some(&MemberBalance::default()));
        assert_eq!(sheet.total(), 0.0);
    }

    #[test]
    fn given_balances_when_filtering_then_thresholds_are_strict() {
        let mut sheet = BalanceSheet::with_members([MemberId(1), MemberId(2)]);
        let shares = [
            Contribution { member: MemberId(1), amount: 5.0 },
            Contribution { member: MemberId(2), amount: 5.0 },
        ];
        sheet.apply_expense(&expense(10.0, 2), &shares);

        assert_eq!(sheet.above(0.0), vec![MemberId(2)]);
        assert_eq!(sheet.below(0.0), vec![MemberId(1)]);
        assert!(sheet.above(5.0).is_empty());
    }

    #[test]
    fn given_missing_share_when_checking_balance_then_unbalanced_ledger() {
        let mut sheet = BalanceSheet::with_members([MemberId(1), MemberId(2)]);
        let shares = [Contribution { member: MemberId(1), amount: 30.0 }];
        sheet.apply_expense(&expense(60.0, 1), &shares);

        assert!(matches!(
            sheet.ensure_balanced(1e-9),
            Err(crate::domain::DomainError::UnbalancedLedger { .. })
        ));
    }

    #[test]
    fn given_rounding_noise_on_large_turnover_when_checking_balance_then_accepted() {
        let mut sheet = BalanceSheet::with_members([MemberId(1), MemberId(2)]);
        let shares = [
            Contribution { member: MemberId(1), amount: 5e8 },
            Contribution { member: MemberId(2), amount: 5e8 - 1e-6 },
        ];
        sheet.apply_expense(&expense(1e9, 1), &shares);

        assert!(sheet.total().abs() > 1e-9);
        assert!(sheet.ensure_balanced(1e-9).is_ok());
        assert_eq!(sheet.turnover(), 1e9);
    }
}
