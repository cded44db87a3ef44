//! Tests for debt netting over raw balance vectors

use rstest::rstest;

use groupsplit::domain::{
    ensure_zero_sum, plan_settlement, plan_transfers, DomainError, MemberId, Transfer,
};

const EPS: f64 = 1e-9;

fn balances(values: &[f64]) -> Vec<(MemberId, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(i, &b)| (MemberId(i as u32 + 1), b))
        .collect()
}

fn residuals(input: &[(MemberId, f64)], transfers: &[Transfer]) -> Vec<f64> {
    input
        .iter()
        .map(|&(id, balance)| {
            let paid: f64 = transfers.iter().filter(|t| t.from == id).map(|t| t.amount).sum();
            let received: f64 = transfers.iter().filter(|t| t.to == id).map(|t| t.amount).sum();
            balance + paid - received
        })
        .collect()
}

#[rstest]
#[case::two_people(&[50.0, -50.0])]
#[case::one_creditor(&[90.0, -30.0, -30.0, -30.0])]
#[case::one_debtor(&[10.0, 20.0, 30.0, -60.0])]
#[case::mixed(&[120.5, -40.25, 15.0, -95.25, 0.0])]
#[case::cents(&[0.01, 0.02, -0.03])]
#[case::large(&[1_000_000.0, -999_999.99, -0.01])]
fn given_zero_sum_balances_when_settling_then_everyone_ends_at_zero(#[case] values: &[f64]) {
    // Arrange
    let input = balances(values);
    let nonzero = values.iter().filter(|b| b.abs() > EPS).count();

    // Act
    let transfers = plan_settlement(&input, EPS).unwrap();

    // Assert
    assert!(transfers.len() <= nonzero.saturating_sub(1));
    assert!(transfers.iter().all(|t| t.amount > 0.0 && t.from != t.to));
    for residual in residuals(&input, &transfers) {
        assert!(residual.abs() < 1e-6, "residual {residual}");
    }
}

#[test]
fn given_all_settled_when_planning_then_no_transfers() {
    let transfers = plan_settlement(&balances(&[0.0, 1e-12, -1e-12]), EPS).unwrap();
    assert!(transfers.is_empty());
}

#[test]
fn given_empty_input_when_planning_then_no_transfers() {
    assert!(plan_settlement(&[], EPS).unwrap().is_empty());
}

#[test]
fn given_nonzero_sum_when_planning_then_unbalanced_ledger() {
    let result = plan_settlement(&balances(&[10.0, -9.0]), EPS);

    match result {
        Err(DomainError::UnbalancedLedger { residual }) => assert!((residual - 1.0).abs() < EPS),
        other => panic!("expected UnbalancedLedger, got {other:?}"),
    }
}

#[rstest]
#[case::rounding_noise(&[1.0e9, -5.0e8, -5.0e8 + 1.0e-6], true)]
#[case::small_ledger_noise(&[0.5, -0.5 + 1.0e-10], true)]
#[case::lost_cent_in_small_ledger(&[10.0, -9.99], false)]
#[case::lost_share_in_large_ledger(&[1.0e9, -9.0e8], false)]
fn given_residual_when_checking_zero_sum_then_bound_scales_with_ledger_size(
    #[case] values: &[f64],
    #[case] accepted: bool,
) {
    let result = ensure_zero_sum(values.iter().copied(), EPS);

    assert_eq!(result.is_ok(), accepted, "{values:?}: {result:?}");
}

#[test]
fn given_large_balances_with_rounding_noise_when_settling_then_no_dust_left() {
    // Arrange: sums to about 1e-6, far above the absolute epsilon
    let input = balances(&[2.0e8, -1.2e8, -8.0e7 + 1.0e-6]);

    // Act
    let plan = plan_transfers(&input, EPS);

    // Assert
    assert_eq!(plan.transfers.len(), 2);
    assert!(plan.unsettled.is_empty(), "{:?}", plan.unsettled);
}

#[test]
fn given_nan_balance_when_planning_then_unbalanced_ledger() {
    let result = plan_settlement(&balances(&[f64::NAN, 0.0]), EPS);
    assert!(matches!(result, Err(DomainError::UnbalancedLedger { .. })));
}

#[test]
fn given_largest_pair_when_planning_then_settled_first() {
    // Arrange: C owes most, B is owed most
    let input = balances(&[20.0, 80.0, -100.0]);

    // Act
    let transfers = plan_settlement(&input, EPS).unwrap();

    // Assert
    assert_eq!(
        transfers,
        vec![
            Transfer { from: MemberId(3), to: MemberId(2), amount: 80.0 },
            Transfer { from: MemberId(3), to: MemberId(1), amount: 20.0 },
        ]
    );
}

#[test]
fn given_equal_magnitudes_when_planning_then_lower_id_first() {
    let input = balances(&[-10.0, -10.0, 10.0, 10.0]);

    let transfers = plan_settlement(&input, EPS).unwrap();

    assert_eq!(
        transfers,
        vec![
            Transfer { from: MemberId(1), to: MemberId(3), amount: 10.0 },
            Transfer { from: MemberId(2), to: MemberId(4), amount: 10.0 },
        ]
    );
}

#[test]
fn given_same_input_when_planning_twice_then_identical() {
    let input = balances(&[33.33, -11.11, 44.44, -66.66]);

    assert_eq!(
        plan_settlement(&input, EPS).unwrap(),
        plan_settlement(&input, EPS).unwrap()
    );
}

#[test]
fn given_unbalanced_input_when_planning_transfers_then_remainder_unsettled() {
    // Arrange: creditor #1 is owed more than the single debtor can pay
    let input = balances(&[60.0, -30.0]);

    // Act
    let plan = plan_transfers(&input, EPS);

    // Assert
    assert_eq!(plan.transfers.len(), 1);
    assert_eq!(plan.transfers[0].amount, 30.0);
    assert_eq!(plan.unsettled, vec![(MemberId(1), 30.0)]);
}
