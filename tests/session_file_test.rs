//! Tests for reading session TOML files into a store

use std::fs;

use tempfile::TempDir;

use groupsplit::application::services::LedgerService;
use groupsplit::cli::error::CliError;
use groupsplit::config::Settings;
use groupsplit::domain::{ExpenseId, MemberId};
use groupsplit::exitcode;
use groupsplit::infrastructure::di::ServiceContainer;
use groupsplit::infrastructure::session_file::{load_session, parse_session};
use groupsplit::infrastructure::{InfraError, RecordStore};
use groupsplit::util::testing::init_test_setup;

const TRIP: &str = r#"
name = "Beach weekend"
description = "Three friends, one car"
tags = ["beach", "2026"]

[[members]]
name = "Ana"

[[members]]
name = "Bia"
weight = 2.0

[[members]]
name = "Caio"
description = "left early"
active = false

[[expenses]]
name = "fuel"
value = 90.0
payer = "Ana"
participants = ["Ana", "Bia", "Caio"]

[[expenses]]
name = "dinner"
value = 60.0
payer = "Bia"

[[expenses]]
name = "cancelled boat"
value = 500.0
payer = "Caio"
active = false
"#;

#[test]
fn given_valid_file_when_parsing_then_session_and_records_loaded() {
    // Arrange
    init_test_setup();

    // Act
    let store = parse_session(TRIP).expect("parse session");

    // Assert
    let session = store.session();
    assert_eq!(session.name, "Beach weekend");
    assert_eq!(session.description, "Three friends, one car");
    assert_eq!(session.tags.len(), 2);
    assert_eq!(store.list_members().len(), 3);
    assert_eq!(store.list_active_members().len(), 2);
    assert_eq!(store.member(MemberId(2)).map(|m| m.weight), Some(2.0));
    assert_eq!(
        store.member(MemberId(3)).and_then(|m| m.description.clone()),
        Some("left early".to_string())
    );
}

#[test]
fn given_inactive_member_in_history_when_parsing_then_expense_kept() {
    let store = parse_session(TRIP).unwrap();

    let fuel = store.expense(ExpenseId(1)).unwrap();

    assert!(fuel.active);
    assert!(fuel.involves(MemberId(3)));
}

#[test]
fn given_no_participants_when_parsing_then_active_members_share() {
    let store = parse_session(TRIP).unwrap();

    let dinner = store.expense(ExpenseId(2)).unwrap();

    assert_eq!(
        dinner.participants.iter().copied().collect::<Vec<_>>(),
        vec![MemberId(1), MemberId(2)]
    );
}

#[test]
fn given_inactive_expense_when_computing_balances_then_ignored() {
    // Arrange
    let store = parse_session(TRIP).unwrap();
    let ledger = LedgerService::new(&store, 1e-9);

    // Act
    let sheet = ledger.compute_balances().unwrap();

    // Assert: fuel 90 split 1:2:1, dinner 60 split 1:2 between Ana and Bia
    assert_eq!(store.list_active_expenses().len(), 2);
    assert!((sheet.get(MemberId(1)).unwrap().balance - (90.0 - 22.5 - 20.0)).abs() < 1e-9);
    assert!((sheet.get(MemberId(2)).unwrap().balance - (60.0 - 45.0 - 40.0)).abs() < 1e-9);
    assert!((sheet.get(MemberId(3)).unwrap().balance + 22.5).abs() < 1e-9);
    assert_eq!(sheet.get(MemberId(3)).unwrap().paid, 0.0);
}

#[test]
fn given_duplicate_member_name_when_parsing_then_session_format_error() {
    let content = r#"
name = "dup"
[[members]]
name = "Ana"
[[members]]
name = "Ana"
"#;

    let err = parse_session(content).unwrap_err();

    assert!(matches!(err, InfraError::SessionFormat { .. }));
    assert!(err.to_string().contains("duplicate member name 'Ana'"));
}

#[test]
fn given_unknown_payer_name_when_parsing_then_session_format_error() {
    let content = r#"
name = "typo"
[[members]]
name = "Ana"
[[expenses]]
name = "lunch"
value = 12.0
payer = "Anna"
"#;

    let err = parse_session(content).unwrap_err();

    assert!(err.to_string().contains("unknown member 'Anna'"), "got: {err}");
}

#[test]
fn given_unknown_field_when_parsing_then_session_format_error() {
    let content = r#"
name = "strict"
[[members]]
name = "Ana"
wieght = 2.0
"#;

    assert!(matches!(
        parse_session(content),
        Err(InfraError::SessionFormat { .. })
    ));
}

#[test]
fn given_non_positive_value_when_parsing_then_domain_error() {
    let content = r#"
name = "refund"
[[members]]
name = "Ana"
[[expenses]]
name = "refund"
value = -3.0
payer = "Ana"
"#;

    let err = parse_session(content).unwrap_err();

    assert!(matches!(err, InfraError::Application(_)), "got: {err:?}");
    assert_eq!(CliError::from(err).exit_code(), exitcode::DATAERR);
}

#[test]
fn given_file_on_disk_when_loading_then_parsed() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trip.toml");
    fs::write(&path, TRIP).unwrap();

    // Act
    let store = load_session(&path).expect("load session");

    // Assert
    assert_eq!(store.session().name, "Beach weekend");
}

#[test]
fn given_malformed_file_on_disk_when_loading_then_error_names_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "name = \n").unwrap();

    let err = load_session(&path).unwrap_err();

    match &err {
        InfraError::SessionFormat { source_name, .. } => {
            assert_eq!(source_name, &path.display().to_string())
        }
        other => panic!("expected SessionFormat, got {other:?}"),
    }
    assert_eq!(CliError::from(err).exit_code(), exitcode::DATAERR);
}

#[test]
fn given_missing_file_when_loading_container_then_noinput_exit_code() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope.toml");

    let err = ServiceContainer::load(Settings::default(), &path).unwrap_err();

    assert!(matches!(err, InfraError::Io { .. }));
    assert_eq!(CliError::from(err).exit_code(), exitcode::NOINPUT);
}

#[test]
fn given_loaded_container_when_settling_then_uses_active_members() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trip.toml");
    fs::write(&path, TRIP).unwrap();
    let container = ServiceContainer::load(Settings::default(), &path).unwrap();

    // Act
    let plan = container.ledger().compute_settlement().unwrap();

    // Assert: Caio's debt stays with Caio; only Bia pays Ana
    let transfers = plan.transfers;
    assert_eq!(transfers.len(), 1);
    assert_eq!((transfers[0].from, transfers[0].to), (MemberId(2), MemberId(1)));
    assert!((transfers[0].amount - 25.0).abs() < 1e-9);
    assert_eq!(plan.unsettled.len(), 1);
    assert_eq!(plan.unsettled[0].0, MemberId(1));
    assert!((plan.unsettled[0].1 - 22.5).abs() < 1e-9);
}
