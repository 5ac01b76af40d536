//! Withdrawal approval across provider, request and ledger

mod common;

use console_core::ErrorCode;
use console_core::directory::PROVIDERS;
use console_core::finance::WITHDRAWALS;
use rust_decimal::Decimal;
use serde_json::json;
use shared::models::{BankDetails, WithdrawalCreate, WithdrawalStatus};

fn seed_provider(state: &console_core::ConsoleState, balance: f64) {
    state
        .store
        .set(PROVIDERS, "prov-1", json!({"name": "Turki", "balance": balance, "approvalStatus": "approved"}))
        .unwrap();
}

fn file_request(state: &console_core::ConsoleState, amount: i64) -> String {
    state
        .withdrawals
        .create_withdrawal_request(WithdrawalCreate {
            provider_id: "prov-1".into(),
            amount: Decimal::from(amount),
            bank_details: BankDetails {
                iban: Some("SA4420000001234567891234".into()),
                ..Default::default()
            },
        })
        .unwrap()
        .id
}

#[test]
fn test_approval_moves_balance_once() {
    let (_dir, state) = common::create_test_state();
    seed_provider(&state, 500.0);
    let request_id = file_request(&state, 200);

    state.withdrawals.approve_withdrawal(&request_id, "admin-1").unwrap();

    let provider = state.providers.get_provider("prov-1").unwrap();
    assert_eq!(provider.balance, Decimal::from(300));
    let ledger = state.withdrawals.list_transactions("prov-1").unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].amount, Decimal::from(200));

    let err = state.withdrawals.approve_withdrawal(&request_id, "admin-2").unwrap_err();
    assert_eq!(err.code, ErrorCode::WithdrawalAlreadyProcessed);
    assert_eq!(state.providers.get_provider("prov-1").unwrap().balance, Decimal::from(300));
}

#[test]
fn test_overdraw_is_refused_without_side_effects() {
    let (_dir, state) = common::create_test_state();
    seed_provider(&state, 500.0);
    let first = file_request(&state, 400);
    let second = file_request(&state, 300);

    state.withdrawals.approve_withdrawal(&first, "admin-1").unwrap();
    let err = state.withdrawals.approve_withdrawal(&second, "admin-1").unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientBalance);

    assert_eq!(state.providers.get_provider("prov-1").unwrap().balance, Decimal::from(100));
    let pending = state.withdrawals.list_withdrawals(Some(WithdrawalStatus::Pending)).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, second);
    assert_eq!(state.withdrawals.list_transactions("prov-1").unwrap().len(), 1);
}

#[test]
fn test_request_above_balance_refused_up_front() {
    let (_dir, state) = common::create_test_state();
    seed_provider(&state, 500.0);
    let err = state
        .withdrawals
        .create_withdrawal_request(WithdrawalCreate {
            provider_id: "prov-1".into(),
            amount: Decimal::from(600),
            bank_details: BankDetails::default(),
        })
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientBalance);
    assert!(state.withdrawals.list_withdrawals(None).unwrap().is_empty());
}

#[test]
fn test_request_filed_elsewhere_above_balance() {
    let (_dir, state) = common::create_test_state();
    seed_provider(&state, 500.0);
    // requests also arrive from the provider app, unchecked
    state
        .store
        .set(
            WITHDRAWALS,
            "wr-600",
            json!({"providerId": "prov-1", "amount": 600.0, "status": "pending"}),
        )
        .unwrap();

    let err = state.withdrawals.approve_withdrawal("wr-600", "admin-1").unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientBalance);
    assert_eq!(state.providers.get_provider("prov-1").unwrap().balance, Decimal::from(500));
    assert_eq!(
        state.withdrawals.get_withdrawal("wr-600").unwrap().status,
        WithdrawalStatus::Pending
    );
    assert!(state.withdrawals.list_transactions("prov-1").unwrap().is_empty());
}
