//! Withdrawal & Transaction Log Models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::timestamp::{self, Timestamp};

/// Withdrawal request state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Bank details a provider supplies with a request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub account_holder: Option<String>,
    #[serde(default)]
    pub iban: Option<String>,
}

/// Provider withdrawal request entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    #[serde(default)]
    pub id: String,
    pub provider_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub status: WithdrawalStatus,
    #[serde(default)]
    pub bank_details: BankDetails,
    #[serde(default, with = "timestamp::lenient")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "timestamp::lenient")]
    pub processed_at: Option<Timestamp>,
    #[serde(default)]
    pub processed_by: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// Create withdrawal request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalCreate {
    pub provider_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub bank_details: BankDetails,
}

/// Ledger entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Withdrawal,
}

/// Append-only ledger entry written with every balance movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLog {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub provider_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance_before: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance_after: Decimal,
    pub request_id: String,
    #[serde(default)]
    pub processed_by: Option<String>,
    #[serde(default, with = "timestamp::lenient")]
    pub created_at: Option<Timestamp>,
}

/// Bank settings singleton shown to providers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankSettings {
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub account_holder: Option<String>,
    #[serde(default)]
    pub iban: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default, with = "timestamp::lenient")]
    pub updated_at: Option<Timestamp>,
}
