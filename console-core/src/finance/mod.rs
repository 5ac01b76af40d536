//! Finance: withdrawals, the transaction ledger and bank settings

pub mod bank_settings;
pub mod withdrawals;

pub use bank_settings::{BANK_SETTINGS_ID, BankSettingsService, SETTINGS};
pub use withdrawals::{TRANSACTIONS, WITHDRAWALS, WithdrawalService};
