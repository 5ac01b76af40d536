//! Provider withdrawals
//!
//! Approval debits the provider balance, marks the request approved and
//! appends a ledger entry in a single store transaction. Any failure leaves
//! all three documents untouched.

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Value, json};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    Provider, TransactionLog, TransactionType, WithdrawalCreate, WithdrawalRequest, WithdrawalStatus,
};
use shared::timestamp::Timestamp;

use crate::directory::PROVIDERS;
use crate::directory::providers::provider_not_found;
use crate::security_log;
use crate::store::{Collection, DocumentStore, StoreResult, StoreTxn, to_document};
use crate::utils::InFlightGuard;

pub const WITHDRAWALS: &str = "withdrawalRequests";
pub const TRANSACTIONS: &str = "transactions";

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Encode money the way the models store it
fn money_value(value: Decimal) -> StoreResult<Value> {
    Ok(rust_decimal::serde::float::serialize(&value, serde_json::value::Serializer)?)
}

fn withdrawal_not_found(id: &str) -> AppError {
    AppError::not_found_with(ErrorCode::WithdrawalNotFound, id)
}

fn require_pending(request: &WithdrawalRequest) -> AppResult<()> {
    if request.status != WithdrawalStatus::Pending {
        return Err(AppError::new(ErrorCode::WithdrawalAlreadyProcessed)
            .with_detail("id", request.id.clone())
            .with_detail("status", format!("{:?}", request.status).to_lowercase()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct WithdrawalService {
    store: DocumentStore,
    requests: Collection<WithdrawalRequest>,
    providers: Collection<Provider>,
    ledger: Collection<TransactionLog>,
    guard: InFlightGuard,
    min_amount: Decimal,
}

impl WithdrawalService {
    pub fn new(store: DocumentStore, guard: InFlightGuard, min_amount: Decimal) -> Self {
        Self {
            requests: store.collection(WITHDRAWALS),
            providers: store.collection(PROVIDERS),
            ledger: store.collection(TRANSACTIONS),
            store,
            guard,
            min_amount,
        }
    }

    pub fn get_withdrawal(&self, id: &str) -> AppResult<WithdrawalRequest> {
        self.requests.get(id)?.ok_or_else(|| withdrawal_not_found(id))
    }

    /// Requests newest first, optionally only those in `status`
    pub fn list_withdrawals(&self, status: Option<WithdrawalStatus>) -> AppResult<Vec<WithdrawalRequest>> {
        let mut requests: Vec<WithdrawalRequest> = self
            .requests
            .all()?
            .into_iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    /// Ledger entries for one provider, newest first
    pub fn list_transactions(&self, provider_id: &str) -> AppResult<Vec<TransactionLog>> {
        let mut entries: Vec<TransactionLog> = self
            .ledger
            .all()?
            .into_iter()
            .filter(|t| t.provider_id == provider_id)
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    pub fn create_withdrawal_request(&self, data: WithdrawalCreate) -> AppResult<WithdrawalRequest> {
        let amount = money(data.amount);
        if amount <= Decimal::ZERO || amount < self.min_amount {
            return Err(AppError::with_message(
                ErrorCode::WithdrawalInvalidAmount,
                format!("Withdrawal amount must be at least {}", self.min_amount),
            )
            .with_detail("amount", amount.to_string()));
        }
        let provider = self
            .providers
            .get(&data.provider_id)?
            .ok_or_else(|| provider_not_found(&data.provider_id))?;
        if provider.balance < amount {
            return Err(AppError::new(ErrorCode::InsufficientBalance)
                .with_detail("balance", provider.balance.to_string())
                .with_detail("amount", amount.to_string()));
        }

        let id = self.requests.insert(&WithdrawalRequest {
            id: String::new(),
            provider_id: data.provider_id,
            amount,
            status: WithdrawalStatus::Pending,
            bank_details: data.bank_details,
            created_at: Some(Timestamp::now()),
            processed_at: None,
            processed_by: None,
            rejection_reason: None,
        })?;
        tracing::info!(request_id = %id, amount = %amount, "Withdrawal request created");
        self.get_withdrawal(&id)
    }

    /// Approve a pending request and debit the provider
    pub fn approve_withdrawal(&self, id: &str, admin_id: &str) -> AppResult<WithdrawalRequest> {
        let _ticket = self.guard.acquire(WITHDRAWALS, id)?;
        let entry = self.store.transaction(|txn| -> AppResult<TransactionLog> {
            let request = self.load(txn, id)?;
            require_pending(&request)?;

            let provider = self
                .providers
                .get_in(txn, &request.provider_id)?
                .ok_or_else(|| provider_not_found(&request.provider_id))?;
            let balance_before = money(provider.balance);
            if balance_before < request.amount {
                return Err(AppError::new(ErrorCode::InsufficientBalance)
                    .with_detail("balance", balance_before.to_string())
                    .with_detail("amount", request.amount.to_string()));
            }
            let balance_after = money(balance_before - request.amount);
            let now = Timestamp::now();

            self.providers
                .update_in(txn, &provider.id, json!({ "balance": money_value(balance_after)? }))?;
            self.requests.update_in(
                txn,
                id,
                json!({
                    "status": WithdrawalStatus::Approved,
                    "processedAt": now,
                    "processedBy": admin_id,
                }),
            )?;

            let mut entry = TransactionLog {
                id: String::new(),
                kind: TransactionType::Withdrawal,
                provider_id: provider.id.clone(),
                amount: request.amount,
                balance_before,
                balance_after,
                request_id: id.to_string(),
                processed_by: Some(admin_id.to_string()),
                created_at: Some(now),
            };
            entry.id = txn.create(TRANSACTIONS, to_document(&entry)?)?;
            Ok(entry)
        })?;

        security_log!(
            "INFO",
            "withdrawal_approved",
            request_id = id,
            admin_id = admin_id,
            provider_id = entry.provider_id.as_str(),
            amount = entry.amount.to_string().as_str()
        );
        self.get_withdrawal(id)
    }

    pub fn reject_withdrawal(&self, id: &str, admin_id: &str, reason: Option<&str>) -> AppResult<WithdrawalRequest> {
        let _ticket = self.guard.acquire(WITHDRAWALS, id)?;
        self.store.transaction(|txn| -> AppResult<()> {
            let request = self.load(txn, id)?;
            require_pending(&request)?;
            let reason = reason.map(str::trim).filter(|r| !r.is_empty());
            self.requests.update_in(
                txn,
                id,
                json!({
                    "status": WithdrawalStatus::Rejected,
                    "processedAt": Timestamp::now(),
                    "processedBy": admin_id,
                    "rejectionReason": reason,
                }),
            )?;
            Ok(())
        })?;
        security_log!("INFO", "withdrawal_rejected", request_id = id, admin_id = admin_id);
        self.get_withdrawal(id)
    }

    fn load(&self, txn: &mut StoreTxn, id: &str) -> AppResult<WithdrawalRequest> {
        self.requests.get_in(txn, id)?.ok_or_else(|| withdrawal_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::BankDetails;

    fn create_test_service(balance: f64) -> (DocumentStore, WithdrawalService) {
        let store = DocumentStore::open_in_memory().unwrap();
        store
            .set(PROVIDERS, "p1", json!({"name": "Khalid", "balance": balance}))
            .unwrap();
        let svc = WithdrawalService::new(store.clone(), InFlightGuard::new(), Decimal::from(50));
        (store, svc)
    }

    fn request(svc: &WithdrawalService, amount: i64) -> WithdrawalRequest {
        svc.create_withdrawal_request(WithdrawalCreate {
            provider_id: "p1".into(),
            amount: Decimal::from(amount),
            bank_details: BankDetails::default(),
        })
        .unwrap()
    }

    fn balance(store: &DocumentStore) -> Decimal {
        store.collection::<Provider>(PROVIDERS).get("p1").unwrap().unwrap().balance
    }

    #[test]
    fn test_approve_debits_and_logs() {
        let (store, svc) = create_test_service(500.0);
        let req = request(&svc, 200);

        let approved = svc.approve_withdrawal(&req.id, "admin-1").unwrap();
        assert_eq!(approved.status, WithdrawalStatus::Approved);
        assert_eq!(approved.processed_by.as_deref(), Some("admin-1"));
        assert_eq!(balance(&store), Decimal::from(300));

        let ledger = svc.list_transactions("p1").unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].balance_before, Decimal::from(500));
        assert_eq!(ledger[0].balance_after, Decimal::from(300));
        assert_eq!(ledger[0].request_id, req.id);
    }

    #[test]
    fn test_approval_keeps_unmodelled_fields() {
        let (store, svc) = create_test_service(500.0);
        store
            .update(PROVIDERS, "p1", json!({"vehiclePhotoUrl": "v.jpg", "licensePhotoUrl": "l.jpg"}))
            .unwrap();
        let req = request(&svc, 200);
        store.update(WITHDRAWALS, &req.id, json!({"providerNote": "urgent"})).unwrap();

        svc.approve_withdrawal(&req.id, "admin-1").unwrap();

        let provider = store.get_by_id(PROVIDERS, "p1").unwrap().unwrap();
        assert_eq!(provider.field("vehiclePhotoUrl"), Some(&json!("v.jpg")));
        assert_eq!(provider.field("licensePhotoUrl"), Some(&json!("l.jpg")));
        assert_eq!(provider.field("balance"), Some(&json!(300.0)));
        assert!(provider.field("type").is_none());

        let doc = store.get_by_id(WITHDRAWALS, &req.id).unwrap().unwrap();
        assert_eq!(doc.field("providerNote"), Some(&json!("urgent")));
        assert_eq!(doc.field("status"), Some(&json!("approved")));
    }

    #[test]
    fn test_second_approval_rejected() {
        let (store, svc) = create_test_service(500.0);
        let req = request(&svc, 100);
        svc.approve_withdrawal(&req.id, "a").unwrap();
        let err = svc.approve_withdrawal(&req.id, "a").unwrap_err();
        assert_eq!(err.code, ErrorCode::WithdrawalAlreadyProcessed);
        assert_eq!(balance(&store), Decimal::from(400));
        assert_eq!(svc.list_transactions("p1").unwrap().len(), 1);
    }

    #[test]
    fn test_insufficient_balance_changes_nothing() {
        let (store, svc) = create_test_service(500.0);
        let req = request(&svc, 400);
        // balance drops below the request after it was filed
        store.update(PROVIDERS, "p1", json!({"balance": 100.0})).unwrap();

        let err = svc.approve_withdrawal(&req.id, "a").unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientBalance);
        assert_eq!(balance(&store), Decimal::from(100));
        assert_eq!(svc.get_withdrawal(&req.id).unwrap().status, WithdrawalStatus::Pending);
        assert!(svc.list_transactions("p1").unwrap().is_empty());
    }

    #[test]
    fn test_create_validation() {
        let (_store, svc) = create_test_service(500.0);
        let below_min = svc.create_withdrawal_request(WithdrawalCreate {
            provider_id: "p1".into(),
            amount: Decimal::from(10),
            bank_details: BankDetails::default(),
        });
        assert_eq!(below_min.unwrap_err().code, ErrorCode::WithdrawalInvalidAmount);

        let over = svc.create_withdrawal_request(WithdrawalCreate {
            provider_id: "p1".into(),
            amount: Decimal::from(600),
            bank_details: BankDetails::default(),
        });
        assert_eq!(over.unwrap_err().code, ErrorCode::InsufficientBalance);
    }

    #[test]
    fn test_reject_and_list() {
        let (store, svc) = create_test_service(500.0);
        let a = request(&svc, 100);
        request(&svc, 60);
        let rejected = svc.reject_withdrawal(&a.id, "a", Some("IBAN mismatch")).unwrap();
        assert_eq!(rejected.status, WithdrawalStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("IBAN mismatch"));
        assert_eq!(balance(&store), Decimal::from(500));

        assert_eq!(svc.list_withdrawals(Some(WithdrawalStatus::Pending)).unwrap().len(), 1);
        assert_eq!(svc.list_withdrawals(None).unwrap().len(), 2);
        assert_eq!(
            svc.approve_withdrawal(&a.id, "a").unwrap_err().code,
            ErrorCode::WithdrawalAlreadyProcessed
        );
    }
}
