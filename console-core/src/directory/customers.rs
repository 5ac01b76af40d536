//! Customer directory

use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::Customer;

use crate::security_log;
use crate::store::{Collection, DocumentStore};

pub const CUSTOMERS: &str = "customers";

#[derive(Clone)]
pub struct CustomerDirectory {
    customers: Collection<Customer>,
}

impl CustomerDirectory {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            customers: store.collection(CUSTOMERS),
        }
    }

    pub fn get_customer(&self, id: &str) -> AppResult<Customer> {
        self.customers
            .get(id)?
            .ok_or_else(|| AppError::not_found_with(ErrorCode::CustomerNotFound, id))
    }

    /// All customers, optionally narrowed by a name/phone search term
    pub fn list_customers(&self, search: Option<&str>) -> AppResult<Vec<Customer>> {
        let term = search.map(str::trim).filter(|t| !t.is_empty()).map(str::to_lowercase);
        let mut customers: Vec<Customer> = self
            .customers
            .all()?
            .into_iter()
            .filter(|c| match &term {
                Some(t) => {
                    c.name.to_lowercase().contains(t) || c.phone.as_deref().is_some_and(|p| p.contains(t.as_str()))
                }
                None => true,
            })
            .collect();
        customers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(customers)
    }

    pub fn set_customer_blocked(&self, id: &str, blocked: bool) -> AppResult<Customer> {
        self.get_customer(id)?;
        self.customers.update(id, json!({ "isBlocked": blocked }))?;
        security_log!("INFO", "customer_block_changed", customer_id = id, blocked = blocked);
        self.get_customer(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_and_search() {
        let store = DocumentStore::open_in_memory().unwrap();
        store
            .set(CUSTOMERS, "c1", json!({"name": "Sara", "phone": "0551112222"}))
            .unwrap();
        store.set(CUSTOMERS, "c2", json!({"name": "Ali"})).unwrap();
        let dir = CustomerDirectory::new(store);

        let c = dir.set_customer_blocked("c1", true).unwrap();
        assert!(c.is_blocked);
        assert!(!dir.set_customer_blocked("c1", false).unwrap().is_blocked);

        assert_eq!(dir.list_customers(None).unwrap().len(), 2);
        let found = dir.list_customers(Some("0551")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "c1");

        let err = dir.set_customer_blocked("missing", true).unwrap_err();
        assert_eq!(err.code, ErrorCode::CustomerNotFound);
    }
}
