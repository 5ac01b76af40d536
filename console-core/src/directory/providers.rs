//! Provider directory

use serde_json::{Value, json};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{ApprovalStatus, Provider, ProviderFilter, ProviderUpdate};
use shared::util::has_text;

use crate::store::{Collection, DocumentStore};

pub const PROVIDERS: &str = "providers";

pub(crate) fn provider_not_found(id: &str) -> AppError {
    AppError::not_found_with(ErrorCode::ProviderNotFound, id)
}

#[derive(Clone)]
pub struct ProviderDirectory {
    providers: Collection<Provider>,
}

impl ProviderDirectory {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            providers: store.collection(PROVIDERS),
        }
    }

    pub fn get_provider(&self, id: &str) -> AppResult<Provider> {
        self.providers.get(id)?.ok_or_else(|| provider_not_found(id))
    }

    pub fn list_providers(&self, filter: &ProviderFilter) -> AppResult<Vec<Provider>> {
        let mut providers: Vec<Provider> = self
            .providers
            .all()?
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect();
        providers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(providers)
    }

    fn set_status(&self, id: &str, status: ApprovalStatus, reason: Option<String>) -> AppResult<Provider> {
        let current = self.get_provider(id)?;
        self.providers.update(
            id,
            json!({
                "approvalStatus": status,
                "rejectionReason": reason,
            }),
        )?;
        tracing::info!(
            provider_id = %id,
            from = ?current.approval_status,
            to = ?status,
            "Provider approval status changed"
        );
        self.get_provider(id)
    }

    pub fn approve_provider(&self, id: &str) -> AppResult<Provider> {
        self.set_status(id, ApprovalStatus::Approved, None)
    }

    pub fn reject_provider(&self, id: &str, reason: &str) -> AppResult<Provider> {
        if !has_text(Some(reason)) {
            return Err(AppError::with_message(
                ErrorCode::RequiredField,
                "A rejection reason is required",
            ));
        }
        self.set_status(id, ApprovalStatus::Rejected, Some(reason.trim().to_string()))
    }

    pub fn suspend_provider(&self, id: &str, reason: Option<&str>) -> AppResult<Provider> {
        let reason = reason.filter(|r| has_text(Some(r))).map(|r| r.trim().to_string());
        self.set_status(id, ApprovalStatus::Suspended, reason)
    }

    pub fn update_provider(&self, id: &str, data: ProviderUpdate) -> AppResult<Provider> {
        self.get_provider(id)?;
        let mut patch = serde_json::Map::new();
        let text_fields = [
            ("name", data.name),
            ("phone", data.phone),
            ("email", data.email),
            ("cityId", data.city_id),
            ("profilePhotoUrl", data.profile_photo_url),
            ("idPhotoUrl", data.id_photo_url),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value {
                patch.insert(key.into(), Value::String(value));
            }
        }
        if let Some(service_ids) = data.service_ids {
            patch.insert("serviceIds".into(), json!(service_ids));
        }
        if patch.get("name").and_then(Value::as_str).is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::validation("name is required"));
        }
        self.providers.update(id, Value::Object(patch))?;
        tracing::info!(provider_id = %id, "Provider updated");
        self.get_provider(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ProviderDirectory {
        let store = DocumentStore::open_in_memory().unwrap();
        store
            .set(PROVIDERS, "p1", json!({"name": "فهد", "phone": "0500000001"}))
            .unwrap();
        store
            .set(PROVIDERS, "p2", json!({"name": "Omar", "approvalStatus": "approved"}))
            .unwrap();
        ProviderDirectory::new(store)
    }

    #[test]
    fn test_approval_workflow() {
        let dir = setup();
        assert_eq!(dir.get_provider("p1").unwrap().approval_status, ApprovalStatus::Pending);

        let err = dir.reject_provider("p1", " ").unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);

        let p = dir.reject_provider("p1", "صورة الهوية غير واضحة").unwrap();
        assert_eq!(p.approval_status, ApprovalStatus::Rejected);
        assert!(p.rejection_reason.is_some());

        let p = dir.approve_provider("p1").unwrap();
        assert_eq!(p.approval_status, ApprovalStatus::Approved);
        assert!(p.rejection_reason.is_none());

        let p = dir.suspend_provider("p1", None).unwrap();
        assert_eq!(p.approval_status, ApprovalStatus::Suspended);
    }

    #[test]
    fn test_list_filter_and_missing() {
        let dir = setup();
        let filter = ProviderFilter {
            approval_status: Some(ApprovalStatus::Approved),
            ..Default::default()
        };
        let found = dir.list_providers(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "p2");

        assert_eq!(dir.approve_provider("nope").unwrap_err().code, ErrorCode::ProviderNotFound);
    }

    #[test]
    fn test_update_provider() {
        let dir = setup();
        let p = dir
            .update_provider(
                "p2",
                ProviderUpdate {
                    city_id: Some("riyadh".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(p.city_id.as_deref(), Some("riyadh"));
        assert_eq!(p.name, "Omar");
    }
}
