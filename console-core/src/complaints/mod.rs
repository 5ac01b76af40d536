//! Customer complaints

use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Complaint, ComplaintStatus};
use shared::timestamp::Timestamp;

use crate::store::{Collection, DocumentStore};

pub const COMPLAINTS: &str = "complaints";

#[derive(Clone)]
pub struct ComplaintService {
    complaints: Collection<Complaint>,
}

impl ComplaintService {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            complaints: store.collection(COMPLAINTS),
        }
    }

    pub fn get_complaint(&self, id: &str) -> AppResult<Complaint> {
        self.complaints
            .get(id)?
            .ok_or_else(|| AppError::not_found_with(ErrorCode::ComplaintNotFound, id))
    }

    /// Complaints newest first, optionally only those in `status`
    pub fn list_complaints(&self, status: Option<ComplaintStatus>) -> AppResult<Vec<Complaint>> {
        let mut complaints: Vec<Complaint> = self
            .complaints
            .all()?
            .into_iter()
            .filter(|c| status.is_none_or(|s| c.status == s))
            .collect();
        complaints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(complaints)
    }

    /// Move a complaint to `status`; a blank note keeps the previous one
    pub fn update_complaint_status(
        &self,
        id: &str,
        status: ComplaintStatus,
        note: Option<&str>,
        admin_id: &str,
    ) -> AppResult<Complaint> {
        let current = self.get_complaint(id)?;
        let mut patch = json!({
            "status": status,
            "handledBy": admin_id,
            "updatedAt": Timestamp::now(),
        });
        if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
            patch["adminNote"] = json!(note);
        }
        self.complaints.update(id, patch)?;
        tracing::info!(
            complaint_id = %id,
            from = ?current.status,
            to = ?status,
            admin_id = %admin_id,
            "Complaint status updated"
        );
        self.get_complaint(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_update_and_filter() {
        let store = DocumentStore::open_in_memory().unwrap();
        store
            .set(COMPLAINTS, "c1", json!({"message": "late", "orderId": "o1"}))
            .unwrap();
        store
            .set(COMPLAINTS, "c2", json!({"message": "rude", "status": "resolved"}))
            .unwrap();
        let svc = ComplaintService::new(store);

        assert_eq!(svc.list_complaints(Some(ComplaintStatus::Open)).unwrap().len(), 1);

        let c = svc
            .update_complaint_status("c1", ComplaintStatus::InReview, Some("called customer"), "admin-1")
            .unwrap();
        assert_eq!(c.status, ComplaintStatus::InReview);
        assert_eq!(c.admin_note.as_deref(), Some("called customer"));
        assert_eq!(c.handled_by.as_deref(), Some("admin-1"));
        assert!(c.updated_at.is_some());

        let c = svc
            .update_complaint_status("c1", ComplaintStatus::Closed, Some("  "), "admin-2")
            .unwrap();
        assert_eq!(c.admin_note.as_deref(), Some("called customer"));
        assert!(svc.list_complaints(Some(ComplaintStatus::Open)).unwrap().is_empty());

        let err = svc
            .update_complaint_status("nope", ComplaintStatus::Closed, None, "a")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ComplaintNotFound);
    }
}
