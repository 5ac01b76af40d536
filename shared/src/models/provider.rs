//! Provider Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::timestamp::{self, Timestamp};

/// Provider approval workflow state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Suspended,
}

/// Provider tier; providers in a group are `vip`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Vip,
    #[default]
    General,
}

/// Service provider entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub approval_status: ApprovalStatus,
    #[serde(rename = "type", default)]
    pub provider_type: ProviderType,
    #[serde(default)]
    pub group_id: Option<String>,
    /// Withdrawable balance
    #[serde(default, with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    #[serde(default)]
    pub city_id: Option<String>,
    #[serde(default)]
    pub service_ids: Vec<String>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
    #[serde(default)]
    pub id_photo_url: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, with = "timestamp::lenient")]
    pub created_at: Option<Timestamp>,
}

/// Update provider payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city_id: Option<String>,
    pub service_ids: Option<Vec<String>>,
    pub profile_photo_url: Option<String>,
    pub id_photo_url: Option<String>,
}

/// Provider list filter; `None` fields match everything
#[derive(Debug, Clone, Default)]
pub struct ProviderFilter {
    pub approval_status: Option<ApprovalStatus>,
    pub provider_type: Option<ProviderType>,
    pub group_id: Option<String>,
    pub city_id: Option<String>,
    /// Case-insensitive match on name or phone
    pub search: Option<String>,
}

impl ProviderFilter {
    pub fn matches(&self, p: &Provider) -> bool {
        if self.approval_status.is_some_and(|s| s != p.approval_status) {
            return false;
        }
        if self.provider_type.is_some_and(|t| t != p.provider_type) {
            return false;
        }
        if self.group_id.is_some() && self.group_id != p.group_id {
            return false;
        }
        if self.city_id.is_some() && self.city_id != p.city_id {
            return false;
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            let in_name = p.name.to_lowercase().contains(&term);
            let in_phone = p.phone.as_deref().is_some_and(|ph| ph.contains(&term));
            if !in_name && !in_phone {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_from_sparse_document() {
        let p: Provider = serde_json::from_value(json!({"name": "سالم"})).unwrap();
        assert_eq!(p.approval_status, ApprovalStatus::Pending);
        assert_eq!(p.provider_type, ProviderType::General);
        assert_eq!(p.balance, Decimal::ZERO);
    }

    #[test]
    fn test_type_field_and_float_balance() {
        let p: Provider =
            serde_json::from_value(json!({"name": "a", "type": "vip", "balance": 120.5})).unwrap();
        assert_eq!(p.provider_type, ProviderType::Vip);
        assert_eq!(p.balance, Decimal::new(1205, 1));
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["type"], "vip");
        assert_eq!(v["balance"], 120.5);
    }

    #[test]
    fn test_filter() {
        let p: Provider = serde_json::from_value(json!({
            "name": "Ahmed Ali", "phone": "0550001111", "approvalStatus": "approved"
        }))
        .unwrap();
        let mut f = ProviderFilter {
            approval_status: Some(ApprovalStatus::Approved),
            search: Some("ahmed".into()),
            ..Default::default()
        };
        assert!(f.matches(&p));
        f.search = Some("0550".into());
        assert!(f.matches(&p));
        f.approval_status = Some(ApprovalStatus::Pending);
        assert!(!f.matches(&p));
    }
}
