//! City & Complaint Models

use serde::{Deserialize, Serialize};

use crate::timestamp::{self, Timestamp};

/// Service city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Admin responsible for this city
    #[serde(default)]
    pub manager_id: Option<String>,
}

fn default_active() -> bool {
    true
}

/// Create city payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityCreate {
    pub name: String,
    pub is_active: Option<bool>,
}

/// Update city payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityUpdate {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// Complaint workflow state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    #[default]
    Open,
    InReview,
    Resolved,
    Closed,
}

/// Customer complaint entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: ComplaintStatus,
    #[serde(default)]
    pub admin_note: Option<String>,
    #[serde(default)]
    pub handled_by: Option<String>,
    #[serde(default, with = "timestamp::lenient")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "timestamp::lenient")]
    pub updated_at: Option<Timestamp>,
}
