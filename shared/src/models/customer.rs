//! Customer Model

use serde::{Deserialize, Serialize};

use crate::timestamp::{self, Timestamp};

/// Customer (end user) entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub city_id: Option<String>,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default, with = "timestamp::lenient")]
    pub created_at: Option<Timestamp>,
}
