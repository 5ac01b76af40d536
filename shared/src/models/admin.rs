//! Admin Model

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::timestamp::{self, Timestamp};

/// Staff role. `super_admin` implies every permission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    #[default]
    Admin,
    SuperAdmin,
}

impl AdminRole {
    pub fn is_super(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }
}

/// Admin entity; `id` equals the identity account id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: AdminRole,
    /// Ignored for `super_admin`
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    #[serde(default)]
    pub city_id: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, with = "timestamp::lenient")]
    pub created_at: Option<Timestamp>,
}

fn default_active() -> bool {
    true
}

/// Create admin payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCreate {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: AdminRole,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

/// Update admin payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdate {
    pub name: Option<String>,
    pub role: Option<AdminRole>,
    pub permissions: Option<BTreeSet<String>>,
    pub is_active: Option<bool>,
}
