//! Provider Group Model

use serde::{Deserialize, Serialize};

use crate::timestamp::{self, Timestamp};

/// Provider group entity (members are VIP providers)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderGroup {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Display color, e.g. `#FFD700`
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default = "default_vip")]
    pub is_vip: bool,
    /// Lower sorts first
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub member_ids: Vec<String>,
    #[serde(default, with = "timestamp::lenient")]
    pub created_at: Option<Timestamp>,
}

fn default_vip() -> bool {
    true
}

/// Create group payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCreate {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_vip: Option<bool>,
    pub priority: Option<i32>,
}

/// Update group payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_vip: Option<bool>,
    pub priority: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_defaults() {
        let group: ProviderGroup = serde_json::from_value(json!({"name": "Gold"})).unwrap();
        assert!(group.is_vip);
        assert_eq!(group.priority, 0);
        assert!(group.member_ids.is_empty());
    }
}
