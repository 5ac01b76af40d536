//! Catalog Models
//!
//! A main service owns an embedded list of sub-services. Sub-service ids are
//! assigned once and persisted; legacy documents are repaired on read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::util::has_text;

/// Main service entity (top-level catalog entry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainService {
    #[serde(default)]
    pub id: String,
    /// Human-facing `SRV-...` code, distinct from the store id
    #[serde(default)]
    pub service_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sub_services: Vec<SubService>,
}

fn default_true() -> bool {
    true
}

impl MainService {
    pub fn find_sub_service(&self, sub_id: &str) -> Option<&SubService> {
        self.sub_services.iter().find(|s| s.id == sub_id)
    }

    /// Every uploaded image referenced by this service and its children
    pub fn image_urls(&self) -> Vec<&str> {
        self.image_url
            .as_deref()
            .into_iter()
            .chain(self.sub_services.iter().filter_map(|s| s.image_url.as_deref()))
            .filter(|url| !url.trim().is_empty())
            .collect()
    }
}

/// Sub-service entity, embedded in its parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubService {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub parent_service_id: Option<String>,
}

/// Create main service payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainServiceCreate {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

/// Update main service payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainServiceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

/// Create sub-service payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubServiceCreate {
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Update sub-service payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubServiceUpdate {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Id for a newly appended sub-service: `{parent}-{index}-{millis}`
pub fn sub_service_id(parent_id: &str, index: usize, millis: i64) -> String {
    format!("{}-{}-{}", parent_id, index, millis)
}

/// Result of reading a stored main service document
#[derive(Debug, Clone)]
pub struct NormalizedService {
    pub service: MainService,
    /// Sub-services were re-keyed and must be written back once
    pub repaired: bool,
}

/// Read a stored main service, accepting legacy sub-service shapes
///
/// Legacy documents store `subServices` as a map keyed by a legacy id, or
/// as a list whose entries lack `id` (some carry `subServiceId`). Missing
/// ids are derived from the map key, the legacy id, or the list position,
/// and `repaired` is set so the caller persists them. An entry that already
/// has an id is never touched.
pub fn normalize_main_service(id: &str, mut doc: Value) -> serde_json::Result<NormalizedService> {
    let mut repaired = false;
    let raw_subs = doc
        .as_object_mut()
        .and_then(|obj| obj.remove("subServices"))
        .unwrap_or(Value::Null);

    let entries: Vec<(Option<String>, Value)> = match raw_subs {
        Value::Array(items) => items.into_iter().map(|v| (None, v)).collect(),
        Value::Object(map) => {
            repaired = true;
            let mut pairs: Vec<(String, Value)> = map.into_iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            pairs.into_iter().map(|(k, v)| (Some(k), v)).collect()
        }
        _ => Vec::new(),
    };

    let mut sub_services = Vec::with_capacity(entries.len());
    for (index, (key, value)) in entries.into_iter().enumerate() {
        let Value::Object(mut fields) = value else {
            continue;
        };
        if !has_text(fields.get("id").and_then(Value::as_str)) {
            let derived = legacy_key(&fields)
                .or(key)
                .unwrap_or_else(|| format!("{}-{}", id, index));
            fields.insert("id".into(), Value::String(derived));
            repaired = true;
        }
        if !fields.contains_key("parentServiceId") {
            fields.insert("parentServiceId".into(), Value::String(id.to_string()));
        }
        fields.remove("subServiceId");
        sub_services.push(serde_json::from_value::<SubService>(Value::Object(fields))?);
    }

    let mut service: MainService = serde_json::from_value(doc)?;
    service.id = id.to_string();
    service.sub_services = sub_services;
    Ok(NormalizedService { service, repaired })
}

fn legacy_key(fields: &Map<String, Value>) -> Option<String> {
    fields
        .get("subServiceId")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
