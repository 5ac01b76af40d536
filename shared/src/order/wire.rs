//! Stored order shapes and their normalization
//!
//! Three generations of order documents coexist in the `orders` collection:
//!
//! - customer-app v1: `userId`, `serviceType` only, `image1..image3`, price
//!   sometimes a string, `location` as an object with an `address` field
//! - customer-app v2: `customerId`, `serviceName`, `documentationImages`
//! - console manual orders: `customer` snapshot, `isManual: true`
//!
//! [`RawOrder`] accepts all of them and converts once into [`Order`].

use serde::Deserialize;
use serde_json::Value;

use super::types::{
    CancelReasonCode, CustomerSnapshot, HistoryEntry, MAX_DOCUMENTATION_IMAGES, Order, OrderStatus,
};
use crate::timestamp::{self, Timestamp};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOrder {
    id: Option<String>,
    service_id: Option<String>,
    service_type: Option<String>,
    service_name: Option<String>,
    status: Option<OrderStatus>,
    price: Option<Value>,
    commission: Option<Value>,
    location: Option<Value>,
    #[serde(alias = "userId", alias = "clientId")]
    customer_id: Option<String>,
    customer: Option<CustomerSnapshot>,
    provider_id: Option<String>,
    provider_name: Option<String>,
    cancel_reason: Option<String>,
    cancel_reason_code: Option<CancelReasonCode>,
    cancelled_by: Option<String>,
    #[serde(with = "timestamp::lenient")]
    cancelled_at: Option<Timestamp>,
    #[serde(with = "timestamp::lenient")]
    assigned_at: Option<Timestamp>,
    #[serde(with = "timestamp::lenient")]
    completed_at: Option<Timestamp>,
    #[serde(with = "timestamp::lenient")]
    created_at: Option<Timestamp>,
    rating: Option<Value>,
    rating_comment: Option<String>,
    #[serde(alias = "images")]
    documentation_images: Option<Vec<Option<String>>>,
    image1: Option<String>,
    image2: Option<String>,
    image3: Option<String>,
    history: Option<Vec<Value>>,
    is_manual: Option<bool>,
}

/// Numbers may be stored as JSON numbers or numeric strings
fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn location_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Object(map) => map
            .get("address")
            .or_else(|| map.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                let lat = map.get("lat").or_else(|| map.get("latitude"))?.as_f64()?;
                let lng = map.get("lng").or_else(|| map.get("longitude"))?.as_f64()?;
                Some(format!("{},{}", lat, lng))
            }),
        _ => None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<RawOrder> for Order {
    fn from(raw: RawOrder) -> Self {
        let mut images: Vec<String> = raw
            .documentation_images
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .chain([raw.image1, raw.image2, raw.image3].into_iter().flatten())
            .filter(|url| !url.trim().is_empty())
            .collect();
        images.dedup();
        images.truncate(MAX_DOCUMENTATION_IMAGES);

        // A malformed history entry is dropped rather than hiding the order
        let history = raw
            .history
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| serde_json::from_value::<HistoryEntry>(entry).ok())
            .collect();

        let service_type = non_blank(raw.service_type);
        let service_name = non_blank(raw.service_name);

        Order {
            id: raw.id.unwrap_or_default(),
            service_id: non_blank(raw.service_id),
            service_type,
            service_name,
            status: raw.status.unwrap_or(OrderStatus::Searching),
            price: number(raw.price.as_ref()).unwrap_or(0.0),
            commission: number(raw.commission.as_ref()),
            location: location_text(raw.location),
            customer_id: non_blank(raw.customer_id),
            customer: raw.customer,
            provider_id: non_blank(raw.provider_id),
            provider_name: non_blank(raw.provider_name),
            cancel_reason: non_blank(raw.cancel_reason),
            cancel_reason_code: raw.cancel_reason_code,
            cancelled_by: non_blank(raw.cancelled_by),
            cancelled_at: raw.cancelled_at,
            assigned_at: raw.assigned_at,
            completed_at: raw.completed_at,
            created_at: raw.created_at,
            rating: number(raw.rating.as_ref()),
            rating_comment: non_blank(raw.rating_comment),
            documentation_images: images,
            history,
            is_manual: raw.is_manual.unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_v1_document_normalizes() {
        let doc = json!({
            "id": "o1",
            "userId": "u1",
            "serviceType": "سباكة",
            "status": "cancelled_by_client",
            "price": "150",
            "location": {"address": "الرياض"},
            "image1": "https://img/1.jpg",
            "image2": "",
            "createdAt": {"seconds": 1_700_000_000, "nanoseconds": 0}
        });
        let order: Order = serde_json::from_value(doc).unwrap();
        assert_eq!(order.customer_id.as_deref(), Some("u1"));
        assert_eq!(order.service_label(), "سباكة");
        assert_eq!(order.status, OrderStatus::CanceledByClient);
        assert_eq!(order.price, 150.0);
        assert_eq!(order.location.as_deref(), Some("الرياض"));
        assert_eq!(order.documentation_images, vec!["https://img/1.jpg".to_string()]);
        assert!(order.created_at.is_some());
    }

    #[test]
    fn test_v2_document_normalizes() {
        let doc = json!({
            "id": "o2",
            "customerId": "c9",
            "serviceName": "كهرباء",
            "status": "assigned",
            "price": 80.5,
            "documentationImages": ["a", "b", "c", "d"],
            "createdAt": "2024-03-01T10:00:00Z",
            "assignedAt": "2024-03-01T10:04:00Z",
            "history": [
                {"status": "searching", "timestamp": "2024-03-01T10:00:00Z"},
                {"status": "assigned", "providerName": "أحمد"},
                "garbage"
            ]
        });
        let order: Order = serde_json::from_value(doc).unwrap();
        assert_eq!(order.documentation_images.len(), MAX_DOCUMENTATION_IMAGES);
        assert_eq!(order.history.len(), 2);
        assert_eq!(order.history[1].provider_name.as_deref(), Some("أحمد"));
        assert_eq!(order.price, 80.5);
    }

    #[test]
    fn test_missing_fields_default() {
        let order: Order = serde_json::from_value(json!({"createdAt": "nonsense"})).unwrap();
        assert_eq!(order.status, OrderStatus::Searching);
        assert_eq!(order.price, 0.0);
        assert!(order.created_at.is_none());
        assert_eq!(order.customer_label(), "unknown");
    }

    #[test]
    fn test_canonical_roundtrip_is_stable() {
        let doc = json!({
            "id": "o3",
            "customer": {"name": "سارة", "phone": "0500000000"},
            "serviceId": "s1",
            "status": "searching",
            "price": 20,
            "isManual": true,
            "createdAt": "2024-01-01T00:00:00.000Z"
        });
        let order: Order = serde_json::from_value(doc).unwrap();
        let again: Order = serde_json::from_value(serde_json::to_value(&order).unwrap()).unwrap();
        assert_eq!(order, again);
        assert_eq!(again.customer_label(), "سارة");
    }

    #[test]
    fn test_location_coordinates() {
        assert_eq!(
            location_text(Some(json!({"lat": 24.5, "lng": 46.25}))),
            Some("24.5,46.25".to_string())
        );
        assert_eq!(location_text(Some(json!(""))), None);
    }
}
