//! Order record, history log and their payloads

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::timestamp::{self, Timestamp};

// ============================================================================
// Status
// ============================================================================

/// Order status as stored on the record
///
/// Happy path: `searching → assigned → en_route → arrived → in_progress →
/// completed`. The four `canceled_*` variants are terminal and reachable from
/// any non-terminal state. Values written by administrative overrides that
/// match none of these are kept verbatim in [`OrderStatus::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Searching,
    Assigned,
    EnRoute,
    Arrived,
    InProgress,
    Completed,
    CanceledByClient,
    CanceledByClientWithReason,
    CanceledByProvider,
    CanceledByProviderWithReason,
    Unknown(String),
}

/// Which party cancelled an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelParty {
    Client,
    Provider,
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Searching => "searching",
            Self::Assigned => "assigned",
            Self::EnRoute => "en_route",
            Self::Arrived => "arrived",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::CanceledByClient => "canceled_by_client",
            Self::CanceledByClientWithReason => "canceled_by_client_with_reason",
            Self::CanceledByProvider => "canceled_by_provider",
            Self::CanceledByProviderWithReason => "canceled_by_provider_with_reason",
            Self::Unknown(raw) => raw.as_str(),
        }
    }

    /// Parse a stored status string
    ///
    /// The double-l spelling (`cancelled_by_*`) written by older app builds
    /// is folded into the canonical variants.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase().replace("cancelled", "canceled");
        match normalized.as_str() {
            "searching" => Self::Searching,
            "assigned" => Self::Assigned,
            "en_route" => Self::EnRoute,
            "arrived" => Self::Arrived,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "canceled_by_client" => Self::CanceledByClient,
            "canceled_by_client_with_reason" => Self::CanceledByClientWithReason,
            "canceled_by_provider" => Self::CanceledByProvider,
            "canceled_by_provider_with_reason" => Self::CanceledByProviderWithReason,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    /// Position on the happy path, `None` for cancellations and unknown values
    pub fn happy_path_rank(&self) -> Option<u8> {
        match self {
            Self::Searching => Some(0),
            Self::Assigned => Some(1),
            Self::EnRoute => Some(2),
            Self::Arrived => Some(3),
            Self::InProgress => Some(4),
            Self::Completed => Some(5),
            _ => None,
        }
    }

    pub fn cancelling_party(&self) -> Option<CancelParty> {
        match self {
            Self::CanceledByClient | Self::CanceledByClientWithReason => Some(CancelParty::Client),
            Self::CanceledByProvider | Self::CanceledByProviderWithReason => {
                Some(CancelParty::Provider)
            }
            _ => None,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        self.cancelling_party().is_some()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed) || self.is_cancellation()
    }

    /// Whether the order has reached `assigned` or any later happy-path state
    pub fn is_assigned_or_later(&self) -> bool {
        self.happy_path_rank().is_some_and(|rank| rank >= 1)
    }

    /// Cancellation variant for a party; `_with_reason` iff a reason was given
    pub fn cancellation(party: CancelParty, with_reason: bool) -> Self {
        match (party, with_reason) {
            (CancelParty::Client, false) => Self::CanceledByClient,
            (CancelParty::Client, true) => Self::CanceledByClientWithReason,
            (CancelParty::Provider, false) => Self::CanceledByProvider,
            (CancelParty::Provider, true) => Self::CanceledByProviderWithReason,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

// ============================================================================
// Cancellation reason codes
// ============================================================================

/// Closed set of cancellation reasons set by whichever actor cancels
///
/// Free text stays in `cancel_reason` as a supplementary note. Records
/// written before codes existed carry only the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReasonCode {
    NoProvidersAvailable,
    NetworkCongestion,
    SearchTimeExpired,
    ChangedMind,
    ProviderUnavailable,
    PriceDisagreement,
    Other,
}

// ============================================================================
// History log
// ============================================================================

/// One lifecycle event in an order's embedded history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    /// Account id of whoever caused the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, with = "timestamp::lenient", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl HistoryEntry {
    /// Entry recording a status change made now
    pub fn status_change(status: OrderStatus, actor: Option<String>) -> Self {
        Self {
            action: Some(format!("status:{}", status)),
            status: Some(status),
            actor,
            timestamp: Some(Timestamp::now()),
            ..Default::default()
        }
    }
}

// ============================================================================
// Order record
// ============================================================================

/// Inline customer details captured on manual staff-created orders
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSnapshot {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Canonical in-memory order record
///
/// Stored documents of every schema generation are normalized into this
/// shape on read (see `wire`); nothing downstream branches on the stored
/// shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "super::wire::RawOrder")]
pub struct Order {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    pub status: OrderStatus,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason_code: Option<CancelReasonCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    /// Set once at creation; legacy records may lack it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_comment: Option<String>,
    /// At most [`MAX_DOCUMENTATION_IMAGES`] image URLs
    pub documentation_images: Vec<String>,
    pub history: Vec<HistoryEntry>,
    /// Created by staff from the console rather than by the customer app
    pub is_manual: bool,
}

/// Maximum number of documentation photos attached to an order
pub const MAX_DOCUMENTATION_IMAGES: usize = 3;

impl Order {
    /// Display name of the service, falling back to the service type
    pub fn service_label(&self) -> &str {
        self.service_name
            .as_deref()
            .or(self.service_type.as_deref())
            .unwrap_or(timestamp::UNKNOWN)
    }

    /// Customer label: snapshot name, then customer id
    pub fn customer_label(&self) -> &str {
        self.customer
            .as_ref()
            .map(|c| c.name.as_str())
            .or(self.customer_id.as_deref())
            .unwrap_or(timestamp::UNKNOWN)
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Who the order is for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerRef {
    /// Registered customer, by account id
    Existing(String),
    /// Walk-in customer entered by staff
    Snapshot(CustomerSnapshot),
}

/// Create order payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer: CustomerRef,
    pub service_id: String,
    pub service_type: Option<String>,
    pub service_name: Option<String>,
    pub price: f64,
    pub commission: Option<f64>,
    pub location: Option<String>,
    /// `true` when created from the console
    #[serde(default)]
    pub is_manual: bool,
}

/// Edit order payload
///
/// Any subset of mutable fields. `created_at` is deliberately absent.
/// A `status` here is an administrative override and bypasses transition
/// validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub price: Option<f64>,
    pub commission: Option<f64>,
    pub location: Option<String>,
    pub service_name: Option<String>,
    pub provider_id: Option<String>,
    pub provider_name: Option<String>,
    pub cancel_reason: Option<String>,
    pub cancel_reason_code: Option<CancelReasonCode>,
    pub cancelled_by: Option<String>,
    pub rating: Option<f64>,
    pub rating_comment: Option<String>,
    pub documentation_images: Option<Vec<String>>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
