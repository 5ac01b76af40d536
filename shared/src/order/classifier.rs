//! Cancellation attribution
//!
//! Pure functions over an [`Order`] and its embedded history. Nothing here
//! is persisted: the category is re-derived on every read.
//!
//! 1. An order "was ever accepted" when `assigned_at` is set or any history
//!    entry has status `assigned`.
//! 2. Not accepted + client cancellation → search failure, sub-classified
//!    from the reason code, else from the reason text by phrase containment.
//! 3. Accepted + cancellation by either party → rejection/abandonment, with
//!    the reason text surfaced verbatim.
//!
//! The record-level reason always wins over a history-level reason.

use serde::{Deserialize, Serialize};

use super::types::{CancelParty, CancelReasonCode, HistoryEntry, Order, OrderStatus};
use crate::timestamp::Timestamp;

/// Why a search ended without a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFailure {
    NoProvidersAvailable,
    NetworkCongestion,
    SearchTimeExpired,
    Unspecified,
}

/// Derived, human-facing lifecycle category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum LifecycleCategory {
    /// Not in a cancellation state
    NotCancelled,
    /// Client cancelled while still searching
    SearchTimeout {
        failure: SearchFailure,
        reason: Option<String>,
    },
    /// Provider cancelled an order it never accepted
    ProviderCancelledBeforeAcceptance { reason: Option<String> },
    /// Provider dropped an order after accepting it
    ProviderRejectedAfterAcceptance { reason: Option<String> },
    /// Client cancelled after a provider accepted
    ClientCancelledAfterAcceptance { reason: Option<String> },
}

impl LifecycleCategory {
    /// Stable key for grouping and counting
    pub fn key(&self) -> &'static str {
        match self {
            Self::NotCancelled => "not_cancelled",
            Self::SearchTimeout { .. } => "search_timeout",
            Self::ProviderCancelledBeforeAcceptance { .. } => "provider_cancelled_before_acceptance",
            Self::ProviderRejectedAfterAcceptance { .. } => "provider_rejected_after_acceptance",
            Self::ClientCancelledAfterAcceptance { .. } => "client_cancelled_after_acceptance",
        }
    }

    pub fn is_after_acceptance(&self) -> bool {
        matches!(
            self,
            Self::ProviderRejectedAfterAcceptance { .. } | Self::ClientCancelledAfterAcceptance { .. }
        )
    }
}

/// Known search-failure phrases, matched case-insensitively by containment.
/// Checked in table order; the first hit wins.
const SEARCH_FAILURE_PHRASES: &[(SearchFailure, &[&str])] = &[
    (
        SearchFailure::NoProvidersAvailable,
        &[
            "لا يوجد مزود",
            "لا يوجد فني",
            "لا يوجد مقدم",
            "لا توجد مزودين",
            "عدم توفر",
            "no providers",
            "no provider available",
            "no available provider",
        ],
    ),
    (
        SearchFailure::NetworkCongestion,
        &["ازدحام", "ضغط على الشبكة", "network congestion", "congestion", "high demand"],
    ),
    (
        SearchFailure::SearchTimeExpired,
        &[
            "انتهى وقت البحث",
            "انتهاء وقت البحث",
            "انتهت مدة البحث",
            "انتهت المهلة",
            "search time expired",
            "search timed out",
            "timeout",
            "timed out",
        ],
    ),
];

/// First history entry (in stored order) matching `pred`
fn first_history<'a>(
    history: &'a [HistoryEntry],
    pred: impl Fn(&HistoryEntry) -> bool,
) -> Option<&'a HistoryEntry> {
    history.iter().find(|entry| pred(entry))
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

/// Gate for all attribution: did any provider ever accept this order?
pub fn was_ever_accepted(order: &Order) -> bool {
    order.assigned_at.is_some()
        || first_history(&order.history, |e| e.status == Some(OrderStatus::Assigned)).is_some()
}

/// Record-level reason, else the first history entry carrying one
pub fn effective_cancel_reason(order: &Order) -> Option<&str> {
    non_blank(order.cancel_reason.as_deref()).or_else(|| {
        first_history(&order.history, |e| non_blank(e.cancel_reason.as_deref()).is_some())
            .and_then(|e| e.cancel_reason.as_deref())
    })
}

/// Sub-classify a free-text reason by phrase containment
pub fn match_search_failure(reason: &str) -> SearchFailure {
    let haystack = reason.to_lowercase();
    SEARCH_FAILURE_PHRASES
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| haystack.contains(&p.to_lowercase())))
        .map(|(failure, _)| *failure)
        .unwrap_or(SearchFailure::Unspecified)
}

fn failure_from_code(code: CancelReasonCode) -> Option<SearchFailure> {
    match code {
        CancelReasonCode::NoProvidersAvailable => Some(SearchFailure::NoProvidersAvailable),
        CancelReasonCode::NetworkCongestion => Some(SearchFailure::NetworkCongestion),
        CancelReasonCode::SearchTimeExpired => Some(SearchFailure::SearchTimeExpired),
        _ => None,
    }
}

/// Derive the lifecycle category of an order
pub fn classify(order: &Order) -> LifecycleCategory {
    let Some(party) = order.status.cancelling_party() else {
        return LifecycleCategory::NotCancelled;
    };
    let reason = effective_cancel_reason(order).map(str::to_string);

    match (was_ever_accepted(order), party) {
        (true, CancelParty::Provider) => LifecycleCategory::ProviderRejectedAfterAcceptance { reason },
        (true, CancelParty::Client) => LifecycleCategory::ClientCancelledAfterAcceptance { reason },
        (false, CancelParty::Provider) => {
            LifecycleCategory::ProviderCancelledBeforeAcceptance { reason }
        }
        (false, CancelParty::Client) => {
            let failure = order
                .cancel_reason_code
                .and_then(failure_from_code)
                .or_else(|| reason.as_deref().map(match_search_failure))
                .unwrap_or(SearchFailure::Unspecified);
            LifecycleCategory::SearchTimeout { failure, reason }
        }
    }
}

/// Instant a provider accepted: `assigned_at`, else the first `assigned`
/// history entry's timestamp
pub fn accepted_at(order: &Order) -> Option<Timestamp> {
    order.assigned_at.or_else(|| {
        first_history(&order.history, |e| e.status == Some(OrderStatus::Assigned))
            .and_then(|e| e.timestamp)
    })
}

/// Name of the provider that first accepted the order
pub fn accepting_provider_name(order: &Order) -> Option<&str> {
    first_history(&order.history, |e| e.status == Some(OrderStatus::Assigned))
        .and_then(|e| non_blank(e.provider_name.as_deref()))
        .or_else(|| non_blank(order.provider_name.as_deref()))
}

/// Minutes between creation and acceptance; `None` renders as "unknown"
pub fn minutes_to_acceptance(order: &Order) -> Option<i64> {
    let created = order.created_at?;
    let accepted = accepted_at(order)?;
    Some(created.minutes_until(&accepted))
}
