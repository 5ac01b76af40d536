//! Order dashboard statistics
//!
//! Revenue and commission are summed with `rust_decimal` and exposed as
//! `f64` rounded to two places.

use std::collections::BTreeMap;

use rust_decimal::prelude::*;
use serde::Serialize;
use shared::order::classifier::{self, LifecycleCategory, SearchFailure};
use shared::order::{Order, OrderStatus};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderStats {
    pub total: usize,
    pub searching: usize,
    /// assigned through in_progress
    pub active: usize,
    pub completed: usize,
    pub cancelled: usize,
    /// Statuses outside the lifecycle
    pub unknown: usize,
    pub completed_revenue: f64,
    pub commission_total: f64,
    pub average_rating: Option<f64>,
}

/// Number of cancelled orders per lifecycle category
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CancellationBreakdown {
    pub by_category: BTreeMap<&'static str, usize>,
    /// Search timeouts split by failure reason
    pub search_failures: BTreeMap<&'static str, usize>,
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

fn failure_key(failure: SearchFailure) -> &'static str {
    match failure {
        SearchFailure::NoProvidersAvailable => "no_providers_available",
        SearchFailure::NetworkCongestion => "network_congestion",
        SearchFailure::SearchTimeExpired => "search_time_expired",
        SearchFailure::Unspecified => "unspecified",
    }
}

pub fn order_stats(orders: &[Order]) -> OrderStats {
    let mut stats = OrderStats {
        total: orders.len(),
        ..Default::default()
    };
    let mut revenue = Decimal::ZERO;
    let mut commission = Decimal::ZERO;
    let mut rating_sum = Decimal::ZERO;
    let mut rated = 0u32;

    for order in orders {
        match &order.status {
            OrderStatus::Searching => stats.searching += 1,
            OrderStatus::Completed => {
                stats.completed += 1;
                revenue += to_decimal(order.price);
                commission += to_decimal(order.commission.unwrap_or_default());
            }
            OrderStatus::Unknown(_) => stats.unknown += 1,
            s if s.is_cancellation() => stats.cancelled += 1,
            _ => stats.active += 1,
        }
        if let Some(rating) = order.rating {
            rating_sum += to_decimal(rating);
            rated += 1;
        }
    }

    stats.completed_revenue = to_f64(revenue);
    stats.commission_total = to_f64(commission);
    stats.average_rating = (rated > 0).then(|| to_f64(rating_sum / Decimal::from(rated)));
    stats
}

pub fn cancellation_breakdown(orders: &[Order]) -> CancellationBreakdown {
    let mut breakdown = CancellationBreakdown::default();
    for order in orders {
        let category = classifier::classify(order);
        if category == LifecycleCategory::NotCancelled {
            continue;
        }
        *breakdown.by_category.entry(category.key()).or_default() += 1;
        if let LifecycleCategory::SearchTimeout { failure, .. } = category {
            *breakdown.search_failures.entry(failure_key(failure)).or_default() += 1;
        }
    }
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn orders() -> Vec<Order> {
        [
            json!({"status": "completed", "price": 100.1, "commission": 10.05, "rating": 4}),
            json!({"status": "completed", "price": 0.2, "commission": 0.02, "rating": 5}),
            json!({"status": "searching"}),
            json!({"status": "en_route"}),
            json!({"status": "on_hold"}),
            json!({"status": "canceled_by_client_with_reason", "cancelReason": "no providers"}),
            json!({"status": "canceled_by_client", "cancelReasonCode": "network_congestion"}),
            json!({"status": "canceled_by_provider", "assignedAt": "2024-01-01T00:00:00Z"}),
        ]
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap())
        .collect()
    }

    #[test]
    fn test_order_stats() {
        let stats = order_stats(&orders());
        assert_eq!(stats.total, 8);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.searching, 1);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.unknown, 1);
        assert_eq!(stats.cancelled, 3);
        assert_eq!(stats.completed_revenue, 100.3);
        assert_eq!(stats.commission_total, 10.07);
        assert_eq!(stats.average_rating, Some(4.5));
    }

    #[test]
    fn test_cancellation_breakdown() {
        let b = cancellation_breakdown(&orders());
        assert_eq!(b.by_category.get("search_timeout"), Some(&2));
        assert_eq!(b.by_category.get("provider_rejected_after_acceptance"), Some(&1));
        assert_eq!(b.search_failures.get("no_providers_available"), Some(&1));
        assert_eq!(b.search_failures.get("network_congestion"), Some(&1));
    }
}
