//! Order service
//!
//! Reads normalize every stored order shape into [`Order`]. Writes are
//! shallow patches so fields this service does not model survive an edit.
//! Every mutation runs in one store transaction under an in-flight claim on
//! the order.

use serde_json::{Map, Value, json};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::order::lifecycle::{self, TransitionError};
use shared::order::{
    CancelParty, CancelReasonCode, CustomerRef, HistoryEntry, MAX_DOCUMENTATION_IMAGES, NewOrder,
    Order, OrderPatch, OrderStatus,
};
use shared::timestamp::Timestamp;
use shared::util::has_text;

use crate::store::{
    Direction, Document, DocumentStore, LiveQuery, Query, StoreError, StoreResult, StoreTxn,
};
use crate::utils::InFlightGuard;

pub const ORDERS: &str = "orders";

/// Cancellation request
#[derive(Debug, Clone)]
pub struct CancelOrder {
    pub party: CancelParty,
    pub reason_code: Option<CancelReasonCode>,
    /// Free-text note, stored as `cancel_reason`
    pub note: Option<String>,
}

impl CancelOrder {
    pub fn by(party: CancelParty) -> Self {
        Self {
            party,
            reason_code: None,
            note: None,
        }
    }
}

/// Order list filter; `None` fields match everything
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub statuses: Option<Vec<OrderStatus>>,
    pub provider_id: Option<String>,
    pub customer_id: Option<String>,
    /// Case-insensitive match on id, customer, service, provider or location
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(statuses) = &self.statuses
            && !statuses.contains(&order.status)
        {
            return false;
        }
        if self.provider_id.is_some() && self.provider_id != order.provider_id {
            return false;
        }
        if self.customer_id.is_some() && self.customer_id != order.customer_id {
            return false;
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            let haystacks = [
                Some(order.id.as_str()),
                Some(order.customer_label()),
                Some(order.service_label()),
                order.provider_name.as_deref(),
                order.location.as_deref(),
                order.customer.as_ref().map(|c| c.phone.as_str()),
            ];
            if !haystacks
                .into_iter()
                .flatten()
                .any(|h| h.to_lowercase().contains(&term))
            {
                return false;
            }
        }
        true
    }
}

fn order_from(doc: Document) -> StoreResult<Order> {
    doc.into_typed()
}

fn not_found(id: &str) -> AppError {
    AppError::not_found_with(ErrorCode::OrderNotFound, id)
}

/// Load an order inside a transaction, mapping absence to `OrderNotFound`
fn load(txn: &mut StoreTxn, id: &str) -> AppResult<Order> {
    match txn.get(ORDERS, id)? {
        Some(doc) => Ok(order_from(doc)?),
        None => Err(not_found(id)),
    }
}

fn transition_error(err: TransitionError) -> AppError {
    let code = match &err {
        TransitionError::FromTerminal(OrderStatus::Completed) => ErrorCode::OrderAlreadyCompleted,
        TransitionError::FromTerminal(_) => ErrorCode::OrderAlreadyCancelled,
        _ => ErrorCode::InvalidTransition,
    };
    AppError::with_message(code, err.to_string())
}

fn validate_price(field: &str, value: f64) -> AppResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::with_message(
            ErrorCode::OrderInvalidPrice,
            format!("{} must be a finite non-negative number, got {}", field, value),
        ));
    }
    Ok(())
}

fn to_value<T: serde::Serialize>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::internal(e.to_string()))
}

/// Stamp lifecycle timestamps implied by entering `status`
fn stamp_status(patch: &mut Map<String, Value>, order: &Order, status: &OrderStatus) -> AppResult<()> {
    let now = to_value(&Timestamp::now())?;
    if status.is_assigned_or_later() && order.assigned_at.is_none() {
        patch.insert("assignedAt".into(), now.clone());
    }
    if *status == OrderStatus::Completed && order.completed_at.is_none() {
        patch.insert("completedAt".into(), now.clone());
    }
    if status.is_cancellation() && order.cancelled_at.is_none() {
        patch.insert("cancelledAt".into(), now);
    }
    Ok(())
}

fn push_history(patch: &mut Map<String, Value>, order: &Order, entry: HistoryEntry) -> AppResult<()> {
    let mut history = order.history.clone();
    history.push(entry);
    patch.insert("history".into(), to_value(&history)?);
    Ok(())
}

#[derive(Debug, Clone)]
pub struct OrderService {
    store: DocumentStore,
    guard: InFlightGuard,
}

impl OrderService {
    pub fn new(store: DocumentStore, guard: InFlightGuard) -> Self {
        Self { store, guard }
    }

    pub fn get_order(&self, id: &str) -> AppResult<Order> {
        match self.store.get_by_id(ORDERS, id)? {
            Some(doc) => Ok(order_from(doc)?),
            None => Err(not_found(id)),
        }
    }

    /// Persist a new `searching` order with no provider
    pub fn create_order(&self, payload: NewOrder, actor: Option<&str>) -> AppResult<Order> {
        validate_price("price", payload.price)?;
        if let Some(commission) = payload.commission {
            validate_price("commission", commission)?;
        }
        if payload.service_id.trim().is_empty() {
            return Err(AppError::validation("service_id is required"));
        }

        let mut doc = Map::new();
        match &payload.customer {
            CustomerRef::Existing(customer_id) => {
                if customer_id.trim().is_empty() {
                    return Err(AppError::new(ErrorCode::OrderCustomerRequired));
                }
                doc.insert("customerId".into(), json!(customer_id.trim()));
            }
            CustomerRef::Snapshot(snapshot) => {
                if snapshot.name.trim().is_empty() || snapshot.phone.trim().is_empty() {
                    return Err(AppError::with_message(
                        ErrorCode::OrderCustomerRequired,
                        "Customer name and phone are required",
                    ));
                }
                doc.insert("customer".into(), to_value(snapshot)?);
            }
        }

        let history = vec![HistoryEntry::status_change(
            OrderStatus::Searching,
            actor.map(str::to_string),
        )];
        doc.insert("serviceId".into(), json!(payload.service_id));
        if let Some(service_type) = payload.service_type.filter(|s| !s.trim().is_empty()) {
            doc.insert("serviceType".into(), json!(service_type));
        }
        if let Some(service_name) = payload.service_name.filter(|s| !s.trim().is_empty()) {
            doc.insert("serviceName".into(), json!(service_name));
        }
        doc.insert("status".into(), to_value(&OrderStatus::Searching)?);
        doc.insert("price".into(), json!(payload.price));
        if let Some(commission) = payload.commission {
            doc.insert("commission".into(), json!(commission));
        }
        if let Some(location) = payload.location.filter(|s| !s.trim().is_empty()) {
            doc.insert("location".into(), json!(location));
        }
        doc.insert("createdAt".into(), to_value(&Timestamp::now())?);
        doc.insert("documentationImages".into(), json!([]));
        doc.insert("history".into(), to_value(&history)?);
        doc.insert("isManual".into(), json!(payload.is_manual));

        let id = self.store.create(ORDERS, Value::Object(doc))?;
        tracing::info!(order_id = %id, manual = payload.is_manual, "Order created");
        self.get_order(&id)
    }

    /// Administrative edit: any subset of mutable fields
    ///
    /// A status here bypasses transition validation. `created_at` is never
    /// touched.
    pub fn edit_order(&self, id: &str, patch: OrderPatch, actor: Option<&str>) -> AppResult<Order> {
        if patch.is_empty() {
            return self.get_order(id);
        }
        if let Some(price) = patch.price {
            validate_price("price", price)?;
        }
        if let Some(commission) = patch.commission {
            validate_price("commission", commission)?;
        }
        if let Some(rating) = patch.rating
            && !(0.0..=5.0).contains(&rating)
        {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                format!("rating must be between 0 and 5, got {}", rating),
            ));
        }
        if let Some(images) = &patch.documentation_images
            && images.len() > MAX_DOCUMENTATION_IMAGES
        {
            return Err(AppError::validation(format!(
                "At most {} documentation images",
                MAX_DOCUMENTATION_IMAGES
            )));
        }

        let _ticket = self.guard.acquire(ORDERS, id)?;
        self.store.transaction(|txn| -> AppResult<Order> {
            let order = load(txn, id)?;
            let mut fields = Map::new();

            if let Some(status) = &patch.status
                && *status != order.status
            {
                let reason_given = has_text(patch.cancel_reason.as_deref())
                    || patch.cancel_reason_code.is_some()
                    || has_text(order.cancel_reason.as_deref());
                if status.is_cancellation() && !reason_given {
                    tracing::warn!(order_id = %id, status = %status, "Cancellation set without a reason");
                }
                if let OrderStatus::Unknown(raw) = status {
                    tracing::warn!(order_id = %id, status = %raw, "Order set to a status outside the lifecycle");
                }
                fields.insert("status".into(), to_value(status)?);
                stamp_status(&mut fields, &order, status)?;
                let mut entry = HistoryEntry::status_change(status.clone(), actor.map(str::to_string));
                entry.action = Some("admin_override".into());
                entry.cancel_reason = patch.cancel_reason.clone().filter(|r| has_text(Some(r)));
                entry.provider_name = patch.provider_name.clone();
                push_history(&mut fields, &order, entry)?;
            }

            let OrderPatch {
                price,
                commission,
                location,
                service_name,
                provider_id,
                provider_name,
                cancel_reason,
                cancel_reason_code,
                cancelled_by,
                rating,
                rating_comment,
                documentation_images,
                status: _,
            } = patch;
            let optional: [(&str, Option<Value>); 12] = [
                ("price", price.map(|v| json!(v))),
                ("commission", commission.map(|v| json!(v))),
                ("location", location.map(Value::String)),
                ("serviceName", service_name.map(Value::String)),
                ("providerId", provider_id.map(Value::String)),
                ("providerName", provider_name.map(Value::String)),
                ("cancelReason", cancel_reason.map(Value::String)),
                ("cancelReasonCode", cancel_reason_code.map(|c| to_value(&c)).transpose()?),
                ("cancelledBy", cancelled_by.map(Value::String)),
                ("rating", rating.map(|v| json!(v))),
                ("ratingComment", rating_comment.map(Value::String)),
                ("documentationImages", documentation_images.map(|v| json!(v))),
            ];
            for (key, value) in optional {
                if let Some(value) = value {
                    fields.insert(key.into(), value);
                }
            }

            txn.update(ORDERS, id, Value::Object(fields))?;
            tracing::info!(order_id = %id, "Order edited");
            load(txn, id)
        })
    }

    /// Validated forward move along the happy path
    pub fn advance_status(&self, id: &str, to: OrderStatus, actor: Option<&str>) -> AppResult<Order> {
        if to.is_cancellation() {
            return Err(AppError::invalid_request("Use cancel_order for cancellations"));
        }
        let _ticket = self.guard.acquire(ORDERS, id)?;
        self.store.transaction(|txn| -> AppResult<Order> {
            let order = load(txn, id)?;
            lifecycle::validate_transition(&order.status, &to).map_err(transition_error)?;
            if !has_text(order.provider_id.as_deref()) {
                return Err(AppError::with_message(
                    ErrorCode::OrderProviderRequired,
                    format!("Order {} needs a provider before it can be {}", id, to),
                ));
            }

            let mut fields = Map::new();
            fields.insert("status".into(), to_value(&to)?);
            stamp_status(&mut fields, &order, &to)?;
            let mut entry = HistoryEntry::status_change(to.clone(), actor.map(str::to_string));
            entry.provider_name = order.provider_name.clone();
            push_history(&mut fields, &order, entry)?;

            txn.update(ORDERS, id, Value::Object(fields))?;
            tracing::info!(order_id = %id, from = %order.status, to = %to, "Order status advanced");
            load(txn, id)
        })
    }

    /// Attach a provider and move the order to `assigned`
    pub fn assign_provider(
        &self,
        id: &str,
        provider_id: &str,
        provider_name: &str,
        actor: Option<&str>,
    ) -> AppResult<Order> {
        let _ticket = self.guard.acquire(ORDERS, id)?;
        self.store.transaction(|txn| -> AppResult<Order> {
            let order = load(txn, id)?;
            lifecycle::validate_transition(&order.status, &OrderStatus::Assigned)
                .map_err(transition_error)?;

            let mut fields = Map::new();
            fields.insert("status".into(), to_value(&OrderStatus::Assigned)?);
            fields.insert("providerId".into(), json!(provider_id));
            fields.insert("providerName".into(), json!(provider_name));
            stamp_status(&mut fields, &order, &OrderStatus::Assigned)?;
            let mut entry =
                HistoryEntry::status_change(OrderStatus::Assigned, actor.map(str::to_string));
            entry.provider_name = Some(provider_name.to_string());
            push_history(&mut fields, &order, entry)?;

            txn.update(ORDERS, id, Value::Object(fields))?;
            tracing::info!(order_id = %id, provider_id = %provider_id, "Provider assigned");
            load(txn, id)
        })
    }

    /// Validated cancellation from any non-terminal state
    ///
    /// `_with_reason` is chosen iff a non-blank note is given; a reason code
    /// alone is stored but does not pick the variant. `cancelledBy` records
    /// the acting account.
    pub fn cancel_order(&self, id: &str, request: CancelOrder, actor: Option<&str>) -> AppResult<Order> {
        let note = request.note.filter(|n| has_text(Some(n)));
        let target = lifecycle::cancellation_target(request.party, note.as_deref());

        let _ticket = self.guard.acquire(ORDERS, id)?;
        self.store.transaction(|txn| -> AppResult<Order> {
            let order = load(txn, id)?;
            lifecycle::validate_transition(&order.status, &target).map_err(transition_error)?;

            let mut fields = Map::new();
            fields.insert("status".into(), to_value(&target)?);
            if let Some(actor) = actor.filter(|a| has_text(Some(a))) {
                fields.insert("cancelledBy".into(), json!(actor));
            }
            if let Some(note) = &note {
                fields.insert("cancelReason".into(), json!(note));
            }
            if let Some(code) = request.reason_code {
                fields.insert("cancelReasonCode".into(), to_value(&code)?);
            }
            stamp_status(&mut fields, &order, &target)?;
            let mut entry = HistoryEntry::status_change(target.clone(), actor.map(str::to_string));
            entry.cancel_reason = note.clone();
            entry.provider_name = order.provider_name.clone();
            push_history(&mut fields, &order, entry)?;

            txn.update(ORDERS, id, Value::Object(fields))?;
            tracing::info!(order_id = %id, status = %target, "Order cancelled");
            load(txn, id)
        })
    }

    /// Append one entry to the order's history log
    pub fn append_history(&self, id: &str, mut entry: HistoryEntry) -> AppResult<Order> {
        if entry.timestamp.is_none() {
            entry.timestamp = Some(Timestamp::now());
        }
        let _ticket = self.guard.acquire(ORDERS, id)?;
        self.store.transaction(|txn| -> AppResult<Order> {
            let order = load(txn, id)?;
            let mut fields = Map::new();
            push_history(&mut fields, &order, entry)?;
            txn.update(ORDERS, id, Value::Object(fields))?;
            load(txn, id)
        })
    }

    /// Orders matching `filter`, newest first
    pub fn list_orders(&self, filter: &OrderFilter) -> AppResult<Vec<Order>> {
        let docs = self
            .store
            .query(ORDERS, &Query::new().order_by("createdAt", Direction::Desc))?;
        let mut orders = Vec::with_capacity(docs.len());
        for doc in docs {
            let order = order_from(doc)?;
            if filter.matches(&order) {
                orders.push(order);
            }
        }
        if let Some(limit) = filter.limit {
            orders.truncate(limit);
        }
        Ok(orders)
    }

    /// Live order list: yields the full filtered list after every change
    pub fn watch_orders(&self, filter: OrderFilter) -> OrderWatch {
        OrderWatch {
            live: self
                .store
                .live_query(ORDERS, Query::new().order_by("createdAt", Direction::Desc)),
            filter,
        }
    }

    pub fn all_orders(&self) -> AppResult<Vec<Order>> {
        self.list_orders(&OrderFilter::default())
    }
}

/// Live view over the order collection
pub struct OrderWatch {
    live: LiveQuery,
    filter: OrderFilter,
}

impl OrderWatch {
    /// Next snapshot; `None` once the store is gone
    pub async fn next(&mut self) -> Option<AppResult<Vec<Order>>> {
        let docs = self.live.next().await?;
        Some(docs.map_err(AppError::from).and_then(|docs| {
            let mut orders = docs
                .into_iter()
                .map(order_from)
                .collect::<Result<Vec<_>, StoreError>>()?;
            orders.retain(|o| self.filter.matches(o));
            if let Some(limit) = self.filter.limit {
                orders.truncate(limit);
            }
            Ok(orders)
        }))
    }
}
