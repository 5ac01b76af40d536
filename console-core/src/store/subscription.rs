//! Change subscriptions
//!
//! Every committed write publishes one [`ChangeEvent`] per touched document
//! on a single broadcast channel. A [`Subscription`] filters it down to one
//! collection; a [`LiveQuery`] turns it into a stream of query snapshots.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::query::Query;
use super::{Document, DocumentStore, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    /// Events were dropped; re-read the collection
    Resync,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: String,
    pub id: String,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(collection: &str, id: &str, kind: ChangeKind) -> Self {
        Self {
            collection: collection.to_string(),
            id: id.to_string(),
            kind,
        }
    }
}

/// Change feed for one collection
#[derive(Debug)]
pub struct Subscription {
    collection: String,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub(crate) fn new(collection: &str, rx: broadcast::Receiver<ChangeEvent>) -> Self {
        Self {
            collection: collection.to_string(),
            rx,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Next event for this collection; `None` once the store is gone
    ///
    /// A lagging receiver yields a single `Resync` event instead of an error.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.collection == self.collection => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(collection = %self.collection, skipped, "Subscription lagged");
                    return Some(ChangeEvent::new(&self.collection, "", ChangeKind::Resync));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// A query re-evaluated after every change to its collection
pub struct LiveQuery {
    store: DocumentStore,
    query: Query,
    subscription: Subscription,
    primed: bool,
}

impl LiveQuery {
    pub(crate) fn new(store: DocumentStore, collection: &str, query: Query) -> Self {
        let subscription = store.subscribe(collection);
        Self {
            store,
            query,
            subscription,
            primed: false,
        }
    }

    /// Current result set
    pub fn snapshot(&self) -> StoreResult<Vec<Document>> {
        self.store.query(self.subscription.collection(), &self.query)
    }

    /// The first call yields the current result immediately; later calls
    /// wait for the next change and yield the full re-evaluated result.
    pub async fn next(&mut self) -> Option<StoreResult<Vec<Document>>> {
        if !self.primed {
            self.primed = true;
            return Some(self.snapshot());
        }
        self.subscription.recv().await?;
        Some(self.snapshot())
    }
}
