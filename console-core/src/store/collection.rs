//! Typed collection access

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::query::Query;
use super::{DocumentStore, StoreResult, StoreTxn, to_document};

/// A named collection whose documents (de)serialize as `T`
///
/// The store id is injected into the `id` field on read and stripped on
/// write, so it only lives in the key.
pub struct Collection<T> {
    name: &'static str,
    store: DocumentStore,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> Collection<T> {
    pub fn new(store: DocumentStore, name: &'static str) -> Self {
        Self {
            name,
            store,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self, id: &str) -> StoreResult<Option<T>> {
        self.store
            .get_by_id(self.name, id)?
            .map(|d| d.into_typed())
            .transpose()
    }

    pub fn all(&self) -> StoreResult<Vec<T>> {
        self.store
            .get_all(self.name)?
            .into_iter()
            .map(|d| d.into_typed())
            .collect()
    }

    pub fn query(&self, query: &Query) -> StoreResult<Vec<T>> {
        self.store
            .query(self.name, query)?
            .into_iter()
            .map(|d| d.into_typed())
            .collect()
    }

    /// Insert under a store-assigned id
    pub fn insert(&self, value: &T) -> StoreResult<String> {
        self.store.create(self.name, to_document(value)?)
    }

    /// Create or replace under a known id
    pub fn set(&self, id: &str, value: &T) -> StoreResult<()> {
        self.store.set(self.name, id, to_document(value)?)
    }

    /// Shallow-merge `patch` into an existing document
    pub fn update(&self, id: &str, patch: Value) -> StoreResult<()> {
        self.store.update(self.name, id, patch)
    }

    pub fn delete(&self, id: &str) -> StoreResult<bool> {
        self.store.delete(self.name, id)
    }

    /// Typed read inside a transaction
    pub fn get_in(&self, txn: &mut StoreTxn, id: &str) -> StoreResult<Option<T>> {
        txn.get(self.name, id)?.map(|d| d.into_typed()).transpose()
    }

    /// Shallow-merge `patch` inside a transaction; fields the model does
    /// not know about are kept
    pub fn update_in(&self, txn: &mut StoreTxn, id: &str, patch: Value) -> StoreResult<()> {
        txn.update(self.name, id, patch)
    }
}
