#![allow(dead_code)]

use std::sync::Arc;

use console_core::storage::{FsObjectStore, ObjectStore};
use console_core::{Config, ConsoleState, DocumentStore};
use tempfile::TempDir;

/// Console state over an in-memory store, images under a temp dir
pub fn create_test_state() -> (TempDir, ConsoleState) {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = Config::with_overrides(dir.path(), &["owner@fazzaain.app"]);
    let store = DocumentStore::open_in_memory().expect("in-memory store");
    let images: Arc<dyn ObjectStore> = Arc::new(FsObjectStore::new(dir.path().join("images"), "/images"));
    (dir, ConsoleState::with_store(config, store, images))
}
