use std::sync::Arc;

use folio_core::clock::Clock;
use folio_core::lock_manager::LockManager;
use folio_core::locking::LockPolicy;
use folio_core::store::{DocumentStore, LockStore, VersionStore};
use folio_core::version_engine::VersionEngine;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub locks: Arc<LockManager>,
    pub versions: Arc<VersionEngine>,
    /// Document store, used directly for health probes.
    pub documents: Arc<dyn DocumentStore>,
}

impl AppState {
    /// Wire both services onto a single backing store.
    pub fn new<S>(policy: LockPolicy, store: Arc<S>, clock: Arc<dyn Clock>) -> Self
    where
        S: LockStore + DocumentStore + VersionStore + 'static,
    {
        let locks = LockManager::new(store.clone(), Arc::clone(&clock), policy);
        let versions = VersionEngine::new(store.clone(), store.clone(), clock);
        Self {
            locks: Arc::new(locks),
            versions: Arc::new(versions),
            documents: store,
        }
    }
}
